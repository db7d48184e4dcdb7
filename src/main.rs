//! CLI entry point for the charsniff tool.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use charsniff_core::decode::{Lookahead, wrap_stream};
use charsniff_core::detect::{
    ChardetngClassifier, Detection, EncodingResolver, ResultFilter, StatisticalProbe,
};
use charsniff_core::http::{CONNECT_TIMEOUT_SECS, CharsetClient, READ_TIMEOUT_SECS};
use clap::Parser;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

mod app_config;
mod cli;

use app_config::{FileConfig, VerbositySetting};
use cli::{Cli, Command, DecodeArgs, DetectArgs, FetchArgs, ProbeArgs};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();
    let loaded = app_config::load_config(cli.config.as_deref())?;
    let file_config = loaded.file_config();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config verbosity > info
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => file_config
                .verbosity
                .map_or("info", VerbositySetting::log_level),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Decoded text goes to stdout, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(
        ?cli,
        config_path = ?loaded.path,
        config_verbosity = file_config.verbosity.map(VerbositySetting::as_str),
        "CLI arguments parsed"
    );

    match cli.command {
        Command::Detect(args) => run_detect(args, &file_config),
        Command::Decode(args) => run_decode(args, &file_config),
        Command::Fetch(args) => run_fetch(args, &file_config).await,
    }
}

fn run_detect(args: DetectArgs, config: &FileConfig) -> Result<()> {
    let mut input = open_input(args.file.as_deref())?;
    let resolver = build_resolver(&args.probe, config);

    let lookahead = Lookahead::read_from(&mut input).context("Failed to read input")?;
    let detection = resolver.resolve(lookahead.as_bytes(), &args.content_type);
    debug!(
        prefix_len = lookahead.as_bytes().len(),
        reached_end = lookahead.reached_end(),
        "detection finished"
    );

    let mut stdout = io::stdout().lock();
    if args.json {
        serde_json::to_writer(&mut stdout, &detection)?;
        writeln!(stdout)?;
    } else {
        writeln!(stdout, "{}", format_detection(&detection))?;
    }
    Ok(())
}

fn run_decode(args: DecodeArgs, config: &FileConfig) -> Result<()> {
    let input = open_input(args.file.as_deref())?;
    let resolver = build_resolver(&args.probe, config);

    let mut decoded =
        wrap_stream(input, &args.content_type, &resolver).context("Failed to read input")?;
    log_detection(decoded.detection());

    let mut stdout = BufWriter::new(io::stdout().lock());
    io::copy(&mut decoded, &mut stdout).context("Failed to decode input")?;
    stdout.flush()?;
    Ok(())
}

async fn run_fetch(args: FetchArgs, config: &FileConfig) -> Result<()> {
    let connect_timeout = args
        .connect_timeout
        .or(config.connect_timeout_secs)
        .unwrap_or(CONNECT_TIMEOUT_SECS);
    let read_timeout = args
        .read_timeout
        .or(config.read_timeout_secs)
        .unwrap_or(READ_TIMEOUT_SECS);

    let client = CharsetClient::new_with_timeouts(connect_timeout, read_timeout)
        .with_resolver(build_resolver(&args.probe, config));
    let response = client.fetch(&args.url).await?;
    info!(
        url = %response.url(),
        status = response.status(),
        content_type = %response.content_type(),
        "fetched"
    );
    log_detection(response.detection());

    let mut body = response.into_body();
    let mut stdout = tokio::io::stdout();
    while let Some(chunk) = body.next().await {
        stdout.write_all(&chunk?).await?;
    }
    stdout.flush().await?;
    Ok(())
}

fn open_input(path: Option<&std::path::Path>) -> Result<Box<dyn Read>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open '{}'", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdin())),
    }
}

/// Builds the resolver from CLI flags, falling back to file config values.
fn build_resolver(probe: &ProbeArgs, config: &FileConfig) -> EncodingResolver {
    let enabled = !probe.no_statistical && config.statistical.unwrap_or(true);
    if !enabled {
        debug!("statistical stage disabled");
        return EncodingResolver::new();
    }

    let mut classifier = ChardetngClassifier::new();
    if let Some(tld) = probe.tld.as_ref().or(config.tld.as_ref()) {
        classifier = classifier.with_tld(tld);
    }

    let mut filter = ResultFilter::new();
    if let Some(charsets) = pick_list(&probe.charsets, config.charsets.as_ref()) {
        filter = filter.with_charsets(charsets);
    }
    if let Some(languages) = pick_list(&probe.languages, config.languages.as_ref()) {
        filter = filter.with_languages(languages);
    }
    if let Some(prefer) = pick_list(&probe.prefer, config.prefer.as_ref()) {
        filter = filter.with_preferred_charsets(prefer);
    }

    EncodingResolver::with_probe(StatisticalProbe::new(Arc::new(classifier), filter))
}

/// CLI values win over file values; an empty CLI list means "not given".
fn pick_list<'a>(cli: &'a [String], file: Option<&'a Vec<String>>) -> Option<&'a [String]> {
    if cli.is_empty() {
        file.map(Vec::as_slice)
    } else {
        Some(cli)
    }
}

fn format_detection(detection: &Detection) -> String {
    let certainty = if detection.certain {
        "certain"
    } else {
        "uncertain"
    };
    format!(
        "{}\t{}\t{}",
        detection.name,
        certainty,
        detection.source.as_str()
    )
}

fn log_detection(detection: &Detection) {
    info!(
        encoding = %detection.name,
        certain = detection.certain,
        source = detection.source.as_str(),
        "encoding determined"
    );
}
