//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use charsniff_core::detect::normalize_tld;
use clap::{Parser, Subcommand};

/// Detect the character encoding of documents and decode them to UTF-8.
///
/// Charsniff looks at a byte-order mark, the declared Content-Type, HTML
/// `<meta>` declarations and the bytes themselves, in that order, and
/// transcodes the input without buffering it whole.
#[derive(Parser, Debug)]
#[command(name = "charsniff")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report the encoding of a file (or stdin) without decoding it
    Detect(DetectArgs),
    /// Decode a file (or stdin) to UTF-8 on stdout
    Decode(DecodeArgs),
    /// Fetch a URL and write its decoded body to stdout
    Fetch(FetchArgs),
}

/// Arguments for `charsniff detect`.
#[derive(clap::Args, Debug)]
pub struct DetectArgs {
    /// Input file (reads stdin when omitted)
    pub file: Option<PathBuf>,

    /// Declared Content-Type, e.g. "text/html; charset=euc-jp"
    #[arg(long, value_name = "CT", default_value = "")]
    pub content_type: String,

    /// Print the detection as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub probe: ProbeArgs,
}

/// Arguments for `charsniff decode`.
#[derive(clap::Args, Debug)]
pub struct DecodeArgs {
    /// Input file (reads stdin when omitted)
    pub file: Option<PathBuf>,

    /// Declared Content-Type, e.g. "text/html; charset=euc-jp"
    #[arg(long, value_name = "CT", default_value = "")]
    pub content_type: String,

    #[command(flatten)]
    pub probe: ProbeArgs,
}

/// Arguments for `charsniff fetch`.
#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// URL to fetch (http or https)
    pub url: String,

    /// Connect timeout in seconds (1-3600)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// Read timeout in seconds (1-3600)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: Option<u64>,

    #[command(flatten)]
    pub probe: ProbeArgs,
}

/// Options for the statistical stage, shared by every command.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ProbeArgs {
    /// Skip the statistical classifier
    #[arg(long)]
    pub no_statistical: bool,

    /// Only accept this charset from the classifier (repeatable)
    #[arg(long = "charset", value_name = "CHARSET")]
    pub charsets: Vec<String>,

    /// Only accept this language from the classifier (repeatable, "" for unknown)
    #[arg(long = "language", value_name = "LANG")]
    pub languages: Vec<String>,

    /// Prefer this charset among classifier candidates (repeatable, in order)
    #[arg(long = "prefer", value_name = "CHARSET")]
    pub prefer: Vec<String>,

    /// Top-level domain hint for the classifier, e.g. "jp"
    #[arg(long, value_name = "TLD", value_parser = parse_tld)]
    pub tld: Option<String>,
}

fn parse_tld(value: &str) -> Result<String, String> {
    normalize_tld(value)
        .ok_or_else(|| format!("'{value}' is not a bare top-level domain such as \"jp\""))
}
