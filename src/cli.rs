// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two ways to say where to start and how deep to go:
//   depth-crawler "https://example.com|2"
//   depth-crawler https://example.com 2
//
// Everything else is an optional flag with a sensible default. The raw
// strings collected here are validated in config.rs.
// =============================================================================

use std::path::PathBuf;

use clap::Parser;

use crate::extract::ExtractorKind;

#[derive(Parser, Debug)]
#[command(
    name = "depth-crawler",
    version,
    about = "Crawl a website breadth-first up to a maximum link depth",
    long_about = "depth-crawler starts from one URL, follows links with a fixed pool of workers \
                  and writes every processed URL to an output file. Pages at the maximum depth \
                  are recorded but not fetched."
)]
pub struct Cli {
    /// Start URL, optionally with the depth attached: "https://example.com|2"
    pub target: String,

    /// Maximum crawl depth, if not already given in TARGET
    ///
    /// Depth 1 = fetch the start page, record the pages it links to
    /// Depth 2 = also fetch those pages and record what they link to
    #[arg(allow_negative_numbers = true)]
    pub depth: Option<String>,

    /// File that receives one processed URL per line (truncated on start)
    #[arg(short, long, default_value = "visited.txt")]
    pub output: PathBuf,

    /// Append-only log of failed fetches, one timestamped entry per line
    #[arg(long, default_value = "errors.log")]
    pub error_log: PathBuf,

    /// Number of parallel workers
    #[arg(short, long, default_value_t = 4)]
    pub workers: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Abort the whole crawl after this many seconds
    #[arg(long)]
    pub run_timeout: Option<u64>,

    /// Treat redirects as failures instead of following them
    #[arg(long)]
    pub no_redirects: bool,

    /// Only follow links on the start URL's host
    #[arg(long)]
    pub same_host: bool,

    /// How links are pulled out of pages
    #[arg(long, value_enum, default_value_t = ExtractorKind::Dom)]
    pub extractor: ExtractorKind,

    /// Print the crawl report as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}
