// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (tracing, controlled by RUST_LOG, written to stderr)
// 2. Parse and validate command-line arguments
// 3. Open the output files, build the HTTP fetcher and link extractor
// 4. Run the crawl until there is no work left (or Ctrl-C / run timeout)
// 5. Print a summary and exit (0 = done, 1 = fatal error, 2 = bad input)
// =============================================================================

mod cli;
mod config;
mod crawl;
mod extract;
mod fetch;
mod record;

use std::fmt::Display;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use config::CrawlConfig;
use crawl::{CrawlReport, Crawler};
use extract::LinkExtractor;
use fetch::HttpFetcher;
use record::FileRecorder;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "depth_crawler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    // Bad input is reported clap-style (with usage) and exits with code 2
    let config = match CrawlConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => usage_error(ErrorKind::ValueValidation, e),
    };
    let recorder = match FileRecorder::create(&config.output, &config.error_log) {
        Ok(recorder) => Arc::new(recorder),
        Err(e) => usage_error(
            ErrorKind::Io,
            format!(
                "cannot open output '{}' / error log '{}': {}",
                config.output.display(),
                config.error_log.display(),
                e
            ),
        ),
    };

    let fetcher = Arc::new(HttpFetcher::new().context("failed to build HTTP client")?);
    let extractor: Arc<dyn LinkExtractor> = Arc::from(config.extractor.build());

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, stopping crawl");
                cancel.cancel();
            }
        }
    });

    if !cli.json {
        println!("🔍 Crawling: {}", config.start_url);
        println!(
            "📊 Max depth: {} | Workers: {}",
            config.max_depth, config.workers
        );
    }
    let output = config.output.clone();
    let error_log = config.error_log.clone();

    let report = Crawler::new(config, fetcher, extractor, recorder)
        .run(cancel)
        .await
        .context("crawl aborted")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report, &output.display(), &error_log.display());
    }

    Ok(0)
}

fn usage_error(kind: ErrorKind, message: impl Display) -> ! {
    Cli::command().error(kind, message).exit()
}

fn print_summary(report: &CrawlReport, output: &dyn Display, error_log: &dyn Display) {
    println!();
    println!("📊 Summary:");
    println!("   ✅ Visited: {} (leaves at max depth: {})", report.visited, report.leaves);
    println!("   🌐 Fetched: {}", report.fetched);
    println!("   ❌ Failed: {}", report.failed);
    println!("   📋 Unique URLs: {}", report.discovered);
    println!("   ⏱️  Elapsed: {} ms", report.elapsed_ms);
    if report.cancelled {
        println!("   ⚠️  Crawl was cancelled before finishing");
    }
    println!();
    println!("📄 Visited URLs written to {}", output);
    if report.failed > 0 {
        println!("📝 Failures logged to {}", error_log);
    }
}
