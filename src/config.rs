// src/config.rs
// =============================================================================
// Turns the raw command line into a validated, immutable crawl configuration.
//
// Everything that can be wrong with the input is caught here, before a single
// worker starts: missing or non-positive depth, a start URL we can't crawl,
// a zero-sized pool.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::cli::Cli;
use crate::crawl::{CanonicalError, CanonicalUrl};
use crate::extract::ExtractorKind;
use crate::fetch::FetchOptions;

/// Separates URL and depth in the combined "<url>|<depth>" form.
pub const TARGET_SEPARATOR: char = '|';

pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing maximum depth: use \"<url>|<depth>\" or \"<url> <depth>\"")]
    MissingDepth,
    #[error("depth given twice (in the target and as a separate argument)")]
    DepthGivenTwice,
    #[error("invalid depth '{0}': expected a positive integer")]
    InvalidDepth(String),
    #[error("maximum depth must be a positive integer, got {0}")]
    NonPositiveDepth(i64),
    #[error("invalid start URL '{url}': {source}")]
    InvalidStartUrl { url: String, source: CanonicalError },
    #[error("worker count must be at least 1")]
    NoWorkers,
    #[error("request timeout must be at least 1 second")]
    ZeroTimeout,
}

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub start_url: CanonicalUrl,
    /// Items at this depth are recorded but never fetched
    pub max_depth: u32,
    pub workers: usize,
    pub fetch: FetchOptions,
    pub run_timeout: Option<Duration>,
    pub same_host_only: bool,
    pub extractor: ExtractorKind,
    pub output: PathBuf,
    pub error_log: PathBuf,
}

impl CrawlConfig {
    /// Config with defaults for everything but the target.
    pub fn new(start_url: CanonicalUrl, max_depth: u32) -> Self {
        Self {
            start_url,
            max_depth,
            workers: DEFAULT_WORKERS,
            fetch: FetchOptions::default(),
            run_timeout: None,
            same_host_only: false,
            extractor: ExtractorKind::default(),
            output: PathBuf::from("visited.txt"),
            error_log: PathBuf::from("errors.log"),
        }
    }

    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let (start_url, max_depth) = parse_target(&cli.target, cli.depth.as_deref())?;

        if cli.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if cli.timeout == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(Self {
            workers: cli.workers,
            fetch: FetchOptions {
                timeout: Duration::from_secs(cli.timeout),
                follow_redirects: !cli.no_redirects,
            },
            run_timeout: cli.run_timeout.map(Duration::from_secs),
            same_host_only: cli.same_host,
            extractor: cli.extractor,
            output: cli.output.clone(),
            error_log: cli.error_log.clone(),
            ..Self::new(start_url, max_depth)
        })
    }
}

/// Splits the target argument(s) into the start URL and maximum depth.
pub fn parse_target(target: &str, depth: Option<&str>) -> Result<(CanonicalUrl, u32), ConfigError> {
    let (url, depth) = match (target.rsplit_once(TARGET_SEPARATOR), depth) {
        (Some(_), Some(_)) => return Err(ConfigError::DepthGivenTwice),
        (Some((url, depth)), None) => (url, depth),
        (None, Some(depth)) => (target, depth),
        (None, None) => return Err(ConfigError::MissingDepth),
    };

    let max_depth = parse_depth(depth)?;
    let start_url = CanonicalUrl::parse(url).map_err(|source| ConfigError::InvalidStartUrl {
        url: url.trim().to_string(),
        source,
    })?;

    Ok((start_url, max_depth))
}

fn parse_depth(raw: &str) -> Result<u32, ConfigError> {
    let raw = raw.trim();
    let value: i64 = raw
        .parse()
        .map_err(|_| ConfigError::InvalidDepth(raw.to_string()))?;
    if value <= 0 {
        return Err(ConfigError::NonPositiveDepth(value));
    }
    u32::try_from(value).map_err(|_| ConfigError::InvalidDepth(raw.to_string()))
}
