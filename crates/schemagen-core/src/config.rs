//! Run configuration with environment overrides.

use std::env;

use crate::scan::filesystem::DiscoveryOptions;

pub const ENV_RECURSIVE: &str = "SCHEMAGEN_RECURSIVE";
pub const ENV_INCLUDE_TESTS: &str = "SCHEMAGEN_INCLUDE_TESTS";
pub const ENV_DRY_RUN: &str = "SCHEMAGEN_DRY_RUN";
pub const ENV_WORKERS: &str = "SCHEMAGEN_WORKERS";
pub const ENV_EXCLUDE: &str = "SCHEMAGEN_EXCLUDE";

const DEFAULT_WORKERS: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    pub discovery: DiscoveryOptions,
    /// Analyse and report without rewriting any file.
    pub dry_run: bool,
    pub workers: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            discovery: DiscoveryOptions::default(),
            dry_run: false,
            workers: DEFAULT_WORKERS,
        }
    }
}

impl RunConfig {
    /// Defaults overridden by `SCHEMAGEN_*` variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup(ENV_RECURSIVE) {
            config.discovery.recursive = parse_flag(&v);
        }
        if let Some(v) = lookup(ENV_INCLUDE_TESTS) {
            config.discovery.include_tests = parse_flag(&v);
        }
        if let Some(v) = lookup(ENV_DRY_RUN) {
            config.dry_run = parse_flag(&v);
        }
        if let Some(workers) = lookup(ENV_WORKERS).and_then(|v| v.trim().parse::<usize>().ok()) {
            config.workers = workers.max(1);
        }
        if let Some(v) = lookup(ENV_EXCLUDE) {
            config.discovery.exclude = v
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        config
    }
}

/// Anything but an explicit "off" value enables the flag.
fn parse_flag(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    !matches!(v.as_str(), "0" | "false" | "no" | "off")
}
