use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use imgmatch::compare::{CompareOptions, DEFAULT_EQUAL_BELOW, DEFAULT_TIMEOUT};
use imgmatch::search::SearchOptions;

use super::options::{DiffConfig, SearchConfig};
use super::{Config, load, validate_threshold};

pub const DEFAULT_CORPUS: &str = "./images";
const DEFAULT_PIXEL_THRESHOLD: f64 = 0.1;

/// Values extracted from the CLI that participate in the merge.
#[derive(Default)]
pub struct CliOverrides {
    pub diff: DiffConfig,
    pub search: SearchConfig,
}

/// Values read from `IMGMATCH_*` environment variables.
#[derive(Default)]
pub struct EnvOverrides {
    pub threshold: Option<f64>,
    pub corpus: Option<PathBuf>,
}

impl EnvOverrides {
    pub fn from_env() -> Result<Self> {
        let threshold: Option<f64> = std::env::var("IMGMATCH_DIFF_THRESHOLD")
            .ok()
            .map(|v| v.parse::<f64>())
            .transpose()
            .context("IMGMATCH_DIFF_THRESHOLD must be a valid float")?;
        let corpus = std::env::var_os("IMGMATCH_CORPUS").map(PathBuf::from);
        Ok(Self { threshold, corpus })
    }
}

/// Fully resolved config after CLI > env > file > defaults merge.
pub struct ResolvedConfig {
    pub compare: CompareOptions,
    pub search: SearchOptions,
    pub corpus: PathBuf,
}

impl ResolvedConfig {
    pub fn new(cli: CliOverrides) -> Result<Self> {
        let file = load()?;
        let env = EnvOverrides::from_env()?;
        Self::merge(file, env, cli)
    }

    pub fn merge(file: Config, env: EnvOverrides, cli: CliOverrides) -> Result<Self> {
        // 1. File layer
        let mut diff = file.diff;
        let mut search = file.search;

        // 2. Env layer
        if env.threshold.is_some() {
            diff.threshold = env.threshold;
        }
        if env.corpus.is_some() {
            search.corpus = env.corpus;
        }

        // 3. CLI layer
        diff.merge(&cli.diff);
        search.merge(&cli.search);

        let threshold = diff.threshold.unwrap_or(DEFAULT_PIXEL_THRESHOLD);
        validate_threshold(threshold).map_err(|e| anyhow::anyhow!("{e}"))?;

        let timeout = search
            .timeout_secs
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

        Ok(Self {
            compare: CompareOptions {
                threshold: threshold as f32,
                include_anti_aliasing: diff.include_anti_aliasing.unwrap_or(false),
                equal_below: diff.equal_below.unwrap_or(DEFAULT_EQUAL_BELOW),
                timeout,
            },
            search: SearchOptions {
                parallel: search.parallel.unwrap_or(1),
            },
            corpus: search
                .corpus
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CORPUS)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(threshold: Option<f64>, corpus: Option<&str>) -> Config {
        Config {
            diff: DiffConfig {
                threshold,
                ..DiffConfig::default()
            },
            search: SearchConfig {
                corpus: corpus.map(PathBuf::from),
                ..SearchConfig::default()
            },
        }
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let r = ResolvedConfig::merge(Config::default(), EnvOverrides::default(), CliOverrides::default())
            .unwrap();
        assert!((r.compare.threshold - 0.1).abs() < f32::EPSILON);
        assert!(!r.compare.include_anti_aliasing);
        assert_eq!(r.compare.equal_below, 1.0);
        assert_eq!(r.compare.timeout, DEFAULT_TIMEOUT);
        assert_eq!(r.search.parallel, 1);
        assert_eq!(r.corpus, PathBuf::from(DEFAULT_CORPUS));
    }

    #[test]
    fn env_beats_file() {
        let env = EnvOverrides {
            threshold: Some(0.3),
            corpus: Some(PathBuf::from("env-dir")),
        };
        let r = ResolvedConfig::merge(file(Some(0.2), Some("file-dir")), env, CliOverrides::default())
            .unwrap();
        assert!((r.compare.threshold - 0.3).abs() < f32::EPSILON);
        assert_eq!(r.corpus, PathBuf::from("env-dir"));
    }

    #[test]
    fn cli_beats_env_and_file() {
        let env = EnvOverrides {
            threshold: Some(0.3),
            corpus: Some(PathBuf::from("env-dir")),
        };
        let cli = CliOverrides {
            diff: DiffConfig {
                threshold: Some(0.05),
                include_anti_aliasing: Some(true),
                equal_below: Some(2.0),
            },
            search: SearchConfig {
                corpus: Some(PathBuf::from("cli-dir")),
                parallel: Some(4),
                timeout_secs: Some(5),
            },
        };
        let r = ResolvedConfig::merge(file(Some(0.2), Some("file-dir")), env, cli).unwrap();
        assert!((r.compare.threshold - 0.05).abs() < f32::EPSILON);
        assert!(r.compare.include_anti_aliasing);
        assert_eq!(r.compare.equal_below, 2.0);
        assert_eq!(r.compare.timeout, Duration::from_secs(5));
        assert_eq!(r.search.parallel, 4);
        assert_eq!(r.corpus, PathBuf::from("cli-dir"));
    }

    #[test]
    fn invalid_env_threshold_is_rejected() {
        let env = EnvOverrides {
            threshold: Some(3.0),
            corpus: None,
        };
        assert!(ResolvedConfig::merge(Config::default(), env, CliOverrides::default()).is_err());
    }
}
