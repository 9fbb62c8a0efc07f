pub mod options;
pub mod resolve;
pub mod template;

use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

pub use self::options::{DiffConfig, SearchConfig};
pub use self::resolve::{CliOverrides, ResolvedConfig};
pub use self::template::{config_file_exists, write_template};

pub(crate) const CONFIG_DIR: &str = ".imgmatch";
const CONFIG_FILE: &str = "config.toml";

pub fn validate_threshold(v: f64) -> Result<f64, String> {
    if !(0.0..=1.0).contains(&v) {
        return Err(format!("threshold must be between 0.0 and 1.0, got {v}"));
    }
    Ok(v)
}

pub fn validate_equal_below(v: f64) -> Result<f64, String> {
    if !(0.0..=100.0).contains(&v) {
        return Err(format!("equal_below must be between 0 and 100, got {v}"));
    }
    Ok(v)
}

pub fn validate_parallel(v: usize) -> Result<usize, String> {
    if v == 0 {
        return Err("parallel must be at least 1".to_string());
    }
    Ok(v)
}

pub(crate) fn parse_threshold(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    validate_threshold(v)
}

pub(crate) fn parse_equal_below(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    validate_equal_below(v)
}

pub(crate) fn parse_parallel(s: &str) -> Result<usize, String> {
    let v: usize = s.parse().map_err(|e| format!("{e}"))?;
    validate_parallel(v)
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub diff: DiffConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

impl Config {
    /// Validate semantic constraints that serde cannot express.
    fn validate(&self) -> Result<()> {
        if let Some(v) = self.diff.threshold {
            validate_threshold(v).map_err(|e| anyhow::anyhow!("diff.{e}"))?;
        }
        if let Some(v) = self.diff.equal_below {
            validate_equal_below(v).map_err(|e| anyhow::anyhow!("diff.{e}"))?;
        }
        if let Some(v) = self.search.parallel {
            validate_parallel(v).map_err(|e| anyhow::anyhow!("search.{e}"))?;
        }
        if self.search.timeout_secs == Some(0) {
            bail!("search.timeout_secs must be at least 1");
        }
        Ok(())
    }
}

pub fn config_path() -> std::path::PathBuf {
    Path::new(CONFIG_DIR).join(CONFIG_FILE)
}

/// Load `.imgmatch/config.toml`, or defaults when the file does not exist.
pub fn load() -> Result<Config> {
    let path = config_path();
    if !path.exists() {
        return Ok(Config::default());
    }
    load_from(&path)
}

pub fn load_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Config =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn parses_both_sections() {
        let (_dir, path) = write(
            r#"
[diff]
threshold = 0.2
include_anti_aliasing = true
equal_below = 0.5

[search]
corpus = "shots"
parallel = 4
timeout_secs = 10
"#,
        );
        let config = load_from(&path).unwrap();
        assert_eq!(config.diff.threshold, Some(0.2));
        assert_eq!(config.diff.include_anti_aliasing, Some(true));
        assert_eq!(config.diff.equal_below, Some(0.5));
        assert_eq!(config.search.corpus, Some("shots".into()));
        assert_eq!(config.search.parallel, Some(4));
        assert_eq!(config.search.timeout_secs, Some(10));
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let (_dir, path) = write("");
        let config = load_from(&path).unwrap();
        assert!(config.diff.threshold.is_none());
        assert!(config.search.corpus.is_none());
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let (_dir, path) = write("[diff]\nthreshold = 1.5\n");
        let err = load_from(&path).unwrap_err();
        assert!(err.to_string().contains("diff.threshold"), "{err}");
    }

    #[test]
    fn zero_parallel_is_rejected() {
        let (_dir, path) = write("[search]\nparallel = 0\n");
        assert!(load_from(&path).is_err());
    }

    #[test]
    fn unparsable_file_mentions_path() {
        let (_dir, path) = write("[diff\n");
        let err = load_from(&path).unwrap_err();
        assert!(format!("{err}").contains("Failed to parse"));
    }

    #[test]
    fn parse_helpers_validate_ranges() {
        assert_eq!(parse_threshold("0.05"), Ok(0.05));
        assert!(parse_threshold("-0.1").is_err());
        assert!(parse_threshold("abc").is_err());
        assert_eq!(parse_equal_below("100"), Ok(100.0));
        assert!(parse_equal_below("100.5").is_err());
        assert_eq!(parse_parallel("3"), Ok(3));
        assert!(parse_parallel("0").is_err());
    }
}
