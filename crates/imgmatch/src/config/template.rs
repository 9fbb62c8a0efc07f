use std::path::Path;

use anyhow::{Context, Result};

use super::{CONFIG_DIR, config_path};

/// Hand-crafted config template with commented-out keys.
/// Used by `imgmatch init` instead of `toml::to_string_pretty()` so that
/// users can see the available knobs and their defaults.
const CONFIG_TEMPLATE: &str = r#"# ─────────────────────────────────────────────────────────
# Comparison: all fields optional.
# ─────────────────────────────────────────────────────────
[diff]
# threshold = 0.1                   # per-pixel color sensitivity (0.0-1.0)
# include_anti_aliasing = false     # count anti-aliased pixels as differences
# equal_below = 1.0                 # % of differing pixels below which images are equal

# ─────────────────────────────────────────────────────────
# Corpus search: all fields optional.
# ─────────────────────────────────────────────────────────
[search]
corpus = {corpus}
# parallel = 1                      # concurrent comparisons (1 = sequential)
# timeout_secs = 30                 # per-comparison timeout
"#;

pub fn config_file_exists() -> bool {
    config_path().exists()
}

/// Write the config template into `.imgmatch/config.toml`.
pub fn write_template(corpus: &Path) -> Result<()> {
    let dir = Path::new(CONFIG_DIR);
    std::fs::create_dir_all(dir).context("Failed to create .imgmatch directory")?;
    let path = config_path();
    std::fs::write(&path, render(corpus))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn render(corpus: &Path) -> String {
    let corpus = toml::Value::String(corpus.display().to_string()).to_string();
    CONFIG_TEMPLATE.replace("{corpus}", &corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn rendered_template_parses_back() {
        let rendered = render(Path::new("./shots"));
        let config: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(config.search.corpus, Some("./shots".into()));
        assert!(config.diff.threshold.is_none());
    }

    #[test]
    fn backslashes_are_escaped() {
        let rendered = render(Path::new(r"C:\shots"));
        let config: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(config.search.corpus, Some(r"C:\shots".into()));
    }

    #[test]
    fn quotes_in_corpus_path_survive() {
        let corpus = Path::new(r#"shots/"final" cut\v2"#);
        let rendered = render(corpus);
        let config: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(config.search.corpus.as_deref(), Some(corpus));
    }
}
