use std::path::Path;

use anyhow::{Result, bail};

use crate::config;

/// `imgmatch init`: create .imgmatch/config.toml.
pub fn init(corpus: &Path, force: bool) -> Result<()> {
    if !force && config::config_file_exists() {
        bail!(".imgmatch/config.toml already exists (use --force to overwrite)");
    }

    config::write_template(corpus)?;

    let verb = if force { "Regenerated" } else { "Created" };
    println!("{verb} .imgmatch/config.toml");
    println!("  search.corpus = {}", corpus.display());
    if !corpus.is_dir() {
        println!("  (corpus directory does not exist yet)");
    }
    Ok(())
}
