use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use imgmatch::{Comparator, ComparisonResult};
use tracing::info;

use super::{EXIT_FAILURE, EXIT_NEGATIVE, EXIT_OK};
use crate::config::ResolvedConfig;
use crate::report;

/// Where and when to write the diff overlay.
#[derive(Debug, Default)]
pub struct DiffOutput {
    path: Option<PathBuf>,
    always: bool,
}

impl DiffOutput {
    pub fn new(path: Option<PathBuf>, always: bool) -> Self {
        Self { path, always }
    }

    /// Target path for `result`, if an overlay should be written for it.
    fn target(&self, result: &ComparisonResult) -> Option<&Path> {
        let path = self.path.as_deref()?;
        (self.always || !result.visually_equal).then_some(path)
    }
}

/// `imgmatch compare`: compare two images.
///
/// Returns the process exit code: 0 when visually equal, 1 when different,
/// 2 when the comparison could not be made.
pub async fn compare(
    config: ResolvedConfig,
    first: &Path,
    second: &Path,
    output: DiffOutput,
    json: bool,
) -> Result<i32> {
    let comparator = Comparator::new(config.compare);
    let start = Instant::now();

    let result = match comparator.compare(first, second).await {
        Ok(result) => result,
        Err(e) => {
            if json {
                report::json::print_failure(&e.to_string())?;
            } else {
                report::terminal::print_error_line(&pair_label(first, second), &e.to_string());
            }
            return Ok(EXIT_FAILURE);
        }
    };
    let elapsed = start.elapsed();

    let saved = output.target(&result).filter(|p| comparator.export_diff(p));

    info!(
        difference = result.difference_percent,
        equal = result.visually_equal,
        elapsed_ms = elapsed.as_millis() as u64,
        "compare complete"
    );

    if json {
        report::json::print_comparison(&result, saved)?;
    } else {
        report::terminal::print_comparison(first, second, &result, saved, elapsed);
    }

    Ok(if result.visually_equal {
        EXIT_OK
    } else {
        EXIT_NEGATIVE
    })
}

fn pair_label(first: &Path, second: &Path) -> String {
    format!("{} vs {}", first.display(), second.display())
}
