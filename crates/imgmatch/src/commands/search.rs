use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use imgmatch::SimilaritySearch;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{EXIT_FAILURE, EXIT_NEGATIVE, EXIT_OK};
use crate::config::ResolvedConfig;
use crate::report;

/// Which slice of the ranking to report.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SearchView {
    /// Best match plus the full ranking.
    All,
    /// The `n` most similar images.
    Top(usize),
    /// Images with at least this similarity.
    Above(f64),
}

impl SearchView {
    pub fn from_flags(top: Option<usize>, min_similarity: Option<f64>) -> Self {
        match (top, min_similarity) {
            (Some(n), _) => Self::Top(n),
            (None, Some(min)) => Self::Above(min),
            (None, None) => Self::All,
        }
    }
}

/// `imgmatch search`: rank the corpus against `query`.
///
/// Returns the process exit code: 0 when at least one image is reported,
/// 1 when the selected view is empty, 2 when the search failed.
pub async fn search(
    config: ResolvedConfig,
    query: &Path,
    view: SearchView,
    json: bool,
) -> Result<i32> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling scan");
            on_interrupt.cancel();
        }
    });

    let corpus = config.corpus.clone();
    let engine = SimilaritySearch::new(&corpus, config.compare)
        .with_options(config.search)
        .with_cancellation(cancel);
    let start = Instant::now();

    let ranked = match engine.find_best_match(query).await {
        Ok(ranked) => ranked,
        Err(e) => {
            if json {
                report::json::print_failure(&e.to_string())?;
            } else {
                report::terminal::print_error_line(&query.display().to_string(), &e.to_string());
            }
            return Ok(EXIT_FAILURE);
        }
    };
    let elapsed = start.elapsed();
    let compared = ranked.comparisons().len();

    let shown = match view {
        SearchView::All => {
            if json {
                report::json::print_best_match(&ranked)?;
            } else {
                report::terminal::print_ranking(ranked.comparisons());
                report::terminal::print_best_match(ranked.best());
            }
            compared
        }
        SearchView::Top(n) => {
            let top = ranked.top(n);
            if json {
                report::json::print_top(&top)?;
            } else {
                report::terminal::print_ranking(&top.images);
            }
            top.images.len()
        }
        SearchView::Above(min) => {
            let above = ranked.above(min);
            if json {
                report::json::print_above(&above)?;
            } else {
                report::terminal::print_ranking(&above.images);
                if above.images.is_empty() {
                    println!("  no image reached {min:.2}% similarity");
                }
            }
            above.images.len()
        }
    };

    if !json {
        report::terminal::print_search_summary(shown, compared, &corpus, elapsed);
    }

    Ok(if shown > 0 { EXIT_OK } else { EXIT_NEGATIVE })
}
