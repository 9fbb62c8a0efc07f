//! Rank every image in a corpus directory by similarity to a query image.

pub mod corpus;
mod runner;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use self::runner::ScanOutcome;
use crate::compare::{CompareOptions, Comparator, ComparisonResult};
use crate::error::{CompareError, SearchError};
use crate::raster::{self, RawImage};

#[derive(Clone, Debug)]
pub struct SearchOptions {
    /// Comparisons in flight at once. `1` scans strictly sequentially.
    pub parallel: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { parallel: 1 }
    }
}

/// A corpus entry scored against the query.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Candidate {
    /// File name within the corpus.
    pub name: String,
    pub path: PathBuf,
    /// `100 - difference`, rounded to 2 decimals.
    pub similarity: f64,
    /// Difference percentage reported by the comparator.
    pub difference: f64,
    pub differing_pixels: u64,
}

impl Candidate {
    fn new(path: PathBuf, result: &ComparisonResult) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            path,
            similarity: result.similarity(),
            difference: result.difference_percent,
            differing_pixels: result.differing_pixels,
        }
    }
}

/// Candidates ranked by descending similarity. Never empty.
#[derive(Clone, Debug, Serialize)]
pub struct SearchResult {
    comparisons: Vec<Candidate>,
}

impl SearchResult {
    /// Rank `candidates`, which must be in corpus enumeration order; ties keep
    /// that order. Returns `None` for an empty list.
    fn ranked(mut candidates: Vec<Candidate>) -> Option<Self> {
        if candidates.is_empty() {
            return None;
        }
        // Stable: equal similarities keep enumeration order.
        candidates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        Some(Self {
            comparisons: candidates,
        })
    }

    /// The most similar candidate.
    pub fn best(&self) -> &Candidate {
        &self.comparisons[0]
    }

    /// Every successfully compared candidate, best first.
    pub fn comparisons(&self) -> &[Candidate] {
        &self.comparisons
    }

    pub fn into_comparisons(self) -> Vec<Candidate> {
        self.comparisons
    }

    /// Keep the first `n` candidates.
    pub fn top(self, n: usize) -> TopMatches {
        let total = self.comparisons.len();
        let mut images = self.comparisons;
        images.truncate(n);
        TopMatches { images, total }
    }

    /// Keep candidates with `similarity >= min_similarity`.
    pub fn above(self, min_similarity: f64) -> ThresholdMatches {
        let images: Vec<Candidate> = self
            .comparisons
            .into_iter()
            .filter(|c| c.similarity >= min_similarity)
            .collect();
        ThresholdMatches {
            total: images.len(),
            images,
            threshold: min_similarity,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TopMatches {
    pub images: Vec<Candidate>,
    /// Number of ranked candidates before truncation.
    pub total: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct ThresholdMatches {
    pub images: Vec<Candidate>,
    /// Number of candidates that met the threshold.
    pub total: usize,
    pub threshold: f64,
}

/// Exhaustive similarity search over a corpus directory.
pub struct SimilaritySearch {
    corpus: PathBuf,
    comparator: Arc<Comparator>,
    options: SearchOptions,
    cancel: CancellationToken,
}

impl SimilaritySearch {
    pub fn new(corpus: impl Into<PathBuf>, compare: CompareOptions) -> Self {
        Self {
            corpus: corpus.into(),
            comparator: Arc::new(Comparator::new(compare)),
            options: SearchOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    /// Abort scans once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn corpus(&self) -> &Path {
        &self.corpus
    }

    /// Compare `query` with every image in the corpus and rank the results.
    ///
    /// The query is decoded once, before the corpus is listed. Candidates that
    /// fail to compare are left out of the ranking. The scan fails only when
    /// the query cannot be read or decoded, the corpus holds no images, no
    /// candidate could be compared, or the scan is cancelled.
    pub async fn find_best_match(&self, query: &Path) -> Result<SearchResult, SearchError> {
        let query_image = decode_query(query).await?;

        let candidates = corpus::list_candidates(&self.corpus)?;
        if candidates.is_empty() {
            return Err(SearchError::EmptyCorpus {
                dir: self.corpus.clone(),
            });
        }

        let attempted = candidates.len();
        info!(
            query = %query.display(),
            corpus = %self.corpus.display(),
            candidates = attempted,
            parallel = self.options.parallel,
            "scanning corpus"
        );

        let outcomes = if self.options.parallel > 1 {
            runner::compare_parallel(
                self.comparator.clone(),
                query_image,
                candidates,
                self.options.parallel,
                &self.cancel,
            )
            .await
        } else {
            runner::compare_sequential(&self.comparator, query_image, candidates, &self.cancel)
                .await
        };

        if self.cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        let mut scored = Vec::with_capacity(outcomes.len());
        for ScanOutcome {
            index: _,
            path,
            result,
        } in outcomes
        {
            match result {
                Ok(result) => scored.push(Candidate::new(path, &result)),
                Err(e) => debug!(candidate = %path.display(), error = %e, "dropping candidate"),
            }
        }

        let compared = scored.len();
        let ranked = SearchResult::ranked(scored).ok_or_else(|| {
            SearchError::AllComparisonsFailed {
                dir: self.corpus.clone(),
                attempted,
            }
        })?;

        let best = ranked.best();
        info!(
            compared,
            dropped = attempted - compared,
            best = %best.name,
            similarity = best.similarity,
            "scan complete"
        );
        Ok(ranked)
    }

    /// The `n` most similar candidates.
    pub async fn find_top_n(&self, query: &Path, n: usize) -> Result<TopMatches, SearchError> {
        Ok(self.find_best_match(query).await?.top(n))
    }

    /// Candidates with `similarity >= min_similarity`. An empty selection is
    /// not an error.
    pub async fn find_above_threshold(
        &self,
        query: &Path,
        min_similarity: f64,
    ) -> Result<ThresholdMatches, SearchError> {
        Ok(self.find_best_match(query).await?.above(min_similarity))
    }
}

/// Decode the query on the blocking pool. Any failure here is a query error,
/// not a candidate failure.
async fn decode_query(query: &Path) -> Result<Arc<RawImage>, SearchError> {
    let path = query.to_path_buf();
    let loaded = tokio::task::spawn_blocking(move || raster::load(&path))
        .await
        .unwrap_or_else(|e| Err(CompareError::Task(e.to_string())));

    match loaded {
        Ok(image) => {
            debug!(
                query = %query.display(),
                width = image.width(),
                height = image.height(),
                "query decoded"
            );
            Ok(Arc::new(image))
        }
        Err(CompareError::Access { path, source }) => {
            Err(SearchError::QueryAccess { path, source })
        }
        Err(source) => Err(SearchError::QueryDecode {
            path: query.to_path_buf(),
            source,
        }),
    }
}
