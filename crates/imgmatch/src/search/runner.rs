use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info_span, warn};

use crate::compare::{Comparator, ComparisonResult};
use crate::error::CompareError;
use crate::raster::RawImage;

/// Comparison outcome for one corpus entry.
pub(super) struct ScanOutcome {
    /// Position in corpus enumeration order.
    pub index: usize,
    pub path: PathBuf,
    pub result: Result<ComparisonResult, CompareError>,
}

/// Compare the decoded `query` against every candidate, one pair at a time.
pub(super) async fn compare_sequential(
    comparator: &Comparator,
    query: Arc<RawImage>,
    candidates: Vec<PathBuf>,
    cancel: &CancellationToken,
) -> Vec<ScanOutcome> {
    let total = candidates.len();
    let mut outcomes = Vec::with_capacity(total);
    for (index, path) in candidates.into_iter().enumerate() {
        if cancel.is_cancelled() {
            debug!(done = index, total, "scan cancelled");
            break;
        }
        debug!(done = index, total, candidate = %path.display(), "comparing");
        let result = comparator
            .compare_decoded(Arc::clone(&query), &path, cancel)
            .await;
        outcomes.push(ScanOutcome {
            index,
            path,
            result,
        });
    }
    outcomes
}

/// Compare `query` against every candidate with up to `parallel` workers
/// pulling from a shared queue.
///
/// Outcomes come back in corpus enumeration order regardless of completion
/// order.
pub(super) async fn compare_parallel(
    comparator: Arc<Comparator>,
    query: Arc<RawImage>,
    candidates: Vec<PathBuf>,
    parallel: usize,
    cancel: &CancellationToken,
) -> Vec<ScanOutcome> {
    let job_count = candidates.len();
    let worker_count = job_count.min(parallel.max(1));
    debug!(
        jobs = job_count,
        workers = worker_count,
        parallel,
        "starting parallel scan"
    );

    let queue: Vec<(usize, PathBuf)> = candidates.into_iter().enumerate().collect();
    let queue = Arc::new(Mutex::new(queue));

    let (tx, mut rx) = mpsc::channel(worker_count.max(1) * 2);

    let mut set = tokio::task::JoinSet::new();
    for idx in 0..worker_count {
        let queue = queue.clone();
        let tx = tx.clone();
        let comparator = comparator.clone();
        let query = query.clone();
        let cancel = cancel.clone();
        let span = info_span!("worker", id = idx);
        set.spawn(
            async move {
                debug!("started");
                loop {
                    if cancel.is_cancelled() {
                        debug!("cancelled, exiting");
                        break;
                    }

                    let (index, path) = {
                        let mut q = queue.lock().await;
                        match q.pop() {
                            Some(job) => job,
                            None => {
                                debug!("queue empty, exiting");
                                break;
                            }
                        }
                    };
                    debug!(candidate = %path.display(), "picked job");

                    let result = comparator
                        .compare_decoded(Arc::clone(&query), &path, &cancel)
                        .await;
                    if let Err(e) = &result {
                        debug!(candidate = %path.display(), error = %e, "comparison failed");
                    }

                    if tx
                        .send(ScanOutcome {
                            index,
                            path,
                            result,
                        })
                        .await
                        .is_err()
                    {
                        warn!("channel send failed (receiver dropped), stopping");
                        break;
                    }
                }
                debug!("exiting");
            }
            .instrument(span),
        );
    }

    // Channel closes once every worker has dropped its sender.
    drop(tx);

    let mut outcomes = Vec::with_capacity(job_count);
    while let Some(outcome) = rx.recv().await {
        outcomes.push(outcome);
    }
    while let Some(joined) = set.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "worker task panicked");
        }
    }

    outcomes.sort_by_key(|o| o.index);
    outcomes
}
