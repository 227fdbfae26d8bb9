//! Batch coordination over many files.
//!
//! A fixed-size pool of OS threads claims files from a shared index and runs
//! the per-file pipeline. Results come back in input order regardless of
//! completion order. A worker panic becomes a synthetic failed FileResult;
//! a file that exceeds its wall-clock budget is reported as failed and its
//! thread abandoned; cancellation is cooperative at file granularity.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::error::PipelineError;
use super::orchestrator::PipelineOrchestrator;
use super::progress::{BatchProgressEvent, ProgressTracker};
use super::types::{FileResult, PipelineStage};

/// Worker pool cap. Parsing is CPU-bound; beyond this, extra threads mostly
/// contend.
const MAX_WORKERS: usize = 8;

/// Default wall-clock budget for a single file.
const DEFAULT_FILE_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Worker thread count. None = available cores, capped at 8.
    pub worker_count: Option<usize>,
    /// Per-file wall-clock budget. A file still running past this reports as
    /// a worker failure and the pool moves on; its thread cannot be
    /// interrupted mid-parse and is left to finish in the background.
    /// None disables the budget.
    pub file_timeout: Option<Duration>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            worker_count: None,
            file_timeout: Some(DEFAULT_FILE_TIMEOUT),
        }
    }
}

/// Success/failure counts for a finished batch, failures grouped by the
/// stage they died in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures_by_stage: std::collections::BTreeMap<String, usize>,
}

pub struct BatchCoordinator {
    orchestrator: Arc<PipelineOrchestrator>,
    config: BatchConfig,
}

impl BatchCoordinator {
    pub fn new(orchestrator: PipelineOrchestrator, config: BatchConfig) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            config,
        }
    }

    fn worker_count(&self, file_count: usize) -> usize {
        let configured = self.config.worker_count.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .min(MAX_WORKERS)
        });
        configured.max(1).min(file_count.max(1))
    }

    /// Process all files, returning one FileResult per input path, in input
    /// order. Per-file stage progress is not forwarded to the tracker;
    /// observers see one event per completed file.
    pub fn process_batch(&self, paths: &[PathBuf], tracker: &ProgressTracker) -> Vec<FileResult> {
        let started = Instant::now();
        let workers = self.worker_count(paths.len());
        tracker.begin(paths.len());
        tracing::info!(files = paths.len(), workers, "Batch starting");

        let next_index = AtomicUsize::new(0);
        let collected: Mutex<Vec<(usize, FileResult)>> = Mutex::new(Vec::with_capacity(paths.len()));

        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    loop {
                        let i = next_index.fetch_add(1, Ordering::SeqCst);
                        if i >= paths.len() {
                            break;
                        }
                        let path = &paths[i];

                        let result = if tracker.is_cancelled() {
                            FileResult::failed(
                                path.clone(),
                                PipelineStage::Validating,
                                PipelineError::Cancelled.to_string(),
                            )
                        } else {
                            self.run_one(path)
                        };

                        tracker.file_completed(&path.display().to_string(), result.success);
                        if let Ok(mut slots) = collected.lock() {
                            slots.push((i, result));
                        }
                    }
                });
            }
        });

        // Re-materialize in input order. A slot can only be missing if the
        // collection lock was poisoned; that file reports as a worker failure.
        let mut by_index: Vec<Option<FileResult>> = (0..paths.len()).map(|_| None).collect();
        if let Ok(slots) = collected.into_inner() {
            for (i, result) in slots {
                by_index[i] = Some(result);
            }
        }
        let results: Vec<FileResult> = by_index
            .into_iter()
            .zip(paths)
            .map(|(slot, path)| {
                slot.unwrap_or_else(|| {
                    FileResult::failed(
                        path.clone(),
                        PipelineStage::Validating,
                        PipelineError::Worker("result lost to a worker failure".to_string())
                            .to_string(),
                    )
                })
            })
            .collect();

        let summary = summarize(&results);
        let duration_ms = started.elapsed().as_millis() as u64;
        if tracker.is_cancelled() {
            tracker.emit(&BatchProgressEvent::Cancelled {
                completed: tracker.completed(),
                total: paths.len(),
            });
            tracing::info!(completed = tracker.completed(), total = paths.len(), "Batch cancelled");
        } else {
            tracker.emit(&BatchProgressEvent::Completed {
                succeeded: summary.succeeded,
                failed: summary.failed,
                duration_ms,
            });
            tracing::info!(
                succeeded = summary.succeeded,
                failed = summary.failed,
                duration_ms,
                "Batch complete"
            );
        }

        results
    }

    fn run_one(&self, path: &PathBuf) -> FileResult {
        match self.config.file_timeout {
            Some(limit) => self.run_with_deadline(path, limit),
            None => execute(&self.orchestrator, path),
        }
    }

    /// Run one file on a detached thread and wait at most `limit` for its
    /// result. A parser blocked inside a single file (a FIFO, a pathological
    /// input) cannot be interrupted from outside, so on timeout the worker
    /// gives up on the file and the stuck thread keeps running detached; any
    /// late result it produces is dropped with the channel.
    fn run_with_deadline(&self, path: &PathBuf, limit: Duration) -> FileResult {
        let (tx, rx) = mpsc::channel();
        let orchestrator = Arc::clone(&self.orchestrator);
        let owned = path.clone();
        std::thread::spawn(move || {
            let _ = tx.send(execute(&orchestrator, &owned));
        });

        match rx.recv_timeout(limit) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::error!(
                    path = %path.display(),
                    timeout_ms = limit.as_millis() as u64,
                    "File processing timed out"
                );
                FileResult::failed(
                    path.clone(),
                    PipelineStage::Extracting,
                    PipelineError::Worker(format!(
                        "file processing timed out after {}ms",
                        limit.as_millis()
                    ))
                    .to_string(),
                )
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => FileResult::failed(
                path.clone(),
                PipelineStage::Extracting,
                PipelineError::Worker("worker exited without a result".to_string()).to_string(),
            ),
        }
    }
}

/// One file, panic-isolated: a crashing extractor or step must never take
/// the batch down.
fn execute(orchestrator: &PipelineOrchestrator, path: &PathBuf) -> FileResult {
    match catch_unwind(AssertUnwindSafe(|| orchestrator.process_file(path, None))) {
        Ok(result) => result,
        Err(panic) => {
            let message = panic_message(&panic);
            tracing::error!(path = %path.display(), message, "Worker panicked");
            FileResult::failed(
                path.clone(),
                PipelineStage::Extracting,
                PipelineError::Worker(format!("worker panicked: {message}")).to_string(),
            )
        }
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

/// Group a finished batch's results into counts.
pub fn summarize(results: &[FileResult]) -> BatchSummary {
    let mut failures_by_stage = std::collections::BTreeMap::new();
    let mut succeeded = 0;
    for result in results {
        if result.success {
            succeeded += 1;
        } else {
            let stage = result
                .failed_stage
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            *failures_by_stage.entry(stage).or_insert(0) += 1;
        }
    }
    BatchSummary {
        total: results.len(),
        succeeded,
        failed: results.len() - succeeded,
        failures_by_stage,
    }
}
