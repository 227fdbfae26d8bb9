//! Shared batch progress tracking with cooperative cancellation.
//!
//! Counters and the callback list live behind a mutex; callbacks are invoked
//! outside the lock so a callback that re-enters the tracker cannot deadlock.
//! A panicking callback is caught and ignored — observers must never take
//! the pipeline down.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Batch-level progress events. Per-file stage progress is intentionally not
/// forwarded here; observers only see file-completed granularity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BatchProgressEvent {
    Started {
        total_files: usize,
    },
    FileCompleted {
        completed: usize,
        total: usize,
        path: String,
        success: bool,
    },
    Completed {
        succeeded: usize,
        failed: usize,
        duration_ms: u64,
    },
    Cancelled {
        completed: usize,
        total: usize,
    },
}

pub type ProgressCallback = Arc<dyn Fn(&BatchProgressEvent) + Send + Sync>;

struct Inner {
    completed: usize,
    total: usize,
    callbacks: Vec<ProgressCallback>,
}

pub struct ProgressTracker {
    inner: Mutex<Inner>,
    cancelled: AtomicBool,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                completed: 0,
                total: 0,
                callbacks: Vec::new(),
            }),
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self, callback: ProgressCallback) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.callbacks.push(callback);
        }
    }

    /// Request cooperative cancellation. In-flight files finish; unclaimed
    /// files are skipped at file granularity.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn completed(&self) -> usize {
        self.inner.lock().map(|inner| inner.completed).unwrap_or(0)
    }

    /// Reset counters for a new batch and announce it.
    pub fn begin(&self, total: usize) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.completed = 0;
            inner.total = total;
        }
        self.emit(&BatchProgressEvent::Started { total_files: total });
    }

    /// Record one finished file and notify observers.
    pub fn file_completed(&self, path: &str, success: bool) {
        let event = match self.inner.lock() {
            Ok(mut inner) => {
                inner.completed += 1;
                BatchProgressEvent::FileCompleted {
                    completed: inner.completed,
                    total: inner.total,
                    path: path.to_string(),
                    success,
                }
            }
            Err(_) => return,
        };
        self.emit(&event);
    }

    /// Invoke every subscribed callback with the event. The callback list is
    /// snapshotted under the lock and invoked after it is released.
    pub fn emit(&self, event: &BatchProgressEvent) {
        let callbacks: Vec<ProgressCallback> = match self.inner.lock() {
            Ok(inner) => inner.callbacks.clone(),
            Err(_) => return,
        };
        for callback in callbacks {
            let _ = catch_unwind(AssertUnwindSafe(|| callback(event)));
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
