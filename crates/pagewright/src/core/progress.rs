//! Per-page progress reporting for batch runs.

use serde::{Deserialize, Serialize};
use std::sync::mpsc::Sender;

/// Emitted once after each page completes, whether it succeeded or failed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageProgress {
    pub page_index: usize,
    pub total_pages: usize,
    pub percent_complete: f64,
}

impl PageProgress {
    pub fn new(page_index: usize, total_pages: usize) -> Self {
        let percent_complete = if total_pages == 0 {
            100.0
        } else {
            (page_index + 1) as f64 / total_pages as f64 * 100.0
        };
        Self {
            page_index,
            total_pages,
            percent_complete,
        }
    }
}

/// Receives one [`PageProgress`] per completed page. Never called with partial
/// region state.
///
/// Implemented for closures and for `std::sync::mpsc::Sender<PageProgress>`.
pub trait ProgressObserver {
    fn on_page(&mut self, progress: PageProgress);
}

impl<F> ProgressObserver for F
where
    F: FnMut(PageProgress),
{
    fn on_page(&mut self, progress: PageProgress) {
        self(progress)
    }
}

impl ProgressObserver for Sender<PageProgress> {
    fn on_page(&mut self, progress: PageProgress) {
        if self.send(progress).is_err() {
            tracing::debug!(page_index = progress.page_index, "progress receiver dropped");
        }
    }
}

/// Observer that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_page(&mut self, _progress: PageProgress) {}
}
