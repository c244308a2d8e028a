//! Progress-callback trait for batch conversion events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::convert::Engine::with_progress`] to receive events as the
//! converters work through the input directory.
//!
//! # Why callbacks instead of return values?
//!
//! The [`RunReport`] already carries every outcome, but only once the run is
//! over. A callback lets a host application drive a progress bar or forward
//! events elsewhere while a long batch is still rendering, without the
//! library knowing how the host communicates.
//!
//! # Example
//!
//! ```rust
//! use pdfbatch::{BatchProgressCallback, ItemOutcome};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingCallback {
//!     done: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_item(&self, outcome: &ItemOutcome) {
//!         let n = self.done.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("{n}: {}", outcome.source.display());
//!     }
//! }
//! ```

use crate::report::{ItemOutcome, RunReport};
use crate::settings::WorkMode;
use std::sync::Arc;

/// Called by the converters as they process a batch.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Runs are sequential, so events arrive in order.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after listing, before the first item.
    ///
    /// # Arguments
    /// * `mode`   — direction of the run
    /// * `inputs` — number of input files discovered
    fn on_run_start(&self, mode: WorkMode, inputs: usize) {
        let _ = (mode, inputs);
    }

    /// Called after each item (image, merged PDF or page) was attempted.
    fn on_item(&self, outcome: &ItemOutcome) {
        let _ = outcome;
    }

    /// Called once when the run returns, including runs that stopped early.
    fn on_run_complete(&self, report: &RunReport) {
        let _ = report;
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias for the shared callback handle held by converters.
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;

/// Default handle used when nothing is injected.
pub(crate) fn noop() -> ProgressCallback {
    Arc::new(NoopProgressCallback)
}
