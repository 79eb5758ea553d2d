// Submission store contract consumed by the aggregation engine.

mod memory;

use futures::future::BoxFuture;
use viridis_core::model::{Submission, SubmitterRecord};

pub use memory::MemoryStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store operation failed: {0}")]
    Operation(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Backing storage for the current color, the submission log and submitter
/// records. Every call is a suspension point; failures are reported, never
/// panicked on.
pub trait SubmissionStore: Send + Sync {
    fn set_current_color<'a>(&'a self, hex: &'a str) -> BoxFuture<'a, StoreResult<()>>;

    fn current_color(&self) -> BoxFuture<'_, StoreResult<Option<String>>>;

    /// Appends to the time-ordered log and upserts the submitter record.
    fn record_submission<'a>(&'a self, submission: &'a Submission) -> BoxFuture<'a, StoreResult<()>>;

    /// Submissions with `timestamp >= now_ms - window_ms`, ascending.
    fn recent_submissions(&self, window_ms: u64, now_ms: u64) -> BoxFuture<'_, StoreResult<Vec<Submission>>>;

    /// Removes submissions and submitter records strictly older than
    /// `cutoff_ms`. Returns how many submissions were dropped.
    fn purge_older_than(&self, cutoff_ms: u64) -> BoxFuture<'_, StoreResult<usize>>;

    fn submitter<'a>(&'a self, id: &'a str) -> BoxFuture<'a, StoreResult<Option<SubmitterRecord>>>;
}
