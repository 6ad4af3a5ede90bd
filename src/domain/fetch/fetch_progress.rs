use tracing::{info, warn};
use uuid::Uuid;

use super::paged_fetcher::{FetchOutcome, StopReason};

/// Progress sink for a paginated download. Frontends implement this to show
/// "page N, M records so far"; every hook defaults to a no-op.
pub trait FetchProgress: Send {
    fn page_requested(&mut self, _page: usize) {}

    fn page_done(&mut self, _page: usize, _page_records: usize, _total_records: usize) {}

    /// Called once when the run ends successfully, whatever the stop reason.
    fn finished(&mut self, _outcome: &FetchOutcome) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl FetchProgress for NullProgress {}

/// Reports progress through `tracing`, tagged with the invocation id.
pub struct TracingProgress {
    invocation_id: Uuid,
}

impl TracingProgress {
    pub fn new(invocation_id: Uuid) -> Self {
        Self { invocation_id }
    }
}

impl FetchProgress for TracingProgress {
    fn page_done(&mut self, page: usize, page_records: usize, total_records: usize) {
        info!(
            invocation = %self.invocation_id,
            page,
            page_records,
            total_records,
            "📡 Page {} downloaded ({} records so far)",
            page,
            total_records
        );
    }

    fn finished(&mut self, outcome: &FetchOutcome) {
        match &outcome.stop {
            StopReason::Complete => info!(
                invocation = %self.invocation_id,
                "✅ Download complete: {} records in {} page(s)",
                outcome.records,
                outcome.pages
            ),
            StopReason::PageCap { cap } => warn!(
                invocation = %self.invocation_id,
                "Page limit of {} reached; keeping {} records collected so far",
                cap,
                outcome.records
            ),
            StopReason::ProtocolViolation { page, message } => warn!(
                invocation = %self.invocation_id,
                page,
                "Stopped early on unexpected response ({}); keeping {} records",
                message,
                outcome.records
            ),
        }
    }
}
