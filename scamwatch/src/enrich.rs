use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, instrument, warn};

use crate::entry::EntryList;
use crate::urlscan::Scanner;

/// Value recorded in place of a report when a scan could not be submitted.
pub const ERROR_MARKER: &str = "(Error)";

/// Submits every new entry for scanning and records the outcome on the entry.
pub struct EnrichStage {
    scanner: Arc<dyn Scanner>,
}

impl EnrichStage {
    pub fn new(scanner: Arc<dyn Scanner>) -> Self {
        Self { scanner }
    }

    /// Scans run concurrently; the returned list keeps the input order.
    /// A failed scan never aborts the stage.
    #[instrument(skip_all, fields(scanner = self.scanner.name(), count = entries.len()))]
    pub async fn run(&self, entries: EntryList) -> EntryList {
        let futures = entries.into_iter().map(|mut entry| {
            let scanner = self.scanner.clone();
            async move {
                let outcome = scanner.scan(entry.url()).await;
                match outcome {
                    Ok(report) => entry.set_scan(report.0),
                    Err(e) => {
                        warn!(url = entry.url(), error = %e, "scan failed");
                        entry.set_scan(ERROR_MARKER);
                    }
                }
                entry
            }
        });

        let enriched = join_all(futures).await;
        debug!(count = enriched.len(), "enrichment complete");
        enriched
    }
}
