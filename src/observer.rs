//! Progress reporting for the harvest loop.
//!
//! The loop never logs on its own: it reports what happens to the observer it
//! was given. `LogObserver` turns the events into log lines.

use std::path::PathBuf;

/// Why the store was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointReason {
    /// Every `save_every` processed listings
    Periodic,
    /// After the last candidate
    Final,
    /// Before returning an error or after an interrupt
    Abort,
}

/// Something that happened during a harvest run
#[derive(Debug, Clone, PartialEq)]
pub enum HarvestEvent {
    /// The search returned `count` candidates
    CandidatesFetched { count: usize },
    /// The search failed; the run stops
    CandidatesFailed { error: String },
    /// Listing already in the store, no detail request made
    Skipped { id: String },
    /// Listing stored with its detail
    Processed {
        id: String,
        blacklisted: bool,
        keyword: Option<String>,
    },
    /// Detail request failed; a placeholder was stored
    Failed { id: String, error: String },
    /// Store written to disk
    Checkpoint {
        reason: CheckpointReason,
        records: usize,
        path: PathBuf,
    },
    /// Writing the store failed
    CheckpointFailed {
        reason: CheckpointReason,
        error: String,
    },
    /// Interrupt observed; `pending` is the listing whose result was dropped
    Interrupted { pending: Option<String> },
}

/// Receiver of harvest progress events
pub trait HarvestObserver {
    fn emit(&self, event: HarvestEvent);
}

/// Writes every event to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl HarvestObserver for LogObserver {
    fn emit(&self, event: HarvestEvent) {
        match event {
            HarvestEvent::CandidatesFetched { count } => {
                ::log::info!("Search returned {} listings", count);
            }
            HarvestEvent::CandidatesFailed { error } => {
                ::log::error!("No listings returned: {}", error);
            }
            HarvestEvent::Skipped { id } => {
                ::log::info!("Skipping already-processed listing: {}", id);
            }
            HarvestEvent::Processed {
                id,
                blacklisted: true,
                keyword,
            } => {
                ::log::info!(
                    "Listing {} is blacklisted (keyword '{}')",
                    id,
                    keyword.unwrap_or_default()
                );
            }
            HarvestEvent::Processed { id, .. } => {
                ::log::info!("Stored listing {}", id);
            }
            HarvestEvent::Failed { id, error } => {
                ::log::error!("Error fetching details for listing {}: {}", id, error);
            }
            HarvestEvent::Checkpoint {
                reason,
                records,
                path,
            } => {
                ::log::info!(
                    "Saved {} records to {} ({:?})",
                    records,
                    path.display(),
                    reason
                );
            }
            HarvestEvent::CheckpointFailed { reason, error } => {
                ::log::error!("Failed to save results ({:?}): {}", reason, error);
            }
            HarvestEvent::Interrupted { pending } => match pending {
                Some(id) => ::log::warn!("Interrupted while fetching {}, saving partial results", id),
                None => ::log::warn!("Interrupted, saving partial results"),
            },
        }
    }
}

/// Discards all events
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl HarvestObserver for NullObserver {
    fn emit(&self, _event: HarvestEvent) {}
}
