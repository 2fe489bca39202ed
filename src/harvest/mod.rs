//! The incremental fetch-and-persist loop.
//!
//! A run loads the store, asks the API for candidates and fetches the detail
//! of every candidate the store does not know yet. Results go into the store
//! in memory, which is flushed every `save_every` processed listings, once
//! more at the end, and before any error is returned.

use crate::api::{ApiError, ListingSource};
use crate::config::{ConfigError, HarvestConfig, HarvestQuery};
use crate::filter::Blacklist;
use crate::observer::{CheckpointReason, HarvestEvent, HarvestObserver, LogObserver};
use crate::results::{Candidate, HarvestSummary, ListingRecord, ProcessedListing};
use crate::store::{DEFAULT_STORE_PATH, ResultStore, StoreError};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;


/// Number of processed listings between two store flushes
pub const DEFAULT_SAVE_EVERY: usize = 10;

/// Reasons a harvest run ends without a summary
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot create API client: {0}")]
    Client(#[source] ApiError),

    #[error("fetching candidates failed: {0}")]
    Candidates(#[source] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("harvest interrupted")]
    Interrupted,
}

/// Runs harvests against a `ListingSource`
pub struct Harvester<S> {
    source: S,
    store_path: PathBuf,
    blacklist: Blacklist,
    save_every: usize,
    retry_failed: bool,
    observer: Arc<dyn HarvestObserver>,
    interrupt: Arc<AtomicBool>,
}

impl<S: ListingSource> Harvester<S> {
    /// Create a harvester with the default store path, no blacklist and log output
    pub fn new(source: S) -> Self {
        Self {
            source,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            blacklist: Blacklist::default(),
            save_every: DEFAULT_SAVE_EVERY,
            retry_failed: false,
            observer: Arc::new(LogObserver),
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Take store path, blacklist, checkpoint interval and retry policy from `config`
    pub fn with_config(self, config: &HarvestConfig) -> Self {
        self.with_store_path(config.store_path.clone())
            .with_blacklist(config.blacklist.clone())
            .with_save_every(config.save_every)
            .with_retry_failed(config.retry_failed)
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    pub fn with_blacklist(mut self, blacklist: Blacklist) -> Self {
        self.blacklist = blacklist;
        self
    }

    /// Set the checkpoint interval; zero is treated as one
    pub fn with_save_every(mut self, save_every: usize) -> Self {
        self.save_every = save_every.max(1);
        self
    }

    /// Re-fetch listings that an earlier run stored as failed
    pub fn with_retry_failed(mut self, retry_failed: bool) -> Self {
        self.retry_failed = retry_failed;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn HarvestObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Share an interrupt flag, e.g. one set by a signal handler
    pub fn with_interrupt(mut self, interrupt: Arc<AtomicBool>) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Flag that stops the run at the next step once set
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Run one harvest for `query`.
    ///
    /// The store is always written before this returns, also on error. An
    /// interrupt is only noticed between requests; a detail response that
    /// arrives after the interrupt is dropped.
    pub async fn run(&self, query: &HarvestQuery) -> Result<HarvestSummary, HarvestError> {
        let mut store = ResultStore::load(&self.store_path)?;
        ::log::debug!(
            "Loaded {} records from {}",
            store.len(),
            store.path().display()
        );

        let candidates = match self.source.fetch_candidates(query).await {
            Ok(candidates) => candidates,
            Err(error) => {
                self.emit(HarvestEvent::CandidatesFailed {
                    error: error.to_string(),
                });
                let _ = self.checkpoint(&store, CheckpointReason::Abort);
                return Err(HarvestError::Candidates(error));
            }
        };
        self.emit(HarvestEvent::CandidatesFetched {
            count: candidates.len(),
        });

        let mut summary = HarvestSummary {
            results_json_file: store.path().to_path_buf(),
            ..HarvestSummary::default()
        };

        match self.process_candidates(&candidates, &mut store, &mut summary).await {
            Ok(()) => {
                self.checkpoint(&store, CheckpointReason::Final)?;
                Ok(summary)
            }
            Err(error) => {
                let _ = self.checkpoint(&store, CheckpointReason::Abort);
                Err(error)
            }
        }
    }

    async fn process_candidates(
        &self,
        candidates: &[Candidate],
        store: &mut ResultStore,
        summary: &mut HarvestSummary,
    ) -> Result<(), HarvestError> {
        let mut processed = 0usize;

        for candidate in candidates {
            if self.is_interrupted() {
                self.emit(HarvestEvent::Interrupted { pending: None });
                return Err(HarvestError::Interrupted);
            }

            let id = candidate.adid.as_str();
            if self.is_known(store, id) {
                summary.skipped += 1;
                self.emit(HarvestEvent::Skipped { id: id.to_string() });
                continue;
            }

            ::log::debug!("Fetching details for {}", id);
            let detail = self.source.fetch_detail(id).await;

            if self.is_interrupted() {
                self.emit(HarvestEvent::Interrupted {
                    pending: Some(id.to_string()),
                });
                return Err(HarvestError::Interrupted);
            }

            match detail.map(|payload| ListingRecord::from_detail(payload, &candidate.url)) {
                Ok(record) => self.accept(id, record, store, summary),
                Err(error) => {
                    store.insert(id, ListingRecord::failed());
                    summary.failed.push(id.to_string());
                    self.emit(HarvestEvent::Failed {
                        id: id.to_string(),
                        error: error.to_string(),
                    });
                }
            }

            processed += 1;
            if processed % self.save_every == 0 {
                self.checkpoint(store, CheckpointReason::Periodic)?;
            }
        }

        Ok(())
    }

    /// Classify a fetched listing and file it in the store and the summary
    fn accept(
        &self,
        id: &str,
        mut record: ListingRecord,
        store: &mut ResultStore,
        summary: &mut HarvestSummary,
    ) {
        let keyword = self
            .blacklist
            .matching_keyword(record.title(), record.description())
            .map(str::to_string);
        record.blacklisted = keyword.is_some();

        store.insert(id, record.clone());
        self.emit(HarvestEvent::Processed {
            id: id.to_string(),
            blacklisted: record.blacklisted,
            keyword,
        });

        let listing = ProcessedListing {
            id: id.to_string(),
            record,
        };
        if listing.record.blacklisted {
            summary.blacklisted.push(listing);
        } else {
            summary.new_processed.push(listing);
        }
    }

    /// Whether `id` was handled by an earlier run (or earlier in this one)
    fn is_known(&self, store: &ResultStore, id: &str) -> bool {
        match store.get(id) {
            Some(record) => !(self.retry_failed && record.failed),
            None => false,
        }
    }

    fn is_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::SeqCst)
    }

    fn checkpoint(&self, store: &ResultStore, reason: CheckpointReason) -> Result<(), StoreError> {
        match store.save() {
            Ok(()) => {
                self.emit(HarvestEvent::Checkpoint {
                    reason,
                    records: store.len(),
                    path: store.path().to_path_buf(),
                });
                Ok(())
            }
            Err(error) => {
                self.emit(HarvestEvent::CheckpointFailed {
                    reason,
                    error: error.to_string(),
                });
                Err(error)
            }
        }
    }

    fn emit(&self, event: HarvestEvent) {
        self.observer.emit(event);
    }
}
