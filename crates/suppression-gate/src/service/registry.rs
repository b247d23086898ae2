//! # Suppression Registry
//!
//! The single owned aggregate holding the [`SuppressionStore`] and the
//! [`SuppressionIndex`] behind one `RwLock`.
//!
//! ## Concurrency
//!
//! - `lookup`, `get_all`, `get_by_id`, `stats`: shared read lock, never
//!   block each other
//! - `create`, `update`, `delete`, `rebuild_index`: exclusive write lock; the
//!   store change and the index patch are applied under the same guard so a
//!   reader sees either both or neither
//!
//! The generation counter is bumped inside the write lock after every change
//! to the index, so a reader holding the read lock observes a generation that
//! matches the data it reads.
//!
//! ## Inconsistency Handling
//!
//! If an incremental patch finds that a pair it must retract is absent from
//! the index, the store change is rolled back, the index is rebuilt from the
//! store and `InternalInconsistency` is returned.

use parking_lot::RwLock;
use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::domain::{
    SuppressionError, SuppressionIndex, SuppressionList, SuppressionListDraft, SuppressionStats,
    SuppressionStore,
};
use crate::metrics::{MetricsRecorder, Mutation, NoOpMetrics};
use crate::ports::{SystemTimeSource, TimeSource};

/// Summary of a bulk load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    /// Records rejected by validation or with a duplicate id.
    pub skipped: usize,
    /// Distinct identifiers in the index after the load.
    pub identifiers: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
struct RegistryState {
    store: SuppressionStore,
    index: SuppressionIndex,
}

impl RegistryState {
    fn rebuild(&mut self) {
        self.index = SuppressionIndex::build(self.store.lists());
    }
}

/// Store + index aggregate.
pub struct SuppressionRegistry {
    state: RwLock<RegistryState>,
    generation: AtomicU64,
    clock: Arc<dyn TimeSource>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl Default for SuppressionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SuppressionRegistry {
    /// Empty registry with the system clock and no metrics.
    pub fn new() -> Self {
        Self::with_dependencies(Arc::new(SystemTimeSource), Arc::new(NoOpMetrics))
    }

    pub fn with_dependencies(clock: Arc<dyn TimeSource>, metrics: Arc<dyn MetricsRecorder>) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            generation: AtomicU64::new(0),
            clock,
            metrics,
        }
    }

    /// Bulk load lists and build the index once.
    ///
    /// Invalid records and duplicate ids are skipped with a warning. A
    /// supplied `created_at` is kept; otherwise the load time is used.
    pub fn load(&self, drafts: Vec<SuppressionListDraft>) -> LoadReport {
        let start = Instant::now();
        let mut report = LoadReport::default();
        let mut state = self.state.write();

        for (position, mut draft) in drafts.into_iter().enumerate() {
            if let Err(err) = draft.validate() {
                warn!(position, error = %err, "Skipping invalid suppression list");
                report.skipped += 1;
                continue;
            }
            let id = draft.id.take().unwrap_or_else(new_list_id);
            let created_at = draft.created_at.unwrap_or_else(|| self.clock.now());
            if let Err(err) = state.store.insert(draft.into_list(id, created_at)) {
                warn!(position, error = %err, "Skipping duplicate suppression list");
                report.skipped += 1;
                continue;
            }
            report.loaded += 1;
        }

        state.rebuild();
        self.bump_generation();
        self.metrics.record_rebuild();

        report.identifiers = state.index.len();
        report.elapsed = start.elapsed();
        info!(
            loaded = report.loaded,
            skipped = report.skipped,
            identifiers = report.identifiers,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Suppression lists loaded and index built"
        );
        report
    }

    /// Create a list and add its identifiers to the index.
    pub fn create(&self, mut draft: SuppressionListDraft) -> Result<SuppressionList, SuppressionError> {
        draft.validate()?;
        let id = draft.id.take().unwrap_or_else(new_list_id);
        let list = draft.into_list(id, self.clock.now());

        let mut state = self.state.write();
        let RegistryState { store, index } = &mut *state;

        store.insert(list.clone())?;
        let added = index.add_list(&list.advertiser_id, list.identifiers.iter().map(String::as_str));
        self.bump_generation();
        self.metrics.record_mutation(Mutation::Create);

        info!(
            list_id = %list.id,
            advertiser_id = %list.advertiser_id,
            identifiers = list.identifiers.len(),
            new_pairs = added,
            "Suppression list created"
        );
        Ok(list)
    }

    /// Every live list, ordered by creation time then id.
    pub fn get_all(&self) -> Vec<SuppressionList> {
        let state = self.state.read();
        let mut lists: Vec<SuppressionList> = state.store.lists().cloned().collect();
        lists.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        lists
    }

    pub fn get_by_id(&self, id: &str) -> Option<SuppressionList> {
        self.state.read().store.get(id).cloned()
    }

    /// Replace a list's name, advertiser and identifiers.
    ///
    /// The index is patched with the symmetric difference of the old and
    /// new identifier sets. When the advertiser changes, every old pair is
    /// retracted and every new pair added. `id` and `created_at` are kept.
    pub fn update(
        &self,
        id: &str,
        draft: SuppressionListDraft,
    ) -> Result<Option<SuppressionList>, SuppressionError> {
        draft.validate()?;

        let mut state = self.state.write();
        let RegistryState { store, index } = &mut *state;

        let Some(created_at) = store.get(id).map(|existing| existing.created_at) else {
            return Ok(None);
        };
        let list = draft.into_list(id.to_string(), created_at);
        let Some(previous) = store.replace(list.clone()) else {
            return Ok(None);
        };

        let old: HashSet<&str> = previous.identifiers.iter().map(String::as_str).collect();
        let new: HashSet<&str> = list.identifiers.iter().map(String::as_str).collect();
        let (retracted, added): (Vec<&str>, Vec<&str>) = if previous.advertiser_id == list.advertiser_id {
            (
                old.difference(&new).copied().collect(),
                new.difference(&old).copied().collect(),
            )
        } else {
            (old.iter().copied().collect(), new.iter().copied().collect())
        };

        let outcome = index.retract(&previous.advertiser_id, retracted.iter().copied(), |identifier| {
            store.covers(&previous.advertiser_id, identifier)
        });
        if !outcome.is_consistent() {
            let missing = outcome.missing.len();
            store.replace(previous);
            return Err(self.recover(&mut state, id, missing));
        }

        let new_pairs = index.add_list(&list.advertiser_id, added.iter().copied());
        self.bump_generation();
        self.metrics.record_mutation(Mutation::Update);

        info!(
            list_id = %id,
            advertiser_id = %list.advertiser_id,
            retracted = outcome.removed,
            retained = outcome.retained,
            new_pairs,
            "Suppression list updated"
        );
        Ok(Some(list))
    }

    /// Delete a list and retract its contributions from the index.
    ///
    /// Returns `Ok(false)` if no list had this id.
    pub fn delete(&self, id: &str) -> Result<bool, SuppressionError> {
        let mut state = self.state.write();
        let RegistryState { store, index } = &mut *state;

        let Some(removed) = store.remove(id) else {
            return Ok(false);
        };

        let distinct: HashSet<&str> = removed.identifiers.iter().map(String::as_str).collect();
        let outcome = index.retract(&removed.advertiser_id, distinct.iter().copied(), |identifier| {
            store.covers(&removed.advertiser_id, identifier)
        });
        if !outcome.is_consistent() {
            let missing = outcome.missing.len();
            store.insert(removed)?;
            return Err(self.recover(&mut state, id, missing));
        }

        self.bump_generation();
        self.metrics.record_mutation(Mutation::Delete);

        info!(
            list_id = %id,
            advertiser_id = %removed.advertiser_id,
            retracted = outcome.removed,
            retained = outcome.retained,
            "Suppression list deleted"
        );
        Ok(true)
    }

    /// Advertisers suppressing `identifier`. Empty for unseen identifiers.
    pub fn lookup(&self, identifier: &str) -> BTreeSet<String> {
        self.lookup_with_generation(identifier).0
    }

    /// Lookup plus the generation the answer belongs to.
    pub fn lookup_with_generation(&self, identifier: &str) -> (BTreeSet<String>, u64) {
        let state = self.state.read();
        let advertisers = state
            .index
            .get(identifier)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        (advertisers, self.generation.load(Ordering::Acquire))
    }

    /// Discard the index and rebuild it from the store.
    pub fn rebuild_index(&self) {
        let start = Instant::now();
        let mut state = self.state.write();
        state.rebuild();
        self.bump_generation();
        self.metrics.record_rebuild();
        info!(
            identifiers = state.index.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Suppression index rebuilt"
        );
    }

    /// Compare the live index with a fresh rebuild.
    ///
    /// On mismatch the rebuild is installed and `InternalInconsistency` is
    /// returned. The comparison runs under the read lock; the write lock is
    /// taken only to repair.
    pub fn verify_consistency(&self) -> Result<(), SuppressionError> {
        {
            let state = self.state.read();
            let fresh = SuppressionIndex::build(state.store.lists());
            if fresh == state.index {
                debug!(identifiers = fresh.len(), "Suppression index verified");
                return Ok(());
            }
        }

        let mut state = self.state.write();
        let fresh = SuppressionIndex::build(state.store.lists());
        let Some(identifier) = state.index.first_difference(&fresh) else {
            return Ok(());
        };
        state.index = fresh;
        self.bump_generation();
        self.metrics.record_inconsistency();
        self.metrics.record_rebuild();
        error!(identifier = %identifier, "Suppression index drifted from store; rebuilt");
        Err(SuppressionError::InternalInconsistency {
            detail: format!("index entry for identifier {} did not match store", identifier),
        })
    }

    pub fn stats(&self) -> SuppressionStats {
        let state = self.state.read();
        SuppressionStats {
            total_lists: state.store.len(),
            total_identifiers: state.index.len(),
            total_advertisers: state.store.advertiser_count(),
            index_entries: state.index.entry_count(),
            generation: self.generation.load(Ordering::Acquire),
        }
    }

    /// Mutation generation. Changes whenever the index may have changed.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn bump_generation(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Rebuild after a failed patch. The store must already be restored.
    fn recover(&self, state: &mut RegistryState, list_id: &str, missing: usize) -> SuppressionError {
        state.rebuild();
        self.bump_generation();
        self.metrics.record_inconsistency();
        self.metrics.record_rebuild();
        error!(
            list_id = %list_id,
            missing,
            "Suppression index missing expected entries; mutation rolled back and index rebuilt"
        );
        SuppressionError::InternalInconsistency {
            detail: format!(
                "{} identifier(s) of list {} were absent from the index",
                missing, list_id
            ),
        }
    }
}

fn new_list_id() -> String {
    Uuid::new_v4().to_string()
}
