//! # Suppression Store
//!
//! Authoritative collection of suppression lists and the source of truth for
//! index rebuilds.
//!
//! ## Data Structures
//!
//! - `by_id`: O(1) lookup by list id
//! - `by_advertiser`: list ids per advertiser, used to answer "does another
//!   live list of this advertiser still cover identifier X" without scanning
//!   every list in the store
//!
//! The store is not synchronized. [`crate::service::SuppressionRegistry`]
//! owns it together with the index behind one lock.

use std::collections::{HashMap, HashSet};

use super::entities::SuppressionList;
use super::errors::SuppressionError;

#[derive(Debug, Clone)]
struct StoredList {
    list: SuppressionList,
    /// Distinct identifiers, for O(1) membership tests.
    members: HashSet<String>,
}

impl StoredList {
    fn new(list: SuppressionList) -> Self {
        let members = list.identifier_set();
        Self { list, members }
    }
}

/// In-memory suppression list storage.
#[derive(Debug, Clone, Default)]
pub struct SuppressionStore {
    by_id: HashMap<String, StoredList>,
    by_advertiser: HashMap<String, HashSet<String>>,
}

impl SuppressionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new list. Fails if the id is taken.
    pub fn insert(&mut self, list: SuppressionList) -> Result<(), SuppressionError> {
        if self.by_id.contains_key(&list.id) {
            return Err(SuppressionError::invalid(
                "id",
                format!("suppression list {} already exists", list.id),
            ));
        }
        self.link(&list.advertiser_id, &list.id);
        self.by_id.insert(list.id.clone(), StoredList::new(list));
        Ok(())
    }

    /// Replace the list with the same id, returning the previous version.
    ///
    /// Returns `None` (and stores nothing) if no list has that id.
    pub fn replace(&mut self, list: SuppressionList) -> Option<SuppressionList> {
        let previous = self.by_id.remove(&list.id)?;
        if previous.list.advertiser_id != list.advertiser_id {
            self.unlink(&previous.list.advertiser_id, &list.id);
            self.link(&list.advertiser_id, &list.id);
        }
        self.by_id.insert(list.id.clone(), StoredList::new(list));
        Some(previous.list)
    }

    /// Remove a list by id.
    pub fn remove(&mut self, id: &str) -> Option<SuppressionList> {
        let stored = self.by_id.remove(id)?;
        self.unlink(&stored.list.advertiser_id, id);
        Some(stored.list)
    }

    pub fn get(&self, id: &str) -> Option<&SuppressionList> {
        self.by_id.get(id).map(|stored| &stored.list)
    }

    /// All live lists, in no particular order.
    pub fn lists(&self) -> impl Iterator<Item = &SuppressionList> {
        self.by_id.values().map(|stored| &stored.list)
    }

    /// True if some live list of `advertiser_id` contains `identifier`.
    pub fn covers(&self, advertiser_id: &str, identifier: &str) -> bool {
        self.by_advertiser.get(advertiser_id).is_some_and(|ids| {
            ids.iter().any(|id| {
                self.by_id
                    .get(id)
                    .is_some_and(|stored| stored.members.contains(identifier))
            })
        })
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Advertisers owning at least one list.
    pub fn advertiser_count(&self) -> usize {
        self.by_advertiser.len()
    }

    fn link(&mut self, advertiser_id: &str, id: &str) {
        self.by_advertiser
            .entry(advertiser_id.to_string())
            .or_default()
            .insert(id.to_string());
    }

    fn unlink(&mut self, advertiser_id: &str, id: &str) {
        if let Some(ids) = self.by_advertiser.get_mut(advertiser_id) {
            ids.remove(id);
            if ids.is_empty() {
                self.by_advertiser.remove(advertiser_id);
            }
        }
    }
}
