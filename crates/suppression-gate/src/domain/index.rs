//! # Suppression Index
//!
//! Reverse mapping from identifier to the set of advertisers suppressing it.
//!
//! ## Data Structures
//!
//! - `entries`: `HashMap<identifier, HashSet<advertiser_id>>`, O(1) expected lookup
//!
//! ## Maintenance
//!
//! | Strategy | Cost | Used for |
//! |----------|------|----------|
//! | [`SuppressionIndex::build`] | O(total identifiers) | startup, correctness fallback |
//! | [`SuppressionIndex::add_list`] | O(list identifiers) | create, update additions |
//! | [`SuppressionIndex::retract`] | O(list identifiers x covering lists) | delete, update removals |
//!
//! ## Invariants
//!
//! - Every (identifier, advertiser) pair traces back to a live list.
//! - No entry maps to an empty set.

use std::collections::{HashMap, HashSet};

use super::entities::SuppressionList;

/// Outcome of retracting one list's contributions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetractOutcome {
    /// Pairs removed from the index.
    pub removed: usize,
    /// Pairs kept because another live list still covers them.
    pub retained: usize,
    /// Identifiers that should have mapped to the advertiser but did not.
    /// Non-empty means the index had drifted from the store.
    pub missing: Vec<String>,
}

impl RetractOutcome {
    pub fn is_consistent(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Identifier -> advertiser set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuppressionIndex {
    entries: HashMap<String, HashSet<String>>,
}

impl SuppressionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full rebuild from a set of lists.
    pub fn build<'a, I>(lists: I) -> Self
    where
        I: IntoIterator<Item = &'a SuppressionList>,
    {
        let mut index = Self::new();
        for list in lists {
            index.add_list(&list.advertiser_id, list.identifiers.iter().map(String::as_str));
        }
        index
    }

    /// Union every identifier's set with `advertiser_id`.
    ///
    /// Returns the number of pairs that were not present before.
    pub fn add_list<'a, I>(&mut self, advertiser_id: &str, identifiers: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        identifiers
            .into_iter()
            .filter(|identifier| self.insert(identifier, advertiser_id))
            .count()
    }

    /// Add one pair. Returns true if it was new.
    pub fn insert(&mut self, identifier: &str, advertiser_id: &str) -> bool {
        match self.entries.get_mut(identifier) {
            Some(set) => {
                if set.contains(advertiser_id) {
                    false
                } else {
                    set.insert(advertiser_id.to_string())
                }
            }
            None => {
                let mut set = HashSet::with_capacity(1);
                set.insert(advertiser_id.to_string());
                self.entries.insert(identifier.to_string(), set);
                true
            }
        }
    }

    /// Remove one pair, dropping the entry once its set is empty.
    /// Returns true if the pair was present.
    pub fn remove(&mut self, identifier: &str, advertiser_id: &str) -> bool {
        let Some(set) = self.entries.get_mut(identifier) else {
            return false;
        };
        let removed = set.remove(advertiser_id);
        if set.is_empty() {
            self.entries.remove(identifier);
        }
        removed
    }

    /// Retract `advertiser_id` from `identifiers`.
    ///
    /// `still_covered(identifier)` must answer whether some remaining live
    /// list of the same advertiser contains the identifier; such pairs are
    /// kept. Callers pass distinct identifiers.
    pub fn retract<'a, I, F>(
        &mut self,
        advertiser_id: &str,
        identifiers: I,
        mut still_covered: F,
    ) -> RetractOutcome
    where
        I: IntoIterator<Item = &'a str>,
        F: FnMut(&str) -> bool,
    {
        let mut outcome = RetractOutcome::default();
        for identifier in identifiers {
            if !self.contains(identifier, advertiser_id) {
                outcome.missing.push(identifier.to_string());
                continue;
            }
            if still_covered(identifier) {
                outcome.retained += 1;
            } else {
                self.remove(identifier, advertiser_id);
                outcome.removed += 1;
            }
        }
        outcome
    }

    /// Advertisers suppressing `identifier`, if any.
    pub fn get(&self, identifier: &str) -> Option<&HashSet<String>> {
        self.entries.get(identifier)
    }

    /// Advertisers suppressing `identifier`. Empty for unseen identifiers.
    pub fn lookup(&self, identifier: &str) -> HashSet<String> {
        self.entries.get(identifier).cloned().unwrap_or_default()
    }

    pub fn contains(&self, identifier: &str, advertiser_id: &str) -> bool {
        self.entries
            .get(identifier)
            .is_some_and(|set| set.contains(advertiser_id))
    }

    /// Distinct identifiers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total (identifier, advertiser) pairs.
    pub fn entry_count(&self) -> usize {
        self.entries.values().map(HashSet::len).sum()
    }

    /// First identifier whose advertiser set differs from `other`'s.
    pub fn first_difference(&self, other: &SuppressionIndex) -> Option<String> {
        if let Some((identifier, _)) = self
            .entries
            .iter()
            .find(|(identifier, set)| other.entries.get(*identifier) != Some(*set))
        {
            return Some(identifier.clone());
        }
        other
            .entries
            .keys()
            .find(|identifier| !self.entries.contains_key(*identifier))
            .cloned()
    }
}
