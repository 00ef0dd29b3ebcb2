//! Ordered stop selection
//!
//! The selection keeps the monuments chosen across any number of searches, in
//! the order they were picked. It never holds more than [`MAX_STOPS`] entries
//! and never holds the same id twice. Every mutation bumps a version number so
//! asynchronous callbacks can detect that the selection moved on.

use crate::{CatalogueError, PoiId, PointOfInterest, Result, Stop};
use std::collections::HashSet;

/// Maximum number of stops in one route
pub const MAX_STOPS: usize = 25;

/// A selected monument and its insertion index
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionEntry {
    pub poi: PointOfInterest,
    pub insertion_index: u64,
}

/// Result of [`SelectionStore::toggle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// The selection is full; nothing changed
    CapacityReached,
}

/// Result of [`SelectionStore::select_all`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectAllOutcome {
    pub added: usize,
    pub already_selected: usize,
    /// Candidates left out because the selection filled up
    pub rejected: usize,
}

impl SelectAllOutcome {
    pub fn capacity_reached(&self) -> bool {
        self.rejected > 0
    }
}

/// Ordered, deduplicated and capped set of selected monuments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionStore {
    entries: Vec<SelectionEntry>,
    ids: HashSet<PoiId>,
    next_index: u64,
    version: u64,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= MAX_STOPS
    }

    #[inline]
    pub fn contains(&self, id: PoiId) -> bool {
        self.ids.contains(&id)
    }

    /// Incremented on every change of content or order
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Entries in stop order
    #[inline]
    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    /// Ids in stop order
    pub fn ids(&self) -> Vec<PoiId> {
        self.entries.iter().map(|e| e.poi.id).collect()
    }

    /// Stops in stop order
    pub fn stops(&self) -> Vec<Stop> {
        self.entries.iter().map(|e| Stop::from(&e.poi)).collect()
    }

    /// Add the monument if absent, remove it if present
    pub fn toggle(&mut self, poi: &PointOfInterest) -> ToggleOutcome {
        if self.remove(poi.id) {
            return ToggleOutcome::Removed;
        }
        if self.is_full() {
            tracing::debug!(id = poi.id, "selection full, toggle ignored");
            return ToggleOutcome::CapacityReached;
        }
        self.push(poi.clone());
        ToggleOutcome::Added
    }

    /// Add candidates in order until the selection is full
    ///
    /// Already selected ids are skipped; existing entries are never evicted.
    pub fn select_all<'a, I>(&mut self, candidates: I) -> SelectAllOutcome
    where
        I: IntoIterator<Item = &'a PointOfInterest>,
    {
        let mut outcome = SelectAllOutcome::default();
        for poi in candidates {
            if self.ids.contains(&poi.id) {
                outcome.already_selected += 1;
            } else if self.is_full() {
                outcome.rejected += 1;
            } else {
                self.push(poi.clone());
                outcome.added += 1;
            }
        }
        outcome
    }

    /// Remove one monument, returning whether it was selected
    pub fn remove(&mut self, id: PoiId) -> bool {
        if !self.ids.remove(&id) {
            return false;
        }
        self.entries.retain(|e| e.poi.id != id);
        self.version += 1;
        true
    }

    pub fn clear(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        self.entries.clear();
        self.ids.clear();
        self.version += 1;
    }

    /// Move the stop at `from` to position `to`
    pub fn move_stop(&mut self, from: usize, to: usize) -> bool {
        if from >= self.entries.len() || to >= self.entries.len() {
            return false;
        }
        if from != to {
            let entry = self.entries.remove(from);
            self.entries.insert(to, entry);
            self.version += 1;
        }
        true
    }

    pub fn position(&self, id: PoiId) -> Option<usize> {
        self.entries.iter().position(|e| e.poi.id == id)
    }

    /// Reorder the selection to `ordered_ids`
    ///
    /// `ordered_ids` must contain exactly the selected ids. On any mismatch the
    /// selection is left untouched.
    pub fn apply_permutation(&mut self, ordered_ids: &[PoiId]) -> Result<()> {
        if ordered_ids.len() != self.entries.len() {
            return Err(CatalogueError::Consistency {
                reason: format!(
                    "expected {} ids, got {}",
                    self.entries.len(),
                    ordered_ids.len()
                ),
            });
        }

        let mut seen = HashSet::with_capacity(ordered_ids.len());
        for id in ordered_ids {
            if !self.ids.contains(id) {
                return Err(CatalogueError::Consistency {
                    reason: format!("id {id} is not selected"),
                });
            }
            if !seen.insert(*id) {
                return Err(CatalogueError::Consistency {
                    reason: format!("id {id} appears twice"),
                });
            }
        }

        let mut remaining = std::mem::take(&mut self.entries);
        for id in ordered_ids {
            if let Some(pos) = remaining.iter().position(|e| e.poi.id == *id) {
                self.entries.push(remaining.swap_remove(pos));
            }
        }
        self.version += 1;
        Ok(())
    }

    fn push(&mut self, poi: PointOfInterest) {
        self.ids.insert(poi.id);
        self.entries.push(SelectionEntry {
            poi,
            insertion_index: self.next_index,
        });
        self.next_index += 1;
        self.version += 1;
    }
}
