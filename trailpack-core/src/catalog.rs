//! Catalog-wide browsing and cross-hike gear queries.

use std::collections::{BTreeSet, HashSet};
use std::convert::Infallible;

use uuid::Uuid;

use crate::category::CategoryIndex;
use crate::models::{GearItem, Hike, UNCATEGORIZED};

/// Storage contract for deleting gear.
///
/// Implementations must remove the gear item together with every assignment
/// that references it, across every hike, so that no assignment is left
/// pointing at a deleted id.
pub trait CascadeStore {
    type Error;

    /// Returns the number of assignments removed alongside the gear item.
    fn delete_gear_cascading(&mut self, gear_id: Uuid) -> Result<usize, Self::Error>;
}

/// In-memory hikes: drops every assignment for the gear in every hike.
impl CascadeStore for Vec<Hike> {
    type Error = Infallible;

    fn delete_gear_cascading(&mut self, gear_id: Uuid) -> Result<usize, Self::Error> {
        let mut removed = 0;
        for hike in self.iter_mut() {
            let before = hike.gear.len();
            hike.gear.retain(|a| a.gear_id != gear_id);
            removed += before - hike.gear.len();
        }
        Ok(removed)
    }
}

/// The full gear collection.
#[derive(Debug, Clone, Default)]
pub struct GearCatalog {
    gear: Vec<GearItem>,
}

impl GearCatalog {
    pub fn new(gear: Vec<GearItem>) -> Self {
        Self { gear }
    }

    pub fn gear(&self) -> &[GearItem] {
        &self.gear
    }

    pub fn get(&self, id: Uuid) -> Option<&GearItem> {
        self.gear.iter().find(|g| g.id == id)
    }

    pub fn len(&self) -> usize {
        self.gear.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gear.is_empty()
    }

    /// Gear grouped by category. An empty query includes everything; otherwise
    /// only items whose name contains `query`, ignoring case.
    ///
    /// Only the name is searched here. The packing list search in
    /// [`crate::aggregator::HikeAggregator::search`] is broader.
    pub fn filtered(&self, query: &str) -> CategoryIndex<&GearItem> {
        let needle = query.to_lowercase();
        let matches = self
            .gear
            .iter()
            .filter(|g| needle.is_empty() || g.name.to_lowercase().contains(&needle));
        CategoryIndex::build(matches, |g| g.category.as_str())
    }

    /// Catalog gear not yet packed for `hike`, in catalog order.
    pub fn unassigned_for(&self, hike: &Hike) -> Vec<&GearItem> {
        let packed: HashSet<Uuid> = hike.gear.iter().map(|a| a.gear_id).collect();
        self.gear.iter().filter(|g| !packed.contains(&g.id)).collect()
    }

    /// Remove a gear item from the catalog and have `store` cascade the delete
    /// to every hike. Returns the removed item, or `None` if it was not in the
    /// catalog (the store is still asked to cascade, so stale assignments are
    /// cleaned up either way).
    pub fn delete_cascading<S: CascadeStore>(
        &mut self,
        gear_id: Uuid,
        store: &mut S,
    ) -> Result<Option<GearItem>, S::Error> {
        let removed_assignments = store.delete_gear_cascading(gear_id)?;
        let position = self.gear.iter().position(|g| g.id == gear_id);
        let removed = position.map(|i| self.gear.remove(i));

        tracing::debug!(
            %gear_id,
            removed_assignments,
            found = removed.is_some(),
            "Deleted gear with cascade"
        );
        Ok(removed)
    }

    /// Categories to offer when editing gear: the configured list plus every
    /// category already in use, sorted and de-duplicated.
    pub fn category_choices(&self, configured: &[String]) -> Vec<String> {
        let mut choices: BTreeSet<String> = configured
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        choices.extend(self.gear.iter().map(|g| g.category.clone()));
        choices.insert(UNCATEGORIZED.to_string());
        choices.into_iter().collect()
    }
}
