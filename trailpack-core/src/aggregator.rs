//! Trip-level weight and category engine.
//!
//! A [`HikeAggregator`] is built from a snapshot of one hike and the gear it
//! references. It computes four weight distributions over the *full* packing
//! list and, separately, a category-sectioned view of the rows the caller wants
//! to see. Switching the view between [`ViewMode::All`] and
//! [`ViewMode::PendingOnly`] changes the rows only; the weights always cover
//! every assignment.
//!
//! Every mutation recomputes synchronously before returning and yields a
//! [`PackChange`] for the storage layer to persist.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::category::CategoryIndex;
use crate::error::{CoreError, Result};
use crate::models::{GearItem, Hike, HikeGear};
use crate::units::{format_major_minor, UnitSystem};

/// Category used for rows whose gear can no longer be found.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// The four weight totals reported for a hike.
///
/// - `Total`: everything on the list
/// - `Base`: neither worn nor consumable
/// - `Worn`: carried on the body
/// - `Consumable`: used up during the trip
///
/// `Worn` and `Consumable` are computed independently, so an assignment with
/// both flags counts toward both (and once toward `Total`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum WeightKind {
    Total,
    Base,
    Worn,
    Consumable,
}

impl WeightKind {
    pub const ALL: [WeightKind; 4] = [Self::Total, Self::Base, Self::Worn, Self::Consumable];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::Base => "base",
            Self::Worn => "worn",
            Self::Consumable => "consumable",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "total" => Some(Self::Total),
            "base" => Some(Self::Base),
            "worn" => Some(Self::Worn),
            "consumable" => Some(Self::Consumable),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Total => "Total",
            Self::Base => "Base",
            Self::Worn => "Worn",
            Self::Consumable => "Consumable",
        }
    }
}

/// Which rows the packing list shows.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    All,
    /// Only assignments not yet verified.
    PendingOnly,
}

impl ViewMode {
    pub fn from_pending_only(pending_only: bool) -> Self {
        if pending_only {
            Self::PendingOnly
        } else {
            Self::All
        }
    }

    pub fn includes(&self, assignment: &HikeGear) -> bool {
        match self {
            Self::All => true,
            Self::PendingOnly => assignment.is_pending(),
        }
    }
}

/// Scalar total plus per-category breakdown for one [`WeightKind`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightDistribution {
    pub total_grams: f64,
    pub by_category: BTreeMap<String, f64>,
}

impl WeightDistribution {
    fn add(&mut self, category: &str, grams: f64) {
        self.total_grams += grams;
        *self.by_category.entry(category.to_string()).or_insert(0.0) += grams;
    }

    /// Grams recorded for `category`, zero if absent.
    pub fn category_grams(&self, category: &str) -> f64 {
        self.by_category.get(category).copied().unwrap_or(0.0)
    }
}

/// All four distributions of a hike, as one immutable snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Distributions {
    pub total: WeightDistribution,
    pub base: WeightDistribution,
    pub worn: WeightDistribution,
    pub consumable: WeightDistribution,
}

impl Distributions {
    pub fn get(&self, kind: WeightKind) -> &WeightDistribution {
        match kind {
            WeightKind::Total => &self.total,
            WeightKind::Base => &self.base,
            WeightKind::Worn => &self.worn,
            WeightKind::Consumable => &self.consumable,
        }
    }

    fn record(&mut self, item: &PackedItem) {
        let category = item.category();
        let grams = item.weight_grams();
        let assignment = &item.assignment;

        self.total.add(category, grams);
        if assignment.worn {
            self.worn.add(category, grams);
        }
        if assignment.consumable {
            self.consumable.add(category, grams);
        }
        if !assignment.worn && !assignment.consumable {
            self.base.add(category, grams);
        }
    }
}

/// A packing list row: the assignment and the gear it resolved to.
///
/// `gear` is `None` when the assignment points at gear missing from the
/// snapshot; such a row weighs nothing and files under [`UNKNOWN_CATEGORY`].
#[derive(Debug, Clone, PartialEq)]
pub struct PackedItem {
    pub assignment: HikeGear,
    pub gear: Option<GearItem>,
}

impl PackedItem {
    pub fn name(&self) -> &str {
        self.gear.as_ref().map_or(UNKNOWN_CATEGORY, |g| g.name.as_str())
    }

    pub fn category(&self) -> &str {
        self.gear
            .as_ref()
            .map_or(UNKNOWN_CATEGORY, |g| g.category.as_str())
    }

    pub fn unit_weight_grams(&self) -> f64 {
        self.gear.as_ref().map_or(0.0, |g| g.weight_grams)
    }

    /// Unit weight times quantity.
    pub fn weight_grams(&self) -> f64 {
        self.unit_weight_grams() * self.assignment.quantity as f64
    }

    /// Case-insensitive match over name, description, category and notes.
    /// `needle` must already be lowercase.
    fn matches(&self, needle: &str) -> bool {
        let description = self.gear.as_ref().map_or("", |g| g.description.as_str());
        [self.name(), description, self.category(), self.assignment.notes.as_str()]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// A mutation the storage layer must persist after the aggregator applied it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum PackChange {
    Worn { assignment_id: Uuid, worn: bool },
    Consumable { assignment_id: Uuid, consumable: bool },
    Verified { assignment_id: Uuid, verified: bool },
    Quantity { assignment_id: Uuid, quantity: i64 },
    Removed { assignment_id: Uuid },
}

impl PackChange {
    pub fn assignment_id(&self) -> Uuid {
        match self {
            Self::Worn { assignment_id, .. }
            | Self::Consumable { assignment_id, .. }
            | Self::Verified { assignment_id, .. }
            | Self::Quantity { assignment_id, .. }
            | Self::Removed { assignment_id } => *assignment_id,
        }
    }
}

/// Weight and category engine for one hike snapshot.
#[derive(Debug, Clone)]
pub struct HikeAggregator {
    hike: Hike,
    gear: HashMap<Uuid, GearItem>,
    view: ViewMode,
    /// Every assignment, resolved. Authoritative for weights.
    rows: Vec<PackedItem>,
    distributions: Distributions,
    /// Sections over the rows selected by `view`.
    sections: CategoryIndex<PackedItem>,
}

impl HikeAggregator {
    pub fn new(hike: Hike, gear: impl IntoIterator<Item = GearItem>, view: ViewMode) -> Self {
        let gear = gear.into_iter().map(|g| (g.id, g)).collect();
        let mut aggregator = Self {
            hike,
            gear,
            view,
            rows: Vec::new(),
            distributions: Distributions::default(),
            sections: CategoryIndex::default(),
        };
        aggregator.recompute();
        aggregator
    }

    /// Rebuild rows, distributions and sections from the current snapshot.
    pub fn recompute(&mut self) {
        self.rows = self.hike.gear.iter().map(|a| self.resolve(a)).collect();

        let mut distributions = Distributions::default();
        for row in &self.rows {
            distributions.record(row);
        }
        self.distributions = distributions;
        self.rebuild_sections();

        tracing::debug!(
            hike_id = %self.hike.id,
            assignments = self.rows.len(),
            shown = self.sections.len(),
            total_grams = self.distributions.total.total_grams,
            "Recomputed hike weights"
        );
    }

    fn resolve(&self, assignment: &HikeGear) -> PackedItem {
        let gear = match self.lookup(assignment) {
            Ok(gear) => Some(gear.clone()),
            Err(e) => {
                tracing::warn!(error = %e, "Treating unresolved gear as zero weight");
                None
            }
        };
        PackedItem {
            assignment: assignment.clone(),
            gear,
        }
    }

    fn lookup(&self, assignment: &HikeGear) -> Result<&GearItem> {
        self.gear
            .get(&assignment.gear_id)
            .ok_or(CoreError::DanglingReference {
                assignment_id: assignment.id,
                gear_id: assignment.gear_id,
            })
    }

    fn rebuild_sections(&mut self) {
        let shown: Vec<PackedItem> = self.display_rows().cloned().collect();
        self.sections = CategoryIndex::build(shown, |row| row.category());
    }

    fn display_rows(&self) -> impl Iterator<Item = &PackedItem> {
        let view = self.view;
        self.rows
            .iter()
            .filter(move |row| view.includes(&row.assignment))
    }

    fn assignment_mut(&mut self, id: Uuid) -> Result<&mut HikeGear> {
        self.hike
            .gear
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(CoreError::AssignmentNotFound(id))
    }

    // ============================================================
    // View
    // ============================================================

    pub fn view(&self) -> ViewMode {
        self.view
    }

    /// Switch between all rows and pending rows. Weights are untouched.
    pub fn set_view(&mut self, view: ViewMode) {
        if self.view != view {
            self.view = view;
            self.rebuild_sections();
        }
    }

    pub fn sections(&self) -> &CategoryIndex<PackedItem> {
        &self.sections
    }

    /// Ordered `(category, rows)` pairs for the current view.
    pub fn category_sections(&self) -> Vec<(&str, &[PackedItem])> {
        self.sections.sections().collect()
    }

    /// Rows of the current view matching `query` in name, description,
    /// category or notes, ignoring case. An empty query matches every row.
    pub fn search(&self, query: &str) -> CategoryIndex<&PackedItem> {
        let needle = query.to_lowercase();
        let matches = self
            .display_rows()
            .filter(|row| needle.is_empty() || row.matches(&needle));
        CategoryIndex::build(matches, |row| row.category())
    }

    // ============================================================
    // Weights
    // ============================================================

    pub fn distributions(&self) -> &Distributions {
        &self.distributions
    }

    pub fn distribution(&self, kind: WeightKind) -> &WeightDistribution {
        self.distributions.get(kind)
    }

    pub fn weight_grams(&self, kind: WeightKind) -> f64 {
        self.distribution(kind).total_grams
    }

    pub fn weight_string(&self, kind: WeightKind, system: UnitSystem) -> String {
        format_major_minor(self.weight_grams(kind), system)
    }

    // ============================================================
    // Snapshot
    // ============================================================

    pub fn hike(&self) -> &Hike {
        &self.hike
    }

    pub fn into_hike(self) -> Hike {
        self.hike
    }

    /// Every row regardless of view, in packing order.
    pub fn rows(&self) -> &[PackedItem] {
        &self.rows
    }

    pub fn pending_count(&self) -> usize {
        self.rows.iter().filter(|r| r.assignment.is_pending()).count()
    }

    // ============================================================
    // Mutations
    // ============================================================

    pub fn toggle_worn(&mut self, assignment_id: Uuid) -> Result<PackChange> {
        let assignment = self.assignment_mut(assignment_id)?;
        assignment.worn = !assignment.worn;
        let change = PackChange::Worn {
            assignment_id,
            worn: assignment.worn,
        };
        self.recompute();
        Ok(change)
    }

    pub fn toggle_consumable(&mut self, assignment_id: Uuid) -> Result<PackChange> {
        let assignment = self.assignment_mut(assignment_id)?;
        assignment.consumable = !assignment.consumable;
        let change = PackChange::Consumable {
            assignment_id,
            consumable: assignment.consumable,
        };
        self.recompute();
        Ok(change)
    }

    pub fn toggle_verified(&mut self, assignment_id: Uuid) -> Result<PackChange> {
        let assignment = self.assignment_mut(assignment_id)?;
        assignment.verified = !assignment.verified;
        let change = PackChange::Verified {
            assignment_id,
            verified: assignment.verified,
        };
        self.recompute();
        Ok(change)
    }

    /// Fails with [`CoreError::Validation`] if `quantity` is below one.
    pub fn set_quantity(&mut self, assignment_id: Uuid, quantity: i64) -> Result<PackChange> {
        if quantity < 1 {
            return Err(CoreError::validation(
                "quantity",
                format!("must be at least 1, got {quantity}"),
            ));
        }

        let assignment = self.assignment_mut(assignment_id)?;
        assignment.quantity = quantity;
        self.recompute();
        Ok(PackChange::Quantity {
            assignment_id,
            quantity,
        })
    }

    pub fn remove_assignment(&mut self, assignment_id: Uuid) -> Result<PackChange> {
        let position = self
            .hike
            .gear
            .iter()
            .position(|a| a.id == assignment_id)
            .ok_or(CoreError::AssignmentNotFound(assignment_id))?;
        self.hike.gear.remove(position);
        self.recompute();
        Ok(PackChange::Removed { assignment_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(hike: &mut Hike, gear: &GearItem, quantity: i64) -> Uuid {
        let mut assignment = HikeGear::new(hike.id, gear.id);
        assignment.quantity = quantity;
        let id = assignment.id;
        hike.gear.push(assignment);
        id
    }

    #[test]
    fn test_empty_hike_is_all_zero() {
        let aggregator = HikeAggregator::new(Hike::new("Empty"), Vec::new(), ViewMode::All);
        for kind in WeightKind::ALL {
            assert_eq!(aggregator.weight_grams(kind), 0.0);
            assert!(aggregator.distribution(kind).by_category.is_empty());
        }
        assert!(aggregator.category_sections().is_empty());
        assert_eq!(
            aggregator.weight_string(WeightKind::Total, UnitSystem::Metric),
            "0 Kg 0.0 Grams"
        );
    }

    #[test]
    fn test_dangling_reference_is_zero_weight_unknown() {
        let stove = GearItem::new("Stove", "", 300.0, Some("Kitchen"));
        let mut hike = Hike::new("Overnight");
        packed(&mut hike, &stove, 1);
        hike.gear.push(HikeGear::new(hike.id, Uuid::new_v4()));

        let aggregator = HikeAggregator::new(hike, vec![stove], ViewMode::All);

        assert_eq!(aggregator.weight_grams(WeightKind::Total), 300.0);
        assert_eq!(aggregator.distribution(WeightKind::Total).category_grams(UNKNOWN_CATEGORY), 0.0);
        let sections = aggregator.category_sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].0, UNKNOWN_CATEGORY);
        assert_eq!(sections[1].1[0].name(), UNKNOWN_CATEGORY);
    }

    #[test]
    fn test_unknown_assignment_is_reported() {
        let mut aggregator = HikeAggregator::new(Hike::new("Day"), Vec::new(), ViewMode::All);
        let missing = Uuid::new_v4();
        assert_eq!(
            aggregator.toggle_worn(missing),
            Err(CoreError::AssignmentNotFound(missing))
        );
    }

    #[test]
    fn test_toggle_returns_change_with_new_state() {
        let jacket = GearItem::new("Jacket", "", 400.0, Some("Clothing"));
        let mut hike = Hike::new("Ridge");
        let id = packed(&mut hike, &jacket, 1);
        let mut aggregator = HikeAggregator::new(hike, vec![jacket], ViewMode::All);

        let change = aggregator.toggle_worn(id).unwrap();
        assert_eq!(change, PackChange::Worn { assignment_id: id, worn: true });
        assert_eq!(aggregator.weight_grams(WeightKind::Worn), 400.0);
        assert_eq!(aggregator.weight_grams(WeightKind::Base), 0.0);

        aggregator.toggle_worn(id).unwrap();
        assert_eq!(aggregator.weight_grams(WeightKind::Worn), 0.0);
        assert_eq!(aggregator.weight_grams(WeightKind::Base), 400.0);
    }

    #[test]
    fn test_search_covers_description_category_and_notes() {
        let filter = GearItem::new("Squeeze", "water filter", 85.0, Some("Water"));
        let bag = GearItem::new("Quilt", "20F down", 650.0, Some("Sleep"));
        let mut hike = Hike::new("Canyon");
        packed(&mut hike, &filter, 1);
        let quilt = packed(&mut hike, &bag, 1);
        hike.gear[1].notes = "borrowed from Sam".to_string();
        hike.gear[1].verified = true;

        let mut aggregator = HikeAggregator::new(hike, vec![filter, bag], ViewMode::All);
        assert_eq!(aggregator.search("FILTER").len(), 1);
        assert_eq!(aggregator.search("sleep").len(), 1);
        assert_eq!(aggregator.search("sam").items_in("Sleep")[0].assignment.id, quilt);
        assert_eq!(aggregator.search("").len(), 2);

        aggregator.set_view(ViewMode::PendingOnly);
        assert!(aggregator.search("sam").is_empty());
    }

    #[test]
    fn test_weight_kind_strings() {
        for kind in WeightKind::ALL {
            assert_eq!(WeightKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(WeightKind::from_str("packed"), None);
    }
}
