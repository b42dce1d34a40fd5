use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category assigned to gear created without one.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A single catalog entry.
///
/// `weight_grams` is the canonical weight. It is never stored in a display unit,
/// so toggling between metric and imperial cannot accumulate rounding error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearItem {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub weight_grams: f64,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GearItem {
    /// Build a new item with a fresh id. An empty or blank category becomes
    /// [`UNCATEGORIZED`].
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        weight_grams: f64,
        category: Option<&str>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            weight_grams,
            category: normalize_category(category),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Resolve an optional user-supplied category to the stored value.
pub fn normalize_category(category: Option<&str>) -> String {
    match category.map(str::trim) {
        Some(c) if !c.is_empty() => c.to_string(),
        _ => UNCATEGORIZED.to_string(),
    }
}

/// Input for creating a catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGearInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Weight in grams. Callers holding a display value convert it first with
    /// [`crate::units::from_display_value`].
    pub weight_grams: f64,
    /// Defaults to [`UNCATEGORIZED`] if not specified.
    pub category: Option<String>,
}

/// Input for editing a catalog entry. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGearInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub weight_grams: Option<f64>,
    pub category: Option<String>,
}
