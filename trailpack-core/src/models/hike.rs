use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A trip and its packing list.
///
/// The hike owns its assignments exclusively: they are created when gear is
/// packed, and removed with the hike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hike {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Free text, e.g. "14 mi" or "22 km".
    pub distance: String,
    pub location: String,
    pub completed: bool,
    /// Up to three optional external links (trail pages, permits, maps).
    pub links: [Option<String>; 3],
    /// Packing list in insertion order.
    pub gear: Vec<HikeGear>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Hike {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: String::new(),
            distance: String::new(),
            location: String::new(),
            completed: false,
            links: [None, None, None],
            gear: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn assignment(&self, id: Uuid) -> Option<&HikeGear> {
        self.gear.iter().find(|a| a.id == id)
    }

    pub fn contains_gear(&self, gear_id: Uuid) -> bool {
        self.gear.iter().any(|a| a.gear_id == gear_id)
    }
}

/// A gear item packed for one hike.
///
/// `quantity` is signed so out-of-range input can be reported instead of
/// wrapping; the aggregator only accepts values of at least one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HikeGear {
    pub id: Uuid,
    pub hike_id: Uuid,
    pub gear_id: Uuid,
    pub quantity: i64,
    /// Carried on the body rather than in the pack.
    pub worn: bool,
    /// Used up during the trip (food, fuel, water).
    pub consumable: bool,
    /// Checked off while packing. Unverified rows are "pending".
    pub verified: bool,
    pub notes: String,
}

impl HikeGear {
    pub fn new(hike_id: Uuid, gear_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            hike_id,
            gear_id,
            quantity: 1,
            worn: false,
            consumable: false,
            verified: false,
            notes: String::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.verified
    }
}

/// Input for creating a hike.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateHikeInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub distance: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub links: [Option<String>; 3],
}

/// Input for updating a hike. All fields are optional for partial updates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateHikeInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub distance: Option<String>,
    pub location: Option<String>,
    pub completed: Option<bool>,
    /// Replaces the link in the matching slot when `Some`.
    #[serde(default)]
    pub links: [Option<String>; 3],
}

/// Input for packing a gear item into a hike.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddHikeGearInput {
    pub gear_id: Uuid,
    /// Defaults to 1.
    pub quantity: Option<i64>,
    #[serde(default)]
    pub worn: bool,
    #[serde(default)]
    pub consumable: bool,
    #[serde(default)]
    pub notes: String,
}
