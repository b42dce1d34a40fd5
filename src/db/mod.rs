//! SQLite storage for gear, hikes and packing lists.
//!
//! Weights are stored in grams only. Deleting gear removes its assignments in
//! every hike within the same transaction.

mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use trailpack_core::aggregator::{HikeAggregator, PackChange, ViewMode};
use trailpack_core::catalog::{CascadeStore, GearCatalog};
use trailpack_core::models::*;

const GEAR_COLUMNS: &str = "id, name, description, weight_grams, category, created_at, updated_at";
const HIKE_COLUMNS: &str =
    "id, name, description, distance, location, completed, link1, link2, link3, created_at, updated_at";
const HIKE_GEAR_COLUMNS: &str =
    "id, hike_id, gear_id, quantity, worn, consumable, verified, notes";

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "trailpack")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Self::open(dirs.data_dir().join("trailpack.db"))
    }

    pub fn open_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        schema::run_migrations(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))
    }

    // ============================================================
    // Gear operations
    // ============================================================

    pub fn get_all_gear(&self) -> Result<Vec<GearItem>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {GEAR_COLUMNS} FROM gear ORDER BY name COLLATE NOCASE, created_at"
        ))?;
        let gear = stmt
            .query_map([], gear_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(gear)
    }

    pub fn get_gear(&self, id: Uuid) -> Result<Option<GearItem>> {
        let conn = self.lock()?;
        let gear = conn
            .query_row(
                &format!("SELECT {GEAR_COLUMNS} FROM gear WHERE id = ?"),
                [id.to_string()],
                gear_from_row,
            )
            .optional()?;
        Ok(gear)
    }

    pub fn create_gear(&self, input: CreateGearInput) -> Result<GearItem> {
        validate_weight(input.weight_grams)?;
        let gear = GearItem::new(
            input.name,
            input.description,
            input.weight_grams,
            input.category.as_deref(),
        );

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO gear (id, name, description, weight_grams, category, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                gear.id.to_string(),
                &gear.name,
                &gear.description,
                gear.weight_grams,
                &gear.category,
                gear.created_at.to_rfc3339(),
                gear.updated_at.to_rfc3339(),
            ),
        )?;

        tracing::debug!(gear_id = %gear.id, name = %gear.name, "Created gear");
        Ok(gear)
    }

    pub fn update_gear(&self, id: Uuid, input: UpdateGearInput) -> Result<Option<GearItem>> {
        let Some(existing) = self.get_gear(id)? else {
            return Ok(None);
        };
        if let Some(weight) = input.weight_grams {
            validate_weight(weight)?;
        }

        let now = Utc::now();
        let gear = GearItem {
            name: input.name.unwrap_or(existing.name),
            description: input.description.unwrap_or(existing.description),
            weight_grams: input.weight_grams.unwrap_or(existing.weight_grams),
            category: match input.category {
                Some(category) => normalize_category(Some(&category)),
                None => existing.category,
            },
            updated_at: now,
            ..existing
        };

        let conn = self.lock()?;
        conn.execute(
            "UPDATE gear SET name = ?, description = ?, weight_grams = ?, category = ?, updated_at = ?
             WHERE id = ?",
            (
                &gear.name,
                &gear.description,
                gear.weight_grams,
                &gear.category,
                now.to_rfc3339(),
                id.to_string(),
            ),
        )?;

        Ok(Some(gear))
    }

    /// Delete a gear item and every assignment referencing it, in any hike.
    pub fn delete_gear(&self, id: Uuid) -> Result<bool> {
        let (deleted, _) = self.delete_gear_with_assignments(id)?;
        Ok(deleted)
    }

    fn delete_gear_with_assignments(&self, id: Uuid) -> Result<(bool, usize)> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let assignments = tx.execute("DELETE FROM hike_gear WHERE gear_id = ?", [id.to_string()])?;
        let rows = tx.execute("DELETE FROM gear WHERE id = ?", [id.to_string()])?;
        tx.commit()?;

        tracing::info!(gear_id = %id, assignments, "Deleted gear");
        Ok((rows > 0, assignments))
    }

    /// Snapshot of the whole catalog.
    pub fn load_catalog(&self) -> Result<GearCatalog> {
        Ok(GearCatalog::new(self.get_all_gear()?))
    }

    // ============================================================
    // Hike operations
    // ============================================================

    pub fn get_all_hikes(&self) -> Result<Vec<Hike>> {
        let mut hikes = {
            let conn = self.lock()?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {HIKE_COLUMNS} FROM hikes ORDER BY completed, name COLLATE NOCASE"
            ))?;
            let hikes = stmt
                .query_map([], hike_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            hikes
        };

        for hike in &mut hikes {
            hike.gear = self.get_hike_gear_by_hike(hike.id)?;
        }
        Ok(hikes)
    }

    /// The hike with its packing list in order.
    pub fn get_hike(&self, id: Uuid) -> Result<Option<Hike>> {
        let hike = {
            let conn = self.lock()?;
            let hike = conn
                .query_row(
                    &format!("SELECT {HIKE_COLUMNS} FROM hikes WHERE id = ?"),
                    [id.to_string()],
                    hike_from_row,
                )
                .optional()?;
            hike
        };

        let Some(mut hike) = hike else {
            return Ok(None);
        };
        hike.gear = self.get_hike_gear_by_hike(id)?;
        Ok(Some(hike))
    }

    pub fn create_hike(&self, input: CreateHikeInput) -> Result<Hike> {
        let mut hike = Hike::new(input.name);
        hike.description = input.description;
        hike.distance = input.distance;
        hike.location = input.location;
        hike.links = input.links;

        let conn = self.lock()?;
        let [link1, link2, link3] = &hike.links;
        conn.execute(
            "INSERT INTO hikes (id, name, description, distance, location, completed, link1, link2, link3, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?)",
            (
                hike.id.to_string(),
                &hike.name,
                &hike.description,
                &hike.distance,
                &hike.location,
                link1,
                link2,
                link3,
                hike.created_at.to_rfc3339(),
                hike.updated_at.to_rfc3339(),
            ),
        )?;

        tracing::debug!(hike_id = %hike.id, name = %hike.name, "Created hike");
        Ok(hike)
    }

    pub fn update_hike(&self, id: Uuid, input: UpdateHikeInput) -> Result<Option<Hike>> {
        let Some(existing) = self.get_hike(id)? else {
            return Ok(None);
        };

        let now = Utc::now();
        let [link1, link2, link3] = input.links;
        let [old1, old2, old3] = existing.links;
        let hike = Hike {
            name: input.name.unwrap_or(existing.name),
            description: input.description.unwrap_or(existing.description),
            distance: input.distance.unwrap_or(existing.distance),
            location: input.location.unwrap_or(existing.location),
            completed: input.completed.unwrap_or(existing.completed),
            links: [
                merge_link(link1, old1),
                merge_link(link2, old2),
                merge_link(link3, old3),
            ],
            updated_at: now,
            ..existing
        };

        let conn = self.lock()?;
        let [link1, link2, link3] = &hike.links;
        conn.execute(
            "UPDATE hikes SET name = ?, description = ?, distance = ?, location = ?, completed = ?,
             link1 = ?, link2 = ?, link3 = ?, updated_at = ? WHERE id = ?",
            (
                &hike.name,
                &hike.description,
                &hike.distance,
                &hike.location,
                hike.completed as i32,
                link1,
                link2,
                link3,
                now.to_rfc3339(),
                id.to_string(),
            ),
        )?;

        Ok(Some(hike))
    }

    /// Delete a hike together with its packing list.
    pub fn delete_hike(&self, id: Uuid) -> Result<bool> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM hike_gear WHERE hike_id = ?", [id.to_string()])?;
        let rows = tx.execute("DELETE FROM hikes WHERE id = ?", [id.to_string()])?;
        tx.commit()?;
        Ok(rows > 0)
    }

    // ============================================================
    // Packing list operations
    // ============================================================

    pub fn get_hike_gear_by_hike(&self, hike_id: Uuid) -> Result<Vec<HikeGear>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {HIKE_GEAR_COLUMNS} FROM hike_gear WHERE hike_id = ? ORDER BY position"
        ))?;
        let gear = stmt
            .query_map([hike_id.to_string()], hike_gear_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(gear)
    }

    pub fn get_hike_gear(&self, id: Uuid) -> Result<Option<HikeGear>> {
        let conn = self.lock()?;
        let assignment = conn
            .query_row(
                &format!("SELECT {HIKE_GEAR_COLUMNS} FROM hike_gear WHERE id = ?"),
                [id.to_string()],
                hike_gear_from_row,
            )
            .optional()?;
        Ok(assignment)
    }

    /// Pack a catalog item into a hike. Each gear item can be packed once per hike.
    pub fn add_gear_to_hike(&self, hike_id: Uuid, input: AddHikeGearInput) -> Result<HikeGear> {
        let hike = self
            .get_hike(hike_id)?
            .ok_or_else(|| anyhow::anyhow!("Hike not found"))?;
        self.get_gear(input.gear_id)?
            .ok_or_else(|| anyhow::anyhow!("Gear not found"))?;

        if hike.contains_gear(input.gear_id) {
            anyhow::bail!("Gear is already packed for this hike");
        }
        let quantity = input.quantity.unwrap_or(1);
        if quantity < 1 {
            anyhow::bail!("Quantity must be at least 1, got {}", quantity);
        }

        let assignment = HikeGear {
            quantity,
            worn: input.worn,
            consumable: input.consumable,
            notes: input.notes,
            ..HikeGear::new(hike_id, input.gear_id)
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO hike_gear (id, hike_id, gear_id, position, quantity, worn, consumable, verified, notes, created_at)
             VALUES (?, ?, ?, (SELECT COALESCE(MAX(position), -1) + 1 FROM hike_gear WHERE hike_id = ?), ?, ?, ?, 0, ?, ?)",
            (
                assignment.id.to_string(),
                hike_id.to_string(),
                assignment.gear_id.to_string(),
                hike_id.to_string(),
                assignment.quantity,
                assignment.worn as i32,
                assignment.consumable as i32,
                &assignment.notes,
                Utc::now().to_rfc3339(),
            ),
        )?;

        Ok(assignment)
    }

    pub fn update_hike_gear_notes(&self, id: Uuid, notes: &str) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "UPDATE hike_gear SET notes = ? WHERE id = ?",
            (notes, id.to_string()),
        )?;
        Ok(rows > 0)
    }

    /// Persist a mutation produced by [`HikeAggregator`]. Returns `false` if the
    /// assignment no longer exists.
    pub fn apply_change(&self, change: &PackChange) -> Result<bool> {
        let conn = self.lock()?;
        let id = change.assignment_id().to_string();
        let rows = match change {
            PackChange::Worn { worn, .. } => conn.execute(
                "UPDATE hike_gear SET worn = ? WHERE id = ?",
                (*worn as i32, &id),
            )?,
            PackChange::Consumable { consumable, .. } => conn.execute(
                "UPDATE hike_gear SET consumable = ? WHERE id = ?",
                (*consumable as i32, &id),
            )?,
            PackChange::Verified { verified, .. } => conn.execute(
                "UPDATE hike_gear SET verified = ? WHERE id = ?",
                (*verified as i32, &id),
            )?,
            PackChange::Quantity { quantity, .. } => conn.execute(
                "UPDATE hike_gear SET quantity = ? WHERE id = ?",
                (*quantity, &id),
            )?,
            PackChange::Removed { .. } => {
                conn.execute("DELETE FROM hike_gear WHERE id = ?", [&id])?
            }
        };

        tracing::debug!(?change, persisted = rows > 0, "Applied pack change");
        Ok(rows > 0)
    }

    /// Build a fresh aggregator over the hike and the current catalog.
    pub fn load_aggregator(&self, hike_id: Uuid, view: ViewMode) -> Result<Option<HikeAggregator>> {
        let Some(hike) = self.get_hike(hike_id)? else {
            return Ok(None);
        };
        let gear = self.get_all_gear()?;
        Ok(Some(HikeAggregator::new(hike, gear, view)))
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

impl CascadeStore for Database {
    type Error = anyhow::Error;

    fn delete_gear_cascading(&mut self, gear_id: Uuid) -> Result<usize> {
        let (_, assignments) = self.delete_gear_with_assignments(gear_id)?;
        Ok(assignments)
    }
}

fn validate_weight(weight_grams: f64) -> Result<()> {
    if !weight_grams.is_finite() || weight_grams < 0.0 {
        anyhow::bail!("Weight must be a non-negative number, got {}", weight_grams);
    }
    Ok(())
}

fn merge_link(update: Option<String>, existing: Option<String>) -> Option<String> {
    match update {
        Some(link) if link.trim().is_empty() => None,
        Some(link) => Some(link),
        None => existing,
    }
}

fn gear_from_row(row: &Row<'_>) -> rusqlite::Result<GearItem> {
    Ok(GearItem {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        weight_grams: row.get(3)?,
        category: row.get(4)?,
        created_at: parse_datetime(row.get::<_, String>(5)?),
        updated_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

fn hike_from_row(row: &Row<'_>) -> rusqlite::Result<Hike> {
    Ok(Hike {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        distance: row.get(3)?,
        location: row.get(4)?,
        completed: row.get::<_, i32>(5)? != 0,
        links: [row.get(6)?, row.get(7)?, row.get(8)?],
        gear: Vec::new(),
        created_at: parse_datetime(row.get::<_, String>(9)?),
        updated_at: parse_datetime(row.get::<_, String>(10)?),
    })
}

fn hike_gear_from_row(row: &Row<'_>) -> rusqlite::Result<HikeGear> {
    Ok(HikeGear {
        id: parse_uuid(row.get::<_, String>(0)?),
        hike_id: parse_uuid(row.get::<_, String>(1)?),
        gear_id: parse_uuid(row.get::<_, String>(2)?),
        quantity: row.get(3)?,
        worn: row.get::<_, i32>(4)? != 0,
        consumable: row.get::<_, i32>(5)? != 0,
        verified: row.get::<_, i32>(6)? != 0,
        notes: row.get(7)?,
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
