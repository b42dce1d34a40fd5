use speculate2::speculate;
use trailpack::aggregator::*;
use trailpack::db::Database;
use trailpack::models::*;
use trailpack::units::UnitSystem;
use trailpack::CoreError;

fn gear(db: &Database, name: &str, grams: f64, category: &str) -> GearItem {
    db.create_gear(CreateGearInput {
        name: name.to_string(),
        description: String::new(),
        weight_grams: grams,
        category: Some(category.to_string()),
    })
    .expect("Failed to create gear")
}

fn pack(db: &Database, hike: &Hike, gear: &GearItem, quantity: i64, worn: bool, consumable: bool) -> HikeGear {
    db.add_gear_to_hike(
        hike.id,
        AddHikeGearInput {
            gear_id: gear.id,
            quantity: Some(quantity),
            worn,
            consumable,
            notes: String::new(),
        },
    )
    .expect("Failed to pack gear")
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");

        let hike = db.create_hike(CreateHikeInput {
            name: "Wind River High Route".to_string(),
            ..Default::default()
        }).expect("Failed to create hike");

        let pack_bag = gear(&db, "Pack", 900.0, "Pack");
        let shell = gear(&db, "Rain shell", 200.0, "Clothing");
        let fuel = gear(&db, "Fuel canister", 350.0, "Cooking");

        let bag_item = pack(&db, &hike, &pack_bag, 1, false, false);
        let shell_item = pack(&db, &hike, &shell, 1, true, false);
        let fuel_item = pack(&db, &hike, &fuel, 2, false, true);
    }

    describe "load_aggregator" {
        it "computes weights from the stored packing list" {
            let aggregator = db.load_aggregator(hike.id, ViewMode::All)
                .expect("Query failed")
                .expect("Hike missing");

            assert_eq!(aggregator.weight_grams(WeightKind::Total), 900.0 + 200.0 + 700.0);
            assert_eq!(aggregator.weight_grams(WeightKind::Base), 900.0);
            assert_eq!(aggregator.weight_grams(WeightKind::Worn), 200.0);
            assert_eq!(aggregator.weight_grams(WeightKind::Consumable), 700.0);
            assert_eq!(
                aggregator.weight_string(WeightKind::Total, UnitSystem::Metric),
                "1 Kg 800.0 Grams"
            );
        }

        it "returns None for an unknown hike" {
            let result = db.load_aggregator(uuid::Uuid::new_v4(), ViewMode::All).expect("Query failed");
            assert!(result.is_none());
        }
    }

    describe "apply_change" {
        it "persists toggles so a fresh snapshot agrees" {
            let mut aggregator = db.load_aggregator(hike.id, ViewMode::All).unwrap().unwrap();
            let change = aggregator.toggle_worn(bag_item.id).expect("Toggle failed");
            assert!(db.apply_change(&change).expect("Persist failed"));

            let change = aggregator.toggle_verified(shell_item.id).expect("Toggle failed");
            assert!(db.apply_change(&change).expect("Persist failed"));

            let fresh = db.load_aggregator(hike.id, ViewMode::PendingOnly).unwrap().unwrap();
            assert_eq!(fresh.distributions(), aggregator.distributions());
            assert_eq!(fresh.weight_grams(WeightKind::Base), 0.0);
            assert_eq!(fresh.sections().len(), 2);
        }

        it "persists quantity and removal" {
            let mut aggregator = db.load_aggregator(hike.id, ViewMode::All).unwrap().unwrap();
            let change = aggregator.set_quantity(fuel_item.id, 1).expect("Quantity failed");
            db.apply_change(&change).expect("Persist failed");
            let change = aggregator.remove_assignment(shell_item.id).expect("Remove failed");
            db.apply_change(&change).expect("Persist failed");

            let stored = db.get_hike(hike.id).unwrap().unwrap();
            assert_eq!(stored.gear.len(), 2);
            assert_eq!(stored.assignment(fuel_item.id).map(|a| a.quantity), Some(1));

            let fresh = db.load_aggregator(hike.id, ViewMode::All).unwrap().unwrap();
            assert_eq!(fresh.weight_grams(WeightKind::Total), 1_250.0);
        }

        it "leaves storage untouched when validation fails" {
            let mut aggregator = db.load_aggregator(hike.id, ViewMode::All).unwrap().unwrap();
            let result = aggregator.set_quantity(fuel_item.id, 0);
            assert!(matches!(result, Err(CoreError::Validation { .. })));

            let stored = db.get_hike_gear(fuel_item.id).unwrap().unwrap();
            assert_eq!(stored.quantity, 2);
        }
    }

    describe "catalog" {
        it "lists gear not yet packed" {
            let stakes = gear(&db, "Stakes", 60.0, "Shelter");
            let catalog = db.load_catalog().expect("Query failed");
            let available = catalog.unassigned_for(&hike_with_gear(&db, &hike));
            assert_eq!(available.len(), 1);
            assert_eq!(available[0].id, stakes.id);
        }

        it "cascades deletes through the storage layer" {
            let other = db.create_hike(CreateHikeInput {
                name: "Cirque".to_string(),
                ..Default::default()
            }).expect("Failed to create hike");
            pack(&db, &other, &fuel, 1, false, true);

            let mut catalog = db.load_catalog().expect("Query failed");
            let mut store = db.clone();
            let removed = catalog.delete_cascading(fuel.id, &mut store).expect("Delete failed");

            assert_eq!(removed.map(|g| g.id), Some(fuel.id));
            for stored in db.get_all_hikes().expect("Query failed") {
                assert!(!stored.contains_gear(fuel.id));
            }
            let fresh = db.load_aggregator(hike.id, ViewMode::All).unwrap().unwrap();
            assert_eq!(fresh.weight_grams(WeightKind::Consumable), 0.0);
        }
    }
}

fn hike_with_gear(db: &Database, hike: &Hike) -> Hike {
    db.get_hike(hike.id)
        .expect("Query failed")
        .expect("Hike missing")
}
