use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use trailpack::aggregator::{Distributions, HikeAggregator, PackChange, ViewMode, WeightKind};
use trailpack::category::CategoryIndex;
use trailpack::config::Settings;
use trailpack::db::Database;
use trailpack::models::*;
use trailpack::units::{from_display_value, UnitSystem};
use trailpack::{render, CoreError};

#[derive(Parser)]
#[command(name = "tpack")]
#[command(about = "Gear catalog and packing lists with weight summaries")]
struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Show and enter weights in pounds and ounces for this command
    #[arg(long, global = true, conflicts_with = "metric")]
    imperial: bool,

    /// Show and enter weights in kilograms and grams for this command
    #[arg(long, global = true)]
    metric: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the gear catalog
    #[command(subcommand)]
    Gear(GearCommand),
    /// Manage hikes and their packing lists
    #[command(subcommand)]
    Hike(HikeCommand),
    /// Show or change saved settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// List categories to choose from
    Categories,
}

#[derive(Subcommand)]
enum GearCommand {
    /// List the catalog by category
    List {
        /// Only show gear whose name contains this text
        #[arg(short, long, default_value = "")]
        query: String,
    },
    /// Add gear to the catalog
    Add {
        name: String,
        /// Weight in grams (or ounces with --imperial)
        #[arg(short, long)]
        weight: f64,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long, default_value = "")]
        description: String,
    },
    /// Edit a catalog entry
    Edit {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        /// Weight in grams (or ounces with --imperial)
        #[arg(short, long)]
        weight: Option<f64>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete gear and remove it from every hike
    Delete { id: Uuid },
    /// Gear not yet packed for a hike
    Available { hike: Uuid },
}

#[derive(Subcommand)]
enum HikeCommand {
    /// List hikes
    List,
    /// Create a hike
    Add {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        distance: String,
        #[arg(short, long, default_value = "")]
        location: String,
        /// External link (up to three)
        #[arg(long = "link", num_args = 1)]
        links: Vec<String>,
    },
    /// Edit a hike
    Edit {
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        distance: Option<String>,
        #[arg(short, long)]
        location: Option<String>,
        #[arg(long)]
        completed: Option<bool>,
        /// Replace link 1 (empty to clear)
        #[arg(long)]
        link1: Option<String>,
        /// Replace link 2 (empty to clear)
        #[arg(long)]
        link2: Option<String>,
        /// Replace link 3 (empty to clear)
        #[arg(long)]
        link3: Option<String>,
    },
    /// Delete a hike and its packing list
    Delete { id: Uuid },
    /// Show the packing list and weights
    Show {
        id: Uuid,
        /// Only show items not yet verified
        #[arg(short, long, conflicts_with = "all")]
        pending: bool,
        /// Show every item even if settings default to pending only
        #[arg(short, long)]
        all: bool,
        /// Filter rows by name, description, category or notes
        #[arg(short, long)]
        search: Option<String>,
        /// Print packing list item ids
        #[arg(long)]
        ids: bool,
    },
    /// Pack a catalog item
    Pack {
        hike: Uuid,
        gear: Uuid,
        #[arg(short, long, default_value_t = 1, allow_negative_numbers = true)]
        quantity: i64,
        #[arg(long)]
        worn: bool,
        #[arg(long)]
        consumable: bool,
        #[arg(short, long, default_value = "")]
        notes: String,
    },
    /// Remove an item from the packing list
    Unpack { hike: Uuid, item: Uuid },
    /// Toggle whether an item is worn
    Worn { hike: Uuid, item: Uuid },
    /// Toggle whether an item is consumed on the trip
    Consumable { hike: Uuid, item: Uuid },
    /// Toggle whether an item has been checked off
    Verify { hike: Uuid, item: Uuid },
    /// Set how many of an item are packed
    Quantity {
        hike: Uuid,
        item: Uuid,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Replace the notes on a packing list item
    Note { item: Uuid, notes: String },
    /// Weight breakdown by category
    Report {
        id: Uuid,
        /// Print the distributions as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the current settings
    Show,
    /// Set the default unit system
    Units { system: UnitArg },
    /// Show only unverified items by default
    Pending {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitArg {
    Metric,
    Imperial,
}

impl From<UnitArg> for UnitSystem {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::Metric => UnitSystem::Metric,
            UnitArg::Imperial => UnitSystem::Imperial,
        }
    }
}

#[derive(Serialize)]
struct HikeReport<'a> {
    hike_id: Uuid,
    hike: &'a str,
    unit_system: UnitSystem,
    weights: BTreeMap<&'static str, String>,
    /// Grams per category for each distribution.
    distributions: &'a Distributions,
}

/// Logs go to stderr so stdout only carries command output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "trailpack=info,trailpack_core=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut settings = Settings::load();
    let system = if cli.imperial {
        UnitSystem::Imperial
    } else if cli.metric {
        UnitSystem::Metric
    } else {
        settings.unit_system
    };

    match cli.command {
        Commands::Settings(command) => run_settings(command, &mut settings),
        Commands::Gear(command) => run_gear(command, &open_db(cli.db)?, &settings, system),
        Commands::Hike(command) => run_hike(command, &open_db(cli.db)?, &settings, system),
        Commands::Categories => {
            let catalog = open_db(cli.db)?.load_catalog()?;
            for category in catalog.category_choices(&settings.categories) {
                println!("{}", category);
            }
            Ok(())
        }
    }
}

fn open_db(path: Option<PathBuf>) -> Result<Database> {
    let db = match path {
        Some(path) => Database::open(path)?,
        None => Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

fn run_settings(command: SettingsCommand, settings: &mut Settings) -> Result<()> {
    match command {
        SettingsCommand::Show => {
            println!("{}", serde_json::to_string_pretty(settings)?);
            return Ok(());
        }
        SettingsCommand::Units { system } => settings.unit_system = system.into(),
        SettingsCommand::Pending { enabled } => settings.pending_only = enabled,
    }
    settings.save()?;
    println!("Settings saved");
    Ok(())
}

fn run_gear(command: GearCommand, db: &Database, settings: &Settings, system: UnitSystem) -> Result<()> {
    match command {
        GearCommand::List { query } => {
            let catalog = db.load_catalog()?;
            print!("{}", render::render_catalog(&catalog.filtered(&query), system));
        }
        GearCommand::Add {
            name,
            weight,
            category,
            description,
        } => {
            warn_unknown_category(settings, category.as_deref());
            let gear = db.create_gear(CreateGearInput {
                name,
                description,
                weight_grams: from_display_value(weight, system),
                category,
            })?;
            println!("Added {} [{}]", gear.name, gear.id);
        }
        GearCommand::Edit {
            id,
            name,
            weight,
            category,
            description,
        } => {
            warn_unknown_category(settings, category.as_deref());
            let input = UpdateGearInput {
                name,
                description,
                weight_grams: weight.map(|w| from_display_value(w, system)),
                category,
            };
            let gear = db.update_gear(id, input)?.context("Gear not found")?;
            println!("Updated {} [{}]", gear.name, gear.id);
        }
        GearCommand::Delete { id } => {
            let mut catalog = db.load_catalog()?;
            let mut store = db.clone();
            let gear = catalog
                .delete_cascading(id, &mut store)?
                .context("Gear not found")?;
            println!("Deleted {}", gear.name);
        }
        GearCommand::Available { hike } => {
            let hike = db.get_hike(hike)?.context("Hike not found")?;
            let catalog = db.load_catalog()?;
            let index = CategoryIndex::build(catalog.unassigned_for(&hike), |g| g.category.as_str());
            print!("{}", render::render_catalog(&index, system));
        }
    }
    Ok(())
}

fn run_hike(command: HikeCommand, db: &Database, settings: &Settings, system: UnitSystem) -> Result<()> {
    match command {
        HikeCommand::List => print!("{}", render::render_hikes(&db.get_all_hikes()?)),
        HikeCommand::Add {
            name,
            description,
            distance,
            location,
            links,
        } => {
            if links.len() > 3 {
                anyhow::bail!("A hike can have at most three links");
            }
            let mut slots: [Option<String>; 3] = Default::default();
            for (slot, link) in slots.iter_mut().zip(links) {
                *slot = Some(link);
            }
            let hike = db.create_hike(CreateHikeInput {
                name,
                description,
                distance,
                location,
                links: slots,
            })?;
            println!("Added {} [{}]", hike.name, hike.id);
        }
        HikeCommand::Edit {
            id,
            name,
            description,
            distance,
            location,
            completed,
            link1,
            link2,
            link3,
        } => {
            let input = UpdateHikeInput {
                name,
                description,
                distance,
                location,
                completed,
                links: [link1, link2, link3],
            };
            let hike = db.update_hike(id, input)?.context("Hike not found")?;
            println!("Updated {} [{}]", hike.name, hike.id);
        }
        HikeCommand::Delete { id } => {
            if !db.delete_hike(id)? {
                anyhow::bail!("Hike not found");
            }
            println!("Deleted hike {}", id);
        }
        HikeCommand::Show {
            id,
            pending,
            all,
            search,
            ids,
        } => {
            let view = if pending {
                ViewMode::PendingOnly
            } else if all {
                ViewMode::All
            } else {
                settings.view_mode()
            };
            let aggregator = load(db, id, view)?;
            match search {
                Some(query) => {
                    let index = aggregator.search(&query);
                    let sections = index
                        .sections()
                        .map(|(category, items)| (category, items.to_vec()));
                    print!("{}", render::render_packing_list(sections, system, ids));
                    print!("\n{}", render::render_weights(&aggregator, system));
                }
                None => print!("{}", render::render_hike(&aggregator, system, ids)),
            }
        }
        HikeCommand::Pack {
            hike,
            gear,
            quantity,
            worn,
            consumable,
            notes,
        } => {
            let assignment = db.add_gear_to_hike(
                hike,
                AddHikeGearInput {
                    gear_id: gear,
                    quantity: Some(quantity),
                    worn,
                    consumable,
                    notes,
                },
            )?;
            println!("Packed [{}]", assignment.id);
            print!("{}", render::render_weights(&load(db, hike, ViewMode::All)?, system));
        }
        HikeCommand::Unpack { hike, item } => {
            mutate(db, hike, system, |a| a.remove_assignment(item))?;
        }
        HikeCommand::Worn { hike, item } => {
            mutate(db, hike, system, |a| a.toggle_worn(item))?;
        }
        HikeCommand::Consumable { hike, item } => {
            mutate(db, hike, system, |a| a.toggle_consumable(item))?;
        }
        HikeCommand::Verify { hike, item } => {
            mutate(db, hike, system, |a| a.toggle_verified(item))?;
        }
        HikeCommand::Quantity {
            hike,
            item,
            quantity,
        } => {
            mutate(db, hike, system, |a| a.set_quantity(item, quantity))?;
        }
        HikeCommand::Note { item, notes } => {
            if !db.update_hike_gear_notes(item, &notes)? {
                anyhow::bail!("Packing list item not found");
            }
            println!("Notes updated");
        }
        HikeCommand::Report { id, json } => {
            let aggregator = load(db, id, ViewMode::All)?;
            if json {
                let report = HikeReport {
                    hike_id: id,
                    hike: &aggregator.hike().name,
                    unit_system: system,
                    weights: WeightKind::ALL
                        .iter()
                        .map(|kind| (kind.as_str(), aggregator.weight_string(*kind, system)))
                        .collect(),
                    distributions: aggregator.distributions(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render::render_report(aggregator.distributions(), system));
            }
        }
    }
    Ok(())
}

fn load(db: &Database, hike_id: Uuid, view: ViewMode) -> Result<HikeAggregator> {
    db.load_aggregator(hike_id, view)?.context("Hike not found")
}

/// Apply one aggregator mutation, persist it, and print the new weights.
fn mutate(
    db: &Database,
    hike_id: Uuid,
    system: UnitSystem,
    apply: impl FnOnce(&mut HikeAggregator) -> Result<PackChange, CoreError>,
) -> Result<()> {
    let mut aggregator = load(db, hike_id, ViewMode::All)?;
    let change = apply(&mut aggregator)?;
    if !db.apply_change(&change)? {
        anyhow::bail!("Packing list item {} no longer exists", change.assignment_id());
    }
    print!("{}", render::render_weights(&aggregator, system));
    Ok(())
}

fn warn_unknown_category(settings: &Settings, category: Option<&str>) {
    if let Some(category) = category {
        if !settings.is_known_category(category) {
            tracing::warn!(category, "Category is not in the configured category list");
        }
    }
}
