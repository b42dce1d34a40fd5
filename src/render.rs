//! Plain-text rendering of catalogs, packing lists and weight reports.

use trailpack_core::aggregator::{Distributions, HikeAggregator, PackedItem, WeightKind};
use trailpack_core::category::CategoryIndex;
use trailpack_core::models::{GearItem, Hike};
use trailpack_core::units::{format_major_minor, to_display_value, UnitSystem};

const VERIFIED: char = '✓';
const PENDING: char = '○';
const COMPLETED: char = '●';
const PLANNED: char = '◇';

/// Render category sections as a tree with one row per item.
///
/// Example output:
/// ```text
/// Clothing
/// └── ✓ Boots  900.0 g  worn
/// Food
/// ├── ○ Dinner x3  750.0 g  consumable
/// └── ○ Oats  150.0 g
/// ```
fn render_tree<I, S, T, F>(sections: I, row: F) -> String
where
    I: IntoIterator<Item = (S, Vec<T>)>,
    S: AsRef<str>,
    F: Fn(&T) -> String,
{
    let mut output = String::new();
    for (category, items) in sections {
        output.push_str(category.as_ref());
        output.push('\n');
        for (i, item) in items.iter().enumerate() {
            let branch = if i == items.len() - 1 { "└── " } else { "├── " };
            output.push_str(branch);
            output.push_str(&row(item));
            output.push('\n');
        }
    }
    output
}

fn weight(grams: f64, system: UnitSystem) -> String {
    format!("{:.1} {}", to_display_value(grams, system), system.entry_unit())
}

fn packed_row(item: &PackedItem, system: UnitSystem, show_ids: bool) -> String {
    let assignment = &item.assignment;
    let marker = if assignment.verified { VERIFIED } else { PENDING };

    let mut row = format!("{} {}", marker, item.name());
    if assignment.quantity != 1 {
        row.push_str(&format!(" x{}", assignment.quantity));
    }
    row.push_str("  ");
    row.push_str(&weight(item.weight_grams(), system));
    if assignment.worn {
        row.push_str("  worn");
    }
    if assignment.consumable {
        row.push_str("  consumable");
    }
    if !assignment.notes.is_empty() {
        row.push_str(&format!("  ({})", assignment.notes));
    }
    if show_ids {
        row.push_str(&format!("  [{}]", assignment.id));
    }
    row
}

/// Packing list sections, one tree per category.
pub fn render_packing_list<'a>(
    sections: impl IntoIterator<Item = (&'a str, Vec<&'a PackedItem>)>,
    system: UnitSystem,
    show_ids: bool,
) -> String {
    render_tree(sections, |item| packed_row(item, system, show_ids))
}

/// The four weight totals, one per line.
pub fn render_weights(aggregator: &HikeAggregator, system: UnitSystem) -> String {
    WeightKind::ALL
        .iter()
        .map(|kind| {
            format!(
                "{:<12}{}\n",
                kind.label(),
                aggregator.weight_string(*kind, system)
            )
        })
        .collect()
}

/// Full packing list view: header, sections for the current view, weights.
pub fn render_hike(aggregator: &HikeAggregator, system: UnitSystem, show_ids: bool) -> String {
    let hike = aggregator.hike();
    let mut output = format!("{} {}\n", hike_marker(hike), hike.name);
    for detail in [&hike.location, &hike.distance, &hike.description] {
        if !detail.is_empty() {
            output.push_str(&format!("  {}\n", detail));
        }
    }
    for link in hike.links.iter().flatten() {
        output.push_str(&format!("  {}\n", link));
    }
    output.push('\n');

    let sections = aggregator
        .category_sections()
        .into_iter()
        .map(|(category, items)| (category, items.iter().collect::<Vec<_>>()));
    let list = render_packing_list(sections, system, show_ids);
    if list.is_empty() {
        output.push_str("(nothing to show)\n");
    } else {
        output.push_str(&list);
    }

    output.push('\n');
    output.push_str(&render_weights(aggregator, system));
    output
}

/// Catalog sections with per-item weight.
pub fn render_catalog(index: &CategoryIndex<&GearItem>, system: UnitSystem) -> String {
    let sections = index
        .sections()
        .map(|(category, items)| (category, items.to_vec()));
    render_tree(sections, |gear| {
        format!("{}  {}  [{}]", gear.name, weight(gear.weight_grams, system), gear.id)
    })
}

/// Per-category breakdown of every distribution.
///
/// ```text
/// Total: 1 Kg 650.0 Grams
///   Clothing        0 Kg 900.0 Grams
///   Food            0 Kg 750.0 Grams
/// ```
pub fn render_report(distributions: &Distributions, system: UnitSystem) -> String {
    let mut output = String::new();
    for kind in WeightKind::ALL {
        let distribution = distributions.get(kind);
        output.push_str(&format!(
            "{}: {}\n",
            kind.label(),
            format_major_minor(distribution.total_grams, system)
        ));
        for (category, grams) in &distribution.by_category {
            output.push_str(&format!(
                "  {:<16}{}\n",
                category,
                format_major_minor(*grams, system)
            ));
        }
    }
    output
}

fn hike_marker(hike: &Hike) -> char {
    if hike.completed {
        COMPLETED
    } else {
        PLANNED
    }
}

/// One line per hike.
pub fn render_hikes(hikes: &[Hike]) -> String {
    hikes
        .iter()
        .map(|hike| {
            let mut line = format!("{} {}", hike_marker(hike), hike.name);
            if !hike.location.is_empty() {
                line.push_str(&format!(" - {}", hike.location));
            }
            format!("{}  ({} items)  [{}]\n", line, hike.gear.len(), hike.id)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use trailpack_core::aggregator::ViewMode;
    use trailpack_core::models::HikeGear;

    fn sample() -> HikeAggregator {
        let boots = GearItem::new("Boots", "", 900.0, Some("Clothing"));
        let dinner = GearItem::new("Dinner", "", 250.0, Some("Food"));
        let oats = GearItem::new("Oats", "", 150.0, Some("Food"));

        let mut hike = Hike::new("Ridge");
        hike.location = "Sawtooths".to_string();
        let mut worn = HikeGear::new(hike.id, boots.id);
        worn.worn = true;
        worn.verified = true;
        let mut eaten = HikeGear::new(hike.id, dinner.id);
        eaten.quantity = 3;
        eaten.consumable = true;
        hike.gear = vec![worn, eaten, HikeGear::new(hike.id, oats.id)];

        HikeAggregator::new(hike, vec![boots, dinner, oats], ViewMode::All)
    }

    #[test]
    fn test_packing_list_tree() {
        let aggregator = sample();
        let sections = aggregator
            .category_sections()
            .into_iter()
            .map(|(c, items)| (c, items.iter().collect::<Vec<_>>()));

        let output = render_packing_list(sections, UnitSystem::Metric, false);
        assert_eq!(
            output,
            "Clothing\n└── ✓ Boots  900.0 g  worn\nFood\n├── ○ Dinner x3  750.0 g  consumable\n└── ○ Oats  150.0 g\n"
        );
    }

    #[test]
    fn test_weights_block() {
        let output = render_weights(&sample(), UnitSystem::Metric);
        assert_eq!(
            output,
            "Total       1 Kg 800.0 Grams\nBase        0 Kg 150.0 Grams\nWorn        0 Kg 900.0 Grams\nConsumable  0 Kg 750.0 Grams\n"
        );
    }

    #[test]
    fn test_hike_view_lists_header_and_empty_state() {
        let mut aggregator = sample();
        let output = render_hike(&aggregator, UnitSystem::Metric, false);
        assert!(output.starts_with("◇ Ridge\n  Sawtooths\n\nClothing\n"));

        for id in aggregator.rows().iter().map(|r| r.assignment.id).collect::<Vec<_>>() {
            if aggregator.hike().assignment(id).is_some_and(|a| !a.verified) {
                aggregator.toggle_verified(id).unwrap();
            }
        }
        aggregator.set_view(ViewMode::PendingOnly);
        let output = render_hike(&aggregator, UnitSystem::Metric, false);
        assert!(output.contains("(nothing to show)"));
        assert!(output.contains("Total       1 Kg 800.0 Grams"));
    }

    #[test]
    fn test_report_breakdown() {
        let output = render_report(sample().distributions(), UnitSystem::Metric);
        assert!(output.starts_with("Total: 1 Kg 800.0 Grams\n  Clothing        0 Kg 900.0 Grams\n"));
        assert!(output.contains("Base: 0 Kg 150.0 Grams\n  Food            0 Kg 150.0 Grams\n"));
    }

    #[test]
    fn test_empty_catalog_renders_nothing() {
        let index: CategoryIndex<&GearItem> = CategoryIndex::default();
        assert_eq!(render_catalog(&index, UnitSystem::Imperial), "");
    }
}
