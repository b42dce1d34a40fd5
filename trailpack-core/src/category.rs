//! Stable grouping of category-bearing items into sorted sections.

use std::collections::BTreeMap;

/// Items partitioned by category label.
///
/// Categories are ordered by ordinal string comparison. Within a category,
/// items keep the relative order they had in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryIndex<T> {
    categories: Vec<String>,
    by_category: BTreeMap<String, Vec<T>>,
}

impl<T> Default for CategoryIndex<T> {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            by_category: BTreeMap::new(),
        }
    }
}

impl<T> CategoryIndex<T> {
    pub fn build<I, F>(items: I, category_of: F) -> Self
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> &str,
    {
        let mut by_category: BTreeMap<String, Vec<T>> = BTreeMap::new();
        for item in items {
            let category = category_of(&item).to_string();
            by_category.entry(category).or_default().push(item);
        }

        let categories = by_category.keys().cloned().collect();
        Self {
            categories,
            by_category,
        }
    }

    /// Sorted category labels, one per section.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn category_at(&self, section: usize) -> Option<&str> {
        self.categories.get(section).map(String::as_str)
    }

    /// Items in `category`, empty if the category has no items.
    pub fn items_in(&self, category: &str) -> &[T] {
        self.by_category
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Row `row` of section `section`.
    pub fn item_at(&self, section: usize, row: usize) -> Option<&T> {
        self.category_at(section)
            .and_then(|category| self.items_in(category).get(row))
    }

    /// Sections in category order.
    pub fn sections(&self) -> impl Iterator<Item = (&str, &[T])> {
        self.by_category
            .iter()
            .map(|(category, items)| (category.as_str(), items.as_slice()))
    }

    pub fn section_count(&self) -> usize {
        self.categories.len()
    }

    /// Total number of items across all sections.
    pub fn len(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
