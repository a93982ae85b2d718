use std::collections::{BTreeSet, HashSet};

use crate::models::{AnnotatedRecord, ProviderRecord};

/// Sentinel query value meaning "no category filter"
pub const ALL_CATEGORIES: &str = "all";

/// Category selection for a directory search
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Slug(String),
}

impl CategoryFilter {
    /// Parse a query value. Absent, blank and exactly `"all"` select everything;
    /// anything else is matched verbatim against category slugs.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            None => Self::All,
            Some(v) if v.is_empty() || v == ALL_CATEGORIES => Self::All,
            Some(v) => Self::Slug(v.to_string()),
        }
    }

    #[inline]
    pub fn matches(&self, record: &ProviderRecord) -> bool {
        match self {
            Self::All => true,
            Self::Slug(slug) => record.has_category(slug),
        }
    }
}

/// Keep records in the selected category, preserving input order
pub fn filter_by_category(
    records: Vec<ProviderRecord>,
    filter: &CategoryFilter,
) -> Vec<ProviderRecord> {
    if *filter == CategoryFilter::All {
        return records;
    }

    records.into_iter().filter(|r| filter.matches(r)).collect()
}

/// Sorted, de-duplicated category names present in `records`
pub fn distinct_category_names(records: &[ProviderRecord]) -> Vec<String> {
    records
        .iter()
        .flat_map(|r| r.categories.iter().map(|c| c.name.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Restrict `records` to the ids present in `visible`
///
/// An empty `visible` set means no restriction.
pub fn restrict_to_ids(records: Vec<ProviderRecord>, visible: &[AnnotatedRecord]) -> Vec<ProviderRecord> {
    if visible.is_empty() {
        return records;
    }

    let ids: HashSet<&str> = visible.iter().map(|a| a.record.id.as_str()).collect();
    records
        .into_iter()
        .filter(|r| ids.contains(r.id.as_str()))
        .collect()
}
