use std::cmp::Ordering;

use crate::core::{
    distance::haversine_miles,
    filters::{filter_by_category, CategoryFilter},
};
use crate::models::{AnnotatedRecord, Coordinate, Distance, ProviderRecord};

/// Result of one directory search
#[derive(Debug)]
pub struct SearchResult {
    pub entries: Vec<AnnotatedRecord>,
    pub total_fetched: usize,
    pub ranked_by_distance: bool,
}

/// Directory search pipeline
///
/// # Pipeline Stages
/// 1. Category filter
/// 2. Distance annotation against the search origin
/// 3. Stable ordering by distance, unknown distances last
///
/// Without an origin the store's own ordering is kept and stage 3 is skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectorySearch;

impl DirectorySearch {
    pub fn new() -> Self {
        Self
    }

    /// Run the pipeline over an already fetched record set
    ///
    /// # Arguments
    /// * `records` - Published providers in content-store order
    /// * `filter` - Category selection
    /// * `origin` - Geocoded search origin, if any
    pub fn run(
        &self,
        records: Vec<ProviderRecord>,
        filter: &CategoryFilter,
        origin: Option<Coordinate>,
    ) -> SearchResult {
        let total_fetched = records.len();

        let filtered = filter_by_category(records, filter);
        let mut entries = annotate_distances(filtered, origin);

        let ranked_by_distance = origin.is_some();
        if ranked_by_distance {
            sort_by_distance(&mut entries);
        }

        SearchResult {
            entries,
            total_fetched,
            ranked_by_distance,
        }
    }
}

/// Attach a distance to every record
///
/// A record gets `Some` only when both it and the origin have a coordinate.
pub fn annotate_distances(
    records: Vec<ProviderRecord>,
    origin: Option<Coordinate>,
) -> Vec<AnnotatedRecord> {
    records
        .into_iter()
        .map(|record| {
            let distance = match (origin, record.location) {
                (Some(from), Some(to)) => Distance::from_miles(haversine_miles(from, to)),
                _ => None,
            };
            AnnotatedRecord { record, distance }
        })
        .collect()
}

/// Stable ascending sort by distance with unknown distances last
pub fn sort_by_distance(entries: &mut [AnnotatedRecord]) {
    entries.sort_by(|a, b| compare_distance(a.distance, b.distance));
}

#[inline]
fn compare_distance(a: Option<Distance>, b: Option<Distance>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.miles().total_cmp(&b.miles()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryRef;

    fn create_record(id: &str, location: Option<(f64, f64)>, slug: &str) -> ProviderRecord {
        ProviderRecord {
            id: id.to_string(),
            name: format!("Provider {}", id),
            slug: format!("provider-{}", id),
            summary: String::new(),
            categories: vec![CategoryRef {
                name: slug.to_string(),
                slug: slug.to_string(),
            }],
            service_area: "Colchester".to_string(),
            town: None,
            phone: None,
            email: None,
            website: None,
            funding_types: vec![],
            address: None,
            location: location.map(|(lat, lng)| Coordinate::new(lat, lng)),
            published: true,
        }
    }

    fn ids(entries: &[AnnotatedRecord]) -> Vec<&str> {
        entries.iter().map(|e| e.record.id.as_str()).collect()
    }

    #[test]
    fn test_sorted_with_unknown_last() {
        let origin = Coordinate::new(51.8896, 0.9020);
        let records = vec![
            create_record("none", None, "care"),
            create_record("far", Some((51.7909, 1.1563)), "care"),
            create_record("near", Some((51.8959, 0.9034)), "care"),
        ];

        let result = DirectorySearch::new().run(records, &CategoryFilter::All, Some(origin));

        assert!(result.ranked_by_distance);
        assert_eq!(ids(&result.entries), vec!["near", "far", "none"]);
        assert!(result.entries[2].distance.is_none());
    }

    #[test]
    fn test_no_origin_keeps_store_order() {
        let records = vec![
            create_record("b", Some((51.7909, 1.1563)), "care"),
            create_record("a", Some((51.8959, 0.9034)), "care"),
        ];

        let result = DirectorySearch::new().run(records, &CategoryFilter::All, None);

        assert!(!result.ranked_by_distance);
        assert_eq!(ids(&result.entries), vec!["b", "a"]);
        assert!(result.entries.iter().all(|e| e.distance.is_none()));
    }

    #[test]
    fn test_ties_keep_input_order() {
        let origin = Coordinate::new(51.8896, 0.9020);
        let records = vec![
            create_record("first", Some((51.8959, 0.9034)), "care"),
            create_record("second", Some((51.8959, 0.9034)), "care"),
            create_record("x", None, "care"),
            create_record("y", None, "care"),
        ];

        let result = DirectorySearch::new().run(records, &CategoryFilter::All, Some(origin));
        assert_eq!(ids(&result.entries), vec!["first", "second", "x", "y"]);
    }

    #[test]
    fn test_filter_applies_before_sort() {
        let origin = Coordinate::new(51.8896, 0.9020);
        let records = vec![
            create_record("1", Some((51.7909, 1.1563)), "home-care"),
            create_record("2", Some((51.8959, 0.9034)), "dementia-care"),
            create_record("3", Some((51.8960, 0.9040)), "home-care"),
        ];

        let filter = CategoryFilter::Slug("home-care".to_string());
        let result = DirectorySearch::new().run(records, &filter, Some(origin));

        assert_eq!(result.total_fetched, 3);
        assert_eq!(ids(&result.entries), vec!["3", "1"]);
    }
}
