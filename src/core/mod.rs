// Core algorithm exports
pub mod distance;
pub mod filters;
pub mod map;
pub mod search;

pub use distance::{haversine_distance, haversine_miles};
pub use filters::{distinct_category_names, filter_by_category, restrict_to_ids, CategoryFilter};
pub use map::{map_markers, MapBounds, MapView};
pub use search::{annotate_distances, sort_by_distance, DirectorySearch, SearchResult};
