//! Care Directory - search service for a regional care-services listing
//!
//! This library implements the directory pipeline behind the site: fetching
//! published providers from the content store, geocoding a UK postcode,
//! filtering by category and ranking by great-circle distance.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{CategoryFilter, DirectorySearch, MapView, distance::{haversine_distance, haversine_miles}};
pub use models::{AnnotatedRecord, Coordinate, Distance, ProviderRecord, DirectoryResponse};
