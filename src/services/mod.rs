// Service exports
pub mod content_store;
pub mod geocoder;

pub use content_store::{ContentStoreClient, ContentStoreError};
pub use geocoder::{is_valid_uk_postcode, normalize_postcode, PostcodeGeocoder};
