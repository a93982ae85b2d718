//! Raw content-store document shapes and their conversion into domain types.
//!
//! The store is schema-less, so every field is optional here. Conversion
//! enforces the fields a listing cannot exist without and drops anything
//! that fails, so core code only ever sees fully-formed records.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::domain::{CategoryRef, Coordinate, DirectoryCopy, ProviderRecord};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("document is missing required field `{0}`")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSlug {
    pub current: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCategory {
    #[serde(rename = "categoryName")]
    pub category_name: Option<String>,
    pub slug: Option<RawSlug>,
}

impl RawCategory {
    pub fn into_category(self) -> Option<CategoryRef> {
        let name = non_empty(self.category_name)?;
        let slug = non_empty(self.slug.and_then(|s| s.current))?;
        Some(CategoryRef { name, slug })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLocation {
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl RawLocation {
    /// Read a location field. Members of the wrong type count as absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(Self {
            address: object.get("address").and_then(Value::as_str).map(str::to_string),
            lat: object.get("lat").and_then(Value::as_f64),
            lng: object.get("lng").and_then(Value::as_f64),
        })
    }

    /// Coordinate for the location, if both halves are present and in range
    pub fn coordinate(&self) -> Option<Coordinate> {
        let coordinate = Coordinate::new(self.lat?, self.lng?);
        coordinate.is_valid().then_some(coordinate)
    }
}

/// A provider document as returned by the directory queries
#[derive(Debug, Clone, Deserialize)]
pub struct RawProviderDocument {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(rename = "serviceName")]
    pub service_name: Option<String>,
    pub slug: Option<RawSlug>,
    #[serde(rename = "shortDescription")]
    pub short_description: Option<String>,
    #[serde(rename = "serviceArea")]
    pub service_area: Option<String>,
    pub town: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    // Dangling references come back as null entries
    #[serde(rename = "serviceCategories", default)]
    pub service_categories: Option<Vec<Option<RawCategory>>>,
    #[serde(rename = "fundingTypes", default)]
    pub funding_types: Option<Vec<String>>,
    #[serde(rename = "isPublished")]
    pub is_published: Option<bool>,
    #[serde(default)]
    pub location: Option<Value>,
}

impl RawProviderDocument {
    pub fn into_record(self) -> Result<ProviderRecord, DocumentError> {
        let id = non_empty(self.id).ok_or(DocumentError::MissingField("_id"))?;
        let name = non_empty(self.service_name).ok_or(DocumentError::MissingField("serviceName"))?;
        let slug = non_empty(self.slug.and_then(|s| s.current))
            .ok_or(DocumentError::MissingField("slug"))?;

        let categories = self
            .service_categories
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter_map(RawCategory::into_category)
            .collect();

        let (address, location) = match self.location.as_ref().and_then(RawLocation::from_value) {
            Some(loc) => {
                let coordinate = loc.coordinate();
                (non_empty(loc.address), coordinate)
            }
            None => (None, None),
        };

        Ok(ProviderRecord {
            id,
            name,
            slug,
            summary: self.short_description.unwrap_or_default(),
            categories,
            service_area: self.service_area.unwrap_or_default(),
            town: non_empty(self.town),
            phone: non_empty(self.phone),
            email: non_empty(self.email),
            website: non_empty(self.website),
            funding_types: self.funding_types.unwrap_or_default(),
            address,
            location,
            // Schema default for the flag is true
            published: self.is_published.unwrap_or(true),
        })
    }
}

/// Directory heading fields of the site settings singleton
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSiteSettings {
    #[serde(rename = "directoryPageTitle")]
    pub directory_page_title: Option<String>,
    #[serde(rename = "directoryPageSubtitle")]
    pub directory_page_subtitle: Option<String>,
}

impl RawSiteSettings {
    /// Fill any blank heading field from `defaults`
    pub fn into_copy(self, defaults: &DirectoryCopy) -> DirectoryCopy {
        DirectoryCopy {
            title: non_empty(self.directory_page_title).unwrap_or_else(|| defaults.title.clone()),
            subtitle: non_empty(self.directory_page_subtitle)
                .unwrap_or_else(|| defaults.subtitle.clone()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> Result<ProviderRecord, DocumentError> {
        serde_json::from_value::<RawProviderDocument>(value)
            .expect("document should deserialize")
            .into_record()
    }

    #[test]
    fn test_full_document_decodes() {
        let record = decode(json!({
            "_id": "entry-1",
            "serviceName": "Colchester Carers",
            "slug": { "current": "colchester-carers" },
            "shortDescription": "Support for unpaid carers",
            "serviceArea": "Colchester",
            "town": "Colchester",
            "phone": "01206 000000",
            "serviceCategories": [
                { "categoryName": "Carer Support", "slug": { "current": "carer-support" } },
                null
            ],
            "fundingTypes": ["Charity"],
            "isPublished": true,
            "location": { "address": "1 High St", "lat": 51.8959, "lng": 0.9034 }
        }))
        .unwrap();

        assert_eq!(record.id, "entry-1");
        assert_eq!(record.categories.len(), 1);
        assert_eq!(record.categories[0].slug, "carer-support");
        assert_eq!(record.location, Some(Coordinate::new(51.8959, 0.9034)));
        assert_eq!(record.address.as_deref(), Some("1 High St"));
        assert!(record.email.is_none());
    }

    #[test]
    fn test_missing_slug_is_rejected() {
        let err = decode(json!({ "_id": "entry-2", "serviceName": "No Slug" })).unwrap_err();
        assert_eq!(err, DocumentError::MissingField("slug"));
    }

    #[test]
    fn test_partial_or_out_of_range_location_is_dropped() {
        let record = decode(json!({
            "_id": "a", "serviceName": "A", "slug": { "current": "a" },
            "location": { "lat": 51.9 }
        }))
        .unwrap();
        assert!(record.location.is_none());

        let record = decode(json!({
            "_id": "b", "serviceName": "B", "slug": { "current": "b" },
            "location": { "lat": 151.9, "lng": 0.5 }
        }))
        .unwrap();
        assert!(record.location.is_none());
    }

    #[test]
    fn test_malformed_location_keeps_record_without_coordinate() {
        let record = decode(json!({
            "_id": "a", "serviceName": "A", "slug": { "current": "a" },
            "location": { "address": "Old Mill", "lat": "51.9", "lng": 0.9 }
        }))
        .unwrap();
        assert_eq!(record.id, "a");
        assert!(record.location.is_none());
        assert_eq!(record.address.as_deref(), Some("Old Mill"));

        let record = decode(json!({
            "_id": "b", "serviceName": "B", "slug": { "current": "b" },
            "location": "somewhere in Essex"
        }))
        .unwrap();
        assert!(record.location.is_none());
        assert!(record.address.is_none());
    }

    #[test]
    fn test_site_settings_fall_back_to_defaults() {
        let settings = RawSiteSettings {
            directory_page_title: Some("Find Support".to_string()),
            directory_page_subtitle: Some("  ".to_string()),
        };
        let copy = settings.into_copy(&DirectoryCopy::default());
        assert_eq!(copy.title, "Find Support");
        assert_eq!(copy.subtitle, DirectoryCopy::default().subtitle);
    }
}
