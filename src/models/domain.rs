use serde::{Deserialize, Serialize};

/// A point on the Earth's surface in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both components are finite and inside the valid degree ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Category reference attached to a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub name: String,
    pub slug: String,
}

/// A published care-service listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRecord {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub summary: String,
    pub categories: Vec<CategoryRef>,
    pub service_area: String,
    pub town: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    #[serde(default)]
    pub funding_types: Vec<String>,
    pub address: Option<String>,
    pub location: Option<Coordinate>,
    pub published: bool,
}

impl ProviderRecord {
    pub fn has_category(&self, slug: &str) -> bool {
        self.categories.iter().any(|c| c.slug == slug)
    }
}

/// Great-circle distance in miles
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Distance(f64);

impl Distance {
    /// Wrap a mileage, rejecting NaN and infinities
    pub fn from_miles(miles: f64) -> Option<Self> {
        miles.is_finite().then_some(Self(miles))
    }

    pub fn miles(&self) -> f64 {
        self.0
    }
}

/// A provider annotated with its distance from the search origin
///
/// `distance` is `None` when either the provider has no location or no
/// origin was available for the search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedRecord {
    #[serde(flatten)]
    pub record: ProviderRecord,
    #[serde(rename = "distanceMiles")]
    pub distance: Option<Distance>,
}

impl AnnotatedRecord {
    pub fn unranked(record: ProviderRecord) -> Self {
        Self { record, distance: None }
    }
}

/// Heading copy shown above the directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryCopy {
    pub title: String,
    pub subtitle: String,
}

impl Default for DirectoryCopy {
    fn default() -> Self {
        Self {
            title: "Care Directory".to_string(),
            subtitle: "Browse trusted wellbeing and care services in your area.".to_string(),
        }
    }
}
