use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

static UK_POSTCODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Z]{1,2}[0-9R][0-9A-Z]?\s?[0-9][A-Z]{2}$").expect("postcode pattern is valid")
});

/// Loose UK postcode syntax check used when validating search input
///
/// The lookup service stays authoritative; this only catches obvious typos.
pub fn is_valid_uk_postcode(postcode: &str) -> bool {
    UK_POSTCODE.is_match(postcode.trim())
}

/// Query string of the directory list endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DirectoryQuery {
    #[validate(custom(function = "validate_postcode"))]
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Query string of the map endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct MapQuery {
    #[validate(custom(function = "validate_postcode"))]
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Id of the marker the map should centre on
    #[serde(default)]
    pub selected: Option<String>,
}

/// Postcode as entered, or `None` when blank
pub fn search_postcode(postcode: &Option<String>) -> Option<&str> {
    postcode
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
}

fn validate_postcode(postcode: &str) -> Result<(), ValidationError> {
    if postcode.trim().is_empty() || is_valid_uk_postcode(postcode) {
        return Ok(());
    }

    let mut err = ValidationError::new("postcode");
    err.message = Some("Please enter a valid UK postcode (e.g., CO1 1AA, M1 1AA, B33 8TH)".into());
    Err(err)
}
