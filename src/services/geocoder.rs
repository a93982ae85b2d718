use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::GeocoderSettings;
use crate::models::Coordinate;

pub use crate::models::requests::is_valid_uk_postcode;

/// Trim and strip all whitespace, e.g. `" co1 1aa "` -> `"co11aa"`
pub fn normalize_postcode(postcode: &str) -> String {
    postcode.split_whitespace().collect()
}

/// Reasons a lookup produced no coordinate. Logged, never returned.
#[derive(Debug, Error)]
enum GeocodeError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("lookup service returned {0}")]
    Status(reqwest::StatusCode),

    #[error("response has no usable latitude/longitude")]
    MissingCoordinates,
}

#[derive(Debug, Deserialize)]
struct PostcodeResponse {
    result: Option<PostcodeResult>,
}

#[derive(Debug, Deserialize)]
struct PostcodeResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Client for a postcodes.io-compatible lookup service
pub struct PostcodeGeocoder {
    base_url: String,
    client: Client,
}

impl PostcodeGeocoder {
    pub fn new(settings: &GeocoderSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Resolve a postcode to a coordinate
    ///
    /// Issues at most one request. Every failure (unknown postcode, transport
    /// error, malformed body) comes back as `None` so callers can carry on
    /// without distance ranking.
    pub async fn lookup(&self, postcode: &str) -> Option<Coordinate> {
        let normalized = normalize_postcode(postcode);
        if normalized.is_empty() {
            return None;
        }

        match self.fetch(&normalized).await {
            Ok(coordinate) => {
                tracing::debug!("Geocoded {} -> ({}, {})", normalized, coordinate.lat, coordinate.lng);
                Some(coordinate)
            }
            Err(e) => {
                tracing::warn!("Could not geocode postcode {}: {}", normalized, e);
                None
            }
        }
    }

    async fn fetch(&self, normalized: &str) -> Result<Coordinate, GeocodeError> {
        let url = format!("{}/postcodes/{}", self.base_url, urlencoding::encode(normalized));

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(GeocodeError::Status(response.status()));
        }

        let body: PostcodeResponse = response.json().await?;
        let result = body.result.ok_or(GeocodeError::MissingCoordinates)?;

        match (result.latitude, result.longitude) {
            (Some(lat), Some(lng)) => {
                let coordinate = Coordinate::new(lat, lng);
                if coordinate.is_valid() {
                    Ok(coordinate)
                } else {
                    Err(GeocodeError::MissingCoordinates)
                }
            }
            _ => Err(GeocodeError::MissingCoordinates),
        }
    }
}
