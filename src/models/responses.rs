use serde::{Deserialize, Serialize};

use crate::core::map::MapView;
use crate::models::domain::{AnnotatedRecord, Coordinate};

/// Response for the directory list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryResponse {
    pub title: String,
    pub subtitle: String,
    pub entries: Vec<AnnotatedRecord>,
    /// Category names present in the fetched listing
    pub categories: Vec<String>,
    /// Geocoded search origin, absent when no postcode was given or it did not resolve
    pub origin: Option<Coordinate>,
    pub total_results: usize,
}

/// Response for the map endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapResponse {
    #[serde(flatten)]
    pub view: MapView,
    pub origin: Option<Coordinate>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
