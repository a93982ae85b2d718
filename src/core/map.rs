use geo::{BoundingRect, MultiPoint, Point};
use serde::{Deserialize, Serialize};

use crate::models::{AnnotatedRecord, Coordinate};

/// Map centre used when nothing is selected (Colchester)
pub const DEFAULT_CENTER: Coordinate = Coordinate {
    lat: 51.8959,
    lng: 0.9035,
};
pub const DEFAULT_ZOOM: u8 = 11;
pub const SELECTED_ZOOM: u8 = 14;

/// South-west / north-east corners enclosing every marker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapBounds {
    pub south_west: Coordinate,
    pub north_east: Coordinate,
}

/// Marker set plus viewport for the map view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    pub markers: Vec<AnnotatedRecord>,
    pub center: Coordinate,
    pub zoom: u8,
    pub bounds: Option<MapBounds>,
    pub selected: Option<String>,
}

impl MapView {
    /// Build the view from an annotated set
    ///
    /// Only records with a coordinate become markers. When `selected` names one
    /// of them the map centres on it at street zoom.
    pub fn build(entries: Vec<AnnotatedRecord>, selected: Option<&str>) -> Self {
        let markers = map_markers(entries);
        let bounds = marker_bounds(&markers);

        let selected_marker = selected.and_then(|id| {
            markers
                .iter()
                .find(|m| m.record.id == id)
                .and_then(|m| m.record.location.map(|loc| (m.record.id.clone(), loc)))
        });

        match selected_marker {
            Some((id, location)) => Self {
                markers,
                center: location,
                zoom: SELECTED_ZOOM,
                bounds,
                selected: Some(id),
            },
            None => Self {
                markers,
                center: DEFAULT_CENTER,
                zoom: DEFAULT_ZOOM,
                bounds,
                selected: None,
            },
        }
    }
}

/// Records that can be plotted
pub fn map_markers(entries: Vec<AnnotatedRecord>) -> Vec<AnnotatedRecord> {
    entries
        .into_iter()
        .filter(|e| e.record.location.is_some())
        .collect()
}

/// Bounding rectangle of all plotted records, `None` for an empty map
pub fn marker_bounds(markers: &[AnnotatedRecord]) -> Option<MapBounds> {
    let points: MultiPoint<f64> = markers
        .iter()
        .filter_map(|m| m.record.location)
        .map(|c| Point::new(c.lng, c.lat))
        .collect();

    points.bounding_rect().map(|rect| MapBounds {
        south_west: Coordinate::new(rect.min().y, rect.min().x),
        north_east: Coordinate::new(rect.max().y, rect.max().x),
    })
}
