//! Map markers and their GeoJSON projection.

use serde::Serialize;
use serde_json::{json, Value};

use crate::model::{Coordinates, Place, PlaceCategory, Provenance};

/// Where the map opens when there is nothing to center on (Tokyo).
pub const DEFAULT_CENTER: Coordinates = Coordinates::new(35.6762, 139.6503);

pub const DEFAULT_ZOOM: u8 = 12;

/// Marker color for a safety score.
#[must_use]
pub fn marker_color(score: f64) -> &'static str {
    if score >= 8.0 {
        "#10b981"
    } else if score >= 6.0 {
        "#f59e0b"
    } else {
        "#ef4444"
    }
}

/// One pin on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: i64,
    pub name: String,
    pub category: PlaceCategory,
    pub location: String,
    pub rating: f64,
    pub safety_score: f64,
    pub coordinates: Coordinates,
    pub color: &'static str,
    pub safety_label: &'static str,
    pub provenance: Provenance,
}

impl Marker {
    #[must_use]
    pub fn from_place(place: &Place) -> Self {
        Self {
            id: place.id,
            name: place.name.clone(),
            category: place.category,
            location: place.location.clone(),
            rating: place.rating,
            safety_score: place.safety_score,
            coordinates: place.coordinates,
            color: marker_color(place.safety_score),
            safety_label: place.safety_level().label(),
            provenance: place.provenance,
        }
    }

    fn to_feature(&self) -> Value {
        json!({
            "type": "Feature",
            "geometry": {
                "type": "Point",
                "coordinates": [self.coordinates.lng, self.coordinates.lat],
            },
            "properties": {
                "id": self.id,
                "name": self.name,
                "category": self.category,
                "location": self.location,
                "rating": self.rating,
                "safetyScore": self.safety_score,
                "color": self.color,
                "safetyLabel": self.safety_label,
                "provenance": self.provenance,
            },
        })
    }
}

/// Mean position of `places`, or [`DEFAULT_CENTER`] for none.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn center_of(places: &[Place]) -> Coordinates {
    if places.is_empty() {
        return DEFAULT_CENTER;
    }
    let n = places.len() as f64;
    let lat = places.iter().map(|p| p.coordinates.lat).sum::<f64>() / n;
    let lng = places.iter().map(|p| p.coordinates.lng).sum::<f64>() / n;
    Coordinates::new(lat, lng)
}

/// A GeoJSON `FeatureCollection` of `places`.
///
/// GeoJSON orders positions as `[lng, lat]`. The collection also carries
/// `center` and `zoom` members for the initial view.
#[must_use]
pub fn to_geojson(places: &[Place]) -> Value {
    let features: Vec<Value> = places
        .iter()
        .map(|p| Marker::from_place(p).to_feature())
        .collect();
    let center = center_of(places);
    json!({
        "type": "FeatureCollection",
        "features": features,
        "center": [center.lng, center.lat],
        "zoom": DEFAULT_ZOOM,
    })
}
