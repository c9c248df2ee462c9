//! Reshaping of backend review records into view models.
//!
//! The backend's records are loosely typed: numbers sometimes arrive as
//! strings, tags arrive as a JSON-encoded string, field names drift between
//! camelCase and snake_case. [`ReviewRecord`] accepts all of that, and the
//! functions here turn it into [`Place`] and [`Review`] values without ever
//! failing a whole batch because of one bad record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::model::{Coordinates, Place, PlaceCategory, Provenance, Review};

/// Image shown for places that have none.
pub const DEFAULT_IMAGE: &str = "https://images.pexels.com/photos/161401/fushimi-inari-taisha-shrine-kyoto-japan-temple-161401.jpeg?auto=compress&cs=tinysrgb&w=400";

/// Anchor for places without coordinates; each record is offset from it.
const SYNTHETIC_ORIGIN: Coordinates = Coordinates::new(35.6895, 139.6917);

/// Offset, in degrees, between consecutive synthesized positions.
const SYNTHETIC_STEP: f64 = 0.001;

/// Display value when a record carries no usable timestamp.
pub const UNKNOWN_DATE: &str = "unknown";

/// Accepted spellings of the same field, preferred spelling first.
const FIELD_SPELLINGS: &[&[&str]] = &[
    &["placeName", "place_name"],
    &["safetyScore", "safety_score"],
    &["image_url", "imageUrl"],
    &["created_at", "createdAt"],
    &["totalReviews", "total_reviews"],
    &["visitTime", "visit_time"],
    &["wouldRecommend", "would_recommend"],
    &["placeId", "place_id"],
    &["lat", "latitude"],
    &["lng", "lon", "longitude"],
];

/// One review record as the backend sends it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewRecord {
    #[serde(deserialize_with = "lenient_i64", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(alias = "place_name", skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
    /// Some backends call the place `name` instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient_f64", skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(
        alias = "safety_score",
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub safety_score: Option<f64>,
    #[serde(
        rename = "image_url",
        alias = "imageUrl",
        skip_serializing_if = "Option::is_none"
    )]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// JSON array, JSON-encoded string, or comma-separated string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Value>,
    #[serde(
        rename = "created_at",
        alias = "createdAt",
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    #[serde(
        alias = "total_reviews",
        deserialize_with = "lenient_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_reviews: Option<u32>,
    #[serde(deserialize_with = "lenient_u32", skip_serializing_if = "Option::is_none")]
    pub helpful: Option<u32>,
    #[serde(alias = "visit_time", skip_serializing_if = "Option::is_none")]
    pub visit_time: Option<String>,
    #[serde(
        alias = "would_recommend",
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub would_recommend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Value>,
    #[serde(
        alias = "place_id",
        deserialize_with = "lenient_i64",
        skip_serializing_if = "Option::is_none"
    )]
    pub place_id: Option<i64>,
    #[serde(
        alias = "latitude",
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub lat: Option<f64>,
    #[serde(
        alias = "lon",
        alias = "longitude",
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub lng: Option<f64>,
    /// `[lat, lng]` or `{"lat": .., "lng": ..}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Value>,
}

impl ReviewRecord {
    /// Decode one raw record.
    ///
    /// A record that spells one field several ways keeps a single spelling:
    /// the first non-null one in preference order. Serde would otherwise
    /// reject the record as having a duplicate field.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a record.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        let value = match value {
            Value::Object(mut map) => {
                for spellings in FIELD_SPELLINGS {
                    let present: Vec<&str> = spellings
                        .iter()
                        .copied()
                        .filter(|key| map.contains_key(*key))
                        .collect();
                    if present.len() < 2 {
                        continue;
                    }
                    let keep = present
                        .iter()
                        .copied()
                        .find(|key| !map[*key].is_null())
                        .unwrap_or(present[0]);
                    for key in present.into_iter().filter(|key| *key != keep) {
                        map.remove(key);
                    }
                }
                Value::Object(map)
            }
            other => other,
        };
        serde_json::from_value(value)
    }

    /// The place name, whichever field carried it.
    #[must_use]
    pub fn place_name(&self) -> Option<&str> {
        self.place_name
            .as_deref()
            .or(self.name.as_deref())
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }

    /// Creation time, if present and parseable.
    #[must_use]
    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .as_deref()
            .or(self.date.as_deref())
            .and_then(parse_timestamp)
    }

    /// Check whether this record reviews the place called `name`.
    #[must_use]
    pub fn is_about(&self, name: &str) -> bool {
        self.place_name()
            .is_some_and(|n| n.eq_ignore_ascii_case(name.trim()))
    }
}

/// Decode a batch of raw JSON records, skipping the ones that don't decode.
#[must_use]
pub fn records_from_values(values: Vec<Value>) -> Vec<ReviewRecord> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match ReviewRecord::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping undecodable review record #{}: {}", index, e);
                None
            }
        })
        .collect()
}

/// Turn one record into a place.
///
/// `index` is the record's position in its batch; it only matters for
/// records without coordinates. Returns `None` for records without an id
/// or a place name.
#[must_use]
pub fn place_from_record(
    record: &ReviewRecord,
    index: usize,
    provenance: Provenance,
) -> Option<Place> {
    let Some(id) = record.id else {
        warn!("Skipping review record without an id");
        return None;
    };
    let Some(name) = record.place_name() else {
        warn!("Skipping review record {} without a place name", id);
        return None;
    };

    let category_label = record
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or("Other")
        .to_string();

    let image = record
        .image_url
        .as_deref()
        .or(record.image.as_deref())
        .map(str::trim)
        .filter(|i| !i.is_empty())
        .unwrap_or(DEFAULT_IMAGE)
        .to_string();

    Some(Place {
        id,
        name: name.to_string(),
        category: PlaceCategory::parse(&category_label),
        category_label,
        location: record.location.clone().unwrap_or_default(),
        rating: record.rating.unwrap_or(0.0),
        safety_score: record.safety_score.unwrap_or(0.0),
        image,
        tags: record.tags.as_ref().map(parse_string_list).unwrap_or_default(),
        last_updated: display_date(record.created()),
        coordinates: record_coordinates(record).unwrap_or_else(|| synthetic_coordinates(index)),
        description: record.description.clone(),
        hours: record.hours.clone(),
        total_reviews: record.total_reviews,
        author: record.author.clone(),
        review: record.review.clone(),
        provenance,
    })
}

/// Turn a batch of records into places, dropping unusable ones.
#[must_use]
pub fn places_from_records(records: &[ReviewRecord], provenance: Provenance) -> Vec<Place> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| place_from_record(record, index, provenance))
        .collect()
}

/// Turn one record into a review for a detail page.
#[must_use]
pub fn review_from_record(record: &ReviewRecord) -> Option<Review> {
    let id = record.id?;
    Some(Review {
        id,
        place_id: record.place_id,
        author: record
            .author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or("Anonymous")
            .to_string(),
        rating: record.rating.unwrap_or(0.0),
        safety_score: record.safety_score.unwrap_or(0.0),
        review: record.review.clone().unwrap_or_default(),
        tags: record.tags.as_ref().map(parse_string_list).unwrap_or_default(),
        date: display_date(record.created()),
        helpful: record.helpful.unwrap_or(0),
        visit_time: record.visit_time.clone(),
        would_recommend: record.would_recommend.unwrap_or(false),
        images: record.images.as_ref().map(parse_string_list).unwrap_or_default(),
    })
}

/// Interpret a tag-like field.
///
/// Accepts a JSON array of strings, a string holding such an array, or a
/// comma-separated string. Anything else yields an empty list.
#[must_use]
pub fn parse_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(raw) => {
            let trimmed = raw.trim();
            if trimmed.starts_with('[') {
                match serde_json::from_str::<Value>(trimmed) {
                    Ok(inner @ Value::Array(_)) => parse_string_list(&inner),
                    _ => {
                        warn!("Ignoring malformed tag list: {}", trimmed);
                        Vec::new()
                    }
                }
            } else {
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            }
        }
        other => {
            warn!("Ignoring tag list of unexpected shape: {}", other);
            Vec::new()
        }
    }
}

/// Parse the timestamp formats the backend has been seen to emit.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn display_date(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp.map_or_else(
        || UNKNOWN_DATE.to_string(),
        |t| t.format("%Y-%m-%d").to_string(),
    )
}

fn record_coordinates(record: &ReviewRecord) -> Option<Coordinates> {
    if let (Some(lat), Some(lng)) = (record.lat, record.lng) {
        return Some(Coordinates::new(lat, lng));
    }
    match record.coordinates.as_ref()? {
        Value::Array(pair) if pair.len() == 2 => {
            Some(Coordinates::new(number(&pair[0])?, number(&pair[1])?))
        }
        Value::Object(map) => {
            let lat = map.get("lat").or_else(|| map.get("latitude"))?;
            let lng = map
                .get("lng")
                .or_else(|| map.get("lon"))
                .or_else(|| map.get("longitude"))?;
            Some(Coordinates::new(number(lat)?, number(lng)?))
        }
        _ => None,
    }
}

/// Position for the `index`-th record of a batch that carries none.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn synthetic_coordinates(index: usize) -> Coordinates {
    let offset = index as f64 * SYNTHETIC_STEP;
    Coordinates::new(SYNTHETIC_ORIGIN.lat + offset, SYNTHETIC_ORIGIN.lng + offset)
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number).filter(|n| n.is_finite()))
}

#[allow(clippy::cast_possible_truncation)]
fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(lenient_i64(deserializer)?.and_then(|n| u32::try_from(n).ok()))
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => n.as_i64().map(|n| n != 0),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Some(true),
            "false" | "no" | "0" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
