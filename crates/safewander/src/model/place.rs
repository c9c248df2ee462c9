//! Places and their categories.

use serde::{Deserialize, Serialize};

/// The kind of venue a place is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceCategory {
    /// Cafes and restaurants.
    Cafe,
    /// Hotels, hostels and other stays.
    Hotel,
    /// Sights and tourist attractions.
    Attraction,
    /// Stations, lines and other transport.
    Transport,
    /// Shops and markets.
    Shopping,
    /// Bars and night venues.
    Nightlife,
    /// Clinics, pharmacies and hospitals.
    Healthcare,
    /// Anything else.
    Other,
}

impl PlaceCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 8] = [
        Self::Cafe,
        Self::Hotel,
        Self::Attraction,
        Self::Transport,
        Self::Shopping,
        Self::Nightlife,
        Self::Healthcare,
        Self::Other,
    ];

    /// Stable identifier, as used in filters and on the wire.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Cafe => "cafe",
            Self::Hotel => "hotel",
            Self::Attraction => "attraction",
            Self::Transport => "transport",
            Self::Shopping => "shopping",
            Self::Nightlife => "nightlife",
            Self::Healthcare => "healthcare",
            Self::Other => "other",
        }
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Cafe => "Cafes & Restaurants",
            Self::Hotel => "Hotels & Accommodation",
            Self::Attraction => "Tourist Attractions",
            Self::Transport => "Transportation",
            Self::Shopping => "Shopping",
            Self::Nightlife => "Nightlife",
            Self::Healthcare => "Healthcare",
            Self::Other => "Other",
        }
    }

    /// Label used by the review form.
    #[must_use]
    pub const fn form_label(self) -> &'static str {
        match self {
            Self::Cafe => "Cafe/Restaurant",
            Self::Hotel => "Hotel/Accommodation",
            Self::Attraction => "Tourist Attraction",
            Self::Transport => "Transportation",
            Self::Shopping => "Shopping",
            Self::Nightlife => "Nightlife",
            Self::Healthcare => "Healthcare",
            Self::Other => "Other",
        }
    }

    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Cafe => "☕",
            Self::Hotel => "🏨",
            Self::Attraction => "📸",
            Self::Transport => "🚇",
            Self::Shopping => "🛍️",
            Self::Nightlife => "🌙",
            Self::Healthcare => "🏥",
            Self::Other => "📍",
        }
    }

    /// Parse any of the labels the backend and the forms have used.
    ///
    /// Unknown labels map to [`PlaceCategory::Other`].
    #[must_use]
    pub fn parse(label: &str) -> Self {
        let normalized = label.trim().to_lowercase();
        match normalized.as_str() {
            "cafe" | "cafes" | "restaurant" | "cafe/restaurant" | "cafes & restaurants" => {
                Self::Cafe
            }
            "hotel" | "hotels" | "hostel" | "accommodation" | "hotel/accommodation"
            | "hotels & accommodation" | "hotels & stays" => Self::Hotel,
            "attraction" | "attractions" | "tourist attraction" | "tourist attractions" => {
                Self::Attraction
            }
            "transport" | "transportation" => Self::Transport,
            "shopping" | "shop" => Self::Shopping,
            "nightlife" => Self::Nightlife,
            "healthcare" | "health" => Self::Healthcare,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for PlaceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Category restriction for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// No restriction.
    #[default]
    All,
    /// Only places of this category.
    Only(PlaceCategory),
}

impl CategoryFilter {
    /// Parse a filter; `all` or an empty string means no restriction.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Only(PlaceCategory::parse(trimmed))
        }
    }

    /// Check whether a category passes this filter.
    #[must_use]
    pub fn matches(self, category: PlaceCategory) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == category,
        }
    }
}

/// Latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Where a piece of data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Fetched from the backend just now.
    Remote,
    /// Served from the local cache of an earlier fetch.
    Cached,
    /// Embedded sample data.
    Fallback,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Cached => write!(f, "cached"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// A venue as shown in listings, on the map and on detail pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    /// Identifier; for remote places this is the review id.
    pub id: i64,
    pub name: String,
    /// Normalized category.
    pub category: PlaceCategory,
    /// Category text as the source wrote it.
    pub category_label: String,
    pub location: String,
    /// General rating, 1 to 5.
    pub rating: f64,
    /// Safety score, 1 to 10.
    pub safety_score: f64,
    /// Image URL.
    pub image: String,
    pub tags: Vec<String>,
    /// Display string for the last update.
    pub last_updated: String,
    pub coordinates: Coordinates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_reviews: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Review text, when the place was built from a single review.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    pub provenance: Provenance,
}

impl Place {
    /// Check whether `query` occurs in the name or the location, ignoring case.
    ///
    /// An empty query matches every place.
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        needle.is_empty()
            || self.name.to_lowercase().contains(&needle)
            || self.location.to_lowercase().contains(&needle)
    }

    /// Safety band for this place's score.
    #[must_use]
    pub fn safety_level(&self) -> super::SafetyLevel {
        super::SafetyLevel::from_score(self.safety_score)
    }
}
