//! Score labels, safety bands and the fixed vocabularies.

use serde::Serialize;

/// Tags a reviewer can attach to a place.
pub const SAFETY_TAGS: [&str; 17] = [
    "Well-lit",
    "CCTV",
    "24/7 Security",
    "Female-only areas",
    "Staff speaks English",
    "Tourist area",
    "Local favorite",
    "Accessible",
    "Solo-friendly",
    "WiFi Available",
    "Good for work",
    "Quiet",
    "Busy/Crowded",
    "Budget-friendly",
    "Luxury",
    "Pet-friendly",
    "Family-friendly",
];

/// Sources the safety-review service mines.
pub const AI_SOURCES: [&str; 6] = [
    "reddit",
    "twitter",
    "travel_blogs",
    "news",
    "government_advisories",
    "embassy_reports",
];

/// Word for a 1 to 5 star rating.
#[must_use]
pub fn rating_label(rating: u8) -> Option<&'static str> {
    match rating {
        1 => Some("Poor"),
        2 => Some("Fair"),
        3 => Some("Good"),
        4 => Some("Very Good"),
        5 => Some("Excellent"),
        _ => None,
    }
}

/// Word for a 1 to 10 safety score.
#[must_use]
pub fn safety_score_label(score: u8) -> Option<&'static str> {
    match score {
        1 | 2 => Some("Very Unsafe"),
        3 | 4 => Some("Unsafe"),
        5 | 6 => Some("Neutral"),
        7 | 8 => Some("Safe"),
        9 | 10 => Some("Very Safe"),
        _ => None,
    }
}

/// Coarse safety band used for badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyLevel {
    /// 9 and above.
    VerySafe,
    /// 7 up to 9.
    Safe,
    /// 5 up to 7.
    Moderate,
    /// Below 5.
    UseCaution,
}

impl SafetyLevel {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 9.0 {
            Self::VerySafe
        } else if score >= 7.0 {
            Self::Safe
        } else if score >= 5.0 {
            Self::Moderate
        } else {
            Self::UseCaution
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::VerySafe => "Very Safe",
            Self::Safe => "Safe",
            Self::Moderate => "Moderate",
            Self::UseCaution => "Use Caution",
        }
    }
}

impl std::fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
