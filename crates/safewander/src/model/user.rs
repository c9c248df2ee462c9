//! Traveler profiles.

use serde::{Deserialize, Serialize};

/// A registered traveler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub join_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub stats: UserStats,
}

/// Contribution counters shown on a profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub reviews_count: u32,
    pub places_visited: u32,
    pub helpful_votes: u32,
    pub safety_contributions: u32,
}

/// A badge earned through contributions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub title: &'static str,
    pub description: &'static str,
}

/// A line of a profile's review history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileReview {
    pub id: i64,
    pub place: String,
    pub location: String,
    pub rating: f64,
    pub safety_score: f64,
    pub date: String,
    pub helpful: u32,
}

/// Everything a profile page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user: User,
    pub achievements: Vec<Achievement>,
    pub recent_reviews: Vec<ProfileReview>,
}
