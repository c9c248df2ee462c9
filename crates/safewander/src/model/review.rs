//! Reviews, new-review drafts and their wire form.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Shortest review text the backend accepts, in characters.
pub const MIN_REVIEW_LENGTH: usize = 50;

/// A published review of a place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    /// Id of the reviewed place, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<i64>,
    pub author: String,
    /// General rating, 1 to 5.
    pub rating: f64,
    /// Safety score, 1 to 10.
    pub safety_score: f64,
    /// The narrative.
    pub review: String,
    pub tags: Vec<String>,
    /// Visit or publication date, `YYYY-MM-DD` when known.
    pub date: String,
    /// Helpful votes.
    pub helpful: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_time: Option<String>,
    pub would_recommend: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

/// Aggregates over a set of reviews.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub count: usize,
    pub average_rating: Option<f64>,
    pub average_safety: Option<f64>,
}

impl ReviewSummary {
    /// Count the reviews and average their scores, rounded to one decimal.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_reviews(reviews: &[Review]) -> Self {
        if reviews.is_empty() {
            return Self {
                count: 0,
                average_rating: None,
                average_safety: None,
            };
        }

        let count = reviews.len();
        let rating: f64 = reviews.iter().map(|r| r.rating).sum();
        let safety: f64 = reviews.iter().map(|r| r.safety_score).sum();

        Self {
            count,
            average_rating: Some(round1(rating / count as f64)),
            average_safety: Some(round1(safety / count as f64)),
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// A review being written, before any photo is uploaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewDraft {
    pub place_name: String,
    /// Category label; any form accepted by `PlaceCategory::parse`.
    pub category: String,
    pub location: String,
    /// 1 to 5.
    pub rating: u8,
    /// 1 to 10.
    pub safety_score: u8,
    pub review: String,
    pub tags: Vec<String>,
    pub visit_time: Option<String>,
    pub would_recommend: bool,
}

impl ReviewDraft {
    /// Check the draft the way the review form does.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] naming the first field that fails.
    pub fn validate(&self) -> Result<()> {
        if self.place_name.trim().is_empty() {
            return Err(Error::validation("placeName", "place name is required"));
        }
        if self.category.trim().is_empty() {
            return Err(Error::validation("category", "category is required"));
        }
        if self.location.trim().is_empty() {
            return Err(Error::validation("location", "location is required"));
        }
        if !(1..=5).contains(&self.rating) {
            return Err(Error::validation(
                "rating",
                format!("must be between 1 and 5, got {}", self.rating),
            ));
        }
        if !(1..=10).contains(&self.safety_score) {
            return Err(Error::validation(
                "safetyScore",
                format!("must be between 1 and 10, got {}", self.safety_score),
            ));
        }
        let length = self.review.trim().chars().count();
        if length < MIN_REVIEW_LENGTH {
            return Err(Error::validation(
                "review",
                format!("must be at least {MIN_REVIEW_LENGTH} characters, got {length}"),
            ));
        }
        Ok(())
    }

    /// Add `tag` if absent, remove it if present.
    pub fn toggle_tag(&mut self, tag: &str) {
        if let Some(pos) = self.tags.iter().position(|t| t == tag) {
            self.tags.remove(pos);
        } else {
            self.tags.push(tag.to_string());
        }
    }

    /// Build the request body, attaching already uploaded photo URLs.
    #[must_use]
    pub fn into_submission(self, images: Vec<String>) -> ReviewSubmission {
        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            let tag = tag.trim().to_string();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        ReviewSubmission {
            place_name: self.place_name.trim().to_string(),
            category: self.category.trim().to_string(),
            location: self.location.trim().to_string(),
            rating: self.rating,
            safety_score: self.safety_score,
            review: self.review.trim().to_string(),
            tags,
            visit_time: self.visit_time.filter(|v| !v.trim().is_empty()),
            would_recommend: self.would_recommend,
            images,
        }
    }
}

/// Body of `POST /submit-review`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSubmission {
    pub place_name: String,
    pub category: String,
    pub location: String,
    pub rating: u8,
    pub safety_score: u8,
    pub review: String,
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visit_time: Option<String>,
    #[serde(default)]
    pub would_recommend: bool,
    #[serde(default)]
    pub images: Vec<String>,
}

/// What the backend says after accepting a review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    /// Id assigned to the new review, if the backend reports it.
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}
