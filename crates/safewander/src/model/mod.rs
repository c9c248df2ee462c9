//! Core data types for safewander.
//!
//! These are the view-model shapes every page works with, independent of how
//! the backend happened to encode them.

mod labels;
mod place;
mod review;
mod user;

pub use labels::{rating_label, safety_score_label, SafetyLevel, AI_SOURCES, SAFETY_TAGS};
pub use place::{CategoryFilter, Coordinates, Place, PlaceCategory, Provenance};
pub use review::{
    Review, ReviewDraft, ReviewSubmission, ReviewSummary, SubmitReceipt, MIN_REVIEW_LENGTH,
};
pub use user::{Achievement, Profile, ProfileReview, User, UserStats};
