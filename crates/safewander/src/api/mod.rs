//! Remote services: the review backend and the safety-review advisor.
//!
//! Both are reached through traits so the reconciliation layer can be
//! driven by in-memory fakes in tests. [`HttpBackend`] and
//! [`HttpSafetyAdvisor`] are the reqwest implementations.

mod http;
pub mod retry;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::error::Result;
use crate::model::{ReviewSubmission, SubmitReceipt};
use crate::reshape::ReviewRecord;

pub(crate) use http::safety_query;
pub use http::{HttpBackend, HttpSafetyAdvisor};
pub use retry::{retry, BackoffPolicy, RetryPolicy};

/// The review backend.
#[async_trait]
pub trait ReviewBackend: Send + Sync {
    /// Fetch every review record the backend knows.
    ///
    /// `Ok(None)` means the backend answered without a review listing
    /// (an error object, say). That is not the same as an empty listing.
    async fn list_reviews(&self) -> Result<Option<Vec<ReviewRecord>>>;

    /// Fetch one review record by id.
    ///
    /// Implementations return [`crate::Error::NotFound`] when the backend
    /// reports the id as absent.
    async fn get_review(&self, id: i64) -> Result<ReviewRecord>;

    /// Send a new review.
    async fn submit_review(&self, submission: &ReviewSubmission) -> Result<SubmitReceipt>;
}

/// The service that mines the web for safety reports about a place.
#[async_trait]
pub trait SafetyAdvisor: Send + Sync {
    async fn safety_reviews(&self, place_name: &str, location: &str) -> Result<Vec<String>>;
}

/// Ask `advisor` for suggestions, treating any failure as "no suggestions".
pub async fn suggest_safety_reviews(
    advisor: &dyn SafetyAdvisor,
    place_name: &str,
    location: &str,
) -> Vec<String> {
    match advisor.safety_reviews(place_name, location).await {
        Ok(reviews) => {
            debug!("Got {} safety suggestions for {}", reviews.len(), place_name);
            reviews
        }
        Err(e) => {
            error!("Error fetching safety reviews for {}: {}", place_name, e);
            Vec::new()
        }
    }
}
