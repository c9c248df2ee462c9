//! Fetch-with-fallback reconciliation.
//!
//! [`SafeWander`] is the one place that decides what a page shows when the
//! backend misbehaves. Every read goes remote first, then to the local
//! cache, then to the embedded samples. The result carries its
//! [`Provenance`] so callers can tell the user what they are looking at.

use std::cmp::Reverse;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::{safety_query, suggest_safety_reviews, ReviewBackend, SafetyAdvisor};
use crate::cache::{Cache, CacheStats};
use crate::config::FallbackConfig;
use crate::error::{Error, Result};
use crate::fallback::{
    sample_place_details, sample_places, sample_recent_reviews, SAMPLE_DETAIL_ID,
};
use crate::model::{
    CategoryFilter, Place, Provenance, Review, ReviewDraft, ReviewSummary, SubmitReceipt,
};
use crate::reshape::{place_from_record, places_from_records, review_from_record, ReviewRecord};
use crate::upload::{upload_images, ImageFile, ImageStore};

/// A value and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sourced<T> {
    pub value: T,
    pub provenance: Provenance,
    /// The remote fetch failed, whatever the value ended up being.
    pub degraded: bool,
}

impl<T> Sourced<T> {
    fn new(value: T, provenance: Provenance, degraded: bool) -> Self {
        Self {
            value,
            provenance,
            degraded,
        }
    }

    /// Transform the value, keeping its origin.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced {
            value: f(self.value),
            provenance: self.provenance,
            degraded: self.degraded,
        }
    }
}

/// Everything a place page shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaceDetails {
    pub place: Place,
    pub reviews: Vec<Review>,
    pub summary: ReviewSummary,
}

impl PlaceDetails {
    fn new(place: Place, reviews: Vec<Review>) -> Self {
        let summary = ReviewSummary::from_reviews(&reviews);
        Self {
            place,
            reviews,
            summary,
        }
    }
}

/// What happened to a submitted review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// The backend accepted it.
    Submitted(SubmitReceipt),
    /// The backend was unreachable; the review waits in the outbox.
    /// `outbox_id` is `None` when the same review was already queued.
    Queued { outbox_id: Option<i64> },
}

/// Rejections after which a queued review is no longer resent.
pub const MAX_REJECTIONS: u32 = 5;

/// Result of an outbox flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    pub sent: usize,
    pub failed: usize,
    /// Entries skipped after [`MAX_REJECTIONS`] refusals. They stay queued.
    pub parked: usize,
    pub remaining: i64,
}

/// Backend reachability and local state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub backend_reachable: bool,
    pub backend_reviews: Option<usize>,
    pub backend_error: Option<String>,
    pub cache: Option<CacheStats>,
    pub cache_stale: Option<bool>,
}

/// The client facade over the backend, the safety advisor and the cache.
#[derive(Debug)]
pub struct SafeWander<B, A> {
    backend: B,
    advisor: A,
    cache: Option<Cache>,
    fallback: FallbackConfig,
    max_age: Duration,
}

impl<B: ReviewBackend, A: SafetyAdvisor> SafeWander<B, A> {
    /// Assemble a client. Without a cache, failures degrade straight to the
    /// samples and submissions cannot be queued.
    pub fn new(backend: B, advisor: A, cache: Option<Cache>, fallback: FallbackConfig) -> Self {
        Self {
            backend,
            advisor,
            cache,
            fallback,
            max_age: Duration::from_secs(24 * 60 * 60),
        }
    }

    /// Age after which cached data is reported as stale.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn cache(&self) -> Option<&Cache> {
        self.cache.as_ref()
    }

    // === Reads ===

    /// Places for the explore page, filtered by `query` and `filter`.
    ///
    /// The samples come first when enabled, followed by remote or cached
    /// places.
    pub async fn explore(&self, query: &str, filter: CategoryFilter) -> Sourced<Vec<Place>> {
        let fetched = self.fetch_records().await;
        let mut places = if self.fallback.include_samples {
            sample_places()
        } else {
            Vec::new()
        };
        let provenance = fetched.provenance;
        fetched.map(|records| {
            places.extend(places_from_records(&records, provenance));
            places.retain(|p| p.matches_query(query) && filter.matches(p.category));
            places
        })
    }

    /// Places for the map page.
    pub async fn map_places(&self, filter: CategoryFilter) -> Sourced<Vec<Place>> {
        self.explore("", filter).await
    }

    /// One place with all its reviews.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the backend says the id does not
    /// exist, or when nothing local knows it either.
    pub async fn place_details(&self, id: i64) -> Result<Sourced<PlaceDetails>> {
        match self.backend.get_review(id).await {
            Ok(record) => {
                let place = place_from_record(&record, 0, Provenance::Remote).ok_or_else(|| {
                    Error::decode("review record", format!("review {id} has no place name"))
                })?;
                let reviews = match self.backend.list_reviews().await {
                    Ok(Some(records)) => reviews_about(&records, &place.name),
                    Ok(None) => review_from_record(&record).into_iter().collect(),
                    Err(e) => {
                        warn!("Error fetching reviews for {}: {}", place.name, e);
                        review_from_record(&record).into_iter().collect()
                    }
                };
                return Ok(Sourced::new(
                    PlaceDetails::new(place, reviews),
                    Provenance::Remote,
                    false,
                ));
            }
            Err(e) if e.is_not_found() => return Err(e),
            Err(e) => warn!("Error fetching place {}: {}", id, e),
        }

        if let Some(details) = self.cached_details(id) {
            return Ok(Sourced::new(details, Provenance::Cached, true));
        }

        if self.fallback.include_samples {
            if id == SAMPLE_DETAIL_ID {
                let (place, reviews) = sample_place_details();
                return Ok(Sourced::new(
                    PlaceDetails::new(place, reviews),
                    Provenance::Fallback,
                    true,
                ));
            }
            if let Some(place) = sample_places().into_iter().find(|p| p.id == id) {
                return Ok(Sourced::new(
                    PlaceDetails::new(place, Vec::new()),
                    Provenance::Fallback,
                    true,
                ));
            }
        }

        Err(Error::NotFound { id })
    }

    /// The newest reviews, one place entry each, newest first.
    pub async fn latest_reviews(&self, limit: usize) -> Sourced<Vec<Place>> {
        let fetched = self.fetch_records().await;
        if fetched.provenance == Provenance::Fallback {
            let mut samples = if self.fallback.include_samples {
                sample_recent_reviews()
            } else {
                Vec::new()
            };
            samples.truncate(limit);
            return Sourced::new(samples, Provenance::Fallback, fetched.degraded);
        }

        let provenance = fetched.provenance;
        fetched.map(|records| {
            // Built in listing order so synthetic coordinates match explore.
            let mut dated: Vec<_> = records
                .iter()
                .enumerate()
                .filter_map(|(index, record)| {
                    place_from_record(record, index, provenance).map(|p| (record.created(), p))
                })
                .collect();
            // Undated records sort last.
            dated.sort_by_key(|(created, _)| Reverse(*created));
            dated.into_iter().take(limit).map(|(_, place)| place).collect()
        })
    }

    /// AI-mined safety reports for a place; empty when the service fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when both inputs are blank.
    pub async fn safety_suggestions(&self, place_name: &str, location: &str) -> Result<Vec<String>> {
        safety_query(place_name, location)?;
        Ok(suggest_safety_reviews(&self.advisor, place_name.trim(), location.trim()).await)
    }

    // === Writes ===

    /// Validate, upload photos, and send a review.
    ///
    /// When the backend is unreachable and a cache is available, the review
    /// is queued instead.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an invalid draft, or the backend's
    /// error when it rejects the review or nothing could queue it.
    pub async fn submit(
        &self,
        draft: ReviewDraft,
        images: Vec<ImageFile>,
        store: Option<&dyn ImageStore>,
    ) -> Result<SubmitOutcome> {
        draft.validate()?;

        let image_urls = match store {
            Some(store) => upload_images(store, images).await,
            None => {
                if !images.is_empty() {
                    warn!(
                        "Skipping {} images: object storage is not configured",
                        images.len()
                    );
                }
                Vec::new()
            }
        };
        let submission = draft.into_submission(image_urls);

        match self.backend.submit_review(&submission).await {
            Ok(receipt) => {
                info!("Submitted review of {}", submission.place_name);
                Ok(SubmitOutcome::Submitted(receipt))
            }
            Err(e) if e.is_retryable() => {
                let Some(cache) = &self.cache else {
                    return Err(e);
                };
                warn!(
                    "Backend unavailable ({}); queueing review of {}",
                    e, submission.place_name
                );
                let outbox_id = cache.enqueue(&submission)?;
                Ok(SubmitOutcome::Queued { outbox_id })
            }
            Err(e) => Err(e),
        }
    }

    /// Resend queued reviews, oldest first.
    ///
    /// Stops at the first transient failure, since the backend is still
    /// down. Rejected reviews stay queued with their error recorded; after
    /// [`MAX_REJECTIONS`] refusals they are skipped rather than resent.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be read or updated.
    pub async fn flush_outbox(&self) -> Result<FlushReport> {
        let Some(cache) = &self.cache else {
            return Ok(FlushReport::default());
        };

        let mut report = FlushReport::default();
        for entry in cache.pending(usize::MAX)? {
            if entry.rejections >= MAX_REJECTIONS {
                report.parked += 1;
                continue;
            }
            match self.backend.submit_review(&entry.submission).await {
                Ok(_) => {
                    cache.remove(entry.id)?;
                    report.sent += 1;
                    debug!("Delivered outbox entry {}", entry.id);
                }
                Err(e) if e.is_retryable() => {
                    cache.record_failure(entry.id, &e.to_string())?;
                    report.failed += 1;
                    warn!("Backend still unavailable, stopping outbox flush: {}", e);
                    break;
                }
                Err(e) => {
                    cache.record_rejection(entry.id, &e.to_string())?;
                    report.failed += 1;
                    warn!("Backend rejected outbox entry {}: {}", entry.id, e);
                }
            }
        }

        report.remaining = cache.pending_count()?;
        if report.parked > 0 {
            warn!(
                "Skipped {} queued reviews the backend rejected {} times",
                report.parked, MAX_REJECTIONS
            );
        }
        if report.sent > 0 {
            info!("Delivered {} queued reviews", report.sent);
        }
        Ok(report)
    }

    /// Check the backend and summarize the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be read.
    pub async fn status(&self) -> Result<ServiceStatus> {
        let (backend_reachable, backend_reviews, backend_error) =
            match self.backend.list_reviews().await {
                Ok(records) => (true, Some(records.as_ref().map_or(0, Vec::len)), None),
                Err(e) => (false, None, Some(e.to_string())),
            };

        let (cache, cache_stale) = match &self.cache {
            Some(cache) => (Some(cache.stats()?), Some(cache.is_stale(self.max_age)?)),
            None => (None, None),
        };

        Ok(ServiceStatus {
            backend_reachable,
            backend_reviews,
            backend_error,
            cache,
            cache_stale,
        })
    }

    // === Degradation chain ===

    async fn fetch_records(&self) -> Sourced<Vec<ReviewRecord>> {
        match self.backend.list_reviews().await {
            Ok(Some(records)) => {
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.replace_reviews(&records) {
                        warn!("Could not refresh the review cache: {}", e);
                    }
                }
                Sourced::new(records, Provenance::Remote, false)
            }
            // Nothing to show, but nothing to overwrite the cache with either.
            Ok(None) => Sourced::new(Vec::new(), Provenance::Remote, false),
            Err(e) => {
                warn!("Error fetching reviews: {}", e);
                match self.cached_records() {
                    Some(records) => Sourced::new(records, Provenance::Cached, true),
                    None => Sourced::new(Vec::new(), Provenance::Fallback, true),
                }
            }
        }
    }

    fn usable_cache(&self) -> Option<&Cache> {
        if self.fallback.use_cache {
            self.cache.as_ref()
        } else {
            None
        }
    }

    fn cached_records(&self) -> Option<Vec<ReviewRecord>> {
        let cache = self.usable_cache()?;
        match cache.cached_reviews() {
            Ok(records) if !records.is_empty() => {
                self.warn_staleness(cache);
                Some(records)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Could not read the review cache: {}", e);
                None
            }
        }
    }

    fn cached_details(&self, id: i64) -> Option<PlaceDetails> {
        let cache = self.usable_cache()?;
        let record = match cache.cached_review(id) {
            Ok(record) => record?,
            Err(e) => {
                warn!("Could not read the review cache: {}", e);
                return None;
            }
        };
        let place = place_from_record(&record, 0, Provenance::Cached)?;
        self.warn_staleness(cache);

        let reviews = cache
            .cached_reviews()
            .map(|records| reviews_about(&records, &place.name))
            .unwrap_or_default();
        Some(PlaceDetails::new(place, reviews))
    }

    fn warn_staleness(&self, cache: &Cache) {
        match cache.last_refreshed() {
            Ok(Some(refreshed)) => {
                let age = Utc::now().signed_duration_since(refreshed);
                if cache.is_stale(self.max_age).unwrap_or(true) {
                    warn!(
                        "Using stale cached reviews from {} ({} hours old)",
                        refreshed.format("%Y-%m-%d %H:%M"),
                        age.num_hours()
                    );
                } else {
                    warn!(
                        "Using cached reviews from {} ({} minutes old)",
                        refreshed.format("%Y-%m-%d %H:%M"),
                        age.num_minutes()
                    );
                }
            }
            Ok(None) => warn!("Using cached reviews of unknown age"),
            Err(e) => warn!("Using cached reviews; refresh time unreadable: {}", e),
        }
    }
}

/// Reviews among `records` about the place called `name`.
fn reviews_about(records: &[ReviewRecord], name: &str) -> Vec<Review> {
    records
        .iter()
        .filter(|r| r.is_about(name))
        .filter_map(review_from_record)
        .collect()
}
