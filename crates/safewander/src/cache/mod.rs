//! Local cache for safewander.
//!
//! A `SQLite` database that keeps the last successful review listing, so
//! pages still have real data while the backend is down, and an outbox of
//! submissions that could not be delivered.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::ReviewSubmission;
use crate::reshape::ReviewRecord;

const REFRESHED_KEY: &str = "reviews_refreshed_at";

/// The on-disk cache.
#[derive(Debug)]
pub struct Cache {
    path: PathBuf,
    conn: Connection,
}

/// A submission sitting in the outbox.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSubmission {
    pub id: i64,
    pub submission: ReviewSubmission,
    pub created_at: DateTime<Utc>,
    /// Failed delivery attempts made after it was queued.
    pub attempts: u32,
    /// How many of those the backend refused outright.
    pub rejections: u32,
    pub last_error: Option<String>,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

/// Cache statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub cached_reviews: i64,
    pub pending_submissions: i64,
    pub last_refreshed: Option<DateTime<Utc>>,
    pub db_size_bytes: u64,
}

impl Cache {
    /// Open or create the cache at `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening cache at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        debug!("Cache ready at {}", path.display());
        Ok(Self { path, conn })
    }

    /// An in-memory cache, gone when dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let path = PathBuf::from(":memory:");
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;
        migrations::initialize_schema(&conn)?;
        Ok(Self { path, conn })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // === Review listing ===

    /// Replace the cached listing with `records` and stamp the refresh time.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn replace_reviews(&self, records: &[ReviewRecord]) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM reviews", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO reviews (position, review_id, payload, fetched_at) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, record) in records.iter().enumerate() {
                let payload = serde_json::to_string(record)?;
                let position = i64::try_from(position).unwrap_or(i64::MAX);
                stmt.execute(params![position, record.id, payload, now])?;
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            (REFRESHED_KEY, &now),
        )?;
        tx.commit()?;

        debug!("Cached {} review records", records.len());
        Ok(())
    }

    /// The cached listing, in the order it was fetched.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn cached_reviews(&self) -> Result<Vec<ReviewRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT position, payload FROM reviews ORDER BY position ASC")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows
            .into_iter()
            .filter_map(|(position, payload)| decode_record(position, &payload))
            .collect())
    }

    /// The cached record with backend id `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn cached_review(&self, id: i64) -> Result<Option<ReviewRecord>> {
        let row: Option<(i64, String)> = self
            .conn
            .query_row(
                "SELECT position, payload FROM reviews WHERE review_id = ?1 ORDER BY position LIMIT 1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        Ok(row.and_then(|(position, payload)| decode_record(position, &payload)))
    }

    /// When the listing was last replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn last_refreshed(&self) -> Result<Option<DateTime<Utc>>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                [REFRESHED_KEY],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.as_deref().and_then(parse_stamp))
    }

    /// Whether the listing is older than `max_age`, or was never fetched.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn is_stale(&self, max_age: Duration) -> Result<bool> {
        let Some(refreshed) = self.last_refreshed()? else {
            return Ok(true);
        };
        let age = Utc::now()
            .signed_duration_since(refreshed)
            .to_std()
            .unwrap_or(Duration::ZERO);
        Ok(age > max_age)
    }

    /// Drop the cached listing. The outbox is left alone.
    ///
    /// Returns the number of records removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear_reviews(&self) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM reviews", [])?;
        tx.execute("DELETE FROM metadata WHERE key = ?1", [REFRESHED_KEY])?;
        tx.commit()?;
        info!("Cleared {} cached reviews", removed);
        Ok(removed)
    }

    // === Outbox ===

    /// Queue a submission for later delivery.
    ///
    /// Returns the outbox id, or `None` if an identical submission is
    /// already queued.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn enqueue(&self, submission: &ReviewSubmission) -> Result<Option<i64>> {
        let payload = serde_json::to_string(submission)?;
        let hash = blake3::hash(payload.as_bytes()).to_hex().to_string();

        let inserted = self.conn.execute(
            r"
            INSERT OR IGNORE INTO outbox (payload, content_hash, created_at)
            VALUES (?1, ?2, ?3)
            ",
            params![payload, hash, Utc::now().to_rfc3339()],
        )?;
        if inserted == 0 {
            debug!("Submission with hash {} is already queued", &hash[..16]);
            return Ok(None);
        }

        let id = self.conn.last_insert_rowid();
        info!("Queued review of {} as outbox entry {}", submission.place_name, id);
        Ok(Some(id))
    }

    /// Up to `limit` queued submissions, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn pending(&self, limit: usize) -> Result<Vec<PendingSubmission>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, payload, created_at, attempts, rejections, last_error, last_attempt_at
            FROM outbox ORDER BY id ASC LIMIT ?1
            ",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map([limit], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, u32>(3)?,
                    row.get::<_, u32>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut pending = Vec::with_capacity(rows.len());
        for (id, payload, created_at, attempts, rejections, last_error, last_attempt_at) in rows {
            match serde_json::from_str(&payload) {
                Ok(submission) => pending.push(PendingSubmission {
                    id,
                    submission,
                    created_at: parse_stamp(&created_at).unwrap_or_else(Utc::now),
                    attempts,
                    rejections,
                    last_error,
                    last_attempt_at: last_attempt_at.as_deref().and_then(parse_stamp),
                }),
                Err(e) => warn!("Skipping unreadable outbox entry {}: {}", id, e),
            }
        }
        Ok(pending)
    }

    /// Note a delivery attempt that failed for a transient reason.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if `id` is not queued, or an error if the
    /// database operation fails.
    pub fn record_failure(&self, id: i64, message: &str) -> Result<()> {
        self.note_failure(id, message, false)
    }

    /// Note that the backend refused a queued submission.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Internal`] if `id` is not queued, or an error if the
    /// database operation fails.
    pub fn record_rejection(&self, id: i64, message: &str) -> Result<()> {
        self.note_failure(id, message, true)
    }

    fn note_failure(&self, id: i64, message: &str, rejected: bool) -> Result<()> {
        let affected = self.conn.execute(
            r"
            UPDATE outbox
            SET attempts = attempts + 1, rejections = rejections + ?4,
                last_error = ?2, last_attempt_at = ?3
            WHERE id = ?1
            ",
            params![id, message, Utc::now().to_rfc3339(), i64::from(rejected)],
        )?;
        if affected == 0 {
            return Err(Error::internal(format!("outbox entry {id} does not exist")));
        }
        Ok(())
    }

    /// Remove a delivered submission. Returns `false` if it was not queued.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn remove(&self, id: i64) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM outbox WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    /// Number of queued submissions.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn pending_count(&self) -> Result<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM outbox", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Gather cache statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<CacheStats> {
        let cached_reviews = self
            .conn
            .query_row("SELECT COUNT(*) FROM reviews", [], |row| row.get(0))?;

        let db_size_bytes = if self.path.as_os_str() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(CacheStats {
            cached_reviews,
            pending_submissions: self.pending_count()?,
            last_refreshed: self.last_refreshed()?,
            db_size_bytes,
        })
    }
}

fn decode_record(position: i64, payload: &str) -> Option<ReviewRecord> {
    match serde_json::from_str(payload) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!("Skipping unreadable cached review at position {}: {}", position, e);
            None
        }
    }
}

fn parse_stamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_cache() -> Cache {
        Cache::open_in_memory().expect("failed to create test cache")
    }

    fn record(id: i64, name: &str) -> ReviewRecord {
        serde_json::from_value(json!({
            "id": id,
            "placeName": name,
            "category": "Cafe",
            "rating": 4.5,
            "safetyScore": 8,
            "tags": "[\"WiFi\"]",
        }))
        .unwrap()
    }

    fn submission(place: &str) -> ReviewSubmission {
        ReviewSubmission {
            place_name: place.to_string(),
            category: "Cafe/Restaurant".to_string(),
            location: "Shibuya, Tokyo".to_string(),
            rating: 5,
            safety_score: 9,
            review: "Quiet, bright and full of other solo travelers working on laptops.".to_string(),
            tags: vec!["Well-lit".to_string()],
            visit_time: None,
            would_recommend: true,
            images: Vec::new(),
        }
    }

    #[test]
    fn test_open_in_memory() {
        let cache = create_test_cache();
        assert_eq!(cache.path(), Path::new(":memory:"));
        assert!(cache.cached_reviews().unwrap().is_empty());
    }

    #[test]
    fn test_replace_and_read_reviews() {
        let cache = create_test_cache();
        cache
            .replace_reviews(&[record(3, "Gamma"), record(1, "Alpha"), record(2, "Beta")])
            .unwrap();

        let cached = cache.cached_reviews().unwrap();
        let ids: Vec<Option<i64>> = cached.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![Some(3), Some(1), Some(2)]);
        assert_eq!(cached[0].place_name(), Some("Gamma"));
        assert_eq!(cached[0].safety_score, Some(8.0));
    }

    #[test]
    fn test_replace_overwrites_previous_listing() {
        let cache = create_test_cache();
        cache
            .replace_reviews(&[record(1, "Alpha"), record(2, "Beta")])
            .unwrap();
        cache.replace_reviews(&[record(9, "Omega")]).unwrap();

        let cached = cache.cached_reviews().unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].id, Some(9));
    }

    #[test]
    fn test_cached_review_by_id() {
        let cache = create_test_cache();
        cache
            .replace_reviews(&[record(1, "Alpha"), record(2, "Beta")])
            .unwrap();

        let found = cache.cached_review(2).unwrap().unwrap();
        assert_eq!(found.place_name(), Some("Beta"));
        assert!(cache.cached_review(42).unwrap().is_none());
    }

    #[test]
    fn test_records_without_id_are_kept() {
        let cache = create_test_cache();
        let mut anonymous = record(0, "Nameless");
        anonymous.id = None;
        cache.replace_reviews(&[anonymous]).unwrap();
        assert_eq!(cache.cached_reviews().unwrap().len(), 1);
    }

    #[test]
    fn test_refresh_stamp_and_staleness() {
        let cache = create_test_cache();
        assert!(cache.last_refreshed().unwrap().is_none());
        assert!(cache.is_stale(Duration::from_secs(3600)).unwrap());

        cache.replace_reviews(&[record(1, "Alpha")]).unwrap();
        let refreshed = cache.last_refreshed().unwrap().unwrap();
        assert!(Utc::now().signed_duration_since(refreshed).num_seconds() < 60);
        assert!(!cache.is_stale(Duration::from_secs(3600)).unwrap());
    }

    #[test]
    fn test_clear_reviews_keeps_outbox() {
        let cache = create_test_cache();
        cache
            .replace_reviews(&[record(1, "Alpha"), record(2, "Beta")])
            .unwrap();
        cache.enqueue(&submission("Alpha")).unwrap();

        assert_eq!(cache.clear_reviews().unwrap(), 2);
        assert!(cache.cached_reviews().unwrap().is_empty());
        assert!(cache.last_refreshed().unwrap().is_none());
        assert_eq!(cache.pending_count().unwrap(), 1);
    }

    #[test]
    fn test_enqueue_deduplicates() {
        let cache = create_test_cache();
        let first = cache.enqueue(&submission("Blue Bottle Coffee")).unwrap();
        let again = cache.enqueue(&submission("Blue Bottle Coffee")).unwrap();
        let other = cache.enqueue(&submission("Senso-ji Temple")).unwrap();

        assert!(first.is_some());
        assert!(again.is_none());
        assert!(other.is_some());
        assert_eq!(cache.pending_count().unwrap(), 2);
    }

    #[test]
    fn test_pending_oldest_first() {
        let cache = create_test_cache();
        for place in ["First", "Second", "Third"] {
            cache.enqueue(&submission(place)).unwrap();
        }

        let pending = cache.pending(2).unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].submission.place_name, "First");
        assert_eq!(pending[1].submission.place_name, "Second");
        assert_eq!(pending[0].attempts, 0);
        assert!(pending[0].last_error.is_none());
    }

    #[test]
    fn test_record_failure() {
        let cache = create_test_cache();
        let id = cache.enqueue(&submission("Alpha")).unwrap().unwrap();

        cache.record_failure(id, "status 503").unwrap();
        cache.record_failure(id, "timed out").unwrap();

        let entry = &cache.pending(10).unwrap()[0];
        assert_eq!(entry.attempts, 2);
        assert_eq!(entry.rejections, 0);
        assert_eq!(entry.last_error.as_deref(), Some("timed out"));
        assert!(entry.last_attempt_at.is_some());

        assert!(cache.record_failure(999, "x").is_err());
    }

    #[test]
    fn test_record_rejection() {
        let cache = create_test_cache();
        let id = cache.enqueue(&submission("Alpha")).unwrap().unwrap();

        cache.record_failure(id, "timed out").unwrap();
        cache.record_rejection(id, "status 400").unwrap();

        let entry = &cache.pending(10).unwrap()[0];
        assert_eq!(entry.attempts, 2);
        assert_eq!(entry.rejections, 1);
        assert_eq!(entry.last_error.as_deref(), Some("status 400"));

        assert!(cache.record_rejection(999, "x").is_err());
    }

    #[test]
    fn test_remove() {
        let cache = create_test_cache();
        let id = cache.enqueue(&submission("Alpha")).unwrap().unwrap();

        assert!(cache.remove(id).unwrap());
        assert!(!cache.remove(id).unwrap());
        assert_eq!(cache.pending_count().unwrap(), 0);

        // Removed entries may be queued again.
        assert!(cache.enqueue(&submission("Alpha")).unwrap().is_some());
    }

    #[test]
    fn test_stats() {
        let cache = create_test_cache();
        let empty = cache.stats().unwrap();
        assert_eq!(empty.cached_reviews, 0);
        assert_eq!(empty.pending_submissions, 0);
        assert!(empty.last_refreshed.is_none());
        assert_eq!(empty.db_size_bytes, 0);

        cache.replace_reviews(&[record(1, "Alpha")]).unwrap();
        cache.enqueue(&submission("Alpha")).unwrap();
        let stats = cache.stats().unwrap();
        assert_eq!(stats.cached_reviews, 1);
        assert_eq!(stats.pending_submissions, 1);
        assert!(stats.last_refreshed.is_some());
    }

    #[test]
    fn test_open_file_based() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.db");

        {
            let cache = Cache::open(&path).unwrap();
            cache.replace_reviews(&[record(1, "Alpha")]).unwrap();
            cache.enqueue(&submission("Alpha")).unwrap();
            assert!(cache.stats().unwrap().db_size_bytes > 0);
        }

        let reopened = Cache::open(&path).unwrap();
        assert_eq!(reopened.path(), path);
        assert_eq!(reopened.cached_reviews().unwrap().len(), 1);
        assert_eq!(reopened.pending_count().unwrap(), 1);
    }
}
