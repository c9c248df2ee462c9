//! `SQLite` schema of the local cache.
//!
//! These statements create the version 1 layout. Later changes are applied
//! by [`super::migrations`].

/// Last fetched review records, in the order the backend listed them.
pub const CREATE_REVIEWS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS reviews (
    position INTEGER PRIMARY KEY,
    review_id INTEGER,
    payload TEXT NOT NULL,
    fetched_at TEXT NOT NULL
)
";

pub const CREATE_REVIEW_ID_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_reviews_review_id ON reviews(review_id)
";

/// Submissions waiting for the backend to come back.
pub const CREATE_OUTBOX_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS outbox (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    payload TEXT NOT NULL,
    content_hash TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    last_error TEXT
)
";

/// Key-value pairs: schema version and refresh stamps.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_REVIEWS_TABLE,
    CREATE_REVIEW_ID_INDEX,
    CREATE_OUTBOX_TABLE,
    CREATE_METADATA_TABLE,
];
