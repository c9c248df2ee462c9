//! Schema versioning for the local cache.
//!
//! The version lives in the `metadata` table. Each step after the base
//! layout runs in its own transaction together with the version bump.

use rusqlite::{Connection, OptionalExtension};

use crate::error::{Error, Result};

use super::schema::SCHEMA_STATEMENTS;

/// The schema version this build writes.
pub const CURRENT_VERSION: i32 = 3;

const VERSION_KEY: &str = "schema_version";

/// Steps from version `n - 1` to `n`, indexed by `n`.
const MIGRATIONS: &[(i32, &str)] = &[
    // 1 is the base layout from `SCHEMA_STATEMENTS`.
    (1, ""),
    (2, "ALTER TABLE outbox ADD COLUMN last_attempt_at TEXT"),
    (
        3,
        "ALTER TABLE outbox ADD COLUMN rejections INTEGER NOT NULL DEFAULT 0",
    ),
];

/// Create the base layout if needed and bring it up to [`CURRENT_VERSION`].
///
/// # Errors
///
/// Returns an error if a statement fails or the stored version is newer
/// than this build understands.
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }

    let version = schema_version(conn)?;
    if version > CURRENT_VERSION {
        return Err(Error::DatabaseMigration {
            message: format!(
                "cache schema version {version} is newer than supported version {CURRENT_VERSION}"
            ),
        });
    }

    for &(target, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > version) {
        apply(conn, target, sql)?;
    }
    Ok(())
}

/// The stored schema version; 0 for a fresh database.
pub(crate) fn schema_version(conn: &Connection) -> Result<i32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM metadata WHERE key = ?1",
            [VERSION_KEY],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        None => Ok(0),
        Some(value) => value.parse().map_err(|_| Error::DatabaseMigration {
            message: format!("invalid schema version: {value}"),
        }),
    }
}

fn apply(conn: &Connection, target: i32, sql: &str) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    if !sql.is_empty() {
        tx.execute_batch(sql).map_err(|e| Error::DatabaseMigration {
            message: format!("step to version {target} failed: {e}"),
        })?;
    }
    tx.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        (VERSION_KEY, target.to_string()),
    )?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> Connection {
        Connection::open_in_memory().expect("failed to create in-memory database")
    }

    fn columns(conn: &Connection, table: &str) -> Vec<String> {
        conn.prepare(&format!("PRAGMA table_info({table})"))
            .unwrap()
            .query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .filter_map(std::result::Result::ok)
            .collect()
    }

    #[test]
    fn test_fresh_database_reaches_current_version() {
        let conn = memory();
        initialize_schema(&conn).unwrap();

        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
        let outbox = columns(&conn, "outbox");
        assert!(outbox.contains(&"last_attempt_at".to_string()));
        assert!(outbox.contains(&"rejections".to_string()));
        assert!(columns(&conn, "reviews").contains(&"payload".to_string()));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let conn = memory();
        initialize_schema(&conn).unwrap();
        initialize_schema(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_upgrades_version_one_database() {
        let conn = memory();
        for statement in SCHEMA_STATEMENTS {
            conn.execute(statement, []).unwrap();
        }
        conn.execute(
            "INSERT INTO metadata (key, value) VALUES ('schema_version', '1')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO outbox (payload, content_hash, created_at) VALUES ('{}', 'h', 'now')",
            [],
        )
        .unwrap();

        initialize_schema(&conn).unwrap();

        assert_eq!(schema_version(&conn).unwrap(), CURRENT_VERSION);
        let (kept, rejections): (i64, i64) = conn
            .query_row("SELECT COUNT(*), SUM(rejections) FROM outbox", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(kept, 1);
        assert_eq!(rejections, 0);
    }

    #[test]
    fn test_rejects_newer_schema() {
        let conn = memory();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "UPDATE metadata SET value = '99' WHERE key = 'schema_version'",
            [],
        )
        .unwrap();

        let err = initialize_schema(&conn).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }

    #[test]
    fn test_invalid_version_value() {
        let conn = memory();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "UPDATE metadata SET value = 'two' WHERE key = 'schema_version'",
            [],
        )
        .unwrap();

        assert!(schema_version(&conn)
            .unwrap_err()
            .to_string()
            .contains("invalid schema version"));
    }

    #[test]
    fn test_migration_steps_are_ordered() {
        let versions: Vec<i32> = MIGRATIONS.iter().map(|(v, _)| *v).collect();
        assert_eq!(versions, (1..=CURRENT_VERSION).collect::<Vec<_>>());
    }
}
