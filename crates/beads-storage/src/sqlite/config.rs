//! Config and metadata key-value store operations for [`SqliteStore`].

use rusqlite::{params, Connection};
use std::collections::HashMap;

use crate::error::{Result, StorageError};
use crate::sqlite::store::SqliteStore;

// ---------------------------------------------------------------------------
// Connection-level helpers (shared with Transaction)
// ---------------------------------------------------------------------------

pub(crate) fn set_config_on_conn(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO config (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

pub(crate) fn get_config_on_conn(conn: &Connection, key: &str) -> Result<String> {
    conn.query_row(
        "SELECT value FROM config WHERE key = ?1",
        params![key],
        |row| row.get::<_, String>(0),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("config", key),
        other => StorageError::Query(other),
    })
}

pub(crate) fn set_metadata_on_conn(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

pub(crate) fn get_metadata_on_conn(conn: &Connection, key: &str) -> Result<String> {
    conn.query_row(
        "SELECT value FROM metadata WHERE key = ?1",
        params![key],
        |row| row.get::<_, String>(0),
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("metadata", key),
        other => StorageError::Query(other),
    })
}

pub(crate) fn mark_dirty_on_conn(conn: &Connection, issue_id: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO dirty_issues (issue_id, marked_at) VALUES (?1, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
        params![issue_id],
    )?;
    Ok(())
}

pub(crate) fn get_dirty_issues_on_conn(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT issue_id FROM dirty_issues ORDER BY marked_at")?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut ids = Vec::new();
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

pub(crate) fn clear_dirty_on_conn(conn: &Connection, issue_ids: &[String]) -> Result<()> {
    if issue_ids.is_empty() {
        return Ok(());
    }
    let placeholders = issue_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
    let sql = format!("DELETE FROM dirty_issues WHERE issue_id IN ({placeholders})");
    conn.execute(&sql, rusqlite::params_from_iter(issue_ids.iter()))?;
    Ok(())
}

pub(crate) fn set_exported_hash_on_conn(conn: &Connection, issue_id: &str, hash: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO export_hashes (issue_id, content_hash) VALUES (?1, ?2)",
        params![issue_id, hash],
    )?;
    Ok(())
}

pub(crate) fn get_exported_hash_on_conn(
    conn: &Connection,
    issue_id: &str,
) -> Result<Option<String>> {
    use rusqlite::OptionalExtension;
    conn.query_row(
        "SELECT content_hash FROM export_hashes WHERE issue_id = ?1",
        params![issue_id],
        |row| row.get::<_, String>(0),
    )
    .optional()
    .map_err(StorageError::Query)
}

pub(crate) fn next_child_number_on_conn(conn: &Connection, parent_id: &str) -> Result<u32> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| StorageError::Transaction(format!("failed to begin: {e}")))?;

    use rusqlite::OptionalExtension;
    let current: Option<u32> = tx
        .query_row(
            "SELECT next_n FROM child_counters WHERE parent_id = ?1",
            params![parent_id],
            |row| row.get(0),
        )
        .optional()?;
    let next = current.unwrap_or(0) + 1;
    tx.execute(
        "INSERT OR REPLACE INTO child_counters (parent_id, next_n) VALUES (?1, ?2)",
        params![parent_id, next],
    )?;
    tx.commit()
        .map_err(|e| StorageError::Transaction(format!("failed to commit: {e}")))?;
    Ok(next)
}

// ---------------------------------------------------------------------------
// SqliteStore methods
// ---------------------------------------------------------------------------

impl SqliteStore {
    /// Sets a configuration key-value pair.
    pub fn set_config_impl(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        set_config_on_conn(&conn, key, value)
    }

    /// Gets a configuration value by key.
    pub fn get_config_impl(&self, key: &str) -> Result<String> {
        let conn = self.lock_conn()?;
        get_config_on_conn(&conn, key)
    }

    /// Returns all configuration key-value pairs.
    pub fn get_all_config_impl(&self) -> Result<HashMap<String, String>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM config ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut map = HashMap::new();
        for row in rows {
            let (k, v) = row?;
            map.insert(k, v);
        }
        Ok(map)
    }

    /// Sets an internal bookkeeping key-value pair.
    pub fn set_metadata_impl(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        set_metadata_on_conn(&conn, key, value)
    }

    /// Gets an internal bookkeeping value by key.
    pub fn get_metadata_impl(&self, key: &str) -> Result<String> {
        let conn = self.lock_conn()?;
        get_metadata_on_conn(&conn, key)
    }

    /// Marks an issue as dirty (needing re-export to the JSONL log).
    pub fn mark_dirty_impl(&self, issue_id: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        mark_dirty_on_conn(&conn, issue_id)
    }

    /// Returns all issue IDs currently marked dirty.
    pub fn get_dirty_issues_impl(&self) -> Result<Vec<String>> {
        let conn = self.lock_conn()?;
        get_dirty_issues_on_conn(&conn)
    }

    /// Clears the given issue IDs from the dirty set.
    pub fn clear_dirty_impl(&self, issue_ids: &[String]) -> Result<()> {
        let conn = self.lock_conn()?;
        clear_dirty_on_conn(&conn, issue_ids)
    }

    /// Records the content hash last written to the log for an issue.
    pub fn set_exported_hash_impl(&self, issue_id: &str, hash: &str) -> Result<()> {
        let conn = self.lock_conn()?;
        set_exported_hash_on_conn(&conn, issue_id, hash)
    }

    /// Returns the content hash last written to the log for an issue, if any.
    pub fn get_exported_hash_impl(&self, issue_id: &str) -> Result<Option<String>> {
        let conn = self.lock_conn()?;
        get_exported_hash_on_conn(&conn, issue_id)
    }

    /// Allocates the next hierarchical child number for `parent_id`.
    pub fn next_child_number_impl(&self, parent_id: &str) -> Result<u32> {
        let conn = self.lock_conn()?;
        next_child_number_on_conn(&conn, parent_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> SqliteStore {
        SqliteStore::open_in_memory().unwrap()
    }

    #[test]
    fn set_and_get_config() {
        let store = test_store();
        store.set_config_impl("test_key", "test_value").unwrap();
        let val = store.get_config_impl("test_key").unwrap();
        assert_eq!(val, "test_value");
    }

    #[test]
    fn get_config_not_found() {
        let store = test_store();
        let err = store.get_config_impl("nonexistent").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn upsert_config() {
        let store = test_store();
        store.set_config_impl("key1", "v1").unwrap();
        store.set_config_impl("key1", "v2").unwrap();
        let val = store.get_config_impl("key1").unwrap();
        assert_eq!(val, "v2");
    }

    #[test]
    fn get_all_config() {
        let store = test_store();
        let config = store.get_all_config_impl().unwrap();
        // Default config should be present.
        assert!(config.contains_key("compaction_enabled"));
    }

    #[test]
    fn set_and_get_metadata() {
        let store = test_store();
        store
            .set_metadata_impl("last_import_mtime", "12345")
            .unwrap();
        let val = store.get_metadata_impl("last_import_mtime").unwrap();
        assert_eq!(val, "12345");
    }

    #[test]
    fn dirty_set_roundtrip() {
        let store = test_store();
        store.mark_dirty_impl("bd-1").unwrap();
        store.mark_dirty_impl("bd-2").unwrap();
        let dirty = store.get_dirty_issues_impl().unwrap();
        assert_eq!(dirty, vec!["bd-1".to_string(), "bd-2".to_string()]);

        store.clear_dirty_impl(&["bd-1".to_string()]).unwrap();
        let dirty = store.get_dirty_issues_impl().unwrap();
        assert_eq!(dirty, vec!["bd-2".to_string()]);
    }

    #[test]
    fn exported_hash_roundtrip() {
        let store = test_store();
        assert_eq!(store.get_exported_hash_impl("bd-1").unwrap(), None);
        store.set_exported_hash_impl("bd-1", "abc123").unwrap();
        assert_eq!(
            store.get_exported_hash_impl("bd-1").unwrap(),
            Some("abc123".to_string())
        );
        store.set_exported_hash_impl("bd-1", "def456").unwrap();
        assert_eq!(
            store.get_exported_hash_impl("bd-1").unwrap(),
            Some("def456".to_string())
        );
    }

    #[test]
    fn child_counter_increments() {
        let store = test_store();
        assert_eq!(store.next_child_number_impl("bd-parent").unwrap(), 1);
        assert_eq!(store.next_child_number_impl("bd-parent").unwrap(), 2);
        assert_eq!(store.next_child_number_impl("bd-parent").unwrap(), 3);
        assert_eq!(store.next_child_number_impl("bd-other").unwrap(), 1);
    }
}
