//! JSONL log export: atomic full rewrite of the text log from the store.

use std::io::Write;
use std::path::Path;

use beads_core::filter::IssueFilter;
use beads_core::jsonl::write_jsonl;

use crate::error::Result;
use crate::traits::Storage;

/// Full, atomic rewrite of `jsonl_path` from every non-ephemeral issue in
/// `store`, tombstones included (collaborators need to see the delete).
/// Writes to a sibling `.tmp` file and renames it over the destination so
/// readers never see a torn file. On success, clears the entire dirty set.
/// Returns the number of issues written.
pub fn flush_to_jsonl(store: &dyn Storage, jsonl_path: &Path) -> Result<usize> {
    let all_issues = store.search_issues(
        "",
        &IssueFilter {
            include_tombstones: true,
            ..Default::default()
        },
    )?;

    let mut enriched = Vec::with_capacity(all_issues.len());
    for issue in &all_issues {
        if issue.ephemeral {
            continue;
        }
        enriched.push(store.get_issue(&issue.id)?);
    }

    let tmp_path = jsonl_path.with_extension("jsonl.tmp");
    let write_result = (|| -> Result<()> {
        let mut file = std::fs::File::create(&tmp_path)?;
        write_jsonl(&mut file, &enriched).map_err(|e| crate::error::StorageError::Internal(e.to_string()))?;
        file.flush()?;
        Ok(())
    })();

    if let Err(e) = write_result {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }
    std::fs::rename(&tmp_path, jsonl_path)?;

    let count = enriched.len();

    let dirty_ids = store.get_dirty_issues()?;
    if !dirty_ids.is_empty() {
        store.clear_dirty(&dirty_ids)?;
    }

    tracing::debug!(count, path = %jsonl_path.display(), "exported issues to log");
    Ok(count)
}

/// Incremental export: a no-op if the dirty set is empty, otherwise a full
/// rewrite (the dirty set only gates *whether* to rewrite, not which issues
/// get re-emitted -- there is no byte-level incremental log format).
pub fn flush_dirty_to_jsonl(store: &dyn Storage, jsonl_path: &Path) -> Result<usize> {
    let dirty_ids = store.get_dirty_issues()?;
    if dirty_ids.is_empty() {
        tracing::debug!("no dirty issues, skipping export");
        return Ok(0);
    }
    flush_to_jsonl(store, jsonl_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteStore;
    use beads_core::issue::IssueBuilder;
    use std::io::BufRead;

    fn read_lines(path: &Path) -> Vec<String> {
        let file = std::fs::File::open(path).unwrap();
        std::io::BufReader::new(file)
            .lines()
            .map(|l| l.unwrap())
            .collect()
    }

    #[test]
    fn flush_writes_all_non_ephemeral_issues() {
        let store = SqliteStore::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issues.jsonl");

        store
            .create_issue(&IssueBuilder::new("A").id("bd-a1").build(), "alice")
            .unwrap();
        let mut ephemeral = IssueBuilder::new("Wisp").id("bd-wisp-1").build();
        ephemeral.ephemeral = true;
        store.create_issue(&ephemeral, "alice").unwrap();

        let count = flush_to_jsonl(&store, &path).unwrap();
        assert_eq!(count, 1);
        assert_eq!(read_lines(&path).len(), 1);
    }

    #[test]
    fn flush_clears_dirty_set() {
        let store = SqliteStore::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issues.jsonl");

        store
            .create_issue(&IssueBuilder::new("A").id("bd-a2").build(), "alice")
            .unwrap();
        assert!(!store.get_dirty_issues().unwrap().is_empty());

        flush_to_jsonl(&store, &path).unwrap();
        assert!(store.get_dirty_issues().unwrap().is_empty());
    }

    #[test]
    fn flush_dirty_is_noop_when_clean() {
        let store = SqliteStore::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issues.jsonl");

        let count = flush_dirty_to_jsonl(&store, &path).unwrap();
        assert_eq!(count, 0);
        assert!(!path.exists());
    }

    #[test]
    fn flush_includes_tombstones() {
        let store = SqliteStore::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issues.jsonl");

        store
            .create_issue(&IssueBuilder::new("Deleted").id("bd-del9").build(), "alice")
            .unwrap();
        store
            .update_issue(
                "bd-del9",
                &crate::traits::IssueUpdates {
                    status: Some(beads_core::enums::Status::Tombstone),
                    deleted_at: Some(Some(chrono::Utc::now())),
                    ..Default::default()
                },
                "alice",
            )
            .unwrap();

        let count = flush_to_jsonl(&store, &path).unwrap();
        assert_eq!(count, 1);
        let lines = read_lines(&path);
        assert!(lines[0].contains("\"bd-del9\""));
    }

    #[test]
    fn flush_omits_hard_deleted_issues() {
        let store = SqliteStore::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issues.jsonl");

        store
            .create_issue(&IssueBuilder::new("Deleted").id("bd-del10").build(), "alice")
            .unwrap();
        store.delete_issue("bd-del10").unwrap();

        let count = flush_to_jsonl(&store, &path).unwrap();
        assert_eq!(count, 0);
    }
}
