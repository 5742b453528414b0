//! JSONL log import: reconcile a text log against the indexed store.
//!
//! Mirrors the reference importer's phased reconciliation: content-hash
//! match wins first (detects unchanged/renamed content), then ID match with
//! newer-wins semantics, then a plain insert for anything new. Deletion
//! markers are processed first so a rename/recreate in the same batch can't
//! race a tombstone.

use std::collections::{HashMap, HashSet};
use std::io::BufReader;
use std::path::Path;

use beads_core::content_hash::compute_content_hash;
use beads_core::enums::Status;
use beads_core::filter::IssueFilter;
use beads_core::issue::Issue;
use beads_core::jsonl::{read_jsonl, LogRecord};

use crate::error::Result;
use crate::traits::{IssueUpdates, Storage};

/// Tally of what an import did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub created: u32,
    pub updated: u32,
    pub unchanged: u32,
    pub skipped: u32,
    pub deleted: u32,
}

/// Reads `jsonl_path` and splits it into issues and deletion-marker IDs.
/// Returns an empty result (not an error) if the file does not exist, since
/// a freshly-initialized workspace has no log yet.
fn parse_log(jsonl_path: &Path) -> Result<(Vec<Issue>, Vec<String>)> {
    if !jsonl_path.exists() {
        return Ok((Vec::new(), Vec::new()));
    }
    let file = std::fs::File::open(jsonl_path)?;
    let reader = BufReader::new(file);

    let mut issues = Vec::new();
    let mut deletions = Vec::new();
    for record in read_jsonl(reader) {
        match record {
            LogRecord::Issue(issue) => issues.push(*issue),
            LogRecord::Deletion(id) => deletions.push(id),
        }
    }
    Ok((issues, deletions))
}

/// Imports `jsonl_path` into `store`, reconciling incoming records against
/// whatever is already there.
pub fn import_jsonl(store: &dyn Storage, jsonl_path: &Path) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    let (mut issues, deletion_ids) = parse_log(jsonl_path)?;

    // Deletion markers are processed before reconciliation: a tombstone here
    // must win over any same-batch recreate attempt.
    for id in deletion_ids {
        if store.get_issue(&id).is_ok() {
            store.delete_issue(&id)?;
            report.deleted += 1;
        }
    }

    for issue in &mut issues {
        issue.content_hash = compute_content_hash(issue);
        if issue.id.contains("-wisp-") && !issue.ephemeral {
            issue.ephemeral = true;
        }
    }

    let existing = store.search_issues(
        "",
        &IssueFilter {
            include_tombstones: true,
            ..Default::default()
        },
    )?;
    let by_id: HashMap<&str, &Issue> = existing.iter().map(|i| (i.id.as_str(), i)).collect();
    let mut by_hash: HashMap<&str, &Issue> = HashMap::new();
    for i in &existing {
        if !i.content_hash.is_empty() {
            by_hash.insert(i.content_hash.as_str(), i);
        }
    }

    let mut seen_hashes: HashSet<String> = HashSet::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for incoming in &issues {
        if seen_hashes.contains(&incoming.content_hash) {
            report.skipped += 1;
            continue;
        }
        seen_hashes.insert(incoming.content_hash.clone());

        if seen_ids.contains(&incoming.id) {
            report.skipped += 1;
            continue;
        }
        seen_ids.insert(incoming.id.clone());

        if let Some(existing_by_id) = by_id.get(incoming.id.as_str()) {
            if existing_by_id.status == Status::Tombstone {
                report.skipped += 1;
                continue;
            }
        }

        // Phase 1: content hash already present in the store.
        if let Some(existing_by_hash) = by_hash.get(incoming.content_hash.as_str()) {
            if existing_by_hash.id == incoming.id {
                report.unchanged += 1;
            } else {
                // Same content under a different ID: a rename/duplicate we
                // decline to resolve automatically.
                report.skipped += 1;
            }
            continue;
        }

        // Phase 2: ID already present, newer-wins.
        if let Some(existing_by_id) = by_id.get(incoming.id.as_str()) {
            if incoming.updated_at <= existing_by_id.updated_at {
                report.unchanged += 1;
                continue;
            }
            let mut updates = IssueUpdates {
                title: Some(incoming.title.clone()),
                description: Some(incoming.description.clone()),
                design: Some(incoming.design.clone()),
                acceptance_criteria: Some(incoming.acceptance_criteria.clone()),
                notes: Some(incoming.notes.clone()),
                status: Some(incoming.status.clone()),
                priority: Some(incoming.priority),
                issue_type: Some(incoming.issue_type.clone()),
                assignee: Some(incoming.assignee.clone()),
                ..Default::default()
            };
            if incoming.closed_at.is_some() {
                updates.closed_at = Some(incoming.closed_at);
            }
            if !incoming.close_reason.is_empty() {
                updates.close_reason = Some(incoming.close_reason.clone());
            }
            if incoming.pinned {
                updates.pinned = Some(incoming.pinned);
            }
            if incoming.external_ref.is_some() {
                updates.external_ref = Some(incoming.external_ref.clone());
            }
            store.update_issue(&incoming.id, &updates, "import")?;
            report.updated += 1;
            continue;
        }

        // Phase 3: genuinely new.
        store.create_issue(incoming, "import")?;
        report.created += 1;
    }

    Ok(report)
}

/// Imports `jsonl_path` only if its modification time is newer than the
/// store's recorded `last_import_mtime`. Returns `None` if the import was
/// skipped (log missing or not newer).
pub fn auto_import_if_needed(store: &dyn Storage, jsonl_path: &Path) -> Result<Option<ImportReport>> {
    if !jsonl_path.exists() {
        return Ok(None);
    }

    let jsonl_mtime = mtime_secs(jsonl_path)?;
    if let Ok(last_import) = store.get_metadata("last_import_mtime") {
        if let Ok(last_import) = last_import.parse::<f64>() {
            if last_import >= jsonl_mtime {
                tracing::debug!(jsonl_mtime, last_import, "log not newer, skipping auto-import");
                return Ok(None);
            }
        }
    }

    tracing::debug!(jsonl_mtime, "auto-importing log");
    let report = import_jsonl(store, jsonl_path)?;
    store.set_metadata("last_import_mtime", &jsonl_mtime.to_string())?;
    Ok(Some(report))
}

fn mtime_secs(path: &Path) -> Result<f64> {
    let metadata = std::fs::metadata(path)?;
    let mtime = metadata.modified()?;
    let secs = mtime
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::SqliteStore;
    use beads_core::issue::IssueBuilder;
    use std::io::Write;

    fn write_log(dir: &tempfile::TempDir, lines: &[String]) -> std::path::PathBuf {
        let path = dir.path().join("issues.jsonl");
        let mut f = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
        path
    }

    #[test]
    fn import_creates_new_issues() {
        let store = SqliteStore::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let issue = IssueBuilder::new("Imported").id("bd-imp1").build();
        let line = serde_json::to_string(&issue).unwrap();
        let path = write_log(&dir, &[line]);

        let report = import_jsonl(&store, &path).unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.updated, 0);
        assert!(store.get_issue("bd-imp1").is_ok());
    }

    #[test]
    fn reimport_unchanged_content_is_noop() {
        let store = SqliteStore::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let issue = IssueBuilder::new("Stable").id("bd-st1").build();
        let line = serde_json::to_string(&issue).unwrap();
        let path = write_log(&dir, &[line.clone()]);

        import_jsonl(&store, &path).unwrap();
        let report = import_jsonl(&store, &path).unwrap();
        assert_eq!(report.created, 0);
        assert_eq!(report.unchanged, 1);
    }

    #[test]
    fn import_skips_tombstoned_issue() {
        let store = SqliteStore::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let issue = IssueBuilder::new("Gone").id("bd-del1").build();
        store.create_issue(&issue, "alice").unwrap();
        store
            .update_issue(
                "bd-del1",
                &IssueUpdates {
                    status: Some(Status::Tombstone),
                    deleted_at: Some(Some(chrono::Utc::now())),
                    ..Default::default()
                },
                "alice",
            )
            .unwrap();

        let mut reincarnated = issue.clone();
        reincarnated.title = "Gone but different".to_string();
        let line = serde_json::to_string(&reincarnated).unwrap();
        let path = write_log(&dir, &[line]);

        let report = import_jsonl(&store, &path).unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.created, 0);
    }

    #[test]
    fn deletion_marker_deletes_existing_issue() {
        let store = SqliteStore::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let issue = IssueBuilder::new("ToDelete").id("bd-del2").build();
        store.create_issue(&issue, "alice").unwrap();

        let marker = serde_json::json!({ "id": "bd-del2", "_deleted": true });
        let path = write_log(&dir, &[marker.to_string()]);

        let report = import_jsonl(&store, &path).unwrap();
        assert_eq!(report.deleted, 1);
        let err = store.get_issue("bd-del2").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn auto_import_skips_when_not_newer() {
        let store = SqliteStore::open_in_memory().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let issue = IssueBuilder::new("A").id("bd-a1").build();
        let line = serde_json::to_string(&issue).unwrap();
        let path = write_log(&dir, &[line]);

        let first = auto_import_if_needed(&store, &path).unwrap();
        assert!(first.is_some());

        let second = auto_import_if_needed(&store, &path).unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn missing_log_returns_empty_report() {
        let store = SqliteStore::open_in_memory().unwrap();
        let path = std::path::PathBuf::from("/nonexistent/issues.jsonl");
        let report = import_jsonl(&store, &path).unwrap();
        assert_eq!(report, ImportReport::default());
    }
}
