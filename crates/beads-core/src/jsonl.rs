//! JSONL (JSON Lines) read/write support.
//!
//! Each line in a JSONL file is a complete JSON object representing either an
//! Issue or a deletion marker (`{"id": "...", "_deleted": true}`).

use std::io::{self, BufRead, Write};

use serde::Deserialize;

use crate::issue::Issue;

/// Error type for JSONL operations.
#[derive(Debug, thiserror::Error)]
pub enum JsonlError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error at line {line}: {source}")]
    Json {
        line: usize,
        source: serde_json::Error,
    },
}

/// Result alias for JSONL operations.
pub type Result<T> = std::result::Result<T, JsonlError>;

/// A single decoded log line: either an issue or a deletion marker.
#[derive(Debug, Clone)]
pub enum LogRecord {
    Issue(Box<Issue>),
    Deletion(String),
}

#[derive(Deserialize)]
struct DeletionProbe {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_deleted")]
    deleted: bool,
}

/// Writes issues as JSONL to the given writer.
///
/// Each issue is written as a single JSON line followed by a newline.
pub fn write_jsonl<W: Write>(writer: &mut W, issues: &[Issue]) -> Result<()> {
    for issue in issues {
        serde_json::to_writer(&mut *writer, issue)
            .map_err(|e| JsonlError::Json { line: 0, source: e })?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes a deletion marker line for the given issue ID.
pub fn write_deletion_marker<W: Write>(writer: &mut W, issue_id: &str) -> Result<()> {
    let marker = serde_json::json!({ "id": issue_id, "_deleted": true });
    serde_json::to_writer(&mut *writer, &marker)
        .map_err(|e| JsonlError::Json { line: 0, source: e })?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Returns an iterator that reads issues from a JSONL reader.
///
/// Each line is parsed as a JSON object. Empty lines are skipped.
/// Malformed lines are skipped (with a `tracing::warn!`) rather than
/// surfaced as errors, matching the log's tolerant-reader contract.
pub fn read_jsonl<R: BufRead>(reader: R) -> JsonlIter<R> {
    JsonlIter {
        reader,
        line_number: 0,
    }
}

/// Iterator over JSONL-encoded log records (issues or deletion markers).
pub struct JsonlIter<R> {
    reader: R,
    line_number: usize,
}

impl<R: BufRead> Iterator for JsonlIter<R> {
    type Item = LogRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None, // EOF
                Ok(_) => {
                    self.line_number += 1;
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue; // skip empty lines
                    }

                    let probe: Result<DeletionProbe> =
                        serde_json::from_str(trimmed).map_err(|e| JsonlError::Json {
                            line: self.line_number,
                            source: e,
                        });
                    match probe {
                        Ok(probe) if probe.deleted => {
                            if let Some(id) = probe.id {
                                return Some(LogRecord::Deletion(id));
                            }
                            tracing::warn!(
                                line = self.line_number,
                                "skipping malformed line: deletion marker without id"
                            );
                            continue;
                        }
                        _ => {}
                    }

                    match serde_json::from_str::<Issue>(trimmed) {
                        Ok(issue) => return Some(LogRecord::Issue(Box::new(issue))),
                        Err(e) => {
                            tracing::warn!(
                                line = self.line_number,
                                error = %e,
                                "skipping malformed line"
                            );
                            continue;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(line = self.line_number, error = %e, "stopping read on I/O error");
                    return None;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueBuilder;
    use std::io::BufReader;

    fn issues_only(records: Vec<LogRecord>) -> Vec<Issue> {
        records
            .into_iter()
            .filter_map(|r| match r {
                LogRecord::Issue(i) => Some(*i),
                LogRecord::Deletion(_) => None,
            })
            .collect()
    }

    #[test]
    fn write_and_read_roundtrip() {
        let issues = vec![
            IssueBuilder::new("Issue 1")
                .id("bd-001")
                .priority(1)
                .build(),
            IssueBuilder::new("Issue 2")
                .id("bd-002")
                .priority(2)
                .build(),
        ];

        let mut buf = Vec::new();
        write_jsonl(&mut buf, &issues).unwrap();

        let reader = BufReader::new(buf.as_slice());
        let read_back = issues_only(read_jsonl(reader).collect());

        assert_eq!(read_back.len(), 2);
        assert_eq!(read_back[0].title, "Issue 1");
        assert_eq!(read_back[1].title, "Issue 2");
    }

    #[test]
    fn read_skips_empty_lines() {
        let data = b"{\"title\":\"A\"}\n\n{\"title\":\"B\"}\n";
        let reader = BufReader::new(data.as_slice());
        let results = issues_only(read_jsonl(reader).collect());
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn read_skips_malformed_lines() {
        let data = b"{\"title\":\"A\"}\nnot-json\n{\"title\":\"B\"}\n";
        let reader = BufReader::new(data.as_slice());
        let results = issues_only(read_jsonl(reader).collect());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "A");
        assert_eq!(results[1].title, "B");
    }

    #[test]
    fn read_recognizes_deletion_marker() {
        let data = b"{\"title\":\"A\",\"id\":\"bd-1\"}\n{\"id\":\"bd-2\",\"_deleted\":true}\n";
        let reader = BufReader::new(data.as_slice());
        let records: Vec<_> = read_jsonl(reader).collect();
        assert_eq!(records.len(), 2);
        assert!(matches!(&records[0], LogRecord::Issue(i) if i.id == "bd-1"));
        assert!(matches!(&records[1], LogRecord::Deletion(id) if id == "bd-2"));
    }

    #[test]
    fn deletion_marker_without_id_is_skipped() {
        let data = b"{\"_deleted\":true}\n{\"title\":\"A\",\"id\":\"bd-1\"}\n";
        let reader = BufReader::new(data.as_slice());
        let records: Vec<_> = read_jsonl(reader).collect();
        assert_eq!(records.len(), 1);
        assert!(matches!(&records[0], LogRecord::Issue(i) if i.id == "bd-1"));
    }

    #[test]
    fn write_and_read_deletion_marker_roundtrip() {
        let mut buf = Vec::new();
        write_deletion_marker(&mut buf, "bd-123").unwrap();
        let reader = BufReader::new(buf.as_slice());
        let records: Vec<_> = read_jsonl(reader).collect();
        assert_eq!(records.len(), 1);
        assert!(matches!(&records[0], LogRecord::Deletion(id) if id == "bd-123"));
    }
}
