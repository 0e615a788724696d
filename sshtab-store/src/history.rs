//! Ranked command history over an append-only log.
//!
//! Raw lines are never edited in place. A ranked view is rebuilt on every
//! load by folding lines with exit code 0 by command text.

use crate::config::ensure_parent_dir;
use crate::error::{StoreError, StoreResult};
use crate::lock::{LockMode, open_locked};
use crate::replace::replace_file;
use chrono::Local;
use sshtab_types::codec;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One distinct command, folded over all its successful log lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// The command text.
    pub command: String,
    /// Unix timestamp of the most recent successful run.
    pub last_used: i64,
    /// Number of successful runs.
    pub count: u64,
}

/// A raw log line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Record {
    when: i64,
    exit_code: i32,
    command: String,
}

impl Record {
    fn parse(line: &[u8]) -> Option<Record> {
        let line = std::str::from_utf8(line).ok()?;
        let mut fields = line.splitn(3, '\t');
        let when = fields.next()?.parse().ok()?;
        let exit_code = fields.next()?.parse().ok()?;
        let command = codec::decode_string(fields.next()?)?;
        Some(Record {
            when,
            exit_code,
            command,
        })
    }

    fn format(&self) -> String {
        format!(
            "{}\t{}\t{}\n",
            self.when,
            self.exit_code,
            codec::encode(&self.command)
        )
    }
}

/// Most recent first, then most used, then by text.
fn rank(a: &HistoryEntry, b: &HistoryEntry) -> Ordering {
    b.last_used
        .cmp(&a.last_used)
        .then_with(|| b.count.cmp(&a.count))
        .then_with(|| a.command.cmp(&b.command))
}

fn sort_and_limit(entries: &mut Vec<HistoryEntry>, limit: usize) {
    entries.sort_by(rank);
    if limit > 0 {
        entries.truncate(limit);
    }
}

/// Merge two ranked views into one.
///
/// On an exact command collision the entry used more recently wins; on a
/// tie the entry from `primary` is kept.
pub fn merge_recent(
    primary: Vec<HistoryEntry>,
    secondary: Vec<HistoryEntry>,
    limit: usize,
) -> Vec<HistoryEntry> {
    let mut merged: HashMap<String, HistoryEntry> = HashMap::new();
    for entry in primary.into_iter().chain(secondary) {
        let keep_existing = merged
            .get(&entry.command)
            .is_some_and(|existing| existing.last_used >= entry.last_used);
        if !keep_existing {
            merged.insert(entry.command.clone(), entry);
        }
    }
    let mut entries: Vec<HistoryEntry> = merged.into_values().collect();
    sort_and_limit(&mut entries, limit);
    entries
}

fn lines(content: &[u8]) -> impl Iterator<Item = &[u8]> {
    content
        .split(|b| *b == b'\n')
        .filter(|line| !line.is_empty())
}

/// A history log file.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        HistoryLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record stamped with the current time.
    pub fn append(&self, command: &str, exit_code: i32) -> StoreResult<()> {
        self.append_at(command, exit_code, Local::now().timestamp())
    }

    /// Append one record with an explicit timestamp.
    ///
    /// The line goes out in a single write under an exclusive lock, so
    /// concurrent appenders never interleave.
    pub fn append_at(&self, command: &str, exit_code: i32, when: i64) -> StoreResult<()> {
        ensure_parent_dir(&self.path)?;
        let mut options = OpenOptions::new();
        options.create(true).append(true).mode(0o600);
        let lock = open_locked(&self.path, &options, LockMode::Exclusive)?
            .ok_or_else(|| StoreError::io("open")(io::ErrorKind::NotFound.into()))?;

        let record = Record {
            when,
            exit_code,
            command: command.to_string(),
        };
        let mut file = lock.file();
        file.write_all(record.format().as_bytes())
            .map_err(StoreError::io("write"))?;
        debug!("history append {:?} -> {}", command, self.path.display());
        Ok(())
    }

    /// Load the ranked, de-duplicated view; `limit == 0` means no limit.
    ///
    /// A missing log is an empty history. Malformed lines and failed runs
    /// are skipped.
    pub fn load_recent_unique(&self, limit: usize) -> StoreResult<Vec<HistoryEntry>> {
        let mut options = OpenOptions::new();
        options.read(true);
        let content = match open_locked(&self.path, &options, LockMode::Shared)? {
            Some(lock) => lock.read_all().map_err(StoreError::io("read"))?,
            None => return Ok(Vec::new()),
        };

        let mut seen: HashMap<String, HistoryEntry> = HashMap::new();
        let mut skipped = 0usize;
        for line in lines(&content) {
            let Some(record) = Record::parse(line) else {
                skipped += 1;
                continue;
            };
            if record.exit_code != 0 {
                continue;
            }
            seen.entry(record.command)
                .and_modify(|entry| {
                    entry.count += 1;
                    entry.last_used = entry.last_used.max(record.when);
                })
                .or_insert_with_key(|command| HistoryEntry {
                    command: command.clone(),
                    last_used: record.when,
                    count: 1,
                });
        }
        if skipped > 0 {
            debug!(
                "skipped {} malformed lines in {}",
                skipped,
                self.path.display()
            );
        }

        let mut entries: Vec<HistoryEntry> = seen.into_values().collect();
        sort_and_limit(&mut entries, limit);
        Ok(entries)
    }

    /// Remove every line whose command equals `command`.
    ///
    /// Returns the number of lines removed, or [`StoreError::NotFound`] when
    /// nothing matched, in which case the file is left untouched.
    pub fn delete_command(&self, command: &str) -> StoreResult<usize> {
        let mut options = OpenOptions::new();
        options.read(true).write(true);
        let Some(lock) = open_locked(&self.path, &options, LockMode::Exclusive)? else {
            return Err(StoreError::NotFound);
        };
        let content = lock.read_all().map_err(StoreError::io("read"))?;

        let mut survivors = Vec::with_capacity(content.len());
        let mut removed = 0usize;
        for line in lines(&content) {
            let matches = Record::parse(line).is_some_and(|record| record.command == command);
            if matches {
                removed += 1;
            } else {
                survivors.extend_from_slice(line);
                survivors.push(b'\n');
            }
        }

        if removed == 0 {
            return Err(StoreError::NotFound);
        }
        replace_file(&self.path, &survivors)?;
        debug!(
            "history delete {:?}: removed {} lines from {}",
            command,
            removed,
            self.path.display()
        );
        Ok(removed)
    }
}
