//! Display aliases keyed by ssh argument string or full command.
//!
//! Reads fold lines in file order, treating an empty value as a tombstone
//! for its key. Writes always rewrite the whole file from the resolved map,
//! sorted by key, which compacts tombstones away.

use crate::config::ensure_parent_dir;
use crate::error::{StoreError, StoreResult};
use crate::lock::{LockMode, open_locked};
use crate::replace::replace_file;
use sshtab_types::codec;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolved key -> alias mapping, ordered by key.
pub type AliasMap = BTreeMap<String, String>;

fn parse_content(content: &[u8]) -> AliasMap {
    let mut aliases = AliasMap::new();
    for line in content.split(|b| *b == b'\n').filter(|l| !l.is_empty()) {
        let Some((key, value)) = parse_line(line) else {
            continue;
        };
        if value.is_empty() {
            aliases.remove(&key);
        } else {
            aliases.insert(key, value);
        }
    }
    aliases
}

fn parse_line(line: &[u8]) -> Option<(String, String)> {
    let line = std::str::from_utf8(line).ok()?;
    let (key, value) = line.split_once('\t')?;
    let key = codec::decode_string(key)?;
    let value = codec::decode_string(value)?;
    if key.is_empty() {
        return None;
    }
    Some((key, value))
}

fn format_content(aliases: &AliasMap) -> String {
    let mut out = String::new();
    for (key, value) in aliases {
        if key.is_empty() || value.is_empty() {
            continue;
        }
        out.push_str(&codec::encode(key));
        out.push('\t');
        out.push_str(&codec::encode(value));
        out.push('\n');
    }
    out
}

/// An alias log file.
#[derive(Debug, Clone)]
pub struct AliasLog {
    path: PathBuf,
}

impl AliasLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        AliasLog { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the resolved mapping. A missing file is an empty mapping.
    pub fn load(&self) -> StoreResult<AliasMap> {
        let mut options = OpenOptions::new();
        options.read(true);
        let Some(lock) = open_locked(&self.path, &options, LockMode::Shared)? else {
            return Ok(AliasMap::new());
        };
        let content = lock.read_all().map_err(StoreError::io("read"))?;
        Ok(parse_content(&content))
    }

    /// Set `key`'s alias, or clear it when `alias` is empty.
    pub fn set_or_clear(&self, key: &str, alias: &str) -> StoreResult<()> {
        if key.is_empty() {
            return Err(StoreError::Policy("alias key is empty".to_string()));
        }
        ensure_parent_dir(&self.path)?;
        let mut options = OpenOptions::new();
        options
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o600);
        let lock = open_locked(&self.path, &options, LockMode::Exclusive)?
            .ok_or_else(|| StoreError::io("open")(io::ErrorKind::NotFound.into()))?;
        let content = lock.read_all().map_err(StoreError::io("read"))?;

        let mut aliases = parse_content(&content);
        if alias.is_empty() {
            aliases.remove(key);
        } else {
            aliases.insert(key.to_string(), alias.to_string());
        }

        replace_file(&self.path, format_content(&aliases).as_bytes())?;
        debug!(
            "alias {:?} -> {:?} ({} entries) in {}",
            key,
            alias,
            aliases.len(),
            self.path.display()
        );
        Ok(())
    }
}
