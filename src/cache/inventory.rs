//! In-memory index of the cache files belonging to one operation.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use regex::Regex;

use crate::cache::store::TIMESTAMP_FORMAT;
use crate::cache::{CacheError, Fingerprint};

/// One stored result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Identity of the call that produced it.
    pub fingerprint: Fingerprint,
    /// When it was written, to the second.
    pub created_at: NaiveDateTime,
    /// Where it lives.
    pub path: PathBuf,
}

/// Every stored result of one operation, grouped by fingerprint.
///
/// The files are the source of truth: the inventory is rebuilt from them by
/// [`scan`](Self::scan) and is never persisted on its own. Entries for a
/// fingerprint are kept oldest first.
#[derive(Debug, Clone, Default)]
pub struct CacheInventory {
    entries: HashMap<Fingerprint, Vec<CacheEntry>>,
}

impl CacheInventory {
    /// An empty inventory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the files under `dir`, recursively, that belong to `operation`.
    ///
    /// A missing directory yields an empty inventory. Files whose names do
    /// not match `<operation>_<40 hex>_<YYYY-MM-DD_HHMMSS>.<csv|bin>` are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if a directory cannot be listed.
    pub fn scan(dir: &Path, operation: &str) -> Result<Self, CacheError> {
        let pattern = format!(
            r"^{}_([0-9a-f]{{40}})_(\d{{4}}-\d{{2}}-\d{{2}}_\d{{6}})\.(?:csv|bin)$",
            regex::escape(operation)
        );
        let re = Regex::new(&pattern).map_err(|_| CacheError::InvalidName(operation.to_string()))?;

        let mut inventory = Self::new();
        let mut pending = vec![dir.to_path_buf()];
        while let Some(current) = pending.pop() {
            let listing = match std::fs::read_dir(&current) {
                Ok(listing) => listing,
                Err(e) if e.kind() == io::ErrorKind::NotFound && current == dir => break,
                Err(source) => return Err(CacheError::Io { path: current, source }),
            };

            for item in listing {
                let item = item.map_err(|source| CacheError::Io {
                    path: current.clone(),
                    source,
                })?;
                let path = item.path();
                let kind = item.file_type().map_err(|source| CacheError::Io {
                    path: path.clone(),
                    source,
                })?;
                if kind.is_dir() {
                    pending.push(path);
                } else if let Some(entry) = parse_entry(&re, path) {
                    inventory.insert(entry);
                }
            }
        }

        tracing::debug!(
            operation,
            dir = %dir.display(),
            fingerprints = inventory.entries.len(),
            files = inventory.len(),
            "scanned cache directory"
        );
        Ok(inventory)
    }

    /// The most recent entry for `fp`.
    pub fn newest(&self, fp: &Fingerprint) -> Option<&CacheEntry> {
        self.entries.get(fp).and_then(|list| list.last())
    }

    /// All entries for `fp`, oldest first.
    pub fn entries(&self, fp: &Fingerprint) -> &[CacheEntry] {
        self.entries.get(fp).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fingerprints with at least one entry.
    pub fn fingerprints(&self) -> impl Iterator<Item = &Fingerprint> {
        self.entries.keys()
    }

    /// Total number of entries.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Returns true if no entries are recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record an entry, keeping its fingerprint's list ordered by time. An
    /// entry with the same path replaces the old one.
    pub(crate) fn insert(&mut self, entry: CacheEntry) {
        let list = self.entries.entry(entry.fingerprint).or_default();
        list.retain(|e| e.path != entry.path);
        let at = list.partition_point(|e| e.created_at <= entry.created_at);
        list.insert(at, entry);
    }

    /// Drop and return every entry for `fp`.
    pub(crate) fn take(&mut self, fp: &Fingerprint) -> Vec<CacheEntry> {
        self.entries.remove(fp).unwrap_or_default()
    }
}

fn parse_entry(re: &Regex, path: PathBuf) -> Option<CacheEntry> {
    let name = path.file_name()?.to_str()?;
    let caps = re.captures(name)?;
    let fingerprint = caps[1].parse().ok()?;
    let created_at = match NaiveDateTime::parse_from_str(&caps[2], TIMESTAMP_FORMAT) {
        Ok(at) => at,
        Err(e) => {
            tracing::debug!(file = name, error = %e, "skipping cache file with invalid timestamp");
            return None;
        }
    };
    Some(CacheEntry {
        fingerprint,
        created_at,
        path,
    })
}
