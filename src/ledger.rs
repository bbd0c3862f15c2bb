//! File-backed inventory ledger.
//!
//! The ledger is the only cross-run state: a JSON document holding the
//! allocation counter, every label ever assigned, and the cached Digikey
//! token. It is read fully at startup and rewritten wholesale after every
//! mutation. The rewrite goes through a temp file followed by an atomic
//! rename, so a crash mid-write leaves the previous consistent file in place.
//!
//! The store assumes a single writer. Two processes sharing one ledger file
//! will race; there is deliberately no file locking.

use crate::candidate::LabelRecord;
use crate::error::{PartmarkError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Inventory numbers are zero-padded to this width.
pub const INVENTORY_NUMBER_WIDTH: usize = 6;

/// Cached OAuth token with its expiry instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthCache {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// On-disk ledger document.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ledger {
    latest_inventory_number: u64,
    /// BTreeMap keeps the file diff-friendly: ids serialize in order.
    items: BTreeMap<String, LabelRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_cache: Option<AuthCache>,
}

/// Single-writer store around the ledger file.
///
/// All mutation goes through [`LedgerStore::assign`] and
/// [`LedgerStore::refresh_auth`], each a full read-modify-write with the file
/// rename as the durability boundary.
pub struct LedgerStore {
    path: PathBuf,
    inner: Mutex<Ledger>,
}

impl LedgerStore {
    /// Load the ledger from `path`, creating an empty one if the file does
    /// not exist yet. A malformed file is fatal.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let ledger = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| persistence(&path, e))?;
            serde_json::from_str(&contents).map_err(|e| persistence(&path, e))?
        } else {
            debug!(path = %path.display(), "ledger file absent, starting empty");
            let ledger = Ledger::default();
            write_ledger(&path, &ledger)?;
            ledger
        };

        Ok(Self {
            path,
            inner: Mutex::new(ledger),
        })
    }

    /// Next id to hand out: counter + 1, zero-padded. Does not mutate.
    pub fn next_inventory_number(&self) -> String {
        let ledger = self.inner.lock().expect("ledger lock poisoned");
        format_inventory_number(ledger.latest_inventory_number + 1)
    }

    /// Persist a chosen record under its inventory number and advance the
    /// counter. The write hits disk before this returns.
    pub fn assign(&self, record: LabelRecord) -> Result<()> {
        let mut ledger = self.inner.lock().expect("ledger lock poisoned");
        let number: u64 = record.inventory_number.parse().map_err(|_| {
            PartmarkError::Persistence {
                path: self.path.display().to_string(),
                message: format!("non-numeric inventory number {:?}", record.inventory_number),
            }
        })?;
        ledger
            .items
            .insert(record.inventory_number.clone(), record);
        ledger.latest_inventory_number = ledger.latest_inventory_number.max(number);
        write_ledger(&self.path, &ledger)
    }

    /// Look up a record by its exact inventory number.
    pub fn get(&self, inventory_number: &str) -> Option<LabelRecord> {
        let ledger = self.inner.lock().expect("ledger lock poisoned");
        ledger.items.get(inventory_number).cloned()
    }

    /// Case-insensitive bidirectional substring match over stored models:
    /// a hit either contains the query or is contained by it. Used for the
    /// pre-search duplicate hint and manual reprint lookup.
    pub fn find_by_model(&self, query: &str) -> Vec<LabelRecord> {
        let needle = query.to_lowercase();
        let ledger = self.inner.lock().expect("ledger lock poisoned");
        ledger
            .items
            .values()
            .filter(|item| {
                let model = item.model.to_lowercase();
                model.contains(&needle) || needle.contains(&model)
            })
            .cloned()
            .collect()
    }

    /// Currently cached auth token, if any.
    pub fn cached_auth(&self) -> Option<AuthCache> {
        let ledger = self.inner.lock().expect("ledger lock poisoned");
        ledger.auth_cache.clone()
    }

    /// Store a freshly exchanged token. Synchronous: the caller may only use
    /// the token after this returns.
    pub fn refresh_auth(&self, token: String, expires_at: DateTime<Utc>) -> Result<()> {
        let mut ledger = self.inner.lock().expect("ledger lock poisoned");
        ledger.auth_cache = Some(AuthCache { token, expires_at });
        write_ledger(&self.path, &ledger)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        let ledger = self.inner.lock().expect("ledger lock poisoned");
        ledger.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Zero-pad an id to the fixed ledger width.
pub fn format_inventory_number(number: u64) -> String {
    format!("{:0width$}", number, width = INVENTORY_NUMBER_WIDTH)
}

fn write_ledger(path: &Path, ledger: &Ledger) -> Result<()> {
    let json = serde_json::to_string_pretty(ledger).map_err(|e| persistence(path, e))?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| persistence(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| persistence(path, e))?;
    Ok(())
}

fn persistence(path: &Path, err: impl std::fmt::Display) -> PartmarkError {
    PartmarkError::Persistence {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inventory_numbers_are_zero_padded() {
        assert_eq!(format_inventory_number(1), "000001");
        assert_eq!(format_inventory_number(123456), "123456");
        assert_eq!(format_inventory_number(1234567), "1234567");
    }
}
