//! Normalized product candidates and the shared property filter.
//!
//! Every catalog adapter maps its own response shape into [`ProductCandidate`]
//! so the rest of the pipeline never sees provider-specific envelopes. A
//! candidate is transient; once the operator picks one it is promoted to a
//! [`LabelRecord`] with a fully resolved datasheet and an inventory number,
//! and only that form is ever persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Property keys containing any of these substrings carry no signal on a
/// 75x120mm label and are dropped.
const USELESS_KEY_SUBSTRINGS: &[&str] = &["supplier", "rohs", "digikey"];

/// Values the catalogs use to say "nothing here".
const EMPTY_VALUE_SENTINELS: &[&str] = &["", "-", "N/A", "No"];

/// Which catalog a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Digikey,
    Lcsc,
    Chipdip,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Digikey => write!(f, "digikey"),
            ProviderKind::Lcsc => write!(f, "lcsc"),
            ProviderKind::Chipdip => write!(f, "chipdip"),
        }
    }
}

/// Resolved datasheet link(s). Serialized untagged so the ledger file carries
/// `string` or `[string, ...]` (absence is `null` via `Option`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatasheetLinks {
    One(String),
    Many(Vec<String>),
}

impl DatasheetLinks {
    /// Collapse a scraped link list: one link becomes `One`, empty becomes
    /// `None`, the rest stay a list.
    pub fn from_list(mut links: Vec<String>) -> Option<Self> {
        match links.len() {
            0 => None,
            1 => Some(DatasheetLinks::One(links.remove(0))),
            _ => Some(DatasheetLinks::Many(links)),
        }
    }
}

/// Datasheet field of a candidate.
///
/// Direct-API adapters know the link up front (`Resolved`); the scraping
/// adapter would need an extra page navigation per item, so it hands out the
/// item URL instead (`Pending`) and the aggregator resolves it exactly once
/// after the operator has picked a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Datasheet {
    Resolved(Option<DatasheetLinks>),
    Pending(String),
}

/// A normalized, not-yet-persisted product description from one provider.
#[derive(Debug, Clone)]
pub struct ProductCandidate {
    pub model: String,
    pub description: String,
    /// Ordered key/value pairs, provider order preserved.
    pub properties: Vec<(String, String)>,
    pub datasheet: Datasheet,
    pub provider: ProviderKind,
    pub source_url: String,
}

/// A chosen candidate as stored in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelRecord {
    pub inventory_number: String,
    pub model: String,
    pub description: String,
    pub properties: Vec<(String, String)>,
    pub datasheet: Option<DatasheetLinks>,
    pub provider: ProviderKind,
    pub source_url: String,
}

impl LabelRecord {
    pub fn from_candidate(
        candidate: ProductCandidate,
        datasheet: Option<DatasheetLinks>,
        inventory_number: String,
    ) -> Self {
        Self {
            inventory_number,
            model: candidate.model,
            description: candidate.description,
            properties: candidate.properties,
            datasheet,
            provider: candidate.provider,
            source_url: candidate.source_url,
        }
    }
}

/// Drop low-signal properties: blocklisted key substrings (case-insensitive)
/// and empty-sentinel values. Idempotent.
pub fn filter_meaningful_properties(properties: &[(String, String)]) -> Vec<(String, String)> {
    properties
        .iter()
        .filter(|(key, value)| {
            let key_lower = key.to_lowercase();
            if USELESS_KEY_SUBSTRINGS.iter().any(|k| key_lower.contains(k)) {
                return false;
            }
            !EMPTY_VALUE_SENTINELS.contains(&value.as_str())
        })
        .cloned()
        .collect()
}
