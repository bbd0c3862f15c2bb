//! Library interface for partmark.
//!
//! Exposes the resolution and rendering pipeline so integration tests (and
//! potential embedding) can drive it without the interactive binary.

pub mod aggregator;
pub mod auth;
pub mod browser;
pub mod candidate;
pub mod error;
pub mod layout;
pub mod ledger;
pub mod printer;
pub mod prompt;
pub mod providers;

pub use aggregator::Aggregator;
pub use candidate::{Datasheet, DatasheetLinks, LabelRecord, ProductCandidate, ProviderKind};
pub use error::{PartmarkError, Result};
pub use ledger::LedgerStore;
