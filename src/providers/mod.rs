//! Catalog adapters behind one search contract.
//!
//! - **digikey**: authenticated direct API
//! - **lcsc**: unauthenticated direct API
//! - **chipdip**: browser-scraping fallback behind the [`BrowserGate`](crate::browser::BrowserGate)
//!
//! "No results" is an empty list plus a logged diagnostic, never an error;
//! adapters only fail on auth or automation problems that abort the current
//! resolution.

pub mod chipdip;
pub mod digikey;
pub mod lcsc;

use crate::candidate::{DatasheetLinks, ProductCandidate, ProviderKind};
use crate::error::Result;
use async_trait::async_trait;

pub use chipdip::ChipdipProvider;
pub use digikey::DigikeyProvider;
pub use lcsc::LcscProvider;

/// One catalog source. The aggregator holds these as an ordered list; no
/// adapter is ever picked by name.
#[async_trait]
pub trait Provider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Normalized candidates for `query`. Empty means "nothing found here".
    async fn search(&self, query: &str) -> Result<Vec<ProductCandidate>>;
}

/// Turns a [`Datasheet::Pending`](crate::candidate::Datasheet::Pending) item
/// URL into concrete links. Invoked by the aggregator exactly once, after
/// selection.
#[async_trait]
pub trait DatasheetResolver: Send + Sync {
    async fn resolve_datasheet(&self, item_url: &str) -> Result<Option<DatasheetLinks>>;
}
