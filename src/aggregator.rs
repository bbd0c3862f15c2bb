//! Fan-out, fallback chain and operator disambiguation.
//!
//! The fallback chain: direct-API adapters run concurrently first; the
//! browser-scraping adapter is invoked only when they both come back empty
//! (or when the operator forces it with the reserved `cd` token).

use crate::candidate::{Datasheet, LabelRecord, ProductCandidate};
use crate::error::Result;
use crate::ledger::LedgerStore;
use crate::prompt::Prompt;
use crate::providers::{DatasheetResolver, Provider};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Reserved selection token that re-resolves using only the scraping adapter,
/// even when the direct APIs produced results.
pub const FORCE_FALLBACK_TOKEN: &str = "cd";

pub struct Aggregator {
    direct: Vec<Arc<dyn Provider>>,
    fallback: Arc<dyn Provider>,
    datasheets: Arc<dyn DatasheetResolver>,
    prompt: Arc<dyn Prompt>,
    store: Arc<LedgerStore>,
}

impl Aggregator {
    pub fn new(
        direct: Vec<Arc<dyn Provider>>,
        fallback: Arc<dyn Provider>,
        datasheets: Arc<dyn DatasheetResolver>,
        prompt: Arc<dyn Prompt>,
        store: Arc<LedgerStore>,
    ) -> Self {
        Self {
            direct,
            fallback,
            datasheets,
            prompt,
            store,
        }
    }

    /// Resolve a query to a ready-to-persist record, or `None` when the
    /// operator declined (no selection, out-of-range index, nothing found).
    pub async fn resolve(&self, query: &str) -> Result<Option<LabelRecord>> {
        let mut only_fallback = false;

        loop {
            let mut candidates = if only_fallback {
                Vec::new()
            } else {
                self.search_direct(query).await?
            };

            if candidates.is_empty() {
                if !only_fallback {
                    error!("nothing found anywhere, trying chipdip...");
                }
                candidates = self.fallback.search(query).await?;
            }

            if candidates.is_empty() {
                println!("{}", "nothing found".red());
                return Ok(None);
            }

            println!(
                "({}) {}: force ChipDip search",
                FORCE_FALLBACK_TOKEN.bold(),
                "chipdip".cyan()
            );
            for (index, candidate) in candidates.iter().enumerate() {
                print_candidate(index, candidate);
            }

            let Some(choice) = self.prompt.read_line("> ") else {
                error!("no choice made");
                return Ok(None);
            };
            let choice = choice.trim();

            if choice == FORCE_FALLBACK_TOKEN {
                only_fallback = true;
                continue;
            }

            let pick = choice
                .parse::<usize>()
                .ok()
                .filter(|index| *index < candidates.len())
                .map(|index| candidates.swap_remove(index));
            let Some(pick) = pick else {
                error!("no choice made");
                return Ok(None);
            };

            let record = self.finalize(pick).await?;
            return Ok(Some(record));
        }
    }

    /// Concurrent fan-out over the direct adapters. Both always run to
    /// completion; a fatal error in one surfaces only after the other is done.
    async fn search_direct(&self, query: &str) -> Result<Vec<ProductCandidate>> {
        let spinner = search_spinner();
        let results =
            futures::future::join_all(self.direct.iter().map(|p| p.search(query))).await;
        spinner.finish_and_clear();

        let mut combined = Vec::new();
        for result in results {
            combined.extend(result?);
        }
        debug!(count = combined.len(), "direct adapters combined");
        Ok(combined)
    }

    /// Promote a chosen candidate: resolve a pending datasheet exactly once,
    /// then attach the next inventory number.
    async fn finalize(&self, pick: ProductCandidate) -> Result<LabelRecord> {
        let datasheet = match pick.datasheet.clone() {
            Datasheet::Resolved(links) => links,
            Datasheet::Pending(item_url) => self.datasheets.resolve_datasheet(&item_url).await?,
        };
        let inventory_number = self.store.next_inventory_number();
        Ok(LabelRecord::from_candidate(pick, datasheet, inventory_number))
    }
}

fn print_candidate(index: usize, candidate: &ProductCandidate) {
    println!(
        "({}) {}: {}",
        index.to_string().bold(),
        candidate.provider.to_string().cyan(),
        candidate.model.bold()
    );
    println!("\t {}", candidate.description);
    let flattened = candidate
        .properties
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("; ");
    println!("\t {}", flattened.dimmed());
}

fn search_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("searching catalogs...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
