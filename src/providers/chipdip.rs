//! ChipDip browser-scraping adapter.
//!
//! There is no documented API, only rendered HTML, and the site refuses plain
//! HTTP clients, so every page goes through the [`BrowserGate`]. Resolution is
//! two-phase: the search page yields disambiguation *groups*; after the
//! operator picks one, the group listing yields individual items with their
//! key/value properties. Item datasheets are not fetched eagerly, each item
//! carries its page URL as a pending datasheet the aggregator resolves after
//! selection.
//!
//! Extraction is structural and brittle by nature; two alternate search-page
//! layouts are supported via a primary/fallback selector strategy.

use crate::browser::BrowserGate;
use crate::candidate::{Datasheet, DatasheetLinks, ProductCandidate, ProviderKind};
use crate::error::Result;
use crate::prompt::Prompt;
use crate::providers::{DatasheetResolver, Provider};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Catalog landing page; the browser session warms up here at connect time.
pub const LANDING_URL: &str = "https://www.chipdip.ru";

const BASE_URL: &str = LANDING_URL;

/// Element that appears once the site's late-rendering header is in place.
pub const READINESS_MARKER: &str = ".header__main-link-icon";

/// A disambiguation group on the search-results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupVariant {
    pub name: String,
    pub count: String,
    pub url: String,
}

pub struct ChipdipProvider {
    gate: Arc<BrowserGate>,
    prompt: Arc<dyn Prompt>,
}

impl ChipdipProvider {
    pub fn new(gate: Arc<BrowserGate>, prompt: Arc<dyn Prompt>) -> Self {
        Self { gate, prompt }
    }

    async fn find_groups(&self, query: &str) -> Result<Vec<GroupVariant>> {
        let url = reqwest::Url::parse_with_params(
            &format!("{BASE_URL}/search"),
            &[("searchtext", query)],
        )
        .map_err(|e| anyhow::anyhow!("bad search url: {e}"))?;

        let html = self.gate.fetch(url.as_str()).await?;
        Ok(parse_groups(&html))
    }
}

#[async_trait]
impl Provider for ChipdipProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Chipdip
    }

    async fn search(&self, query: &str) -> Result<Vec<ProductCandidate>> {
        let groups = self.find_groups(query).await?;
        if groups.is_empty() {
            debug!("no ChipDip groups matched");
            return Ok(vec![]);
        }

        for (index, group) in groups.iter().enumerate() {
            println!("({index}) {} ({})", group.name, group.count);
        }

        let Some(choice) = self.prompt.read_line("> ") else {
            error!("no choice made");
            return Ok(vec![]);
        };
        let Some(pick) = choice.trim().parse::<usize>().ok().and_then(|i| groups.get(i)) else {
            warn!("group choice out of range");
            return Ok(vec![]);
        };

        // ps=x3 switches the listing to the dense table layout.
        let listing_url = format!("{}&ps=x3", absolutize(&pick.url));
        let html = self.gate.fetch(&listing_url).await?;
        Ok(parse_items(&html))
    }
}

#[async_trait]
impl DatasheetResolver for ChipdipProvider {
    async fn resolve_datasheet(&self, item_url: &str) -> Result<Option<DatasheetLinks>> {
        let html = self.gate.fetch(item_url).await?;
        Ok(DatasheetLinks::from_list(parse_datasheet_links(&html)))
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn absolutize(href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{BASE_URL}{href}")
    }
}

/// Extract disambiguation groups, trying the current search layout first and
/// the legacy table layout when it yields nothing.
pub fn parse_groups(html: &str) -> Vec<GroupVariant> {
    let document = Html::parse_document(html);
    let primary = parse_primary_groups(&document);
    if !primary.is_empty() {
        return primary;
    }
    parse_legacy_groups(&document)
}

fn parse_primary_groups(document: &Html) -> Vec<GroupVariant> {
    let row = selector("li");
    let group_marker = selector(".serp__group-col-item");
    let count_sel = selector("sub");
    let link_sel = selector("a");

    document
        .select(&row)
        .filter(|li| li.select(&group_marker).next().is_some())
        .filter_map(|li| {
            let link = li.select(&link_sel).next()?;
            let href = link.value().attr("href")?;
            let count = li
                .select(&count_sel)
                .next()
                .map(element_text)
                .unwrap_or_else(|| "N/A".to_string());
            Some(GroupVariant {
                name: element_text(link),
                count,
                url: href.to_string(),
            })
        })
        .collect()
}

fn parse_legacy_groups(document: &Html) -> Vec<GroupVariant> {
    let cell = selector("td.group-header-wrap");
    let count_sel = selector("sub");
    let link_sel = selector("a");

    document
        .select(&cell)
        .filter_map(|td| {
            let link = td.select(&link_sel).next()?;
            let href = link.value().attr("href")?;
            let full_name = element_text(link);
            let count = td
                .select(&count_sel)
                .next()
                .map(element_text)
                .unwrap_or_else(|| "N/A".to_string());
            Some(GroupVariant {
                name: quoted_group_name(&full_name).unwrap_or(full_name),
                count,
                url: href.to_string(),
            })
        })
        .collect()
}

/// The legacy layout wraps the interesting group name in the second pair of
/// guillemets, e.g. `Искать «LM358» в группе «Компараторы»`.
fn quoted_group_name(text: &str) -> Option<String> {
    let mut quoted = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('«') {
        let after = &rest[start + '«'.len_utf8()..];
        let end = after.find('»')?;
        quoted.push(after[..end].to_string());
        rest = &after[end + '»'.len_utf8()..];
    }
    quoted.into_iter().nth(1)
}

/// Extract individual items from a group listing page.
pub fn parse_items(html: &str) -> Vec<ProductCandidate> {
    let document = Html::parse_document(html);
    let row_sel = selector("tr.with-hover");
    let link_sel = selector("a.link");
    let property_sel = selector("div.pps > div:not(.av_w2)");

    document
        .select(&row_sel)
        .filter_map(|row| {
            let link = row.select(&link_sel).next()?;
            let href = link.value().attr("href")?;
            let name = element_text(link);
            let url = absolutize(href);

            let properties: Vec<(String, String)> = row
                .select(&property_sel)
                .filter_map(|prop| {
                    let text = element_text(prop);
                    let (key, value) = text.split_once(':')?;
                    let key = key.trim();
                    if key.is_empty() {
                        return None;
                    }
                    let value = value.trim();
                    let value = if value.is_empty() { "N/A" } else { value };
                    Some((key.to_string(), value.to_string()))
                })
                .collect();

            Some(ProductCandidate {
                model: name.clone(),
                description: name,
                properties,
                datasheet: Datasheet::Pending(url.clone()),
                provider: ProviderKind::Chipdip,
                source_url: url,
            })
        })
        .collect()
}

/// Downloadable-document links on an item page, deduplicated in order.
pub fn parse_datasheet_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let link_sel = selector(".download__link.with-pdfpreview");

    let mut seen = HashSet::new();
    document
        .select(&link_sel)
        .filter(|el| el.value().name() == "a")
        .filter_map(|el| el.value().attr("href"))
        .map(absolutize)
        .filter(|href| seen.insert(href.clone()))
        .collect()
}
