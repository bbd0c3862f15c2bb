//! LCSC keyword-search adapter (direct API, no auth).

use crate::candidate::{
    filter_meaningful_properties, Datasheet, DatasheetLinks, ProductCandidate, ProviderKind,
};
use crate::error::Result;
use crate::providers::Provider;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

const SEARCH_URL: &str = "https://wmsc.lcsc.com/ftps/wm/search/v2/global";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: Option<SearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    #[serde(rename = "productSearchResultVO")]
    product_search_result: Option<ProductSearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductSearchResult {
    #[serde(default)]
    product_list: Option<Vec<Product>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Product {
    product_model: String,
    #[serde(default)]
    catalog_name: String,
    #[serde(default)]
    product_intro_en: String,
    #[serde(default)]
    pdf_url: Option<String>,
    #[serde(default)]
    url: String,
    #[serde(rename = "paramVOList", default)]
    param_list: Option<Vec<Param>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Param {
    param_name_en: String,
    param_value_en: String,
}

pub struct LcscProvider {
    client: reqwest::Client,
}

impl LcscProvider {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Provider for LcscProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Lcsc
    }

    async fn search(&self, query: &str) -> Result<Vec<ProductCandidate>> {
        let response = self
            .client
            .post(SEARCH_URL)
            .json(&json!({ "keyword": query }))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                error!("error fetching product information from LCSC: {err}");
                return Ok(vec![]);
            }
        };

        if !response.status().is_success() {
            error!(
                "error fetching product information from LCSC: {}",
                response.status()
            );
            return Ok(vec![]);
        }

        let envelope: SearchResponse = match response.json().await {
            Ok(envelope) => envelope,
            Err(err) => {
                error!("malformed LCSC search envelope: {err}");
                return Ok(vec![]);
            }
        };

        // The nested section is absent for zero-hit queries.
        let products = envelope
            .result
            .and_then(|r| r.product_search_result)
            .and_then(|r| r.product_list)
            .unwrap_or_default();

        debug!(count = products.len(), "LCSC search results");

        Ok(products
            .into_iter()
            .map(|product| {
                let properties: Vec<(String, String)> = product
                    .param_list
                    .unwrap_or_default()
                    .into_iter()
                    .map(|p| (p.param_name_en, p.param_value_en))
                    .collect();

                ProductCandidate {
                    model: product.product_model,
                    description: format!("{} - {}", product.catalog_name, product.product_intro_en),
                    properties: filter_meaningful_properties(&properties),
                    datasheet: Datasheet::Resolved(
                        product
                            .pdf_url
                            .filter(|url| !url.is_empty())
                            .map(DatasheetLinks::One),
                    ),
                    provider: ProviderKind::Lcsc,
                    source_url: product.url,
                }
            })
            .collect())
    }
}
