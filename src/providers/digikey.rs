//! Digikey keyword-search adapter (direct API, bearer auth).

use crate::auth::DigikeyAuth;
use crate::candidate::{filter_meaningful_properties, Datasheet, ProductCandidate, ProviderKind};
use crate::error::Result;
use crate::providers::Provider;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, warn};

const SEARCH_URL: &str = "https://api.digikey.com/products/v4/search/keyword";
const PAGE_SIZE: u32 = 20;

/// Only the fields the candidate shape needs; the envelope carries far more.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "Products", default)]
    products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
struct Product {
    #[serde(rename = "ManufacturerProductNumber")]
    manufacturer_product_number: String,
    #[serde(rename = "Description", default)]
    description: Option<Description>,
    #[serde(rename = "DatasheetUrl", default)]
    datasheet_url: Option<String>,
    #[serde(rename = "ProductUrl", default)]
    product_url: String,
    #[serde(rename = "Parameters", default)]
    parameters: Vec<Parameter>,
}

#[derive(Debug, Deserialize)]
struct Description {
    #[serde(rename = "ProductDescription", default)]
    product_description: Option<String>,
    #[serde(rename = "DetailedDescription", default)]
    detailed_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Parameter {
    #[serde(rename = "ParameterText")]
    parameter_text: String,
    #[serde(rename = "ValueText")]
    value_text: String,
}

pub struct DigikeyProvider {
    client: reqwest::Client,
    /// None when credentials were not configured; the adapter then degrades
    /// to an empty result instead of failing every resolution.
    auth: Option<DigikeyAuth>,
    client_id: Option<String>,
}

impl DigikeyProvider {
    pub fn new(client: reqwest::Client, auth: Option<DigikeyAuth>, client_id: Option<String>) -> Self {
        Self {
            client,
            auth,
            client_id,
        }
    }
}

#[async_trait]
impl Provider for DigikeyProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Digikey
    }

    async fn search(&self, query: &str) -> Result<Vec<ProductCandidate>> {
        let (Some(auth), Some(client_id)) = (&self.auth, &self.client_id) else {
            warn!("Digikey credentials not configured, skipping");
            return Ok(vec![]);
        };

        // Auth failure is fatal to the current resolution.
        let token = auth.token().await?;

        let response = self
            .client
            .post(SEARCH_URL)
            .bearer_auth(&token)
            .header("Accept", "application/json")
            .header("X-DIGIKEY-Client-Id", client_id)
            .json(&json!({
                "Keywords": query,
                "Limit": PAGE_SIZE,
                "Offset": 0,
            }))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                error!("error fetching product information from Digikey: {err}");
                return Ok(vec![]);
            }
        };

        if !response.status().is_success() {
            error!(
                "error fetching product information from Digikey: {}",
                response.status()
            );
            return Ok(vec![]);
        }

        let envelope: SearchResponse = match response.json().await {
            Ok(envelope) => envelope,
            Err(err) => {
                error!("malformed Digikey search envelope: {err}");
                return Ok(vec![]);
            }
        };

        debug!(count = envelope.products.len(), "Digikey search results");

        Ok(envelope
            .products
            .into_iter()
            .map(|product| {
                let description = product
                    .description
                    .as_ref()
                    .and_then(|d| {
                        d.detailed_description
                            .clone()
                            .or_else(|| d.product_description.clone())
                    })
                    .unwrap_or_default();

                let properties: Vec<(String, String)> = product
                    .parameters
                    .into_iter()
                    .map(|p| (p.parameter_text, p.value_text))
                    .collect();

                ProductCandidate {
                    model: product.manufacturer_product_number,
                    description,
                    properties: filter_meaningful_properties(&properties),
                    datasheet: Datasheet::Resolved(
                        product
                            .datasheet_url
                            .filter(|url| !url.is_empty())
                            .map(crate::candidate::DatasheetLinks::One),
                    ),
                    provider: ProviderKind::Digikey,
                    source_url: product.product_url,
                }
            })
            .collect())
    }
}
