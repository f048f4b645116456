use crate::config::Config;
use crate::model::{BarcodeResponse, ProductRef};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Failures from the barcode collaborator. These propagate unchanged to the
/// render path: a failing row fails the whole page.
#[derive(Debug, Error)]
pub enum BarcodeError {
    #[error("barcode service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("barcode service error {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("barcode service response missing {0}")]
    Incomplete(&'static str),
    #[error("invalid barcode service request: {0}")]
    Request(String),
}

/// Collaborator contract for barcode generation. Called once per grid row
/// with a minimal product reference; no caching, no retries.
#[async_trait]
pub trait BarcodeService: Send + Sync {
    async fn generate_barcode(&self, product: &ProductRef)
        -> Result<BarcodeResponse, BarcodeError>;
}

#[derive(Clone)]
pub struct BarcodeClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl fmt::Debug for BarcodeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BarcodeClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl BarcodeClient {
    pub fn new(base_url: Url, api_key: String) -> Self {
        let http = Client::builder()
            .user_agent("barcode-grid/0.1")
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            api_key,
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self, BarcodeError> {
        let base_url = Url::parse(&cfg.barcode.base_url)
            .map_err(|err| BarcodeError::Request(err.to_string()))?;
        Ok(Self::new(base_url, cfg.barcode.api_key.clone()))
    }

    pub fn build_request(&self, product: &ProductRef) -> Result<reqwest::Request, BarcodeError> {
        let endpoint = self
            .base_url
            .join("v1/barcodes")
            .map_err(|err| BarcodeError::Request(err.to_string()))?;
        Ok(self
            .http
            .post(endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&json!({ "sku": product.sku }))
            .build()?)
    }

    async fn execute_generate(
        &self,
        product: &ProductRef,
    ) -> Result<BarcodeResponse, BarcodeError> {
        let request = self.build_request(product)?;
        debug!(url=%request.url(), sku=%product.sku, "sending barcode request");
        let res = self.http.execute(request).await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(BarcodeError::Status { status, body });
        }

        let payload: GenerateBarcodeResponse = res.json().await?;
        validate_response(payload)
    }
}

#[async_trait]
impl BarcodeService for BarcodeClient {
    async fn generate_barcode(
        &self,
        product: &ProductRef,
    ) -> Result<BarcodeResponse, BarcodeError> {
        self.execute_generate(product).await
    }
}

#[derive(Deserialize)]
struct GenerateBarcodeResponse {
    encoding: Option<String>,
    code: Option<String>,
}

/// A response without both fields is unusable for rendering and counts as a
/// service failure.
fn validate_response(payload: GenerateBarcodeResponse) -> Result<BarcodeResponse, BarcodeError> {
    let encoding = payload
        .encoding
        .filter(|s| !s.is_empty())
        .ok_or(BarcodeError::Incomplete("encoding"))?;
    let code = payload
        .code
        .filter(|s| !s.is_empty())
        .ok_or(BarcodeError::Incomplete("code"))?;
    Ok(BarcodeResponse { encoding, code })
}
