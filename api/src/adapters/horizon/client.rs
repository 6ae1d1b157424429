//! Horizon API client implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use urlencoding::encode;

use crate::domain::ports::{HorizonAccount, HorizonClient, HorizonOperation, HorizonTransaction};
use crate::error::HorizonError;

/// Operations fetched per transaction; Stellar caps a transaction at 100
const OPERATIONS_PAGE_LIMIT: u32 = 200;

/// Implementation of the Horizon API client
pub struct HorizonClientImpl {
    http: Client,
    base_url: String,
}

impl HorizonClientImpl {
    pub fn new(base_url: String) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a Horizon response; `not_found` builds the error for a 404
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
        not_found: impl FnOnce() -> HorizonError,
    ) -> Result<T, HorizonError> {
        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| HorizonError::Deserialization(e.to_string()))
        } else if status.as_u16() == 404 {
            Err(not_found())
        } else if status.as_u16() == 429 {
            Err(HorizonError::RateLimited)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(HorizonError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// HAL collection envelope used by Horizon list endpoints
#[derive(Deserialize)]
struct Page<T> {
    #[serde(rename = "_embedded")]
    embedded: Embedded<T>,
}

#[derive(Deserialize)]
struct Embedded<T> {
    records: Vec<T>,
}

#[async_trait]
impl HorizonClient for HorizonClientImpl {
    async fn get_transaction(&self, hash: &str) -> Result<HorizonTransaction, HorizonError> {
        let url = self.api_url(&format!("/transactions/{}", encode(hash)));
        tracing::debug!(%url, "Fetching transaction");

        let response = self.http.get(&url).send().await?;
        self.handle_response(response, || {
            HorizonError::TransactionNotFound(hash.to_string())
        })
        .await
    }

    async fn list_operations(&self, hash: &str) -> Result<Vec<HorizonOperation>, HorizonError> {
        let url = self.api_url(&format!(
            "/transactions/{}/operations?limit={}",
            encode(hash),
            OPERATIONS_PAGE_LIMIT
        ));

        let response = self.http.get(&url).send().await?;
        let page: Page<HorizonOperation> = self
            .handle_response(response, || {
                HorizonError::TransactionNotFound(hash.to_string())
            })
            .await?;
        Ok(page.embedded.records)
    }

    async fn get_account(&self, address: &str) -> Result<HorizonAccount, HorizonError> {
        let url = self.api_url(&format!("/accounts/{}", encode(address)));

        let response = self.http.get(&url).send().await?;
        self.handle_response(response, || {
            HorizonError::AccountNotFound(address.to_string())
        })
        .await
    }
}
