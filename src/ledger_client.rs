use crate::errors::AppError;
use crate::models::{BalanceOperationPayload, CreateCardPayload, TransferPayload};
use reqwest::{header, Method};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

/// Client for the ledger provider's REST API.
///
/// Every method performs exactly one request and never retries. Non-2xx
/// responses become [`AppError::Upstream`] carrying the provider's status and
/// body.
#[derive(Clone)]
pub struct LedgerClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl LedgerClient {
    /// Creates a new `LedgerClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the ledger provider.
    /// * `api_key` - Bearer token for authentication.
    pub fn new(base_url: &str, api_key: String) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            AppError::Configuration(format!("Invalid ledger base URL {}: {}", base_url, e))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::Configuration(format!("Failed to create ledger client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Builds `<base>/<segments…>?<query>`; segments are percent-encoded.
    fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Configuration("Ledger base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Value, AppError> {
        tracing::debug!("Ledger request: {} {}", method, url.path());

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .header(header::ACCEPT, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key));

        if let Some(body) = body {
            // `json` also sets content-type: application/json
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Ledger request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Transport(format!("Failed to read ledger response: {}", e)))?;

        let data = serde_json::from_str::<Value>(&text).unwrap_or_else(|_| json!({ "raw": text }));

        if !status.is_success() {
            tracing::warn!("Ledger {} {} returned {}", method, url.path(), status);
            return Err(AppError::Upstream { status, body: data });
        }

        Ok(data)
    }

    /// `GET /v1/ledger/accounts/{id}/balances`
    pub async fn get_balances(&self, account_id: &str) -> Result<Value, AppError> {
        let url = self.endpoint(&["v1", "ledger", "accounts", account_id, "balances"], &[])?;
        tracing::info!("Fetching balances for account {}", account_id);
        self.send::<()>(Method::GET, url, None).await
    }

    /// `POST /v1/ledger/accounts/{id}/balance`
    pub async fn post_balance_operation(
        &self,
        account_id: &str,
        payload: &BalanceOperationPayload,
    ) -> Result<Value, AppError> {
        let url = self.endpoint(&["v1", "ledger", "accounts", account_id, "balance"], &[])?;
        tracing::info!(
            "Posting {} for account {} (external_id {})",
            payload.operation,
            account_id,
            payload.external_id
        );
        self.send(Method::POST, url, Some(payload)).await
    }

    /// `GET /v1/cards?page_number=&page_size=`
    pub async fn list_cards(&self, page_number: u32, page_size: u32) -> Result<Value, AppError> {
        let url = self.endpoint(
            &["v1", "cards"],
            &[
                ("page_number", page_number.to_string()),
                ("page_size", page_size.to_string()),
            ],
        )?;
        tracing::info!("Listing cards (page {}, size {})", page_number, page_size);
        self.send::<()>(Method::GET, url, None).await
    }

    /// `POST /v1/ledger/cards`
    pub async fn create_card(&self, payload: &CreateCardPayload) -> Result<Value, AppError> {
        let url = self.endpoint(&["v1", "ledger", "cards"], &[])?;
        tracing::info!("Creating card for account {}", payload.account_id);
        self.send(Method::POST, url, Some(payload)).await
    }

    /// `POST /v1/ledger/transfers`
    pub async fn create_transfer(&self, payload: &TransferPayload) -> Result<Value, AppError> {
        let url = self.endpoint(&["v1", "ledger", "transfers"], &[])?;
        tracing::info!(
            "Transferring from {} to {} (external_id {})",
            payload.payer_account_id,
            payload.receiving_account_id,
            payload.external_id
        );
        self.send(Method::POST, url, Some(payload)).await
    }

    /// `GET /v1/ledger/accounts/{id}/transactions?page_number=&page_size=`
    pub async fn list_transactions(
        &self,
        account_id: &str,
        page_number: u32,
        page_size: u32,
    ) -> Result<Value, AppError> {
        let url = self.endpoint(
            &["v1", "ledger", "accounts", account_id, "transactions"],
            &[
                ("page_number", page_number.to_string()),
                ("page_size", page_size.to_string()),
            ],
        )?;
        tracing::info!("Listing transactions for account {}", account_id);
        self.send::<()>(Method::GET, url, None).await
    }
}
