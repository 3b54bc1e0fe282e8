use crate::errors::AppError;
use reqwest::Method;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

/// HTTP client the wallet uses to call the gateway's action endpoint.
///
/// Any non-2xx answer becomes [`AppError::Upstream`] with the gateway's
/// status and body, so [`AppError::user_message`] can turn it into a
/// notification.
#[derive(Clone)]
pub struct WalletClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl WalletClient {
    /// `endpoint` is the full gateway URL, e.g. `http://localhost:8888/api`.
    pub fn new(endpoint: &str) -> Result<Self, AppError> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            AppError::Configuration(format!("Invalid gateway URL {}: {}", endpoint, e))
        })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                AppError::Configuration(format!("Failed to create gateway client: {}", e))
            })?;

        Ok(Self { client, endpoint })
    }

    /// Calls `?action=<action>` with extra query pairs and an optional JSON body.
    pub async fn call(
        &self,
        action: &str,
        method: Method,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<Value, AppError> {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("action", action);
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        tracing::debug!("Gateway call: {} action={}", method, action);

        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Gateway request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Transport(format!("Failed to read gateway response: {}", e)))?;
        let data = serde_json::from_str::<Value>(&text).unwrap_or_else(|_| json!({ "raw": text }));

        if !status.is_success() {
            tracing::warn!("Gateway action {} failed with {}", action, status);
            return Err(AppError::Upstream { status, body: data });
        }

        Ok(data)
    }

    pub async fn balance(&self, account_id: &str) -> Result<Value, AppError> {
        self.call(
            "balance",
            Method::GET,
            &[("account_id", account_id.to_string())],
            None,
        )
        .await
    }

    pub async fn cards(&self, page_number: u32, page_size: u32) -> Result<Value, AppError> {
        self.call(
            "cards",
            Method::GET,
            &[
                ("page_number", page_number.to_string()),
                ("page_size", page_size.to_string()),
            ],
            None,
        )
        .await
    }

    pub async fn topup(&self, body: &Value) -> Result<Value, AppError> {
        self.call("topup", Method::POST, &[], Some(body)).await
    }

    pub async fn transfer(&self, body: &Value) -> Result<Value, AppError> {
        self.call("transfer", Method::POST, &[], Some(body)).await
    }

    pub async fn create_card(&self, body: &Value) -> Result<Value, AppError> {
        self.call("create_card", Method::POST, &[], Some(body)).await
    }
}
