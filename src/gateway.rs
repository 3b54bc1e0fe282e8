//! Action-multiplexed proxy in front of the ledger provider.
//!
//! A request names an `action`; the gateway validates the action's
//! parameters, performs at most one upstream call and returns either a
//! normalized success body or a normalized error. Nothing is kept between
//! requests.

use crate::config::Config;
use crate::errors::AppError;
use crate::external_id;
use crate::ledger_client::LedgerClient;
use crate::models::*;
use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

pub const MISSING_API_KEY: &str = "Missing MONO_API_KEY in environment";

const DEFAULT_CARDS_PAGE_SIZE: u32 = 10;
const DEFAULT_ACTIVITY_PAGE_SIZE: u32 = 20;

/// One inbound call, already split into its parts.
#[derive(Debug, Clone)]
pub struct GatewayRequest {
    pub method: Method,
    pub query: ActionQuery,
    /// Parsed JSON body. `None` when absent or not valid JSON.
    pub body: Option<Value>,
}

impl GatewayRequest {
    pub fn new(method: Method, query: ActionQuery, body: Option<Value>) -> Self {
        Self {
            method,
            query,
            body,
        }
    }

    /// Parses raw body bytes leniently: anything that is not JSON is dropped
    /// so that validation reports the first missing field.
    pub fn parse_body(bytes: &[u8]) -> Option<Value> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return None;
        }
        match serde_json::from_slice(bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!("Ignoring non-JSON request body: {}", e);
                None
            }
        }
    }

    fn body_as<T: DeserializeOwned + Default>(&self) -> T {
        self.body
            .clone()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }
}

/// Status plus JSON body, always served as `application/json`.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl GatewayResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }
}

impl From<AppError> for GatewayResponse {
    fn from(err: AppError) -> Self {
        Self {
            status: err.status(),
            body: err.body(),
        }
    }
}

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// The proxy itself. Holds no per-request state.
#[derive(Clone)]
pub struct Gateway {
    ledger: Option<LedgerClient>,
}

impl Gateway {
    /// Without a ledger client every action fails with a configuration error.
    pub fn new(ledger: Option<LedgerClient>) -> Self {
        Self { ledger }
    }

    /// Builds the ledger client when an API key is configured.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let ledger = match &config.mono_api_key {
            Some(key) => Some(LedgerClient::new(&config.mono_base_url, key.clone())?),
            None => None,
        };
        Ok(Self::new(ledger))
    }

    /// Single entry point: one request in, one normalized response out.
    pub async fn handle(&self, request: GatewayRequest) -> GatewayResponse {
        if request.method == Method::OPTIONS {
            return GatewayResponse::ok(json!({ "ok": true }));
        }

        match self.dispatch(&request).await {
            Ok(body) => GatewayResponse::ok(body),
            Err(err) => {
                match &err {
                    AppError::Upstream { status, .. } => {
                        tracing::warn!("Ledger provider rejected request with {}", status)
                    }
                    AppError::Configuration(msg) | AppError::Transport(msg) => {
                        tracing::error!("Gateway failure: {}", msg)
                    }
                    other => tracing::debug!("Gateway rejected request: {}", other),
                }
                err.into()
            }
        }
    }

    async fn dispatch(&self, request: &GatewayRequest) -> Result<Value, AppError> {
        let ledger = self
            .ledger
            .as_ref()
            .ok_or_else(|| AppError::Configuration(MISSING_API_KEY.to_string()))?;

        let name = request
            .query
            .action
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("health");
        let action =
            Action::parse(name).ok_or_else(|| AppError::UnknownAction(name.to_string()))?;

        if action.requires_post() && request.method != Method::POST {
            return Err(AppError::MethodNotAllowed);
        }

        tracing::info!("Gateway action '{}' ({})", action.as_str(), request.method);

        match action {
            Action::Health => Ok(json!({ "ok": true })),
            Action::Balance => balance(ledger, request).await,
            Action::Topup => topup(ledger, request).await,
            Action::Cards => cards(ledger, request).await,
            Action::CreateCard => create_card(ledger, request).await,
            Action::Transfer => transfer(ledger, request).await,
            Action::Activity => activity(ledger, request).await,
        }
    }
}

// ============ Field helpers ============

/// Present, non-empty string (numbers are accepted and stringified).
fn required_string(value: Option<&Value>, field: &str) -> Result<String, AppError> {
    optional_string(value).ok_or_else(|| AppError::BadRequest(format!("{} is required", field)))
}

fn optional_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn required_amount(value: Option<&Value>) -> Result<Amount, AppError> {
    value
        .and_then(Amount::parse)
        .ok_or_else(|| AppError::BadRequest("amount must be > 0".to_string()))
}

/// Account id from the query string, falling back to the JSON body.
fn account_from_query_or_body(request: &GatewayRequest) -> Result<String, AppError> {
    if let Some(id) = request.query.account_id.as_deref().filter(|s| !s.is_empty()) {
        return Ok(id.to_string());
    }
    let body: AccountBody = request.body_as();
    required_string(body.account_id.as_ref(), "account_id")
}

fn page_param(raw: Option<&str>, default: u32, field: &str) -> Result<u32, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(s) => s
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| AppError::BadRequest(format!("{} must be a positive integer", field))),
    }
}

// ============ Actions ============

async fn balance(ledger: &LedgerClient, request: &GatewayRequest) -> Result<Value, AppError> {
    let account_id = account_from_query_or_body(request)?;
    let balances = ledger.get_balances(&account_id).await?;
    let summary = BalanceSummary::from_upstream(account_id, &balances);
    Ok(serde_json::to_value(summary)?)
}

async fn topup(ledger: &LedgerClient, request: &GatewayRequest) -> Result<Value, AppError> {
    let body: TopupBody = request.body_as();
    let account_id = required_string(body.account_id.as_ref(), "account_id")?;
    let amount = required_amount(body.amount.as_ref())?;

    let payload = BalanceOperationPayload {
        amount: Money::cop(amount),
        operation: "topup",
        external_id: external_id::or_generate(body.external_id.as_ref()),
    };

    ledger.post_balance_operation(&account_id, &payload).await
}

async fn cards(ledger: &LedgerClient, request: &GatewayRequest) -> Result<Value, AppError> {
    let page_number = page_param(request.query.page_number.as_deref(), 1, "page_number")?;
    let page_size = page_param(
        request.query.page_size.as_deref(),
        DEFAULT_CARDS_PAGE_SIZE,
        "page_size",
    )?;

    let payload = ledger.list_cards(page_number, page_size).await?;
    Ok(serde_json::to_value(CardsPage::from_upstream(&payload))?)
}

async fn create_card(ledger: &LedgerClient, request: &GatewayRequest) -> Result<Value, AppError> {
    let body: CreateCardBody = request.body_as();
    let configuration_group_id =
        required_string(body.configuration_group_id.as_ref(), "configuration_group_id")?;
    let account_id = required_string(body.account_id.as_ref(), "account_id")?;
    let cardholder = match body.cardholder {
        None | Some(Value::Null) => {
            return Err(AppError::BadRequest("cardholder is required".to_string()))
        }
        Some(Value::Object(map)) => Value::Object(map),
        Some(_) => {
            return Err(AppError::BadRequest(
                "cardholder must be an object".to_string(),
            ))
        }
    };

    let payload = CreateCardPayload {
        configuration_group_id,
        account_id,
        cardholder,
        nickname: optional_string(body.nickname.as_ref()),
    };

    ledger.create_card(&payload).await
}

async fn transfer(ledger: &LedgerClient, request: &GatewayRequest) -> Result<Value, AppError> {
    let body: TransferBody = request.body_as();
    let payer_account_id = required_string(body.payer_account_id.as_ref(), "payer_account_id")?;
    let receiving_account_id =
        required_string(body.receiving_account_id.as_ref(), "receiving_account_id")?;
    if payer_account_id == receiving_account_id {
        return Err(AppError::BadRequest(
            "payer_account_id and receiving_account_id must be different".to_string(),
        ));
    }
    let amount = required_amount(body.amount.as_ref())?;

    let payload = TransferPayload {
        payer_account_id,
        receiving_account_id,
        source_amount: Money::cop(amount),
        external_id: external_id::or_generate(body.external_id.as_ref()),
        description: optional_string(body.description.as_ref())
            .unwrap_or_else(|| "Transfer".to_string()),
    };

    ledger.create_transfer(&payload).await
}

async fn activity(ledger: &LedgerClient, request: &GatewayRequest) -> Result<Value, AppError> {
    let account_id = account_from_query_or_body(request)?;
    let page_number = page_param(request.query.page_number.as_deref(), 1, "page_number")?;
    let page_size = page_param(
        request.query.page_size.as_deref(),
        DEFAULT_ACTIVITY_PAGE_SIZE,
        "page_size",
    )?;

    ledger
        .list_transactions(&account_id, page_number, page_size)
        .await
}
