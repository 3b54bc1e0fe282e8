use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use utoipa::{IntoParams, ToSchema};

/// The only currency the demo ledger operates in.
pub const CURRENCY: &str = "COP";

// ============ Gateway Actions ============

/// Abstract operation name the gateway multiplexes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Health,
    Balance,
    Topup,
    Cards,
    CreateCard,
    Transfer,
    Activity,
}

impl Action {
    /// Parses the `action` query parameter. Returns `None` for unknown names.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "health" => Some(Action::Health),
            "balance" => Some(Action::Balance),
            "topup" => Some(Action::Topup),
            "cards" => Some(Action::Cards),
            "create_card" => Some(Action::CreateCard),
            "transfer" => Some(Action::Transfer),
            "activity" => Some(Action::Activity),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Health => "health",
            Action::Balance => "balance",
            Action::Topup => "topup",
            Action::Cards => "cards",
            Action::CreateCard => "create_card",
            Action::Transfer => "transfer",
            Action::Activity => "activity",
        }
    }

    /// Mutating actions only accept POST.
    pub fn requires_post(&self) -> bool {
        matches!(self, Action::Topup | Action::CreateCard | Action::Transfer)
    }
}

/// Query string accepted by the gateway endpoint.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActionQuery {
    /// One of `health`, `balance`, `topup`, `cards`, `create_card`,
    /// `transfer`, `activity`. Defaults to `health`.
    pub action: Option<String>,
    /// Ledger account for `balance` and `activity`.
    pub account_id: Option<String>,
    /// 1-based page for `cards` and `activity`.
    pub page_number: Option<String>,
    pub page_size: Option<String>,
}

impl ActionQuery {
    /// Parses a raw query string. Repeated keys keep their first value and
    /// unknown keys are ignored, so parsing never fails.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let mut query = Self::default();
        let Some(raw) = raw else {
            return query;
        };

        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            let slot = match key.as_ref() {
                "action" => &mut query.action,
                "account_id" => &mut query.account_id,
                "page_number" => &mut query.page_number,
                "page_size" => &mut query.page_size,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        query
    }
}

// ============ Money ============

/// Strictly positive amount, kept as the JSON number it will be forwarded as.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Amount(Number);

impl Amount {
    /// Accepts a JSON number or a numeric string. Zero, negative and
    /// non-finite values are rejected.
    pub fn parse(value: &Value) -> Option<Self> {
        let number = match value {
            Value::Number(n) => n.clone(),
            Value::String(s) => {
                let s = s.trim();
                if let Ok(i) = s.parse::<u64>() {
                    Number::from(i)
                } else {
                    s.parse::<f64>().ok().and_then(Number::from_f64)?
                }
            }
            _ => return None,
        };

        match number.as_f64() {
            Some(f) if f.is_finite() && f > 0.0 => Some(Amount(number)),
            _ => None,
        }
    }

    pub fn as_number(&self) -> &Number {
        &self.0
    }
}

/// `{ amount, currency }` pair sent to the ledger provider.
#[derive(Debug, Clone, Serialize)]
pub struct Money {
    pub amount: Amount,
    pub currency: &'static str,
}

impl Money {
    pub fn cop(amount: Amount) -> Self {
        Self {
            amount,
            currency: CURRENCY,
        }
    }
}

// ============ Inbound Bodies ============
//
// Fields are kept loose (`Value`) so that validation can report the first
// missing or invalid field by name instead of a generic decode failure.

/// Body of `POST ?action=topup`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TopupBody {
    #[schema(value_type = Option<String>, example = "lacc_031q0qwVGDHDmuwSnczysf")]
    pub account_id: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub amount: Option<Value>,
    /// Idempotency token; generated when absent.
    #[schema(value_type = Option<String>)]
    pub external_id: Option<Value>,
}

/// Body of `POST ?action=transfer`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TransferBody {
    #[schema(value_type = Option<String>)]
    pub payer_account_id: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub receiving_account_id: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub amount: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub external_id: Option<Value>,
    #[schema(value_type = Option<String>, example = "Transfer")]
    pub description: Option<Value>,
}

/// Body of `POST ?action=create_card`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateCardBody {
    #[schema(value_type = Option<String>, example = "ccg_02zKnMXeCB3eYDFHxTHe9j")]
    pub configuration_group_id: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub account_id: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub cardholder: Option<Value>,
    #[schema(value_type = Option<String>)]
    pub nickname: Option<Value>,
}

/// Body fields read by `balance` and `activity` when the query lacks them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountBody {
    pub account_id: Option<Value>,
}

// ============ Upstream Payloads ============

/// `POST /v1/ledger/accounts/{id}/balance`
#[derive(Debug, Clone, Serialize)]
pub struct BalanceOperationPayload {
    pub amount: Money,
    pub operation: &'static str,
    pub external_id: String,
}

/// `POST /v1/ledger/transfers`
#[derive(Debug, Clone, Serialize)]
pub struct TransferPayload {
    pub payer_account_id: String,
    pub receiving_account_id: String,
    pub source_amount: Money,
    pub external_id: String,
    pub description: String,
}

/// `POST /v1/ledger/cards`
#[derive(Debug, Clone, Serialize)]
pub struct CreateCardPayload {
    pub configuration_group_id: String,
    pub account_id: String,
    pub cardholder: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

// ============ Normalized Responses ============

/// Reshaped `balance` response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BalanceSummary {
    pub account_id: String,
    #[schema(value_type = Option<Object>)]
    pub pending: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub available: Option<Value>,
    #[schema(value_type = f64)]
    pub available_amount: Value,
    pub currency: String,
}

impl BalanceSummary {
    /// Builds the summary from the provider's balances payload.
    pub fn from_upstream(account_id: String, balances: &Value) -> Self {
        let available = balances.get("available").filter(|v| !v.is_null()).cloned();
        let available_amount = available
            .as_ref()
            .and_then(|a| a.get("amount"))
            .filter(|v| !v.is_null())
            .cloned()
            .unwrap_or_else(|| Value::from(0));
        let currency = available
            .as_ref()
            .and_then(|a| a.get("currency"))
            .and_then(|c| c.as_str())
            .unwrap_or(CURRENCY)
            .to_string();

        Self {
            account_id,
            pending: balances.get("pending").filter(|v| !v.is_null()).cloned(),
            available,
            available_amount,
            currency,
        }
    }
}

/// Reshaped `cards` response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CardsPage {
    #[schema(value_type = Option<Object>)]
    pub pagination: Option<Value>,
    #[schema(value_type = Vec<Object>)]
    pub cards: Vec<Value>,
}

impl CardsPage {
    pub fn from_upstream(payload: &Value) -> Self {
        Self {
            pagination: payload.get("pagination").filter(|v| !v.is_null()).cloned(),
            cards: payload
                .get("cards")
                .and_then(|c| c.as_array())
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// Error envelope produced by the gateway itself.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

// ============ Client-side Records ============

/// Card as shown by the wallet, mirrored into local storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub card_type: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub last_four: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
}

/// Saved address-book entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub name: String,
    pub account_id: String,
}

/// Direction of an activity row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sign {
    #[serde(rename = "+")]
    Credit,
    #[serde(rename = "-")]
    Debit,
}

impl Sign {
    pub fn symbol(&self) -> &'static str {
        match self {
            Sign::Credit => "+",
            Sign::Debit => "-",
        }
    }
}

/// One line of the activity feed: a seeded entry or a normalized operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRow {
    pub title: String,
    pub sub: String,
    /// RFC 3339 timestamp.
    pub time: String,
    /// Unsigned magnitude, as a decimal string.
    pub amount: String,
    pub sign: Sign,
    #[serde(default)]
    pub badge: Option<String>,
    /// Operation id when the row came from the ledger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
}

impl ActivityRow {
    /// Card rows are badged `VISA` or carry "card" in their subtitle.
    pub fn is_card(&self) -> bool {
        self.badge
            .as_deref()
            .map(|b| b.trim().eq_ignore_ascii_case("visa"))
            .unwrap_or(false)
            || self.sub.to_lowercase().contains("card")
    }
}
