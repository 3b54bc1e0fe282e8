//! Wallet view-model: turns gateway results and local state into
//! display-ready data, and records successful operations locally.
//!
//! Local balance and activity updates are applied after each successful
//! mutating call and are never reconciled against a later authoritative
//! balance read.

use crate::activity::{self, DayGroup};
use crate::display::{self, CardView};
use crate::errors::AppError;
use crate::local_store::LocalStore;
use crate::models::{ActivityRow, CardRecord, Recipient};
use crate::profile::{ViewModelOptions, WalletProfile};
use crate::repository::{derive_last4, WalletRepository, RECIPIENTS_LIMIT};
use crate::wallet_client::WalletClient;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde_json::{json, Number, Value};
use std::str::FromStr;

/// Balance shown before anything has been stored in demo mode.
const DEMO_START_BALANCE: &str = "328675.48";

const DASHBOARD_CARDS: usize = 3;
const DASHBOARD_ACTIVITY: usize = 5;

/// Everything the home screen shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    /// `Hello, Valentina!`
    pub greeting: String,
    pub account_mask: String,
    pub balance: BigDecimal,
    pub balance_text: String,
    pub cards: Vec<CardView>,
    pub activity: Vec<DayGroup>,
}

/// Summary shown after a successful transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    /// `COP -$ 10.000,00`
    pub amount_text: String,
    pub date: String,
    pub message: String,
    pub recipient_name: String,
    pub account_mask: String,
    pub transaction_id: String,
    pub status: String,
}

/// Preview of a pending transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferPreview {
    pub amount_text: String,
    pub recipient_name: String,
    pub recipient_mask: String,
}

pub struct WalletViewModel<S: LocalStore> {
    client: WalletClient,
    repo: WalletRepository<S>,
    profile: WalletProfile,
    options: ViewModelOptions,
}

fn to_json_number(amount: &BigDecimal) -> Result<Value, AppError> {
    Number::from_str(&amount.to_string())
        .map(Value::Number)
        .map_err(|_| AppError::BadRequest("Invalid amount".to_string()))
}

fn require_positive(amount: &BigDecimal) -> Result<(), AppError> {
    if *amount <= BigDecimal::from(0) {
        return Err(AppError::BadRequest("Invalid amount".to_string()));
    }
    Ok(())
}

impl<S: LocalStore> WalletViewModel<S> {
    pub fn new(
        client: WalletClient,
        store: S,
        profile: WalletProfile,
        options: ViewModelOptions,
    ) -> Self {
        Self {
            client,
            repo: WalletRepository::new(store),
            profile,
            options,
        }
    }

    pub fn repository(&self) -> &WalletRepository<S> {
        &self.repo
    }

    pub fn profile(&self) -> &WalletProfile {
        &self.profile
    }

    // ============ Seeding ============

    /// Writes demo cards, activity and balance the first time it runs.
    /// Returns whether anything was written.
    pub fn seed_demo_data_once(&self) -> Result<bool, AppError> {
        if !self.options.demo_mode || !self.options.seed_on_first_load {
            return Ok(false);
        }
        if self.repo.is_seeded()? {
            return Ok(false);
        }

        let primary = Some(self.profile.primary_account.clone());
        let card = |id: &str, card_type: &str, last_four: &str| CardRecord {
            id: id.to_string(),
            card_type: card_type.to_string(),
            state: Some("active".to_string()),
            nickname: None,
            last_four: Some(last_four.to_string()),
            account_id: primary.clone(),
        };
        self.repo.set_demo_cards(&[
            card("demo_car_1", "physical", "2044"),
            card("demo_car_2", "virtual", "2251"),
            card("demo_car_3", "virtual", "0957"),
        ])?;
        self.repo
            .set_activity_seed(&activity::demo_seed_rows(Utc::now()))?;
        self.repo
            .set_demo_balance(&BigDecimal::from_str(DEMO_START_BALANCE).unwrap_or_default())?;
        self.repo.last4(&self.profile.primary_account)?;
        self.repo.mark_seeded()?;

        tracing::info!("Seeded demo wallet data");
        Ok(true)
    }

    // ============ Reads ============

    fn demo_balance(&self) -> Result<BigDecimal, AppError> {
        Ok(self
            .repo
            .demo_balance()?
            .unwrap_or_else(|| BigDecimal::from_str(DEMO_START_BALANCE).unwrap_or_default()))
    }

    async fn load_cards(&self, page_size: u32) -> Result<Vec<CardRecord>, AppError> {
        if self.options.demo_mode {
            return self.repo.demo_cards();
        }

        let page = self.client.cards(1, page_size).await?;
        let cards = page
            .get("cards")
            .and_then(|c| c.as_array())
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter_map(|c| serde_json::from_value::<CardRecord>(c).ok())
            .filter(|c| c.account_id.as_deref() == Some(self.profile.primary_account.as_str()))
            .collect();
        Ok(cards)
    }

    fn card_views(&self, cards: &[CardRecord]) -> Result<Vec<CardView>, AppError> {
        cards
            .iter()
            .map(|card| {
                let fallback = match card.last_four.as_deref().filter(|s| !s.is_empty()) {
                    Some(_) => String::new(),
                    None => self.repo.last4(&card.id)?,
                };
                Ok(CardView::new(card, &fallback))
            })
            .collect()
    }

    fn activity_rows(&self) -> Result<Vec<ActivityRow>, AppError> {
        let mut rows = self.repo.activity_log()?;
        if self.options.demo_mode {
            rows.extend(self.repo.activity_seed()?);
        }
        Ok(rows)
    }

    /// Home screen: greeting, masked account, balance, up to 3 cards and up
    /// to 5 activity rows.
    pub async fn dashboard(&self) -> Result<Dashboard, AppError> {
        self.seed_demo_data_once()?;

        let (balance, balance_text) = if self.options.demo_mode {
            let balance = self.demo_balance()?;
            let text = display::format_cop(&balance, 2);
            (balance, text)
        } else {
            let summary = self.client.balance(&self.profile.primary_account).await?;
            let balance = summary
                .get("available_amount")
                .and_then(|v| match v {
                    Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
                    Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
                    _ => None,
                })
                .unwrap_or_else(|| BigDecimal::from(0));
            let text = display::format_cop(&balance, 0);
            (balance, text)
        };

        let cards = self.load_cards(10).await?;
        let shown_cards = &cards[..cards.len().min(DASHBOARD_CARDS)];

        let rows = self.activity_rows()?;
        let shown_rows = &rows[..rows.len().min(DASHBOARD_ACTIVITY)];

        Ok(Dashboard {
            greeting: format!("Hello, {}!", self.profile.user_name),
            account_mask: self.mask(&self.profile.primary_account)?,
            balance,
            balance_text,
            cards: self.card_views(shown_cards)?,
            activity: activity::group_by_day(shown_rows, &self.profile.utc_offset, Utc::now()),
        })
    }

    /// Full activity feed grouped by day.
    pub fn activity_feed(&self) -> Result<Vec<DayGroup>, AppError> {
        let rows = self.activity_rows()?;
        Ok(activity::group_by_day(
            &rows,
            &self.profile.utc_offset,
            Utc::now(),
        ))
    }

    /// Full card list.
    pub async fn cards(&self) -> Result<Vec<CardView>, AppError> {
        let cards = self.load_cards(20).await?;
        self.card_views(&cards)
    }

    /// `••••1234` for any identifier.
    pub fn mask(&self, id: &str) -> Result<String, AppError> {
        Ok(display::mask_digits(&self.repo.last4(id)?))
    }

    // ============ Recipients ============

    /// Saved recipients; the first read seeds two entries pointing at the
    /// secondary account.
    pub fn recipients(&self) -> Result<Vec<Recipient>, AppError> {
        if let Some(list) = self.repo.stored_recipients()? {
            return Ok(list);
        }

        let defaults = vec![
            Recipient {
                id: "mom".to_string(),
                name: "Mamá".to_string(),
                account_id: self.profile.secondary_account.clone(),
            },
            Recipient {
                id: "accb".to_string(),
                name: "Account B".to_string(),
                account_id: self.profile.secondary_account.clone(),
            },
        ];
        self.repo.set_recipients(&defaults)?;
        Ok(defaults)
    }

    /// Adds or replaces a recipient. An entry with the same account id or the
    /// same name (case-insensitive) is replaced in place; otherwise the new
    /// one goes first.
    pub fn save_recipient(&self, name: &str, account_id: &str) -> Result<Recipient, AppError> {
        let account_id = account_id.trim();
        if account_id.is_empty() {
            return Err(AppError::BadRequest(
                "Missing account_id to save recipient".to_string(),
            ));
        }
        let name = match name.trim() {
            "" => "Recipient",
            trimmed => trimmed,
        };

        let item = Recipient {
            id: format!("r_{}", Utc::now().timestamp_millis()),
            name: name.to_string(),
            account_id: account_id.to_string(),
        };

        let mut list = self.recipients()?;
        let existing = list.iter().position(|r| {
            r.account_id == item.account_id || r.name.to_lowercase() == item.name.to_lowercase()
        });
        match existing {
            Some(idx) => list[idx] = item.clone(),
            None => list.insert(0, item.clone()),
        }
        list.truncate(RECIPIENTS_LIMIT);
        self.repo.set_recipients(&list)?;

        tracing::info!("Saved recipient {}", item.name);
        Ok(item)
    }

    fn recipient_name(&self, account_id: &str) -> Result<String, AppError> {
        Ok(self
            .recipients()?
            .into_iter()
            .find(|r| r.account_id == account_id)
            .map(|r| r.name)
            .unwrap_or_else(|| "Recipient".to_string()))
    }

    /// Confirmation card for a transfer about to be sent.
    pub fn confirm_transfer(
        &self,
        receiving_account_id: Option<&str>,
        amount: Option<&BigDecimal>,
    ) -> Result<TransferPreview, AppError> {
        let receiving = receiving_account_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(self.profile.secondary_account.as_str());
        let amount = amount.unwrap_or(&self.profile.default_send);

        Ok(TransferPreview {
            amount_text: display::format_cop(amount, 0),
            recipient_name: self.recipient_name(receiving)?,
            recipient_mask: self.mask(receiving)?,
        })
    }

    // ============ Mutations ============

    /// Local bookkeeping after the ledger accepted an operation. Failures are
    /// logged and swallowed: the operation already happened upstream.
    fn keep_local(&self, what: &str, result: Result<(), AppError>) {
        if let Err(e) = result {
            tracing::warn!("Could not record {} locally: {}", what, e);
        }
    }

    fn mask_or_derived(&self, id: &str) -> String {
        self.mask(id).unwrap_or_else(|e| {
            tracing::warn!("Could not cache display digits for {}: {}", id, e);
            display::mask_digits(&derive_last4(id))
        })
    }

    fn record_operation(&self, op: &Value, now: DateTime<Utc>) -> Result<(), AppError> {
        match activity::normalize_operation(op, &self.profile.primary_account, now) {
            Some(row) => self.repo.push_activity(row),
            None => {
                tracing::warn!("Ledger returned a non-object operation; not logged");
                Ok(())
            }
        }
    }

    fn adjust_demo_balance(&self, delta: BigDecimal) -> Result<(), AppError> {
        if !self.options.demo_mode {
            return Ok(());
        }
        let current = self.repo.demo_balance()?.unwrap_or_else(|| BigDecimal::from(0));
        self.repo.set_demo_balance(&(current + delta))
    }

    /// Tops up the primary account (default amount from the profile).
    pub async fn topup(&self, amount: Option<BigDecimal>) -> Result<Value, AppError> {
        let amount = amount.unwrap_or_else(|| self.profile.default_topup.clone());
        require_positive(&amount)?;

        let body = json!({
            "account_id": self.profile.primary_account,
            "amount": to_json_number(&amount)?,
            "external_id": uuid::Uuid::new_v4().to_string(),
        });
        let op = self.client.topup(&body).await?;

        self.keep_local("topup", self.record_operation(&op, Utc::now()));
        self.keep_local("demo balance", self.adjust_demo_balance(amount));

        tracing::info!("Topup success");
        Ok(op)
    }

    /// Sends money from the primary account.
    pub async fn send_money(
        &self,
        receiving_account_id: &str,
        amount: &BigDecimal,
        description: Option<&str>,
    ) -> Result<Receipt, AppError> {
        require_positive(amount)?;
        let receiving = receiving_account_id.trim();
        if receiving.is_empty() {
            return Err(AppError::BadRequest("Missing receiving account".to_string()));
        }
        let description = description
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("Transfer XYZ");

        let body = json!({
            "payer_account_id": self.profile.primary_account,
            "receiving_account_id": receiving,
            "amount": to_json_number(amount)?,
            "external_id": uuid::Uuid::new_v4().to_string(),
            "description": description,
        });
        let op = self.client.transfer(&body).await?;

        let now = Utc::now();
        self.keep_local("transfer", self.record_operation(&op, now));
        self.keep_local("demo balance", self.adjust_demo_balance(-amount.clone()));

        let transaction_id = ["id", "transaction_id"]
            .iter()
            .filter_map(|f| op.get(*f))
            .find_map(|v| match v {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| "—".to_string());

        tracing::info!("Transfer success ({})", transaction_id);
        Ok(Receipt {
            amount_text: format!("COP {}", display::format_cop(&-amount.abs(), 2)),
            date: display::date_time(&now.with_timezone(&self.profile.utc_offset)),
            message: description.to_string(),
            recipient_name: self.recipient_name(receiving).unwrap_or_else(|e| {
                tracing::warn!("Could not read recipients: {}", e);
                "Recipient".to_string()
            }),
            account_mask: self.mask_or_derived(receiving),
            transaction_id,
            status: "Success".to_string(),
        })
    }

    /// Creates a virtual card on the primary account. In demo mode the card
    /// is also prepended to the local card list.
    pub async fn create_card(
        &self,
        program: Option<&str>,
        nickname: Option<&str>,
    ) -> Result<Value, AppError> {
        let configuration_group_id = self.profile.resolve_card_program(program)?;
        let nickname = nickname.map(str::trim).filter(|s| !s.is_empty());

        let body = json!({
            "configuration_group_id": configuration_group_id,
            "account_id": self.profile.primary_account,
            "nickname": nickname.unwrap_or(""),
            "cardholder": demo_cardholder(&self.profile.user_name),
        });
        let created = self.client.create_card(&body).await?;

        let created_id = ["id", "card_id"]
            .iter()
            .filter_map(|f| created.get(*f).and_then(|v| v.as_str()))
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("demo_{}", Utc::now().timestamp_millis()));
        let last4 = self.repo.last4(&created_id).unwrap_or_else(|e| {
            tracing::warn!("Could not cache display digits for {}: {}", created_id, e);
            derive_last4(&created_id)
        });

        if self.options.demo_mode {
            let card = CardRecord {
                id: created_id.clone(),
                card_type: "virtual".to_string(),
                state: Some("active".to_string()),
                nickname: Some(nickname.unwrap_or("Virtual").to_string()),
                last_four: Some(last4),
                account_id: Some(self.profile.primary_account.clone()),
            };
            self.keep_local("card", self.repo.push_demo_card(card));
        }

        tracing::info!("Card created ({})", created_id);
        Ok(created)
    }
}

/// Sandbox cardholder with a randomized email and document number.
pub fn demo_cardholder(first_name: &str) -> Value {
    let rand: u32 = rand::thread_rng().gen_range(0..1_000_000);
    json!({
        "birthdate": "1997-04-13",
        "email": format!("demo_{}@example.com", rand),
        "first_name": first_name,
        "last_name": "Giraldo",
        "nationality": "CO",
        "phone_number": "+573000000000",
        "document": {
            "country_code": "CO",
            "number": (1_000_000_000u64 + u64::from(rand)).to_string(),
            "person_type": "natural",
            "type": "CC"
        },
        "address": {
            "city": "Bogotá",
            "country": "CO",
            "line_1": "Calle 1 # 2-3",
            "line_2": "Apto 101",
            "state": "Cundinamarca",
            "zip_code": "110111"
        }
    })
}
