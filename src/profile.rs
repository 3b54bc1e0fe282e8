use crate::errors::AppError;
use bigdecimal::BigDecimal;
use chrono::{FixedOffset, Local, Offset};
use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;

/// Card program offered in the create-card form.
#[derive(Debug, Clone, PartialEq)]
pub struct CardProgram {
    pub id: String,
    pub label: String,
}

/// The single demo tenant the wallet runs as.
#[derive(Debug, Clone)]
pub struct WalletProfile {
    pub user_name: String,
    /// Account the wallet pays from and shows the balance of.
    pub primary_account: String,
    /// Default transfer destination.
    pub secondary_account: String,
    pub default_topup: BigDecimal,
    pub default_send: BigDecimal,
    pub card_programs: Vec<CardProgram>,
    /// Offset used to place activity on calendar days.
    pub utc_offset: FixedOffset,
}

impl Default for WalletProfile {
    fn default() -> Self {
        Self {
            user_name: "Valentina".to_string(),
            primary_account: "lacc_031q0qwVGDHDmuwSnczysf".to_string(),
            secondary_account: "lacc_031ptmr1teoDl643nvdBQk".to_string(),
            default_topup: BigDecimal::from(50_000),
            default_send: BigDecimal::from(10_000),
            card_programs: vec![CardProgram {
                id: "ccg_02zKnMXeCB3eYDFHxTHe9j".to_string(),
                label: "Sandbox default program".to_string(),
            }],
            utc_offset: Local::now().offset().fix(),
        }
    }
}

fn card_program_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^ccg_[A-Za-z0-9]+$").expect("valid card program regex"))
}

impl WalletProfile {
    /// Defaults overridden by `WALLET_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut profile = Self::default();

        if let Some(name) = env_non_empty("WALLET_USER_NAME") {
            profile.user_name = name;
        }
        if let Some(account) = env_non_empty("WALLET_PRIMARY_ACCOUNT") {
            profile.primary_account = account;
        }
        if let Some(account) = env_non_empty("WALLET_SECONDARY_ACCOUNT") {
            profile.secondary_account = account;
        }
        if let Some(amount) = env_non_empty("WALLET_DEFAULT_TOPUP") {
            profile.default_topup = BigDecimal::from_str(&amount)
                .map_err(|_| anyhow::anyhow!("WALLET_DEFAULT_TOPUP must be a decimal number"))?;
        }
        if let Some(amount) = env_non_empty("WALLET_DEFAULT_SEND") {
            profile.default_send = BigDecimal::from_str(&amount)
                .map_err(|_| anyhow::anyhow!("WALLET_DEFAULT_SEND must be a decimal number"))?;
        }

        if profile.primary_account == profile.secondary_account {
            anyhow::bail!("WALLET_PRIMARY_ACCOUNT and WALLET_SECONDARY_ACCOUNT must differ");
        }

        tracing::debug!(
            "Wallet profile: user {}, primary {}, secondary {}",
            profile.user_name,
            profile.primary_account,
            profile.secondary_account
        );
        Ok(profile)
    }

    /// Resolves the card program to create a card under.
    ///
    /// `None` picks the first configured program; a configured id is used
    /// as-is; anything else must look like a custom `ccg_…` id.
    pub fn resolve_card_program(&self, selection: Option<&str>) -> Result<String, AppError> {
        let selection = selection.map(str::trim).filter(|s| !s.is_empty());
        match selection {
            None => self
                .card_programs
                .first()
                .map(|p| p.id.clone())
                .ok_or_else(|| {
                    AppError::BadRequest("Please select a card program (ccg_...)".to_string())
                }),
            Some(id) if self.card_programs.iter().any(|p| p.id == id) => Ok(id.to_string()),
            Some(id) if card_program_pattern().is_match(id) => Ok(id.to_string()),
            Some(id) => Err(AppError::BadRequest(format!(
                "Card program ids look like ccg_..., got {}",
                id
            ))),
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Behaviour switches that replace the duplicated client variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewModelOptions {
    /// Render balance, cards and activity from local demo data layered with
    /// real operation results instead of live ledger reads.
    pub demo_mode: bool,
    /// Write the demo seed on first load.
    pub seed_on_first_load: bool,
}

impl Default for ViewModelOptions {
    fn default() -> Self {
        Self {
            demo_mode: true,
            seed_on_first_load: true,
        }
    }
}

impl ViewModelOptions {
    /// Live ledger reads, no seeding.
    pub fn live() -> Self {
        Self {
            demo_mode: false,
            seed_on_first_load: false,
        }
    }
}
