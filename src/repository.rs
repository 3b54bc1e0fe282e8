use crate::errors::AppError;
use crate::local_store::LocalStore;
use crate::models::{ActivityRow, CardRecord, Recipient};
use bigdecimal::BigDecimal;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use std::str::FromStr;

pub const SEEDED_KEY: &str = "mono_demo_seeded";
pub const DEMO_CARDS_KEY: &str = "mono_demo_cards";
pub const ACTIVITY_SEED_KEY: &str = "mono_demo_activity_seed";
pub const DEMO_BALANCE_KEY: &str = "mono_demo_balance";
pub const ACTIVITY_LOG_KEY: &str = "mono_demo_activity";
pub const RECIPIENTS_KEY: &str = "mono_saved_recipients";
const LAST4_PREFIX: &str = "mono_last4_";

pub const ACTIVITY_LOG_LIMIT: usize = 80;
pub const DEMO_CARDS_LIMIT: usize = 30;
pub const RECIPIENTS_LIMIT: usize = 30;

/// Typed access to the wallet's locally persisted state.
///
/// Lists are stored newest-first; pushing beyond a list's limit evicts the
/// oldest entries.
pub struct WalletRepository<S: LocalStore> {
    store: S,
}

impl<S: LocalStore> WalletRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads a JSON list. Missing or undecodable values read as empty.
    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, AppError> {
        match self.store.get(key)? {
            None => Ok(Vec::new()),
            Some(raw) => Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Discarding undecodable value under {}: {}", key, e);
                Vec::new()
            })),
        }
    }

    fn write_list<T: Serialize>(&self, key: &str, list: &[T]) -> Result<(), AppError> {
        let raw = serde_json::to_string(list)
            .map_err(|e| AppError::Storage(format!("Failed to encode {}: {}", key, e)))?;
        self.store.set(key, raw)
    }

    fn push_front<T: Serialize + DeserializeOwned>(
        &self,
        key: &str,
        item: T,
        limit: usize,
    ) -> Result<(), AppError> {
        let mut list: Vec<T> = self.read_list(key)?;
        list.insert(0, item);
        list.truncate(limit);
        self.write_list(key, &list)
    }

    // ============ Demo seed ============

    pub fn is_seeded(&self) -> Result<bool, AppError> {
        Ok(self.store.get(SEEDED_KEY)?.as_deref() == Some("1"))
    }

    pub fn mark_seeded(&self) -> Result<(), AppError> {
        self.store.set(SEEDED_KEY, "1".to_string())
    }

    pub fn demo_cards(&self) -> Result<Vec<CardRecord>, AppError> {
        self.read_list(DEMO_CARDS_KEY)
    }

    pub fn set_demo_cards(&self, cards: &[CardRecord]) -> Result<(), AppError> {
        self.write_list(DEMO_CARDS_KEY, &cards[..cards.len().min(DEMO_CARDS_LIMIT)])
    }

    pub fn push_demo_card(&self, card: CardRecord) -> Result<(), AppError> {
        self.push_front(DEMO_CARDS_KEY, card, DEMO_CARDS_LIMIT)
    }

    pub fn activity_seed(&self) -> Result<Vec<ActivityRow>, AppError> {
        self.read_list(ACTIVITY_SEED_KEY)
    }

    pub fn set_activity_seed(&self, rows: &[ActivityRow]) -> Result<(), AppError> {
        self.write_list(ACTIVITY_SEED_KEY, rows)
    }

    pub fn demo_balance(&self) -> Result<Option<BigDecimal>, AppError> {
        Ok(self
            .store
            .get(DEMO_BALANCE_KEY)?
            .and_then(|raw| BigDecimal::from_str(raw.trim()).ok()))
    }

    pub fn set_demo_balance(&self, balance: &BigDecimal) -> Result<(), AppError> {
        self.store.set(DEMO_BALANCE_KEY, balance.to_string())
    }

    // ============ Real activity log ============

    pub fn activity_log(&self) -> Result<Vec<ActivityRow>, AppError> {
        self.read_list(ACTIVITY_LOG_KEY)
    }

    pub fn push_activity(&self, row: ActivityRow) -> Result<(), AppError> {
        self.push_front(ACTIVITY_LOG_KEY, row, ACTIVITY_LOG_LIMIT)
    }

    // ============ Recipients ============

    /// Stored address book; `None` when it has never been written.
    pub fn stored_recipients(&self) -> Result<Option<Vec<Recipient>>, AppError> {
        match self.store.get(RECIPIENTS_KEY)? {
            None => Ok(None),
            Some(_) => self.read_list(RECIPIENTS_KEY).map(Some),
        }
    }

    pub fn set_recipients(&self, recipients: &[Recipient]) -> Result<(), AppError> {
        self.write_list(
            RECIPIENTS_KEY,
            &recipients[..recipients.len().min(RECIPIENTS_LIMIT)],
        )
    }

    // ============ Pseudo last-4 digits ============

    /// Four display digits for an identifier, derived on first use and cached
    /// so the same id always shows the same digits.
    pub fn last4(&self, id: &str) -> Result<String, AppError> {
        let key = format!("{}{}", LAST4_PREFIX, id);
        if let Some(saved) = self.store.get(&key)?.filter(|s| !s.is_empty()) {
            return Ok(saved);
        }
        let digits = derive_last4(id);
        self.store.set(&key, digits.clone())?;
        Ok(digits)
    }
}

/// Four digits in `1000..=9999` taken from the SHA-256 of the id.
pub fn derive_last4(id: &str) -> String {
    let digest = Sha256::digest(id.as_bytes());
    let n = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    (1000 + n % 9000).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local_store::MemoryStore;
    use crate::models::Sign;

    fn row(title: &str) -> ActivityRow {
        ActivityRow {
            title: title.to_string(),
            sub: "Wallet".to_string(),
            time: "2025-11-20T10:00:00Z".to_string(),
            amount: "1000".to_string(),
            sign: Sign::Credit,
            badge: None,
            operation_id: None,
        }
    }

    #[test]
    fn test_activity_log_is_newest_first_and_capped() {
        let repo = WalletRepository::new(MemoryStore::new());
        for i in 0..(ACTIVITY_LOG_LIMIT + 5) {
            repo.push_activity(row(&format!("op {}", i))).unwrap();
        }
        let log = repo.activity_log().unwrap();
        assert_eq!(log.len(), ACTIVITY_LOG_LIMIT);
        assert_eq!(log[0].title, format!("op {}", ACTIVITY_LOG_LIMIT + 4));
        assert_eq!(log.last().unwrap().title, "op 5");
    }

    #[test]
    fn test_last4_is_stable_and_cached() {
        let repo = WalletRepository::new(MemoryStore::new());
        let first = repo.last4("lacc_A").unwrap();
        let second = repo.last4("lacc_A").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
        assert_eq!(
            repo.store().get("mono_last4_lacc_A").unwrap().as_deref(),
            Some(first.as_str())
        );
    }

    #[test]
    fn test_last4_prefers_cached_value() {
        let store = MemoryStore::new();
        store.set("mono_last4_lacc_A", "9780".to_string()).unwrap();
        let repo = WalletRepository::new(store);
        assert_eq!(repo.last4("lacc_A").unwrap(), "9780");
    }

    #[test]
    fn test_undecodable_list_reads_empty() {
        let store = MemoryStore::new();
        store.set(ACTIVITY_LOG_KEY, "{oops".to_string()).unwrap();
        let repo = WalletRepository::new(store);
        assert!(repo.activity_log().unwrap().is_empty());
    }

    #[test]
    fn test_demo_balance_roundtrip() {
        let repo = WalletRepository::new(MemoryStore::new());
        assert!(repo.demo_balance().unwrap().is_none());
        let balance = BigDecimal::from_str("328675.48").unwrap();
        repo.set_demo_balance(&balance).unwrap();
        assert_eq!(repo.demo_balance().unwrap(), Some(balance));
    }

    #[test]
    fn test_recipients_absent_until_written() {
        let repo = WalletRepository::new(MemoryStore::new());
        assert!(repo.stored_recipients().unwrap().is_none());
        repo.set_recipients(&[]).unwrap();
        assert_eq!(repo.stored_recipients().unwrap(), Some(Vec::new()));
    }
}
