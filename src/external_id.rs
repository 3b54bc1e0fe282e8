//! Idempotency tokens for mutating ledger calls.
//!
//! Tokens only give the provider something to de-duplicate on; nothing here
//! verifies that the provider actually honours them.

use chrono::Utc;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generates `ext_<unix-millis>_<digits>`.
///
/// The numeric suffix is a random prefix followed by three digits of a
/// process-wide counter, so consecutive tokens from one process always differ
/// even within the same millisecond.
pub fn generate() -> String {
    let millis = Utc::now().timestamp_millis();
    let random: u64 = rand::thread_rng().gen_range(0..1_000_000);
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed) % 1_000;
    format!("ext_{}_{}", millis, random * 1_000 + seq)
}

/// Returns the caller's token when it is a non-empty string or a number,
/// otherwise a freshly generated one.
pub fn or_generate(supplied: Option<&serde_json::Value>) -> String {
    match supplied {
        Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => generate(),
    }
}
