//! Text formatting for the wallet views.

use crate::models::CardRecord;
use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, FixedOffset};

/// Formats a COP amount the way `es-CO` locales do: `$ 1.234.567,89`.
/// Halves round away from zero.
pub fn format_cop(amount: &BigDecimal, decimals: u32) -> String {
    let scale = i64::from(decimals);
    let rounded = amount.with_scale_round(scale, RoundingMode::HalfUp);
    let negative = rounded < BigDecimal::from(0);
    let text = rounded.abs().to_string();

    let (integer, fraction) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (text, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    match fraction {
        Some(f) if decimals > 0 => format!("{}$ {},{}", sign, grouped, f),
        _ => format!("{}$ {}", sign, grouped),
    }
}

/// `••••1234`
pub fn mask_digits(last4: &str) -> String {
    format!("••••{}", last4)
}

/// `Monday, January 6, 2025`
pub fn day_label(time: &DateTime<FixedOffset>) -> String {
    time.format("%A, %B %-d, %Y").to_string()
}

/// `02:05:09 PM`
pub fn time_of_day(time: &DateTime<FixedOffset>) -> String {
    time.format("%I:%M:%S %p").to_string()
}

/// `01/06/2025, 02:05:09 PM`
pub fn date_time(time: &DateTime<FixedOffset>) -> String {
    time.format("%m/%d/%Y, %I:%M:%S %p").to_string()
}

/// Card as listed in the wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct CardView {
    pub id: String,
    /// `Virtual ****2251`
    pub title: String,
    /// `Virtual • active`
    pub subtitle: String,
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl CardView {
    /// `fallback_last4` is used when the card carries no `last_four`.
    pub fn new(card: &CardRecord, fallback_last4: &str) -> Self {
        let type_label = if card.card_type.is_empty() {
            "Card".to_string()
        } else {
            capitalize(&card.card_type)
        };
        let last4 = card
            .last_four
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(fallback_last4);
        let state = card.state.as_deref().unwrap_or("active");

        Self {
            id: card.id.clone(),
            title: format!("{} ****{}", type_label, last4),
            subtitle: format!("{} • {}", type_label, state),
        }
    }
}
