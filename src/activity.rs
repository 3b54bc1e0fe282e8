use crate::display;
use crate::models::{ActivityRow, Sign};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use serde_json::Value;
use std::str::FromStr;

/// First field that is present and truthy (non-null, non-empty, non-zero).
fn first_present<'a>(op: &'a Value, fields: &[&str]) -> Option<&'a Value> {
    fields.iter().filter_map(|f| op.get(*f)).find(|v| match v {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        _ => true,
    })
}

fn first_str(op: &Value, fields: &[&str]) -> Option<String> {
    first_present(op, fields).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn decimal_of(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Number(n) => BigDecimal::from_str(&n.to_string()).ok(),
        Value::String(s) => BigDecimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Turns a ledger operation (topup or transfer) into an activity row.
///
/// The amount comes from `amount`, `source_amount` or `target_amount`, each
/// either a money object or a bare number. Transfers of type
/// `account_to_account` paid by `primary_account` to another account are
/// debits; everything else is a credit. Returns `None` for non-objects.
pub fn normalize_operation(
    op: &Value,
    primary_account: &str,
    now: DateTime<Utc>,
) -> Option<ActivityRow> {
    if !op.is_object() {
        return None;
    }

    let amount = first_present(op, &["amount", "source_amount", "target_amount"])
        .and_then(|v| match v {
            Value::Object(_) => v.get("amount").and_then(decimal_of),
            other => decimal_of(other),
        })
        .unwrap_or_else(|| BigDecimal::from(0));

    let operation = op.get("operation").and_then(|v| v.as_str());
    let is_transfer_out = op.get("operation_type").and_then(|v| v.as_str())
        == Some("account_to_account")
        && op.get("payer_account_id").and_then(|v| v.as_str()) == Some(primary_account)
        && op.get("receiving_account_id").and_then(|v| v.as_str()) != Some(primary_account);

    let sign = if operation == Some("topup") || !is_transfer_out {
        Sign::Credit
    } else {
        Sign::Debit
    };

    Some(ActivityRow {
        title: first_str(op, &["description", "operation_type", "operation"])
            .unwrap_or_else(|| "Operation".to_string()),
        sub: "Wallet".to_string(),
        time: first_str(op, &["inserted_at", "created_at"]).unwrap_or_else(|| now.to_rfc3339()),
        amount: amount.abs().to_string(),
        sign,
        badge: Some(" ".to_string()),
        operation_id: first_str(op, &["id", "transaction_id"]),
    })
}

/// Fake history shown in demo mode, timestamped relative to `now`.
pub fn demo_seed_rows(now: DateTime<Utc>) -> Vec<ActivityRow> {
    let entry = |title: &str, sub: &str, minutes_ago: i64, amount: &str, sign: Sign, badge: &str| {
        ActivityRow {
            title: title.to_string(),
            sub: sub.to_string(),
            time: (now - Duration::minutes(minutes_ago)).to_rfc3339(),
            amount: amount.to_string(),
            sign,
            badge: Some(badge.to_string()),
            operation_id: None,
        }
    };

    vec![
        entry("Compra en SP+AFF* THERMCANADA", "Card transaction", 30, "108641.94", Sign::Debit, "VISA"),
        entry("Compra en SP VESSI-FOOTWEAR-CA", "Card transaction", 90, "792833.36", Sign::Debit, "VISA"),
        entry("Oncall Q32025", "Wallet", 6 * 60, "801540.00", Sign::Credit, " "),
        entry("Nomina Noviembre", "Wallet", 20 * 60, "200000.00", Sign::Credit, " "),
        entry("Nomina Octubre", "Wallet", 44 * 60, "200000.00", Sign::Credit, " "),
        entry("Transferencia entre billeteras", "Wallet", 70 * 60, "48500.00", Sign::Debit, " "),
    ]
}

/// Display-ready activity line.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    pub title: String,
    pub sub: String,
    /// `02:05:09 PM`
    pub time_of_day: String,
    /// `- $ 108.641,94`
    pub amount_text: String,
    pub sign: Sign,
    pub is_card: bool,
}

/// Rows sharing one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    /// `Monday, January 6, 2025`
    pub day: String,
    pub entries: Vec<ActivityEntry>,
}

fn row_time(row: &ActivityRow, offset: &FixedOffset, now: DateTime<Utc>) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(&row.time)
        .map(|t| t.with_timezone(offset))
        .unwrap_or_else(|_| now.with_timezone(offset))
}

/// Groups rows by calendar day in `offset`, keeping the order in which days
/// first appear. Rows with unparseable times are placed at `now`.
pub fn group_by_day(
    rows: &[ActivityRow],
    offset: &FixedOffset,
    now: DateTime<Utc>,
) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = Vec::new();

    for row in rows {
        let time = row_time(row, offset, now);
        let day = display::day_label(&time);
        let amount = BigDecimal::from_str(&row.amount)
            .unwrap_or_else(|_| BigDecimal::from(0))
            .abs();

        let entry = ActivityEntry {
            title: row.title.clone(),
            sub: row.sub.clone(),
            time_of_day: display::time_of_day(&time),
            amount_text: format!("{} {}", row.sign.symbol(), display::format_cop(&amount, 2)),
            sign: row.sign,
            is_card: row.is_card(),
        };

        match groups.iter_mut().find(|g| g.day == day) {
            Some(group) => group.entries.push(entry),
            None => groups.push(DayGroup {
                day,
                entries: vec![entry],
            }),
        }
    }

    groups
}
