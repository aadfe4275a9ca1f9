//! Conversion between in-memory ledger state and the string values kept in
//! the key-value store.
//!
//! Stored data is treated as untrusted: every record is revalidated on the way
//! in, repairing what can be repaired and dropping what cannot.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::{
    Cents, Transaction, TransactionType, cents_from_units, cents_to_units, format_cents,
};

/// Wire shape of one persisted transaction.
#[derive(Debug, Serialize)]
struct TransactionRecord<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: TransactionType,
    amount: f64,
    category: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    date: String,
}

/// Outcome of revalidating a single stored record.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedRecord {
    /// Record was valid as stored
    Intact(Transaction),
    /// Record was kept after one or more fields were defaulted
    Repaired(Transaction),
    /// Record could not be salvaged
    Dropped(DropReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    NotAnObject,
    MissingId,
    MissingType,
    NonNumericAmount,
}

/// Result of decoding the whole stored transaction list.
#[derive(Debug, Default)]
pub struct DecodedTransactions {
    pub transactions: Vec<Transaction>,
    pub repaired: usize,
    pub dropped: Vec<DropReason>,
}

/// Parse the stored balance. Missing or unparsable values become zero.
pub fn decode_balance(raw: Option<&str>) -> Cents {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .and_then(cents_from_units)
        .unwrap_or(0)
}

pub fn encode_balance(balance: Cents) -> String {
    format_cents(balance)
}

/// Decode the stored transaction list, revalidating each record.
/// A value that is not a JSON array yields an error and is treated by callers
/// as an empty list.
pub fn decode_transactions(
    raw: &str,
    fallback_category: &str,
    now: DateTime<Utc>,
) -> Result<DecodedTransactions, serde_json::Error> {
    let value: Value = serde_json::from_str(raw)?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected an array of transactions, found {}",
                json_kind(&other)
            )));
        }
    };

    let mut decoded = DecodedTransactions::default();
    for item in &items {
        match decode_record(item, fallback_category, now) {
            DecodedRecord::Intact(tx) => decoded.transactions.push(tx),
            DecodedRecord::Repaired(tx) => {
                decoded.repaired += 1;
                decoded.transactions.push(tx);
            }
            DecodedRecord::Dropped(reason) => decoded.dropped.push(reason),
        }
    }
    Ok(decoded)
}

/// Revalidate one stored record.
pub fn decode_record(value: &Value, fallback_category: &str, now: DateTime<Utc>) -> DecodedRecord {
    let Some(obj) = value.as_object() else {
        return DecodedRecord::Dropped(DropReason::NotAnObject);
    };

    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return DecodedRecord::Dropped(DropReason::MissingId),
    };

    let mut repaired = false;

    let kind = match obj.get("type") {
        None | Some(Value::Null) => return DecodedRecord::Dropped(DropReason::MissingType),
        Some(value) => match value.as_str().and_then(TransactionType::from_str) {
            Some(kind) => kind,
            None => {
                repaired = true;
                TransactionType::Expense
            }
        },
    };

    let amount_cents = match decode_amount(obj) {
        Ok(Some(cents)) => cents,
        Ok(None) => {
            repaired = true;
            0
        }
        Err(reason) => return DecodedRecord::Dropped(reason),
    };

    let category = match non_blank_str(obj, "category") {
        Some(category) => category,
        None => {
            repaired = true;
            fallback_category.to_string()
        }
    };

    let description = non_blank_str(obj, "description");

    let date = match obj.get("date").and_then(parse_date) {
        Some(date) => date,
        None => {
            repaired = true;
            now
        }
    };

    let tx = Transaction {
        id,
        kind,
        amount_cents,
        category,
        description,
        date,
    };

    if repaired {
        DecodedRecord::Repaired(tx)
    } else {
        DecodedRecord::Intact(tx)
    }
}

/// `Ok(None)` means the amount must be defaulted to zero. A stored zero is
/// kept as is.
fn decode_amount(obj: &Map<String, Value>) -> Result<Option<Cents>, DropReason> {
    let units = match obj.get("amount") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64().ok_or(DropReason::NonNumericAmount)?,
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| DropReason::NonNumericAmount)?,
        Some(_) => return Err(DropReason::NonNumericAmount),
    };

    Ok(cents_from_units(units).filter(|cents| *cents >= 0))
}

fn non_blank_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accepts RFC 3339 timestamps, plain `YYYY-MM-DD` dates and epoch milliseconds.
fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                        .map(|dt| dt.and_utc())
                })
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Encode the transaction list for storage. Records that fail the
/// persistability check are left out of the written copy.
pub fn encode_transactions(transactions: &[Transaction]) -> Result<String, serde_json::Error> {
    let records: Vec<TransactionRecord<'_>> = transactions
        .iter()
        .filter(|tx| tx.is_persistable())
        .map(|tx| TransactionRecord {
            id: &tx.id,
            kind: tx.kind,
            amount: cents_to_units(tx.amount_cents),
            category: &tx.category,
            description: tx.description.as_deref(),
            date: tx.date.to_rfc3339_opts(SecondsFormat::Millis, true),
        })
        .collect();
    serde_json::to_string(&records)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
