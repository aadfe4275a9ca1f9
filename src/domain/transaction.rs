use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

/// Transaction ids are opaque strings. Fresh ids are UUIDv4, but ids restored
/// from storage may have any non-empty shape.
pub type TransactionId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money coming in (salary, freelance work, gifts...)
    Income,
    /// Money going out
    Expense,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "income" => Some(TransactionType::Income),
            "expense" => Some(TransactionType::Expense),
            _ => None,
        }
    }

    /// Apply the sign carried by the type to a positive amount.
    pub fn signed(&self, amount: Cents) -> Cents {
        match self {
            TransactionType::Income => amount,
            TransactionType::Expense => -amount,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionType::from_str(&s.to_lowercase())
            .ok_or_else(|| format!("unknown transaction type: {}", s))
    }
}

/// A single recorded income or expense event.
/// The amount is always stored positive; the sign lives in `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Amount in cents
    pub amount_cents: Cents,
    pub category: String,
    pub description: Option<String>,
    /// When the transaction was recorded
    pub date: DateTime<Utc>,
}

impl Transaction {
    /// Create a validated transaction with a fresh id, timestamped now.
    pub fn new(
        kind: TransactionType,
        amount_cents: Cents,
        category: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if amount_cents <= 0 {
            return Err(ValidationError::NonPositiveAmount);
        }
        let category = category.into().trim().to_string();
        if category.is_empty() {
            return Err(ValidationError::MissingCategory);
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            kind,
            amount_cents,
            category,
            description: None,
            date: Utc::now(),
        })
    }

    /// Attach a description. Blank descriptions are treated as absent.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self
    }

    /// Signed effect of this transaction on the balance.
    pub fn signed_amount(&self) -> Cents {
        self.kind.signed(self.amount_cents)
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }

    /// Records that fail this check are never written back to storage.
    pub fn is_persistable(&self) -> bool {
        !self.id.is_empty() && !self.category.trim().is_empty()
    }
}

/// Rejections raised before any state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NonPositiveAmount,
    MissingCategory,
    /// Applying the amount would push the balance outside the cent range
    BalanceOverflow,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::NonPositiveAmount => write!(f, "amount must be positive"),
            ValidationError::MissingCategory => write!(f, "category required"),
            ValidationError::BalanceOverflow => write!(f, "balance out of range"),
        }
    }
}

impl std::error::Error for ValidationError {}
