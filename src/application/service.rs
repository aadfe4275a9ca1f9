use chrono::Utc;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::domain::{
    Cents, IncomeExpenseTotals, Transaction, TransactionType, ValidationError, apply_transaction,
    balance_drift, income_expense_totals,
};
use crate::storage::records::{
    decode_balance, decode_transactions, encode_balance, encode_transactions,
};
use crate::storage::{BALANCE_KEY, KeyValueStore, TRANSACTIONS_KEY};

use super::LedgerError;

/// Point-in-time copy of the ledger, published to subscribers after every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerSnapshot {
    pub balance: Cents,
    pub transactions: Vec<Transaction>,
}

/// What happened while restoring state from storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Transactions now held in memory
    pub restored: usize,
    /// Restored transactions that needed one or more fields defaulted
    pub repaired: usize,
    /// Stored records that were discarded
    pub dropped: usize,
    /// Set when the stored state could not be read at all and the ledger
    /// started empty
    pub failure: Option<String>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.repaired == 0 && self.dropped == 0 && self.failure.is_none()
    }
}

/// Owns the balance and transaction list and mirrors every change to a
/// key-value store.
///
/// The balance is tracked independently of the transaction history: adding a
/// transaction moves it, but [`LedgerService::set_initial_balance`] overwrites
/// it outright. Use [`LedgerService::balance_drift`] to see how far the two
/// have diverged.
///
/// Storage failures never roll back the in-memory change; they are returned
/// as [`LedgerError::Persistence`] so callers know memory is ahead of storage.
pub struct LedgerService<S> {
    store: S,
    fallback_category: String,
    balance: Cents,
    transactions: Vec<Transaction>,
    updates: watch::Sender<LedgerSnapshot>,
}

impl<S: KeyValueStore> LedgerService<S> {
    /// Create an empty ledger over `store` without reading from it.
    pub fn new(store: S, fallback_category: impl Into<String>) -> Self {
        let (updates, _) = watch::channel(LedgerSnapshot::default());
        Self {
            store,
            fallback_category: fallback_category.into(),
            balance: 0,
            transactions: Vec::new(),
            updates,
        }
    }

    /// Create a ledger over `store` and restore its persisted state.
    pub async fn open(store: S, fallback_category: impl Into<String>) -> (Self, LoadReport) {
        let mut service = Self::new(store, fallback_category);
        let report = service.load().await;
        (service, report)
    }

    // ========================
    // Reads
    // ========================

    pub fn balance(&self) -> Cents {
        self.balance
    }

    /// Transactions in insertion order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            balance: self.balance,
            transactions: self.transactions.clone(),
        }
    }

    /// Receive a fresh snapshot after every change to the ledger.
    pub fn subscribe(&self) -> watch::Receiver<LedgerSnapshot> {
        self.updates.subscribe()
    }

    pub fn totals(&self) -> IncomeExpenseTotals {
        income_expense_totals(&self.transactions)
    }

    /// Difference between the tracked balance and the sum of the transactions.
    pub fn balance_drift(&self) -> Cents {
        balance_drift(self.balance, &self.transactions)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ========================
    // Loading
    // ========================

    /// Replace in-memory state with what the store holds.
    /// Never fails: unreadable state is logged and the ledger starts empty.
    pub async fn load(&mut self) -> LoadReport {
        let mut report = LoadReport::default();

        match self.read_state(&mut report).await {
            Ok((balance, transactions)) => {
                self.balance = balance;
                self.transactions = transactions;
            }
            Err(err) => {
                error!(error = %err, "Failed to load ledger, starting empty");
                report.failure = Some(err.to_string());
                self.balance = 0;
                self.transactions.clear();
            }
        }
        report.restored = self.transactions.len();

        if report.repaired > 0 || report.dropped > 0 {
            warn!(
                repaired = report.repaired,
                dropped = report.dropped,
                "Stored transactions needed cleanup"
            );
        }
        info!(
            balance = self.balance,
            transactions = report.restored,
            "Ledger loaded"
        );

        self.publish();
        report
    }

    async fn read_state(
        &self,
        report: &mut LoadReport,
    ) -> Result<(Cents, Vec<Transaction>), LedgerError> {
        let raw_balance = self.store.get_item(BALANCE_KEY).await?;
        let raw_transactions = self.store.get_item(TRANSACTIONS_KEY).await?;

        let balance = decode_balance(raw_balance.as_deref());
        let transactions = match raw_transactions {
            Some(raw) => {
                let decoded = decode_transactions(&raw, &self.fallback_category, Utc::now())?;
                for reason in &decoded.dropped {
                    debug!(?reason, "Dropped stored transaction");
                }
                report.repaired = decoded.repaired;
                report.dropped = decoded.dropped.len();
                decoded.transactions
            }
            None => Vec::new(),
        };

        Ok((balance, transactions))
    }

    // ========================
    // Mutations
    // ========================

    /// Record a new transaction and move the balance by its signed amount.
    /// Validation happens before anything changes.
    pub async fn add_transaction(
        &mut self,
        kind: TransactionType,
        amount_cents: Cents,
        category: impl Into<String>,
        description: Option<String>,
    ) -> Result<Transaction, LedgerError> {
        let tx = Transaction::new(kind, amount_cents, category)?.with_description(description);
        let balance = apply_transaction(self.balance, &tx)?;

        self.transactions.push(tx.clone());
        self.balance = balance;
        debug!(
            id = %tx.id,
            kind = %tx.kind,
            amount = tx.amount_cents,
            category = %tx.category,
            "Recorded transaction"
        );

        self.publish();
        self.persist().await?;
        Ok(tx)
    }

    /// Overwrite the balance, independent of the transaction history.
    /// No sign check happens here; rejecting negative input is up to callers.
    pub async fn set_initial_balance(&mut self, amount: Cents) -> Result<(), LedgerError> {
        self.balance = amount;

        let drift = self.balance_drift();
        if !self.transactions.is_empty() && drift != 0 {
            warn!(
                balance = amount,
                drift, "Balance overridden and no longer matches transaction history"
            );
        } else {
            debug!(balance = amount, "Balance set");
        }

        self.publish();
        self.persist().await
    }

    /// Add funds to the current balance without recording a transaction.
    /// Returns the new balance.
    pub async fn add_to_balance(&mut self, delta: Cents) -> Result<Cents, LedgerError> {
        let balance = self
            .balance
            .checked_add(delta)
            .ok_or(ValidationError::BalanceOverflow)?;
        self.set_initial_balance(balance).await?;
        Ok(balance)
    }

    /// Clear everything, in memory and in storage. Safe to call repeatedly.
    pub async fn reset_data(&mut self) -> Result<(), LedgerError> {
        self.balance = 0;
        self.transactions.clear();
        self.publish();
        info!("Ledger reset");

        let mut outcome = Ok(());
        for key in [BALANCE_KEY, TRANSACTIONS_KEY] {
            if let Err(err) = self.store.remove_item(key).await {
                error!(key, error = %format!("{err:#}"), "Failed to remove stored ledger data");
                if outcome.is_ok() {
                    outcome = Err(LedgerError::from(err));
                }
            }
        }
        outcome
    }

    // ========================
    // Persistence
    // ========================

    /// Write the full current state, overwriting what was stored.
    async fn persist(&self) -> Result<(), LedgerError> {
        let transactions = encode_transactions(&self.transactions).inspect_err(|err| {
            error!(error = %err, "Failed to encode transactions");
        })?;
        let balance = encode_balance(self.balance);

        match self.write_state(&balance, &transactions).await {
            Ok(()) => {
                debug!(
                    balance = self.balance,
                    transactions = self.transactions.len(),
                    "Ledger saved"
                );
                Ok(())
            }
            Err(err) => {
                error!(error = %format!("{err:#}"), "Failed to save ledger");
                Err(err.into())
            }
        }
    }

    async fn write_state(&self, balance: &str, transactions: &str) -> anyhow::Result<()> {
        self.store.set_item(BALANCE_KEY, balance).await?;
        self.store.set_item(TRANSACTIONS_KEY, transactions).await
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }
}
