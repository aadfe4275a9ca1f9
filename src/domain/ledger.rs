use serde::{Deserialize, Serialize};

use super::{Cents, Transaction, ValidationError};

/// Net effect of a list of transactions.
/// Balance = sum of income amounts - sum of expense amounts
pub fn compute_balance(transactions: &[Transaction]) -> Cents {
    transactions
        .iter()
        .fold(0, |balance, tx| balance.saturating_add(tx.signed_amount()))
}

/// Apply a transaction to a balance, refusing to overflow.
pub fn apply_transaction(balance: Cents, tx: &Transaction) -> Result<Cents, ValidationError> {
    balance
        .checked_add(tx.signed_amount())
        .ok_or(ValidationError::BalanceOverflow)
}

/// Income and expense totals over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeExpenseTotals {
    pub income: Cents,
    pub expense: Cents,
    pub net: Cents,
}

pub fn income_expense_totals(transactions: &[Transaction]) -> IncomeExpenseTotals {
    let (income, expense) = transactions.iter().fold((0i64, 0i64), |(inc, exp), tx| {
        if tx.is_income() {
            (inc.saturating_add(tx.amount_cents), exp)
        } else {
            (inc, exp.saturating_add(tx.amount_cents))
        }
    });
    IncomeExpenseTotals {
        income,
        expense,
        net: income.saturating_sub(expense),
    }
}

/// How far a stored balance has moved away from what its transactions add up
/// to. Non-zero after an explicit balance override (opening balance or manual
/// correction); the balance is never recomputed from history.
pub fn balance_drift(balance: Cents, transactions: &[Transaction]) -> Cents {
    balance.saturating_sub(compute_balance(transactions))
}
