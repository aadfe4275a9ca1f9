mod common;

use anyhow::Result;
use common::test_service;
use meusgastos::application::{LedgerError, LedgerService};
use meusgastos::domain::{Cents, TransactionType, ValidationError};
use meusgastos::storage::MemoryStore;

fn memory_service() -> LedgerService<MemoryStore> {
    LedgerService::new(MemoryStore::new(), common::FALLBACK_CATEGORY)
}

#[tokio::test]
async fn test_income_then_expense() -> Result<()> {
    let (mut service, _temp, _path) = test_service().await?;

    service
        .add_transaction(TransactionType::Income, 10000, "Salary", None)
        .await?;
    service
        .add_transaction(TransactionType::Expense, 3000, "Food", None)
        .await?;

    assert_eq!(service.balance(), 7000);
    assert_eq!(service.transactions().len(), 2);
    assert_eq!(service.transactions()[0].kind, TransactionType::Income);
    assert_eq!(service.transactions()[1].category, "Food");

    Ok(())
}

#[tokio::test]
async fn test_initial_balance_then_expense() -> Result<()> {
    let (mut service, _temp, _path) = test_service().await?;

    service.set_initial_balance(50000).await?;
    service
        .add_transaction(TransactionType::Expense, 5000, "Rent", None)
        .await?;

    assert_eq!(service.balance(), 45000);
    // The opening balance is not backed by any transaction
    assert_eq!(service.balance_drift(), 50000);

    Ok(())
}

#[tokio::test]
async fn test_balance_matches_replayed_transactions() -> Result<()> {
    let mut service = memory_service();

    let entries: [(TransactionType, Cents); 6] = [
        (TransactionType::Income, 250000),
        (TransactionType::Expense, 1999),
        (TransactionType::Expense, 87050),
        (TransactionType::Income, 1),
        (TransactionType::Expense, 300000),
        (TransactionType::Income, 4550),
    ];

    let mut expected: Cents = 0;
    for (kind, amount) in entries {
        service.add_transaction(kind, amount, "misc", None).await?;
        expected += kind.signed(amount);
        assert_eq!(service.balance(), expected);
    }

    let totals = service.totals();
    assert_eq!(totals.income - totals.expense, service.balance());
    assert_eq!(service.balance_drift(), 0);
    assert!(service.balance() < 0);

    Ok(())
}

#[tokio::test]
async fn test_non_positive_amount_rejected_without_changes() -> Result<()> {
    let mut service = memory_service();
    service
        .add_transaction(TransactionType::Income, 10000, "Salary", None)
        .await?;

    for amount in [0, -100] {
        let err = service
            .add_transaction(TransactionType::Expense, amount, "Food", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Validation(ValidationError::NonPositiveAmount)
        ));
        assert_eq!(err.to_string(), "Invalid transaction: amount must be positive");
    }

    assert_eq!(service.balance(), 10000);
    assert_eq!(service.transactions().len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_empty_category_rejected_without_changes() -> Result<()> {
    let mut service = memory_service();

    let err = service
        .add_transaction(TransactionType::Income, 10000, "", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::MissingCategory)
    ));
    assert!(err.is_validation());
    assert_eq!(service.balance(), 0);
    assert!(service.transactions().is_empty());
    assert_eq!(service.store().raw("transactions"), None);

    Ok(())
}

#[tokio::test]
async fn test_overflowing_balance_rejected() -> Result<()> {
    let mut service = memory_service();
    service.set_initial_balance(Cents::MAX - 10).await?;

    let err = service
        .add_transaction(TransactionType::Income, 100, "Gift", None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerError::Validation(ValidationError::BalanceOverflow)
    ));
    assert!(service.transactions().is_empty());
    assert_eq!(service.balance(), Cents::MAX - 10);

    Ok(())
}

#[tokio::test]
async fn test_transaction_fields_and_insertion_order() -> Result<()> {
    let mut service = memory_service();

    let first = service
        .add_transaction(
            TransactionType::Expense,
            1250,
            "  Food ",
            Some("Pão de queijo".to_string()),
        )
        .await?;
    let second = service
        .add_transaction(TransactionType::Income, 500, "Pix Recebido", Some(String::new()))
        .await?;

    assert_ne!(first.id, second.id);
    assert_eq!(first.category, "Food");
    assert_eq!(first.description.as_deref(), Some("Pão de queijo"));
    assert_eq!(second.description, None);
    assert!(second.date >= first.date);

    let ids: Vec<&str> = service.transactions().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec![first.id.as_str(), second.id.as_str()]);

    Ok(())
}

#[tokio::test]
async fn test_set_initial_balance_allows_any_value() -> Result<()> {
    let mut service = memory_service();
    service
        .add_transaction(TransactionType::Income, 10000, "Salary", None)
        .await?;

    service.set_initial_balance(-2500).await?;

    assert_eq!(service.balance(), -2500);
    assert_eq!(service.transactions().len(), 1);
    assert_eq!(service.balance_drift(), -12500);

    Ok(())
}

#[tokio::test]
async fn test_add_to_balance() -> Result<()> {
    let mut service = memory_service();
    service.set_initial_balance(10000).await?;

    let balance = service.add_to_balance(2550).await?;

    assert_eq!(balance, 12550);
    assert_eq!(service.balance(), 12550);
    assert!(service.transactions().is_empty());
    assert_eq!(service.store().raw("balance").as_deref(), Some("125.50"));

    Ok(())
}

#[tokio::test]
async fn test_reset_clears_everything() -> Result<()> {
    let mut service = memory_service();
    service.set_initial_balance(99900).await?;
    service
        .add_transaction(TransactionType::Expense, 100, "Food", None)
        .await?;

    service.reset_data().await?;

    assert_eq!(service.balance(), 0);
    assert!(service.transactions().is_empty());
    assert_eq!(service.store().raw("balance"), None);
    assert_eq!(service.store().raw("transactions"), None);

    // Idempotent
    service.reset_data().await?;
    assert_eq!(service.balance(), 0);
    assert!(service.transactions().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_subscribers_see_every_change() -> Result<()> {
    let mut service = memory_service();
    let mut updates = service.subscribe();

    service
        .add_transaction(TransactionType::Income, 10000, "Salary", None)
        .await?;
    assert!(updates.has_changed()?);
    {
        let snapshot = updates.borrow_and_update();
        assert_eq!(snapshot.balance, 10000);
        assert_eq!(snapshot.transactions.len(), 1);
    }

    service.set_initial_balance(0).await?;
    updates.changed().await?;
    assert_eq!(updates.borrow_and_update().balance, 0);

    service.reset_data().await?;
    updates.changed().await?;
    assert!(updates.borrow().transactions.is_empty());

    // Rejected operations publish nothing
    let _ = service
        .add_transaction(TransactionType::Expense, 0, "Food", None)
        .await;
    assert!(!updates.has_changed()?);

    Ok(())
}
