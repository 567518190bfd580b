mod common;

use chrono::Utc;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};

use common::{ALICE, checking, credit_card, day, debit_card, engine_with_db};
use engine::{
    AccountKind, EngineError, MAX_AMOUNT_MINOR, NewAccount, NewPaymentMethod, NewTransaction,
    PaymentMethodKind, PaymentMethodPatch, SettlementCmd, TransactionFilter, TransactionPatch,
    TransferCmd,
};
use uuid::Uuid;

/// Writes a ledger row behind the engine's back, as an older or newer build
/// might have.
async fn insert_raw(db: &DatabaseConnection, account_id: Uuid, kind: &str, amount_minor: i64) {
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "INSERT INTO transactions \
         (id, user_id, kind, account_id, amount_minor, currency, description, occurred_on, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        vec![
            Uuid::new_v4().into(),
            ALICE.into(),
            kind.into(),
            account_id.into(),
            amount_minor.into(),
            "EUR".into(),
            "written elsewhere".into(),
            day(2026, 1, 2).into(),
            Utc::now().into(),
        ],
    ))
    .await
    .unwrap();
}

#[tokio::test]
async fn income_minus_expense() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, ALICE, "Main").await;

    engine
        .create_transaction(
            ALICE,
            NewTransaction::income(100_000, "Salary", day(2026, 1, 31)).account(account.id),
        )
        .await
        .unwrap();
    engine
        .create_transaction(
            ALICE,
            NewTransaction::expense(30_000, "Rent", day(2026, 2, 1)).account(account.id),
        )
        .await
        .unwrap();

    assert_eq!(
        engine.account_balance(ALICE, account.id).await.unwrap(),
        70_000
    );
    assert_eq!(
        engine.account_balance(ALICE, account.id).await.unwrap(),
        70_000
    );
}

#[tokio::test]
async fn balance_does_not_depend_on_insertion_order() {
    let (engine, _db) = engine_with_db().await;
    let first = checking(&engine, ALICE, "First").await;
    let second = checking(&engine, ALICE, "Second").await;

    let rows = [(true, 5_000), (false, 1_200), (true, 300), (false, 4_100)];
    for (income, amount) in rows {
        let cmd = if income {
            NewTransaction::income(amount, "in", day(2026, 1, 1))
        } else {
            NewTransaction::expense(amount, "out", day(2026, 1, 1))
        };
        engine
            .create_transaction(ALICE, cmd.account(first.id))
            .await
            .unwrap();
    }
    for (income, amount) in rows.iter().rev().copied() {
        let cmd = if income {
            NewTransaction::income(amount, "in", day(2026, 1, 1))
        } else {
            NewTransaction::expense(amount, "out", day(2026, 1, 1))
        };
        engine
            .create_transaction(ALICE, cmd.account(second.id))
            .await
            .unwrap();
    }

    let a = engine.account_balance(ALICE, first.id).await.unwrap();
    let b = engine.account_balance(ALICE, second.id).await.unwrap();
    assert_eq!(a, 0);
    assert_eq!(a, b);
}

#[tokio::test]
async fn soft_deleted_transaction_stops_counting() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, ALICE, "Main").await;

    let income = engine
        .create_transaction(
            ALICE,
            NewTransaction::income(100_000, "Salary", day(2026, 1, 31)).account(account.id),
        )
        .await
        .unwrap();
    let expense = engine
        .create_transaction(
            ALICE,
            NewTransaction::expense(30_000, "Rent", day(2026, 2, 1)).account(account.id),
        )
        .await
        .unwrap();

    engine.delete_transaction(ALICE, expense.id).await.unwrap();
    assert_eq!(
        engine.account_balance(ALICE, account.id).await.unwrap(),
        100_000
    );

    engine.delete_transaction(ALICE, income.id).await.unwrap();
    assert_eq!(engine.account_balance(ALICE, account.id).await.unwrap(), 0);
}

#[tokio::test]
async fn fresh_card_has_full_credit() {
    let (engine, _db) = engine_with_db().await;
    let card = credit_card(&engine, ALICE, 1_000_000).await;

    assert_eq!(engine.current_debt(ALICE, card.id).await.unwrap(), 0);
    assert_eq!(
        engine.available_credit(ALICE, card.id).await.unwrap(),
        Some(1_000_000)
    );
}

#[tokio::test]
async fn card_expense_then_settlement() {
    let (engine, _db) = engine_with_db().await;
    let account = engine
        .create_account(
            ALICE,
            engine::NewAccount::new("Main", engine::AccountKind::Checking, "EUR")
                .initial_balance(1_000_000),
        )
        .await
        .unwrap();
    let card = credit_card(&engine, ALICE, 1_000_000).await;

    let expense = engine
        .create_transaction(
            ALICE,
            NewTransaction::expense(200_000, "Laptop", day(2026, 3, 1)).payment_method(card.id),
        )
        .await
        .unwrap();
    assert_eq!(expense.account_id, None);
    assert_eq!(expense.currency.code(), "EUR");

    let summary = engine.credit_summary(ALICE, card.id).await.unwrap();
    assert!(summary.is_credit_card);
    assert_eq!(summary.current_debt_minor, 200_000);
    assert_eq!(summary.available_credit_minor, Some(800_000));
    // The card expense does not touch the account.
    assert_eq!(
        engine.account_balance(ALICE, account.id).await.unwrap(),
        1_000_000
    );

    let settlement = engine
        .settle_credit_card(
            ALICE,
            SettlementCmd::new(card.id, account.id, 200_000, day(2026, 3, 25)),
        )
        .await
        .unwrap();
    assert!(settlement.category_id.is_some());

    assert_eq!(engine.current_debt(ALICE, card.id).await.unwrap(), 0);
    assert_eq!(
        engine.available_credit(ALICE, card.id).await.unwrap(),
        Some(1_000_000)
    );
    assert_eq!(
        engine.account_balance(ALICE, account.id).await.unwrap(),
        800_000
    );
}

#[tokio::test]
async fn debit_card_has_no_debt() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, ALICE, "Main").await;
    let card = debit_card(&engine, ALICE, &account).await;

    engine
        .create_transaction(
            ALICE,
            NewTransaction::expense(4_500, "Coffee beans", day(2026, 3, 2)).payment_method(card.id),
        )
        .await
        .unwrap();

    let summary = engine.credit_summary(ALICE, card.id).await.unwrap();
    assert!(!summary.is_credit_card);
    assert_eq!(summary.current_debt_minor, 0);
    assert_eq!(summary.available_credit_minor, None);
    assert_eq!(
        engine.account_balance(ALICE, account.id).await.unwrap(),
        -4_500
    );
}

#[tokio::test]
async fn settlement_needs_a_credit_card_and_an_account() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, ALICE, "Main").await;
    let debit = debit_card(&engine, ALICE, &account).await;

    let err = engine
        .settle_credit_card(
            ALICE,
            SettlementCmd::new(debit.id, account.id, 1_000, day(2026, 3, 25)),
        )
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected a validation error");
    };
    assert!(errors.has("payment_method_id"));

    let card = credit_card(&engine, ALICE, 50_000).await;
    let err = engine
        .create_transaction(
            ALICE,
            NewTransaction::new(
                engine::TransactionKind::Settlement,
                1_000,
                "Card payment",
                day(2026, 3, 25),
            )
            .payment_method(card.id),
        )
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected a validation error");
    };
    assert!(errors.has("account_id"));
}

#[tokio::test]
async fn transfer_moves_money_and_deletes_as_a_pair() {
    let (engine, _db) = engine_with_db().await;
    let from = checking(&engine, ALICE, "Checking").await;
    let to = checking(&engine, ALICE, "Savings").await;
    engine
        .create_transaction(
            ALICE,
            NewTransaction::income(100_000, "Salary", day(2026, 1, 31)).account(from.id),
        )
        .await
        .unwrap();

    let (outgoing, incoming) = engine
        .transfer(
            ALICE,
            TransferCmd::new(from.id, to.id, 40_000, day(2026, 2, 1)).notes("rainy day"),
        )
        .await
        .unwrap();
    assert_eq!(outgoing.linked_transaction_id, Some(incoming.id));
    assert_eq!(incoming.linked_transaction_id, Some(outgoing.id));
    assert_eq!(outgoing.category_id, incoming.category_id);
    assert!(outgoing.category_id.is_some());

    assert_eq!(engine.account_balance(ALICE, from.id).await.unwrap(), 60_000);
    assert_eq!(engine.account_balance(ALICE, to.id).await.unwrap(), 40_000);

    // Editing one half keeps the other in sync.
    engine
        .update_transaction(
            ALICE,
            incoming.id,
            TransactionPatch {
                amount_minor: Some(50_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let mirrored = engine.transaction(ALICE, outgoing.id).await.unwrap();
    assert_eq!(mirrored.amount_minor, 50_000);
    assert_eq!(engine.account_balance(ALICE, from.id).await.unwrap(), 50_000);

    engine.delete_transaction(ALICE, outgoing.id).await.unwrap();
    assert_eq!(engine.account_balance(ALICE, from.id).await.unwrap(), 100_000);
    assert_eq!(engine.account_balance(ALICE, to.id).await.unwrap(), 0);
}

#[tokio::test]
async fn transfer_to_the_same_account_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, ALICE, "Main").await;

    let err = engine
        .transfer(
            ALICE,
            TransferCmd::new(account.id, account.id, 1_000, day(2026, 2, 1)),
        )
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected a validation error");
    };
    assert!(errors.has("to_account_id"));
}

#[tokio::test]
async fn unknown_stored_kind_is_skipped() {
    let (engine, db) = engine_with_db().await;
    let account = checking(&engine, ALICE, "Main").await;
    engine
        .create_transaction(
            ALICE,
            NewTransaction::income(10_000, "Gift", day(2026, 1, 1)).account(account.id),
        )
        .await
        .unwrap();

    insert_raw(&db, account.id, "refund", 999).await;

    assert_eq!(
        engine.account_balance(ALICE, account.id).await.unwrap(),
        10_000
    );
    let listed = engine.list_accounts(ALICE).await.unwrap();
    assert_eq!(listed[0].balance_minor, 10_000);

    let page = engine
        .list_transactions(ALICE, &TransactionFilter::default(), 50, None)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].description, "Gift");
}

#[tokio::test]
async fn amounts_above_the_cap_are_rejected_per_field() {
    let (engine, _db) = engine_with_db().await;
    let too_much = MAX_AMOUNT_MINOR + 1;

    let err = engine
        .create_account(
            ALICE,
            NewAccount::new("Vault", AccountKind::Savings, "EUR").initial_balance(too_much),
        )
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert!(errors.has("initial_balance_minor"));

    let err = engine
        .create_payment_method(
            ALICE,
            NewPaymentMethod::new("Black card", PaymentMethodKind::CreditCard)
                .currency("EUR")
                .credit_limit(i64::MAX),
        )
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert!(errors.has("credit_limit_minor"));

    let account = checking(&engine, ALICE, "Main").await;
    let err = engine
        .create_transaction(
            ALICE,
            NewTransaction::income(i64::MAX, "Jackpot", day(2026, 1, 1)).account(account.id),
        )
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert!(errors.has("amount_minor"));

    let tx = engine
        .create_transaction(
            ALICE,
            NewTransaction::income(100, "Gift", day(2026, 1, 1)).account(account.id),
        )
        .await
        .unwrap();
    let err = engine
        .update_transaction(
            ALICE,
            tx.id,
            TransactionPatch {
                amount_minor: Some(too_much),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert!(errors.has("amount_minor"));

    let card = credit_card(&engine, ALICE, 1_000).await;
    let err = engine
        .update_payment_method(
            ALICE,
            card.id,
            PaymentMethodPatch {
                credit_limit_minor: Some(Some(too_much)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert!(errors.has("credit_limit_minor"));

    let other = checking(&engine, ALICE, "Other").await;
    let err = engine
        .transfer(
            ALICE,
            TransferCmd::new(account.id, other.id, too_much, day(2026, 1, 2)),
        )
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert!(errors.has("amount_minor"));
    assert_eq!(engine.account_balance(ALICE, account.id).await.unwrap(), 100);
}

#[tokio::test]
async fn reads_at_the_cap_stay_exact() {
    let (engine, _db) = engine_with_db().await;
    let account = engine
        .create_account(
            ALICE,
            NewAccount::new("Vault", AccountKind::Savings, "EUR")
                .initial_balance(MAX_AMOUNT_MINOR),
        )
        .await
        .unwrap();
    let card = credit_card(&engine, ALICE, MAX_AMOUNT_MINOR).await;
    for _ in 0..3 {
        engine
            .create_transaction(
                ALICE,
                NewTransaction::income(MAX_AMOUNT_MINOR, "Bonus", day(2026, 1, 3))
                    .account(account.id),
            )
            .await
            .unwrap();
        engine
            .create_transaction(
                ALICE,
                NewTransaction::expense(MAX_AMOUNT_MINOR - 1, "Yacht", day(2026, 1, 3))
                    .payment_method(card.id),
            )
            .await
            .unwrap();
    }

    assert_eq!(
        engine.account_balance(ALICE, account.id).await.unwrap(),
        4 * MAX_AMOUNT_MINOR
    );
    let summary = engine.credit_summary(ALICE, card.id).await.unwrap();
    assert_eq!(summary.current_debt_minor, 3 * (MAX_AMOUNT_MINOR - 1));
    assert_eq!(
        summary.available_credit_minor,
        Some(MAX_AMOUNT_MINOR - 3 * (MAX_AMOUNT_MINOR - 1))
    );
}

#[tokio::test]
async fn oversized_stored_rows_do_not_break_reads() {
    let (engine, db) = engine_with_db().await;
    let account = checking(&engine, ALICE, "Main").await;
    insert_raw(&db, account.id, "income", i64::MAX).await;
    insert_raw(&db, account.id, "income", i64::MAX).await;

    assert_eq!(
        engine.account_balance(ALICE, account.id).await.unwrap(),
        i64::MAX
    );
    let listed = engine.list_accounts(ALICE).await.unwrap();
    assert_eq!(listed[0].balance_minor, i64::MAX);

    let card = credit_card(&engine, ALICE, 1_000).await;
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE payment_methods SET credit_limit_minor = ? WHERE id = ?",
        vec![i64::MAX.into(), card.id.into()],
    ))
    .await
    .unwrap();
    engine
        .settle_credit_card(ALICE, SettlementCmd::new(card.id, account.id, 10, day(2026, 1, 4)))
        .await
        .unwrap();

    assert_eq!(engine.current_debt(ALICE, card.id).await.unwrap(), -10);
    assert_eq!(
        engine.available_credit(ALICE, card.id).await.unwrap(),
        Some(i64::MAX)
    );
}
