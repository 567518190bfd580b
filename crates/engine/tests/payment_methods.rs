mod common;

use common::{
    ALICE, BOB, checking, credit_card, day, debit_card, engine_with_db, engine_with_file_db,
};
use engine::{
    EngineError, NewPaymentMethod, NewTransaction, PaymentMethodKind, PaymentMethodPatch,
    TransactionPatch,
};

fn field_errors(err: EngineError) -> engine::ValidationErrors {
    match err {
        EngineError::Validation(errors) => errors,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_credit_kinds_need_a_linked_account() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .create_payment_method(
            ALICE,
            NewPaymentMethod::new("Pocket cash", PaymentMethodKind::Cash),
        )
        .await
        .unwrap_err();
    assert!(field_errors(err).has("linked_account_id"));

    let theirs = checking(&engine, BOB, "Main").await;
    let err = engine
        .create_payment_method(
            ALICE,
            NewPaymentMethod::new("Borrowed", PaymentMethodKind::DebitCard)
                .linked_account(theirs.id),
        )
        .await
        .unwrap_err();
    assert!(field_errors(err).has("linked_account_id"));
}

#[tokio::test]
async fn currency_comes_from_the_linked_account() {
    let (engine, _db) = engine_with_db().await;
    let account = engine
        .create_account(
            ALICE,
            engine::NewAccount::new("Dollars", engine::AccountKind::Checking, "usd"),
        )
        .await
        .unwrap();
    let method = debit_card(&engine, ALICE, &account).await;

    assert_eq!(method.currency.code(), "USD");
    assert_eq!(method.linked_account_id, Some(account.id));
    assert_eq!(method.last_four.as_deref(), Some("1234"));
}

#[tokio::test]
async fn credit_card_rules() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, ALICE, "Main").await;

    // Currency is mandatory without a linked account.
    let err = engine
        .create_payment_method(
            ALICE,
            NewPaymentMethod::new("Visa", PaymentMethodKind::CreditCard).credit_limit(1_000),
        )
        .await
        .unwrap_err();
    assert!(field_errors(err).has("currency"));

    // A credit card never keeps a linked account.
    let card = engine
        .create_payment_method(
            ALICE,
            NewPaymentMethod::new("Visa", PaymentMethodKind::CreditCard)
                .linked_account(account.id)
                .currency("EUR"),
        )
        .await
        .unwrap();
    assert_eq!(card.linked_account_id, None);
    assert_eq!(
        engine.available_credit(ALICE, card.id).await.unwrap(),
        None
    );

    // Only credit cards carry a limit.
    let err = engine
        .create_payment_method(
            ALICE,
            NewPaymentMethod::new("Debit", PaymentMethodKind::DebitCard)
                .linked_account(account.id)
                .credit_limit(1_000),
        )
        .await
        .unwrap_err();
    assert!(field_errors(err).has("credit_limit_minor"));
}

#[tokio::test]
async fn cycle_days_and_last_four_are_validated() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .create_payment_method(
            ALICE,
            NewPaymentMethod::new("Visa", PaymentMethodKind::CreditCard)
                .currency("EUR")
                .cycle(0, 31)
                .last_four("42"),
        )
        .await
        .unwrap_err();
    let errors = field_errors(err);
    for field in ["billing_day", "due_day", "last_four"] {
        assert!(errors.has(field), "missing {field} in {errors}");
    }
}

#[tokio::test]
async fn payment_method_lends_its_account() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, ALICE, "Main").await;
    let card = debit_card(&engine, ALICE, &account).await;

    let tx = engine
        .create_transaction(
            ALICE,
            NewTransaction::expense(2_000, "Lunch", day(2026, 5, 5)).payment_method(card.id),
        )
        .await
        .unwrap();
    assert_eq!(tx.account_id, Some(account.id));
    assert_eq!(tx.payment_method_id, Some(card.id));
    assert_eq!(
        engine.account_balance(ALICE, account.id).await.unwrap(),
        -2_000
    );
}

#[tokio::test]
async fn expense_without_any_account_fails_on_account_id() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .create_transaction(ALICE, NewTransaction::expense(2_000, "Lunch", day(2026, 5, 5)))
        .await
        .unwrap_err();
    assert!(field_errors(err).has("account_id"));

    // A card expense cannot also name an account.
    let account = checking(&engine, ALICE, "Main").await;
    let card = credit_card(&engine, ALICE, 10_000).await;
    let err = engine
        .create_transaction(
            ALICE,
            NewTransaction::expense(2_000, "Lunch", day(2026, 5, 5))
                .payment_method(card.id)
                .account(account.id),
        )
        .await
        .unwrap_err();
    assert!(field_errors(err).has("account_id"));
}

#[tokio::test]
async fn moving_an_expense_to_a_card_moves_the_debt() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, ALICE, "Main").await;
    let card = credit_card(&engine, ALICE, 10_000).await;

    let tx = engine
        .create_transaction(
            ALICE,
            NewTransaction::expense(2_500, "Books", day(2026, 5, 5)).account(account.id),
        )
        .await
        .unwrap();
    engine
        .update_transaction(
            ALICE,
            tx.id,
            TransactionPatch {
                account_id: Some(None),
                payment_method_id: Some(Some(card.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(engine.account_balance(ALICE, account.id).await.unwrap(), 0);
    assert_eq!(engine.current_debt(ALICE, card.id).await.unwrap(), 2_500);
}

#[tokio::test]
async fn single_default_payment_method() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, ALICE, "Main").await;
    let debit = debit_card(&engine, ALICE, &account).await;
    let card = credit_card(&engine, ALICE, 10_000).await;

    engine.set_default_payment_method(ALICE, debit.id).await.unwrap();
    engine.set_default_payment_method(ALICE, card.id).await.unwrap();

    let defaults: Vec<_> = engine
        .list_payment_methods(ALICE)
        .await
        .unwrap()
        .into_iter()
        .filter(|method| method.is_default)
        .map(|method| method.id)
        .collect();
    assert_eq!(defaults, vec![card.id]);
}

#[tokio::test]
async fn concurrent_create_with_default_leaves_one() {
    let (engine, path) = engine_with_file_db().await;

    for round in 0..5 {
        let (a, b) = tokio::join!(
            engine.create_payment_method(
                ALICE,
                NewPaymentMethod::new(format!("Visa {round}"), PaymentMethodKind::CreditCard)
                    .currency("EUR")
                    .default_method(true),
            ),
            engine.create_payment_method(
                ALICE,
                NewPaymentMethod::new(format!("Amex {round}"), PaymentMethodKind::CreditCard)
                    .currency("EUR")
                    .default_method(true),
            ),
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(a.is_default && b.is_default);

        let defaults: Vec<_> = engine
            .list_payment_methods(ALICE)
            .await
            .unwrap()
            .into_iter()
            .filter(|method| method.is_default)
            .map(|method| method.id)
            .collect();
        assert_eq!(defaults.len(), 1);
        assert!(defaults[0] == a.id || defaults[0] == b.id);
    }

    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn update_rules() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, ALICE, "Main").await;
    let debit = debit_card(&engine, ALICE, &account).await;
    let card = credit_card(&engine, ALICE, 10_000).await;

    let err = engine
        .update_payment_method(
            ALICE,
            debit.id,
            PaymentMethodPatch {
                linked_account_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(field_errors(err).has("linked_account_id"));

    let err = engine
        .update_payment_method(
            ALICE,
            card.id,
            PaymentMethodPatch {
                linked_account_id: Some(Some(account.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(field_errors(err).has("linked_account_id"));

    let updated = engine
        .update_payment_method(
            ALICE,
            card.id,
            PaymentMethodPatch {
                name: Some("Travel card".to_string()),
                credit_limit_minor: Some(Some(25_000)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Travel card");
    assert_eq!(
        engine.available_credit(ALICE, card.id).await.unwrap(),
        Some(25_000)
    );
}

#[tokio::test]
async fn foreign_and_deleted_payment_methods() {
    let (engine, _db) = engine_with_db().await;
    let card = credit_card(&engine, ALICE, 10_000).await;

    assert_eq!(
        engine.current_debt(BOB, card.id).await.unwrap_err(),
        EngineError::Forbidden("payment method belongs to another user".to_string())
    );

    // Referencing someone else's card is a field error, not a 403.
    let bob_account = checking(&engine, BOB, "Main").await;
    let err = engine
        .create_transaction(
            BOB,
            NewTransaction::expense(100, "Sneaky", day(2026, 5, 5))
                .account(bob_account.id)
                .payment_method(card.id),
        )
        .await
        .unwrap_err();
    assert!(field_errors(err).has("payment_method_id"));

    engine.delete_payment_method(ALICE, card.id).await.unwrap();
    assert!(engine.list_payment_methods(ALICE).await.unwrap().is_empty());
    assert_eq!(
        engine.payment_method(ALICE, card.id).await.unwrap_err(),
        EngineError::KeyNotFound("payment method not exists".to_string())
    );
}
