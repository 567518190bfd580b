mod common;

use common::{ALICE, BOB, checking, credit_card, day, engine_with_db};
use engine::{CategoryKind, EngineError, NewCategory, NewTransaction, TransactionFilter};

#[tokio::test]
async fn authenticate_checks_the_password() {
    let (engine, _db) = engine_with_db().await;
    assert!(engine.authenticate(ALICE, "password").await.unwrap());
    assert!(!engine.authenticate(ALICE, "wrong").await.unwrap());
    assert!(!engine.authenticate("mallory", "password").await.unwrap());
}

#[tokio::test]
async fn usernames_are_unique() {
    let (engine, _db) = engine_with_db().await;
    assert_eq!(
        engine.create_user(ALICE, "other").await.unwrap_err(),
        EngineError::ExistingKey(ALICE.to_string())
    );

    let EngineError::Validation(errors) = engine.create_user("  ", "").await.unwrap_err() else {
        panic!("expected a validation error");
    };
    assert!(errors.has("username"));
    assert!(errors.has("password"));
}

#[tokio::test]
async fn deleting_a_user_removes_their_rows_only() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, ALICE, "Main").await;
    let card = credit_card(&engine, ALICE, 10_000).await;
    engine
        .create_category(ALICE, NewCategory::new("Pets", CategoryKind::Expense))
        .await
        .unwrap();
    engine
        .create_transaction(
            ALICE,
            NewTransaction::expense(300, "Food", day(2026, 7, 1)).payment_method(card.id),
        )
        .await
        .unwrap();
    engine
        .create_transaction(
            ALICE,
            NewTransaction::income(300, "Gift", day(2026, 7, 1)).account(account.id),
        )
        .await
        .unwrap();
    let bobs = checking(&engine, BOB, "Main").await;

    engine.delete_user(ALICE).await.unwrap();

    assert!(!engine.authenticate(ALICE, "password").await.unwrap());
    assert_eq!(
        engine.account(ALICE, account.id).await.unwrap_err(),
        EngineError::KeyNotFound("account not exists".to_string())
    );
    assert_eq!(
        engine.delete_user(ALICE).await.unwrap_err(),
        EngineError::KeyNotFound("user not exists".to_string())
    );

    // System categories and other users survive.
    let categories = engine.list_categories(BOB).await.unwrap();
    assert!(categories.iter().any(|c| c.is_system));
    assert!(!categories.iter().any(|c| c.name == "Pets"));
    assert_eq!(engine.account(BOB, bobs.id).await.unwrap().account.id, bobs.id);
    let page = engine
        .list_transactions(BOB, &TransactionFilter::default(), 50, None)
        .await
        .unwrap();
    assert!(page.items.is_empty());
}
