mod common;

use chrono::Utc;
use serde_json::json;

use common::{ALICE, BOB, checking, credit_card, day, engine_with_db};
use engine::{EngineError, NewTransaction, ToolCall};

#[tokio::test]
async fn list_accounts_reports_balances() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, ALICE, "Main").await;
    engine
        .create_transaction(
            ALICE,
            NewTransaction::income(12_345, "Salary", day(2026, 6, 1)).account(account.id),
        )
        .await
        .unwrap();

    let result = engine
        .call_tool(ALICE, ToolCall::parse("list_accounts", json!({})).unwrap())
        .await
        .unwrap();
    let accounts = result["accounts"].as_array().unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0]["account"]["name"], "Main");
    assert_eq!(accounts[0]["balance_minor"], 12_345);

    let result = engine
        .call_tool(BOB, ToolCall::ListAccounts)
        .await
        .unwrap();
    assert_eq!(result["accounts"], json!([]));
}

#[tokio::test]
async fn create_transaction_defaults_to_today() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, ALICE, "Main").await;

    let call = ToolCall::parse(
        "create_transaction",
        json!({
            "kind": "expense",
            "amount_minor": 450,
            "description": "Coffee",
            "account_id": account.id
        }),
    )
    .unwrap();
    let result = engine.call_tool(ALICE, call).await.unwrap();
    let today = Utc::now().date_naive().to_string();
    assert_eq!(result["transaction"]["occurred_on"], today.as_str());
    assert_eq!(result["transaction"]["kind"], "expense");
    assert_eq!(
        engine.account_balance(ALICE, account.id).await.unwrap(),
        -450
    );
}

#[tokio::test]
async fn tools_follow_the_same_rules() {
    let (engine, _db) = engine_with_db().await;
    let theirs = checking(&engine, BOB, "Main").await;

    let call = ToolCall::parse(
        "create_transaction",
        json!({
            "kind": "expense",
            "amount_minor": 450,
            "description": "Coffee",
            "occurred_on": "2026-06-02",
            "account_id": theirs.id
        }),
    )
    .unwrap();
    let EngineError::Validation(errors) = engine.call_tool(ALICE, call).await.unwrap_err() else {
        panic!("expected a validation error");
    };
    assert!(errors.has("account_id"));
    assert_eq!(engine.account_balance(BOB, theirs.id).await.unwrap(), 0);
}

#[tokio::test]
async fn payment_methods_carry_credit() {
    let (engine, _db) = engine_with_db().await;
    let card = credit_card(&engine, ALICE, 50_000).await;
    engine
        .create_transaction(
            ALICE,
            NewTransaction::expense(5_000, "Shoes", day(2026, 6, 3)).payment_method(card.id),
        )
        .await
        .unwrap();

    let result = engine
        .call_tool(ALICE, ToolCall::ListPaymentMethods)
        .await
        .unwrap();
    let methods = result["payment_methods"].as_array().unwrap();
    assert_eq!(methods.len(), 1);
    assert_eq!(methods[0]["payment_method"]["kind"], "credit_card");
    assert_eq!(methods[0]["credit"]["current_debt_minor"], 5_000);
    assert_eq!(methods[0]["credit"]["available_credit_minor"], 45_000);
}

#[tokio::test]
async fn list_transactions_pages_and_filters() {
    let (engine, _db) = engine_with_db().await;
    let account = checking(&engine, ALICE, "Main").await;
    for d in 1..=3 {
        engine
            .create_transaction(
                ALICE,
                NewTransaction::expense(100, format!("lunch {d}"), day(2026, 6, d))
                    .account(account.id),
            )
            .await
            .unwrap();
    }
    engine
        .create_transaction(
            ALICE,
            NewTransaction::income(900, "Refund", day(2026, 6, 4)).account(account.id),
        )
        .await
        .unwrap();

    let call = ToolCall::parse(
        "list_transactions",
        json!({ "kinds": ["expense"], "limit": 2 }),
    )
    .unwrap();
    let result = engine.call_tool(ALICE, call).await.unwrap();
    let items = result["transactions"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["description"], "lunch 3");
    let cursor = result["next_cursor"].as_str().unwrap().to_string();

    let call = ToolCall::parse(
        "list_transactions",
        json!({ "kinds": ["expense"], "limit": 2, "cursor": cursor }),
    )
    .unwrap();
    let result = engine.call_tool(ALICE, call).await.unwrap();
    assert_eq!(result["transactions"][0]["description"], "lunch 1");
    assert!(result["next_cursor"].is_null());
}

#[tokio::test]
async fn list_categories_includes_system_ones() {
    let (engine, _db) = engine_with_db().await;
    let result = engine
        .call_tool(ALICE, ToolCall::ListCategories)
        .await
        .unwrap();
    let names: Vec<&str> = result["categories"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|category| category["name"].as_str())
        .collect();
    assert!(names.contains(&"Transfer"));
    assert!(names.contains(&"Salary"));
}
