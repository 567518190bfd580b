mod common;

use common::{ALICE, BOB, engine_with_db};
use engine::{Category, CategoryKind, CategoryPatch, EngineError, NewCategory};

async fn system_category(engine: &engine::Engine, name: &str) -> Category {
    engine
        .list_categories(ALICE)
        .await
        .unwrap()
        .into_iter()
        .find(|category| category.is_system && category.name == name)
        .unwrap()
}

#[tokio::test]
async fn list_includes_seeded_system_categories() {
    let (engine, _db) = engine_with_db().await;
    let mine = engine
        .create_category(ALICE, NewCategory::new("Pets", CategoryKind::Expense))
        .await
        .unwrap();
    engine
        .create_category(BOB, NewCategory::new("Hobbies", CategoryKind::Expense))
        .await
        .unwrap();

    let listed = engine.list_categories(ALICE).await.unwrap();
    for name in ["Initial Balance", "Transfer", "Credit Card Payment", "Food", "Salary"] {
        assert!(
            listed.iter().any(|c| c.is_system && c.user_id.is_none() && c.name == name),
            "missing system category {name}"
        );
    }
    assert!(listed.iter().any(|c| c.id == mine.id));
    assert!(!listed.iter().any(|c| c.name == "Hobbies"));
    assert_eq!(
        system_category(&engine, "Transfer").await.kind,
        CategoryKind::System
    );
}

#[tokio::test]
async fn subcategory_takes_the_parent_kind() {
    let (engine, _db) = engine_with_db().await;
    let parent = engine
        .create_category(ALICE, NewCategory::new("Groceries", CategoryKind::Expense))
        .await
        .unwrap();
    let child = engine
        .create_category(
            ALICE,
            NewCategory::new("Bakery", CategoryKind::Income).parent(parent.id),
        )
        .await
        .unwrap();
    assert_eq!(child.kind, CategoryKind::Expense);
    assert_eq!(child.parent_id, Some(parent.id));
    assert!(!child.is_root());

    // A seeded expense root can host user subcategories.
    let food = system_category(&engine, "Food").await;
    let sushi = engine
        .create_category(
            ALICE,
            NewCategory::new("Sushi", CategoryKind::Income).parent(food.id),
        )
        .await
        .unwrap();
    assert_eq!(sushi.kind, CategoryKind::Expense);
}

#[tokio::test]
async fn nesting_is_one_level_deep() {
    let (engine, _db) = engine_with_db().await;
    let parent = engine
        .create_category(ALICE, NewCategory::new("Home", CategoryKind::Expense))
        .await
        .unwrap();
    let child = engine
        .create_category(
            ALICE,
            NewCategory::new("Repairs", CategoryKind::Expense).parent(parent.id),
        )
        .await
        .unwrap();

    let err = engine
        .create_category(
            ALICE,
            NewCategory::new("Plumbing", CategoryKind::Expense).parent(child.id),
        )
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert!(errors.has("parent_id"));

    let transfer = system_category(&engine, "Transfer").await;
    let err = engine
        .create_category(
            ALICE,
            NewCategory::new("Between banks", CategoryKind::Expense).parent(transfer.id),
        )
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert!(errors.has("parent_id"));
}

#[tokio::test]
async fn users_cannot_create_system_kind() {
    let (engine, _db) = engine_with_db().await;
    let err = engine
        .create_category(ALICE, NewCategory::new("Mine", CategoryKind::System))
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert!(errors.has("kind"));
}

#[tokio::test]
async fn sibling_names_are_unique_per_user() {
    let (engine, _db) = engine_with_db().await;
    engine
        .create_category(ALICE, NewCategory::new("Travel", CategoryKind::Expense))
        .await
        .unwrap();

    assert_eq!(
        engine
            .create_category(ALICE, NewCategory::new("travel", CategoryKind::Expense))
            .await
            .unwrap_err(),
        EngineError::ExistingKey("travel".to_string())
    );

    // Another user, or another parent, may reuse the name.
    engine
        .create_category(BOB, NewCategory::new("Travel", CategoryKind::Expense))
        .await
        .unwrap();
    let holidays = engine
        .create_category(ALICE, NewCategory::new("Holidays", CategoryKind::Expense))
        .await
        .unwrap();
    engine
        .create_category(
            ALICE,
            NewCategory::new("Travel", CategoryKind::Expense).parent(holidays.id),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn system_categories_are_protected() {
    let (engine, _db) = engine_with_db().await;
    let transfer = system_category(&engine, "Transfer").await;
    let protected = EngineError::Forbidden("system categories cannot be modified".to_string());

    assert_eq!(
        engine
            .update_category(
                ALICE,
                transfer.id,
                CategoryPatch {
                    name: Some("Moves".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err(),
        protected
    );
    assert_eq!(
        engine.delete_category(ALICE, transfer.id).await.unwrap_err(),
        protected
    );
    assert_eq!(engine.category(BOB, transfer.id).await.unwrap(), transfer);
}

#[tokio::test]
async fn foreign_category_is_forbidden() {
    let (engine, _db) = engine_with_db().await;
    let mine = engine
        .create_category(ALICE, NewCategory::new("Pets", CategoryKind::Expense))
        .await
        .unwrap();
    let forbidden = EngineError::Forbidden("category belongs to another user".to_string());

    assert_eq!(engine.category(BOB, mine.id).await.unwrap_err(), forbidden);
    assert_eq!(
        engine.delete_category(BOB, mine.id).await.unwrap_err(),
        forbidden
    );
}

#[tokio::test]
async fn root_kind_change_reaches_children() {
    let (engine, _db) = engine_with_db().await;
    let root = engine
        .create_category(ALICE, NewCategory::new("Freelance", CategoryKind::Expense))
        .await
        .unwrap();
    let child = engine
        .create_category(
            ALICE,
            NewCategory::new("Design", CategoryKind::Expense).parent(root.id),
        )
        .await
        .unwrap();

    let updated = engine
        .update_category(
            ALICE,
            root.id,
            CategoryPatch {
                kind: Some(CategoryKind::Income),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.kind, CategoryKind::Income);
    assert_eq!(
        engine.category(ALICE, child.id).await.unwrap().kind,
        CategoryKind::Income
    );

    // A child's own kind follows the parent, whatever the patch says.
    let child = engine
        .update_category(
            ALICE,
            child.id,
            CategoryPatch {
                kind: Some(CategoryKind::Expense),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(child.kind, CategoryKind::Income);
}

#[tokio::test]
async fn moving_under_a_parent() {
    let (engine, _db) = engine_with_db().await;
    let parent = engine
        .create_category(ALICE, NewCategory::new("Car", CategoryKind::Expense))
        .await
        .unwrap();
    let loose = engine
        .create_category(ALICE, NewCategory::new("Fuel", CategoryKind::Income))
        .await
        .unwrap();

    let moved = engine
        .update_category(
            ALICE,
            loose.id,
            CategoryPatch {
                parent_id: Some(Some(parent.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.parent_id, Some(parent.id));
    assert_eq!(moved.kind, CategoryKind::Expense);

    // A parent with children cannot itself be nested.
    let other = engine
        .create_category(ALICE, NewCategory::new("Transport", CategoryKind::Expense))
        .await
        .unwrap();
    let err = engine
        .update_category(
            ALICE,
            parent.id,
            CategoryPatch {
                parent_id: Some(Some(other.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    let EngineError::Validation(errors) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert!(errors.has("parent_id"));
}

#[tokio::test]
async fn deleting_a_parent_promotes_children() {
    let (engine, _db) = engine_with_db().await;
    let parent = engine
        .create_category(ALICE, NewCategory::new("Kids", CategoryKind::Expense))
        .await
        .unwrap();
    let child = engine
        .create_category(
            ALICE,
            NewCategory::new("School", CategoryKind::Expense).parent(parent.id),
        )
        .await
        .unwrap();

    engine.delete_category(ALICE, parent.id).await.unwrap();

    let listed = engine.list_categories(ALICE).await.unwrap();
    assert!(!listed.iter().any(|c| c.id == parent.id));
    let child = listed.into_iter().find(|c| c.id == child.id).unwrap();
    assert!(child.is_root());
    assert_eq!(child.kind, CategoryKind::Expense);
    assert_eq!(
        engine.category(ALICE, parent.id).await.unwrap_err(),
        EngineError::KeyNotFound("category not exists".to_string())
    );
}
