#![allow(dead_code)]

use chrono::NaiveDate;
use sea_orm::{Database, DatabaseConnection};

use engine::{
    Account, AccountKind, Engine, NewAccount, NewPaymentMethod, PaymentMethod, PaymentMethodKind,
};
use migration::MigratorTrait;
use uuid::Uuid;

pub const ALICE: &str = "alice";
pub const BOB: &str = "bob";

async fn seed(db: DatabaseConnection) -> Engine {
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    engine.create_user(ALICE, "password").await.unwrap();
    engine.create_user(BOB, "password").await.unwrap();
    engine
}

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    let engine = seed(db.clone()).await;
    (engine, db)
}

/// A file-backed database under `target/test_dbs`, for tests that need more
/// than one connection.
pub async fn engine_with_file_db() -> (Engine, std::path::PathBuf) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());
    let db = Database::connect(&url).await.unwrap();
    (seed(db).await, path)
}

pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub async fn checking(engine: &Engine, user_id: &str, name: &str) -> Account {
    engine
        .create_account(user_id, NewAccount::new(name, AccountKind::Checking, "EUR"))
        .await
        .unwrap()
}

pub async fn credit_card(engine: &Engine, user_id: &str, limit_minor: i64) -> PaymentMethod {
    engine
        .create_payment_method(
            user_id,
            NewPaymentMethod::new("Visa", PaymentMethodKind::CreditCard)
                .currency("EUR")
                .credit_limit(limit_minor)
                .cycle(10, 25),
        )
        .await
        .unwrap()
}

pub async fn debit_card(engine: &Engine, user_id: &str, account: &Account) -> PaymentMethod {
    engine
        .create_payment_method(
            user_id,
            NewPaymentMethod::new("Debit", PaymentMethodKind::DebitCard)
                .linked_account(account.id)
                .last_four("1234"),
        )
        .await
        .unwrap()
}
