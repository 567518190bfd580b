use sea_orm::{ConnectionTrait, DbErr};
use sea_orm_migration::prelude::*;
use uuid::Uuid;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Categories {
    Table,
    Id,
    UserId,
    ParentId,
    Name,
    Kind,
    IsSystem,
    SortOrder,
}

/// Shared categories, owned by nobody. The `system` ones are referenced by
/// name from the engine.
const SYSTEM_CATEGORIES: &[(&str, &str)] = &[
    ("Initial Balance", "system"),
    ("Transfer", "system"),
    ("Credit Card Payment", "system"),
    ("Food", "expense"),
    ("Transport", "expense"),
    ("Housing", "expense"),
    ("Health", "expense"),
    ("Entertainment", "expense"),
    ("Salary", "income"),
    ("Other Income", "income"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        for (position, (name, kind)) in SYSTEM_CATEGORIES.iter().enumerate() {
            let select = Query::select()
                .column(Categories::Id)
                .from(Categories::Table)
                .and_where(Expr::col(Categories::UserId).is_null())
                .and_where(Expr::col(Categories::Name).eq(*name))
                .limit(1)
                .to_owned();
            let exists = db.query_one(backend.build(&select)).await?.is_some();
            if exists {
                continue;
            }

            let stmt = Query::insert()
                .into_table(Categories::Table)
                .columns([
                    Categories::Id,
                    Categories::UserId,
                    Categories::ParentId,
                    Categories::Name,
                    Categories::Kind,
                    Categories::IsSystem,
                    Categories::SortOrder,
                ])
                .values_panic([
                    Uuid::new_v4().into(),
                    None::<String>.into(),
                    None::<Uuid>.into(),
                    (*name).into(),
                    (*kind).into(),
                    true.into(),
                    (position as i32).into(),
                ])
                .to_owned();
            db.execute(backend.build(&stmt)).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();
        let stmt = Query::delete()
            .from_table(Categories::Table)
            .and_where(Expr::col(Categories::UserId).is_null())
            .and_where(Expr::col(Categories::IsSystem).eq(true))
            .to_owned();
        db.execute(backend.build(&stmt)).await?;
        Ok(())
    }
}
