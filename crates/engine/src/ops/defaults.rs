//! Single-default bookkeeping for accounts and payment methods.
//!
//! The clearing `UPDATE` always runs first inside the caller's transaction.
//! It takes the SQLite write lock, so two concurrent calls serialize and the
//! later one wins. The partial unique index created by the migrations rejects
//! anything that slips through.

use sea_orm::{DatabaseTransaction, QueryFilter, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, accounts, payment_methods};

macro_rules! impl_default_flag {
    ($make_fn:ident, $reset_fn:ident, $clear_fn:ident, $entity:ident, $label:literal) => {
        /// Drops the flag from every row of the user. Callers about to insert
        /// a new default row run this before anything else.
        pub(super) async fn $reset_fn(db_tx: &DatabaseTransaction, user_id: &str) -> ResultEngine<()> {
            $entity::Entity::update_many()
                .col_expr($entity::Column::IsDefault, Expr::value(false))
                .filter($entity::Column::UserId.eq(user_id))
                .filter($entity::Column::IsDefault.eq(true))
                .exec(db_tx)
                .await?;
            Ok(())
        }

        pub(super) async fn $make_fn(
            db_tx: &DatabaseTransaction,
            user_id: &str,
            target_id: Uuid,
        ) -> ResultEngine<()> {
            $entity::Entity::update_many()
                .col_expr($entity::Column::IsDefault, Expr::value(false))
                .filter($entity::Column::UserId.eq(user_id))
                .filter($entity::Column::IsDefault.eq(true))
                .filter($entity::Column::Id.ne(target_id))
                .exec(db_tx)
                .await?;

            let updated = $entity::Entity::update_many()
                .col_expr($entity::Column::IsDefault, Expr::value(true))
                .filter($entity::Column::Id.eq(target_id))
                .filter($entity::Column::UserId.eq(user_id))
                .filter($entity::Column::DeletedAt.is_null())
                .exec(db_tx)
                .await?;
            if updated.rows_affected == 0 {
                return Err(EngineError::KeyNotFound(
                    concat!($label, " not exists").to_string(),
                ));
            }
            tracing::debug!(%target_id, user_id, entity = $label, "default changed");
            Ok(())
        }

        pub(super) async fn $clear_fn(
            db_tx: &DatabaseTransaction,
            target_id: Uuid,
        ) -> ResultEngine<()> {
            $entity::Entity::update_many()
                .col_expr($entity::Column::IsDefault, Expr::value(false))
                .filter($entity::Column::Id.eq(target_id))
                .exec(db_tx)
                .await?;
            Ok(())
        }
    };
}

impl_default_flag!(
    make_default_account,
    reset_default_accounts,
    clear_default_account,
    accounts,
    "account"
);

impl_default_flag!(
    make_default_payment_method,
    reset_default_payment_methods,
    clear_default_payment_method,
    payment_methods,
    "payment method"
);
