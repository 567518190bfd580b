use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};

use crate::{
    EngineError, ResultEngine, ValidationErrors, accounts, categories, payment_methods,
    transactions, users, util::check_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Registers a user.
    ///
    /// The password is stored as given: credential handling belongs to the
    /// deployment in front of the engine.
    pub async fn create_user(&self, username: &str, password: &str) -> ResultEngine<()> {
        let mut errors = ValidationErrors::new();
        let username = check_name(&mut errors, "username", username);
        errors.check(password.is_empty(), "password", "must not be empty");
        errors.into_result()?;

        with_tx!(self, |db_tx| {
            if users::Entity::find_by_id(username.clone())
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(username));
            }
            users::ActiveModel {
                username: ActiveValue::Set(username.clone()),
                password: ActiveValue::Set(password.to_string()),
            }
            .insert(&db_tx)
            .await?;
            tracing::info!(username = %username, "user created");
            Ok(())
        })
    }

    /// Returns `true` when `username` exists and `password` matches.
    pub async fn authenticate(&self, username: &str, password: &str) -> ResultEngine<bool> {
        let user = users::Entity::find_by_id(username.to_string())
            .one(&self.database)
            .await?;
        Ok(user.is_some_and(|user| user.password == password))
    }

    /// Deletes a user and every row they own.
    ///
    /// This is the only hard delete in the engine.
    pub async fn delete_user(&self, username: &str) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, username).await?;

            let removed = transactions::Entity::delete_many()
                .filter(transactions::Column::UserId.eq(username))
                .exec(&db_tx)
                .await?;
            payment_methods::Entity::delete_many()
                .filter(payment_methods::Column::UserId.eq(username))
                .exec(&db_tx)
                .await?;
            accounts::Entity::delete_many()
                .filter(accounts::Column::UserId.eq(username))
                .exec(&db_tx)
                .await?;
            categories::Entity::delete_many()
                .filter(categories::Column::UserId.eq(username))
                .exec(&db_tx)
                .await?;
            users::Entity::delete_by_id(username.to_string())
                .exec(&db_tx)
                .await?;

            tracing::info!(username, transactions = removed.rows_affected, "user deleted");
            Ok(())
        })
    }
}
