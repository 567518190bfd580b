//! Ownership checks shared by every operation.
//!
//! Two flavors per entity (transactions only need the second):
//! - `find_owned_*` returns `None` for missing, deleted or foreign rows. Used
//!   for ids referenced from another entity, reported as a field error.
//! - `require_*` distinguishes missing/deleted (`KeyNotFound`) from foreign
//!   (`Forbidden`). Used for the target of an operation.

use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, accounts, categories, payment_methods, transactions, users,
};

use super::Engine;

macro_rules! impl_owned_target {
    ($require_fn:ident, $entity:ident, $label:literal) => {
        pub(super) async fn $require_fn<C: ConnectionTrait>(
            &self,
            db: &C,
            user_id: &str,
            target_id: Uuid,
        ) -> ResultEngine<$entity::Model> {
            let model = $entity::Entity::find_by_id(target_id)
                .filter($entity::Column::DeletedAt.is_null())
                .one(db)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(concat!($label, " not exists").to_string()))?;
            if model.user_id != user_id {
                return Err(EngineError::Forbidden(
                    concat!($label, " belongs to another user").to_string(),
                ));
            }
            Ok(model)
        }
    };
    ($find_fn:ident, $require_fn:ident, $entity:ident, $label:literal) => {
        impl_owned_target!($require_fn, $entity, $label);

        pub(super) async fn $find_fn<C: ConnectionTrait>(
            &self,
            db: &C,
            user_id: &str,
            target_id: Uuid,
        ) -> ResultEngine<Option<$entity::Model>> {
            $entity::Entity::find_by_id(target_id)
                .filter($entity::Column::UserId.eq(user_id))
                .filter($entity::Column::DeletedAt.is_null())
                .one(db)
                .await
                .map_err(Into::into)
        }
    };
}

impl Engine {
    impl_owned_target!(find_owned_account, require_account, accounts, "account");

    impl_owned_target!(
        find_owned_payment_method,
        require_payment_method,
        payment_methods,
        "payment method"
    );

    // Transactions are only ever the target of an operation.
    impl_owned_target!(require_transaction, transactions, "transaction");

    pub(super) async fn require_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    /// A category the user may reference: their own or a system one.
    pub(super) async fn find_visible_category<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        category_id: Uuid,
    ) -> ResultEngine<Option<categories::Model>> {
        let model = categories::Entity::find_by_id(category_id)
            .filter(categories::Column::DeletedAt.is_null())
            .one(db)
            .await?;
        Ok(model.filter(|m| m.is_visible_to(user_id)))
    }

    /// A category the user may edit or delete.
    ///
    /// System categories are read-only for everybody.
    pub(super) async fn require_writable_category<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        category_id: Uuid,
    ) -> ResultEngine<categories::Model> {
        let model = categories::Entity::find_by_id(category_id)
            .filter(categories::Column::DeletedAt.is_null())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
        if model.is_system || model.user_id.is_none() {
            return Err(EngineError::Forbidden(
                "system categories cannot be modified".to_string(),
            ));
        }
        if model.user_id.as_deref() != Some(user_id) {
            return Err(EngineError::Forbidden(
                "category belongs to another user".to_string(),
            ));
        }
        Ok(model)
    }

    /// Looks up a seeded system category by name.
    pub(super) async fn system_category_id<C: ConnectionTrait>(
        &self,
        db: &C,
        name: &str,
    ) -> ResultEngine<Option<Uuid>> {
        let model = categories::Entity::find()
            .filter(categories::Column::UserId.is_null())
            .filter(categories::Column::IsSystem.eq(true))
            .filter(categories::Column::Name.eq(name))
            .filter(categories::Column::DeletedAt.is_null())
            .one(db)
            .await?;
        Ok(model.map(|m| m.id))
    }
}
