use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, ConnectionTrait, IntoActiveModel, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Category, CategoryKind, CategoryPatch, EngineError, NewCategory, ResultEngine,
    ValidationErrors, categories,
    util::{check_color, check_icon, check_name},
};

use super::{Engine, with_tx};

impl Engine {
    /// Checks a would-be parent and returns its kind.
    ///
    /// Nesting is one level deep, so the parent must be a root category. It
    /// may be a system category, as long as its kind is not `system`.
    async fn parent_kind<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        parent_id: Uuid,
        errors: &mut ValidationErrors,
    ) -> ResultEngine<Option<CategoryKind>> {
        let Some(parent) = self.find_visible_category(db, user_id, parent_id).await? else {
            errors.add("parent_id", "does not exist");
            return Ok(None);
        };
        if parent.parent_id.is_some() {
            errors.add("parent_id", "must be a root category");
            return Ok(None);
        }
        let kind = CategoryKind::try_from(parent.kind.as_str())?;
        if kind == CategoryKind::System {
            errors.add("parent_id", "cannot nest under a system-kind category");
            return Ok(None);
        }
        Ok(Some(kind))
    }

    async fn ensure_unique_sibling<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
        parent_id: Option<Uuid>,
        name: &str,
        exclude: Option<Uuid>,
    ) -> ResultEngine<()> {
        let parent_cond = match parent_id {
            Some(parent_id) => categories::Column::ParentId.eq(parent_id),
            None => categories::Column::ParentId.is_null(),
        };
        let mut query = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::DeletedAt.is_null())
            .filter(parent_cond)
            .filter(Expr::cust("LOWER(name)").eq(name.to_lowercase()));
        if let Some(exclude) = exclude {
            query = query.filter(categories::Column::Id.ne(exclude));
        }
        if query.one(db).await?.is_some() {
            return Err(EngineError::ExistingKey(name.to_string()));
        }
        Ok(())
    }

    /// Creates a user category.
    ///
    /// With a parent, the stored kind is the parent's, whatever `cmd.kind`
    /// says.
    pub async fn create_category(
        &self,
        user_id: &str,
        cmd: NewCategory,
    ) -> ResultEngine<Category> {
        let mut errors = ValidationErrors::new();
        let name = check_name(&mut errors, "name", &cmd.name);
        let icon = check_icon(&mut errors, cmd.icon.as_deref());
        let color = check_color(&mut errors, "color", cmd.color.as_deref());

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let kind = match cmd.parent_id {
                Some(parent_id) => self
                    .parent_kind(&db_tx, user_id, parent_id, &mut errors)
                    .await?
                    .unwrap_or(cmd.kind),
                None => cmd.kind,
            };
            errors.check(
                cmd.parent_id.is_none() && kind == CategoryKind::System,
                "kind",
                "system categories cannot be created",
            );
            errors.into_result()?;
            Self::ensure_unique_sibling(&db_tx, user_id, cmd.parent_id, &name, None).await?;

            let category = Category {
                id: Uuid::new_v4(),
                user_id: Some(user_id.to_string()),
                parent_id: cmd.parent_id,
                name,
                kind,
                icon,
                color,
                is_system: false,
                sort_order: cmd.sort_order,
            };
            categories::ActiveModel::from(&category)
                .insert(&db_tx)
                .await?;
            tracing::debug!(id = %category.id, kind = kind.as_str(), "category created");
            Ok(category)
        })
    }

    /// Return a category visible to the user.
    pub async fn category(&self, user_id: &str, category_id: Uuid) -> ResultEngine<Category> {
        let model = categories::Entity::find_by_id(category_id)
            .filter(categories::Column::DeletedAt.is_null())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
        if !model.is_visible_to(user_id) {
            return Err(EngineError::Forbidden(
                "category belongs to another user".to_string(),
            ));
        }
        Category::try_from(model)
    }

    /// Lists the user's categories together with the system ones.
    pub async fn list_categories(&self, user_id: &str) -> ResultEngine<Vec<Category>> {
        categories::Entity::find()
            .filter(
                Condition::any()
                    .add(categories::Column::UserId.eq(user_id))
                    .add(categories::Column::UserId.is_null()),
            )
            .filter(categories::Column::DeletedAt.is_null())
            .order_by_asc(categories::Column::SortOrder)
            .order_by_asc(categories::Column::Name)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    /// Updates a user category.
    ///
    /// Subcategories always end up with their parent's kind. Changing the kind
    /// of a root category rewrites its children in the same transaction.
    pub async fn update_category(
        &self,
        user_id: &str,
        category_id: Uuid,
        patch: CategoryPatch,
    ) -> ResultEngine<Category> {
        let mut errors = ValidationErrors::new();
        let name = patch
            .name
            .as_deref()
            .map(|value| check_name(&mut errors, "name", value));
        let icon = patch
            .icon
            .as_ref()
            .map(|value| check_icon(&mut errors, value.as_deref()));
        let color = patch
            .color
            .as_ref()
            .map(|value| check_color(&mut errors, "color", value.as_deref()));

        with_tx!(self, |db_tx| {
            let model = self
                .require_writable_category(&db_tx, user_id, category_id)
                .await?;
            let current_kind = CategoryKind::try_from(model.kind.as_str())?;
            let parent_id = patch.parent_id.unwrap_or(model.parent_id);

            if let Some(Some(new_parent)) = patch.parent_id {
                if new_parent == category_id {
                    errors.add("parent_id", "cannot be its own parent");
                } else {
                    let has_children = categories::Entity::find()
                        .filter(categories::Column::ParentId.eq(category_id))
                        .filter(categories::Column::DeletedAt.is_null())
                        .one(&db_tx)
                        .await?
                        .is_some();
                    errors.check(
                        has_children,
                        "parent_id",
                        "a category with subcategories cannot be nested",
                    );
                }
            }

            let kind = match parent_id {
                Some(parent_id) if parent_id != category_id => self
                    .parent_kind(&db_tx, user_id, parent_id, &mut errors)
                    .await?
                    .unwrap_or(current_kind),
                _ => patch.kind.unwrap_or(current_kind),
            };
            errors.check(
                parent_id.is_none() && kind == CategoryKind::System,
                "kind",
                "system categories cannot be created",
            );
            errors.into_result()?;

            let effective_name = name.clone().unwrap_or_else(|| model.name.clone());
            if name.is_some() || patch.parent_id.is_some() {
                Self::ensure_unique_sibling(
                    &db_tx,
                    user_id,
                    parent_id,
                    &effective_name,
                    Some(category_id),
                )
                .await?;
            }

            let mut active = model.into_active_model();
            active.name = ActiveValue::Set(effective_name);
            active.parent_id = ActiveValue::Set(parent_id);
            active.kind = ActiveValue::Set(kind.as_str().to_string());
            if let Some(icon) = icon {
                active.icon = ActiveValue::Set(icon);
            }
            if let Some(color) = color {
                active.color = ActiveValue::Set(color);
            }
            if let Some(sort_order) = patch.sort_order {
                active.sort_order = ActiveValue::Set(sort_order);
            }
            let updated = active.update(&db_tx).await?;

            if kind != current_kind && parent_id.is_none() {
                let synced = categories::Entity::update_many()
                    .col_expr(categories::Column::Kind, Expr::value(kind.as_str()))
                    .filter(categories::Column::ParentId.eq(category_id))
                    .exec(&db_tx)
                    .await?;
                tracing::debug!(
                    id = %category_id,
                    children = synced.rows_affected,
                    "category kind propagated"
                );
            }

            Category::try_from(updated)
        })
    }

    /// Soft-deletes a user category. Its subcategories become roots.
    pub async fn delete_category(&self, user_id: &str, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_writable_category(&db_tx, user_id, category_id)
                .await?;

            categories::Entity::update_many()
                .col_expr(categories::Column::ParentId, Expr::value(Option::<Uuid>::None))
                .filter(categories::Column::ParentId.eq(category_id))
                .exec(&db_tx)
                .await?;

            let mut active = model.into_active_model();
            active.deleted_at = ActiveValue::Set(Some(Utc::now()));
            active.update(&db_tx).await?;
            tracing::debug!(id = %category_id, "category deleted");
            Ok(())
        })
    }
}
