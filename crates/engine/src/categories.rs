//! Category registry.
//!
//! Categories are either owned by a user or system-wide (`user_id` is
//! `NULL`). System categories are seeded by migrations and are read-only for
//! everybody. Nesting is a single level: a subcategory points at a root
//! category and always carries the root's kind.

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// Name of the system category used for opening balances.
pub const INITIAL_BALANCE_CATEGORY: &str = "Initial Balance";
/// Name of the system category used for transfers between accounts.
pub const TRANSFER_CATEGORY: &str = "Transfer";
/// Name of the system category used for credit-card settlements.
pub const SETTLEMENT_CATEGORY: &str = "Credit Card Payment";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Expense,
    Income,
    System,
}

impl CategoryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
            Self::System => "system",
        }
    }
}

impl TryFrom<&str> for CategoryKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            "system" => Ok(Self::System),
            other => Err(EngineError::invalid(
                "kind",
                format!("invalid category kind: {other}"),
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub kind: CategoryKind,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_system: bool,
    pub sort_order: i32,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Option<String>,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub kind: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_system: bool,
    pub sort_order: i32,
    pub deleted_at: Option<DateTimeUtc>,
}

impl Model {
    /// Visible to `user_id`: their own rows plus the shared system rows.
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        match self.user_id.as_deref() {
            Some(owner) => owner == user_id,
            None => true,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Parent,
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Category> for ActiveModel {
    fn from(value: &Category) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id.clone()),
            parent_id: ActiveValue::Set(value.parent_id),
            name: ActiveValue::Set(value.name.clone()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            icon: ActiveValue::Set(value.icon.clone()),
            color: ActiveValue::Set(value.color.clone()),
            is_system: ActiveValue::Set(value.is_system),
            sort_order: ActiveValue::Set(value.sort_order),
            deleted_at: ActiveValue::Set(None),
        }
    }
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            parent_id: model.parent_id,
            name: model.name,
            kind: CategoryKind::try_from(model.kind.as_str())?,
            icon: model.icon,
            color: model.color,
            is_system: model.is_system,
            sort_order: model.sort_order,
        })
    }
}
