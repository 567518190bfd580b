//! The module contains `PaymentMethod` struct and its storage model.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, util::model_currency};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodKind {
    CreditCard,
    DebitCard,
    PrepaidCard,
    Cash,
    Transfer,
}

impl PaymentMethodKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreditCard => "credit_card",
            Self::DebitCard => "debit_card",
            Self::PrepaidCard => "prepaid_card",
            Self::Cash => "cash",
            Self::Transfer => "transfer",
        }
    }

    pub fn is_credit_card(self) -> bool {
        matches!(self, Self::CreditCard)
    }

    /// Every kind except credit cards spends straight from a linked account.
    pub fn requires_linked_account(self) -> bool {
        !self.is_credit_card()
    }
}

impl TryFrom<&str> for PaymentMethodKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "credit_card" => Ok(Self::CreditCard),
            "debit_card" => Ok(Self::DebitCard),
            "prepaid_card" => Ok(Self::PrepaidCard),
            "cash" => Ok(Self::Cash),
            "transfer" => Ok(Self::Transfer),
            other => Err(EngineError::invalid(
                "kind",
                format!("invalid payment method kind: {other}"),
            )),
        }
    }
}

/// A way of paying: a card, cash, a bank transfer.
///
/// Non-credit-card methods draw from `linked_account_id`. Credit cards carry
/// their own debt instead, computed from the ledger, and never have a linked
/// account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub kind: PaymentMethodKind,
    pub linked_account_id: Option<Uuid>,
    pub currency: Currency,
    pub credit_limit_minor: Option<i64>,
    pub billing_day: Option<i32>,
    pub due_day: Option<i32>,
    pub last_four: Option<String>,
    pub color: Option<String>,
    pub is_active: bool,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl PaymentMethod {
    pub fn is_credit_card(&self) -> bool {
        self.kind.is_credit_card()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "payment_methods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub kind: String,
    pub linked_account_id: Option<Uuid>,
    pub currency: String,
    pub credit_limit_minor: Option<i64>,
    pub billing_day: Option<i32>,
    pub due_day: Option<i32>,
    pub last_four: Option<String>,
    pub color: Option<String>,
    pub is_active: bool,
    pub is_default: bool,
    pub created_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

impl Model {
    /// Storage-level check, tolerant of unknown kinds.
    pub fn is_credit_card(&self) -> bool {
        self.kind == PaymentMethodKind::CreditCard.as_str()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::LinkedAccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    LinkedAccount,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LinkedAccount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&PaymentMethod> for ActiveModel {
    fn from(value: &PaymentMethod) -> Self {
        Self {
            id: ActiveValue::Set(value.id),
            user_id: ActiveValue::Set(value.user_id.clone()),
            name: ActiveValue::Set(value.name.clone()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            linked_account_id: ActiveValue::Set(value.linked_account_id),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            credit_limit_minor: ActiveValue::Set(value.credit_limit_minor),
            billing_day: ActiveValue::Set(value.billing_day),
            due_day: ActiveValue::Set(value.due_day),
            last_four: ActiveValue::Set(value.last_four.clone()),
            color: ActiveValue::Set(value.color.clone()),
            is_active: ActiveValue::Set(value.is_active),
            is_default: ActiveValue::Set(value.is_default),
            created_at: ActiveValue::Set(value.created_at),
            deleted_at: ActiveValue::Set(None),
        }
    }
}

impl TryFrom<Model> for PaymentMethod {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            kind: PaymentMethodKind::try_from(model.kind.as_str())?,
            linked_account_id: model.linked_account_id,
            currency: model_currency(&model.currency)?,
            credit_limit_minor: model.credit_limit_minor,
            billing_day: model.billing_day,
            due_day: model.due_day,
            last_four: model.last_four,
            color: model.color,
            is_active: model.is_active,
            is_default: model.is_default,
            created_at: model.created_at,
        })
    }
}
