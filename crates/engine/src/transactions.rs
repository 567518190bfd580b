//! Transaction primitives.
//!
//! A `Transaction` is one ledger row. The stored amount is always positive;
//! its direction comes from [`TransactionKind`], which is the single place that
//! decides how a row moves an account balance or a credit-card debt.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Currency, EngineError, util::model_currency};

/// Which side of an account a transaction lands on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Money leaves the account.
    Debit,
    /// Money enters the account.
    Credit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Expense,
    Income,
    TransferOut,
    TransferIn,
    Settlement,
    InitialBalance,
}

impl TransactionKind {
    pub const ALL: [TransactionKind; 6] = [
        Self::Expense,
        Self::Income,
        Self::TransferOut,
        Self::TransferIn,
        Self::Settlement,
        Self::InitialBalance,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
            Self::TransferOut => "transfer_out",
            Self::TransferIn => "transfer_in",
            Self::Settlement => "settlement",
            Self::InitialBalance => "initial_balance",
        }
    }

    /// Account-level direction of this kind.
    pub fn direction(self) -> Direction {
        match self {
            Self::Expense | Self::TransferOut | Self::Settlement => Direction::Debit,
            Self::Income | Self::TransferIn | Self::InitialBalance => Direction::Credit,
        }
    }

    pub fn is_debit(self) -> bool {
        self.direction() == Direction::Debit
    }

    pub fn is_credit(self) -> bool {
        self.direction() == Direction::Credit
    }

    /// Sign applied to the amount when folding an account balance.
    pub fn account_sign(self) -> i64 {
        match self.direction() {
            Direction::Credit => 1,
            Direction::Debit => -1,
        }
    }

    /// Sign applied to the amount when folding a credit-card debt.
    ///
    /// Expenses charged to the card grow the debt, settlements pay it down;
    /// every other kind leaves it untouched.
    pub fn debt_sign(self) -> i64 {
        match self {
            Self::Expense => 1,
            Self::Settlement => -1,
            Self::Income | Self::TransferOut | Self::TransferIn | Self::InitialBalance => 0,
        }
    }

    /// `true` for the kind that pays down card debt.
    pub fn settles_debt(self) -> bool {
        self.debt_sign() < 0
    }

    pub fn is_transfer(self) -> bool {
        matches!(self, Self::TransferOut | Self::TransferIn)
    }

    /// The other half of a transfer pair.
    pub fn counterpart(self) -> Option<Self> {
        match self {
            Self::TransferOut => Some(Self::TransferIn),
            Self::TransferIn => Some(Self::TransferOut),
            Self::Expense | Self::Income | Self::Settlement | Self::InitialBalance => None,
        }
    }
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            "transfer_out" => Ok(Self::TransferOut),
            "transfer_in" => Ok(Self::TransferIn),
            "settlement" => Ok(Self::Settlement),
            "initial_balance" => Ok(Self::InitialBalance),
            other => Err(EngineError::invalid(
                "kind",
                format!("invalid transaction kind: {other}"),
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: String,
    pub kind: TransactionKind,
    pub account_id: Option<Uuid>,
    pub payment_method_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub linked_transaction_id: Option<Uuid>,
    pub amount_minor: i64,
    pub currency: Currency,
    pub description: String,
    pub notes: Option<String>,
    pub occurred_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Signed effect of this row on the balance of `account_id`.
    pub fn account_effect(&self) -> i64 {
        if self.account_id.is_none() {
            return 0;
        }
        self.kind.account_sign() * self.amount_minor
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub kind: String,
    pub account_id: Option<Uuid>,
    pub payment_method_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub linked_transaction_id: Option<Uuid>,
    pub amount_minor: i64,
    pub currency: String,
    pub description: String,
    pub notes: Option<String>,
    pub occurred_on: Date,
    pub created_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Account,
    #[sea_orm(
        belongs_to = "super::payment_methods::Entity",
        from = "Column::PaymentMethodId",
        to = "super::payment_methods::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    PaymentMethod,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Category,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::payment_methods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentMethod.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            account_id: ActiveValue::Set(tx.account_id),
            payment_method_id: ActiveValue::Set(tx.payment_method_id),
            category_id: ActiveValue::Set(tx.category_id),
            linked_transaction_id: ActiveValue::Set(tx.linked_transaction_id),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            currency: ActiveValue::Set(tx.currency.code().to_string()),
            description: ActiveValue::Set(tx.description.clone()),
            notes: ActiveValue::Set(tx.notes.clone()),
            occurred_on: ActiveValue::Set(tx.occurred_on),
            created_at: ActiveValue::Set(tx.created_at),
            deleted_at: ActiveValue::Set(None),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            account_id: model.account_id,
            payment_method_id: model.payment_method_id,
            category_id: model.category_id,
            linked_transaction_id: model.linked_transaction_id,
            amount_minor: model.amount_minor,
            currency: model_currency(&model.currency)?,
            description: model.description,
            notes: model.notes,
            occurred_on: model.occurred_on,
            created_at: model.created_at,
        })
    }
}
