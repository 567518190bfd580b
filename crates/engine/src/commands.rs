//! Command structs for engine operations.
//!
//! Creation commands are built with `new` plus chained setters. Patches use
//! `Option` for "leave unchanged" and `Option<Option<_>>` for nullable fields,
//! where `Some(None)` clears the stored value.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{AccountKind, CategoryKind, PaymentMethodKind, TransactionKind};

/// Create an account.
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub name: String,
    pub kind: AccountKind,
    pub currency: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub is_default: bool,
    /// Opening balance in minor units. Zero writes nothing.
    pub initial_balance_minor: i64,
}

impl NewAccount {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: AccountKind, currency: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            currency: currency.into(),
            color: None,
            icon: None,
            is_default: false,
            initial_balance_minor: 0,
        }
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn default_account(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    #[must_use]
    pub fn initial_balance(mut self, amount_minor: i64) -> Self {
        self.initial_balance_minor = amount_minor;
        self
    }
}

/// Update an account. Currency is fixed at creation.
#[derive(Clone, Debug, Default)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub kind: Option<AccountKind>,
    pub color: Option<Option<String>>,
    pub icon: Option<Option<String>>,
    pub is_active: Option<bool>,
    /// `Some(true)` makes the account the default, `Some(false)` clears it.
    pub is_default: Option<bool>,
}

/// Create a payment method.
#[derive(Clone, Debug)]
pub struct NewPaymentMethod {
    pub name: String,
    pub kind: PaymentMethodKind,
    pub linked_account_id: Option<Uuid>,
    /// Falls back to the linked account's currency when unset.
    pub currency: Option<String>,
    pub credit_limit_minor: Option<i64>,
    pub billing_day: Option<i32>,
    pub due_day: Option<i32>,
    pub last_four: Option<String>,
    pub color: Option<String>,
    pub is_default: bool,
}

impl NewPaymentMethod {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: PaymentMethodKind) -> Self {
        Self {
            name: name.into(),
            kind,
            linked_account_id: None,
            currency: None,
            credit_limit_minor: None,
            billing_day: None,
            due_day: None,
            last_four: None,
            color: None,
            is_default: false,
        }
    }

    #[must_use]
    pub fn linked_account(mut self, account_id: Uuid) -> Self {
        self.linked_account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    #[must_use]
    pub fn credit_limit(mut self, limit_minor: i64) -> Self {
        self.credit_limit_minor = Some(limit_minor);
        self
    }

    #[must_use]
    pub fn cycle(mut self, billing_day: i32, due_day: i32) -> Self {
        self.billing_day = Some(billing_day);
        self.due_day = Some(due_day);
        self
    }

    #[must_use]
    pub fn last_four(mut self, digits: impl Into<String>) -> Self {
        self.last_four = Some(digits.into());
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn default_method(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }
}

/// Update a payment method. Kind and currency are fixed at creation.
#[derive(Clone, Debug, Default)]
pub struct PaymentMethodPatch {
    pub name: Option<String>,
    pub linked_account_id: Option<Option<Uuid>>,
    pub credit_limit_minor: Option<Option<i64>>,
    pub billing_day: Option<Option<i32>>,
    pub due_day: Option<Option<i32>>,
    pub last_four: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub is_default: Option<bool>,
}

/// Create a user category.
#[derive(Clone, Debug)]
pub struct NewCategory {
    pub name: String,
    /// Ignored when `parent_id` is set: children take the parent's kind.
    pub kind: CategoryKind,
    pub parent_id: Option<Uuid>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub sort_order: i32,
}

impl NewCategory {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: CategoryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent_id: None,
            icon: None,
            color: None,
            sort_order: 0,
        }
    }

    #[must_use]
    pub fn parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub kind: Option<CategoryKind>,
    pub parent_id: Option<Option<Uuid>>,
    pub icon: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub sort_order: Option<i32>,
}

/// Create an income, expense or settlement transaction.
#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub account_id: Option<Uuid>,
    pub payment_method_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    /// Falls back to the account (then payment method) currency.
    pub currency: Option<String>,
    pub description: String,
    pub notes: Option<String>,
    pub occurred_on: NaiveDate,
}

impl NewTransaction {
    #[must_use]
    pub fn new(
        kind: TransactionKind,
        amount_minor: i64,
        description: impl Into<String>,
        occurred_on: NaiveDate,
    ) -> Self {
        Self {
            kind,
            amount_minor,
            account_id: None,
            payment_method_id: None,
            category_id: None,
            currency: None,
            description: description.into(),
            notes: None,
            occurred_on,
        }
    }

    #[must_use]
    pub fn expense(amount_minor: i64, description: impl Into<String>, occurred_on: NaiveDate) -> Self {
        Self::new(TransactionKind::Expense, amount_minor, description, occurred_on)
    }

    #[must_use]
    pub fn income(amount_minor: i64, description: impl Into<String>, occurred_on: NaiveDate) -> Self {
        Self::new(TransactionKind::Income, amount_minor, description, occurred_on)
    }

    #[must_use]
    pub fn account(mut self, account_id: Uuid) -> Self {
        self.account_id = Some(account_id);
        self
    }

    #[must_use]
    pub fn payment_method(mut self, payment_method_id: Uuid) -> Self {
        self.payment_method_id = Some(payment_method_id);
        self
    }

    #[must_use]
    pub fn category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Update a transaction. The kind is fixed at creation.
///
/// On a transfer half, amount, date, description and notes are mirrored onto
/// the other half; account and payment method changes are rejected.
#[derive(Clone, Debug, Default)]
pub struct TransactionPatch {
    pub amount_minor: Option<i64>,
    pub account_id: Option<Option<Uuid>>,
    pub payment_method_id: Option<Option<Uuid>>,
    pub category_id: Option<Option<Uuid>>,
    pub description: Option<String>,
    pub notes: Option<Option<String>>,
    pub occurred_on: Option<NaiveDate>,
}

/// Move money between two accounts of the same user.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount_minor: i64,
    pub description: String,
    pub notes: Option<String>,
    pub occurred_on: NaiveDate,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount_minor: i64,
        occurred_on: NaiveDate,
    ) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount_minor,
            description: "Transfer".to_string(),
            notes: None,
            occurred_on,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Pay down a credit card from an account.
#[derive(Clone, Debug)]
pub struct SettlementCmd {
    pub payment_method_id: Uuid,
    pub account_id: Uuid,
    pub amount_minor: i64,
    pub description: String,
    pub notes: Option<String>,
    pub occurred_on: NaiveDate,
}

impl SettlementCmd {
    #[must_use]
    pub fn new(
        payment_method_id: Uuid,
        account_id: Uuid,
        amount_minor: i64,
        occurred_on: NaiveDate,
    ) -> Self {
        Self {
            payment_method_id,
            account_id,
            amount_minor,
            description: "Credit card payment".to_string(),
            notes: None,
            occurred_on,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
