use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Deserializes a nullable field of a PATCH body.
///
/// A missing field stays `None` (thanks to `#[serde(default)]`), an explicit
/// `null` becomes `Some(None)` and a value becomes `Some(Some(value))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Error body returned by the server.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Present on validation failures only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldErrorView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FieldErrorView {
    pub field: String,
    pub message: String,
}

pub mod account {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum AccountKind {
        Checking,
        Savings,
        Cash,
        Investment,
    }

    impl AccountKind {
        pub fn as_str(self) -> &'static str {
            match self {
                Self::Checking => "checking",
                Self::Savings => "savings",
                Self::Cash => "cash",
                Self::Investment => "investment",
            }
        }
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub name: String,
        pub kind: AccountKind,
        /// ISO 4217 code, e.g. "EUR".
        pub currency: String,
        pub color: Option<String>,
        pub icon: Option<String>,
        #[serde(default)]
        pub is_default: bool,
        /// Opening balance in minor units.
        #[serde(default)]
        pub initial_balance_minor: i64,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct AccountUpdate {
        pub name: Option<String>,
        pub kind: Option<AccountKind>,
        #[serde(default, deserialize_with = "double_option")]
        pub color: Option<Option<String>>,
        #[serde(default, deserialize_with = "double_option")]
        pub icon: Option<Option<String>>,
        pub is_active: Option<bool>,
        pub is_default: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub name: String,
        pub kind: AccountKind,
        pub currency: String,
        pub color: Option<String>,
        pub icon: Option<String>,
        pub is_active: bool,
        pub is_default: bool,
        /// Live balance in minor units; absent on mutation responses.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub balance_minor: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountsResponse {
        pub accounts: Vec<AccountView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceView {
        pub account_id: Uuid,
        pub currency: String,
        pub balance_minor: i64,
    }
}

pub mod payment_method {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
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
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentMethodNew {
        pub name: String,
        pub kind: PaymentMethodKind,
        /// Required for every kind except credit cards.
        pub linked_account_id: Option<Uuid>,
        /// Defaults to the linked account's currency.
        pub currency: Option<String>,
        pub credit_limit_minor: Option<i64>,
        pub billing_day: Option<i32>,
        pub due_day: Option<i32>,
        pub last_four: Option<String>,
        pub color: Option<String>,
        #[serde(default)]
        pub is_default: bool,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct PaymentMethodUpdate {
        pub name: Option<String>,
        #[serde(default, deserialize_with = "double_option")]
        pub linked_account_id: Option<Option<Uuid>>,
        #[serde(default, deserialize_with = "double_option")]
        pub credit_limit_minor: Option<Option<i64>>,
        #[serde(default, deserialize_with = "double_option")]
        pub billing_day: Option<Option<i32>>,
        #[serde(default, deserialize_with = "double_option")]
        pub due_day: Option<Option<i32>>,
        #[serde(default, deserialize_with = "double_option")]
        pub last_four: Option<Option<String>>,
        #[serde(default, deserialize_with = "double_option")]
        pub color: Option<Option<String>>,
        pub is_active: Option<bool>,
        pub is_default: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentMethodView {
        pub id: Uuid,
        pub name: String,
        pub kind: PaymentMethodKind,
        pub linked_account_id: Option<Uuid>,
        pub currency: String,
        pub credit_limit_minor: Option<i64>,
        pub billing_day: Option<i32>,
        pub due_day: Option<i32>,
        pub last_four: Option<String>,
        pub color: Option<String>,
        pub is_active: bool,
        pub is_default: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentMethodsResponse {
        pub payment_methods: Vec<PaymentMethodView>,
    }

    /// Debt snapshot of a payment method. Zero debt for non-credit kinds.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CreditView {
        pub payment_method_id: Uuid,
        pub is_credit_card: bool,
        pub credit_limit_minor: Option<i64>,
        pub current_debt_minor: i64,
        /// `None` when the card has no limit.
        pub available_credit_minor: Option<i64>,
    }
}

pub mod category {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
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

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        /// Ignored for subcategories, which take their parent's kind.
        pub kind: CategoryKind,
        pub parent_id: Option<Uuid>,
        pub icon: Option<String>,
        pub color: Option<String>,
        #[serde(default)]
        pub sort_order: i32,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        pub kind: Option<CategoryKind>,
        #[serde(default, deserialize_with = "double_option")]
        pub parent_id: Option<Option<Uuid>>,
        #[serde(default, deserialize_with = "double_option")]
        pub icon: Option<Option<String>>,
        #[serde(default, deserialize_with = "double_option")]
        pub color: Option<Option<String>>,
        pub sort_order: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub parent_id: Option<Uuid>,
        pub name: String,
        pub kind: CategoryKind,
        pub icon: Option<String>,
        pub color: Option<String>,
        pub is_system: bool,
        pub sort_order: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoriesResponse {
        pub categories: Vec<CategoryView>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
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
    }

    /// Query string of `GET /transactions`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionList {
        pub account_id: Option<Uuid>,
        pub payment_method_id: Option<Uuid>,
        /// Matches the category and its subcategories.
        pub category_id: Option<Uuid>,
        /// Comma separated kinds, e.g. `expense,settlement`.
        pub kinds: Option<String>,
        /// Inclusive.
        pub from: Option<NaiveDate>,
        /// Inclusive.
        pub to: Option<NaiveDate>,
        pub limit: Option<u64>,
        /// Opaque pagination cursor, from `next_cursor`.
        ///
        /// Newest → older pagination.
        pub cursor: Option<String>,
        pub include_deleted: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub kind: TransactionKind,
        pub account_id: Option<Uuid>,
        pub payment_method_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        pub linked_transaction_id: Option<Uuid>,
        /// Always positive; the kind gives the direction.
        pub amount_minor: i64,
        pub currency: String,
        pub description: String,
        pub notes: Option<String>,
        pub occurred_on: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        /// Opaque cursor for fetching the next page (older items).
        pub next_cursor: Option<String>,
    }

    /// Body of `POST /transactions`: income, expense or settlement.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub kind: TransactionKind,
        pub amount_minor: i64,
        pub description: String,
        pub occurred_on: NaiveDate,
        pub account_id: Option<Uuid>,
        pub payment_method_id: Option<Uuid>,
        pub category_id: Option<Uuid>,
        pub currency: Option<String>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub amount_minor: Option<i64>,
        #[serde(default, deserialize_with = "double_option")]
        pub account_id: Option<Option<Uuid>>,
        #[serde(default, deserialize_with = "double_option")]
        pub payment_method_id: Option<Option<Uuid>>,
        #[serde(default, deserialize_with = "double_option")]
        pub category_id: Option<Option<Uuid>>,
        pub description: Option<String>,
        #[serde(default, deserialize_with = "double_option")]
        pub notes: Option<Option<String>>,
        pub occurred_on: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        pub from_account_id: Uuid,
        pub to_account_id: Uuid,
        pub amount_minor: i64,
        pub occurred_on: NaiveDate,
        pub description: Option<String>,
        pub notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferCreated {
        pub outgoing: TransactionView,
        pub incoming: TransactionView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SettlementNew {
        pub payment_method_id: Uuid,
        pub account_id: Uuid,
        pub amount_minor: i64,
        pub occurred_on: NaiveDate,
        pub description: Option<String>,
        pub notes: Option<String>,
    }
}

pub mod tool {
    use super::*;

    /// Body of `POST /tools/call`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ToolCallRequest {
        pub name: String,
        #[serde(default)]
        pub arguments: serde_json::Value,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ToolCallResponse {
        pub name: String,
        pub result: serde_json::Value,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ToolView {
        pub name: String,
        pub description: String,
        pub parameters: serde_json::Value,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ToolsResponse {
        pub tools: Vec<ToolView>,
    }
}
