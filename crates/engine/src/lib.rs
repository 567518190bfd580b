pub use accounts::{Account, AccountKind, AccountWithBalance};
pub use assistant::{CreateTransactionArgs, ListTransactionsArgs, ToolCall, ToolSpec, tool_specs};
pub use categories::{Category, CategoryKind};
pub use commands::{
    AccountPatch, CategoryPatch, NewAccount, NewCategory, NewPaymentMethod, NewTransaction,
    PaymentMethodPatch, SettlementCmd, TransactionPatch, TransferCmd,
};
pub use currency::Currency;
pub use error::{EngineError, FieldError, ValidationErrors};
pub use ops::{CreditSummary, Engine, EngineBuilder, TransactionFilter, TransactionPage};
pub use payment_methods::{PaymentMethod, PaymentMethodKind};
pub use transactions::{Direction, Transaction, TransactionKind};
pub use util::MAX_AMOUNT_MINOR;

mod accounts;
mod assistant;
mod categories;
mod commands;
mod currency;
mod error;
pub mod ledger;
mod ops;
mod payment_methods;
mod transactions;
mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
