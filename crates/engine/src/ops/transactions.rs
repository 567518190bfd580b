use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::{Transaction, TransactionKind};

mod list;
mod write;

/// Filters for listing transactions.
///
/// `from` and `to` are both inclusive.
#[derive(Clone, Debug, Default)]
pub struct TransactionFilter {
    pub account_id: Option<Uuid>,
    pub payment_method_id: Option<Uuid>,
    /// Matches the category and its direct children.
    pub category_id: Option<Uuid>,
    /// If present, acts as an allow-list of kinds to return.
    pub kinds: Option<Vec<TransactionKind>>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// If true, includes soft-deleted transactions (default: false).
    pub include_deleted: bool,
}

/// One page of transactions, newest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    /// Opaque cursor for the next page, `None` on the last page.
    pub next_cursor: Option<String>,
}
