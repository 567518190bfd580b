//! Pure aggregation over ledger rows.
//!
//! The database hands back `(kind, total)` pairs; folding them is kept here so
//! the sign rules live next to the classifier and can be tested without a
//! database. Totals are `i128` and results saturate at the `i64` range, so no
//! ledger content can make a read fail.

use crate::TransactionKind;

/// Divisor used to split per-kind sums into two SQL aggregates.
///
/// `SUM(amount_minor / SPLIT)` and `SUM(amount_minor % SPLIT)` stay far from
/// the `i64` range even for huge ledgers; [`join_total`] recombines them.
pub const SPLIT: i64 = 1_000_000;

/// Recombine the two halves summed by the database.
pub fn join_total(high: i64, low: i64) -> i128 {
    i128::from(high) * i128::from(SPLIT) + i128::from(low)
}

/// Signed account balance of `rows`.
///
/// Rows with a kind this build does not know are skipped and logged.
pub fn account_balance<'a, I>(rows: I) -> i64
where
    I: IntoIterator<Item = (&'a str, i128)>,
{
    fold(rows, TransactionKind::account_sign)
}

/// Outstanding credit-card debt of `rows`.
pub fn card_debt<'a, I>(rows: I) -> i64
where
    I: IntoIterator<Item = (&'a str, i128)>,
{
    fold(rows, TransactionKind::debt_sign)
}

/// Remaining credit, `None` when the card has no limit.
pub fn available_credit(credit_limit_minor: Option<i64>, debt_minor: i64) -> Option<i64> {
    credit_limit_minor.map(|limit| limit.saturating_sub(debt_minor))
}

fn fold<'a, I>(rows: I, sign: fn(TransactionKind) -> i64) -> i64
where
    I: IntoIterator<Item = (&'a str, i128)>,
{
    let total = rows
        .into_iter()
        .filter_map(|(kind, amount)| match TransactionKind::try_from(kind) {
            Ok(kind) => Some(i128::from(sign(kind)).saturating_mul(amount)),
            Err(_) => {
                tracing::warn!(kind, amount = %amount, "skipping ledger row with unknown kind");
                None
            }
        })
        .fold(0i128, i128::saturating_add);
    saturate(total)
}

fn saturate(total: i128) -> i64 {
    i64::try_from(total).unwrap_or_else(|_| {
        tracing::warn!(total = %total, "ledger total outside the i64 range");
        if total.is_negative() { i64::MIN } else { i64::MAX }
    })
}
