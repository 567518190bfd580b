//! Balance and debt reads.
//!
//! Nothing here is stored: every call groups the live ledger by kind and
//! folds it with [`crate::ledger`].

use std::collections::HashMap;

use sea_orm::{ConnectionTrait, QueryResult, Statement};
use serde::Serialize;
use uuid::Uuid;

use crate::{ResultEngine, ledger, payment_methods};

use super::Engine;

/// Debt and remaining credit of a payment method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CreditSummary {
    pub payment_method_id: Uuid,
    pub is_credit_card: bool,
    pub credit_limit_minor: Option<i64>,
    pub current_debt_minor: i64,
    pub available_credit_minor: Option<i64>,
}

/// Per-kind sums, split in two so SQLite's integer `SUM` cannot overflow.
const SPLIT_TOTALS: &str = "COALESCE(SUM(amount_minor / ?), 0) AS high, \
     COALESCE(SUM(amount_minor % ?), 0) AS low";

fn read_total(row: &QueryResult) -> ResultEngine<i128> {
    let high: i64 = row.try_get("", "high")?;
    let low: i64 = row.try_get("", "low")?;
    Ok(ledger::join_total(high, low))
}

/// `(kind, total)` per kind for one column/id pair.
async fn totals_by_kind<C: ConnectionTrait>(
    db: &C,
    column: &str,
    target_id: Uuid,
) -> ResultEngine<Vec<(String, i128)>> {
    let stmt = Statement::from_sql_and_values(
        db.get_database_backend(),
        format!(
            "SELECT kind, {SPLIT_TOTALS} \
             FROM transactions \
             WHERE {column} = ? AND deleted_at IS NULL \
             GROUP BY kind"
        ),
        vec![ledger::SPLIT.into(), ledger::SPLIT.into(), target_id.into()],
    );
    let rows = db.query_all(stmt).await?;
    rows.iter()
        .map(|row| -> ResultEngine<(String, i128)> {
            Ok((row.try_get("", "kind")?, read_total(row)?))
        })
        .collect()
}

impl Engine {
    /// Current balance of an account, in minor units.
    ///
    /// Sum of every non-deleted transaction on the account, signed by kind.
    /// An account without transactions has balance 0.
    pub async fn account_balance(&self, user_id: &str, account_id: Uuid) -> ResultEngine<i64> {
        self.require_account(&self.database, user_id, account_id)
            .await?;
        account_balance_of(&self.database, account_id).await
    }

    /// Outstanding debt of a credit card, in minor units.
    ///
    /// Always 0 for payment methods that are not credit cards.
    pub async fn current_debt(&self, user_id: &str, payment_method_id: Uuid) -> ResultEngine<i64> {
        let method = self
            .require_payment_method(&self.database, user_id, payment_method_id)
            .await?;
        card_debt_of(&self.database, &method).await
    }

    /// `credit_limit - current_debt`, `None` without a limit or for non-credit
    /// cards.
    pub async fn available_credit(
        &self,
        user_id: &str,
        payment_method_id: Uuid,
    ) -> ResultEngine<Option<i64>> {
        Ok(self
            .credit_summary(user_id, payment_method_id)
            .await?
            .available_credit_minor)
    }

    pub async fn credit_summary(
        &self,
        user_id: &str,
        payment_method_id: Uuid,
    ) -> ResultEngine<CreditSummary> {
        let method = self
            .require_payment_method(&self.database, user_id, payment_method_id)
            .await?;
        credit_summary_of(&self.database, &method).await
    }
}

pub(super) async fn account_balance_of<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
) -> ResultEngine<i64> {
    let totals = totals_by_kind(db, "account_id", account_id).await?;
    Ok(ledger::account_balance(
        totals.iter().map(|(kind, total)| (kind.as_str(), *total)),
    ))
}

pub(super) async fn card_debt_of<C: ConnectionTrait>(
    db: &C,
    method: &payment_methods::Model,
) -> ResultEngine<i64> {
    if !method.is_credit_card() {
        return Ok(0);
    }
    let totals = totals_by_kind(db, "payment_method_id", method.id).await?;
    Ok(ledger::card_debt(
        totals.iter().map(|(kind, total)| (kind.as_str(), *total)),
    ))
}

pub(super) async fn credit_summary_of<C: ConnectionTrait>(
    db: &C,
    method: &payment_methods::Model,
) -> ResultEngine<CreditSummary> {
    let is_credit_card = method.is_credit_card();
    let current_debt_minor = card_debt_of(db, method).await?;
    let credit_limit_minor = method.credit_limit_minor.filter(|_| is_credit_card);
    Ok(CreditSummary {
        payment_method_id: method.id,
        is_credit_card,
        credit_limit_minor,
        current_debt_minor,
        available_credit_minor: ledger::available_credit(credit_limit_minor, current_debt_minor),
    })
}

/// Balances of every account of `user_id` in a single pass over the ledger.
///
/// Accounts without transactions are absent from the map.
pub(super) async fn account_balances_of<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
) -> ResultEngine<HashMap<Uuid, i64>> {
    let stmt = Statement::from_sql_and_values(
        db.get_database_backend(),
        format!(
            "SELECT account_id, kind, {SPLIT_TOTALS} \
             FROM transactions \
             WHERE user_id = ? AND account_id IS NOT NULL AND deleted_at IS NULL \
             GROUP BY account_id, kind"
        ),
        vec![ledger::SPLIT.into(), ledger::SPLIT.into(), user_id.into()],
    );
    let rows = db.query_all(stmt).await?;

    let mut grouped: HashMap<Uuid, Vec<(String, i128)>> = HashMap::new();
    for row in rows {
        let account_id: Uuid = row.try_get("", "account_id")?;
        let kind: String = row.try_get("", "kind")?;
        let total = read_total(&row)?;
        grouped.entry(account_id).or_default().push((kind, total));
    }

    Ok(grouped
        .into_iter()
        .map(|(account_id, totals)| {
            let balance =
                ledger::account_balance(totals.iter().map(|(kind, total)| (kind.as_str(), *total)));
            (account_id, balance)
        })
        .collect())
}
