use base64::Engine as _;
use chrono::NaiveDate;
use sea_orm::{Condition, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Transaction, ValidationErrors, categories, transactions};

use super::super::{Engine, with_tx};
use super::{TransactionFilter, TransactionPage};

/// Largest page handed out, whatever the caller asks for.
pub(crate) const MAX_PAGE_SIZE: u64 = 200;

fn check_filter(errors: &mut ValidationErrors, filter: &TransactionFilter, limit: u64) {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        errors.add("from", "must not be after to");
    }
    errors.check(
        filter.kinds.as_ref().is_some_and(Vec::is_empty),
        "kinds",
        "must not be empty",
    );
    errors.check(limit == 0, "limit", "must be > 0");
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionFilter) -> Self {
        if let Some(account_id) = filter.account_id {
            self = self.filter(transactions::Column::AccountId.eq(account_id));
        }
        if let Some(payment_method_id) = filter.payment_method_id {
            self = self.filter(transactions::Column::PaymentMethodId.eq(payment_method_id));
        }
        if let Some(from) = filter.from {
            self = self.filter(transactions::Column::OccurredOn.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(transactions::Column::OccurredOn.lte(to));
        }
        if !filter.include_deleted {
            self = self.filter(transactions::Column::DeletedAt.is_null());
        }
        if let Some(kinds) = &filter.kinds {
            let kinds: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
            self = self.filter(transactions::Column::Kind.is_in(kinds));
        }
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TransactionsCursor {
    occurred_on: NaiveDate,
    transaction_id: Uuid,
}

impl TransactionsCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::invalid("cursor", "invalid transactions cursor"))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::invalid("cursor", "invalid transactions cursor"))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::invalid("cursor", "invalid transactions cursor"))
    }
}

impl Engine {
    /// Lists the user's transactions, with cursor-based pagination.
    ///
    /// Pagination is newest → older by `(occurred_on DESC, id DESC)`. `limit`
    /// is capped at 200. Rows whose stored kind is unknown are skipped.
    pub async fn list_transactions(
        &self,
        user_id: &str,
        filter: &TransactionFilter,
        limit: u64,
        cursor: Option<&str>,
    ) -> ResultEngine<TransactionPage> {
        let mut errors = ValidationErrors::new();
        check_filter(&mut errors, filter, limit);
        let cursor = match cursor.map(TransactionsCursor::decode).transpose() {
            Ok(cursor) => cursor,
            Err(err) => {
                errors.absorb(Err(err))?;
                None
            }
        };
        let limit = limit.min(MAX_PAGE_SIZE);

        with_tx!(self, |db_tx| {
            if let Some(account_id) = filter.account_id {
                let found = self.find_owned_account(&db_tx, user_id, account_id).await?;
                errors.check(found.is_none(), "account_id", "does not exist");
            }
            if let Some(payment_method_id) = filter.payment_method_id {
                let found = self
                    .find_owned_payment_method(&db_tx, user_id, payment_method_id)
                    .await?;
                errors.check(found.is_none(), "payment_method_id", "does not exist");
            }
            let category_ids = match filter.category_id {
                Some(category_id) => {
                    let found = self
                        .find_visible_category(&db_tx, user_id, category_id)
                        .await?;
                    errors.check(found.is_none(), "category_id", "does not exist");
                    let mut ids: Vec<Uuid> = categories::Entity::find()
                        .select_only()
                        .column(categories::Column::Id)
                        .filter(categories::Column::ParentId.eq(category_id))
                        .into_tuple()
                        .all(&db_tx)
                        .await?;
                    ids.push(category_id);
                    Some(ids)
                }
                None => None,
            };
            errors.into_result()?;

            let limit_plus_one = limit.saturating_add(1);
            let mut query = transactions::Entity::find()
                .filter(transactions::Column::UserId.eq(user_id))
                .order_by_desc(transactions::Column::OccurredOn)
                .order_by_desc(transactions::Column::Id)
                .limit(limit_plus_one);

            if let Some(category_ids) = category_ids {
                query = query.filter(transactions::Column::CategoryId.is_in(category_ids));
            }
            if let Some(cursor) = cursor {
                query = query.filter(
                    Condition::any()
                        .add(transactions::Column::OccurredOn.lt(cursor.occurred_on))
                        .add(
                            Condition::all()
                                .add(transactions::Column::OccurredOn.eq(cursor.occurred_on))
                                .add(transactions::Column::Id.lt(cursor.transaction_id)),
                        ),
                );
            }
            query = query.apply_tx_filters(filter);

            let rows: Vec<transactions::Model> = query.all(&db_tx).await?;
            let has_more = rows.len() as u64 > limit;

            let mut last_seen = None;
            let mut items: Vec<Transaction> = Vec::with_capacity(rows.len());
            for model in rows.into_iter().take(limit as usize) {
                last_seen = Some(TransactionsCursor {
                    occurred_on: model.occurred_on,
                    transaction_id: model.id,
                });
                let id = model.id;
                match Transaction::try_from(model) {
                    Ok(tx) => items.push(tx),
                    Err(err) => tracing::warn!(%id, %err, "skipping unreadable transaction"),
                }
            }

            let next_cursor = if has_more {
                last_seen.map(|c| c.encode()).transpose()?
            } else {
                None
            };

            Ok(TransactionPage { items, next_cursor })
        })
    }
}
