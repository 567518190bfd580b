//! Transactions API endpoints

use api_types::transaction::{
    SettlementNew, TransactionKind as ApiKind, TransactionList, TransactionListResponse,
    TransactionNew, TransactionUpdate, TransactionView, TransferCreated, TransferNew,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{
    EngineError, NewTransaction, SettlementCmd, TransactionFilter, TransactionPatch, TransferCmd,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user::AuthUser};

const DEFAULT_PAGE_SIZE: u64 = 50;

fn map_kind(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::Expense => ApiKind::Expense,
        engine::TransactionKind::Income => ApiKind::Income,
        engine::TransactionKind::TransferOut => ApiKind::TransferOut,
        engine::TransactionKind::TransferIn => ApiKind::TransferIn,
        engine::TransactionKind::Settlement => ApiKind::Settlement,
        engine::TransactionKind::InitialBalance => ApiKind::InitialBalance,
    }
}

fn parse_kinds(raw: &str) -> Result<Vec<engine::TransactionKind>, EngineError> {
    raw.split(',')
        .map(str::trim)
        .filter(|kind| !kind.is_empty())
        .map(|kind| {
            engine::TransactionKind::try_from(kind).map_err(|_| {
                EngineError::invalid("kinds", format!("invalid transaction kind: {kind}"))
            })
        })
        .collect()
}

fn view(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        kind: map_kind(tx.kind),
        account_id: tx.account_id,
        payment_method_id: tx.payment_method_id,
        category_id: tx.category_id,
        linked_transaction_id: tx.linked_transaction_id,
        amount_minor: tx.amount_minor,
        currency: tx.currency.code().to_string(),
        description: tx.description,
        notes: tx.notes,
        occurred_on: tx.occurred_on,
    }
}

/// List transactions, newest first.
pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionList>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let filter = TransactionFilter {
        account_id: query.account_id,
        payment_method_id: query.payment_method_id,
        category_id: query.category_id,
        kinds: query.kinds.as_deref().map(parse_kinds).transpose()?,
        from: query.from,
        to: query.to,
        include_deleted: query.include_deleted.unwrap_or(false),
    };

    let page = state
        .engine
        .list_transactions(
            user.id(),
            &filter,
            query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            query.cursor.as_deref(),
        )
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: page.items.into_iter().map(view).collect(),
        next_cursor: page.next_cursor,
    }))
}

/// Record an income, an expense or a settlement.
pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let kind = engine::TransactionKind::try_from(payload.kind.as_str())?;
    let mut cmd = NewTransaction::new(
        kind,
        payload.amount_minor,
        payload.description,
        payload.occurred_on,
    );
    cmd.account_id = payload.account_id;
    cmd.payment_method_id = payload.payment_method_id;
    cmd.category_id = payload.category_id;
    cmd.currency = payload.currency;
    cmd.notes = payload.notes;

    let tx = state.engine.create_transaction(user.id(), cmd).await?;
    Ok((StatusCode::CREATED, Json(view(tx))))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let patch = TransactionPatch {
        amount_minor: payload.amount_minor,
        account_id: payload.account_id,
        payment_method_id: payload.payment_method_id,
        category_id: payload.category_id,
        description: payload.description,
        notes: payload.notes,
        occurred_on: payload.occurred_on,
    };
    let tx = state
        .engine
        .update_transaction(user.id(), id, patch)
        .await?;
    Ok(Json(view(tx)))
}

/// Soft delete. Deleting one half of a transfer deletes both.
pub async fn delete(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_transaction(user.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn transfer(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<TransferNew>,
) -> Result<(StatusCode, Json<TransferCreated>), ServerError> {
    let mut cmd = TransferCmd::new(
        payload.from_account_id,
        payload.to_account_id,
        payload.amount_minor,
        payload.occurred_on,
    );
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    cmd.notes = payload.notes;

    let (outgoing, incoming) = state.engine.transfer(user.id(), cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(TransferCreated {
            outgoing: view(outgoing),
            incoming: view(incoming),
        }),
    ))
}

/// Pay down a credit card from an account.
pub async fn settle(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<SettlementNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let mut cmd = SettlementCmd::new(
        payload.payment_method_id,
        payload.account_id,
        payload.amount_minor,
        payload.occurred_on,
    );
    if let Some(description) = payload.description {
        cmd = cmd.description(description);
    }
    cmd.notes = payload.notes;

    let tx = state.engine.settle_credit_card(user.id(), cmd).await?;
    Ok((StatusCode::CREATED, Json(view(tx))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_comma_separated() {
        assert_eq!(
            parse_kinds("expense, settlement,").unwrap(),
            vec![
                engine::TransactionKind::Expense,
                engine::TransactionKind::Settlement
            ]
        );
    }

    #[test]
    fn unknown_kind_is_reported_on_kinds() {
        let Err(EngineError::Validation(errors)) = parse_kinds("expense,refund") else {
            panic!("expected a validation error");
        };
        assert!(errors.has("kinds"));
    }
}
