//! Accounts API endpoints

use api_types::account::{
    AccountKind as ApiKind, AccountNew, AccountUpdate, AccountView, AccountsResponse, BalanceView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{AccountPatch, NewAccount};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user::AuthUser};

fn map_kind(kind: engine::AccountKind) -> ApiKind {
    match kind {
        engine::AccountKind::Checking => ApiKind::Checking,
        engine::AccountKind::Savings => ApiKind::Savings,
        engine::AccountKind::Cash => ApiKind::Cash,
        engine::AccountKind::Investment => ApiKind::Investment,
    }
}

fn engine_kind(kind: ApiKind) -> Result<engine::AccountKind, ServerError> {
    Ok(engine::AccountKind::try_from(kind.as_str())?)
}

fn view(account: engine::Account, balance_minor: Option<i64>) -> AccountView {
    AccountView {
        id: account.id,
        name: account.name,
        kind: map_kind(account.kind),
        currency: account.currency.code().to_string(),
        color: account.color,
        icon: account.icon,
        is_active: account.is_active,
        is_default: account.is_default,
        balance_minor,
    }
}

/// List the caller's accounts with their live balances.
pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<AccountsResponse>, ServerError> {
    let accounts = state
        .engine
        .list_accounts(user.id())
        .await?
        .into_iter()
        .map(|item| view(item.account, Some(item.balance_minor)))
        .collect();
    Ok(Json(AccountsResponse { accounts }))
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<AccountNew>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let mut cmd = NewAccount::new(payload.name, engine_kind(payload.kind)?, payload.currency)
        .default_account(payload.is_default)
        .initial_balance(payload.initial_balance_minor);
    cmd.color = payload.color;
    cmd.icon = payload.icon;

    let account = state.engine.create_account(user.id(), cmd).await?;
    let balance = state.engine.account_balance(user.id(), account.id).await?;
    Ok((StatusCode::CREATED, Json(view(account, Some(balance)))))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AccountUpdate>,
) -> Result<Json<AccountView>, ServerError> {
    let patch = AccountPatch {
        name: payload.name,
        kind: payload.kind.map(engine_kind).transpose()?,
        color: payload.color,
        icon: payload.icon,
        is_active: payload.is_active,
        is_default: payload.is_default,
    };
    let account = state.engine.update_account(user.id(), id, patch).await?;
    Ok(Json(view(account, None)))
}

pub async fn delete(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_account(user.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn make_default(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.set_default_account(user.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn balance(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BalanceView>, ServerError> {
    let item = state.engine.account(user.id(), id).await?;
    Ok(Json(BalanceView {
        account_id: item.account.id,
        currency: item.account.currency.code().to_string(),
        balance_minor: item.balance_minor,
    }))
}
