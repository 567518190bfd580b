//! Payment methods API endpoints

use api_types::payment_method::{
    CreditView, PaymentMethodKind as ApiKind, PaymentMethodNew, PaymentMethodUpdate,
    PaymentMethodView, PaymentMethodsResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{NewPaymentMethod, PaymentMethodPatch};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user::AuthUser};

fn map_kind(kind: engine::PaymentMethodKind) -> ApiKind {
    match kind {
        engine::PaymentMethodKind::CreditCard => ApiKind::CreditCard,
        engine::PaymentMethodKind::DebitCard => ApiKind::DebitCard,
        engine::PaymentMethodKind::PrepaidCard => ApiKind::PrepaidCard,
        engine::PaymentMethodKind::Cash => ApiKind::Cash,
        engine::PaymentMethodKind::Transfer => ApiKind::Transfer,
    }
}

fn view(method: engine::PaymentMethod) -> PaymentMethodView {
    PaymentMethodView {
        id: method.id,
        name: method.name,
        kind: map_kind(method.kind),
        linked_account_id: method.linked_account_id,
        currency: method.currency.code().to_string(),
        credit_limit_minor: method.credit_limit_minor,
        billing_day: method.billing_day,
        due_day: method.due_day,
        last_four: method.last_four,
        color: method.color,
        is_active: method.is_active,
        is_default: method.is_default,
    }
}

pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<PaymentMethodsResponse>, ServerError> {
    let payment_methods = state
        .engine
        .list_payment_methods(user.id())
        .await?
        .into_iter()
        .map(view)
        .collect();
    Ok(Json(PaymentMethodsResponse { payment_methods }))
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<PaymentMethodNew>,
) -> Result<(StatusCode, Json<PaymentMethodView>), ServerError> {
    let kind = engine::PaymentMethodKind::try_from(payload.kind.as_str())?;
    let mut cmd = NewPaymentMethod::new(payload.name, kind).default_method(payload.is_default);
    cmd.linked_account_id = payload.linked_account_id;
    cmd.currency = payload.currency;
    cmd.credit_limit_minor = payload.credit_limit_minor;
    cmd.billing_day = payload.billing_day;
    cmd.due_day = payload.due_day;
    cmd.last_four = payload.last_four;
    cmd.color = payload.color;

    let method = state.engine.create_payment_method(user.id(), cmd).await?;
    Ok((StatusCode::CREATED, Json(view(method))))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PaymentMethodUpdate>,
) -> Result<Json<PaymentMethodView>, ServerError> {
    let patch = PaymentMethodPatch {
        name: payload.name,
        linked_account_id: payload.linked_account_id,
        credit_limit_minor: payload.credit_limit_minor,
        billing_day: payload.billing_day,
        due_day: payload.due_day,
        last_four: payload.last_four,
        color: payload.color,
        is_active: payload.is_active,
        is_default: payload.is_default,
    };
    let method = state
        .engine
        .update_payment_method(user.id(), id, patch)
        .await?;
    Ok(Json(view(method)))
}

pub async fn delete(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_payment_method(user.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn make_default(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.set_default_payment_method(user.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Debt and available credit of a payment method.
pub async fn credit(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CreditView>, ServerError> {
    let summary = state.engine.credit_summary(user.id(), id).await?;
    Ok(Json(CreditView {
        payment_method_id: summary.payment_method_id,
        is_credit_card: summary.is_credit_card,
        credit_limit_minor: summary.credit_limit_minor,
        current_debt_minor: summary.current_debt_minor,
        available_credit_minor: summary.available_credit_minor,
    }))
}
