//! Categories API endpoints

use api_types::category::{
    CategoriesResponse, CategoryKind as ApiKind, CategoryNew, CategoryUpdate, CategoryView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{CategoryPatch, NewCategory};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, user::AuthUser};

fn map_kind(kind: engine::CategoryKind) -> ApiKind {
    match kind {
        engine::CategoryKind::Expense => ApiKind::Expense,
        engine::CategoryKind::Income => ApiKind::Income,
        engine::CategoryKind::System => ApiKind::System,
    }
}

fn engine_kind(kind: ApiKind) -> Result<engine::CategoryKind, ServerError> {
    Ok(engine::CategoryKind::try_from(kind.as_str())?)
}

fn view(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        parent_id: category.parent_id,
        name: category.name,
        kind: map_kind(category.kind),
        icon: category.icon,
        color: category.color,
        is_system: category.is_system,
        sort_order: category.sort_order,
    }
}

/// List the caller's categories and the system ones.
pub async fn list(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Result<Json<CategoriesResponse>, ServerError> {
    let categories = state
        .engine
        .list_categories(user.id())
        .await?
        .into_iter()
        .map(view)
        .collect();
    Ok(Json(CategoriesResponse { categories }))
}

pub async fn create(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<CategoryNew>,
) -> Result<(StatusCode, Json<CategoryView>), ServerError> {
    let mut cmd =
        NewCategory::new(payload.name, engine_kind(payload.kind)?).sort_order(payload.sort_order);
    cmd.parent_id = payload.parent_id;
    cmd.icon = payload.icon;
    cmd.color = payload.color;

    let category = state.engine.create_category(user.id(), cmd).await?;
    Ok((StatusCode::CREATED, Json(view(category))))
}

pub async fn update(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryUpdate>,
) -> Result<Json<CategoryView>, ServerError> {
    let patch = CategoryPatch {
        name: payload.name,
        kind: payload.kind.map(engine_kind).transpose()?,
        parent_id: payload.parent_id,
        icon: payload.icon,
        color: payload.color,
        sort_order: payload.sort_order,
    };
    let category = state.engine.update_category(user.id(), id, patch).await?;
    Ok(Json(view(category)))
}

pub async fn delete(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_category(user.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
