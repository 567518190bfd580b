//! Assistant tool endpoints

use api_types::tool::{ToolCallRequest, ToolCallResponse, ToolView, ToolsResponse};
use axum::{Extension, Json, extract::State};
use engine::{ToolCall, tool_specs};

use crate::{ServerError, server::ServerState, user::AuthUser};

/// Tool descriptors, to be handed to the model.
pub async fn list(Extension(_user): Extension<AuthUser>) -> Json<ToolsResponse> {
    let tools = tool_specs()
        .into_iter()
        .map(|spec| ToolView {
            name: spec.name.to_string(),
            description: spec.description.to_string(),
            parameters: spec.parameters,
        })
        .collect();
    Json(ToolsResponse { tools })
}

pub async fn call(
    Extension(user): Extension<AuthUser>,
    State(state): State<ServerState>,
    Json(payload): Json<ToolCallRequest>,
) -> Result<Json<ToolCallResponse>, ServerError> {
    let call = ToolCall::parse(&payload.name, payload.arguments)?;
    let name = call.name().to_string();
    let result = state.engine.call_tool(user.id(), call).await?;
    Ok(Json(ToolCallResponse { name, result }))
}
