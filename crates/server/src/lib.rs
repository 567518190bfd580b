use api_types::{ErrorResponse, FieldErrorView};
use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

pub use server::{ServerState, router, run, run_with_listener, spawn_with_listener};

mod accounts;
mod categories;
mod payment_methods;
mod server;
mod tools;
mod transactions;
mod user;

pub mod types {
    pub mod account {
        pub use api_types::account::{
            AccountKind, AccountNew, AccountUpdate, AccountView, AccountsResponse, BalanceView,
        };
    }

    pub mod payment_method {
        pub use api_types::payment_method::{
            CreditView, PaymentMethodKind, PaymentMethodNew, PaymentMethodUpdate,
            PaymentMethodView, PaymentMethodsResponse,
        };
    }

    pub mod category {
        pub use api_types::category::{
            CategoriesResponse, CategoryKind, CategoryNew, CategoryUpdate, CategoryView,
        };
    }

    pub mod transaction {
        pub use api_types::transaction::{
            SettlementNew, TransactionKind, TransactionList, TransactionListResponse,
            TransactionNew, TransactionUpdate, TransactionView, TransferCreated, TransferNew,
        };
    }

    pub mod tool {
        pub use api_types::tool::{ToolCallRequest, ToolCallResponse, ToolView, ToolsResponse};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn body_for_engine_error(err: EngineError) -> ErrorResponse {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            ErrorResponse {
                error: "internal server error".to_string(),
                fields: Vec::new(),
            }
        }
        EngineError::Validation(errors) => ErrorResponse {
            error: "validation failed".to_string(),
            fields: errors
                .fields()
                .iter()
                .map(|field| FieldErrorView {
                    field: field.field.clone(),
                    message: field.message.clone(),
                })
                .collect(),
        },
        other => ErrorResponse {
            error: other.to_string(),
            fields: Vec::new(),
        },
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), body_for_engine_error(err)),
            ServerError::Generic(error) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error,
                    fields: Vec::new(),
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}
