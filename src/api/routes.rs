use crate::api::handlers::ApiState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn health_routes() -> Router<ApiState> {
    Router::new().route("/health", get(super::handlers::health_check))
}

pub fn tool_routes() -> Router<ApiState> {
    Router::new()
        .route("/list_tools", get(super::handlers::list_tools))
        .route("/call_tool", post(super::handlers::call_tool))
}
