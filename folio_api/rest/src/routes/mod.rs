use std::borrow::Cow;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::models::ApiError;

pub mod contact;
pub mod health;

pub fn internal_server_error(err: impl Into<anyhow::Error>) -> Response {
    let err = err.into();
    tracing::error!("internal server error: {err:#}");
    error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", None)
}

pub async fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, "Not found", None)
}

async fn method_not_allowed() -> Response {
    (
        [(header::ALLOW, "POST")],
        error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed", None),
    )
        .into_response()
}

fn error(code: StatusCode, message: &'static str, detail: Option<Cow<'static, str>>) -> Response {
    (code, Json(ApiError { message, detail })).into_response()
}
