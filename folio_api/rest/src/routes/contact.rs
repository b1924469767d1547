use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing, Json, Router,
};
use folio_core_contact_contracts::{ContactFeatureService, ContactSendMessageError};
use folio_email_contracts::EmailFailureKind;
use folio_models::contact::{ContactSubmission, ContactValidationError};
use tracing::{debug, error};

use super::{error, internal_server_error, method_not_allowed};
use crate::models::contact::{ApiContactReceipt, ApiContactSubmission};

pub fn router(service: Arc<impl ContactFeatureService>) -> Router<()> {
    Router::new()
        .route(
            "/api/contact",
            routing::post(send_message).fallback(method_not_allowed),
        )
        .with_state(service)
}

async fn send_message(
    service: State<Arc<impl ContactFeatureService>>,
    submission: Result<Json<ApiContactSubmission>, JsonRejection>,
) -> Response {
    let submission = match submission {
        Ok(Json(submission)) => submission.into(),
        Err(err) => {
            debug!(%err, "Could not parse contact submission");
            ContactSubmission::default()
        }
    };

    match service.send_message(submission).await {
        Ok(receipt) => Json(ApiContactReceipt {
            message: "Message sent!",
            id: receipt.message_id,
        })
        .into_response(),
        Err(ContactSendMessageError::Configuration(missing)) => error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server configuration error",
            Some(
                format!(
                    "Missing required environment variables: {}",
                    missing.join(", ")
                )
                .into(),
            ),
        ),
        Err(ContactSendMessageError::Validation(err)) => validation_error(err),
        Err(ContactSendMessageError::Send(err)) => {
            error!(kind = %err.kind, "Failed to send contact message: {:#}", err.source);
            error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to send message",
                Some(failure_detail(err.kind).into()),
            )
        }
        Err(ContactSendMessageError::Other(err)) => internal_server_error(err),
    }
}

fn validation_error(err: ContactValidationError) -> Response {
    let (message, detail) = match err {
        ContactValidationError::MissingFields => (
            "Missing required fields",
            "Name, email, and message are required",
        ),
        ContactValidationError::InvalidEmail => (
            "Invalid email format",
            "Please provide a valid email address",
        ),
        ContactValidationError::TooLong => (
            "Field too long",
            "Name and company are limited to 256 characters, the message to 4096 characters",
        ),
    };
    error(StatusCode::BAD_REQUEST, message, Some(detail.into()))
}

fn failure_detail(kind: EmailFailureKind) -> &'static str {
    match kind {
        EmailFailureKind::Authentication => "Authentication with the mail server failed",
        EmailFailureKind::Socket => "Network error while communicating with the mail server",
        EmailFailureKind::Timeout => "Timed out while sending the email",
        EmailFailureKind::Connection => "Could not connect to the mail server",
        EmailFailureKind::Unknown => "An unexpected error occurred while sending the email",
    }
}
