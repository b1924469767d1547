use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use folio_core_contact_contracts::ContactFeatureService;
use folio_core_health_contracts::HealthFeatureService;
use folio_di::Build;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

mod middlewares;
mod models;
mod routes;

#[derive(Debug, Clone, Build)]
pub struct RestServer<Health, Contact> {
    health: Health,
    contact: Contact,
    config: RestServerConfig,
}

#[derive(Debug, Clone)]
pub struct RestServerConfig {
    pub addr: SocketAddr,
    /// Origins that may call the api from a browser.
    pub allowed_origins: Arc<[HeaderValue]>,
}

impl<Health, Contact> RestServer<Health, Contact>
where
    Health: HealthFeatureService,
    Contact: ContactFeatureService,
{
    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = self.config.addr;
        let router = self.router();

        info!(%addr, "Starting REST API server");
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind to {addr}"))?;
        axum::serve(listener, router).await.map_err(Into::into)
    }

    fn router(self) -> Router<()> {
        let router = Router::new()
            .merge(routes::health::router(self.health.into()))
            .merge(routes::contact::router(self.contact.into()))
            .fallback(routes::not_found);

        let router = middlewares::panic_handler::add(router);
        let router = middlewares::trace::add(router);
        let router = middlewares::request_id::add(router);

        router.layer(cors(&self.config.allowed_origins))
    }
}

fn cors(allowed_origins: &[HeaderValue]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins.iter().cloned()))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use folio_core_contact_contracts::{
        ContactReceipt, ContactSendMessageError, MockContactFeatureService,
    };
    use folio_core_health_contracts::{HealthStatus, MockHealthFeatureService};
    use folio_email_contracts::{EmailFailureKind, EmailSendError};
    use folio_models::contact::{ContactSubmission, ContactValidationError};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    type Sut = RestServer<MockHealthFeatureService, MockContactFeatureService>;

    fn sut(health: MockHealthFeatureService, contact: MockContactFeatureService) -> Router<()> {
        Sut {
            health,
            contact,
            config: RestServerConfig {
                addr: ([127, 0, 0, 1], 0).into(),
                allowed_origins: [HeaderValue::from_static("https://folio.example")].into(),
            },
        }
        .router()
    }

    fn submission() -> ContactSubmission {
        ContactSubmission {
            name: Some("Ola".into()),
            email: Some("ola@example.com".into()),
            company: Some("Acme".into()),
            message: Some("Hei".into()),
        }
    }

    fn post_contact(body: &str) -> Request<Body> {
        Request::post("/api/contact")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn send_contact(
        result: Result<ContactReceipt, ContactSendMessageError>,
    ) -> (StatusCode, Value) {
        let contact = MockContactFeatureService::new().with_send_message(submission(), result);
        let response = sut(MockHealthFeatureService::new(), contact)
            .oneshot(post_contact(
                r#"{"name":"Ola","email":"ola@example.com","company":"Acme","message":"Hei"}"#,
            ))
            .await
            .unwrap();
        let status = response.status();
        (status, json_body(response).await)
    }

    #[tokio::test]
    async fn contact_ok() {
        let (status, body) = send_contact(Ok(ContactReceipt {
            message_id: Some("<id@example.com>".into()),
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"message": "Message sent!", "id": "<id@example.com>"})
        );
    }

    #[tokio::test]
    async fn contact_missing_fields() {
        let (status, body) = send_contact(Err(ContactValidationError::MissingFields.into())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({
                "message": "Missing required fields",
                "detail": "Name, email, and message are required",
            })
        );
    }

    #[tokio::test]
    async fn contact_invalid_email() {
        let (status, body) = send_contact(Err(ContactValidationError::InvalidEmail.into())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid email format");
    }

    #[tokio::test]
    async fn contact_too_long() {
        let (status, body) = send_contact(Err(ContactValidationError::TooLong.into())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Field too long");
    }

    #[tokio::test]
    async fn contact_configuration_error() {
        let (status, body) = send_contact(Err(ContactSendMessageError::Configuration(
            ["SMTP_USER", "CONTACT_EMAIL"].into(),
        )))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({
                "message": "Server configuration error",
                "detail": "Missing required environment variables: SMTP_USER, CONTACT_EMAIL",
            })
        );
    }

    #[tokio::test]
    async fn contact_send_failures() {
        for (kind, detail) in [
            (
                EmailFailureKind::Authentication,
                "Authentication with the mail server failed",
            ),
            (
                EmailFailureKind::Socket,
                "Network error while communicating with the mail server",
            ),
            (EmailFailureKind::Timeout, "Timed out while sending the email"),
            (
                EmailFailureKind::Connection,
                "Could not connect to the mail server",
            ),
            (
                EmailFailureKind::Unknown,
                "An unexpected error occurred while sending the email",
            ),
        ] {
            let err = EmailSendError::new(kind, anyhow::anyhow!("535 5.7.3 secret details"));
            let (status, body) = send_contact(Err(err.into())).await;

            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                body,
                json!({"message": "Failed to send message", "detail": detail})
            );
        }
    }

    #[tokio::test]
    async fn contact_unparsable_body_counts_as_missing_fields() {
        for request in [
            post_contact("not json"),
            post_contact(r#"{"name": 42}"#),
            Request::post("/api/contact").body(Body::empty()).unwrap(),
        ] {
            let contact = MockContactFeatureService::new().with_send_message(
                ContactSubmission::default(),
                Err(ContactValidationError::MissingFields.into()),
            );
            let response = sut(MockHealthFeatureService::new(), contact)
                .oneshot(request)
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json_body(response).await["message"], "Missing required fields");
        }
    }

    #[tokio::test]
    async fn contact_method_not_allowed() {
        for method in [Method::GET, Method::PUT, Method::DELETE, Method::PATCH] {
            let response = sut(
                MockHealthFeatureService::new(),
                MockContactFeatureService::new(),
            )
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri("/api/contact")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(json_body(response).await, json!({"message": "Method not allowed"}));
        }
    }

    #[tokio::test]
    async fn handler_panic() {
        // the mock panics on the unexpected call
        let response = sut(
            MockHealthFeatureService::new(),
            MockContactFeatureService::new(),
        )
        .oneshot(post_contact(r#"{"name":"Ola"}"#))
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().contains_key("X-Request-Id"));
        assert_eq!(
            json_body(response).await,
            json!({"message": "Internal server error"})
        );
    }

    #[tokio::test]
    async fn health() {
        for (email, expected) in [
            (true, StatusCode::OK),
            (false, StatusCode::INTERNAL_SERVER_ERROR),
        ] {
            let health = MockHealthFeatureService::new().with_get_status(HealthStatus { email });
            let response = sut(health, MockContactFeatureService::new())
                .oneshot(Request::get("/health").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), expected);
            assert_eq!(json_body(response).await, json!({"http": true, "email": email}));
        }
    }

    #[tokio::test]
    async fn request_id_header() {
        let response = sut(
            MockHealthFeatureService::new(),
            MockContactFeatureService::new(),
        )
        .oneshot(Request::get("/does-not-exist").body(Body::empty()).unwrap())
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let request_id = response.headers().get("X-Request-Id").unwrap();
        assert_eq!(request_id.len(), 22);
    }

    #[tokio::test]
    async fn cors_preflight() {
        let response = sut(
            MockHealthFeatureService::new(),
            MockContactFeatureService::new(),
        )
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/contact")
                .header(header::ORIGIN, "https://folio.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://folio.example"
        );
    }
}
