use std::{future::Future, sync::Arc};

use folio_utils::folio_version;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::ContactFormFields;

pub fn user_agent() -> String {
    let homepage = env!("CARGO_PKG_HOMEPAGE");
    let version = folio_version();
    format!("folio/{version} ({homepage})")
}

/// Client of the contact relay endpoint.
#[cfg_attr(test, mockall::automock)]
pub trait ContactApiService: Send + Sync + 'static {
    /// Post the form fields as json to the relay.
    fn submit(
        &self,
        fields: ContactFormFields,
    ) -> impl Future<Output = Result<(), ContactApiError>> + Send;
}

#[derive(Debug, Error)]
pub enum ContactApiError {
    #[error("The relay responded with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },
    #[error("Failed to reach the relay: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct ContactApiServiceImpl {
    client: reqwest::Client,
    endpoint: Arc<Url>,
}

impl ContactApiServiceImpl {
    pub fn new(endpoint: Url) -> Result<Self, ContactApiError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent())
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl ContactApiService for ContactApiServiceImpl {
    async fn submit(&self, fields: ContactFormFields) -> Result<(), ContactApiError> {
        let response = self
            .client
            .post((*self.endpoint).clone())
            .json(&fields)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = response
            .json::<ErrorResponse>()
            .await
            .ok()
            .map(|body| match body.detail {
                Some(detail) => format!("{} ({detail})", body.message),
                None => body.message,
            });

        Err(ContactApiError::Status { status, message })
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
    detail: Option<String>,
}
