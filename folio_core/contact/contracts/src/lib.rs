use std::{future::Future, sync::Arc};

use folio_email_contracts::EmailSendError;
use folio_models::contact::{ContactSubmission, ContactValidationError};
use thiserror::Error;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ContactFeatureService: Send + Sync + 'static {
    /// Validate a contact form submission and relay it to the contact inbox.
    ///
    /// The relay configuration is checked before the submission is validated,
    /// and nothing is sent unless both checks pass.
    fn send_message(
        &self,
        submission: ContactSubmission,
    ) -> impl Future<Output = Result<ContactReceipt, ContactSendMessageError>> + Send;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactReceipt {
    pub message_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum ContactSendMessageError {
    #[error("Missing required settings: {}.", .0.join(", "))]
    Configuration(Arc<[&'static str]>),
    #[error(transparent)]
    Validation(#[from] ContactValidationError),
    #[error(transparent)]
    Send(#[from] EmailSendError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(feature = "mock")]
impl MockContactFeatureService {
    pub fn with_send_message(
        mut self,
        submission: ContactSubmission,
        result: Result<ContactReceipt, ContactSendMessageError>,
    ) -> Self {
        self.expect_send_message()
            .once()
            .with(mockall::predicate::eq(submission))
            .return_once(move |_| Box::pin(std::future::ready(result)));
        self
    }
}
