use std::future::Future;

use folio_models::email_address::EmailAddress;
use thiserror::Error;

#[cfg_attr(feature = "mock", mockall::automock)]
pub trait EmailService: Send + Sync + 'static {
    /// Send an email from the configured sender address.
    fn send(&self, email: Email) -> impl Future<Output = Result<EmailReceipt, EmailSendError>> + Send;

    /// Check that the smtp server is reachable and accepts our credentials.
    fn ping(&self) -> impl Future<Output = anyhow::Result<()>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub recipient: EmailAddress,
    pub subject: String,
    pub body: EmailBody,
    pub reply_to: Option<EmailAddress>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailBody {
    Text(String),
    Html(String),
    /// `multipart/alternative` with a plain text and an html part.
    Alternative { text: String, html: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailReceipt {
    /// The `Message-ID` header of the sent email.
    pub message_id: Option<String>,
}

#[derive(Debug, Error)]
#[error("Failed to send email ({kind}).")]
pub struct EmailSendError {
    pub kind: EmailFailureKind,
    #[source]
    pub source: anyhow::Error,
}

impl EmailSendError {
    pub fn new(kind: EmailFailureKind, source: impl Into<anyhow::Error>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }
}

/// Closed set of transport failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmailFailureKind {
    /// The smtp server rejected our credentials.
    Authentication,
    /// The connection broke while talking to the smtp server.
    Socket,
    /// The smtp server did not answer in time.
    Timeout,
    /// No connection to the smtp server could be established.
    Connection,
    Unknown,
}

impl std::fmt::Display for EmailFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Authentication => "authentication",
            Self::Socket => "socket",
            Self::Timeout => "timeout",
            Self::Connection => "connection",
            Self::Unknown => "unknown",
        })
    }
}

#[cfg(feature = "mock")]
impl MockEmailService {
    pub fn with_send(mut self, email: Email, result: Result<EmailReceipt, EmailFailureKind>) -> Self {
        self.expect_send()
            .once()
            .with(mockall::predicate::eq(email))
            .return_once(move |_| {
                Box::pin(std::future::ready(result.map_err(|kind| {
                    EmailSendError::new(kind, anyhow::anyhow!("mocked {kind} failure"))
                })))
            });
        self
    }

    pub fn with_ping(mut self, result: bool) -> Self {
        self.expect_ping().once().return_once(move || {
            Box::pin(std::future::ready(if result {
                Ok(())
            } else {
                Err(anyhow::anyhow!("mocked ping failure"))
            }))
        });
        self
    }
}
