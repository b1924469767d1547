use std::{sync::Arc, time::Duration};

use anyhow::anyhow;
use folio_email_contracts::{
    Email, EmailBody, EmailFailureKind, EmailReceipt, EmailSendError, EmailService,
};
use folio_models::{email_address::EmailAddress, Sensitive};
use folio_utils::Apply;
use lettre::{
    message::{header::ContentType, MessageBuilder, MultiPart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters, TlsVersion},
        PoolConfig,
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tokio::sync::OnceCell;
use tracing::{debug, info};
use uuid::Uuid;

mod classify;

type Transport = AsyncSmtpTransport<Tokio1Executor>;

/// Email service sending mails through an authenticated smtp relay.
///
/// The smtp transport (and its connection pool) is created on first use and
/// then shared by every clone of the service for the rest of the process
/// lifetime.
#[derive(Debug, Clone)]
pub struct EmailServiceImpl {
    config: Arc<EmailServiceConfig>,
    transport: Arc<OnceCell<Transport>>,
}

#[derive(Debug, Clone)]
pub struct EmailServiceConfig {
    pub host: String,
    pub port: u16,
    /// Timeout for establishing the connection and for each smtp command.
    pub connection_timeout: Duration,
    /// Upper bound for a complete send, including the smtp greeting.
    pub send_timeout: Duration,
    pub pool_max_size: u32,
    /// `None` if the relay credentials are not configured.
    pub account: Option<SmtpAccount>,
}

#[derive(Debug, Clone)]
pub struct SmtpAccount {
    pub username: String,
    pub password: Sensitive<String>,
    pub from: EmailAddress,
}

impl EmailServiceImpl {
    pub fn new(config: EmailServiceConfig) -> Self {
        Self {
            config: config.into(),
            transport: Default::default(),
        }
    }

    fn account(&self) -> anyhow::Result<&SmtpAccount> {
        self.config
            .account
            .as_ref()
            .ok_or_else(|| anyhow!("The smtp account is not configured"))
    }

    async fn transport(&self) -> Result<&Transport, EmailSendError> {
        self.transport
            .get_or_try_init(|| async { self.build_transport() })
            .await
    }

    fn build_transport(&self) -> Result<Transport, EmailSendError> {
        let account = self
            .account()
            .map_err(|err| EmailSendError::new(EmailFailureKind::Unknown, err))?;

        let EmailServiceConfig {
            host,
            port,
            connection_timeout,
            pool_max_size,
            ..
        } = &*self.config;

        info!(%host, port, "Creating smtp transport");

        let tls = TlsParameters::builder(host.clone())
            .set_min_tls_version(TlsVersion::Tlsv12)
            .dangerous_accept_invalid_certs(false)
            .dangerous_accept_invalid_hostnames(false)
            .build()
            .map_err(|err| EmailSendError::new(EmailFailureKind::Connection, err))?;

        let transport = Transport::starttls_relay(host)
            .map_err(|err| EmailSendError::new(EmailFailureKind::Connection, err))?
            .port(*port)
            .tls(Tls::Required(tls))
            .credentials(Credentials::new(
                account.username.clone(),
                account.password.0.clone(),
            ))
            .timeout(Some(*connection_timeout))
            .pool_config(PoolConfig::new().max_size(*pool_max_size))
            .build();

        Ok(transport)
    }

    fn build_message(&self, email: Email) -> Result<(Message, String), EmailSendError> {
        let from = self
            .account()
            .map_err(|err| EmailSendError::new(EmailFailureKind::Unknown, err))?
            .from
            .clone();

        let message_id = format!("<{}@{}>", Uuid::new_v4(), from.domain());

        let builder = Message::builder()
            .message_id(Some(message_id.clone()))
            .from(from.into())
            .to(email.recipient.into())
            .apply_map(email.reply_to.map(Into::into), MessageBuilder::reply_to)
            .subject(email.subject);

        let message = match email.body {
            EmailBody::Text(text) => builder.header(ContentType::TEXT_PLAIN).body(text),
            EmailBody::Html(html) => builder.header(ContentType::TEXT_HTML).body(html),
            EmailBody::Alternative { text, html } => {
                builder.multipart(MultiPart::alternative_plain_html(text, html))
            }
        }
        .map_err(|err| EmailSendError::new(EmailFailureKind::Unknown, err))?;

        Ok((message, message_id))
    }
}

impl EmailService for EmailServiceImpl {
    async fn send(&self, email: Email) -> Result<EmailReceipt, EmailSendError> {
        let (message, message_id) = self.build_message(email)?;
        let transport = self.transport().await?;

        debug!(%message_id, "Sending email");

        let response = tokio::time::timeout(self.config.send_timeout, transport.send(message))
            .await
            .map_err(|err| EmailSendError::new(EmailFailureKind::Timeout, err))?
            .map_err(|err| EmailSendError::new(classify::classify(&err), err))?;

        if !response.is_positive() {
            return Err(EmailSendError::new(
                EmailFailureKind::Unknown,
                anyhow!("The smtp server rejected the email ({})", response.code()),
            ));
        }

        Ok(EmailReceipt {
            message_id: Some(message_id),
        })
    }

    async fn ping(&self) -> anyhow::Result<()> {
        let transport = self.transport().await?;

        tokio::time::timeout(self.config.send_timeout, transport.test_connection())
            .await??
            .then_some(())
            .ok_or_else(|| anyhow!("Failed to ping smtp server"))
    }
}

#[cfg(test)]
mod tests {
    use folio_utils::assert_matches;

    use super::*;

    fn config(account: Option<SmtpAccount>) -> EmailServiceConfig {
        EmailServiceConfig {
            host: "smtp.example.com".into(),
            port: 587,
            connection_timeout: Duration::from_secs(10),
            send_timeout: Duration::from_secs(30),
            pool_max_size: 4,
            account,
        }
    }

    fn account() -> SmtpAccount {
        SmtpAccount {
            username: "relay@example.com".into(),
            password: "secret".to_owned().into(),
            from: "noreply@example.com".parse().unwrap(),
        }
    }

    fn email(body: EmailBody) -> Email {
        Email {
            recipient: "contact@example.com".parse().unwrap(),
            subject: "New contact request from Ola".into(),
            body,
            reply_to: Some("ola@example.com".parse().unwrap()),
        }
    }

    #[test]
    fn build_message_headers() {
        let sut = EmailServiceImpl::new(config(Some(account())));

        let (message, message_id) = sut.build_message(email(EmailBody::Text("Hei".into()))).unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();

        assert!(message_id.ends_with("@example.com>"));
        assert!(formatted.contains(&format!("Message-ID: {message_id}")));
        assert!(formatted.contains("From: noreply@example.com"));
        assert!(formatted.contains("To: contact@example.com"));
        assert!(formatted.contains("Reply-To: ola@example.com"));
        assert!(formatted.contains("Subject: New contact request from Ola"));
        assert!(formatted.contains("Content-Type: text/plain"));
        assert!(formatted.contains("\r\n\r\nHei"));
    }

    #[test]
    fn build_message_alternative() {
        let sut = EmailServiceImpl::new(config(Some(account())));

        let (message, _) = sut
            .build_message(email(EmailBody::Alternative {
                text: "plain body".into(),
                html: "<p>html body</p>".into(),
            }))
            .unwrap();
        let formatted = String::from_utf8(message.formatted()).unwrap();

        assert!(formatted.contains("multipart/alternative"));
        assert!(formatted.contains("plain body"));
        assert!(formatted.contains("<p>html body</p>"));
    }

    #[test]
    fn message_ids_are_unique() {
        let sut = EmailServiceImpl::new(config(Some(account())));

        let (_, a) = sut.build_message(email(EmailBody::Text("a".into()))).unwrap();
        let (_, b) = sut.build_message(email(EmailBody::Text("b".into()))).unwrap();

        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn send_without_account() {
        let sut = EmailServiceImpl::new(config(None));

        let result = sut.send(email(EmailBody::Text("Hei".into()))).await;

        assert_matches!(
            result,
            Err(EmailSendError {
                kind: EmailFailureKind::Unknown,
                ..
            })
        );
        assert!(sut.transport.get().is_none());
    }

    #[tokio::test]
    async fn transport_is_created_once() {
        let sut = EmailServiceImpl::new(config(Some(account())));
        let clone = sut.clone();

        let a: *const Transport = sut.transport().await.unwrap();
        let b: *const Transport = clone.transport().await.unwrap();

        assert_eq!(a, b);
    }
}
