use std::sync::Arc;

use folio_core_contact_contracts::{ContactFeatureService, ContactReceipt, ContactSendMessageError};
use folio_di::Build;
use folio_email_contracts::{Email, EmailBody, EmailService};
use folio_models::{
    contact::{ContactCompany, ContactMessage, ContactSubmission},
    email_address::EmailAddress,
};
use folio_templates_contracts::{ContactRequestTemplate, TemplateService};
use tracing::{error, info};

#[derive(Debug, Clone, Build)]
pub struct ContactFeatureServiceImpl<Email, Template> {
    email: Email,
    template: Template,
    config: ContactFeatureConfig,
}

#[derive(Debug, Clone)]
pub struct ContactFeatureConfig {
    pub relay: ContactRelayConfig,
    /// Shown in place of the company if the submitter did not provide one.
    pub company_placeholder: Arc<str>,
}

#[derive(Debug, Clone)]
pub enum ContactRelayConfig {
    Ready { recipient: Arc<EmailAddress> },
    /// Names of the settings that are not set.
    Incomplete { missing: Arc<[&'static str]> },
}

impl<EmailS, Template> ContactFeatureService for ContactFeatureServiceImpl<EmailS, Template>
where
    EmailS: EmailService,
    Template: TemplateService,
{
    async fn send_message(
        &self,
        submission: ContactSubmission,
    ) -> Result<ContactReceipt, ContactSendMessageError> {
        let recipient = match &self.config.relay {
            ContactRelayConfig::Ready { recipient } => recipient,
            ContactRelayConfig::Incomplete { missing } => {
                error!(?missing, "Contact relay is missing required settings");
                return Err(ContactSendMessageError::Configuration(Arc::clone(missing)));
            }
        };

        let message = submission.validate()?;
        let email = self.build_email((**recipient).clone(), message)?;

        let receipt = self.email.send(email).await?;
        info!(message_id = ?receipt.message_id, "Relayed contact message");

        Ok(ContactReceipt {
            message_id: receipt.message_id,
        })
    }
}

impl<EmailS, Template> ContactFeatureServiceImpl<EmailS, Template>
where
    EmailS: EmailService,
    Template: TemplateService,
{
    fn build_email(
        &self,
        recipient: EmailAddress,
        message: ContactMessage,
    ) -> Result<Email, ContactSendMessageError> {
        let ContactMessage {
            author,
            company,
            content,
        } = message;

        let company = company
            .map(ContactCompany::into_inner)
            .unwrap_or_else(|| self.config.company_placeholder.to_string());

        let html = self.template.render(&ContactRequestTemplate {
            name: author.name.to_string(),
            email: author.email.to_string(),
            company: company.clone(),
            message: content.to_string(),
        })?;

        let text = format!(
            "Name: {}\nEmail: {}\nCompany: {company}\n\nMessage:\n{}",
            *author.name, author.email, *content
        );

        Ok(Email {
            recipient,
            subject: format!("New contact request from {}", *author.name),
            body: EmailBody::Alternative { text, html },
            reply_to: Some(author.email),
        })
    }
}
