use anyhow::ensure;
use clap::Subcommand;
use folio_config::Config;
use folio_email_contracts::{Email, EmailBody, EmailService};
use folio_models::email_address::EmailAddress;

use crate::email;

#[derive(Debug, Subcommand)]
pub enum EmailCommand {
    /// Test email deliverability
    Test { recipient: EmailAddress },
}

impl EmailCommand {
    pub async fn invoke(self, config: Config) -> anyhow::Result<()> {
        match self {
            EmailCommand::Test { recipient } => test(config, recipient).await,
        }
    }
}

async fn test(config: Config, recipient: EmailAddress) -> anyhow::Result<()> {
    let missing = config.relay.missing();
    ensure!(
        missing.is_empty(),
        "Missing required environment variables: {}",
        missing.join(", ")
    );

    let email_service = email::connect(&config)?;

    let receipt = email_service
        .send(Email {
            recipient,
            subject: "Email Deliverability Test".into(),
            body: EmailBody::Text("Email deliverability seems to be working!".into()),
            reply_to: None,
        })
        .await?;

    println!(
        "Sent test email ({})",
        receipt.message_id.as_deref().unwrap_or("no message id")
    );

    Ok(())
}
