use anyhow::Context;
use folio_config::Config;
use folio_email_impl::{EmailServiceConfig, EmailServiceImpl, SmtpAccount};

/// Create the email service for the configured smtp relay.
///
/// No connection is made here. The smtp account is only set if all of its
/// settings are present.
pub fn connect(config: &Config) -> anyhow::Result<EmailServiceImpl> {
    let relay = &config.relay;
    let account = match (&relay.smtp_user, &relay.smtp_password, &relay.smtp_from_email) {
        (Some(username), Some(password), Some(from)) => Some(SmtpAccount {
            username: username.clone(),
            password: password.clone(),
            from: from
                .parse()
                .with_context(|| format!("Invalid sender address in SMTP_FROM_EMAIL: {from}"))?,
        }),
        _ => None,
    };

    Ok(EmailServiceImpl::new(EmailServiceConfig {
        host: config.smtp.host.clone(),
        port: config.smtp.port,
        connection_timeout: config.smtp.connection_timeout.into(),
        send_timeout: config.smtp.send_timeout.into(),
        pool_max_size: config.smtp.pool_max_size,
        account,
    }))
}
