use folio_config::Config;
use folio_di::Provide;
use folio_email_contracts::EmailService;
use tracing::{info, warn};

use crate::{
    email,
    environment::{types::RestServer, ConfigProvider, Provider},
};

pub async fn serve(config: Config) -> anyhow::Result<()> {
    let missing = config.relay.missing();
    let email = email::connect(&config)?;

    if missing.is_empty() {
        info!("Connecting to smtp server");
        if let Err(err) = email.ping().await {
            warn!("SMTP server is not available, contact messages cannot be relayed: {err:#}");
        }
    } else {
        warn!(
            "Missing required environment variables, contact messages cannot be relayed: {}",
            missing.join(", ")
        );
    }

    let config_provider = ConfigProvider::new(&config)?;
    let mut provider = Provider::new(config_provider, email);
    let server: RestServer = provider.provide();
    server.serve().await
}
