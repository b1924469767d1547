use std::sync::Arc;

use anyhow::Context;
use axum::http::HeaderValue;
use folio_api_rest::RestServerConfig;
use folio_config::Config;
use folio_core_contact_impl::{ContactFeatureConfig, ContactRelayConfig};
use folio_core_health_impl::HealthFeatureConfig;
use folio_di::provider;
use types::Email;

pub mod types;

provider! {
    /// The default provider, capable of providing all the dependencies
    pub Provider {
        email: Email,
        ..config: ConfigProvider {
            // API
            RestServerConfig,

            // Core
            ContactFeatureConfig,
            HealthFeatureConfig,
        }
    }
}

impl Provider {
    pub fn new(config: ConfigProvider, email: Email) -> Self {
        Self {
            _cache: Default::default(),
            email,
            config,
        }
    }
}

provider! {
    /// Reduced provider, capable of providing services that only depend on the configuration
    pub ConfigProvider {
        // API
        rest_server_config: RestServerConfig,

        // Core
        contact_feature_config: ContactFeatureConfig,
        health_feature_config: HealthFeatureConfig,
    }
}

impl ConfigProvider {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        // API
        let rest_server_config = RestServerConfig {
            addr: config.http.address,
            allowed_origins: config
                .http
                .allowed_origins
                .iter()
                .map(|origin| {
                    HeaderValue::from_str(origin)
                        .with_context(|| format!("Invalid allowed origin: {origin}"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?
                .into(),
        };

        // Core
        let missing = config.relay.missing();
        let relay = match &config.relay.contact_email {
            Some(contact_email) if missing.is_empty() => ContactRelayConfig::Ready {
                recipient: Arc::new(contact_email.parse().with_context(|| {
                    format!("Invalid recipient address in CONTACT_EMAIL: {contact_email}")
                })?),
            },
            _ => ContactRelayConfig::Incomplete {
                missing: missing.into(),
            },
        };

        let contact_feature_config = ContactFeatureConfig {
            relay,
            company_placeholder: config.contact.company_placeholder.as_str().into(),
        };

        let health_feature_config = HealthFeatureConfig {
            cache_ttl: config.health.cache_ttl.into(),
        };

        Ok(Self {
            _cache: Default::default(),

            // API
            rest_server_config,

            // Core
            contact_feature_config,
            health_feature_config,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, path::Path};

    use folio_di::Provide;
    use folio_utils::assert_matches;
    use types::RestServer;

    use super::*;

    fn load_config(env: &[(&str, &str)]) -> Config {
        let env = env
            .iter()
            .map(|&(k, v)| (k.to_owned(), v.to_owned()))
            .collect::<HashMap<_, _>>();
        folio_config::load_with(&[Path::new(folio_config::DEFAULT_CONFIG_PATH)], |name| {
            env.get(name).cloned()
        })
        .unwrap()
    }

    const RELAY_ENV: [(&str, &str); 4] = [
        ("SMTP_USER", "relay@example.com"),
        ("SMTP_PASSWORD", "hunter2"),
        ("SMTP_FROM_EMAIL", "noreply@example.com"),
        ("CONTACT_EMAIL", "contact@example.com"),
    ];

    #[test]
    fn provide_rest_server() {
        let config = load_config(&RELAY_ENV);
        let config_provider = ConfigProvider::new(&config).unwrap();
        let email = crate::email::connect(&config).unwrap();

        let mut provider = Provider::new(config_provider, email);
        let _: RestServer = provider.provide();
    }

    #[test]
    fn relay_ready() {
        let config = load_config(&RELAY_ENV);
        let mut provider = ConfigProvider::new(&config).unwrap();

        let config: ContactFeatureConfig = provider.provide();

        assert_matches!(
            config.relay,
            ContactRelayConfig::Ready { recipient } if recipient.as_str() == "contact@example.com"
        );
    }

    #[test]
    fn relay_incomplete() {
        let config = load_config(&RELAY_ENV[..2]);
        let mut provider = ConfigProvider::new(&config).unwrap();

        let config: ContactFeatureConfig = provider.provide();

        assert_matches!(
            config.relay,
            ContactRelayConfig::Incomplete { missing }
                if missing[..] == ["SMTP_FROM_EMAIL", "CONTACT_EMAIL"]
        );
    }

    #[test]
    fn invalid_recipient() {
        let mut env = RELAY_ENV;
        env[3].1 = "not an address";
        let config = load_config(&env);

        assert!(ConfigProvider::new(&config).is_err());
    }
}
