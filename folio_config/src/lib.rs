use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::Context;
use config::{File, FileFormat};
use folio_models::Sensitive;
use serde::Deserialize;
use url::Url;

pub use duration::Duration;

mod duration;

pub const DEFAULT_CONFIG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../config.toml");

/// Environment variable with additional config files, separated like `PATH`.
pub const CONFIG_PATHS_ENV: &str = "FOLIO_CONFIG";

/// Config keys of the relay settings and the environment variables they are
/// read from.
pub const RELAY_VARIABLES: [(&str, &str); 4] = [
    ("relay.smtp_user", "SMTP_USER"),
    ("relay.smtp_password", "SMTP_PASSWORD"),
    ("relay.smtp_from_email", "SMTP_FROM_EMAIL"),
    ("relay.contact_email", "CONTACT_EMAIL"),
];

/// Load the default config, the files listed in `FOLIO_CONFIG` and the relay
/// environment variables.
pub fn load() -> anyhow::Result<Config> {
    let mut paths = vec![PathBuf::from(DEFAULT_CONFIG_PATH)];
    if let Some(extra) = std::env::var_os(CONFIG_PATHS_ENV) {
        paths.extend(std::env::split_paths(&extra));
    }

    load_with(&paths, |name| std::env::var(name).ok())
}

/// Load the given config files and read the relay settings through `env`.
///
/// Empty environment values are treated as unset.
pub fn load_with(
    paths: &[impl AsRef<Path>],
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Config> {
    let builder = paths
        .iter()
        .try_fold(config::Config::builder(), |builder, path| {
            let path = path.as_ref();
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file at {}", path.display()))?;
            let source = File::from_str(&content, FileFormat::Toml);
            anyhow::Ok(builder.add_source(source))
        })?;

    RELAY_VARIABLES
        .iter()
        .try_fold(builder, |builder, &(key, variable)| {
            builder.set_override_option(key, env(variable).filter(|value| !value.is_empty()))
        })?
        .build()?
        .try_deserialize()
        .context("Failed to load config")
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub http: HttpConfig,
    pub smtp: SmtpConfig,
    pub contact: ContactConfig,
    pub health: HealthConfig,
    pub form: FormConfig,
    #[serde(default)]
    pub relay: RelayConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub address: SocketAddr,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub connection_timeout: Duration,
    pub send_timeout: Duration,
    pub pool_max_size: u32,
}

#[derive(Debug, Deserialize)]
pub struct ContactConfig {
    pub company_placeholder: String,
}

#[derive(Debug, Deserialize)]
pub struct HealthConfig {
    pub cache_ttl: Duration,
}

#[derive(Debug, Deserialize)]
pub struct FormConfig {
    pub endpoint: Url,
    pub reset_delay: Duration,
}

/// Credentials and addresses of the contact relay.
///
/// All of them are required to relay contact messages, but the server also
/// starts without them and reports the missing ones per request.
#[derive(Debug, Default, Deserialize)]
pub struct RelayConfig {
    pub smtp_user: Option<String>,
    pub smtp_password: Option<Sensitive<String>>,
    pub smtp_from_email: Option<String>,
    pub contact_email: Option<String>,
}

impl RelayConfig {
    /// Names of the environment variables of all unset relay settings.
    pub fn missing(&self) -> Vec<&'static str> {
        let set = [
            self.smtp_user.is_some(),
            self.smtp_password.is_some(),
            self.smtp_from_email.is_some(),
            self.contact_email.is_some(),
        ];

        RELAY_VARIABLES
            .iter()
            .zip(set)
            .filter(|&(_, set)| !set)
            .map(|(&(_, variable), _)| variable)
            .collect()
    }
}
