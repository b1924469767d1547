use std::{sync::Arc, time::Duration};

use folio_core_health_contracts::{HealthFeatureService, HealthStatus};
use folio_di::Build;
use folio_email_contracts::EmailService;
use tokio::{sync::RwLock, time::Instant};
use tracing::error;

#[derive(Debug, Clone, Build)]
pub struct HealthFeatureServiceImpl<Email> {
    email: Email,
    config: HealthFeatureConfig,
    #[state]
    state: Arc<State>,
}

#[derive(Debug, Clone)]
pub struct HealthFeatureConfig {
    pub cache_ttl: Duration,
}

#[derive(Debug, Default)]
struct State {
    cache: RwLock<Option<CachedStatus>>,
}

#[derive(Debug)]
struct CachedStatus {
    status: HealthStatus,
    timestamp: Instant,
}

impl<Email> HealthFeatureService for HealthFeatureServiceImpl<Email>
where
    Email: EmailService,
{
    async fn get_status(&self) -> HealthStatus {
        let now = Instant::now();
        let cache_guard = self.state.cache.read().await;
        if let Some(cached) = cache_guard
            .as_ref()
            .filter(|c| now < c.timestamp + self.config.cache_ttl)
        {
            return cached.status;
        }
        drop(cache_guard);

        let mut cache_guard = self.state.cache.write().await;
        if let Some(cached) = cache_guard
            .as_ref()
            .filter(|c| now < c.timestamp + self.config.cache_ttl)
        {
            return cached.status;
        }

        let email = self
            .email
            .ping()
            .await
            .inspect_err(|err| error!("Failed to ping smtp server: {err:#}"))
            .is_ok();

        let status = HealthStatus { email };

        cache_guard
            .insert(CachedStatus {
                status,
                timestamp: now,
            })
            .status
    }
}
