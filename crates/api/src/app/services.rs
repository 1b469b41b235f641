//! Service wiring: registry, provider client, and orchestrator.

use std::sync::Arc;

use meshrelay_orchestrator::{FailoverPolicy, Orchestrator};
use meshrelay_provider::{HttpProviderClient, ProviderClient, ProviderError};
use meshrelay_registry::{InMemoryJobRegistry, JobRegistry};

use crate::config::AppConfig;

/// Shared state handed to every handler.
pub struct AppServices {
    pub orchestrator: Orchestrator,
    pub max_image_bytes: u64,
}

impl AppServices {
    /// Wire services from explicit parts. Tests use this to inject a
    /// scripted provider at the `ProviderClient` seam.
    pub fn new(
        registry: Arc<dyn JobRegistry>,
        provider: Arc<dyn ProviderClient>,
        policy: FailoverPolicy,
        max_image_bytes: u64,
    ) -> Self {
        Self {
            orchestrator: Orchestrator::new(registry, provider, policy),
            max_image_bytes,
        }
    }
}

/// Production wiring from resolved configuration.
pub fn build_services(config: &AppConfig) -> Result<AppServices, ProviderError> {
    let provider = HttpProviderClient::new(config.provider.clone())?;
    let registry = InMemoryJobRegistry::arc();

    let orchestrator = Orchestrator::new(registry, Arc::new(provider), config.failover.clone())
        .with_retention(config.retention);

    Ok(AppServices {
        orchestrator,
        max_image_bytes: config.max_image_bytes,
    })
}
