use crate::models::error::SError;
use crate::models::mod_spec::Provider;
use crate::providers::nexusmods::NexusModsClient;
use crate::providers::thunderstore::ThunderstoreClient;
use crate::providers::workshop::WorkshopClient;
use crate::providers::{http, ProviderClient};
use std::sync::Arc;
use std::time::Duration;

/// One client per provider, selected by the [`Provider`] tag.
#[derive(Clone)]
pub struct ProviderRegistry {
    thunderstore: Arc<dyn ProviderClient>,
    nexusmods: Arc<dyn ProviderClient>,
    workshop: Arc<dyn ProviderClient>,
}

impl ProviderRegistry {
    pub fn new(
        thunderstore: Arc<dyn ProviderClient>,
        nexusmods: Arc<dyn ProviderClient>,
        workshop: Arc<dyn ProviderClient>,
    ) -> Self {
        Self {
            thunderstore,
            nexusmods,
            workshop,
        }
    }

    /// Registry backed by the public provider APIs.
    pub fn with_defaults(request_timeout: Duration) -> Result<Self, SError> {
        let client = http::build_client(request_timeout)?;
        Ok(Self::new(
            Arc::new(ThunderstoreClient::new(client.clone())),
            Arc::new(NexusModsClient::new(client.clone())),
            Arc::new(WorkshopClient::new(client)),
        ))
    }

    /// Swaps in `client` for the provider it serves, keeping the others.
    pub fn with_client(mut self, client: Arc<dyn ProviderClient>) -> Self {
        match client.provider() {
            Provider::Thunderstore => self.thunderstore = client,
            Provider::Nexusmods => self.nexusmods = client,
            Provider::Workshop => self.workshop = client,
        }
        self
    }

    pub fn client(&self, provider: Provider) -> &dyn ProviderClient {
        match provider {
            Provider::Thunderstore => self.thunderstore.as_ref(),
            Provider::Nexusmods => self.nexusmods.as_ref(),
            Provider::Workshop => self.workshop.as_ref(),
        }
    }
}
