//! External tools used by providers that do not hand out download URLs.

pub mod file_url;
pub mod steamcmd;

use crate::models::credentials::Credentials;
use crate::models::error::SError;
use async_trait::async_trait;
use camino::Utf8PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Result of a successful tool run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FetchedContent {
    /// Where the tool put the content, when it reports it.
    pub installed_path: Option<Utf8PathBuf>,
}

#[async_trait]
pub trait ExternalToolFetcher: Send + Sync {
    async fn fetch(
        &self,
        app: &str,
        mod_id: &str,
        credentials: &Credentials,
    ) -> Result<FetchedContent, SError>;
}

/// At most one external tool invocation runs in the process at any time.
static TOOL_GATE: Mutex<()> = Mutex::const_new(());

/// Queues callers of the wrapped fetcher behind the process-wide gate.
#[derive(Clone)]
pub struct SerialFetcher {
    inner: Arc<dyn ExternalToolFetcher>,
}

impl SerialFetcher {
    pub fn new(inner: Arc<dyn ExternalToolFetcher>) -> Self {
        Self { inner }
    }

    pub async fn fetch(
        &self,
        app: &str,
        mod_id: &str,
        credentials: &Credentials,
    ) -> Result<FetchedContent, SError> {
        let _turn = TOOL_GATE.lock().await;
        debug!("External tool acquired for {app}/{mod_id}");
        self.inner.fetch(app, mod_id, credentials).await
    }
}
