use crate::models::credentials::Credentials;
use crate::models::error::SError;
use crate::models::mod_spec::escape;
use crate::models::paths::{part_file, staging_dir};
use crate::providers::http::download_to;
use crate::providers::workshop::WorkshopClient;
use crate::tools::{ExternalToolFetcher, FetchedContent};
use crate::utils::file::FileUtils;
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Workshop items published as a plain file come with a `file_url` and are
/// downloaded over HTTP into `root/<app>/<mod>/<filename>`. Everything else
/// goes to the fallback tool, usually SteamCMD.
pub struct FileUrlFetcher {
    details: WorkshopClient,
    http: Client,
    root: Utf8PathBuf,
    timeout: Duration,
    fallback: Option<Arc<dyn ExternalToolFetcher>>,
}

impl FileUrlFetcher {
    pub fn new(details: WorkshopClient, http: Client, root: &Utf8Path, timeout: Duration) -> Self {
        Self {
            details,
            http,
            root: root.to_owned(),
            timeout,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn ExternalToolFetcher>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// `(file_url, file name)` of an item published as a plain file. The name
    /// loses any directories it carries; the mod id stands in when it has none.
    pub fn direct_file(body: &Value, mod_id: &str) -> Option<(String, String)> {
        let details = body.pointer("/response/publishedfiledetails/0")?;
        let url = details
            .get("file_url")
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())?;
        let name = details
            .get("filename")
            .and_then(Value::as_str)
            .and_then(|f| Utf8Path::new(f).file_name())
            .unwrap_or(mod_id);
        Some((url.to_string(), name.to_string()))
    }

    async fn download(&self, app: &str, mod_id: &str, url: &str, name: &str) -> Result<FetchedContent, SError> {
        let app_dir = self.root.join(escape(app));
        let target = app_dir.join(escape(mod_id));
        tokio::fs::create_dir_all(&app_dir).await?;
        FileUtils::sweep_leftovers(&app_dir);

        let staging = staging_dir(&app_dir, &escape(mod_id));
        let result = match self.download_into(&staging, url, name).await {
            Ok(()) => FileUtils::replace_dir(&staging, &target),
            Err(e) => Err(e),
        };
        if result.is_err() && staging.exists() {
            let _ = tokio::fs::remove_dir_all(&staging).await;
        }
        result?;

        info!("Downloaded {name} for {app}/{mod_id}");
        Ok(FetchedContent {
            installed_path: Some(target),
        })
    }

    async fn download_into(&self, staging: &Utf8Path, url: &str, name: &str) -> Result<(), SError> {
        tokio::fs::create_dir_all(staging).await?;
        let part = part_file(staging, &escape(name));
        let bytes = download_to(&self.http, url, &part, self.timeout).await?;
        tokio::fs::rename(&part, staging.join(name)).await?;
        debug!("Downloaded {bytes} bytes from {url}");
        Ok(())
    }
}

#[async_trait]
impl ExternalToolFetcher for FileUrlFetcher {
    #[instrument(skip(self, credentials))]
    async fn fetch(
        &self,
        app: &str,
        mod_id: &str,
        credentials: &Credentials,
    ) -> Result<FetchedContent, SError> {
        let body = self.details.published_file(mod_id, credentials).await?;

        match (Self::direct_file(&body, mod_id), &self.fallback) {
            (Some((url, name)), _) => self.download(app, mod_id, &url, &name).await,
            (None, Some(fallback)) => {
                debug!("Published file {mod_id} has no file_url, handing over to the fallback tool");
                fallback.fetch(app, mod_id, credentials).await
            }
            (None, None) => Err(SError::ToolUnavailable(format!(
                "published file {mod_id} is not a plain file and steamcmd_path is not configured"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(details: Value) -> Value {
        json!({ "response": { "publishedfiledetails": [details] } })
    }

    #[test]
    fn plain_file_keeps_its_base_name() {
        let body = body(json!({
            "file_url": "https://cdn.example/ugc/77",
            "filename": "maps/arena.bin"
        }));
        assert_eq!(
            FileUrlFetcher::direct_file(&body, "77"),
            Some(("https://cdn.example/ugc/77".to_string(), "arena.bin".to_string()))
        );
    }

    #[test]
    fn nameless_file_is_named_after_the_mod() {
        let body = body(json!({ "file_url": "https://cdn.example/ugc/77", "filename": "" }));
        assert_eq!(FileUrlFetcher::direct_file(&body, "77").map(|(_, n)| n), Some("77".to_string()));
    }

    #[test]
    fn steampipe_items_have_no_direct_file() {
        let body = body(json!({ "file_url": "", "hcontent_file": "1234" }));
        assert_eq!(FileUrlFetcher::direct_file(&body, "77"), None);
    }
}
