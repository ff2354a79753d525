use crate::config::Timeouts;
use crate::core::decompression::ArchiveInstaller;
use crate::core::linker::Linker;
use crate::core::manifest_store::ManifestStore;
use crate::models::credentials::Credentials;
use crate::models::error::SError;
use crate::models::outcome::FetchOutcome;
use crate::models::paths::{archive_file, part_file, staging_dir};
use crate::models::plan::UpdatePlanEntry;
use crate::models::record::ResolvedMod;
use crate::providers::http;
use crate::tools::{ExternalToolFetcher, SerialFetcher};
use crate::utils::file::FileUtils;
use crate::utils::time::get_unix_timestamp;
use camino::{Utf8Path, Utf8PathBuf};
use futures::future::join_all;
use reqwest::Client;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

/// Installs the entries of an update plan, one concurrent task per entry.
#[derive(Clone)]
pub struct FetchCoordinator {
    http: Client,
    installer: Arc<dyn ArchiveInstaller>,
    tool: Option<SerialFetcher>,
    credentials: Arc<Credentials>,
    store: Arc<ManifestStore>,
    extract_permits: Arc<Semaphore>,
    timeouts: Timeouts,
}

impl FetchCoordinator {
    pub fn new(
        http: Client,
        installer: Arc<dyn ArchiveInstaller>,
        store: Arc<ManifestStore>,
        credentials: Arc<Credentials>,
        timeouts: Timeouts,
        extract_workers: usize,
    ) -> Self {
        Self {
            http,
            installer,
            tool: None,
            credentials,
            store,
            extract_permits: Arc::new(Semaphore::new(extract_workers.max(1))),
            timeouts,
        }
    }

    /// Enables the workshop provider.
    pub fn with_tool(mut self, tool: Arc<dyn ExternalToolFetcher>) -> Self {
        self.tool = Some(SerialFetcher::new(tool));
        self
    }

    /// Installs every entry flagged `need_update`. Each successful entry is
    /// recorded in the store as soon as it finishes; failed entries leave their
    /// previous record untouched.
    #[instrument(skip_all, fields(entries = entries.len()))]
    pub async fn apply(&self, entries: Vec<UpdatePlanEntry>) -> Vec<FetchOutcome> {
        let pending: Vec<ResolvedMod> = entries
            .into_iter()
            .filter(|e| e.need_update)
            .map(|e| e.resolved)
            .collect();
        if pending.is_empty() {
            return Vec::new();
        }

        self.sweep(&pending).await;

        let (keys, handles): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .map(|resolved| {
                let this = self.clone();
                (resolved.key(), tokio::spawn(async move { this.run_entry(resolved).await }))
            })
            .unzip();

        join_all(handles)
            .await
            .into_iter()
            .zip(keys)
            .map(|(joined, key)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Install task for {key} aborted: {e}");
                    FetchOutcome::failed(key, format!("install task aborted: {e}"))
                }
            })
            .collect()
    }

    /// Clears leftovers of interrupted runs from every install dir touched by this run.
    async fn sweep(&self, pending: &[ResolvedMod]) {
        let dirs: BTreeSet<Utf8PathBuf> = pending.iter().map(|r| r.install_dir.clone()).collect();
        let swept = tokio::task::spawn_blocking(move || {
            dirs.iter().map(|dir| FileUtils::sweep_leftovers(dir)).sum::<usize>()
        })
        .await
        .unwrap_or_default();
        if swept > 0 {
            info!("Removed {swept} leftovers of an interrupted run");
        }
    }

    #[instrument(skip_all, fields(provider = %resolved.provider, app = %resolved.app, mod_id = %resolved.mod_id))]
    async fn run_entry(&self, resolved: ResolvedMod) -> FetchOutcome {
        let key = resolved.key();

        if let Err(e) = self.install(&resolved).await {
            error!(
                provider = %resolved.provider,
                app = %resolved.app,
                mod_id = %resolved.mod_id,
                "Install of version {} failed: {e}",
                resolved.version
            );
            return FetchOutcome::failed(key, e);
        }

        let version = resolved.version.clone();
        let store = self.store.clone();
        let record = resolved.into_record(get_unix_timestamp());
        let committed = tokio::task::spawn_blocking(move || store.record(record))
            .await
            .map_err(SError::from)
            .and_then(|r| r);
        // The record is already in memory; the final commit retries the write.
        if let Err(e) = committed {
            warn!("Failed to commit {key} right away: {e}");
        }

        info!("Installed {key} {version}");
        FetchOutcome::installed(key, version)
    }

    async fn install(&self, resolved: &ResolvedMod) -> Result<(), SError> {
        if resolved.provider.delivers_archive() {
            self.install_archive(resolved).await
        } else {
            self.install_with_tool(resolved).await
        }
    }

    async fn install_archive(&self, resolved: &ResolvedMod) -> Result<(), SError> {
        let url = resolved
            .download_url
            .as_deref()
            .ok_or_else(|| SError::Provider {
                provider: resolved.provider,
                message: format!("no download url for {}", resolved.key()),
            })?;

        let dir_name = resolved.key().dir_name();
        tokio::fs::create_dir_all(&resolved.install_dir).await?;

        // 1. Download fully before the archive gets its real name
        let archive = archive_file(&resolved.install_dir, &dir_name, &resolved.version);
        let part = part_file(&resolved.install_dir, &dir_name);
        self.download(url, &part, &archive).await?;

        // 2. Extract next to the destination, then swap it in
        let staging = staging_dir(&resolved.install_dir, &dir_name);
        self.extract(archive.clone(), staging, resolved.destination())
            .await
            .map_err(|e| {
                warn!("Keeping {archive} for inspection");
                match e {
                    SError::Extraction(_) => e,
                    other => SError::Extraction(other.to_string()),
                }
            })?;

        // 3. Archive is no longer needed
        if let Err(e) = tokio::fs::remove_file(&archive).await {
            warn!("Failed to remove {archive}: {e}");
        }
        Ok(())
    }

    async fn download(&self, url: &str, part: &Utf8Path, archive: &Utf8Path) -> Result<(), SError> {
        debug!("Downloading {url} to {part}");
        let bytes = http::download_to(&self.http, url, part, self.timeouts.download).await?;
        tokio::fs::rename(part, archive).await?;
        debug!("Downloaded {bytes} bytes to {archive}");
        Ok(())
    }

    async fn extract(
        &self,
        archive: Utf8PathBuf,
        staging: Utf8PathBuf,
        destination: Utf8PathBuf,
    ) -> Result<(), SError> {
        let permit = self
            .extract_permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| SError::AsyncRuntimeError(e.to_string()))?;
        let installer = self.installer.clone();

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let result = installer
                .extract(&archive, &staging)
                .and_then(|_| FileUtils::replace_dir(&staging, &destination));
            if result.is_err() && staging.exists() {
                let _ = std::fs::remove_dir_all(&staging);
            }
            result
        })
        .await?
    }

    async fn install_with_tool(&self, resolved: &ResolvedMod) -> Result<(), SError> {
        let tool = self
            .tool
            .as_ref()
            .ok_or_else(|| SError::ToolUnavailable("no workshop fetcher is configured".into()))?;

        let fetched = tool
            .fetch(&resolved.app, &resolved.mod_id, &self.credentials)
            .await?;

        let Some(installed_path) = fetched.installed_path else {
            debug!("Tool reported no install path, nothing to link");
            return Ok(());
        };

        let target = resolved.destination();
        match Linker::link(&installed_path, &target) {
            Ok(()) => debug!("Linked {target} -> {installed_path}"),
            Err(e) => warn!("{}", SError::Link(format!("{target} -> {installed_path}: {e}"))),
        }
        Ok(())
    }
}
