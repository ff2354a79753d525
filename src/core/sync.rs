use crate::config::mods::ModsConfig;
use crate::config::{AppSettings, Timeouts};
use crate::core::coordinator::FetchCoordinator;
use crate::core::decompression::{ArchiveInstaller, ZipInstaller};
use crate::core::manifest_store::ManifestStore;
use crate::core::planner::UpdatePlanner;
use crate::core::registry::ProviderRegistry;
use crate::models::credentials::Credentials;
use crate::models::error::SError;
use crate::models::outcome::{FetchStatus, SyncReport};
use crate::models::paths::HomePaths;
use crate::models::plan::UpdatePlan;
use crate::models::record::InstalledRecord;
use crate::providers::http;
use crate::providers::workshop::WorkshopClient;
use crate::tools::file_url::FileUrlFetcher;
use crate::tools::steamcmd::SteamCmd;
use crate::tools::ExternalToolFetcher;
use crate::utils::file::FileUtils;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Runs the whole pipeline against one application home:
/// `mods.toml` + manifest -> plan -> installs -> commit.
pub struct SyncService {
    home: Utf8PathBuf,
    paths: HomePaths,
    registry: ProviderRegistry,
    credentials: Arc<Credentials>,
    installer: Arc<dyn ArchiveInstaller>,
    tool: Option<Arc<dyn ExternalToolFetcher>>,
    timeouts: Timeouts,
    extract_workers: usize,
}

impl SyncService {
    pub fn new(home: &Utf8Path, registry: ProviderRegistry, credentials: Credentials) -> Self {
        Self {
            home: home.to_owned(),
            paths: HomePaths::new(home),
            registry,
            credentials: Arc::new(credentials),
            installer: Arc::new(ZipInstaller),
            tool: None,
            timeouts: Timeouts::default(),
            extract_workers: 1,
        }
    }

    /// Service wired to the public provider APIs. Workshop items are downloaded
    /// from their `file_url` when they have one, else through SteamCMD when configured.
    pub fn from_settings(settings: &AppSettings) -> Result<Self, SError> {
        let timeouts = settings.timeouts();
        let registry = ProviderRegistry::with_defaults(timeouts.request)?;

        let mut workshop = FileUrlFetcher::new(
            WorkshopClient::new(http::build_client(timeouts.request)?),
            http::build_download_client(timeouts.request)?,
            &HomePaths::new(&settings.home).workshop,
            timeouts.download,
        );
        match settings.steamcmd_path.as_deref() {
            Some(path) => match SteamCmd::new(path, timeouts.tool) {
                Ok(steamcmd) => workshop = workshop.with_fallback(Arc::new(steamcmd)),
                Err(e) => warn!("Only workshop items with a file_url can be installed: {e}"),
            },
            None => info!("steamcmd_path is not set, only workshop items with a file_url can be installed"),
        }

        Ok(Self::new(&settings.home, registry, settings.credentials())
            .with_timeouts(timeouts)
            .with_extract_workers(settings.extract_workers())
            .with_tool(Arc::new(workshop)))
    }

    pub fn with_installer(mut self, installer: Arc<dyn ArchiveInstaller>) -> Self {
        self.installer = installer;
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn ExternalToolFetcher>) -> Self {
        self.tool = Some(tool);
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_extract_workers(mut self, workers: usize) -> Self {
        self.extract_workers = workers.max(1);
        self
    }

    pub fn paths(&self) -> &HomePaths {
        &self.paths
    }

    /// Writes the template `mods.toml` if there is none. Returns whether it did.
    pub fn init(&self) -> Result<bool, SError> {
        FileUtils::ensure_writable_dir(&self.home)?;
        ModsConfig::write_template(&self.paths.mods_config)
    }

    /// Loads the declared mods. `None` when the config was just created from
    /// the template and there is nothing to do yet.
    fn prepare(&self) -> Result<Option<ModsConfig>, SError> {
        if self.init()? {
            warn!("No mods declared yet, edit {} and run again", self.paths.mods_config);
            return Ok(None);
        }
        ModsConfig::load(&self.paths.mods_config).map(Some)
    }

    async fn plan(&self, config: &ModsConfig, store: &ManifestStore) -> UpdatePlan {
        let specs = config.resolved_specs(&self.home);
        let planner = UpdatePlanner::new(
            &self.registry,
            &self.credentials,
            &config.default_mods_dir(&self.home),
        );
        planner.plan(&specs, &store.snapshot()).await
    }

    /// Plans without touching anything on disk beyond the template.
    pub async fn check(&self) -> Result<UpdatePlan, SError> {
        let Some(config) = self.prepare()? else {
            return Ok(UpdatePlan::default());
        };
        let store = ManifestStore::open(&self.paths.manifest)?;
        Ok(self.plan(&config, &store).await)
    }

    #[instrument(skip_all, fields(home = %self.home))]
    pub async fn sync(&self) -> Result<SyncReport, SError> {
        // 1. Fatal checks come before any provider traffic
        let Some(config) = self.prepare()? else {
            return Ok(SyncReport::default());
        };
        let store = Arc::new(ManifestStore::open(&self.paths.manifest)?);

        // 2. Plan
        let plan = self.plan(&config, &store).await;
        for key in &plan.diff.only_installed {
            info!("{key} is installed but no longer declared, leaving it in place");
        }

        let mut report = SyncReport {
            up_to_date: plan.up_to_date(),
            orphaned: plan.diff.only_installed.clone(),
            failures: plan
                .failures
                .iter()
                .map(|f| (f.key.clone(), f.reason.clone()))
                .collect(),
            ..Default::default()
        };

        // 3. Install
        let mut coordinator = FetchCoordinator::new(
            http::build_download_client(self.timeouts.request)?,
            self.installer.clone(),
            store.clone(),
            self.credentials.clone(),
            self.timeouts,
            self.extract_workers,
        );
        if let Some(tool) = &self.tool {
            coordinator = coordinator.with_tool(tool.clone());
        }
        let outcomes = coordinator.apply(plan.entries).await;

        // 4. Final commit, after every unit has finished
        let committing = store.clone();
        tokio::task::spawn_blocking(move || committing.commit()).await??;

        for outcome in &outcomes {
            match &outcome.status {
                FetchStatus::Installed { .. } => report.updated += 1,
                FetchStatus::Failed { reason } => {
                    report.failures.push((outcome.key.clone(), reason.clone()))
                }
            }
        }
        report.failed = report.failures.len();
        report.outcomes = outcomes;

        info!("Sync finished: {report}");
        Ok(report)
    }

    /// Installed records, sorted by key.
    pub fn list(&self) -> Result<Vec<InstalledRecord>, SError> {
        Ok(ManifestStore::load(&self.paths.manifest)?
            .into_values()
            .collect())
    }
}
