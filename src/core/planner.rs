use crate::core::manifest_store::Records;
use crate::core::registry::ProviderRegistry;
use crate::models::credentials::Credentials;
use crate::models::mod_spec::{ModKey, ModSpec};
use crate::models::plan::{PlanFailure, StateDiff, UpdatePlan, UpdatePlanEntry};
use crate::models::record::{InstalledRecord, ResolvedMod};
use crate::providers::ResolveRequest;
use camino::{Utf8Path, Utf8PathBuf};
use futures::future::join_all;
use semver::Version;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument, warn};

/// Diffs declared mods against installed records, asking providers where needed.
pub struct UpdatePlanner<'a> {
    registry: &'a ProviderRegistry,
    credentials: &'a Credentials,
    default_install_dir: Utf8PathBuf,
}

impl<'a> UpdatePlanner<'a> {
    pub fn new(
        registry: &'a ProviderRegistry,
        credentials: &'a Credentials,
        default_install_dir: &Utf8Path,
    ) -> Self {
        Self {
            registry,
            credentials,
            default_install_dir: default_install_dir.to_owned(),
        }
    }

    /// Builds the plan. Provider queries for all specs run concurrently; a failed
    /// query only drops that spec from the plan.
    #[instrument(skip_all, fields(declared = specs.len(), installed = installed.len()))]
    pub async fn plan(&self, specs: &[ModSpec], installed: &Records) -> UpdatePlan {
        let specs = dedupe(specs);
        let mut diff = StateDiff::between(&specs, installed);

        let results = join_all(
            specs
                .iter()
                .map(|spec| self.plan_entry(spec, installed.get(&spec.key()))),
        )
        .await;

        let mut plan = UpdatePlan::default();
        for result in results {
            match result {
                Ok(entry) => plan.entries.push(entry),
                Err(failure) => plan.failures.push(failure),
            }
        }

        diff.version_changed = plan
            .entries
            .iter()
            .filter(|e| e.need_update && e.previous_version.is_some())
            .map(UpdatePlanEntry::key)
            .collect();
        plan.diff = diff;

        info!(
            "Plan: {} to update, {} up to date, {} unresolved",
            plan.pending().count(),
            plan.up_to_date(),
            plan.failures.len()
        );
        plan
    }

    #[instrument(skip_all, fields(key = %spec.key()))]
    async fn plan_entry(
        &self,
        spec: &ModSpec,
        record: Option<&InstalledRecord>,
    ) -> Result<UpdatePlanEntry, PlanFailure> {
        let install_dir = spec
            .install_dir
            .clone()
            .unwrap_or_else(|| self.default_install_dir.clone());

        // Pinned and already installed at that version: nothing to ask the provider.
        if let (Some(pin), Some(record)) = (spec.pinned_version(), record) {
            if record.version == pin {
                debug!("Pinned version {pin} already installed");
                return Ok(UpdatePlanEntry {
                    resolved: record.to_resolved(install_dir),
                    need_update: false,
                    previous_version: Some(record.version.clone()),
                });
            }
        }

        let request = ResolveRequest {
            app: &spec.app,
            mod_id: &spec.mod_id,
            version: spec.pinned_version(),
            credentials: self.credentials,
        };

        let resolution = self
            .registry
            .client(spec.provider)
            .resolve(request)
            .await
            .map_err(|e| {
                warn!(provider = %spec.provider, app = %spec.app, mod_id = %spec.mod_id, "Resolution failed: {e}");
                PlanFailure {
                    key: spec.key(),
                    reason: e.to_string(),
                }
            })?;

        let resolved = ResolvedMod {
            provider: spec.provider,
            app: spec.app.clone(),
            mod_id: spec.mod_id.clone(),
            version: resolution.version,
            download_url: resolution.download_url,
            dependencies: resolution.dependencies,
            manifest: resolution.manifest,
            install_dir,
        };

        let previous_version = record.map(|r| r.version.clone());
        let need_update = previous_version.as_deref() != Some(resolved.version.as_str());

        if let Some(previous) = previous_version.as_deref().filter(|_| need_update) {
            if is_downgrade(previous, &resolved.version) {
                warn!("Provider reports {} which is older than installed {previous}", resolved.version);
            }
        }

        Ok(UpdatePlanEntry {
            resolved,
            need_update,
            previous_version,
        })
    }
}

/// First declaration of a key wins.
fn dedupe(specs: &[ModSpec]) -> Vec<ModSpec> {
    let mut seen = BTreeSet::new();
    specs
        .iter()
        .filter(|spec| {
            let fresh = seen.insert(spec.key());
            if !fresh {
                warn!("Ignoring duplicate declaration of {}", spec.key());
            }
            fresh
        })
        .cloned()
        .collect()
}

fn is_downgrade(installed: &str, resolved: &str) -> bool {
    match (Version::parse(installed), Version::parse(resolved)) {
        (Ok(installed), Ok(resolved)) => resolved < installed,
        _ => false,
    }
}

impl StateDiff {
    pub fn between(specs: &[ModSpec], installed: &Records) -> Self {
        let declared: BTreeSet<ModKey> = specs.iter().map(ModSpec::key).collect();

        Self {
            only_declared: declared
                .iter()
                .filter(|k| !installed.contains_key(*k))
                .cloned()
                .collect(),
            only_installed: installed
                .keys()
                .filter(|k| !declared.contains(*k))
                .cloned()
                .collect(),
            version_changed: Vec::new(),
        }
    }
}
