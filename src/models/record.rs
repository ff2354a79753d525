use crate::models::mod_spec::{ModKey, Provider};
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a provider said about a declared mod during this run. Never persisted as-is.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedMod {
    pub provider: Provider,
    pub app: String,
    pub mod_id: String,
    pub version: String,
    pub download_url: Option<String>,
    pub dependencies: Vec<String>,
    pub manifest: Value,
    pub install_dir: Utf8PathBuf,
}

impl ResolvedMod {
    pub fn key(&self) -> ModKey {
        ModKey::new(self.provider, self.app.clone(), self.mod_id.clone())
    }

    /// Where the archive of this mod is unpacked: `install_dir/<provider>-<app>-<mod>`.
    pub fn destination(&self) -> Utf8PathBuf {
        self.install_dir.join(self.key().dir_name())
    }

    pub fn into_record(self, installed_at: u64) -> InstalledRecord {
        InstalledRecord {
            provider: self.provider,
            app: self.app,
            mod_id: self.mod_id,
            version: self.version,
            manifest: self.manifest,
            install_dir: self.install_dir,
            dependencies: self.dependencies,
            installed_at,
        }
    }
}

/// Last successfully installed state of a mod, owned by the manifest store.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct InstalledRecord {
    pub provider: Provider,
    pub app: String,
    #[serde(rename = "mod")]
    pub mod_id: String,
    pub version: String,
    #[serde(default)]
    pub manifest: Value,
    pub install_dir: Utf8PathBuf,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub installed_at: u64,
}

impl InstalledRecord {
    pub fn key(&self) -> ModKey {
        ModKey::new(self.provider, self.app.clone(), self.mod_id.clone())
    }

    /// Rebuilds the resolution of an entry that was skipped because its pin matched.
    pub fn to_resolved(&self, install_dir: Utf8PathBuf) -> ResolvedMod {
        ResolvedMod {
            provider: self.provider,
            app: self.app.clone(),
            mod_id: self.mod_id.clone(),
            version: self.version.clone(),
            download_url: None,
            dependencies: self.dependencies.clone(),
            manifest: self.manifest.clone(),
            install_dir,
        }
    }
}
