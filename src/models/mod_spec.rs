use camino::Utf8PathBuf;
use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Display, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[display("thunderstore")]
    Thunderstore,
    #[display("nexusmods")]
    Nexusmods,
    #[display("workshop")]
    Workshop,
}

impl Provider {
    /// Archive providers hand out a download URL; the workshop is fetched out-of-band.
    pub fn delivers_archive(self) -> bool {
        !matches!(self, Provider::Workshop)
    }
}

/// `(provider, app, mod)`: the unique key of a mod across the whole system.
#[derive(Serialize, Deserialize, Display, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[display("{provider}/{app}/{mod_id}")]
pub struct ModKey {
    pub provider: Provider,
    pub app: String,
    #[serde(rename = "mod")]
    pub mod_id: String,
}

impl ModKey {
    pub fn new(provider: Provider, app: impl Into<String>, mod_id: impl Into<String>) -> Self {
        Self {
            provider,
            app: app.into(),
            mod_id: mod_id.into(),
        }
    }

    /// Directory name of an installed mod: `<provider>-<app>-<mod>`, each part
    /// escaped so that distinct keys never share a name.
    pub fn dir_name(&self) -> String {
        format!("{}-{}-{}", self.provider, escape(&self.app), escape(&self.mod_id))
    }
}

/// A declared requirement as it appears in `mods.toml`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModSpec {
    pub provider: Provider,
    pub app: String,
    #[serde(rename = "mod")]
    pub mod_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, rename = "mods_dir", skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<Utf8PathBuf>,
}

impl ModSpec {
    pub fn key(&self) -> ModKey {
        ModKey::new(self.provider, self.app.clone(), self.mod_id.clone())
    }

    /// Pinned version, with blank strings treated as "track latest".
    pub fn pinned_version(&self) -> Option<&str> {
        self.version.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Percent-escapes a name part so it is a single portable path component.
/// `-` is escaped too, leaving it free to separate parts.
pub fn escape(part: &str) -> String {
    urlencoding::encode(part).replace('-', "%2D")
}
