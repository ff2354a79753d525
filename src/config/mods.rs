use crate::models::error::SError;
use crate::models::mod_spec::ModSpec;
use crate::utils::file::FileUtils;
use crate::utils::toml::Toml;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing::info;

const TEMPLATE: &str = r#"# Mods kept in sync by mod-sync.
#
# provider: thunderstore | nexusmods | workshop
# app:      Thunderstore namespace, Nexus game domain or Steam app id
# mod:      package name, Nexus mod id or workshop published file id
# version:  optional pin; leave it out to track the latest release
# mods_dir: optional install directory; defaults to config.default_mods_dir

[config]
default_mods_dir = ""

# [[mods]]
# provider = "thunderstore"
# app = "acme"
# mod = "widget"
# version = "2.1.0"
"#;

#[derive(Serialize, Deserialize, Default, Clone, Debug)]
pub struct ModsSection {
    #[serde(default)]
    pub default_mods_dir: Option<Utf8PathBuf>,
}

/// Contents of `mods.toml`.
#[derive(Serialize, Deserialize, Default, Clone, Debug)]
pub struct ModsConfig {
    #[serde(default)]
    pub config: ModsSection,
    #[serde(default)]
    pub mods: Vec<ModSpec>,
}

impl ModsConfig {
    pub fn load(path: &Utf8Path) -> Result<Self, SError> {
        let cfg: ModsConfig =
            Toml::read(path).map_err(|e| SError::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Writes the commented template unless the file already exists.
    /// Returns whether a file was written.
    pub fn write_template(path: &Utf8Path) -> Result<bool, SError> {
        if path.exists() {
            return Ok(false);
        }
        FileUtils::write_atomic(path, TEMPLATE.as_bytes()).map_err(|e| SError::HomeUnavailable {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        info!("Wrote template mods config at {path}");
        Ok(true)
    }

    fn validate(&self) -> Result<(), SError> {
        let errors: Vec<String> = self
            .mods
            .iter()
            .enumerate()
            .flat_map(|(i, m)| {
                [
                    m.app.trim().is_empty().then(|| format!("mods[{i}]: 'app' is empty")),
                    m.mod_id.trim().is_empty().then(|| format!("mods[{i}]: 'mod' is empty")),
                ]
            })
            .flatten()
            .collect();

        if errors.is_empty() {
            return Ok(());
        }
        Err(SError::InvalidConfig(errors.join("; ")))
    }

    /// Directory used by mods that do not set `mods_dir`. Falls back to `home`.
    pub fn default_mods_dir(&self, home: &Utf8Path) -> Utf8PathBuf {
        match &self.config.default_mods_dir {
            Some(dir) if !dir.as_str().trim().is_empty() => home.join(dir),
            _ => home.to_path_buf(),
        }
    }

    /// The declared specs with every `install_dir` filled in.
    pub fn resolved_specs(&self, home: &Utf8Path) -> Vec<ModSpec> {
        let default_dir = self.default_mods_dir(home);
        self.mods
            .iter()
            .cloned()
            .map(|mut spec| {
                spec.install_dir = Some(match spec.install_dir.take() {
                    Some(dir) if !dir.as_str().trim().is_empty() => home.join(dir),
                    _ => default_dir.clone(),
                });
                spec
            })
            .collect()
    }
}
