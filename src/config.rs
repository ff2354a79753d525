pub mod mods;

use crate::models::credentials::Credentials;
use crate::models::error::SError;
use camino::Utf8PathBuf;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const APP_NAME: &str = "mod_sync";

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct AppSettings {
    pub version: u8,
    /// Holds `mods.toml`, the manifest store and the logs.
    pub home: Utf8PathBuf,
    pub steamcmd_path: Option<Utf8PathBuf>,
    pub steam_username: Option<String>,
    pub steam_password: Option<String>,
    pub steam_guard: Option<String>,
    pub nexus_api_key: Option<String>,
    pub steam_api_key: Option<String>,
    pub request_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub tool_timeout_secs: u64,
    /// 0 means one worker per available core.
    pub extract_workers: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        let base_dir = ProjectDirs::from("com", "martes", APP_NAME)
            .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.data_dir().to_path_buf()).ok())
            .or_else(|| {
                std::env::current_exe()
                    .ok()
                    .and_then(|exe_path| exe_path.parent().map(|p| p.to_path_buf()))
                    .and_then(|p| Utf8PathBuf::from_path_buf(p).ok())
            })
            .unwrap_or_else(|| Utf8PathBuf::from("."));

        Self {
            version: 0,
            home: base_dir,
            steamcmd_path: None,
            steam_username: None,
            steam_password: None,
            steam_guard: None,
            nexus_api_key: None,
            steam_api_key: None,
            request_timeout_secs: 30,
            download_timeout_secs: 600,
            tool_timeout_secs: 180,
            extract_workers: 0,
        }
    }
}

impl AppSettings {
    pub fn load() -> Result<AppSettings, SError> {
        Ok(confy::load(APP_NAME, None)?)
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            nexus_api_key: self.nexus_api_key.clone(),
            steam_api_key: self.steam_api_key.clone(),
            steam_username: self.steam_username.clone(),
            steam_password: self.steam_password.clone(),
            steam_guard: self.steam_guard.clone(),
        }
    }

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            request: Duration::from_secs(self.request_timeout_secs.max(1)),
            download: Duration::from_secs(self.download_timeout_secs.max(1)),
            tool: Duration::from_secs(self.tool_timeout_secs.max(1)),
        }
    }

    pub fn extract_workers(&self) -> usize {
        match self.extract_workers {
            0 => std::thread::available_parallelism().map_or(2, |n| n.get()),
            n => n,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    pub request: Duration,
    pub download: Duration,
    pub tool: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        AppSettings::default().timeouts()
    }
}
