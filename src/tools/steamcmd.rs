use crate::models::credentials::Credentials;
use crate::models::error::SError;
use crate::tools::{ExternalToolFetcher, FetchedContent};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, instrument, warn};

/// Downloads workshop items by running SteamCMD.
pub struct SteamCmd {
    exec: Utf8PathBuf,
    timeout: Duration,
}

impl SteamCmd {
    pub fn new(exec: &Utf8Path, timeout: Duration) -> Result<Self, SError> {
        let meta = std::fs::metadata(exec)
            .map_err(|e| SError::ToolUnavailable(format!("'{exec}' is not found: {e}")))?;
        if !meta.is_file() {
            return Err(SError::ToolUnavailable(format!("'{exec}' is not a file")));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if meta.permissions().mode() & 0o111 == 0 {
                return Err(SError::ToolUnavailable(format!(
                    "the current user cannot execute '{exec}'"
                )));
            }
        }

        let looks_like_steamcmd = exec
            .file_name()
            .is_some_and(|name| name.to_lowercase().starts_with("steamcmd"));
        if !looks_like_steamcmd {
            return Err(SError::ToolUnavailable(format!(
                "'{exec}' doesn't seem to be a steamcmd executable"
            )));
        }

        Ok(Self {
            exec: exec.to_owned(),
            timeout,
        })
    }

    pub fn build_args(credentials: &Credentials, app: &str, mod_id: &str) -> Vec<String> {
        let mut args = vec!["+login".to_string()];

        match credentials.steam_login() {
            Some((user, password)) => {
                args.push(user.to_string());
                args.push(password.to_string());
                if let Some(guard) = credentials.steam_guard.as_deref().filter(|g| !g.is_empty()) {
                    args.push(guard.to_string());
                }
            }
            None => args.push("anonymous".to_string()),
        }

        args.extend(
            ["+workshop_download_item", app, mod_id, "+quit"]
                .into_iter()
                .map(String::from),
        );
        args
    }

    /// Picks the install path out of `Success. Downloaded item <id> to "<path>"`.
    pub fn parse_installed_path(stdout: &str) -> Option<Utf8PathBuf> {
        let re = Regex::new(r#"Success\. Downloaded item.*"([^"]+)""#).ok()?;
        re.captures(stdout)
            .and_then(|caps| caps.get(1))
            .map(|m| Utf8PathBuf::from(m.as_str()))
    }
}

#[async_trait]
impl ExternalToolFetcher for SteamCmd {
    #[instrument(skip(self, credentials))]
    async fn fetch(
        &self,
        app: &str,
        mod_id: &str,
        credentials: &Credentials,
    ) -> Result<FetchedContent, SError> {
        let mut cmd = Command::new(self.exec.as_std_path());
        cmd.args(Self::build_args(credentials, app, mod_id))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| SError::Timeout(format!("steamcmd did not finish within {:?}", self.timeout)))?
            .map_err(|e| SError::ToolUnavailable(format!("failed to start '{}': {e}", self.exec)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match stderr.trim() {
                "" => stdout.lines().last().unwrap_or_default().trim().to_string(),
                s => s.to_string(),
            };
            return Err(SError::ExternalTool {
                code: output.status.code(),
                message,
            });
        }

        let installed_path = Self::parse_installed_path(&stdout);
        match &installed_path {
            Some(path) => info!("Workshop item {app}/{mod_id} downloaded to {path}"),
            None => warn!("steamcmd succeeded for {app}/{mod_id} but reported no install path"),
        }
        Ok(FetchedContent { installed_path })
    }
}
