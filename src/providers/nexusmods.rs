use crate::models::error::SError;
use crate::models::mod_spec::Provider;
use crate::providers::http::{endpoint, fetch_json};
use crate::providers::{ProviderClient, ResolveRequest, Resolution};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.nexusmods.com";

#[derive(Deserialize, Debug)]
struct ModFile {
    file_id: u64,
    #[serde(default)]
    version: Option<String>,
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<ModFile>,
}

#[derive(Deserialize)]
struct DownloadLink {
    #[serde(rename = "URI")]
    uri: String,
}

pub struct NexusModsClient {
    http: Client,
    base_url: String,
}

impl NexusModsClient {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn invalid(message: impl Into<String>) -> SError {
        SError::Provider {
            provider: Provider::Nexusmods,
            message: message.into(),
        }
    }

    /// The last listed file is the latest; a pin picks the first file with that version.
    fn select_file(files: &[ModFile], request: &ResolveRequest<'_>) -> Result<(u64, String), SError> {
        let file = match request.version {
            None => files.last(),
            Some(pin) => files.iter().find(|f| f.version.as_deref() == Some(pin)),
        };

        match (file, request.version) {
            (Some(f), _) => Ok((
                f.file_id,
                f.version.clone().unwrap_or_else(|| f.file_id.to_string()),
            )),
            (None, Some(pin)) => Err(SError::VersionNotFound {
                app: request.app.to_string(),
                mod_id: request.mod_id.to_string(),
                version: pin.to_string(),
            }),
            (None, None) => Err(Self::invalid(format!(
                "no files listed for {}/{}",
                request.app, request.mod_id
            ))),
        }
    }

    async fn get(&self, segments: &[&str], api_key: &str) -> Result<Value, SError> {
        let url = endpoint(&self.base_url, segments, false)?;
        debug!("GET {url}");
        fetch_json(
            self.http
                .get(url)
                .header("accept", "application/json")
                .header("apikey", api_key),
        )
        .await
    }
}

#[async_trait]
impl ProviderClient for NexusModsClient {
    fn provider(&self) -> Provider {
        Provider::Nexusmods
    }

    async fn resolve(&self, request: ResolveRequest<'_>) -> Result<Resolution, SError> {
        let api_key = request
            .credentials
            .nexus_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(SError::MissingCredential("nexus_api_key"))?;

        let (game, mod_id) = (request.app, request.mod_id);
        let manifest = self
            .get(&["v1", "games", game, "mods", mod_id, "files.json"], api_key)
            .await?;
        let list = FileList::deserialize(&manifest).map_err(|e| Self::invalid(e.to_string()))?;
        let (file_id, version) = Self::select_file(&list.files, &request)?;

        let file_id = file_id.to_string();
        let links = self
            .get(
                &["v1", "games", game, "mods", mod_id, "files", file_id.as_str(), "download_link.json"],
                api_key,
            )
            .await?;
        let links = Vec::<DownloadLink>::deserialize(&links).map_err(|e| Self::invalid(e.to_string()))?;
        let link = links
            .into_iter()
            .next()
            .ok_or_else(|| Self::invalid(format!("no download link for file {file_id}")))?;

        Ok(Resolution {
            version,
            download_url: Some(link.uri),
            dependencies: Vec::new(),
            manifest,
        })
    }
}
