use crate::models::credentials::Credentials;
use crate::models::error::SError;
use crate::models::mod_spec::Provider;
use crate::providers::http::{endpoint, fetch_json};
use crate::providers::{ProviderClient, ResolveRequest, Resolution};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.steampowered.com";

/// `EResult::OK`
const RESULT_OK: i64 = 1;

#[derive(Deserialize)]
struct PublishedFile {
    result: i64,
    #[serde(default)]
    time_updated: Option<u64>,
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Deserialize)]
struct Child {
    publishedfileid: String,
}

/// Looks up workshop items through the Steam Web API. The content itself is
/// fetched out-of-band (see [`crate::tools::file_url`]), so no download URL is produced.
pub struct WorkshopClient {
    http: Client,
    base_url: String,
}

impl WorkshopClient {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Raw `GetDetails` answer for one published file.
    pub async fn published_file(&self, mod_id: &str, credentials: &Credentials) -> Result<Value, SError> {
        let key = credentials
            .steam_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(SError::MissingCredential("steam_api_key"))?;

        let url = endpoint(&self.base_url, &["IPublishedFileService", "GetDetails", "v1"], true)?;
        debug!("GET {url} for published file {mod_id}");
        fetch_json(self.http.get(url).query(&[
            ("key", key),
            ("publishedfileids[0]", mod_id),
            ("includechildren", "1"),
            ("includemetadata", "1"),
            ("strip_description_bbcode", "1"),
        ]))
        .await
    }

    fn invalid(message: impl Into<String>) -> SError {
        SError::Provider {
            provider: Provider::Workshop,
            message: message.into(),
        }
    }

    /// Workshop items carry no version numbers; the last update time stands in for one.
    fn parse(body: &Value, request: &ResolveRequest<'_>) -> Result<Resolution, SError> {
        let details = body
            .pointer("/response/publishedfiledetails/0")
            .ok_or_else(|| Self::invalid(format!("no details for published file {}", request.mod_id)))?;
        let file = PublishedFile::deserialize(details).map_err(|e| Self::invalid(e.to_string()))?;

        if file.result != RESULT_OK {
            return Err(Self::invalid(format!(
                "query for published file {} returned result {}",
                request.mod_id, file.result
            )));
        }

        let version = file
            .time_updated
            .map(|t| t.to_string())
            .ok_or_else(|| Self::invalid("missing time_updated"))?;

        if let Some(pin) = request.version {
            if pin != version {
                return Err(SError::VersionNotFound {
                    app: request.app.to_string(),
                    mod_id: request.mod_id.to_string(),
                    version: pin.to_string(),
                });
            }
        }

        Ok(Resolution {
            version,
            download_url: None,
            dependencies: file.children.into_iter().map(|c| c.publishedfileid).collect(),
            manifest: details.clone(),
        })
    }
}

#[async_trait]
impl ProviderClient for WorkshopClient {
    fn provider(&self) -> Provider {
        Provider::Workshop
    }

    async fn resolve(&self, request: ResolveRequest<'_>) -> Result<Resolution, SError> {
        let body = self.published_file(request.mod_id, request.credentials).await?;
        Self::parse(&body, &request)
    }
}
