use crate::models::error::SError;
use crate::models::mod_spec::Provider;
use crate::providers::http::{endpoint, fetch_json};
use crate::providers::{ProviderClient, ResolveRequest, Resolution};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://thunderstore.io";

#[derive(Deserialize)]
struct PackageVersion {
    version_number: String,
    #[serde(default)]
    dependencies: Vec<String>,
    download_url: String,
}

#[derive(Deserialize)]
struct CommunityListing {
    community: String,
}

#[derive(Deserialize)]
struct Listings {
    #[serde(default)]
    community_listings: Vec<CommunityListing>,
}

#[derive(Deserialize)]
struct Package {
    latest: PackageVersion,
}

pub struct ThunderstoreClient {
    http: Client,
    base_url: String,
}

impl ThunderstoreClient {
    pub fn new(http: Client) -> Self {
        Self::with_base_url(http, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Reads the fields out of either the package document (latest) or a version document (pinned).
    fn parse(body: Value, pinned: bool) -> Result<Resolution, SError> {
        let invalid = |e: serde_json::Error| SError::Provider {
            provider: Provider::Thunderstore,
            message: format!("unexpected package document: {e}"),
        };

        let version = if pinned {
            PackageVersion::deserialize(&body).map_err(invalid)?
        } else {
            Package::deserialize(&body).map_err(invalid)?.latest
        };
        let listings = Listings::deserialize(&body).map_err(invalid)?;

        let download_url = match listings.community_listings.first() {
            Some(listing) => community_url(&version.download_url, &listing.community),
            None => version.download_url,
        };

        Ok(Resolution {
            version: version.version_number,
            download_url: Some(download_url),
            dependencies: version.dependencies,
            manifest: body,
        })
    }
}

/// Downloads are served from the community subdomain: `https://x` -> `https://<community>.x`.
fn community_url(url: &str, community: &str) -> String {
    match url.strip_prefix("https://") {
        Some(rest) if !community.is_empty() => format!("https://{community}.{rest}"),
        _ => url.to_string(),
    }
}

#[async_trait]
impl ProviderClient for ThunderstoreClient {
    fn provider(&self) -> Provider {
        Provider::Thunderstore
    }

    async fn resolve(&self, request: ResolveRequest<'_>) -> Result<Resolution, SError> {
        let mut segments = vec!["api", "experimental", "package", request.app, request.mod_id];
        if let Some(version) = request.version {
            segments.push(version);
        }
        let url = endpoint(&self.base_url, &segments, true)?;
        debug!("GET {url}");

        let body = fetch_json(self.http.get(url)).await.map_err(|e| match e {
            SError::HttpStatus { status: 404, .. } if request.version.is_some() => SError::VersionNotFound {
                app: request.app.to_string(),
                mod_id: request.mod_id.to_string(),
                version: request.version.unwrap_or_default().to_string(),
            },
            other => other,
        })?;
        Self::parse(body, request.version.is_some())
    }
}
