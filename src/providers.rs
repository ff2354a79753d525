//! Provider boundary: one [`ProviderClient`] per supported provider.

pub mod http;
pub mod nexusmods;
pub mod thunderstore;
pub mod workshop;

use crate::models::credentials::Credentials;
use crate::models::error::SError;
use crate::models::mod_spec::Provider;
use async_trait::async_trait;
use serde_json::Value;

#[derive(Clone, Copy, Debug)]
pub struct ResolveRequest<'a> {
    pub app: &'a str,
    pub mod_id: &'a str,
    /// `None` asks for whatever the provider marks as latest.
    pub version: Option<&'a str>,
    pub credentials: &'a Credentials,
}

/// Version and download metadata reported by a provider.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub version: String,
    pub download_url: Option<String>,
    pub dependencies: Vec<String>,
    /// Raw provider payload, stored verbatim in the installed record.
    pub manifest: Value,
}

#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn resolve(&self, request: ResolveRequest<'_>) -> Result<Resolution, SError>;
}
