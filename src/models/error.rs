use crate::models::mod_spec::Provider;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SError {
    #[error("I/O error: {0}")]
    IOError(String),
    #[error("parse error: {0}")]
    ParseError(String),
    #[error("manifest store '{path}' is corrupt: {reason}")]
    CorruptManifest { path: String, reason: String },
    #[error("directory '{path}' is not usable: {reason}")]
    HomeUnavailable { path: String, reason: String },
    #[error("invalid mods config: {0}")]
    InvalidConfig(String),
    #[error("settings error: {0}")]
    Settings(String),
    #[error("{provider} API error: {message}")]
    Provider { provider: Provider, message: String },
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("version '{version}' of {app}/{mod_id} not found")]
    VersionNotFound {
        app: String,
        mod_id: String,
        version: String,
    },
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),
    #[error("extraction failed: {0}")]
    Extraction(String),
    #[error("external tool exited with code {code:?}: {message}")]
    ExternalTool { code: Option<i32>, message: String },
    #[error("external tool unavailable: {0}")]
    ToolUnavailable(String),
    #[error("link error: {0}")]
    Link(String),
    #[error("async runtime error: {0}")]
    AsyncRuntimeError(String),
}

impl SError {
    /// Fatal errors abort the run before anything is committed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SError::CorruptManifest { .. }
                | SError::HomeUnavailable { .. }
                | SError::InvalidConfig(_)
                | SError::Settings(_)
        )
    }
}

impl From<std::io::Error> for SError {
    fn from(e: std::io::Error) -> Self {
        SError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for SError {
    fn from(e: serde_json::Error) -> Self {
        SError::ParseError(e.to_string())
    }
}

impl From<toml::de::Error> for SError {
    fn from(e: toml::de::Error) -> Self {
        SError::ParseError(e.to_string())
    }
}

impl From<zip::result::ZipError> for SError {
    fn from(e: zip::result::ZipError) -> Self {
        SError::Extraction(e.to_string())
    }
}

impl From<confy::ConfyError> for SError {
    fn from(e: confy::ConfyError) -> Self {
        SError::Settings(e.to_string())
    }
}

impl From<reqwest::Error> for SError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return SError::Timeout(e.to_string());
        }
        match e.status() {
            Some(status) => SError::HttpStatus {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            },
            None => SError::Network(e.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for SError {
    fn from(e: tokio::task::JoinError) -> Self {
        SError::AsyncRuntimeError(e.to_string())
    }
}
