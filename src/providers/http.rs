use crate::models::error::SError;
use camino::Utf8Path;
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

const USER_AGENT: &str = concat!("mod-sync/", env!("CARGO_PKG_VERSION"));

/// Builds the shared client. `timeout` bounds every request made with it.
pub fn build_client(timeout: Duration) -> Result<Client, SError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()
        .map_err(|e| SError::Network(format!("failed to create HTTP client: {e}")))
}

/// Same as [`build_client`] but without a whole-request timeout, for large bodies
/// whose overall duration is bounded by the caller.
pub fn build_download_client(connect_timeout: Duration) -> Result<Client, SError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(connect_timeout)
        .build()
        .map_err(|e| SError::Network(format!("failed to create HTTP client: {e}")))
}

/// Parses `base` and appends `segments` as escaped path segments.
pub fn endpoint(base: &str, segments: &[&str], trailing_slash: bool) -> Result<Url, SError> {
    let mut url = Url::parse(base).map_err(|e| SError::ParseError(format!("{base}: {e}")))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| SError::ParseError(format!("{base} cannot be a base URL")))?;
        path.pop_if_empty().extend(segments);
        if trailing_slash {
            path.push("");
        }
    }
    Ok(url)
}

/// Sends `request` and returns its JSON body, turning non-2xx statuses into errors.
pub async fn fetch_json(request: RequestBuilder) -> Result<Value, SError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SError::HttpStatus {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }
    Ok(response.json::<Value>().await?)
}

/// Streams the body of `url` into `part`, giving up after `limit`. The file is
/// only created once the server answered 2xx and is removed on any failure.
pub async fn download_to(http: &Client, url: &str, part: &Utf8Path, limit: Duration) -> Result<u64, SError> {
    let written = tokio::time::timeout(limit, stream_to(http, url, part))
        .await
        .map_err(|_| SError::Timeout(format!("download of {url} exceeded {limit:?}")))
        .and_then(|r| r);
    if written.is_err() {
        let _ = tokio::fs::remove_file(part).await;
    }
    written
}

async fn stream_to(http: &Client, url: &str, part: &Utf8Path) -> Result<u64, SError> {
    let mut response = http.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(SError::HttpStatus {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let mut file = tokio::fs::File::create(part).await?;
    let mut bytes = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        bytes += chunk.len() as u64;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok(bytes)
}
