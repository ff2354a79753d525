#![allow(dead_code)]

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use mod_sync_lib::core::registry::ProviderRegistry;
use mod_sync_lib::models::credentials::Credentials;
use mod_sync_lib::models::error::SError;
use mod_sync_lib::models::mod_spec::Provider;
use mod_sync_lib::providers::{ProviderClient, ResolveRequest, Resolution};
use mod_sync_lib::tools::{ExternalToolFetcher, FetchedContent};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Scratch application home. The directory lives as long as the value.
pub struct TestEnv {
    _tmp: TempDir,
    pub home: Utf8PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let home = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        Self { _tmp: tmp, home }
    }

    pub fn write_mods(&self, content: &str) {
        std::fs::write(self.home.join("mods.toml"), content).unwrap();
    }

    pub fn mods_dir(&self) -> Utf8PathBuf {
        self.home.join("mods")
    }
}

/// Zip archive held in memory.
pub fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Thunderstore package document as served by `/api/experimental/package/{ns}/{name}/`.
pub fn thunderstore_package(namespace: &str, name: &str, version: &str, download_url: &str) -> serde_json::Value {
    json!({
        "namespace": namespace,
        "name": name,
        "community_listings": [],
        "latest": {
            "version_number": version,
            "dependencies": [],
            "download_url": download_url
        }
    })
}

/// Provider answering from a fixed table keyed by mod id. Unknown mods fail.
pub struct StubProvider {
    provider: Provider,
    answers: Mutex<HashMap<String, Resolution>>,
    calls: AtomicUsize,
}

impl StubProvider {
    pub fn new(provider: Provider) -> Arc<Self> {
        Arc::new(Self {
            provider,
            answers: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn answer(&self, mod_id: &str, version: &str, download_url: Option<String>) {
        self.answers.lock().insert(
            mod_id.to_string(),
            Resolution {
                version: version.to_string(),
                download_url,
                dependencies: Vec::new(),
                manifest: json!({ "name": mod_id, "version": version }),
            },
        );
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for StubProvider {
    fn provider(&self) -> Provider {
        self.provider
    }

    async fn resolve(&self, request: ResolveRequest<'_>) -> Result<Resolution, SError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answers
            .lock()
            .get(request.mod_id)
            .cloned()
            .ok_or_else(|| SError::Provider {
                provider: self.provider,
                message: format!("unknown mod {}", request.mod_id),
            })
    }
}

/// Registry where every provider is answered by the given stubs.
pub fn stub_registry(
    thunderstore: Arc<StubProvider>,
    nexusmods: Arc<StubProvider>,
    workshop: Arc<StubProvider>,
) -> ProviderRegistry {
    ProviderRegistry::new(thunderstore, nexusmods, workshop)
}

/// External tool that "downloads" into a directory of its own and records
/// how many invocations overlapped.
pub struct StubTool {
    root: Utf8PathBuf,
    delay: Duration,
    running: AtomicUsize,
    max_running: AtomicUsize,
    calls: AtomicUsize,
    failing: Mutex<Vec<String>>,
}

impl StubTool {
    pub fn new(root: &Utf8Path, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            root: root.to_owned(),
            delay,
            running: AtomicUsize::new(0),
            max_running: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            failing: Mutex::new(Vec::new()),
        })
    }

    pub fn fail(&self, mod_id: &str) {
        self.failing.lock().push(mod_id.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_running(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExternalToolFetcher for StubTool {
    async fn fetch(
        &self,
        app: &str,
        mod_id: &str,
        _credentials: &Credentials,
    ) -> Result<FetchedContent, SError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;
        let result = if self.failing.lock().contains(&mod_id.to_string()) {
            Err(SError::ExternalTool {
                code: Some(5),
                message: format!("ERROR! Download item {mod_id} failed (Failure)."),
            })
        } else {
            let path = self.root.join(app).join(mod_id);
            std::fs::create_dir_all(&path).map_err(SError::from).map(|_| FetchedContent {
                installed_path: Some(path),
            })
        };

        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
