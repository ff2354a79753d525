use crate::models::error::SError;
use crate::models::mod_spec::ModKey;
use crate::models::record::InstalledRecord;
use crate::utils::file::FileUtils;
use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

const FORMAT_VERSION: u8 = 1;

pub type Records = BTreeMap<ModKey, InstalledRecord>;

#[derive(Serialize, Deserialize)]
struct ManifestFile {
    format: u8,
    records: Vec<InstalledRecord>,
}

/// Durable `(provider, app, mod) -> InstalledRecord` map.
///
/// The in-memory map is only changed through [`ManifestStore::record`], which
/// commits right away, so the file on disk never lags more than one entry behind.
pub struct ManifestStore {
    path: Utf8PathBuf,
    records: Mutex<Records>,
}

impl ManifestStore {
    pub fn open(path: &Utf8Path) -> Result<Self, SError> {
        let records = Self::load(path)?;
        debug!("Loaded {} installed records from {path}", records.len());
        Ok(Self {
            path: path.to_owned(),
            records: Mutex::new(records),
        })
    }

    /// A missing file is a first run and yields no records; anything unreadable is corruption.
    pub fn load(path: &Utf8Path) -> Result<Records, SError> {
        let corrupt = |reason: String| SError::CorruptManifest {
            path: path.to_string(),
            reason,
        };

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Records::new()),
            Err(e) => return Err(corrupt(e.to_string())),
        };

        let file: ManifestFile = serde_json::from_str(&content).map_err(|e| corrupt(e.to_string()))?;
        if file.format != FORMAT_VERSION {
            return Err(corrupt(format!("unsupported format {}", file.format)));
        }

        let mut records = Records::new();
        for record in file.records {
            if let Some(previous) = records.insert(record.key(), record) {
                warn!("Duplicate manifest record for {}, keeping the last one", previous.key());
            }
        }
        Ok(records)
    }

    /// Atomically replaces the file at `path` with `records`.
    pub fn commit_records(path: &Utf8Path, records: &Records) -> Result<(), SError> {
        let file = ManifestFile {
            format: FORMAT_VERSION,
            records: records.values().cloned().collect(),
        };
        let mut json = serde_json::to_vec_pretty(&file)?;
        json.push(b'\n');
        FileUtils::write_atomic(path, &json)
    }

    pub fn snapshot(&self) -> Records {
        self.records.lock().clone()
    }

    pub fn get(&self, key: &ModKey) -> Option<InstalledRecord> {
        self.records.lock().get(key).cloned()
    }

    /// Stores a freshly installed record and commits the whole map.
    pub fn record(&self, record: InstalledRecord) -> Result<(), SError> {
        let mut records = self.records.lock();
        records.insert(record.key(), record);
        Self::commit_records(&self.path, &records)
    }

    pub fn commit(&self) -> Result<(), SError> {
        let records = self.records.lock();
        Self::commit_records(&self.path, &records)
    }
}
