use crate::models::mod_spec::ModKey;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum FetchStatus {
    Installed { version: String },
    Failed { reason: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct FetchOutcome {
    pub key: ModKey,
    pub status: FetchStatus,
}

impl FetchOutcome {
    pub fn installed(key: ModKey, version: impl Into<String>) -> Self {
        Self {
            key,
            status: FetchStatus::Installed {
                version: version.into(),
            },
        }
    }

    pub fn failed(key: ModKey, reason: impl ToString) -> Self {
        Self {
            key,
            status: FetchStatus::Failed {
                reason: reason.to_string(),
            },
        }
    }
}

/// Aggregate result of one synchronization run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SyncReport {
    pub updated: usize,
    pub up_to_date: usize,
    pub failed: usize,
    pub orphaned: Vec<ModKey>,
    pub outcomes: Vec<FetchOutcome>,
    pub failures: Vec<(ModKey, String)>,
}

impl SyncReport {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} updated, {} failed, {} up to date",
            self.updated, self.failed, self.up_to_date
        )
    }
}
