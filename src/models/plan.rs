use crate::models::mod_spec::ModKey;
use crate::models::record::ResolvedMod;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub struct UpdatePlanEntry {
    pub resolved: ResolvedMod,
    pub need_update: bool,
    /// `None` means the mod was not previously installed.
    pub previous_version: Option<String>,
}

impl UpdatePlanEntry {
    pub fn key(&self) -> ModKey {
        self.resolved.key()
    }
}

impl fmt::Display for UpdatePlanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.key();
        match (&self.previous_version, self.need_update) {
            (None, _) => write!(f, "{key}: new {}", self.resolved.version),
            (Some(prev), true) => write!(f, "{key}: update {prev} -> {}", self.resolved.version),
            (Some(_), false) => write!(f, "{key}: up to date ({})", self.resolved.version),
        }
    }
}

/// A declared mod whose provider could not be queried this run.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanFailure {
    pub key: ModKey,
    pub reason: String,
}

/// Key-based comparison of declared and installed state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateDiff {
    /// Declared but never installed.
    pub only_declared: Vec<ModKey>,
    /// Installed but no longer declared. Reported, never removed.
    pub only_installed: Vec<ModKey>,
    /// Present on both sides; filled from resolution results.
    pub version_changed: Vec<ModKey>,
}

#[derive(Clone, Debug, Default)]
pub struct UpdatePlan {
    pub entries: Vec<UpdatePlanEntry>,
    pub failures: Vec<PlanFailure>,
    pub diff: StateDiff,
}

impl UpdatePlan {
    pub fn pending(&self) -> impl Iterator<Item = &UpdatePlanEntry> {
        self.entries.iter().filter(|e| e.need_update)
    }

    pub fn up_to_date(&self) -> usize {
        self.entries.iter().filter(|e| !e.need_update).count()
    }
}
