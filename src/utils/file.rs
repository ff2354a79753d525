use crate::models::error::SError;
use crate::models::paths::is_leftover;
use camino::{Utf8Path, Utf8PathBuf};
use std::io::Write;
use tracing::{debug, warn};

pub struct FileUtils;

impl FileUtils {
    /// Writes `data` next to `path` and renames it into place, so readers see
    /// either the old content or the new one.
    pub fn write_atomic(path: &Utf8Path, data: &[u8]) -> Result<(), SError> {
        let parent = path
            .parent()
            .filter(|p| !p.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        std::fs::create_dir_all(parent)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".mod_sync")
            .suffix(".tmp")
            .tempfile_in(parent)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| SError::IOError(format!("{path}: {}", e.error)))?;
        Ok(())
    }

    /// Fails unless `dir` exists (creating it if needed) and accepts new files.
    pub fn ensure_writable_dir(dir: &Utf8Path) -> Result<(), SError> {
        let unavailable = |reason: String| SError::HomeUnavailable {
            path: dir.to_string(),
            reason,
        };
        std::fs::create_dir_all(dir).map_err(|e| unavailable(e.to_string()))?;
        tempfile::tempfile_in(dir).map_err(|e| unavailable(e.to_string()))?;
        Ok(())
    }

    /// Moves `staged` into `destination`, replacing whatever was there.
    pub fn replace_dir(staged: &Utf8Path, destination: &Utf8Path) -> Result<(), SError> {
        if !destination.exists() && !destination.is_symlink() {
            std::fs::rename(staged, destination)?;
            return Ok(());
        }

        // Park the old tree first so a failed rename can be rolled back.
        let parked = Utf8PathBuf::from(format!("{staged}.old"));
        std::fs::rename(destination, &parked)?;
        if let Err(e) = std::fs::rename(staged, destination) {
            let _ = std::fs::rename(&parked, destination);
            return Err(e.into());
        }

        let removed = if parked.is_symlink() || parked.is_file() {
            std::fs::remove_file(&parked)
        } else {
            std::fs::remove_dir_all(&parked)
        };
        if let Err(e) = removed {
            warn!("Failed to remove previous install at {parked}: {e}");
        }
        Ok(())
    }

    /// Deletes `.part` downloads and `.staging` trees left by an interrupted run.
    pub fn sweep_leftovers(dir: &Utf8Path) -> usize {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return 0;
        };

        entries
            .flatten()
            .filter(|e| e.file_name().to_str().is_some_and(is_leftover))
            .filter(|e| {
                let path = e.path();
                let removed = if path.is_dir() {
                    std::fs::remove_dir_all(&path)
                } else {
                    std::fs::remove_file(&path)
                };
                match removed {
                    Ok(()) => {
                        debug!("Removed leftover {}", path.display());
                        true
                    }
                    Err(e) => {
                        warn!("Failed to remove leftover {}: {e}", path.display());
                        false
                    }
                }
            })
            .count()
    }
}
