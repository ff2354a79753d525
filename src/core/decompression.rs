use crate::models::error::SError;
use camino::Utf8Path;
use std::fmt::Display;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use zip::ZipArchive;

/// Unpacks a downloaded archive. Called from the blocking pool.
pub trait ArchiveInstaller: Send + Sync {
    fn extract(&self, archive_path: &Utf8Path, destination: &Utf8Path) -> Result<(), SError>;
}

/// Unpacks zip archives into a fresh directory. Every failure is reported as
/// [`SError::Extraction`] naming the archive.
pub struct ZipInstaller;

impl ZipInstaller {
    fn write_file(reader: &mut impl io::Read, target: &Path, mode: Option<u32>) -> io::Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        io::copy(reader, &mut File::create(target)?)?;

        // Executables inside mods keep their mode.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = mode {
                fs::set_permissions(target, fs::Permissions::from_mode(mode))?;
            }
        }
        #[cfg(not(unix))]
        let _ = mode;
        Ok(())
    }
}

impl ArchiveInstaller for ZipInstaller {
    fn extract(&self, archive_path: &Utf8Path, destination: &Utf8Path) -> Result<(), SError> {
        let failed = |e: &dyn Display| SError::Extraction(format!("{archive_path}: {e}"));

        let file = File::open(archive_path).map_err(|e| failed(&e))?;
        let mut archive = ZipArchive::new(file).map_err(|e| failed(&e))?;
        fs::create_dir_all(destination).map_err(|e| failed(&e))?;

        let mut unpacked = 0usize;
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i).map_err(|e| failed(&e))?;

            // Zip Slip: enclosed_name() rejects entries escaping the destination.
            let Some(relative) = entry.enclosed_name() else {
                warn!("Skipping unsafe entry '{}' in {archive_path}", entry.name());
                continue;
            };
            let target = destination.as_std_path().join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&target).map_err(|e| failed(&e))?;
                continue;
            }
            let mode = entry.unix_mode();
            Self::write_file(&mut entry, &target, mode)
                .map_err(|e| failed(&format!("{}: {e}", target.display())))?;
            unpacked += 1;
        }

        debug!("Unpacked {unpacked} files from {archive_path} into {destination}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn archive(dir: &Utf8Path, files: &[&str]) -> camino::Utf8PathBuf {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for name in files {
            writer.start_file(*name, zip::write::SimpleFileOptions::default()).unwrap();
            writer.write_all(name.as_bytes()).unwrap();
        }
        let path = dir.join("mod.zip");
        fs::write(&path, writer.finish().unwrap().into_inner()).unwrap();
        path
    }

    #[test]
    fn nested_entries_are_unpacked() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(tmp.path()).unwrap();
        let zip = archive(dir, &["plugins/a/widget.dll", "readme.txt"]);

        ZipInstaller.extract(&zip, &dir.join("out")).unwrap();

        assert_eq!(fs::read_to_string(dir.join("out/plugins/a/widget.dll")).unwrap(), "plugins/a/widget.dll");
        assert!(dir.join("out/readme.txt").exists());
    }

    #[test]
    fn unreadable_archive_names_the_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(tmp.path()).unwrap();
        let zip = dir.join("broken.zip");
        fs::write(&zip, "not a zip").unwrap();

        let err = ZipInstaller.extract(&zip, &dir.join("out")).unwrap_err();

        assert!(matches!(&err, SError::Extraction(msg) if msg.contains("broken.zip")), "{err}");
    }
}
