use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;

pub struct Linker;

impl Linker {
    /// Points `target` at `source`. An existing link is re-pointed; anything
    /// else already at `target` is left alone and reported.
    pub fn link(source: &Utf8Path, target: &Utf8Path) -> io::Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        if target.is_symlink() {
            if Self::read_link_target(target).ok().as_deref() == Some(source) {
                return Ok(());
            }
            Self::unlink(target)?;
        } else if target.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("'{target}' exists and is not a link"),
            ));
        }

        #[cfg(windows)]
        {
            if source.is_dir() {
                junction::create(source, target)
            } else {
                std::os::windows::fs::symlink_file(source, target)
            }
        }
        #[cfg(unix)]
        {
            std::os::unix::fs::symlink(source, target)
        }
    }

    pub fn read_link_target(path: &Utf8Path) -> io::Result<Utf8PathBuf> {
        #[cfg(windows)]
        let target = if path.is_dir() {
            junction::get_target(path).or_else(|_| fs::read_link(path))?
        } else {
            fs::read_link(path)?
        };
        #[cfg(not(windows))]
        let target = fs::read_link(path)?;

        Utf8PathBuf::from_path_buf(target).map_err(|p| {
            io::Error::new(io::ErrorKind::InvalidData, format!("non UTF-8 link target {p:?}"))
        })
    }

    /// Removes a link. Missing paths are fine; real files and directories are refused.
    pub fn unlink(target: &Utf8Path) -> io::Result<()> {
        if !target.exists() && !target.is_symlink() {
            return Ok(());
        }

        let meta = fs::symlink_metadata(target)?;
        if !meta.file_type().is_symlink() {
            #[cfg(windows)]
            {
                if junction::exists(target).unwrap_or(false) {
                    return junction::delete(target).and_then(|_| fs::remove_dir(target));
                }
            }
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "Target is not a symlink"));
        }

        #[cfg(windows)]
        {
            if target.is_dir() {
                return fs::remove_dir(target);
            }
        }
        fs::remove_file(target)
    }
}
