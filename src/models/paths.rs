use camino::{Utf8Path, Utf8PathBuf};

macro_rules! define_paths {
    ($name:ident { $($field:ident : $default:expr),* $(,)? }) => {
        #[derive(Clone, Debug)]
        pub struct $name {
            $(pub $field: Utf8PathBuf,)*
        }

        impl $name {
            pub fn to_absolute(mut self, base: &Utf8Path) -> Self {
                $(self.$field = base.join(self.$field);)*
                self
            }

            pub fn new(base: &Utf8Path) -> Self {
                Self::default().to_absolute(base)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self {
                    $($field: $default.into(),)*
                }
            }
        }
    };
}

define_paths!(HomePaths {
    mods_config: "mods.toml",
    manifest: "mods.manifest.json",
    logs: "logs",
    workshop: "workshop",
});

/// Suffix of an archive that is still being downloaded.
pub const PART_SUFFIX: &str = "part";
/// Suffix of an extraction that has not been swapped into place yet.
pub const STAGING_SUFFIX: &str = "staging";

/// `install_dir/.<dir name>.<uuid>.part`
pub fn part_file(install_dir: &Utf8Path, dir_name: &str) -> Utf8PathBuf {
    install_dir.join(format!(".{dir_name}.{}.{PART_SUFFIX}", uuid::Uuid::new_v4()))
}

/// `install_dir/.<dir name>.<uuid>.staging`
pub fn staging_dir(install_dir: &Utf8Path, dir_name: &str) -> Utf8PathBuf {
    install_dir.join(format!(".{dir_name}.{}.{STAGING_SUFFIX}", uuid::Uuid::new_v4()))
}

/// `install_dir/<dir name>-<version>.zip`
pub fn archive_file(install_dir: &Utf8Path, dir_name: &str, version: &str) -> Utf8PathBuf {
    install_dir.join(format!("{dir_name}-{}.zip", crate::models::mod_spec::escape(version)))
}

/// True for leftovers of an interrupted run that must never be reused.
pub fn is_leftover(name: &str) -> bool {
    name.starts_with('.')
        && (name.ends_with(&format!(".{PART_SUFFIX}")) || name.ends_with(&format!(".{STAGING_SUFFIX}")))
}
