use crate::models::error::SError;
use camino::Utf8Path;

pub struct Toml;

impl Toml {
    pub fn read<T: serde::de::DeserializeOwned>(path: &Utf8Path) -> Result<T, SError> {
        let s = std::fs::read_to_string(path).map_err(|e| SError::IOError(format!("{path}: {e}")))?;
        toml::from_str::<T>(&s).map_err(|e| SError::ParseError(format!("{path}: {e}")))
    }
}
