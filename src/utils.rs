pub mod file;
pub mod time;
pub mod toml;
