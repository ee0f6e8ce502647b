//! Configuration loader.
//!
//! `defaults/hbdocs.default.toml` is embedded into every binary. User files and
//! CLI flags are layered on top via [`Loader`] before deserializing into
//! [`DocsConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_TOML: &str = include_str!("../defaults/hbdocs.default.toml");

/// Picked up from the working directory when present.
pub const LOCAL_CONFIG: &str = "hbdocs.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct DocsConfig {
    pub paths: PathsConfig,
    pub devices: DevicesConfig,
    pub server: ServerConfig,
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    pub source_root: PathBuf,
    pub target_root: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DevicesConfig {
    pub parser_program: String,
    #[serde(default)]
    pub parser_script: Option<PathBuf>,
    pub parser_output: PathBuf,
    pub target_dir: PathBuf,
    pub device_list: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    pub debounce_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Override `key` only when a value was supplied.
    pub fn override_path(self, key: &str, value: Option<&Path>) -> Result<Self, ConfigError> {
        match value {
            Some(path) => self.set_override(key, path.to_string_lossy().into_owned()),
            None => Ok(self),
        }
    }

    pub fn build(self) -> Result<DocsConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Defaults, then `./hbdocs.toml` if present, or `explicit` (required) when given.
pub fn loader_for(explicit: Option<&Path>) -> Loader {
    match explicit {
        Some(path) => Loader::new().with_file(path),
        None => Loader::new().with_optional_file(LOCAL_CONFIG),
    }
}

pub fn load_defaults() -> Result<DocsConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.paths.source_root, PathBuf::from(".."));
        assert_eq!(config.paths.target_root, PathBuf::from("src/data/subsystems"));
        assert_eq!(config.devices.parser_program, "node");
        assert!(config.devices.parser_script.is_none());
        assert_eq!(config.watch.debounce_ms, 250);
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .override_path("paths.source_root", Some(Path::new("/tmp/analysis")))
            .unwrap()
            .override_path("paths.target_root", None)
            .unwrap()
            .set_override("server.bind", "0.0.0.0:8080")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(config.paths.source_root, PathBuf::from("/tmp/analysis"));
        assert_eq!(config.paths.target_root, PathBuf::from("src/data/subsystems"));
        assert_eq!(config.server.bind, "0.0.0.0:8080");
    }

    #[test]
    fn user_file_layers_over_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[devices]\nparser_script = \"stage2/parse.js\"").unwrap();
        let config = Loader::new().with_file(file.path()).build().unwrap();
        assert_eq!(
            config.devices.parser_script,
            Some(PathBuf::from("stage2/parse.js"))
        );
        assert_eq!(config.devices.target_dir, PathBuf::from("src/data/devices"));
    }

    #[test]
    fn missing_required_file_fails() {
        let result = Loader::new().with_file("/no/such/hbdocs.toml").build();
        assert!(result.is_err());
    }
}
