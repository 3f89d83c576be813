//! Configuration
//!
//! Values consumed by the core: the package prefix scoping trace matching,
//! the archive eviction timeout, the source/template roots probed during
//! resolution and the profiles the library activates under. Loading is
//! file + environment based; validation happens once at startup and is fatal.

use crate::error::ErrorPagesError;
use crate::logging::LoggingConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_profiles() -> Vec<String> {
    vec!["dev".to_string(), "development".to_string()]
}

fn default_archive_timeout_ms() -> u64 {
    900_000
}

/// Configuration for the error pages library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPagesConfig {
    /// Package prefix whose classes' source code is parsed and displayed.
    pub package_name: String,

    /// Profiles under which the library is active (default: dev, development).
    #[serde(default = "default_profiles")]
    pub profiles: Vec<String>,

    /// Timeout in milliseconds after which unviewed archived errors are
    /// evicted (default: 900000).
    #[serde(default = "default_archive_timeout_ms")]
    pub archive_timeout_ms: u64,

    /// Roots probed for application source files.
    #[serde(default)]
    pub source_roots: Vec<PathBuf>,

    /// Roots probed for template files.
    #[serde(default)]
    pub template_roots: Vec<PathBuf>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ErrorPagesConfig {
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            profiles: default_profiles(),
            archive_timeout_ms: default_archive_timeout_ms(),
            source_roots: Vec::new(),
            template_roots: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate the configuration; failures are fatal at startup.
    ///
    /// An explicitly-set but empty package or profile override is a
    /// configuration error, never a fall-through to some default.
    pub fn validate(&self) -> Result<(), ErrorPagesError> {
        if self.package_name.trim().is_empty() {
            return Err(ErrorPagesError::Config(
                "package_name must not be empty".to_string(),
            ));
        }
        if self.profiles.is_empty() || self.profiles.iter().any(|p| p.trim().is_empty()) {
            return Err(ErrorPagesError::Config(
                "profiles override must not be empty".to_string(),
            ));
        }
        if self.archive_timeout_ms == 0 {
            return Err(ErrorPagesError::Config(
                "archive_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether any active profile enables the library.
    pub fn is_enabled_for(&self, active_profiles: &[String]) -> bool {
        active_profiles
            .iter()
            .any(|active| self.profiles.contains(active))
    }

    pub fn archive_timeout(&self) -> Duration {
        Duration::from_millis(self.archive_timeout_ms)
    }
}

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a specific file, with environment overrides
    /// under the `BETTER_ERROR_PAGES_` prefix.
    pub fn load_from_file(path: &Path) -> Result<ErrorPagesConfig, ConfigError> {
        Config::builder()
            .add_source(File::from(path))
            .add_source(Environment::with_prefix("BETTER_ERROR_PAGES").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ErrorPagesConfig::new("com.acme");
        assert_eq!(config.archive_timeout_ms, 900_000);
        assert_eq!(config.profiles, vec!["dev", "development"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_package_override_is_fatal() {
        let config = ErrorPagesConfig::new("  ");
        assert!(matches!(
            config.validate(),
            Err(ErrorPagesError::Config(_))
        ));
    }

    #[test]
    fn empty_profiles_override_is_fatal() {
        let mut config = ErrorPagesConfig::new("com.acme");
        config.profiles = vec![];
        assert!(config.validate().is_err());

        config.profiles = vec![String::new()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn profile_activation_check() {
        let config = ErrorPagesConfig::new("com.acme");
        assert!(config.is_enabled_for(&["dev".to_string()]));
        assert!(!config.is_enabled_for(&["prod".to_string()]));
        assert!(!config.is_enabled_for(&[]));
    }

    #[test]
    fn load_from_file_applies_serde_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("better-error-pages.toml");
        std::fs::write(&path, "package_name = \"com.acme\"\n").unwrap();

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.package_name, "com.acme");
        assert_eq!(config.archive_timeout_ms, 900_000);
        assert!(config.source_roots.is_empty());
    }
}
