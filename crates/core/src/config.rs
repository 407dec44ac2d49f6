//! Application configuration.
//!
//! Values come from built-in defaults, an optional `config.toml` under the
//! user's config directory, and `KOMPUTER_*` environment variables, in that
//! order of precedence.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Directory under the platform config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "komputer";
/// Default host serving the laptop catalog and its images.
pub const DEFAULT_API_BASE_URL: &str = "https://noroff-komputer-store-api.herokuapp.com";
/// Euros added to pay for each shift worked.
pub const DEFAULT_SALARY: i64 = 100;

const ENV_PREFIX: &str = "KOMPUTER";

/// Runtime settings shared by the core and the frontends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the store API, without a trailing slash.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Pay earned per shift, in whole euros.
    #[serde(default = "default_salary")]
    pub salary: i64,
    /// Extensions probed, in order, when an item's image is missing.
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_salary() -> i64 {
    DEFAULT_SALARY
}

fn default_image_extensions() -> Vec<String> {
    [".png", ".jpg", ".jpeg"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            salary: default_salary(),
            image_extensions: default_image_extensions(),
        }
    }
}

impl AppConfig {
    /// Location of the optional user config file.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join("config.toml")
    }

    /// Load configuration from the default location and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load configuration from a specific file (which may be absent) and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_layered(path.as_ref(), config::Environment::with_prefix(ENV_PREFIX))
    }

    fn load_layered(path: &Path, environment: config::Environment) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(environment)
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        let config: AppConfig = settings
            .try_deserialize()
            .context("failed to parse configuration")?;
        config.validated()
    }

    /// Salary as a money amount.
    pub fn salary(&self) -> Money {
        Money::from_euros(self.salary)
    }

    /// Base URL with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    fn validated(self) -> Result<Self> {
        if self.salary <= 0 {
            bail!("salary must be positive, got {}", self.salary);
        }
        if Money::try_from_euros(self.salary).is_none() {
            bail!("salary of {} euros is too large", self.salary);
        }
        if self.base_url().is_empty() {
            bail!("api_base_url must not be empty");
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.toml"))?;
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.salary(), Money::from_euros(100));
        assert_eq!(config.image_extensions, vec![".png", ".jpg", ".jpeg"]);
        Ok(())
    }

    #[test]
    fn file_overrides_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_base_url = \"http://localhost:8080/\"\nsalary = 250\n",
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.base_url(), "http://localhost:8080");
        assert_eq!(config.salary(), Money::from_euros(250));
        assert_eq!(config.image_extensions.len(), 3);
        Ok(())
    }

    #[test]
    fn rejects_non_positive_salary() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "salary = 0\n")?;

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("salary"));
        Ok(())
    }

    #[test]
    fn rejects_salary_too_large_for_cents() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "salary = 100000000000000000\n")?;

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("salary"));
        Ok(())
    }

    #[test]
    fn rejects_empty_api_base_url() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_base_url = \"/\"\n")?;

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("api_base_url"));
        Ok(())
    }

    #[test]
    fn environment_overrides_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "api_base_url = \"http://localhost:8080\"\nsalary = 250\n",
        )?;

        // A fixed map stands in for the process environment.
        let vars: config::Map<String, String> = [
            ("KOMPUTER_SALARY", "75"),
            ("KOMPUTER_API_BASE_URL", "http://staging.test/"),
            ("UNRELATED_SALARY", "1"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
        let environment = config::Environment::with_prefix(ENV_PREFIX).source(Some(vars));

        let config = AppConfig::load_layered(&path, environment)?;
        assert_eq!(config.salary(), Money::from_euros(75));
        assert_eq!(config.base_url(), "http://staging.test");
        Ok(())
    }
}
