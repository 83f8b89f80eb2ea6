//! Configuration Loader
//!
//! Environment-aware loading of [`CacheConfig`]. Sources, lowest precedence first:
//!
//! 1. `{root}/base.toml` (required)
//! 2. `{root}/environments/{environment}.toml` (optional overlay)
//! 3. `CACHE__*` environment variables, `__` separating nested keys
//!    (`CACHE__REDIS__URL`, `CACHE__DEFAULT_TTL_SECONDS`)
//!
//! The root defaults to `config/cache`, or `CACHE_CONFIG_ROOT` when set.

use super::error::{ConfigResult, ConfigurationError};
use super::CacheConfig;
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const ENV_PREFIX: &str = "CACHE";
const ENV_SEPARATOR: &str = "__";

/// Loads and validates cache configuration for one environment
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Directory containing base.toml and environments/
    root: PathBuf,
    /// Current environment (development, test, production, etc.)
    environment: String,
    /// Replaces the process environment as the override source
    env_source: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// Create a loader rooted at `CACHE_CONFIG_ROOT` or `config/cache`
    pub fn new(environment: &str) -> ConfigResult<Self> {
        let root = env::var("CACHE_CONFIG_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config").join("cache"));

        debug!(root = %root.display(), "Using cache config root");
        Self::with_root(root, environment)
    }

    /// Create a loader with environment auto-detection
    pub fn new_from_env() -> ConfigResult<Self> {
        Self::new(&Self::detect_environment())
    }

    /// Create a loader with an explicit root directory
    pub fn with_root(root: impl Into<PathBuf>, environment: &str) -> ConfigResult<Self> {
        let root = root.into();
        let base = root.join("base.toml");
        if !base.is_file() {
            return Err(ConfigurationError::config_file_not_found(vec![base]));
        }

        Ok(Self {
            root,
            environment: environment.to_lowercase(),
            env_source: None,
        })
    }

    /// Use `vars` instead of the process environment for `CACHE__*` overrides
    pub fn with_env_source(mut self, vars: HashMap<String, String>) -> Self {
        self.env_source = Some(vars);
        self
    }

    /// Detect the current environment from `CACHE_ENV`, then `APP_ENV`
    pub fn detect_environment() -> String {
        env::var("CACHE_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the overlay file for the current environment
    pub fn environment_file(&self) -> PathBuf {
        self.root
            .join("environments")
            .join(format!("{}.toml", self.environment))
    }

    /// Environments that have an overlay file
    pub fn available_environments(&self) -> Vec<String> {
        let mut environments: Vec<String> = std::fs::read_dir(self.root.join("environments"))
            .map(|entries| {
                entries
                    .filter_map(Result::ok)
                    .map(|entry| entry.path())
                    .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
                    .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        environments.sort();
        environments
    }

    /// Load, merge and validate the configuration
    pub fn load(&self) -> ConfigResult<CacheConfig> {
        let mut env_overrides = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true);
        if let Some(vars) = &self.env_source {
            env_overrides = env_overrides.source(Some(vars.clone()));
        }

        let settings = Config::builder()
            .add_source(File::from(self.root.join("base.toml")).format(FileFormat::Toml))
            .add_source(
                File::from(self.environment_file())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(env_overrides)
            .build()
            .map_err(|e| ConfigurationError::load_error(&self.environment, e))?;

        let config: CacheConfig = settings
            .try_deserialize()
            .map_err(|e| ConfigurationError::load_error(&self.environment, e))?;

        config.validate()?;

        debug!(
            config = %config.sanitized(),
            "Cache configuration loaded"
        );
        info!(
            environment = %self.environment,
            backend = %config.backend,
            key_prefix = %config.key_prefix,
            default_ttl_seconds = config.default_ttl_seconds,
            "Configuration loaded successfully"
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const BASE: &str = r#"
enabled = true
backend = "redis"
key_prefix = "app:"
default_ttl_seconds = 60

[redis]
url = "redis://localhost:6379"

[circuit_breaker]
failure_threshold = 3
recovery_timeout_ms = 30000
"#;

    fn config_root(base: &str, overlays: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("base.toml"), base).unwrap();
        fs::create_dir_all(dir.path().join("environments")).unwrap();
        for (env, contents) in overlays {
            fs::write(
                dir.path().join("environments").join(format!("{env}.toml")),
                contents,
            )
            .unwrap();
        }
        dir
    }

    #[test]
    fn test_missing_base_file() {
        let dir = TempDir::new().unwrap();
        let result = ConfigLoader::with_root(dir.path(), "test");
        assert!(matches!(
            result,
            Err(ConfigurationError::ConfigFileNotFound { .. })
        ));
    }

    #[test]
    fn test_loads_base_only() {
        let dir = config_root(BASE, &[]);
        let config = ConfigLoader::with_root(dir.path(), "test")
            .unwrap()
            .with_env_source(HashMap::new())
            .load()
            .unwrap();

        assert_eq!(config.key_prefix, "app:");
        assert_eq!(config.default_ttl_seconds, 60);
        assert_eq!(config.redis.url, "redis://localhost:6379");
        assert_eq!(config.circuit_breaker.failure_threshold, 3);
    }

    #[test]
    fn test_environment_overlay_wins_over_base() {
        let dir = config_root(
            BASE,
            &[(
                "production",
                "default_ttl_seconds = 300\n[circuit_breaker]\nfailure_threshold = 5\n",
            )],
        );
        let config = ConfigLoader::with_root(dir.path(), "production")
            .unwrap()
            .with_env_source(HashMap::new())
            .load()
            .unwrap();

        assert_eq!(config.default_ttl_seconds, 300);
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        // Untouched keys keep base values
        assert_eq!(config.key_prefix, "app:");
        assert_eq!(config.circuit_breaker.recovery_timeout_ms, 30_000);
    }

    #[test]
    fn test_env_vars_override_files() {
        let dir = config_root(BASE, &[]);
        let vars = HashMap::from([
            ("CACHE__KEY_PREFIX".to_string(), "svc:".to_string()),
            (
                "CACHE__REDIS__URL".to_string(),
                "redis://cache.internal:6380".to_string(),
            ),
        ]);
        let config = ConfigLoader::with_root(dir.path(), "test")
            .unwrap()
            .with_env_source(vars)
            .load()
            .unwrap();

        assert_eq!(config.key_prefix, "svc:");
        assert_eq!(config.redis.url, "redis://cache.internal:6380");
    }

    #[test]
    fn test_invalid_config_fails_validation() {
        let dir = config_root("backend = \"etcd\"\n", &[]);
        let result = ConfigLoader::with_root(dir.path(), "test")
            .unwrap()
            .with_env_source(HashMap::new())
            .load();
        assert!(matches!(
            result,
            Err(ConfigurationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_malformed_toml_is_load_error() {
        let dir = config_root("enabled = [unterminated\n", &[]);
        let result = ConfigLoader::with_root(dir.path(), "test")
            .unwrap()
            .with_env_source(HashMap::new())
            .load();
        assert!(matches!(result, Err(ConfigurationError::LoadError { .. })));
    }

    #[test]
    fn test_available_environments_sorted() {
        let dir = config_root(BASE, &[("test", ""), ("production", ""), ("development", "")]);
        let loader = ConfigLoader::with_root(dir.path(), "Test").unwrap();

        assert_eq!(loader.environment(), "test");
        assert_eq!(
            loader.available_environments(),
            vec!["development", "production", "test"]
        );
    }
}
