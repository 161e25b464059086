//! Configuration layering, file discovery, and environment overrides

use std::collections::HashMap;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use gemsync_core::error::SyncError;

use crate::toml::{load_from_file, validate_config, SyncConfig};
use crate::ConfigResult;

/// File searched for when no explicit path is given
pub const CONFIG_FILE_NAME: &str = "gemsync.toml";

/// Environment variables understood as overrides, and the key each one sets
const ENV_KEYS: &[(&str, &str)] = &[
    ("GEMSYNC_SOURCE_URL", "source.base_url"),
    ("GEMSYNC_SINK_URL", "sink.base_url"),
    ("GEMSYNC_API_KEY", "sink.api_key"),
    ("GEMSYNC_CONCURRENCY", "pool.concurrency"),
    ("GEMSYNC_MAX_ATTEMPTS", "retry.max_attempts"),
    ("GEMSYNC_INITIAL_DELAY_MS", "retry.initial_delay_ms"),
    ("GEMSYNC_MAX_DELAY_MS", "retry.max_delay_ms"),
    ("GEMSYNC_BACKOFF_MULTIPLIER", "retry.multiplier"),
    ("GEMSYNC_TIMEOUT_SECS", "http.timeout_secs"),
];

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
}

/// Configuration layering and merging
pub struct ConfigLayering;

/// Where the file layer of the configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// No file found; built-in defaults
    Defaults,
    /// Parsed from this file
    File(Utf8PathBuf),
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self { cwd }
    }

    /// Load the file layer. An explicit path must exist; otherwise `gemsync.toml` is
    /// looked up from the working directory upwards, falling back to defaults.
    pub async fn load(
        &self,
        explicit: Option<&Utf8Path>,
    ) -> ConfigResult<(SyncConfig, ConfigSource)> {
        if let Some(path) = explicit {
            let path = self.cwd.join(path);
            let config = load_from_file(&path).await?;
            return Ok((config, ConfigSource::File(path)));
        }

        match self.resolve_config_path(CONFIG_FILE_NAME) {
            Some(path) => {
                let config = load_from_file(&path).await?;
                Ok((config, ConfigSource::File(path)))
            }
            None => Ok((SyncConfig::default(), ConfigSource::Defaults)),
        }
    }

    /// Find a configuration file in the working directory or one of its parents
    pub fn resolve_config_path(&self, filename: &str) -> Option<Utf8PathBuf> {
        let mut current = Some(self.cwd.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(filename);
            if config_path.is_file() {
                return Some(config_path);
            }
            current = dir.parent();
        }

        None
    }
}

impl ConfigLayering {
    /// Apply environment overrides, then CLI overrides (highest priority), then validate
    pub fn merge_configs(
        file_config: SyncConfig,
        env_overrides: HashMap<String, String>,
        cli_overrides: HashMap<String, String>,
    ) -> ConfigResult<SyncConfig> {
        let mut merged = file_config;

        Self::apply_env_overrides(&mut merged, &env_overrides)?;
        Self::apply_cli_overrides(&mut merged, &cli_overrides)?;

        validate_config(&merged)?;

        Ok(merged)
    }

    /// Apply `GEMSYNC_*` variables. Unknown variables are ignored.
    fn apply_env_overrides(
        config: &mut SyncConfig,
        overrides: &HashMap<String, String>,
    ) -> ConfigResult<()> {
        for (var, key) in ENV_KEYS {
            if let Some(value) = overrides.get(*var) {
                apply_override(config, key, value, var)?;
            }
        }
        Ok(())
    }

    /// Apply dotted-key overrides such as `pool.concurrency`
    fn apply_cli_overrides(
        config: &mut SyncConfig,
        overrides: &HashMap<String, String>,
    ) -> ConfigResult<()> {
        // Sorted so the first reported error is deterministic
        let mut keys: Vec<_> = overrides.keys().collect();
        keys.sort();

        for key in keys {
            apply_override(config, key, &overrides[key], key)?;
        }
        Ok(())
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with("GEMSYNC_"))
            .collect()
    }
}

/// Set one dotted key. `origin` names the variable or flag in error messages.
fn apply_override(
    config: &mut SyncConfig,
    key: &str,
    value: &str,
    origin: &str,
) -> ConfigResult<()> {
    match key {
        "source.base_url" => config.source.base_url = value.to_string(),
        "sink.base_url" => config.sink.base_url = Some(value.to_string()),
        "sink.api_key" => config.sink.api_key = Some(value.to_string()),
        "pool.concurrency" => config.pool.concurrency = parse_value(origin, value)?,
        "retry.max_attempts" => config.retry.max_attempts = parse_value(origin, value)?,
        "retry.initial_delay_ms" => config.retry.initial_delay_ms = parse_value(origin, value)?,
        "retry.max_delay_ms" => config.retry.max_delay_ms = parse_value(origin, value)?,
        "retry.multiplier" => config.retry.multiplier = parse_value(origin, value)?,
        "http.timeout_secs" => config.http.timeout_secs = parse_value(origin, value)?,
        "http.user_agent" => config.http.user_agent = Some(value.to_string()),
        _ => {
            return Err(SyncError::ConfigValidation {
                field: origin.to_string(),
                reason: format!("unknown configuration key '{}'", key),
            })
        }
    }
    Ok(())
}

fn parse_value<T>(origin: &str, value: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| SyncError::ConfigValidation {
        field: origin.to_string(),
        reason: format!("invalid value '{}': {}", value, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap()
    }

    #[tokio::test]
    async fn test_load_without_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(utf8_dir(&temp_dir));

        // Only valid when no gemsync.toml exists above the temp dir
        if loader.resolve_config_path(CONFIG_FILE_NAME).is_none() {
            let (config, source) = loader.load(None).await.unwrap();
            assert_eq!(config, SyncConfig::default());
            assert_eq!(source, ConfigSource::Defaults);
        }
    }

    #[tokio::test]
    async fn test_resolve_config_path_walks_up() {
        let temp_dir = TempDir::new().unwrap();
        let root = utf8_dir(&temp_dir);
        let nested = root.join("a").join("b");
        tokio::fs::create_dir_all(&nested).await.unwrap();
        tokio::fs::write(root.join(CONFIG_FILE_NAME), "[pool]\nconcurrency = 3\n")
            .await
            .unwrap();

        let loader = ConfigLoader::new(nested);
        let (config, source) = loader.load(None).await.unwrap();

        assert_eq!(config.pool.concurrency, 3);
        assert_eq!(source, ConfigSource::File(root.join(CONFIG_FILE_NAME)));
    }

    #[tokio::test]
    async fn test_load_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let root = utf8_dir(&temp_dir);
        tokio::fs::write(root.join("custom.toml"), "[retry]\nmax_attempts = 3\n")
            .await
            .unwrap();

        let loader = ConfigLoader::new(root.clone());
        let (config, source) = loader.load(Some(Utf8Path::new("custom.toml"))).await.unwrap();

        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(source, ConfigSource::File(root.join("custom.toml")));
    }

    #[tokio::test]
    async fn test_load_missing_explicit_path_fails() {
        let temp_dir = TempDir::new().unwrap();
        let loader = ConfigLoader::new(utf8_dir(&temp_dir));

        let err = loader.load(Some(Utf8Path::new("missing.toml"))).await.unwrap_err();
        assert_eq!(err.category(), "io");
    }

    #[test]
    fn test_merge_configs_precedence() {
        let mut file_config = SyncConfig::default();
        file_config.pool.concurrency = 3;
        file_config.retry.max_attempts = 7;

        let env_overrides = HashMap::from([
            ("GEMSYNC_CONCURRENCY".to_string(), "4".to_string()),
            ("GEMSYNC_API_KEY".to_string(), "env-key".to_string()),
            ("UNRELATED".to_string(), "ignored".to_string()),
        ]);
        let cli_overrides = HashMap::from([
            ("pool.concurrency".to_string(), "5".to_string()),
            ("sink.base_url".to_string(), "https://bestgems.org".to_string()),
        ]);

        let merged =
            ConfigLayering::merge_configs(file_config, env_overrides, cli_overrides).unwrap();

        // CLI beats environment beats file
        assert_eq!(merged.pool.concurrency, 5);
        // File value survives when nothing overrides it
        assert_eq!(merged.retry.max_attempts, 7);
        assert_eq!(
            merged.sink_credentials().unwrap(),
            ("https://bestgems.org", "env-key")
        );
    }

    #[test]
    fn test_invalid_env_value_names_variable() {
        let env_overrides = HashMap::from([(
            "GEMSYNC_MAX_ATTEMPTS".to_string(),
            "lots".to_string(),
        )]);

        let err =
            ConfigLayering::merge_configs(SyncConfig::default(), env_overrides, HashMap::new())
                .unwrap_err();

        assert!(matches!(
            err,
            SyncError::ConfigValidation { ref field, .. } if field == "GEMSYNC_MAX_ATTEMPTS"
        ));
    }

    #[test]
    fn test_merged_config_is_validated() {
        let cli_overrides = HashMap::from([("pool.concurrency".to_string(), "0".to_string())]);

        let result =
            ConfigLayering::merge_configs(SyncConfig::default(), HashMap::new(), cli_overrides);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_cli_key_rejected() {
        let cli_overrides = HashMap::from([("pool.size".to_string(), "3".to_string())]);

        let result =
            ConfigLayering::merge_configs(SyncConfig::default(), HashMap::new(), cli_overrides);
        assert!(result.is_err());
    }

    #[test]
    fn test_collect_env_overrides() {
        std::env::set_var("GEMSYNC_TEST_COLLECT", "1");
        std::env::set_var("NOT_GEMSYNC_TEST_COLLECT", "ignored");

        let overrides = ConfigLayering::collect_env_overrides();

        assert!(overrides.contains_key("GEMSYNC_TEST_COLLECT"));
        assert!(!overrides.contains_key("NOT_GEMSYNC_TEST_COLLECT"));

        // Clean up
        std::env::remove_var("GEMSYNC_TEST_COLLECT");
        std::env::remove_var("NOT_GEMSYNC_TEST_COLLECT");
    }
}
