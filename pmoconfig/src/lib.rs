//! # pmoconfig
//!
//! YAML configuration of the WCBN player.
//!
//! The configuration is a YAML tree built from three layers, later layers
//! winning:
//!
//! 1. the defaults embedded in the binary (`wcbn.yaml`),
//! 2. `config.yaml` in the configuration directory,
//! 3. `WCBN_CONFIG__SECTION__KEY=value` environment variables.
//!
//! The merged tree is written back to `config.yaml` on load and after every
//! change, so the file always shows the settings in effect. Keys are case
//! insensitive (stored lowercase).
//!
//! Settings of a given source (stream quality, artwork, refresh delay) are
//! added by extension traits in the crate owning that source.
//!
//! ```no_run
//! use pmoconfig::get_config;
//!
//! let config = get_config();
//! let level = config.get_log_min_level()?;
//! let art_dir = config.get_managed_dir(&["host", "artwork", "directory"], "artwork")?;
//! println!("Logging at {}, artwork in {}", level, art_dir.display());
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, bail, Result};
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Number, Value};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const DEFAULT_CONFIG: &str = include_str!("wcbn.yaml");

const ENV_CONFIG_DIR: &str = "WCBN_CONFIG";
const ENV_PREFIX: &str = "WCBN_CONFIG__";
const CONFIG_DIR_NAME: &str = ".wcbn";
const CONFIG_FILE_NAME: &str = "config.yaml";

const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

const HTTP_TIMEOUT: [&str; 3] = ["host", "http", "timeout_secs"];
const LOG_MIN_LEVEL: [&str; 3] = ["host", "logger", "min_level"];
const LOG_ENABLE_CONSOLE: [&str; 3] = ["host", "logger", "enable_console"];

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load WCBN player configuration"));
}

/// Returns the global configuration, loading it on first use
///
/// # Panics
///
/// On first use, if the configuration directory cannot be created or the
/// embedded defaults do not parse.
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Configuration tree backed by `config.yaml`
#[derive(Debug)]
pub struct Config {
    directory: PathBuf,
    file: PathBuf,
    data: Mutex<Value>,
}

impl Config {
    /// Load the configuration from `directory`
    ///
    /// An empty `directory` is resolved, in order, from the `WCBN_CONFIG`
    /// environment variable, `./.wcbn` and `~/.wcbn`. When none of them
    /// exists `./.wcbn` is created.
    pub fn load_config(directory: &str) -> Result<Self> {
        let directory = locate_directory(directory);
        prepare_directory(&directory)?;
        info!(config_dir = %directory.display(), "Using config directory");

        let file = directory.join(CONFIG_FILE_NAME);
        let mut tree = lowercase_keys(serde_yaml::from_str(DEFAULT_CONFIG)?);

        match fs::read_to_string(&file) {
            Ok(text) => {
                info!(config_file = %file.display(), "Loaded config file");
                let user: Value = serde_yaml::from_str(&text)?;
                merge_yaml(&mut tree, &lowercase_keys(user));
            }
            Err(_) => {
                info!(config_file = %file.display(), "No config file yet, using defaults");
            }
        }

        apply_env_overrides(&mut tree);

        let config = Config {
            directory,
            file,
            data: Mutex::new(tree),
        };
        config.save()?;
        Ok(config)
    }

    /// Directory holding `config.yaml`
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Write the tree to `config.yaml`
    pub fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&*self.lock_data())?;
        fs::write(&self.file, yaml)?;
        Ok(())
    }

    /// Set the value at `path` and save
    ///
    /// Missing intermediate maps are created; a `null` node on the way is
    /// replaced by a map.
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        insert_at(&mut self.lock_data(), path, value)?;
        self.save()
    }

    /// Value at `path`
    ///
    /// # Errors
    ///
    /// When a key of `path` is missing or crosses a non-map node.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.lock_data();
        let mut node = &*data;
        for (depth, key) in path.iter().enumerate() {
            let Value::Mapping(map) = node else {
                bail!("{} is not a section", path[..depth].join("."));
            };
            node = map
                .get(Value::String(key.to_lowercase()))
                .ok_or_else(|| anyhow!("{} is not set", path[..=depth].join(".")))?;
        }
        Ok(node.clone())
    }

    /// Directory configured at `path`, created if needed
    ///
    /// Relative directories are taken from the configuration directory. When
    /// nothing is configured `default` is stored and used.
    pub fn get_managed_dir(&self, path: &[&str], default: &str) -> Result<PathBuf> {
        let configured = match self.get_value(path) {
            Ok(Value::String(dir)) if !dir.trim().is_empty() => dir,
            _ => {
                self.set_value(path, Value::String(default.to_string()))?;
                default.to_string()
            }
        };

        let dir = Path::new(&configured);
        let dir = if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.directory.join(dir)
        };

        if !dir.is_dir() {
            fs::create_dir_all(&dir)?;
            info!(directory = %dir.display(), "Created managed directory");
        }
        Ok(dir)
    }

    // ========================================================================
    // Host settings
    // ========================================================================

    /// Timeout of outgoing HTTP requests in seconds (default: 30)
    pub fn get_http_timeout_secs(&self) -> Result<u64> {
        match self.get_value(&HTTP_TIMEOUT) {
            Ok(Value::Number(n)) if n.as_u64().is_some_and(|secs| secs > 0) => {
                Ok(n.as_u64().unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
            }
            _ => {
                self.set_http_timeout_secs(DEFAULT_HTTP_TIMEOUT_SECS)?;
                Ok(DEFAULT_HTTP_TIMEOUT_SECS)
            }
        }
    }

    pub fn set_http_timeout_secs(&self, secs: u64) -> Result<()> {
        self.set_value(&HTTP_TIMEOUT, Value::Number(Number::from(secs)))
    }

    /// Whether logs go to the console (default: true)
    pub fn get_log_enable_console(&self) -> Result<bool> {
        match self.get_value(&LOG_ENABLE_CONSOLE) {
            Ok(Value::Bool(enabled)) => Ok(enabled),
            _ => {
                self.set_log_enable_console(DEFAULT_LOG_ENABLE_CONSOLE)?;
                Ok(DEFAULT_LOG_ENABLE_CONSOLE)
            }
        }
    }

    pub fn set_log_enable_console(&self, enabled: bool) -> Result<()> {
        self.set_value(&LOG_ENABLE_CONSOLE, Value::Bool(enabled))
    }

    /// Minimum log level, as a `tracing` filter directive (default: INFO)
    pub fn get_log_min_level(&self) -> Result<String> {
        match self.get_value(&LOG_MIN_LEVEL) {
            Ok(Value::String(level)) if !level.trim().is_empty() => Ok(level),
            _ => {
                self.set_log_min_level(DEFAULT_LOG_MIN_LEVEL)?;
                Ok(DEFAULT_LOG_MIN_LEVEL.to_string())
            }
        }
    }

    pub fn set_log_min_level(&self, level: &str) -> Result<()> {
        self.set_value(&LOG_MIN_LEVEL, Value::String(level.to_string()))
    }

    fn lock_data(&self) -> MutexGuard<'_, Value> {
        // Writes are single inserts, so a poisoned tree is still whole
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn locate_directory(directory: &str) -> PathBuf {
    if !directory.is_empty() {
        return PathBuf::from(directory);
    }

    if let Ok(dir) = env::var(ENV_CONFIG_DIR) {
        debug!(env_var = ENV_CONFIG_DIR, path = %dir, "Config directory from environment");
        return PathBuf::from(dir);
    }

    let local = PathBuf::from(CONFIG_DIR_NAME);
    if local.is_dir() {
        return local;
    }

    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .filter(|dir| dir.is_dir())
        .unwrap_or(local)
}

/// Create `dir` if needed and check it is a writable directory
fn prepare_directory(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    if !dir.is_dir() {
        bail!("Configuration path {} is not a directory", dir.display());
    }

    let probe = dir.join(".write_test");
    fs::write(&probe, b"")?;
    fs::remove_file(&probe)?;
    Ok(())
}

fn insert_at(node: &mut Value, path: &[&str], value: Value) -> Result<()> {
    let Some((first, rest)) = path.split_first() else {
        *node = value;
        return Ok(());
    };

    if node.is_null() {
        *node = Value::Mapping(Mapping::new());
    }
    let Value::Mapping(map) = node else {
        bail!("Cannot set {}: parent is not a section", path.join("."));
    };

    let key = Value::String(first.to_lowercase());
    if rest.is_empty() {
        map.insert(key, value);
        Ok(())
    } else {
        let child = map.entry(key).or_insert(Value::Mapping(Mapping::new()));
        insert_at(child, rest, value)
    }
}

/// Apply `WCBN_CONFIG__A__B=value` variables; values are parsed as YAML
fn apply_env_overrides(tree: &mut Value) {
    for (name, raw) in env::vars() {
        let Some(key) = name.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let path: Vec<&str> = key.split("__").collect();
        let value = serde_yaml::from_str(&raw).unwrap_or(Value::String(raw.clone()));
        if let Err(e) = insert_at(tree, &path, value) {
            debug!(variable = %name, "Ignoring config override: {}", e);
        }
    }
}

fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(k, v)| {
                    let k = match k {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (k, lowercase_keys(v))
                })
                .collect(),
        ),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

/// Merge `overlay` into `base`: maps merge key by key, anything else replaces
fn merge_yaml(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        (dir, config)
    }

    #[test]
    fn test_load_writes_config_file() {
        let (dir, config) = temp_config();
        assert!(dir.path().join("config.yaml").exists());
        assert_eq!(config.directory(), dir.path());
    }

    #[test]
    fn test_defaults_from_embedded_yaml() {
        let (_dir, config) = temp_config();
        assert_eq!(config.get_log_min_level().unwrap(), "INFO");
        assert!(config.get_log_enable_console().unwrap());
        assert_eq!(config.get_http_timeout_secs().unwrap(), 30);
    }

    #[test]
    fn test_user_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yaml"),
            "Host:\n  HTTP:\n    timeout_secs: 5\n",
        )
        .unwrap();

        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(config.get_http_timeout_secs().unwrap(), 5);
        // Untouched defaults survive the merge
        assert_eq!(config.get_log_min_level().unwrap(), "INFO");
    }

    #[test]
    fn test_set_value_survives_reload() {
        let (dir, config) = temp_config();
        config
            .set_value(&["Sources", "WCBN", "Quality"], Value::String("hd".into()))
            .unwrap();
        assert_eq!(
            config.get_value(&["sources", "wcbn", "quality"]).unwrap(),
            Value::String("hd".into())
        );

        let reloaded = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(
            reloaded.get_value(&["sources", "wcbn", "quality"]).unwrap(),
            Value::String("hd".into())
        );
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let (_dir, config) = temp_config();
        let err = config.get_value(&["nope", "missing"]).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_set_through_null_node() {
        let (_dir, config) = temp_config();
        config.set_value(&["sources", "cache"], Value::Null).unwrap();
        config
            .set_value(&["sources", "cache", "ttl"], Value::Number(5.into()))
            .unwrap();
        assert_eq!(
            config.get_value(&["sources", "cache", "ttl"]).unwrap(),
            Value::Number(5.into())
        );
    }

    #[test]
    fn test_invalid_timeout_falls_back_and_persists() {
        let (_dir, config) = temp_config();
        config
            .set_value(&HTTP_TIMEOUT, Value::String("soon".into()))
            .unwrap();
        assert_eq!(config.get_http_timeout_secs().unwrap(), 30);
        assert_eq!(
            config.get_value(&HTTP_TIMEOUT).unwrap(),
            Value::Number(30.into())
        );
    }

    #[test]
    fn test_managed_dir_is_created_relative_to_config_dir() {
        let (dir, config) = temp_config();
        let art = config
            .get_managed_dir(&["host", "artwork", "directory"], "artwork")
            .unwrap();
        assert!(art.is_dir());
        assert!(art.starts_with(dir.path()));
    }

    #[test]
    fn test_merge_yaml_replaces_scalars_and_merges_maps() {
        let mut base: Value = serde_yaml::from_str("a: 1\nb:\n  c: 2\n  d: 3\n").unwrap();
        let overlay: Value = serde_yaml::from_str("b:\n  c: 20\ne: 5\n").unwrap();
        merge_yaml(&mut base, &overlay);

        let expected: Value = serde_yaml::from_str("a: 1\nb:\n  c: 20\n  d: 3\ne: 5\n").unwrap();
        assert_eq!(base, expected);
    }

    #[test]
    fn test_lowercase_keys_is_recursive() {
        let tree: Value = serde_yaml::from_str("A:\n  B: [ {C: 1} ]\n").unwrap();
        let expected: Value = serde_yaml::from_str("a:\n  b: [ {c: 1} ]\n").unwrap();
        assert_eq!(lowercase_keys(tree), expected);
    }
}
