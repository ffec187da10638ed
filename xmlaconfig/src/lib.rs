//! Configuration persistante du client XML/A
//!
//! Les réglages vivent dans `config.yaml`, sous un répertoire `.xmla`.
//! Au chargement, les valeurs par défaut embarquées (`xmla.yaml`) sont
//! recouvertes par le fichier puis par les variables
//! `XMLA_CONFIG__SECTION__KEY`. Les clés sont insensibles à la casse.
//!
//! ```no_run
//! let config = xmlaconfig::get_config();
//! config.set_log_soap_messages(true)?;
//! let url = config.get_string(&["xmla", "url"]);
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{Result, anyhow};
use dirs::home_dir;
use lazy_static::lazy_static;
use serde_yaml::{Mapping, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::info;

pub mod encryption;

const DEFAULT_CONFIG: &str = include_str!("xmla.yaml");

lazy_static! {
    static ref CONFIG: Arc<Config> =
        Arc::new(Config::load_config("").expect("Failed to load XML/A configuration"));
}

const ENV_CONFIG_DIR: &str = "XMLA_CONFIG";
const ENV_PREFIX: &str = "XMLA_CONFIG__";
const CONFIG_DIR_NAME: &str = ".xmla";

const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_SOAP_MESSAGES: bool = false;

/// Accesseurs booléens avec valeur de repli
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Result<bool> {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => Ok(b),
                _ => Ok($default),
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Arbre YAML de configuration, adossé à `<config_dir>/config.yaml`
///
/// Chaque modification passe par [`Config::set_value`] et réécrit le
/// fichier. Les réglages de connexion (`xmla.*`) sont lus par les crates
/// clientes via leurs propres traits d'extension.
#[derive(Debug)]
pub struct Config {
    config_dir: String,
    path: String,
    data: Mutex<Value>,
}

impl Clone for Config {
    fn clone(&self) -> Self {
        let data = self
            .data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        Self {
            config_dir: self.config_dir.clone(),
            path: self.path.clone(),
            data: Mutex::new(data),
        }
    }
}

impl Config {
    /// Candidate directories, in lookup order
    fn candidate_dirs(directory: &str) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if !directory.is_empty() {
            candidates.push(PathBuf::from(directory));
        }
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Config directory from env");
            candidates.push(PathBuf::from(env_path));
        }
        candidates.push(PathBuf::from(CONFIG_DIR_NAME));
        if let Some(home) = home_dir() {
            candidates.push(home.join(CONFIG_DIR_NAME));
        }
        candidates
    }

    /// Picks the configuration directory
    ///
    /// An explicit `directory` or `XMLA_CONFIG` wins; otherwise the first
    /// existing `.xmla` (current directory, then home). Falls back to
    /// `./.xmla`, which is created.
    fn find_config_dir(directory: &str) -> PathBuf {
        let candidates = Self::candidate_dirs(directory);
        let explicit = !directory.is_empty() || env::var_os(ENV_CONFIG_DIR).is_some();
        if explicit {
            return candidates[0].clone();
        }
        candidates
            .iter()
            .find(|dir| dir.exists())
            .cloned()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR_NAME))
    }

    /// Creates `path` if needed and checks it is a writable directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }
        let probe = path.join(".write_test");
        fs::write(&probe, b"")?;
        fs::remove_file(&probe)?;
        Ok(())
    }

    /// Resolved configuration directory, created when missing
    ///
    /// Lookup order: `directory` if not empty, the `XMLA_CONFIG`
    /// environment variable, `./.xmla`, `~/.xmla`.
    pub fn config_dir(directory: &str) -> Result<String> {
        let dir = Self::find_config_dir(directory);
        Self::validate_config_dir(&dir)?;
        Ok(dir.to_string_lossy().into_owned())
    }

    /// Loads the configuration from `directory` (empty for the default lookup)
    ///
    /// The embedded defaults are overlaid with `config.yaml` when present,
    /// keys are lower-cased, `XMLA_CONFIG__SECTION__KEY` variables are
    /// applied, and the result is written back to `config.yaml`.
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        let path = Path::new(&config_dir)
            .join("config.yaml")
            .to_string_lossy()
            .into_owned();
        info!(config_file = %path, "Loading XML/A configuration");

        let mut value = lower_keys(serde_yaml::from_str(DEFAULT_CONFIG)?);
        match fs::read_to_string(&path) {
            Ok(text) => {
                let external: Value = serde_yaml::from_str(&text)?;
                merge_yaml(&mut value, &lower_keys(external));
            }
            Err(_) => info!(config_file = %path, "No config file, using embedded defaults"),
        }
        Self::apply_env_overrides(&mut value, env::vars());

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(value),
        };
        config.save()?;
        Ok(config)
    }

    /// Directory holding `config.yaml`
    pub fn directory(&self) -> &str {
        &self.config_dir
    }

    fn lock_data(&self) -> Result<MutexGuard<'_, Value>> {
        self.data
            .lock()
            .map_err(|_| anyhow!("Configuration mutex poisoned"))
    }

    /// Writes the whole tree back to `config.yaml`
    pub fn save(&self) -> Result<()> {
        let data = self.lock_data()?;
        let yaml = serde_yaml::to_string(&*data)?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Stores `value` under `path` (e.g. `&["xmla", "url"]`), creating the
    /// intermediate sections, then saves
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        let mut data = self.lock_data()?;
        Self::set_value_internal(&mut data, path, value)?;
        drop(data);
        self.save()?;
        Ok(())
    }

    fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
        let Some((last, parents)) = path.split_last() else {
            *data = value;
            return Ok(());
        };
        let mut current = data;
        for key in parents {
            let Value::Mapping(map) = current else {
                return Err(anyhow!("Cannot set {}: not a mapping", path.join(".")));
            };
            current = map
                .entry(Value::String(key.to_lowercase()))
                .or_insert_with(|| Value::Mapping(Mapping::new()));
        }
        match current {
            Value::Mapping(map) => {
                map.insert(Value::String(last.to_lowercase()), value);
                Ok(())
            }
            _ => Err(anyhow!("Cannot set {}: not a mapping", path.join("."))),
        }
    }

    /// Value under `path`; an error when any key along it is missing
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.lock_data()?;
        Self::get_value_internal(&data, path)
    }

    fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
        path.iter()
            .try_fold(data, |node, key| match node {
                Value::Mapping(map) => map
                    .get(&Value::String(key.to_lowercase()))
                    .ok_or_else(|| anyhow!("Missing configuration key {}", path.join("."))),
                _ => Err(anyhow!("{} does not address a mapping", path.join("."))),
            })
            .cloned()
    }

    /// Gets a non-empty string value, `None` when missing, empty or not a string
    pub fn get_string(&self, path: &[&str]) -> Option<String> {
        match self.get_value(path) {
            Ok(Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// Gets an unsigned integer value, accepting numbers and numeric strings
    pub fn get_u64(&self, path: &[&str]) -> Option<u64> {
        match self.get_value(path) {
            Ok(Value::Number(n)) => n.as_u64(),
            Ok(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn apply_env_overrides(config: &mut Value, vars: impl Iterator<Item = (String, String)>) {
        for (key, value) in vars {
            let Some(stripped) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let key_path: Vec<&str> = stripped.split("__").collect();
            if let Err(err) =
                Self::set_value_internal(config, &key_path, Self::convert_env_value(&value))
            {
                tracing::warn!(env_var = %key, error = %err, "Ignoring configuration override");
            }
        }
    }

    /// `"5"` devient un nombre, `"true"` un booléen ; le reste reste texte
    fn convert_env_value(value: &str) -> Value {
        serde_yaml::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()))
    }

    impl_bool_config!(
        get_log_soap_messages,
        set_log_soap_messages,
        &["logger", "soap_messages"],
        DEFAULT_LOG_SOAP_MESSAGES
    );

    /// Niveau de log minimum (`logger.min_level`), `INFO` par défaut
    pub fn get_log_min_level(&self) -> Result<String> {
        match self.get_value(&["logger", "min_level"]) {
            Ok(Value::String(s)) => Ok(s),
            _ => Ok(DEFAULT_LOG_MIN_LEVEL.to_string()),
        }
    }

    pub fn set_log_min_level(&self, level: String) -> Result<()> {
        self.set_value(&["logger", "min_level"], Value::String(level))
    }
}

/// Configuration partagée du processus, chargée au premier appel
pub fn get_config() -> Arc<Config> {
    CONFIG.clone()
}

/// Overlays `external` onto `base`: mappings merge key by key, anything
/// else is replaced.
fn merge_yaml(base: &mut Value, external: &Value) {
    if let (Value::Mapping(base_map), Value::Mapping(external_map)) = (&mut *base, external) {
        for (key, value) in external_map {
            match base_map.get_mut(key) {
                Some(existing) => merge_yaml(existing, value),
                None => {
                    base_map.insert(key.clone(), value.clone());
                }
            }
        }
        return;
    }
    *base = external.clone();
}

/// Lower-cases every string key, recursively
fn lower_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(key, value)| {
                    let key = match key {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (key, lower_keys(value))
                })
                .collect(),
        ),
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys).collect()),
        other => other,
    }
}
