use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use common::crypto::{DerivationContext, KeyPair};
use common::keystore::{KeyStore, KeyStoreConfig};
use common::sealer::Sealer;
use common::SealError;
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "sealcid";
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the key pair lives (defaults to key.pem in the state directory)
    #[serde(default)]
    pub key_store: KeyStoreConfig,
    /// HKDF salt and info; changing either makes old envelopes unreadable
    #[serde(default)]
    pub derivation: DerivationContext,
    /// Default log level when neither --log-level nor RUST_LOG is set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            key_store: KeyStoreConfig::default(),
            derivation: DerivationContext::default(),
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn log_level(&self) -> Result<tracing::Level, StateError> {
        tracing::Level::from_str(&self.log_level)
            .map_err(|_| StateError::InvalidConfig(format!("log_level: {}", self.log_level)))
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the state directory (~/.sealcid)
    pub state_dir: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the state directory path (custom or default ~/.sealcid)
    pub fn state_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new state directory and make sure the key pair exists
    ///
    /// An existing key is reused, so pointing a fresh config at an old key
    /// keeps its envelopes readable.
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<(Self, KeyPair), StateError> {
        let state_dir = Self::state_dir(custom_path)?;
        let config_path = state_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&state_dir)?;

        let config = config.unwrap_or_default();
        config.log_level()?;

        let state = Self {
            state_dir,
            config_path,
            config,
        };
        let pair = state.key_store().get_or_create()?;

        // Written last: a failed key setup leaves the directory uninitialized
        let config_toml = toml::to_string_pretty(&state.config)?;
        fs::write(&state.config_path, config_toml)?;

        Ok((state, pair))
    }

    /// Load existing state from the state directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let state_dir = Self::state_dir(custom_path)?;
        let config_path = state_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Err(StateError::NotInitialized);
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            state_dir,
            config_path,
            config,
        })
    }

    pub fn key_store(&self) -> Arc<dyn KeyStore> {
        self.config.key_store.build(&self.state_dir)
    }

    /// Human readable key location
    pub fn key_location(&self) -> String {
        self.config.key_store.describe(&self.state_dir)
    }

    pub fn sealer(&self) -> Result<Sealer, StateError> {
        let store = self.key_store();
        Ok(Sealer::from_key_store(
            store.as_ref(),
            &self.config.derivation,
        )?)
    }
}

/// Log level from the config file, if there is a readable one
pub fn configured_log_level(custom_path: Option<PathBuf>) -> Option<tracing::Level> {
    AppState::load(custom_path).ok()?.config.log_level().ok()
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("sealcid directory not initialized. Run 'sealcid init' first")]
    NotInitialized,

    #[error("sealcid directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Seal(#[from] SealError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn state_path(temp: &TempDir) -> Option<PathBuf> {
        Some(temp.path().join("state"))
    }

    #[test]
    fn test_init_then_load() {
        let temp = TempDir::new().unwrap();
        let (state, pair) = AppState::init(state_path(&temp), None).unwrap();

        assert!(state.config_path.exists());
        assert!(state.state_dir.join("key.pem").exists());

        let loaded = AppState::load(state_path(&temp)).unwrap();
        assert_eq!(loaded.config, AppConfig::default());
        assert_eq!(
            loaded.key_store().get_or_create().unwrap().fingerprint(),
            pair.fingerprint()
        );
    }

    #[test]
    fn test_init_twice() {
        let temp = TempDir::new().unwrap();
        AppState::init(state_path(&temp), None).unwrap();
        assert!(matches!(
            AppState::init(state_path(&temp), None),
            Err(StateError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_load_uninitialized() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            AppState::load(state_path(&temp)),
            Err(StateError::NotInitialized)
        ));
    }

    #[test]
    fn test_config_defaults_from_empty_file() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.log_level().unwrap(), tracing::Level::INFO);
        assert_eq!(config.derivation.salt, common::crypto::DEFAULT_SALT);
    }

    #[test]
    fn test_config_toml_shape() {
        let config: AppConfig = toml::from_str(
            r#"
            log_level = "debug"

            [key_store]
            type = "env"
            var = "SEALCID_KEY"

            [derivation]
            salt = "legacy-salt"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.key_store,
            KeyStoreConfig::Env {
                var: "SEALCID_KEY".into()
            }
        );
        assert_eq!(config.derivation.salt, "legacy-salt");
        assert_eq!(config.derivation.info, common::crypto::DEFAULT_INFO);
        assert_eq!(config.log_level().unwrap(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_invalid_log_level_rejected_on_init() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig {
            log_level: "loud".into(),
            ..AppConfig::default()
        };
        assert!(matches!(
            AppState::init(state_path(&temp), Some(config)),
            Err(StateError::InvalidConfig(_))
        ));
        assert!(configured_log_level(state_path(&temp)).is_none());
    }

    #[test]
    fn test_env_key_store_failure_leaves_dir_uninitialized() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig {
            key_store: KeyStoreConfig::Env {
                var: "SEALCID_TEST_STATE_MISSING_KEY".into(),
            },
            ..AppConfig::default()
        };

        assert!(matches!(
            AppState::init(state_path(&temp), Some(config)),
            Err(StateError::Seal(SealError::KeyStorage(_)))
        ));
        assert!(matches!(
            AppState::load(state_path(&temp)),
            Err(StateError::NotInitialized)
        ));
    }
}
