use clap::Args;
use common::keystore::KeyStoreConfig;

use crate::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone, Default)]
pub struct Init {
    /// Read the key pair from this environment variable instead of a key file
    #[arg(long, conflicts_with = "key_file")]
    pub key_env: Option<String>,

    /// Key file path; relative paths resolve against the state directory
    #[arg(long)]
    pub key_file: Option<std::path::PathBuf>,

    /// HKDF salt to reproduce keys from an earlier installation
    #[arg(long)]
    pub salt: Option<String>,

    /// HKDF info string to reproduce keys from an earlier installation
    #[arg(long)]
    pub info: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
}

impl Init {
    fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        if let Some(var) = &self.key_env {
            config.key_store = KeyStoreConfig::Env { var: var.clone() };
        }
        if let Some(path) = &self.key_file {
            config.key_store = KeyStoreConfig::File { path: path.clone() };
        }
        if let Some(salt) = &self.salt {
            config.derivation.salt = salt.clone();
        }
        if let Some(info) = &self.info {
            config.derivation.info = info.clone();
        }
        config
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let (state, pair) = AppState::init(ctx.config_path.clone(), Some(self.config()))?;

        tracing::info!(
            dir = %state.state_dir.display(),
            fingerprint = %pair.fingerprint(),
            "initialized state directory"
        );

        let output = format!(
            "Initialized sealcid directory at: {}\n\
             - Config: {}\n\
             - Key: {}\n\
             - Key fingerprint: {}",
            state.state_dir.display(),
            state.config_path.display(),
            state.key_location(),
            pair.fingerprint(),
        );

        Ok(output)
    }
}
