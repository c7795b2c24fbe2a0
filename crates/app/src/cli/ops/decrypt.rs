use clap::Args;
use common::SealError;

use crate::cli::input::{InputArgs, InputError};
use crate::state::StateError;

/// Open an envelope (bare, or the full output of `encrypt`)
#[derive(Args, Debug, Clone)]
pub struct Decrypt {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, thiserror::Error)]
pub enum DecryptError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("decrypt failed: {0}")]
    Seal(#[from] SealError),

    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Decrypt {
    type Error = DecryptError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let envelope = self.input.read_envelope()?;
        let record = ctx.sealer()?.decrypt_envelope(&envelope)?;
        Ok(serde_json::to_string_pretty(&record)?)
    }
}
