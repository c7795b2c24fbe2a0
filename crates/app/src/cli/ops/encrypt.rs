use clap::Args;
use common::envelope::{decode, EnvelopeMap};
use common::integrity::{self, IntegrityDigest};
use common::store::ContentIdentifier;
use common::SealError;
use serde::Serialize;

use crate::cli::input::{InputArgs, InputError};
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Encrypt {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, thiserror::Error)]
pub enum EncryptError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("encrypt failed: {0}")]
    Seal(#[from] SealError),

    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Everything a caller needs to keep: the envelope to store, the digest to
/// record somewhere trusted, and the content identifier
#[derive(Debug, Serialize)]
pub struct EncryptOutput {
    pub envelope: EnvelopeMap,
    pub digest: IntegrityDigest,
    pub cid: ContentIdentifier,
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Encrypt {
    type Error = EncryptError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let record = self.input.read_record()?;
        let sealer = ctx.sealer()?;

        let sealed = sealer.encrypt_record(&record)?;
        let output = EncryptOutput {
            cid: integrity::content_identifier(&decode(&sealed.envelope)?)?,
            digest: sealed.digest,
            envelope: sealed.envelope,
        };

        tracing::info!(cid = %output.cid, digest = %output.digest, "sealed record");
        Ok(serde_json::to_string_pretty(&output)?)
    }
}
