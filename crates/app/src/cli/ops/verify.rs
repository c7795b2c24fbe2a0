use clap::Args;
use common::envelope::decode;
use common::integrity::IntegrityDigest;
use common::store::ContentIdentifier;
use common::SealError;

use crate::cli::input::{InputArgs, InputError};
use crate::state::StateError;

/// Check an envelope against a trusted digest and/or content identifier,
/// then open it
#[derive(Args, Debug, Clone)]
pub struct Verify {
    #[command(flatten)]
    pub input: InputArgs,

    /// Hex SHA-256 digest recorded when the record was sealed
    #[arg(long, required_unless_present = "cid")]
    pub digest: Option<IntegrityDigest>,

    /// Content identifier the envelope was stored under
    #[arg(long)]
    pub cid: Option<ContentIdentifier>,
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("verify failed: {0}")]
    Seal(#[from] SealError),

    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Verify {
    type Error = VerifyError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let envelope = decode(&self.input.read_envelope()?)?;

        let sealer = ctx.sealer()?;
        sealer.verify_envelope(&envelope, self.digest.as_ref(), self.cid.as_ref())?;
        let record = sealer.open(&envelope)?;
        Ok(serde_json::to_string_pretty(&record)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::op::{Op, OpContext};
    use crate::cli::ops::{testkit, Encrypt};

    async fn sealed(ctx: &OpContext, json: &str) -> serde_json::Value {
        let output = Encrypt {
            input: testkit::data(json),
        }
        .execute(ctx)
        .await
        .unwrap();
        serde_json::from_str(&output).unwrap()
    }

    fn verify_op(envelope: &serde_json::Value, digest: Option<&str>, cid: Option<&str>) -> Verify {
        Verify {
            input: testkit::data(&envelope.to_string()),
            digest: digest.map(|d| d.parse().unwrap()),
            cid: cid.map(|c| c.parse().unwrap()),
        }
    }

    #[tokio::test]
    async fn test_verify_by_digest_and_cid() {
        let (ctx, _temp) = testkit::initialized_context().await;
        let out = sealed(&ctx, r#"{"email": "a@example.com"}"#).await;
        let digest = out["digest"].as_str();
        let cid = out["cid"].as_str();

        for (d, c) in [(digest, None), (None, cid), (digest, cid)] {
            let opened = verify_op(&out["envelope"], d, c).execute(&ctx).await.unwrap();
            let record: serde_json::Value = serde_json::from_str(&opened).unwrap();
            assert_eq!(record["email"], "a@example.com");
        }
    }

    #[tokio::test]
    async fn test_verify_rejects_swapped_envelope() {
        let (ctx, _temp) = testkit::initialized_context().await;
        let original = sealed(&ctx, r#"{"email": "a@example.com"}"#).await;
        let forged = sealed(&ctx, r#"{"email": "mallory@example.com"}"#).await;

        let by_digest = verify_op(&forged["envelope"], original["digest"].as_str(), None);
        let by_cid = verify_op(&forged["envelope"], None, original["cid"].as_str());

        assert!(matches!(
            by_digest.execute(&ctx).await,
            Err(VerifyError::Seal(SealError::Integrity))
        ));
        assert!(matches!(
            by_cid.execute(&ctx).await,
            Err(VerifyError::Seal(SealError::Integrity))
        ));
    }
}
