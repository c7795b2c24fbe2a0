//! Reading JSON documents from `--data`, `--file` or stdin

use std::io::Read;
use std::path::PathBuf;

use clap::Args;
use common::envelope::EnvelopeMap;
use common::record::Record;
use serde::Deserialize;

#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Inline JSON document
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,

    /// Read the JSON document from a file (stdin if neither flag is given)
    #[arg(long)]
    pub file: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("input is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("record must be a JSON object")]
    NotAnObject,

    #[error("input is neither an envelope nor an encrypt result")]
    NotAnEnvelope,
}

/// Envelope input: either the bare map or the full `encrypt` output
#[derive(Deserialize)]
#[serde(untagged)]
enum EnvelopeInput {
    Wrapped { envelope: EnvelopeMap },
    Bare(EnvelopeMap),
}

impl InputArgs {
    pub fn read(&self) -> Result<String, InputError> {
        if let Some(data) = &self.data {
            return Ok(data.clone());
        }
        if let Some(path) = &self.file {
            return Ok(std::fs::read_to_string(path)?);
        }
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    }

    pub fn read_record(&self) -> Result<Record, InputError> {
        parse_record(&self.read()?)
    }

    pub fn read_envelope(&self) -> Result<EnvelopeMap, InputError> {
        parse_envelope(&self.read()?)
    }
}

pub fn parse_record(text: &str) -> Result<Record, InputError> {
    match serde_json::from_str(text)? {
        serde_json::Value::Object(record) => Ok(record),
        _ => Err(InputError::NotAnObject),
    }
}

pub fn parse_envelope(text: &str) -> Result<EnvelopeMap, InputError> {
    // Surface syntax errors before trying the accepted shapes
    let value: serde_json::Value = serde_json::from_str(text)?;
    match serde_json::from_value(value) {
        Ok(EnvelopeInput::Wrapped { envelope }) | Ok(EnvelopeInput::Bare(envelope)) => {
            Ok(envelope)
        }
        Err(_) => Err(InputError::NotAnEnvelope),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record() {
        let record = parse_record(r#"{"email": "a@example.com"}"#).unwrap();
        assert_eq!(record["email"], "a@example.com");
    }

    #[test]
    fn test_parse_record_rejects_non_object() {
        assert!(matches!(parse_record("[1, 2]"), Err(InputError::NotAnObject)));
        assert!(matches!(parse_record("{"), Err(InputError::Json(_))));
    }

    #[test]
    fn test_parse_envelope_shapes() {
        let bare = r#"{"ciphertext": "AA==", "nonce": "BB==", "tag": "CC=="}"#;
        let wrapped = r#"{
            "envelope": {"ciphertext": "AA==", "nonce": "BB==", "tag": "CC=="},
            "digest": "00",
            "cid": "bafk"
        }"#;

        let a = parse_envelope(bare).unwrap();
        let b = parse_envelope(wrapped).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
    }

    #[test]
    fn test_parse_envelope_rejects_other_json() {
        assert!(matches!(
            parse_envelope(r#"{"ciphertext": 5}"#),
            Err(InputError::NotAnEnvelope)
        ));
    }

    #[test]
    fn test_read_from_data_or_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "{\"from\": \"file\"}").unwrap();

        let from_file = InputArgs {
            data: None,
            file: Some(temp.path().to_path_buf()),
        };
        assert_eq!(from_file.read_record().unwrap()["from"], "file");

        let inline = InputArgs {
            data: Some("{\"from\": \"data\"}".into()),
            file: None,
        };
        assert_eq!(inline.read_record().unwrap()["from"], "data");
    }
}
