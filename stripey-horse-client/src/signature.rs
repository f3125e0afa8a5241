//! Signature Protocol
//!
//! `<binary> --signature` must print a JSON object with string fields
//! `app`, `version` and `signature`. A binary is trusted only when `app`
//! is exactly [`Signature::EXPECTED_APP_NAME`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ClientError, Result};
use crate::process;

pub const SIGNATURE_FLAG: &str = "--signature";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub app: String,
    pub version: String,
    pub signature: String,
}

impl Signature {
    pub const EXPECTED_APP_NAME: &'static str = "stripey-horse";

    /// Parse the handshake output of the renderer.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ClientError::MalformedSignature(format!("not valid JSON ({})", e)))?;

        let obj = value
            .as_object()
            .ok_or_else(|| ClientError::MalformedSignature("expected a JSON object".into()))?;

        let field = |name: &str| -> Result<String> {
            obj.get(name)
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or_else(|| {
                    ClientError::MalformedSignature(format!("missing or invalid {} field", name))
                })
        };

        Ok(Self {
            app: field("app")?,
            version: field("version")?,
            signature: field("signature")?,
        })
    }

    /// Exact, case-sensitive comparison against the expected app name.
    pub fn is_expected(&self) -> bool {
        self.app == Self::EXPECTED_APP_NAME
    }

    /// The version as semver, when the binary reports one.
    pub fn semver(&self) -> Option<semver::Version> {
        semver::Version::parse(self.version.trim_start_matches('v')).ok()
    }
}

/// Ask the binary at `path` to identify itself.
pub fn request_signature(path: &Path, timeout: Duration) -> Result<Signature> {
    let output = process::run(path, &[SIGNATURE_FLAG], None, timeout)
        .map_err(|e| e.into_client_error(timeout))?;

    if !output.status.success() {
        return Err(ClientError::InvalidBinary {
            exit_code: output.exit_code(),
            stderr: output.stderr_text(),
        });
    }

    Signature::parse(&String::from_utf8_lossy(&output.stdout))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_malformed(raw: &str) {
        match Signature::parse(raw) {
            Err(ClientError::MalformedSignature(_)) => {}
            other => panic!("expected MalformedSignature for {raw:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_valid() {
        let sig = Signature::parse(
            r#"{"app":"stripey-horse","version":"1.0.0","signature":"test-signature"}"#,
        )
        .unwrap();
        assert_eq!(sig.app, "stripey-horse");
        assert_eq!(sig.version, "1.0.0");
        assert_eq!(sig.signature, "test-signature");
        assert!(sig.is_expected());
    }

    #[test]
    fn test_parse_ignores_extra_fields_and_whitespace() {
        let sig = Signature::parse(
            "{\"app\": \"stripey-horse\", \"version\": \"dev\", \"signature\": \"x\", \"build\": 7}\n",
        )
        .unwrap();
        assert_eq!(sig.version, "dev");
        assert!(sig.semver().is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_malformed("not valid json{]");
        assert_malformed("");
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert_malformed("[1, 2, 3]");
        assert_malformed("\"stripey-horse\"");
        assert_malformed("null");
    }

    #[test]
    fn test_parse_rejects_missing_or_mistyped_fields() {
        assert_malformed(r#"{"version":"1.0.0","signature":"s"}"#);
        assert_malformed(r#"{"app":"stripey-horse","signature":"s"}"#);
        assert_malformed(r#"{"app":"stripey-horse","version":"1.0.0"}"#);
        assert_malformed(r#"{"app":null,"version":"1.0.0","signature":"s"}"#);
        assert_malformed(r#"{"app":"stripey-horse","version":1,"signature":"s"}"#);
    }

    #[test]
    fn test_field_error_names_field() {
        let err = Signature::parse(r#"{"app":"stripey-horse","version":"1"}"#).unwrap_err();
        assert!(err.to_string().contains("signature field"));
    }

    #[test]
    fn test_is_expected_is_exact() {
        let sig = |app: &str| Signature {
            app: app.to_string(),
            version: "1.0.0".to_string(),
            signature: "s".to_string(),
        };
        assert!(sig("stripey-horse").is_expected());
        assert!(!sig("Stripey-Horse").is_expected());
        assert!(!sig("stripey-horse ").is_expected());
        assert!(!sig("").is_expected());
        assert!(!sig("different-app").is_expected());
    }

    #[test]
    fn test_semver() {
        let sig = Signature {
            app: Signature::EXPECTED_APP_NAME.to_string(),
            version: "v1.4.2".to_string(),
            signature: String::new(),
        };
        assert_eq!(sig.semver(), Some(semver::Version::new(1, 4, 2)));
    }
}
