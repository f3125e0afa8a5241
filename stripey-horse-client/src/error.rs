//! Error Taxonomy
//!
//! Every failure in the client surfaces as a [`ClientError`]. Variants raised
//! while a conversion is in flight keep a copy of the ZPL that triggered them.
//! Treat that payload as sensitive and potentially large.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Why an executable path was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathRejection {
    /// Nothing exists at the path
    Missing,
    /// The path exists but is not an executable file
    NotExecutable,
    /// The binary answered the handshake as a different application
    Untrusted { app: String },
    /// The handshake itself could not be completed
    HandshakeFailed(String),
}

impl fmt::Display for PathRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "file does not exist"),
            Self::NotExecutable => write!(f, "file is not executable"),
            Self::Untrusted { app } => write!(f, "binary identifies as {:?}", app),
            Self::HandshakeFailed(reason) => write!(f, "signature handshake failed: {}", reason),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid executable path: {} ({reason})", .path.display())]
    InvalidExecutablePath { path: PathBuf, reason: PathRejection },

    #[error("Failed to start stripey_horse process: {source}")]
    ProcessStartFailed {
        #[source]
        source: std::io::Error,
        zpl: Option<Vec<u8>>,
    },

    #[error("stripey_horse failed with exit code {exit_code}: {stderr}")]
    ProcessFailed {
        exit_code: i32,
        stderr: String,
        zpl: Option<Vec<u8>>,
    },

    #[error("stripey_horse did not finish within {}ms", .timeout.as_millis())]
    ProcessTimeout {
        timeout: Duration,
        zpl: Option<Vec<u8>>,
    },

    #[error("I/O error talking to stripey_horse: {source}")]
    Io {
        #[source]
        source: std::io::Error,
        zpl: Option<Vec<u8>>,
    },

    #[error("Invalid binary: signature request exited with code {exit_code}: {stderr}")]
    InvalidBinary { exit_code: i32, stderr: String },

    #[error("Unable to determine architecture")]
    UnsupportedArchitecture,

    #[error("Unknown label preset: {preset}. Available presets: {available}")]
    UnknownPreset { preset: String, available: String },

    #[error("Invalid signature: {0}")]
    MalformedSignature(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    pub(crate) fn invalid_path(path: impl Into<PathBuf>, reason: PathRejection) -> Self {
        Self::InvalidExecutablePath { path: path.into(), reason }
    }

    /// The ZPL that was being converted when the error occurred, if any.
    pub fn zpl(&self) -> Option<&[u8]> {
        match self {
            Self::ProcessStartFailed { zpl, .. }
            | Self::ProcessFailed { zpl, .. }
            | Self::ProcessTimeout { zpl, .. }
            | Self::Io { zpl, .. } => zpl.as_deref(),
            _ => None,
        }
    }

    /// Attach a ZPL payload to variants that can carry one.
    pub fn with_zpl(mut self, payload: &[u8]) -> Self {
        match &mut self {
            Self::ProcessStartFailed { zpl, .. }
            | Self::ProcessFailed { zpl, .. }
            | Self::ProcessTimeout { zpl, .. }
            | Self::Io { zpl, .. } => *zpl = Some(payload.to_vec()),
            _ => {}
        }
        self
    }

    /// Full diagnostic text: the message, plus the attached ZPL when present.
    pub fn report(&self) -> String {
        let mut out = format!("StripeyHorse: {}", self);
        if let Some(zpl) = self.zpl() {
            out.push_str("\nZPL: <<<");
            out.push_str(&String::from_utf8_lossy(zpl));
            out.push_str(">>>");
        }
        out
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
