//! Process Client - Verified, One-Shot Renderer Invocation
//!
//! A client is only constructed once the binary has passed the signature
//! handshake. Every conversion then spawns a fresh process:
//! `<binary> --config <json>`, ZPL on stdin, image bytes on stdout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::LabelConfig;
use crate::error::{ClientError, PathRejection, Result};
use crate::platform::Platform;
use crate::process;
use crate::signature::{request_signature, Signature};

pub const CONFIG_FLAG: &str = "--config";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    /// Upper bound on the wall-clock time of each subprocess
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Client for a verified `stripey-horse` binary.
///
/// Holds no per-call state, so one instance can serve concurrent
/// conversions from several threads.
#[derive(Debug, Clone)]
pub struct StripeyHorseClient {
    executable_path: PathBuf,
    signature: Signature,
    options: ClientOptions,
}

impl StripeyHorseClient {
    pub fn new(executable_path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_options(executable_path, ClientOptions::default())
    }

    pub fn with_options(executable_path: impl Into<PathBuf>, options: ClientOptions) -> Result<Self> {
        let executable_path = executable_path.into();
        check_executable(&executable_path)?;

        let signature = request_signature(&executable_path, options.timeout).map_err(|e| {
            ClientError::invalid_path(&executable_path, PathRejection::HandshakeFailed(e.to_string()))
        })?;

        if !signature.is_expected() {
            return Err(ClientError::invalid_path(
                &executable_path,
                PathRejection::Untrusted {
                    app: signature.app,
                },
            ));
        }

        log::info!(
            "verified {} at {} (version {})",
            signature.app,
            executable_path.display(),
            signature.version
        );

        Ok(Self {
            executable_path,
            signature,
            options,
        })
    }

    pub fn build_with_binary_path(executable_path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(executable_path)
    }

    /// Detect the host platform and let `lookup` choose the binary for it.
    pub fn build_with_binary_lookup<F, P>(lookup: F) -> Result<Self>
    where
        F: FnOnce(Platform) -> P,
        P: Into<PathBuf>,
    {
        let platform = Platform::detect()?;
        Self::new(lookup(platform))
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn executable_path(&self) -> &Path {
        &self.executable_path
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Render `zpl` with `config`, returning the renderer's stdout verbatim.
    ///
    /// The output is not inspected; check the PNG magic bytes yourself if
    /// you need that guarantee.
    pub fn convert(&self, zpl: &[u8], config: &LabelConfig) -> Result<Vec<u8>> {
        let payload = config.to_json_payload()?;
        let timeout = self.options.timeout;

        let output = process::run(
            &self.executable_path,
            &[CONFIG_FLAG, payload.as_str()],
            Some(zpl),
            timeout,
        )
        .map_err(|e| e.into_client_error(timeout).with_zpl(zpl))?;

        if !output.status.success() {
            return Err(ClientError::ProcessFailed {
                exit_code: output.exit_code(),
                stderr: output.stderr_text(),
                zpl: Some(zpl.to_vec()),
            });
        }

        log::debug!("renderer produced {} byte(s)", output.stdout.len());
        Ok(output.stdout)
    }
}

fn check_executable(path: &Path) -> Result<()> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ClientError::invalid_path(path, PathRejection::Missing));
        }
        Err(_) => return Err(ClientError::invalid_path(path, PathRejection::NotExecutable)),
    };

    if !metadata.is_file() || !is_executable(&metadata) {
        return Err(ClientError::invalid_path(path, PathRejection::NotExecutable));
    }
    Ok(())
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    true
}
