//! Platform Detection
//!
//! Helps callers pick the right renderer build for the host CPU.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// AMD/Intel 64-bit, what most laptops and containers run
    Amd64,
    /// ARM 64-bit
    Arm64,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Amd64, Platform::Arm64];

    /// Detect the host platform.
    ///
    /// Only 64-bit hosts are supported. The machine string is lowercased
    /// before the ARM marker check, so `AARCH64` and `ARMv8` both count.
    pub fn detect() -> Result<Self> {
        if usize::BITS != 64 {
            return Err(ClientError::UnsupportedArchitecture);
        }
        Ok(Self::classify(std::env::consts::ARCH))
    }

    fn classify(machine: &str) -> Self {
        let machine = machine.to_ascii_lowercase();
        if machine.contains("arm") || machine.contains("aarch64") {
            Self::Arm64
        } else {
            Self::Amd64
        }
    }

    /// Resolve a machine type string (e.g. from `uname -m`) by alias.
    pub fn from_machine_type(machine_type: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|platform| platform.matches_machine_type(machine_type))
    }

    pub fn matches_machine_type(&self, machine_type: &str) -> bool {
        let normalized = machine_type.trim().to_ascii_lowercase();
        normalized == self.as_str() || self.aliases().contains(&normalized.as_str())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
        }
    }

    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::Amd64 => &["x86_64", "x64", "amd64"],
            Self::Arm64 => &["aarch64", "arm64"],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Amd64 => "AMD/Intel 64-bit (x86_64)",
            Self::Arm64 => "ARM 64-bit (aarch64)",
        }
    }

    pub fn bit_width(&self) -> u32 {
        64
    }

    pub fn is_amd64(&self) -> bool {
        *self == Self::Amd64
    }

    pub fn is_arm64(&self) -> bool {
        *self == Self::Arm64
    }

    pub fn system_info() -> Result<SystemInfo> {
        Ok(SystemInfo {
            pointer_width: usize::BITS,
            os: std::env::consts::OS,
            os_family: std::env::consts::FAMILY,
            machine: std::env::consts::ARCH,
            detected_platform: Self::detect()?,
        })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host details for debugging binary selection
#[derive(Debug, Clone, Serialize)]
pub struct SystemInfo {
    pub pointer_width: u32,
    pub os: &'static str,
    pub os_family: &'static str,
    pub machine: &'static str,
    pub detected_platform: Platform,
}
