//! Stripey Horse Client - ZPL to Raster via a Verified Local Renderer
//!
//! The renderer is an external `stripey-horse` binary. This crate checks
//! that binary's identity, then drives it one process per conversion.
//!
//! ```no_run
//! use stripey_horse_client::{LabelConfig, StripeyHorseClient};
//!
//! # fn main() -> stripey_horse_client::Result<()> {
//! let client = StripeyHorseClient::new("/usr/local/bin/stripey-horse")?;
//! let config = LabelConfig::builder().label_preset("4x2")?.rotation(90).build();
//! let png = client.convert(b"^XA^FO50,50^A0N,50,50^FDHello^FS^XZ", &config)?;
//! # let _ = png;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod platform;
pub mod signature;
mod process;

pub use client::{ClientOptions, StripeyHorseClient};
pub use config::{LabelConfig, LabelConfigBuilder, LabelSize, millimeters_to_pixels, pixels_to_millimeters};
pub use error::{ClientError, PathRejection, Result};
pub use platform::{Platform, SystemInfo};
pub use signature::{request_signature, Signature};

pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
