//! Stripey CLI - command-line front end for the stripey-horse renderer
//!
//! Commands: convert, signature, platform
//! Reports are JSON on stdout; raw image bytes go to stdout only when
//! `convert` has neither `--output` nor `--json`.

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use sha2::{Digest, Sha256};
use stripey_horse_client::{
    ClientOptions, LabelConfig, LabelConfigBuilder, Platform, StripeyHorseClient,
};

#[derive(Parser)]
#[command(name = "stripey-cli")]
#[command(about = "Render ZPL labels with a verified stripey-horse binary")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the stripey-horse binary
    #[arg(short, long, env = "STRIPEY_HORSE_BINARY", global = true)]
    binary: Option<PathBuf>,

    /// Per-process time limit in seconds
    #[arg(long, default_value_t = 10, global = true)]
    timeout_secs: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a ZPL file to an image
    Convert {
        /// ZPL input file, `-` for stdin
        #[arg(short, long)]
        input: PathBuf,

        /// Image output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Label preset such as 4x6 or 4x2
        #[arg(short, long)]
        preset: Option<String>,

        #[arg(long)]
        width_mm: Option<f64>,

        #[arg(long)]
        height_mm: Option<f64>,

        #[arg(long)]
        dpmm: Option<u32>,

        #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
        rotation: i32,

        /// Print a JSON report with the image as base64
        #[arg(long)]
        json: bool,
    },

    /// Print the verified binary signature
    Signature,

    /// Print detected platform information
    Platform,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Platform => match Platform::system_info() {
            Ok(info) => print_json(&info),
            Err(e) => fail(&e.to_string(), ExitCode::FAILURE),
        },

        Commands::Signature => {
            let client = match connect(cli.binary, cli.timeout_secs) {
                Ok(c) => c,
                Err(code) => return code,
            };
            let sig = client.signature();
            print_json(&serde_json::json!({
                "app": sig.app,
                "version": sig.version,
                "semver": sig.semver().map(|v| v.to_string()),
                "signature": sig.signature,
                "path": client.executable_path(),
            }))
        }

        Commands::Convert {
            input,
            output,
            preset,
            width_mm,
            height_mm,
            dpmm,
            rotation,
            json,
        } => {
            let client = match connect(cli.binary, cli.timeout_secs) {
                Ok(c) => c,
                Err(code) => return code,
            };

            let zpl = match read_input(&input) {
                Ok(z) => z,
                Err(e) => {
                    return fail(
                        &format!("Failed to read {}: {}", input.display(), e),
                        ExitCode::FAILURE,
                    )
                }
            };

            let config = match build_config(preset.as_deref(), width_mm, height_mm, dpmm, rotation) {
                Ok(c) => c,
                Err(e) => return fail(&e.to_string(), ExitCode::FAILURE),
            };

            let image = match client.convert(&zpl, &config) {
                Ok(image) => image,
                Err(e) => {
                    log::debug!("conversion of {} ZPL byte(s) failed", zpl.len());
                    return fail(&e.to_string(), ExitCode::from(2));
                }
            };

            if let Some(path) = &output {
                if let Err(e) = fs::write(path, &image) {
                    return fail(
                        &format!("Failed to write {}: {}", path.display(), e),
                        ExitCode::FAILURE,
                    );
                }
            }

            if json {
                print_json(&serde_json::json!({
                    "success": true,
                    "config": config,
                    "bytes": image.len(),
                    "sha256": sha256_hex(&image),
                    "data_base64": base64::Engine::encode(&base64::engine::general_purpose::STANDARD, &image),
                    "output": output,
                }))
            } else if output.is_none() {
                match io::stdout().lock().write_all(&image) {
                    Ok(()) => ExitCode::SUCCESS,
                    Err(e) => fail(&format!("Failed to write stdout: {}", e), ExitCode::FAILURE),
                }
            } else {
                ExitCode::SUCCESS
            }
        }
    }
}

fn connect(binary: Option<PathBuf>, timeout_secs: u64) -> Result<StripeyHorseClient, ExitCode> {
    let Some(binary) = binary else {
        return Err(fail(
            "No binary given: pass --binary or set STRIPEY_HORSE_BINARY",
            ExitCode::FAILURE,
        ));
    };
    let options = ClientOptions {
        timeout: Duration::from_secs(timeout_secs),
    };
    StripeyHorseClient::with_options(binary, options).map_err(|e| fail(&e.to_string(), ExitCode::FAILURE))
}

fn build_config(
    preset: Option<&str>,
    width_mm: Option<f64>,
    height_mm: Option<f64>,
    dpmm: Option<u32>,
    rotation: i32,
) -> stripey_horse_client::Result<LabelConfig> {
    let mut builder = LabelConfigBuilder::new().rotation(rotation);
    if let Some(dpmm) = dpmm {
        builder = builder.dpmm(dpmm);
    }
    if let Some(preset) = preset {
        builder = builder.label_preset(preset)?;
    }
    // Explicit dimensions override the preset
    if let Some(w) = width_mm {
        builder = builder.label_width_mm(w);
    }
    if let Some(h) = height_mm {
        builder = builder.label_height_mm(h);
    }
    Ok(builder.build())
}

fn read_input(input: &Path) -> io::Result<Vec<u8>> {
    if input.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin().lock().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(input)
    }
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn print_json(value: &impl serde::Serialize) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{}", s);
            ExitCode::SUCCESS
        }
        Err(e) => fail(&format!("Failed to encode output: {}", e), ExitCode::FAILURE),
    }
}

fn fail(message: &str, code: ExitCode) -> ExitCode {
    let output = serde_json::json!({
        "success": false,
        "error": message,
    });
    println!("{}", output);
    code
}
