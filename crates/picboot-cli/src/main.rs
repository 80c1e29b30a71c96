//! `picboot`: flash a PIC24/dsPIC target over a serial bootloader link.

mod cli;
mod error;
mod hex_image;
mod serial_transport;

use std::time::Duration;

use clap::Parser;
use picboot_core::{BootloaderInterface, SettleConfig};
use tracing::{error, info};

use crate::{cli::Args, error::CliError, hex_image::IhexImage, serial_transport::SerialTransport};

const IDENTIFY_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing(&args.log_level);

    match run(&args).await {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            error!(%err, "picboot failed");
            std::process::exit(err.exit_code());
        }
    }
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(log_level))
        .init();
}

async fn run(args: &Args) -> Result<(), CliError> {
    let contents = std::fs::read_to_string(&args.hexfile)
        .map_err(|source| CliError::HexFileIo { path: args.hexfile.display().to_string(), source })?;
    let image = IhexImage::parse(&contents).map_err(CliError::HexParse)?;

    let transport = SerialTransport::open(&args.port, args.baudrate)?;
    let bli = BootloaderInterface::spawn(transport, SettleConfig::default());

    info!(port = %args.port, baudrate = args.baudrate, "connecting to bootloader");
    let profile = picboot_orch::identify(&bli, IDENTIFY_TIMEOUT, POLL_INTERVAL).await?;

    if args.erase {
        info!("erasing application flash");
        picboot_orch::erase(&bli, &profile, POLL_INTERVAL).await;
    }

    if args.load {
        info!(hexfile = %args.hexfile.display(), "loading image");
        picboot_orch::load(&bli, &profile, &image, POLL_INTERVAL).await?;
    }

    if args.verify {
        info!("verifying image");
        let report = picboot_orch::verify(&bli, &profile, &image, POLL_INTERVAL).await?;
        if !report.is_ok() {
            for mismatch in &report.mismatches {
                error!(
                    addr = mismatch.addr,
                    expected = mismatch.expected,
                    actual = mismatch.actual,
                    "verification mismatch"
                );
            }
            bli.shutdown(false).await?;
            return Err(CliError::VerificationFailed(report.mismatches.len()));
        }
    }

    bli.shutdown(true).await?;
    info!("done");
    Ok(())
}
