//! Command-line argument surface.

use std::path::PathBuf;

use clap::Parser;

/// Flash a PIC24/dsPIC target over a serial bootloader link.
#[derive(Debug, Parser)]
#[command(name = "picboot", version, about)]
pub struct Args {
    /// Intel HEX image to load and/or verify against.
    #[arg(long)]
    pub hexfile: PathBuf,

    /// Serial device to connect to (e.g. `/dev/ttyUSB0`, `COM3`).
    #[arg(long)]
    pub port: String,

    /// Serial baud rate.
    #[arg(long, default_value_t = 115_200)]
    pub baudrate: u32,

    /// Erase application flash before loading.
    #[arg(long)]
    pub erase: bool,

    /// Program `hexfile` onto the device.
    #[arg(long)]
    pub load: bool,

    /// Read flash back and compare it against `hexfile`.
    #[arg(long)]
    pub verify: bool,

    /// Tracing log level (`error`, `warn`, `info`, `debug`, `trace`).
    #[arg(long, default_value = "info")]
    pub log_level: String,
}
