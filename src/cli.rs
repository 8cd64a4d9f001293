//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "bbflash")]
#[command(author, version, about = "Bit-banged SPI flash program/erase engine", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Board profile (TOML format)
    #[arg(short, long)]
    pub board: PathBuf,

    /// Flash image backing the emulated chip (created erased if missing)
    #[arg(short, long)]
    pub image: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the flash and show its ID and geometry
    Probe,

    /// Erase an inclusive range of sectors
    Erase {
        /// First sector index
        #[arg(long, value_parser = parse_hex_u32)]
        first: u32,

        /// Last sector index (inclusive)
        #[arg(long, value_parser = parse_hex_u32)]
        last: u32,
    },

    /// Erase the entire chip
    ChipErase,

    /// Program a file at a memory-mapped address
    ///
    /// The covering sectors must already be erased.
    Write {
        /// Destination address, including the flash base (hex with 0x prefix)
        #[arg(short, long, value_parser = parse_hex_u32)]
        address: u32,

        /// Input file path
        #[arg(long)]
        input: PathBuf,

        /// Read the data back through the memory-mapped window
        #[arg(long)]
        verify: bool,
    },
}
