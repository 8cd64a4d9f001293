//! bbflash - Bit-banged SPI NOR flash program/erase engine
//!
//! Drives `bbflash-core` against the `bbflash-dummy` emulated chip. The
//! board profile selects the flash variant, the memory-mapped base and the
//! geometry; the chip contents live in an image file between runs.

mod cli;
mod commands;
mod session;

use clap::Parser;
use cli::{Cli, Commands};
use session::Session;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logger; RUST_LOG still wins over -v
    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut session = Session::open(&cli.board, &cli.image)?;
    let mutating = !matches!(cli.command, Commands::Probe);

    let result = match cli.command {
        Commands::Probe => {
            commands::run_probe(session.engine());
            Ok(())
        }
        Commands::Erase { first, last } => commands::run_erase(session.engine_mut(), first, last),
        Commands::ChipErase => commands::run_chip_erase(session.engine_mut()),
        Commands::Write {
            address,
            input,
            verify,
        } => commands::run_write(session.engine_mut(), address, &input, verify),
    };

    // Persist whatever reached the chip, even if the command failed midway
    if mutating {
        session.save()?;
    }

    result
}
