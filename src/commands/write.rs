//! Write command implementation

use bbflash_core::flash::FlashEngine;
use bbflash_dummy::DummyFlash;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Program `input` at memory-mapped address `address`
pub fn run_write(
    engine: &mut FlashEngine<DummyFlash>,
    address: u32,
    input: &Path,
    verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(input)
        .map_err(|e| format!("failed to read input file '{}': {}", input.display(), e))?;

    let offset = engine.config().to_relative(address)?;
    let end = u64::from(offset) + data.len() as u64;
    if end > u64::from(engine.geometry().total_size()) {
        return Err(format!(
            "{} bytes at flash offset 0x{:06X} do not fit in {} bytes",
            data.len(),
            offset,
            engine.geometry().total_size()
        )
        .into());
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Writing {} bytes to 0x{:08X}...", data.len(), address));
    pb.enable_steady_tick(Duration::from_millis(100));

    if let Err(e) = engine.write(address, &data) {
        pb.abandon();
        return Err(e.into());
    }
    pb.finish_with_message(format!("Wrote {} bytes", data.len()));

    if verify {
        let mut readback = vec![0u8; data.len()];
        engine.transport().mapped_read(offset, &mut readback)?;
        if let Some(pos) = readback.iter().zip(&data).position(|(a, b)| a != b) {
            return Err(format!(
                "Verification failed at 0x{:08X}: expected 0x{:02X}, read 0x{:02X}",
                address + pos as u32,
                data[pos],
                readback[pos]
            )
            .into());
        }
        println!("Verified {} bytes", data.len());
    }

    Ok(())
}
