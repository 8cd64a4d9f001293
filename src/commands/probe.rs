//! Probe command implementation

use bbflash_core::flash::{FlashEngine, FlashVariant};
use bbflash_core::transport::BitbangTransport;

/// Show what initialization found
pub fn run_probe<T: BitbangTransport>(engine: &FlashEngine<T>) {
    let id = engine.jedec_id();
    let geometry = engine.geometry();
    let config = engine.config();

    println!("Found flash chip:");
    println!(
        "  JEDEC ID: {:02X} {:04X}",
        id.manufacturer,
        id.device_id()
    );
    println!(
        "  Variant:  {}",
        match engine.variant() {
            FlashVariant::Generic => "generic (page program)",
            FlashVariant::ByteProgrammable => "byte-programmable",
        }
    );
    println!(
        "  Size:     {} bytes ({} KiB)",
        geometry.total_size(),
        geometry.total_size() / 1024
    );
    println!(
        "  Sectors:  {} x {} bytes",
        geometry.sector_count(),
        geometry.sector_size()
    );
    println!("  Base:     0x{:08X}", config.flash_base);
}
