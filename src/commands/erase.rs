//! Erase command implementation

use bbflash_core::flash::{EraseProgress, FlashEngine};
use bbflash_core::transport::BitbangTransport;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Sector progress bar
#[derive(Default)]
struct SectorProgress {
    bar: Option<ProgressBar>,
}

impl EraseProgress for SectorProgress {
    fn erasing(&mut self, first: u32, last: u32) {
        let total = if last >= first {
            u64::from(last - first) + 1
        } else {
            0
        };
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} sectors ({eta}) Erasing")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        self.bar = Some(pb);
    }

    fn sector_erased(&mut self, _index: u32) {
        if let Some(pb) = &self.bar {
            pb.inc(1);
        }
    }
}

impl SectorProgress {
    fn finish(&self, message: String) {
        if let Some(pb) = &self.bar {
            pb.finish_with_message(message);
        }
    }

    fn abandon(&self) {
        if let Some(pb) = &self.bar {
            pb.abandon();
        }
    }
}

/// Run the erase command
pub fn run_erase<T: BitbangTransport>(
    engine: &mut FlashEngine<T>,
    first: u32,
    last: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    if first > last {
        println!("Empty sector range {}..={}, nothing to erase", first, last);
        return Ok(());
    }

    let mut progress = SectorProgress::default();
    match engine.erase_with_progress(first, last, &mut progress) {
        Ok(()) => {
            progress.finish(format!("Erased sectors {}..={}", first, last));
            Ok(())
        }
        Err(e) => {
            progress.abandon();
            Err(e.into())
        }
    }
}

/// Erase the entire chip with a progress spinner
pub fn run_chip_erase<T: BitbangTransport>(
    engine: &mut FlashEngine<T>,
) -> Result<(), Box<dyn std::error::Error>> {
    let total_size = engine.geometry().total_size();

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!(
        "Erasing {} bytes (this may take a while)...",
        total_size
    ));
    pb.enable_steady_tick(Duration::from_millis(100));

    engine.chip_erase()?;

    pb.finish_with_message(format!("Erased {} bytes", total_size));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bbflash_core::flash::{FixedGeometry, FlashConfig};
    use bbflash_dummy::{DummyConfig, DummyFlash};

    fn engine() -> FlashEngine<DummyFlash> {
        let chip = DummyFlash::new(DummyConfig::default());
        let mut probe = FixedGeometry(chip.config().geometry().unwrap());
        FlashEngine::initialize(chip, FlashConfig::default(), &mut probe).unwrap()
    }

    #[test]
    fn test_erase_past_last_sector_is_passed_through() {
        let mut engine = engine();
        let last = engine.geometry().sector_count() - 1;

        run_erase(&mut engine, last, last + 1).unwrap();

        let erases: Vec<_> = engine
            .transport()
            .transactions_for(bbflash_core::spi::Command::SectorErase)
            .map(|t| t.address)
            .collect();
        assert_eq!(erases, [Some(0x3F_0000), Some(0x40_0000)]);
    }

    #[test]
    fn test_empty_range_is_skipped() {
        let mut engine = engine();
        engine.transport_mut().clear_log();
        run_erase(&mut engine, 3, 2).unwrap();
        assert!(engine.transport().transactions().is_empty());
    }
}
