//! Engine setup against the emulated chip
//!
//! The board profile supplies the engine configuration and geometry. The
//! emulated chip is sized from the same geometry and backed by an image
//! file, so successive invocations see each other's writes.

use std::path::{Path, PathBuf};

use bbflash_core::board::{BoardError, BoardProfile};
use bbflash_core::flash::{FlashEngine, FlashGeometry, FlashVariant};
use bbflash_dummy::{DummyConfig, DummyError, DummyFlash};
use thiserror::Error;

/// Errors from setting up or finishing a session
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Image(#[from] DummyError),

    #[error("flash error: {0}")]
    Flash(#[from] bbflash_core::Error),

    #[error("board profile '{0}' has no [geometry] table; the emulator cannot size the chip")]
    NoGeometry(String),
}

/// An initialized engine plus the image it writes back to
pub struct Session {
    engine: FlashEngine<DummyFlash>,
    image: PathBuf,
}

impl Session {
    /// Load the board profile and image, then run flash initialization
    pub fn open(board: &Path, image: &Path) -> Result<Self, SessionError> {
        let profile = BoardProfile::from_toml_file(board)?;
        if let Some(name) = &profile.name {
            log::info!("Board: {}", name);
        }

        let geometry = profile
            .geometry
            .ok_or_else(|| SessionError::NoGeometry(board.display().to_string()))?;
        let chip = DummyFlash::load_image(chip_config(&profile, geometry), image)?;
        let engine = FlashEngine::initialize(chip, profile.config, &mut profile.probe())?;

        Ok(Self {
            engine,
            image: image.to_path_buf(),
        })
    }

    pub fn engine(&self) -> &FlashEngine<DummyFlash> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut FlashEngine<DummyFlash> {
        &mut self.engine
    }

    /// Write the chip contents back to the image file
    pub fn save(&self) -> Result<(), SessionError> {
        self.engine.transport().save_image(&self.image)?;
        log::debug!("Saved image to {}", self.image.display());
        Ok(())
    }
}

/// Emulated part matching the board
fn chip_config(profile: &BoardProfile, geometry: FlashGeometry) -> DummyConfig {
    let part = match profile.config.variant {
        FlashVariant::Generic => DummyConfig::default(),
        FlashVariant::ByteProgrammable => DummyConfig::byte_programmable(),
    };
    DummyConfig {
        size: geometry.total_size() as usize,
        page_size: profile.config.page_size as usize,
        sector_size: geometry.sector_size() as usize,
        ..part
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chip_config_follows_board() {
        let profile = BoardProfile::from_toml_str(
            r#"
            [flash]
            variant = "byte-programmable"
            page_size = 128

            [geometry]
            total_size = "2 MiB"
            sector_count = 32
            "#,
        )
        .unwrap();
        let geometry = profile.geometry.unwrap();
        let chip = chip_config(&profile, geometry);

        assert_eq!(chip.size, 2 * 1024 * 1024);
        assert_eq!(chip.sector_size, 64 * 1024);
        assert_eq!(chip.page_size, 128);
        assert_eq!(chip.variant, FlashVariant::ByteProgrammable);
    }

    #[test]
    fn test_shipped_board_profiles() {
        let boards = Path::new(env!("CARGO_MANIFEST_DIR")).join("boards");

        let ap143 = BoardProfile::from_toml_file(boards.join("ap143.toml")).unwrap();
        assert_eq!(ap143.name.as_deref(), Some("ap143"));
        assert_eq!(ap143.config.variant, FlashVariant::Generic);
        assert_eq!(ap143.geometry.unwrap().sector_size(), 64 * 1024);

        let sst = BoardProfile::from_toml_file(boards.join("sst25-bounded.toml")).unwrap();
        assert_eq!(sst.config.variant, FlashVariant::ByteProgrammable);
        assert_ne!(sst.config.poll, bbflash_core::protocol::PollMode::Unbounded);
    }

    #[test]
    fn test_open_and_save_round_trip() {
        let dir = std::env::temp_dir().join(format!("bbflash-session-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let board = Path::new(env!("CARGO_MANIFEST_DIR")).join("boards/ap143.toml");
        let image = dir.join("flash.bin");

        let mut session = Session::open(&board, &image).unwrap();
        session.engine_mut().erase(1, 1).unwrap();
        session.engine_mut().write(0x9F01_0000, &[0x12, 0x34]).unwrap();
        session.save().unwrap();

        let session = Session::open(&board, &image).unwrap();
        assert_eq!(&session.engine().transport().data()[0x1_0000..0x1_0002], &[0x12, 0x34]);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
