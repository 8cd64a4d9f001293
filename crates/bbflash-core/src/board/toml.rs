//! TOML board profile parsing

use std::fs;
use std::path::Path;
use std::string::{String, ToString};
use std::format;

use super::{BoardError, BoardProfile};
use crate::flash::{FlashConfig, FlashGeometry, FlashVariant, DEFAULT_FLASH_BASE, DEFAULT_PAGE_SIZE};
use crate::protocol::PollMode;

/// TOML board profile structure
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlBoardFile {
    board: Option<TomlBoard>,
    flash: TomlFlash,
    geometry: Option<TomlGeometry>,
    poll: Option<TomlPoll>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlBoard {
    name: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlFlash {
    #[serde(default)]
    variant: FlashVariant,
    base: Option<HexOrInt>,
    page_size: Option<HexOrInt>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlGeometry {
    total_size: HexOrInt,
    sector_count: u32,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlPoll {
    max_polls: u32,
    #[serde(default)]
    backoff_us: u32,
}

/// A number written as an integer or as a string ("0x1000", "4 MiB")
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum HexOrInt {
    Int(u32),
    Str(String),
}

impl HexOrInt {
    fn number(&self, field: &'static str) -> Result<u32, BoardError> {
        match self {
            Self::Int(n) => Ok(*n),
            Self::Str(s) => parse_number(s).map_err(|message| BoardError::InvalidValue { field, message }),
        }
    }

    fn size(&self, field: &'static str) -> Result<u32, BoardError> {
        match self {
            Self::Int(n) => Ok(*n),
            Self::Str(s) => parse_size(s).map_err(|message| BoardError::InvalidValue { field, message }),
        }
    }
}

/// Parse a number that can be hex (0x...) or decimal
fn parse_number(s: &str) -> Result<u32, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("invalid hex: {}", e))
    } else {
        s.parse().map_err(|e| format!("invalid number: {}", e))
    }
}

/// Parse a size string like "4 MiB", "64KiB" or "0x400000"
fn parse_size(s: &str) -> Result<u32, String> {
    if let Ok(n) = parse_number(s) {
        return Ok(n);
    }

    let s_lower = s.trim().to_lowercase();
    let (num_str, multiplier) = if let Some(n) = s_lower.strip_suffix("mib") {
        (n.trim(), 1024 * 1024)
    } else if let Some(n) = s_lower.strip_suffix("kib") {
        (n.trim(), 1024)
    } else {
        return Err(format!("invalid size: {}", s));
    };

    let num: u32 = num_str.parse().map_err(|_| format!("invalid size: {}", s))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size too large: {}", s))
}

impl BoardProfile {
    /// Load a board profile from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, BoardError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| BoardError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse a board profile from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, BoardError> {
        let file: TomlBoardFile = ::toml::from_str(content)?;

        let mut config = FlashConfig::for_variant(file.flash.variant);
        config.flash_base = match &file.flash.base {
            Some(base) => base.number("flash.base")?,
            None => DEFAULT_FLASH_BASE,
        };
        config.page_size = match &file.flash.page_size {
            Some(size) => size.size("flash.page_size")?,
            None => DEFAULT_PAGE_SIZE,
        };
        if config.page_size == 0 {
            return Err(BoardError::InvalidValue {
                field: "flash.page_size",
                message: "must be non-zero".to_string(),
            });
        }
        if let Some(poll) = file.poll {
            if poll.max_polls == 0 {
                return Err(BoardError::InvalidValue {
                    field: "poll.max_polls",
                    message: "must be non-zero".to_string(),
                });
            }
            config.poll = PollMode::Bounded {
                max_polls: poll.max_polls,
                backoff_us: poll.backoff_us,
            };
        }

        let geometry = match file.geometry {
            Some(g) => {
                let total_size = g.total_size.size("geometry.total_size")?;
                Some(FlashGeometry::new(total_size, g.sector_count).map_err(BoardError::Geometry)?)
            }
            None => None,
        };

        Ok(Self {
            name: file.board.and_then(|b| b.name),
            config,
            geometry,
        })
    }
}
