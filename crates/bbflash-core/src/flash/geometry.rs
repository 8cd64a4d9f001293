//! Flash geometry and the board probe that reports it

use crate::error::{Error, Result};

/// Size and sector layout of the attached flash
///
/// Sectors are uniform: `total_size` is always a multiple of
/// `sector_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashGeometry {
    total_size: u32,
    sector_count: u32,
}

impl FlashGeometry {
    /// Create a geometry, rejecting layouts that do not split evenly
    pub const fn new(total_size: u32, sector_count: u32) -> Result<Self> {
        if sector_count == 0 || total_size % sector_count != 0 {
            return Err(Error::InvalidGeometry {
                total_size,
                sector_count,
            });
        }
        Ok(Self {
            total_size,
            sector_count,
        })
    }

    /// Total flash size in bytes
    pub const fn total_size(&self) -> u32 {
        self.total_size
    }

    /// Number of erase sectors
    pub const fn sector_count(&self) -> u32 {
        self.sector_count
    }

    /// Size of one erase sector in bytes
    pub const fn sector_size(&self) -> u32 {
        self.total_size / self.sector_count
    }

    /// Flash-relative start address of sector `index`
    ///
    /// Indices past the end are not rejected; the address simply lands
    /// outside the chip.
    pub const fn sector_address(&self, index: u32) -> u32 {
        index.wrapping_mul(self.sector_size())
    }

    /// Whether `index` names a sector on this chip
    pub const fn contains_sector(&self, index: u32) -> bool {
        index < self.sector_count
    }
}

/// Board hook that reports the flash geometry
///
/// Called once during [`FlashEngine::initialize`](super::FlashEngine::initialize).
/// Returns `None` when the board does not recognize the part.
pub trait GeometryProbe {
    /// Discover the geometry
    fn probe(&mut self) -> Option<FlashGeometry>;
}

impl<F: FnMut() -> Option<FlashGeometry>> GeometryProbe for F {
    fn probe(&mut self) -> Option<FlashGeometry> {
        self()
    }
}

/// Probe for boards with a known, fixed flash part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedGeometry(pub FlashGeometry);

impl GeometryProbe for FixedGeometry {
    fn probe(&mut self) -> Option<FlashGeometry> {
        Some(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_size() {
        let geometry = FlashGeometry::new(4 * 1024 * 1024, 64).unwrap();
        assert_eq!(geometry.sector_size(), 64 * 1024);
        assert_eq!(geometry.sector_address(2), 0x2_0000);
        assert!(geometry.contains_sector(63));
        assert!(!geometry.contains_sector(64));
    }

    #[test]
    fn test_uneven_geometry_rejected() {
        assert_eq!(
            FlashGeometry::new(0x1000, 3),
            Err(Error::InvalidGeometry {
                total_size: 0x1000,
                sector_count: 3
            })
        );
        assert!(FlashGeometry::new(0x1000, 0).is_err());
    }

    #[test]
    fn test_closure_probe() {
        let mut probe = || FlashGeometry::new(0x10_0000, 16).ok();
        assert_eq!(probe.probe().map(|g| g.sector_size()), Some(0x1_0000));
    }
}
