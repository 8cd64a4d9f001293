//! GPIO bit-bang adapter
//!
//! [`PinTransport`] builds the register-level [`BitbangTransport`] out of
//! four GPIO lines. Use it on boards where the flash hangs off plain GPIOs
//! instead of a shift-register SPI block.
//!
//! Every clocked bit is full duplex: MOSI is driven on the falling edge and
//! MISO is sampled on the rising edge into a 32-bit read-back register, so
//! a status or ID response is available through
//! [`read_data`](BitbangTransport::read_data) after the clocks that carried
//! it.

use super::BitbangTransport;

/// Trait for low-level bitbang SPI line control
pub trait BitbangPins {
    /// Set chip select (CS is active low, so `active=true` means CS=0)
    fn set_cs(&mut self, active: bool);

    /// Set clock line value
    fn set_sck(&mut self, high: bool);

    /// Set MOSI line value
    fn set_mosi(&mut self, high: bool);

    /// Get MISO line value
    fn get_miso(&self) -> bool;

    /// Delay for half a clock period
    fn half_period_delay(&self);

    /// Optional: Set SCK and MOSI atomically (optimization)
    ///
    /// Default implementation calls `set_sck` then `set_mosi`.
    fn set_sck_set_mosi(&mut self, sck: bool, mosi: bool) {
        self.set_sck(sck);
        self.set_mosi(mosi);
    }

    /// Optional: Set SCK and get MISO atomically (optimization)
    ///
    /// Default implementation calls `set_sck` then `get_miso`.
    fn set_sck_get_miso(&mut self, sck: bool) -> bool {
        self.set_sck(sck);
        self.get_miso()
    }

    /// Optional: microsecond delay for poll backoff
    fn delay_us(&mut self, _us: u32) {}
}

/// [`BitbangTransport`] over raw GPIO lines
pub struct PinTransport<P> {
    pins: P,
    shift: u32,
    clock_divisor: u8,
    function_select: bool,
}

impl<P: BitbangPins> PinTransport<P> {
    /// Wrap a set of pins; chip-select starts inactive
    pub fn new(mut pins: P) -> Self {
        pins.set_cs(false);
        pins.set_sck(false);
        Self {
            pins,
            shift: 0,
            clock_divisor: 0,
            function_select: false,
        }
    }

    /// Get the pins back
    pub fn into_inner(self) -> P {
        self.pins
    }

    /// Last divisor written through [`BitbangTransport::set_clock_divisor`]
    pub fn clock_divisor(&self) -> u8 {
        self.clock_divisor
    }

    /// Whether software currently owns the flash
    pub fn function_select(&self) -> bool {
        self.function_select
    }

    fn clock_bit(&mut self, bit: bool) {
        self.pins.set_sck_set_mosi(false, bit);
        self.pins.half_period_delay();
        let miso = self.pins.set_sck_get_miso(true);
        self.shift = (self.shift << 1) | miso as u32;
        self.pins.half_period_delay();
    }

    fn end_transaction(&mut self) {
        self.pins.set_sck(false);
        self.pins.half_period_delay();
        self.pins.set_cs(false);
        self.pins.half_period_delay();
    }
}

impl<P: BitbangPins> BitbangTransport for PinTransport<P> {
    fn set_clock_divisor(&mut self, divisor: u8) {
        self.clock_divisor = divisor;
    }

    fn set_function_select(&mut self, enabled: bool) {
        if !enabled {
            self.end_transaction();
        }
        self.function_select = enabled;
    }

    fn begin(&mut self) {
        self.end_transaction();
        self.pins.set_cs(true);
    }

    fn write_byte(&mut self, byte: u8) {
        for i in (0..8).rev() {
            self.clock_bit((byte >> i) & 1 != 0);
        }
    }

    fn delay_8(&mut self) {
        for _ in 0..8 {
            self.clock_bit(false);
        }
    }

    fn go(&mut self) {
        self.end_transaction();
    }

    fn read_data(&mut self) -> u32 {
        self.shift
    }

    fn delay_us(&mut self, us: u32) {
        self.pins.delay_us(us);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    /// Pins with MISO wired back to MOSI
    #[derive(Default)]
    struct LoopbackPins {
        cs: bool,
        sck: bool,
        mosi: bool,
        sampled: Vec<bool>,
        cs_edges: Vec<bool>,
    }

    impl BitbangPins for LoopbackPins {
        fn set_cs(&mut self, active: bool) {
            if self.cs != active {
                self.cs_edges.push(active);
            }
            self.cs = active;
        }

        fn set_sck(&mut self, high: bool) {
            if high && !self.sck && self.cs {
                self.sampled.push(self.mosi);
            }
            self.sck = high;
        }

        fn set_mosi(&mut self, high: bool) {
            self.mosi = high;
        }

        fn get_miso(&self) -> bool {
            self.mosi
        }

        fn half_period_delay(&self) {}
    }

    fn sampled_bytes(bits: &[bool]) -> Vec<u8> {
        bits.chunks(8)
            .map(|chunk| chunk.iter().fold(0u8, |acc, &b| (acc << 1) | b as u8))
            .collect()
    }

    #[test]
    fn test_write_byte_msb_first() {
        let mut t = PinTransport::new(LoopbackPins::default());
        t.begin();
        t.write_byte(0xA5);
        t.go();

        let pins = t.into_inner();
        assert_eq!(sampled_bytes(&pins.sampled), [0xA5]);
        assert_eq!(pins.cs_edges, [true, false]);
    }

    #[test]
    fn test_read_back_register_keeps_last_four_bytes() {
        let mut t = PinTransport::new(LoopbackPins::default());
        t.begin();
        t.write_byte(0x9F);
        t.send_address(0x12_3456);
        t.go();

        assert_eq!(t.read_data(), 0x9F12_3456);
    }

    #[test]
    fn test_delay_8_clocks_zeros() {
        let mut t = PinTransport::new(LoopbackPins::default());
        t.begin();
        t.write_byte(0xFF);
        t.delay_8();

        assert_eq!(t.read_data() & 0xFFFF, 0xFF00);
    }

    #[test]
    fn test_function_select_and_divisor() {
        let mut t = PinTransport::new(LoopbackPins::default());
        t.set_clock_divisor(0x43);
        t.set_function_select(true);
        assert!(t.function_select());
        assert_eq!(t.clock_divisor(), 0x43);

        t.begin();
        t.set_function_select(false);
        assert!(!t.function_select());
        assert!(!t.into_inner().cs);
    }
}
