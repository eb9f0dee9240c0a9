use crate::lcd::hd44780::link::DEFAULT_PULSE_WIDTH_US;
use crate::lcd::hd44780::{BitWidth, ConfigError, HD44780Link, PinAssignment, PinRole};
use crate::{GpioError, GpioResult};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::trace;
use std::fmt::{Debug, Formatter};

/// The address most PCF8574 backpacks ship with. PCF8574A-based ones usually sit at `0x3F`.
pub const DEFAULT_EXPANDER_ADDRESS: u8 = 0x27;

/// Link through an 8-bit I²C I/O expander, like the PCF8574 on most LCD backpacks.
///
/// The expander has no per-pin access: its outputs only change when a whole byte is written.
/// The link therefore keeps the last written byte, and every change of a line writes the full
/// byte again before returning. Since all eight outputs are taken by RS, R/W, E, the backlight
/// and D4–D7, only 4-bit operation is possible.
pub struct ExpanderHD44780Link<I, D> {
    i2c: I,
    address: u8,
    pins: PinAssignment<4>,
    byte: u8,
    delay: D,
    pulse_width_us: u32,
}

impl<I: I2c, D: DelayNs> ExpanderHD44780Link<I, D> {
    /// Creates a new link, with every expander output starting low.
    ///
    /// Nothing is written to the bus until the first line changes.
    ///
    /// # Parameters
    ///
    /// - `i2c`: The bus the expander is on.
    /// - `address`: 7-bit address of the expander, see [DEFAULT_EXPANDER_ADDRESS].
    /// - `pins`: Bit positions of each role in the expander byte, see [PinAssignment::PCF8574].
    /// - `delay`: Used for the E pulse and for waiting on the controller.
    ///
    /// # Errors
    /// - [ConfigError::InvalidPinAssignment] if a position is past bit 7 or shared by two roles.
    pub fn new(i2c: I, address: u8, pins: PinAssignment<4>, delay: D) -> Result<Self, ConfigError> {
        Self::with_initial_byte(i2c, address, pins, delay, 0)
    }

    /// Like [ExpanderHD44780Link::new], but starts from a known byte instead of all-low.
    pub fn with_initial_byte(
        i2c: I,
        address: u8,
        pins: PinAssignment<4>,
        delay: D,
        byte: u8,
    ) -> Result<Self, ConfigError> {
        pins.validate_bits()?;
        Ok(ExpanderHD44780Link {
            i2c,
            address,
            pins,
            byte,
            delay,
            pulse_width_us: DEFAULT_PULSE_WIDTH_US,
        })
    }

    pub fn with_pulse_width(mut self, pulse_width_us: u32) -> Self {
        self.pulse_width_us = pulse_width_us;
        self
    }

    /// The byte last written to the expander (or about to be, before the first write).
    pub fn control_byte(&self) -> u8 {
        self.byte
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Gives back the bus and the delay.
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }

    fn set_bit(&mut self, bit: usize, state: bool) {
        if state {
            self.byte |= 1 << bit;
        } else {
            self.byte &= !(1 << bit);
        }
    }

    /// Writes the whole control byte to the expander.
    fn flush(&mut self) -> GpioResult<()> {
        trace!("Expander {:#04x} <- {:08b}", self.address, self.byte);
        self.i2c
            .write(self.address, &[self.byte])
            .map_err(GpioError::from_i2c)
    }
}

impl<I, D> Debug for ExpanderHD44780Link<I, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ExpanderHD44780Link({:#04x}, {:08b})", self.address, self.byte)
    }
}

impl<I: I2c, D: DelayNs> HD44780Link for ExpanderHD44780Link<I, D> {
    fn bus_width(&self) -> BitWidth {
        BitWidth::Four
    }

    fn supports(&self, role: PinRole) -> bool {
        self.pins.get(role).is_some()
    }

    fn set_pin(&mut self, role: PinRole, state: bool) -> GpioResult<()> {
        let bit = self.pins.get(role).ok_or(GpioError::NotSupported)?;
        self.set_bit(bit, state);
        self.flush()
    }

    fn write_data_lines(&mut self, value: u8) -> GpioResult<()> {
        for (i, bit) in self.pins.data.into_iter().enumerate() {
            self.set_bit(bit, value & (1 << i) != 0);
        }
        self.flush()
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    fn pulse_width_us(&self) -> u32 {
        self.pulse_width_us
    }
}
