mod expander;
mod gpio;

pub use expander::*;
pub use gpio::*;

use crate::GpioResult;
use crate::lcd::hd44780::{BitWidth, PinRole};
use log::trace;
use std::fmt::Debug;

/// Default time each level of the E pulse is held for. The datasheet asks for 450 ns, but sleeps
/// shorter than a microsecond aren't worth relying on.
pub const DEFAULT_PULSE_WIDTH_US: u32 = 1;

/// The lowest layer of the driver: moves bits to the controller.
///
/// Implementations only have to drive single lines and the data bus. Splitting bytes into
/// nibbles and pulsing the E line is shared, and implemented by the provided methods.
///
/// Nothing is ever read back, so implementations only need output lines.
pub trait HD44780Link: Debug {
    /// Width of the connected data bus.
    fn bus_width(&self) -> BitWidth;

    /// Gets whether the link has a line for the given role. RS and E are always there, R/W and
    /// backlight are optional.
    fn supports(&self, role: PinRole) -> bool;

    /// Sets a single control line. Doesn't pulse E.
    ///
    /// # Errors
    /// - `GpioError::NotSupported` if the role isn't connected, see [HD44780Link::supports].
    fn set_pin(&mut self, role: PinRole, state: bool) -> GpioResult<()>;

    /// Puts a value on the data lines, LSb on the lowest connected line. In 4-bit operation only
    /// the low nibble is used. Doesn't pulse E.
    fn write_data_lines(&mut self, value: u8) -> GpioResult<()>;

    /// Blocks for at least the given time.
    fn delay_us(&mut self, us: u32);

    /// How long each level of the E pulse is held for.
    fn pulse_width_us(&self) -> u32 {
        DEFAULT_PULSE_WIDTH_US
    }

    /// Pulses E low, high and low again. The controller latches the data lines on the falling
    /// edge.
    fn pulse_enable(&mut self) -> GpioResult<()> {
        let width = self.pulse_width_us();
        self.set_pin(PinRole::Enable, false)?;
        self.delay_us(width);
        self.set_pin(PinRole::Enable, true)?;
        self.delay_us(width);
        self.set_pin(PinRole::Enable, false)?;
        self.delay_us(width);
        Ok(())
    }

    /// Sends a whole byte and waits `post_delay_us` for the controller to process it.
    ///
    /// On a 4-bit bus the high nibble goes first, then the low nibble, each with its own E pulse.
    /// RS has to be set by the caller beforehand.
    fn send_byte(&mut self, byte: u8, post_delay_us: u32) -> GpioResult<()> {
        trace!("Sending byte: {:08b}", byte);

        match self.bus_width() {
            BitWidth::Four => {
                let high_nibble = (byte >> 4) & 0x0F;
                let low_nibble = byte & 0x0F;
                trace!("Writing HN: {:04b}", high_nibble);
                self.write_data_lines(high_nibble)?;
                self.pulse_enable()?;
                trace!("Writing LN: {:04b}", low_nibble);
                self.write_data_lines(low_nibble)?;
                self.pulse_enable()?;
            }
            BitWidth::Eight => {
                self.write_data_lines(byte)?;
                self.pulse_enable()?;
            }
        }

        self.delay_us(post_delay_us);
        Ok(())
    }

    /// Sends only the high nibble of an instruction (`nibble` is given in the low 4 bits), with
    /// one E pulse and no delay afterwards.
    ///
    /// Only used during initialization, while the controller's interface width isn't known yet.
    /// On an 8-bit bus the nibble goes to D4–D7 and D0–D3 are held low.
    fn send_raw_nibble(&mut self, nibble: u8) -> GpioResult<()> {
        let nibble = nibble & 0x0F;
        trace!("Sending raw nibble: {:04b}", nibble);

        let value = match self.bus_width() {
            BitWidth::Four => nibble,
            BitWidth::Eight => nibble << 4,
        };
        self.write_data_lines(value)?;
        self.pulse_enable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcd::hd44780::testing::{Op, RecordingLink};

    #[test]
    fn pulse_is_low_high_low() {
        let (mut link, log) = RecordingLink::new(BitWidth::Four);
        link.pulse_enable().unwrap();
        assert_eq!(
            log.ops(),
            vec![
                Op::Pin(PinRole::Enable, false),
                Op::Delay(1),
                Op::Pin(PinRole::Enable, true),
                Op::Delay(1),
                Op::Pin(PinRole::Enable, false),
                Op::Delay(1),
            ]
        );
    }

    #[test]
    fn every_byte_is_two_nibbles_high_first() {
        for byte in 0..=255u8 {
            let (mut link, log) = RecordingLink::new(BitWidth::Four);
            link.send_byte(byte, 60).unwrap();
            assert_eq!(
                log.pulses(),
                vec![(false, byte >> 4), (false, byte & 0x0F)],
                "byte {byte:#04x}"
            );
            assert_eq!(log.ops().last(), Some(&Op::Delay(60)));
        }
    }

    #[test]
    fn eight_bit_bus_pulses_once() {
        let (mut link, log) = RecordingLink::new(BitWidth::Eight);
        link.send_byte(0xA5, 40).unwrap();
        assert_eq!(log.pulses(), vec![(false, 0xA5)]);
        assert_eq!(log.ops().last(), Some(&Op::Delay(40)));
    }

    #[test]
    fn raw_nibble_has_no_trailing_delay() {
        let (mut link, log) = RecordingLink::new(BitWidth::Four);
        link.send_raw_nibble(0x3).unwrap();
        assert_eq!(log.pulses(), vec![(false, 0x3)]);
        assert_eq!(log.ops().iter().filter(|op| matches!(op, Op::Delay(_))).count(), 3);
    }

    #[test]
    fn raw_nibble_goes_to_upper_lines_on_eight_bit_bus() {
        let (mut link, log) = RecordingLink::new(BitWidth::Eight);
        link.send_raw_nibble(0x3).unwrap();
        assert_eq!(log.pulses(), vec![(false, 0x30)]);
    }

    #[test]
    fn failure_stops_the_byte() {
        let (mut link, log) = RecordingLink::new(BitWidth::Four);
        link.fail_after(2);
        assert!(link.send_byte(0x41, 60).is_err());
        assert!(log.pulses().is_empty());
        assert!(!log.ops().contains(&Op::Delay(60)));
    }
}
