use crate::lcd::hd44780::link::DEFAULT_PULSE_WIDTH_US;
use crate::lcd::hd44780::{BitWidth, HD44780Link, PinRole};
use crate::{GpioBusOutput, GpioError, GpioOutput, GpioResult};
use embedded_hal::delay::DelayNs;
use std::fmt::{Debug, Formatter};

#[derive(Debug)]
pub enum GpioHD44780Bus<'a> {
    Bus8Bit(&'a dyn GpioBusOutput<8>),
    Bus4Bit(&'a dyn GpioBusOutput<4>),
}

impl GpioHD44780Bus<'_> {
    pub fn is_8bit(&self) -> bool {
        matches!(self, GpioHD44780Bus::Bus8Bit(_))
    }

    pub fn is_4bit(&self) -> bool {
        matches!(self, GpioHD44780Bus::Bus4Bit(_))
    }
}

/// Link with every controller pin wired to its own GPIO line.
///
/// Unlike the expander, every line is written on its own, so changing RS doesn't touch the data
/// bus and vice versa.
pub struct GpioHD44780Link<'a, D> {
    pin_e: &'a dyn GpioOutput,
    pin_rw: Option<&'a dyn GpioOutput>,
    pin_rs: &'a dyn GpioOutput,
    pin_backlight: Option<&'a dyn GpioOutput>,
    data_bus: GpioHD44780Bus<'a>,
    delay: D,
    pulse_width_us: u32,
}

impl<'a, D: DelayNs> GpioHD44780Link<'a, D> {
    /// Creates a new link using a 4-bit data bus (D4–D7, in this order).
    ///
    /// # Parameters
    ///
    /// - `pin_e`: Enable output pin.
    /// - `pin_rw`: Optional read/write output pin. It's only ever driven low, so leaving it out and
    ///   tying R/W to GND works just as well.
    /// - `pin_rs`: Register select output pin.
    /// - `pin_backlight`: Optional output switching the backlight.
    /// - `data_bus`: The data lines.
    /// - `delay`: Used for the E pulse and for waiting on the controller.
    pub fn new_4bit(
        pin_e: &'a dyn GpioOutput,
        pin_rw: Option<&'a dyn GpioOutput>,
        pin_rs: &'a dyn GpioOutput,
        pin_backlight: Option<&'a dyn GpioOutput>,
        data_bus: &'a dyn GpioBusOutput<4>,
        delay: D,
    ) -> Self {
        Self::new(pin_e, pin_rw, pin_rs, pin_backlight, GpioHD44780Bus::Bus4Bit(data_bus), delay)
    }

    /// Creates a new link using an 8-bit data bus (D0–D7, in this order). See
    /// [GpioHD44780Link::new_4bit] for the parameters.
    pub fn new_8bit(
        pin_e: &'a dyn GpioOutput,
        pin_rw: Option<&'a dyn GpioOutput>,
        pin_rs: &'a dyn GpioOutput,
        pin_backlight: Option<&'a dyn GpioOutput>,
        data_bus: &'a dyn GpioBusOutput<8>,
        delay: D,
    ) -> Self {
        Self::new(pin_e, pin_rw, pin_rs, pin_backlight, GpioHD44780Bus::Bus8Bit(data_bus), delay)
    }

    fn new(
        pin_e: &'a dyn GpioOutput,
        pin_rw: Option<&'a dyn GpioOutput>,
        pin_rs: &'a dyn GpioOutput,
        pin_backlight: Option<&'a dyn GpioOutput>,
        data_bus: GpioHD44780Bus<'a>,
        delay: D,
    ) -> Self {
        GpioHD44780Link {
            pin_e,
            pin_rw,
            pin_rs,
            pin_backlight,
            data_bus,
            delay,
            pulse_width_us: DEFAULT_PULSE_WIDTH_US,
        }
    }

    pub fn with_pulse_width(mut self, pulse_width_us: u32) -> Self {
        self.pulse_width_us = pulse_width_us;
        self
    }

    fn pin(&self, role: PinRole) -> Option<&'a dyn GpioOutput> {
        match role {
            PinRole::RegisterSelect => Some(self.pin_rs),
            PinRole::ReadWrite => self.pin_rw,
            PinRole::Enable => Some(self.pin_e),
            PinRole::Backlight => self.pin_backlight,
        }
    }
}

impl<D> Debug for GpioHD44780Link<'_, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpioHD44780Link")
            .field("pin_e", &self.pin_e)
            .field("pin_rw", &self.pin_rw)
            .field("pin_rs", &self.pin_rs)
            .field("pin_backlight", &self.pin_backlight)
            .field("data_bus", &self.data_bus)
            .finish_non_exhaustive()
    }
}

impl<D: DelayNs> HD44780Link for GpioHD44780Link<'_, D> {
    fn bus_width(&self) -> BitWidth {
        if self.data_bus.is_8bit() {
            BitWidth::Eight
        } else {
            BitWidth::Four
        }
    }

    fn supports(&self, role: PinRole) -> bool {
        self.pin(role).is_some()
    }

    fn set_pin(&mut self, role: PinRole, state: bool) -> GpioResult<()> {
        self.pin(role).ok_or(GpioError::NotSupported)?.write(state)
    }

    fn write_data_lines(&mut self, value: u8) -> GpioResult<()> {
        match self.data_bus {
            GpioHD44780Bus::Bus8Bit(bus) => bus.write_byte(value),
            GpioHD44780Bus::Bus4Bit(bus) => bus.write_nibble(value & 0x0F),
        }
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    fn pulse_width_us(&self) -> u32 {
        self.pulse_width_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcd::hd44780::testing::{GpioEvent, GpioLog, RecordingBus, RecordingDelay, RecordingPin};

    struct Pins {
        log: GpioLog,
        e: RecordingPin,
        rs: RecordingPin,
        backlight: RecordingPin,
        bus: RecordingBus,
    }

    impl Pins {
        fn new() -> Self {
            let log = GpioLog::default();
            let pin = |name| RecordingPin { name, log: log.clone() };
            Pins {
                e: pin("E"),
                rs: pin("RS"),
                backlight: pin("A"),
                bus: RecordingBus { log: log.clone() },
                log,
            }
        }

        fn events(&self) -> Vec<GpioEvent> {
            self.log.borrow().clone()
        }
    }

    fn bits(value: u8, n: usize) -> GpioEvent {
        GpioEvent::Bus((0..n).map(|i| value & (1 << i) != 0).collect())
    }

    #[test]
    fn four_bit_byte_goes_out_as_two_nibbles() {
        let pins = Pins::new();
        let mut link = GpioHD44780Link::new_4bit(
            &pins.e,
            None,
            &pins.rs,
            None,
            &pins.bus,
            RecordingDelay::default(),
        );
        assert_eq!(link.bus_width(), BitWidth::Four);

        link.set_pin(PinRole::RegisterSelect, true).unwrap();
        link.send_byte(b'A', 60).unwrap();
        link.set_pin(PinRole::RegisterSelect, false).unwrap();

        assert_eq!(
            pins.events(),
            vec![
                GpioEvent::Pin("RS", true),
                bits(0x4, 4),
                GpioEvent::Pin("E", false),
                GpioEvent::Pin("E", true),
                GpioEvent::Pin("E", false),
                bits(0x1, 4),
                GpioEvent::Pin("E", false),
                GpioEvent::Pin("E", true),
                GpioEvent::Pin("E", false),
                GpioEvent::Pin("RS", false),
            ]
        );
    }

    #[test]
    fn eight_bit_byte_goes_out_at_once() {
        let pins = Pins::new();
        let mut link = GpioHD44780Link::new_8bit(
            &pins.e,
            None,
            &pins.rs,
            None,
            &pins.bus,
            RecordingDelay::default(),
        );
        assert_eq!(link.bus_width(), BitWidth::Eight);

        link.send_byte(0x38, 60).unwrap();
        assert_eq!(pins.events()[0], bits(0x38, 8));
        assert_eq!(pins.events().len(), 4);
    }

    #[test]
    fn optional_pins() {
        let pins = Pins::new();
        let mut link = GpioHD44780Link::new_4bit(
            &pins.e,
            None,
            &pins.rs,
            Some(&pins.backlight),
            &pins.bus,
            RecordingDelay::default(),
        );
        assert!(link.supports(PinRole::Backlight));
        assert!(!link.supports(PinRole::ReadWrite));
        assert_eq!(link.set_pin(PinRole::ReadWrite, false), Err(GpioError::NotSupported));

        link.set_pin(PinRole::Backlight, true).unwrap();
        assert_eq!(pins.events(), vec![GpioEvent::Pin("A", true)]);
    }
}
