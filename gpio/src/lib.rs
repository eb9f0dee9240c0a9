//! GPIO plumbing and the HD44780 character display driver built on top of it.
//!
//! The [lcd::hd44780] module holds the display driver itself. The traits in this module describe
//! the output-only GPIO capability the direct-wired link needs, and [gpiod] provides a Linux
//! implementation of them.
pub mod delay;
pub mod gpiod;
pub mod lcd;

use std::fmt::Debug;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum GpioError {
    #[error("pin already in use")]
    AlreadyInUse,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("the feature is not supported on this backend")]
    NotSupported,
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),
    #[error("I2C error: {0:?}")]
    I2c(embedded_hal::i2c::ErrorKind),
}

impl From<std::io::Error> for GpioError {
    fn from(err: std::io::Error) -> Self {
        GpioError::Io(err.kind())
    }
}

impl GpioError {
    /// Wraps any `embedded-hal` I2C error, keeping its kind.
    pub fn from_i2c<E: embedded_hal::i2c::Error>(err: E) -> Self {
        GpioError::I2c(err.kind())
    }
}

pub type GpioResult<T> = Result<T, GpioError>;

pub trait GpioDriver: Debug {
    /// Gets the amount of GPIO lines available.
    fn count(&self) -> GpioResult<usize>;

    /// Claims the GPIO pin at the given index.
    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>>;

    /// Claims the GPIO pins at the given indices as a single bus.
    fn get_pin_bus<const N: usize>(
        &self,
        indices: [usize; N],
    ) -> GpioResult<Box<dyn GpioBus<N> + '_>>;
}

/// Specifies the active level of a GPIO line.
///
/// By default, the active level is high.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum GpioActiveLevel {
    #[default] High,
    Low,
}

pub trait GpioPin: Debug {
    /// Configures the pin as an output, allowing writing its state.
    fn as_output(&mut self) -> GpioResult<Box<dyn GpioOutput + '_>>;

    /// Gets whether the pin supports configuring its active level.
    fn supports_active_level(&self) -> bool {
        false
    }
    /// Gets the active level of the pin.
    fn active_level(&self) -> GpioActiveLevel {
        GpioActiveLevel::High
    }
    /// Sets the active level of the pin.
    ///
    /// # Errors
    /// - `GpioError::NotSupported` if the pin does not support active level.
    fn set_active_level(&mut self, _level: GpioActiveLevel) -> GpioResult<()> {
        Err(GpioError::NotSupported)
    }
}

pub trait GpioOutput: Debug {
    /// Writes the state of the GPIO line.
    fn write(&self, value: bool) -> GpioResult<()>;
}

pub trait GpioBus<const N: usize>: Debug {
    fn as_output(&mut self) -> GpioResult<Box<dyn GpioBusOutput<N> + '_>>;

    fn supports_active_level(&self) -> bool {
        false
    }
    fn active_level(&self) -> GpioActiveLevel {
        GpioActiveLevel::High
    }
    fn set_active_level(&mut self, _level: GpioActiveLevel) -> GpioResult<()> {
        Err(GpioError::NotSupported)
    }
}

pub trait GpioBusOutput<const N: usize>: Debug {
    /// Writes all lines of the bus at once, first line first.
    fn write(&self, values: &[bool; N]) -> GpioResult<()>;
}

impl dyn GpioBusOutput<8> + '_ {
    /// Writes a byte to the bus, LSb on the first line.
    pub fn write_byte(&self, value: u8) -> GpioResult<()> {
        let values = std::array::from_fn(|i| value & (1 << i) != 0);
        self.write(&values)
    }
}

impl dyn GpioBusOutput<4> + '_ {
    /// Writes a nibble to the bus, LSb on the first line.
    pub fn write_nibble(&self, value: u8) -> GpioResult<()> {
        if value > 0b1111 {
            return Err(GpioError::InvalidArgument);
        }

        let values = std::array::from_fn(|i| value & (1 << i) != 0);
        self.write(&values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Default)]
    struct Bus<const N: usize> {
        written: RefCell<Vec<[bool; N]>>,
    }

    impl<const N: usize> GpioBusOutput<N> for Bus<N> {
        fn write(&self, values: &[bool; N]) -> GpioResult<()> {
            self.written.borrow_mut().push(*values);
            Ok(())
        }
    }

    #[test]
    fn nibble_is_written_lsb_first() {
        let bus = Bus::<4>::default();
        let output: &dyn GpioBusOutput<4> = &bus;
        output.write_nibble(0b0010).unwrap();
        assert_eq!(bus.written.borrow()[0], [false, true, false, false]);
    }

    #[test]
    fn nibble_rejects_wide_values() {
        let bus = Bus::<4>::default();
        let output: &dyn GpioBusOutput<4> = &bus;
        assert_eq!(output.write_nibble(0x10), Err(GpioError::InvalidArgument));
        assert!(bus.written.borrow().is_empty());
    }

    #[test]
    fn byte_is_written_lsb_first() {
        let bus = Bus::<8>::default();
        let output: &dyn GpioBusOutput<8> = &bus;
        output.write_byte(0x81).unwrap();
        assert_eq!(
            bus.written.borrow()[0],
            [true, false, false, false, false, false, false, true]
        );
    }
}
