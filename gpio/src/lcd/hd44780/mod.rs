//! HD44780 character LCD driver.
//!
//! The driver is split in three layers, each only talking to the one below it:
//!
//! - [Display] keeps the logical state of the screen (cursor index, text, display flags) and
//!   translates character indices to DDRAM addresses.
//! - [HD44780Controller] knows the controller's command set and runs the power-on
//!   initialization sequence from the datasheet.
//! - [HD44780Link] moves bits to the controller. [GpioHD44780Link] drives the pins directly, and
//!   [ExpanderHD44780Link] goes through an I²C 8-bit I/O expander, like the PCF8574 backpacks
//!   sold with most 16x2 modules.
//!
//! The controller is never read from. Every command is followed by a fixed delay long enough for
//! the slowest controllers, so the R/W line can be tied to ground.
//!
//! # Example
//!
//! ```no_run
//! use hd44780_gpio::delay::StdDelay;
//! use hd44780_gpio::lcd::hd44780::{Display, DisplayConfig, ExpanderHD44780Link, PinAssignment};
//! # fn run(i2c: impl embedded_hal::i2c::I2c) -> hd44780_gpio::lcd::hd44780::LcdResult<()> {
//! let link = ExpanderHD44780Link::new(i2c, 0x27, PinAssignment::PCF8574, StdDelay)?;
//! let mut display = Display::new(link, DisplayConfig::default())?;
//! display.write_text("Hello", Some(0))?;
//! display.write_char('!', Some(16))?;
//! # Ok(())
//! # }
//! ```
//!
//! # Sources
//!
//! - Hitachi, [“HD44780U (LCD-II) Dot Matrix Liquid Crystal Display Controller/Driver,”](https://www.sparkfun.com/datasheets/LCD/HD44780.pdf)
//!   rev. 0.0, 1998.

mod command;
mod config;
mod controller;
mod display;
mod link;
#[cfg(test)]
mod testing;

pub use command::*;
pub use config::*;
pub use controller::*;
pub use display::*;
pub use link::*;

use crate::GpioError;
use thiserror::Error;

/// Configuration problems. These are all caught before the bus is touched.
#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum ConfigError {
    #[error("the HD44780 can't drive two lines with 5x10 characters")]
    InvalidDisplayConfig,
    #[error("the link has a {link}-bit data bus, but {configured}-bit operation was configured")]
    BusWidthMismatch { link: u8, configured: u8 },
    #[error("{columns} columns don't fit a {rows}-row display")]
    InvalidColumns { columns: u8, rows: u8 },
    #[error("invalid pin assignment: {0}")]
    InvalidPinAssignment(&'static str),
}

#[derive(Debug, Error, Eq, PartialEq, Clone)]
pub enum LcdError {
    #[error("invalid display configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("transport error: {0}")]
    Transport(#[from] GpioError),
    #[error("index {index} is out of range for a display of {capacity} characters")]
    OutOfRange { index: usize, capacity: usize },
    #[error("the controller has not been initialized")]
    NotInitialized,
}

pub type LcdResult<T> = Result<T, LcdError>;
