//! Output-only GPIO driver over the Linux GPIO character device, using the gpiod library.
//!
//! This is what the direct-wired HD44780 link runs on when the display hangs off the header pins
//! of a Linux board.
use crate::{
    GpioActiveLevel, GpioBus, GpioBusOutput, GpioDriver, GpioError, GpioOutput, GpioPin,
    GpioResult,
};
use bitvec::vec::BitVec;
use log::debug;
use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::sync::atomic::AtomicU8;

/// GPIO driver backed by a single gpiochip. Keeps track of claimed lines, so the same line can't
/// be handed out twice.
pub struct GpiodDriver {
    chip: gpiod::Chip,
    used_pins: BitVec<AtomicU8>,
}

impl GpiodDriver {
    pub fn new(chip: gpiod::Chip) -> Self {
        let n = chip.num_lines() as usize;
        Self {
            chip,
            used_pins: BitVec::repeat(false, n),
        }
    }

    /// Opens the chip at the given path, like `/dev/gpiochip0`.
    pub fn open(path: impl AsRef<Path>) -> GpioResult<Self> {
        let chip = gpiod::Chip::new(path.as_ref())?;
        debug!("Opened {} with {} lines", chip.name(), chip.num_lines());
        Ok(Self::new(chip))
    }

    fn claim(&self, indices: &[usize]) -> GpioResult<()> {
        let n = self.count()?;

        if indices.iter().any(|&index| index >= n) {
            return Err(GpioError::InvalidArgument);
        }

        if indices.iter().any(|&index| self.used_pins[index]) {
            return Err(GpioError::AlreadyInUse);
        }

        for &index in indices {
            self.used_pins.set_aliased(index, true);
        }
        Ok(())
    }

    fn release(&self, indices: &[usize]) {
        for &index in indices {
            self.used_pins.set_aliased(index, false);
        }
    }

    fn request_output<const N: usize>(
        &self,
        indices: [usize; N],
        active_level: GpioActiveLevel,
    ) -> GpioResult<gpiod::Lines<gpiod::Output>> {
        let lines = self.chip.request_lines(
            gpiod::Options::output(indices.map(|index| index as u32))
                .consumer(env!("CARGO_PKG_NAME"))
                .active(active_level.into()),
        )?;
        Ok(lines)
    }
}

impl Debug for GpiodDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "GpiodDriver({})", self.chip.name())
    }
}

impl GpioDriver for GpiodDriver {
    fn count(&self) -> GpioResult<usize> {
        Ok(self.chip.num_lines() as usize)
    }

    fn get_pin(&self, index: usize) -> GpioResult<Box<dyn GpioPin + '_>> {
        self.claim(&[index])?;

        Ok(Box::new(GpiodBus {
            driver: self,
            pin_indices: [index],
            active_level: GpioActiveLevel::High,
        }))
    }

    fn get_pin_bus<const N: usize>(
        &self,
        indices: [usize; N],
    ) -> GpioResult<Box<dyn GpioBus<N> + '_>> {
        self.claim(&indices)?;

        Ok(Box::new(GpiodBus {
            driver: self,
            pin_indices: indices,
            active_level: GpioActiveLevel::High,
        }))
    }
}

impl From<GpioActiveLevel> for gpiod::Active {
    fn from(level: GpioActiveLevel) -> Self {
        match level {
            GpioActiveLevel::High => gpiod::Active::High,
            GpioActiveLevel::Low => gpiod::Active::Low,
        }
    }
}

/// A set of claimed lines. A single pin is a bus of one.
struct GpiodBus<'a, const N: usize> {
    driver: &'a GpiodDriver,
    pin_indices: [usize; N],
    active_level: GpioActiveLevel,
}

impl<const N: usize> Debug for GpiodBus<'_, N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}{:?}", self.driver, self.pin_indices)
    }
}

impl GpioPin for GpiodBus<'_, 1> {
    fn as_output(&mut self) -> GpioResult<Box<dyn GpioOutput + '_>> {
        let lines = self.driver.request_output(self.pin_indices, self.active_level)?;
        Ok(Box::new(GpiodOutput { bus: self, lines }))
    }

    fn supports_active_level(&self) -> bool {
        true
    }

    fn active_level(&self) -> GpioActiveLevel {
        self.active_level
    }

    fn set_active_level(&mut self, level: GpioActiveLevel) -> GpioResult<()> {
        self.active_level = level;
        Ok(())
    }
}

impl<const N: usize> GpioBus<N> for GpiodBus<'_, N> {
    fn as_output(&mut self) -> GpioResult<Box<dyn GpioBusOutput<N> + '_>> {
        let lines = self.driver.request_output(self.pin_indices, self.active_level)?;
        Ok(Box::new(GpiodOutput { bus: self, lines }))
    }

    fn supports_active_level(&self) -> bool {
        true
    }

    fn active_level(&self) -> GpioActiveLevel {
        self.active_level
    }

    fn set_active_level(&mut self, level: GpioActiveLevel) -> GpioResult<()> {
        self.active_level = level;
        Ok(())
    }
}

impl<const N: usize> Drop for GpiodBus<'_, N> {
    fn drop(&mut self) {
        self.driver.release(&self.pin_indices);
    }
}

struct GpiodOutput<'a, const N: usize> {
    bus: &'a GpiodBus<'a, N>,
    lines: gpiod::Lines<gpiod::Output>,
}

impl<const N: usize> Debug for GpiodOutput<'_, N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}[output]", self.bus)
    }
}

impl GpioOutput for GpiodOutput<'_, 1> {
    fn write(&self, value: bool) -> GpioResult<()> {
        self.lines.set_values([value])?;
        Ok(())
    }
}

impl<const N: usize> GpioBusOutput<N> for GpiodOutput<'_, N> {
    fn write(&self, values: &[bool; N]) -> GpioResult<()> {
        self.lines.set_values(*values)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn open_accepts_any_path_like() {
        let missing = "/nonexistent/gpiochip-hd44780";
        assert!(GpiodDriver::open(missing).is_err());
        assert!(GpiodDriver::open(String::from(missing)).is_err());
        assert!(GpiodDriver::open(PathBuf::from(missing)).is_err());
        assert!(GpiodDriver::open(Path::new(missing)).is_err());
    }
}
