//! Recording test doubles for every layer of the driver.
use crate::lcd::hd44780::{BitWidth, HD44780Link, PinRole};
use crate::{GpioBusOutput, GpioError, GpioOutput, GpioResult};
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum Op {
    Pin(PinRole, bool),
    Data(u8),
    Delay(u32),
}

/// Shared view of everything a [RecordingLink] did, kept alive after the link is moved away.
#[derive(Debug, Clone, Default)]
pub(crate) struct OpLog(Rc<RefCell<Vec<Op>>>);

impl OpLog {
    fn push(&self, op: Op) {
        self.0.borrow_mut().push(op);
    }

    pub fn ops(&self) -> Vec<Op> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn delays(&self) -> Vec<u32> {
        self.0
            .borrow()
            .iter()
            .filter_map(|op| match op {
                Op::Delay(us) => Some(*us),
                _ => None,
            })
            .collect()
    }

    /// What the controller latched on every falling edge of E, as `(RS, data lines)`.
    pub fn pulses(&self) -> Vec<(bool, u8)> {
        let mut latched = Vec::new();
        let (mut rs, mut enable, mut data) = (false, false, 0);
        for op in self.0.borrow().iter() {
            match *op {
                Op::Pin(PinRole::RegisterSelect, state) => rs = state,
                Op::Pin(PinRole::Enable, state) => {
                    if enable && !state {
                        latched.push((rs, data));
                    }
                    enable = state;
                }
                Op::Data(value) => data = value,
                _ => {}
            }
        }
        latched
    }

    /// [OpLog::pulses] of a 4-bit bus, paired back into bytes.
    pub fn bytes(&self) -> Vec<(bool, u8)> {
        self.pulses()
            .chunks(2)
            .map(|pair| (pair[0].0, pair[0].1 << 4 | pair[1].1))
            .collect()
    }
}

#[derive(Debug)]
pub(crate) struct RecordingLink {
    log: OpLog,
    width: BitWidth,
    backlight: bool,
    writes: usize,
    fail_after: Option<usize>,
}

impl RecordingLink {
    pub fn new(width: BitWidth) -> (Self, OpLog) {
        let log = OpLog::default();
        let link = RecordingLink {
            log: log.clone(),
            width,
            backlight: true,
            writes: 0,
            fail_after: None,
        };
        (link, log)
    }

    pub fn without_backlight(mut self) -> Self {
        self.backlight = false;
        self
    }

    /// Lets `writes` more line writes through, and fails every one after that.
    pub fn fail_after(&mut self, writes: usize) {
        self.writes = 0;
        self.fail_after = Some(writes);
    }

    fn write(&mut self, op: Op) -> GpioResult<()> {
        if self.fail_after.is_some_and(|limit| self.writes >= limit) {
            return Err(GpioError::Io(std::io::ErrorKind::BrokenPipe));
        }
        self.writes += 1;
        self.log.push(op);
        Ok(())
    }
}

impl HD44780Link for RecordingLink {
    fn bus_width(&self) -> BitWidth {
        self.width
    }

    fn supports(&self, role: PinRole) -> bool {
        role != PinRole::Backlight || self.backlight
    }

    fn set_pin(&mut self, role: PinRole, state: bool) -> GpioResult<()> {
        if !self.supports(role) {
            return Err(GpioError::NotSupported);
        }
        self.write(Op::Pin(role, state))
    }

    fn write_data_lines(&mut self, value: u8) -> GpioResult<()> {
        self.write(Op::Data(value))
    }

    fn delay_us(&mut self, us: u32) {
        self.log.push(Op::Delay(us));
    }
}

/// I2C bus that keeps every write, or fails all of them.
#[derive(Debug, Default)]
pub(crate) struct RecordingI2c {
    pub writes: Vec<(u8, Vec<u8>)>,
    pub fail_with: Option<ErrorKind>,
}

impl RecordingI2c {
    /// Every byte written, in order, regardless of address.
    pub fn bytes(&self) -> Vec<u8> {
        self.writes.iter().flat_map(|(_, bytes)| bytes.iter().copied()).collect()
    }
}

impl ErrorType for RecordingI2c {
    type Error = ErrorKind;
}

impl I2c for RecordingI2c {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        if let Some(kind) = self.fail_with {
            return Err(kind);
        }
        for operation in operations.iter() {
            if let Operation::Write(bytes) = operation {
                self.writes.push((address, bytes.to_vec()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingDelay {
    pub delays_us: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays_us.push(ns.div_ceil(1000));
    }

    fn delay_us(&mut self, us: u32) {
        self.delays_us.push(us);
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum GpioEvent {
    Pin(&'static str, bool),
    Bus(Vec<bool>),
}

pub(crate) type GpioLog = Rc<RefCell<Vec<GpioEvent>>>;

#[derive(Debug)]
pub(crate) struct RecordingPin {
    pub name: &'static str,
    pub log: GpioLog,
}

impl GpioOutput for RecordingPin {
    fn write(&self, value: bool) -> GpioResult<()> {
        self.log.borrow_mut().push(GpioEvent::Pin(self.name, value));
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct RecordingBus {
    pub log: GpioLog,
}

impl<const N: usize> GpioBusOutput<N> for RecordingBus {
    fn write(&self, values: &[bool; N]) -> GpioResult<()> {
        self.log.borrow_mut().push(GpioEvent::Bus(values.to_vec()));
        Ok(())
    }
}
