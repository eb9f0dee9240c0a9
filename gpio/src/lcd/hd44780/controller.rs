use crate::lcd::hd44780::command::{self, Direction};
use crate::lcd::hd44780::{
    BitWidth, ConfigError, EntryMode, HD44780Link, LcdError, LcdResult, OperatingMode, PinRole,
};
use crate::GpioResult;
use log::{debug, trace, warn};

/// Time the controller needs after V<sub>CC</sub> reaches 4.5 V before it accepts anything.
pub const POWER_ON_DELAY_US: u32 = 15_000;
/// Wait after the first wake-up nibble.
pub const FIRST_WAKE_UP_DELAY_US: u32 = 4_100;
/// Wait after the second and third wake-up nibbles.
pub const WAKE_UP_DELAY_US: u32 = 100;
/// Wait after switching the interface to 4 bits.
pub const FOUR_BIT_SWITCH_DELAY_US: u32 = 1_000;
/// Wait after ordinary instructions and data writes. The datasheet gives 37 µs + 4 µs at 270 kHz.
pub const COMMAND_DELAY_US: u32 = 60;
/// Wait after clear display and return home. The datasheet gives 1.52 ms.
pub const CLEAR_DELAY_US: u32 = 3_000;

/// Where the power-on initialization sequence is at.
///
/// `Ready` is only reached after the whole sequence went through. A failure anywhere sends the
/// controller back to `Uninitialized`, as its interface width is unknown at that point.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InitState {
    Uninitialized,
    PoweredOn,
    /// The 8-bit function set nibble has been sent this many times.
    Set8BitFallback(u8),
    /// The controller runs with the target interface width.
    ModeLatched,
    FunctionConfigured,
    EntryConfigured,
    Ready,
}

/// The HD44780 protocol: initialization and instructions, on top of an [HD44780Link].
#[derive(Debug)]
pub struct HD44780Controller<L> {
    link: L,
    mode: OperatingMode,
    entry_mode: EntryMode,
    state: InitState,
}

impl<L: HD44780Link> HD44780Controller<L> {
    /// Wraps a link. Doesn't touch the bus, see [HD44780Controller::init] and
    /// [HD44780Controller::attach].
    ///
    /// # Errors
    /// - [ConfigError::BusWidthMismatch] if the link's data bus doesn't match the mode.
    pub fn new(link: L, mode: OperatingMode, entry_mode: EntryMode) -> Result<Self, ConfigError> {
        let width = link.bus_width();
        if width != mode.bit_width() {
            return Err(ConfigError::BusWidthMismatch {
                link: width.bits(),
                configured: mode.bit_width().bits(),
            });
        }
        Ok(HD44780Controller {
            link,
            mode,
            entry_mode,
            state: InitState::Uninitialized,
        })
    }

    pub fn state(&self) -> InitState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == InitState::Ready
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn entry_mode(&self) -> EntryMode {
        self.entry_mode
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn release(self) -> L {
        self.link
    }

    /// Runs the initialization sequence from the datasheet (figures 23 and 24).
    ///
    /// The controller might be in either interface width when this starts, or even halfway
    /// through a 4-bit transfer. Sending the 8-bit function set nibble three times brings it to
    /// 8-bit mode from any of those, after which the target mode is set. It's safe to run this
    /// any number of times.
    ///
    /// The display is left off and cleared, with the entry mode set.
    pub fn init(&mut self) -> LcdResult<()> {
        self.state = InitState::Uninitialized;
        match self.run_init() {
            Ok(()) => {
                debug!("HD44780 initialized: {:?}, {:?}", self.mode, self.entry_mode);
                Ok(())
            }
            Err(err) => {
                warn!("HD44780 initialization failed in {:?}: {}", self.state, err);
                self.state = InitState::Uninitialized;
                Err(err.into())
            }
        }
    }

    fn run_init(&mut self) -> GpioResult<()> {
        self.link.set_pin(PinRole::RegisterSelect, false)?;
        if self.link.supports(PinRole::ReadWrite) {
            self.link.set_pin(PinRole::ReadWrite, false)?;
        }

        self.link.delay_us(POWER_ON_DELAY_US);
        self.transition(InitState::PoweredOn);

        let wake_up_delays = [FIRST_WAKE_UP_DELAY_US, WAKE_UP_DELAY_US, WAKE_UP_DELAY_US];
        for (attempt, delay) in (1..).zip(wake_up_delays) {
            self.link.send_raw_nibble(command::WAKE_UP_NIBBLE)?;
            self.link.delay_us(delay);
            self.transition(InitState::Set8BitFallback(attempt));
        }

        if self.mode.bit_width() == BitWidth::Four {
            self.link.send_raw_nibble(command::FOUR_BIT_NIBBLE)?;
            self.link.delay_us(FOUR_BIT_SWITCH_DELAY_US);
        }
        self.transition(InitState::ModeLatched);

        self.link.send_byte(self.mode.function_set(), COMMAND_DELAY_US)?;
        self.transition(InitState::FunctionConfigured);

        self.link.send_byte(command::display_control(false, false, false), COMMAND_DELAY_US)?;
        self.link.send_byte(command::CLEAR_DISPLAY, CLEAR_DELAY_US)?;
        self.link.send_byte(self.entry_mode.command(), COMMAND_DELAY_US)?;
        self.transition(InitState::EntryConfigured);

        self.transition(InitState::Ready);
        Ok(())
    }

    fn transition(&mut self, state: InitState) {
        trace!("HD44780 init: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Takes over a controller that has already been initialized, e.g. by a previous run of the
    /// program. Nothing is sent.
    pub fn attach(&mut self) {
        debug!("Attaching to an initialized HD44780: {:?}", self.mode);
        self.state = InitState::Ready;
    }

    fn ensure_ready(&self) -> LcdResult<()> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(LcdError::NotInitialized)
        }
    }

    /// Sends an instruction (RS low) and waits for the controller to execute it.
    ///
    /// RS is expected to be low already, every data write leaves it that way.
    pub fn send_command(&mut self, command: u8) -> LcdResult<()> {
        self.ensure_ready()?;
        let delay = match command {
            command::CLEAR_DISPLAY | command::RETURN_HOME => CLEAR_DELAY_US,
            _ => COMMAND_DELAY_US,
        };
        self.link.send_byte(command, delay)?;
        Ok(())
    }

    /// Writes a byte to the DDRAM at the address counter, with RS high for the transfer.
    pub fn send_data(&mut self, data: u8) -> LcdResult<()> {
        self.ensure_ready()?;
        self.link.set_pin(PinRole::RegisterSelect, true)?;
        self.link.send_byte(data, COMMAND_DELAY_US)?;
        self.link.set_pin(PinRole::RegisterSelect, false)?;
        Ok(())
    }

    pub fn clear_display(&mut self) -> LcdResult<()> {
        self.send_command(command::CLEAR_DISPLAY)
    }

    pub fn return_home(&mut self) -> LcdResult<()> {
        self.send_command(command::RETURN_HOME)
    }

    pub fn set_display_control(&mut self, display_on: bool, cursor_on: bool, blink_on: bool) -> LcdResult<()> {
        self.send_command(command::display_control(display_on, cursor_on, blink_on))
    }

    pub fn cursor_shift(&mut self, display_shift: bool, direction: Direction) -> LcdResult<()> {
        self.send_command(command::cursor_shift(display_shift, direction))
    }

    /// # Errors
    /// - [LcdError::OutOfRange] if the address doesn't fit in 7 bits.
    pub fn set_ddram_address(&mut self, address: u8) -> LcdResult<()> {
        let command = command::set_ddram_address(address).ok_or(LcdError::OutOfRange {
            index: address as usize,
            capacity: command::DDRAM_ADDRESS_MAX as usize + 1,
        })?;
        self.send_command(command)
    }
}
