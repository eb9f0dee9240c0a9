use crate::lcd::hd44780::{
    Direction, DisplayConfig, Geometry, HD44780Controller, HD44780Link, LcdError, LcdResult,
    PinRole,
};
use log::{debug, warn};

/// The user-visible flags of the display.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DisplayState {
    pub backlight: bool,
    pub display: bool,
    pub cursor: bool,
    pub cursor_blinking: bool,
}

impl From<&DisplayConfig> for DisplayState {
    fn from(config: &DisplayConfig) -> Self {
        DisplayState {
            backlight: config.backlight,
            display: config.display,
            cursor: config.cursor,
            cursor_blinking: config.cursor_blinking,
        }
    }
}

/// A character display, addressed by 0-based character index.
///
/// Indices run row by row, left to right, so on a 16x2 display index 16 is the first character
/// of the second row. The display keeps its own copy of what has been written, since the
/// controller is never read from.
///
/// Writes don't wrap: a write at the end of a row goes wherever the controller's address counter
/// points next, which usually isn't the next row. The display follows the address counter the
/// same way the controller does, so characters that end up off the glass aren't kept.
#[derive(Debug)]
pub struct Display<L> {
    controller: HD44780Controller<L>,
    geometry: Geometry,
    state: DisplayState,
    /// The controller's DDRAM address counter.
    address: u8,
    text: Vec<u8>,
}

impl<L: HD44780Link> Display<L> {
    /// Validates the configuration, initializes the controller (or attaches to it if
    /// [DisplayConfig::skip_initialization] is set) and applies the initial display state.
    ///
    /// The backlight is only set if the link has a backlight line.
    ///
    /// # Errors
    /// - [LcdError::Config] if the configuration is invalid or doesn't match the link. Nothing is
    ///   sent in that case.
    /// - [LcdError::Transport] if the link fails.
    pub fn new(link: L, config: DisplayConfig) -> LcdResult<Self> {
        let (mode, geometry) = config.validate()?;
        let controller = HD44780Controller::new(link, mode, config.entry_mode())?;

        let mut display = Display {
            controller,
            geometry,
            state: DisplayState::from(&config),
            address: 0,
            text: vec![b' '; geometry.capacity()],
        };

        if config.skip_initialization {
            display.controller.attach();
        } else {
            display.controller.init()?;
        }
        display.apply_state()?;

        Ok(display)
    }

    fn apply_state(&mut self) -> LcdResult<()> {
        if self.controller.link().supports(PinRole::Backlight) {
            self.controller
                .link_mut()
                .set_pin(PinRole::Backlight, self.state.backlight)?;
        }
        self.send_display_control(self.state)
    }

    fn send_display_control(&mut self, state: DisplayState) -> LcdResult<()> {
        self.controller
            .set_display_control(state.display, state.cursor, state.cursor_blinking)
    }

    fn out_of_range(&self, index: usize) -> LcdError {
        LcdError::OutOfRange {
            index,
            capacity: self.capacity(),
        }
    }

    /// The cell under the cursor. A cursor off the glass is reported as index `capacity`.
    fn current_index(&self) -> LcdResult<usize> {
        self.cursor_index()
            .ok_or_else(|| self.out_of_range(self.capacity()))
    }

    /// Moves the cursor to the given index. Index 0 uses the return home instruction.
    pub fn set_cursor(&mut self, index: usize) -> LcdResult<()> {
        let address = self
            .geometry
            .ddram_address(index)
            .ok_or_else(|| self.out_of_range(index))?;
        if address == 0 {
            self.controller.return_home()?;
        } else {
            self.controller.set_ddram_address(address)?;
        }
        self.address = address;
        Ok(())
    }

    /// Writes a character at the given index, or at the cursor if there's none.
    ///
    /// Only ASCII is supported, anything else is written as `?`.
    ///
    /// # Errors
    /// - [LcdError::OutOfRange] if the index is past the end, or if no index is given and the
    ///   cursor has moved off the glass. Nothing is sent in that case.
    pub fn write_char(&mut self, ch: char, index: Option<usize>) -> LcdResult<()> {
        match index {
            Some(index) => self.set_cursor(index)?,
            None => {
                self.current_index()?;
            }
        }
        self.put(ch)
    }

    /// Sends a character at the address counter and follows the counter to its next address.
    fn put(&mut self, ch: char) -> LcdResult<()> {
        let byte = if ch.is_ascii() {
            ch as u8
        } else {
            warn!("Can't display {:?}, writing '?' instead", ch);
            b'?'
        };
        self.controller.send_data(byte)?;

        if let Some(index) = self.cursor_index() {
            self.text[index] = byte;
        }
        self.address = self.geometry.next_address(self.address, self.write_direction());
        Ok(())
    }

    fn write_direction(&self) -> Direction {
        if self.controller.entry_mode().increment {
            Direction::Right
        } else {
            Direction::Left
        }
    }

    /// Writes a string starting at the given index, or at the cursor if there's none.
    ///
    /// Characters follow the address counter, so a string running past the end of a row doesn't
    /// continue on the next one.
    ///
    /// # Errors
    /// - [LcdError::OutOfRange] if the text doesn't fit before the end of the display. Nothing is
    ///   sent in that case.
    pub fn write_text(&mut self, text: &str, start: Option<usize>) -> LcdResult<()> {
        let length = text.chars().count();
        if length == 0 {
            return Ok(());
        }
        let first = match start {
            Some(start) => start,
            None => self.current_index()?,
        };
        self.check_run(first, length)?;

        if let Some(start) = start {
            self.set_cursor(start)?;
        }
        for ch in text.chars() {
            self.put(ch)?;
        }
        Ok(())
    }

    fn check_run(&self, start: usize, length: usize) -> LcdResult<()> {
        let last = if self.controller.entry_mode().increment {
            Some(start + length - 1)
        } else {
            start.checked_sub(length - 1)
        };
        match last {
            Some(last) if start < self.capacity() && last < self.capacity() => Ok(()),
            Some(last) => Err(self.out_of_range(start.max(last))),
            None => Err(self.out_of_range(start)),
        }
    }

    /// Clears the display and moves the cursor to the start.
    pub fn clear(&mut self) -> LcdResult<()> {
        self.controller.clear_display()?;
        debug!("Display cleared");
        self.text.fill(b' ');
        self.address = 0;
        Ok(())
    }

    /// Moves the cursor to the start and undoes any display shift. The text is kept.
    pub fn home(&mut self) -> LcdResult<()> {
        self.controller.return_home()?;
        self.address = 0;
        Ok(())
    }

    /// Moves the cursor by one character.
    ///
    /// The cursor shift instruction is used when the address counter lands on the target cell by
    /// itself. Otherwise, like when crossing into another row, the cursor is re-addressed.
    ///
    /// # Errors
    /// - [LcdError::OutOfRange] when moving left from 0, right from the last cell, or when the
    ///   cursor is off the glass.
    pub fn move_cursor(&mut self, direction: Direction) -> LcdResult<()> {
        let current = self.current_index()?;
        let target = match direction {
            Direction::Left => current.checked_sub(1),
            Direction::Right => Some(current + 1),
        };
        let Some(target) = target.filter(|&index| index < self.capacity()) else {
            return Err(self.out_of_range(current));
        };

        let next = self.geometry.next_address(self.address, direction);
        if self.geometry.index_of(next) != Some(target) {
            return self.set_cursor(target);
        }
        self.controller.cursor_shift(false, direction)?;
        self.address = next;
        Ok(())
    }

    /// Shifts the whole display by one character. The cursor index and the text are unaffected.
    pub fn shift_display(&mut self, direction: Direction) -> LcdResult<()> {
        self.controller.cursor_shift(true, direction)
    }

    /// Runs the initialization sequence again and re-applies the display state.
    ///
    /// This is the way to recover after a transport error left the controller in an unknown
    /// state. The screen ends up empty.
    pub fn reinitialize(&mut self) -> LcdResult<()> {
        self.controller.init()?;
        self.text.fill(b' ');
        self.address = 0;
        self.apply_state()
    }

    /// Switches the backlight.
    ///
    /// # Errors
    /// - [LcdError::Transport] with `GpioError::NotSupported` if the link has no backlight line.
    pub fn set_backlight_enabled(&mut self, enabled: bool) -> LcdResult<()> {
        self.controller
            .link_mut()
            .set_pin(PinRole::Backlight, enabled)?;
        self.state.backlight = enabled;
        Ok(())
    }

    pub fn set_display_enabled(&mut self, enabled: bool) -> LcdResult<()> {
        self.update_display_control(DisplayState {
            display: enabled,
            ..self.state
        })
    }

    pub fn set_cursor_enabled(&mut self, enabled: bool) -> LcdResult<()> {
        self.update_display_control(DisplayState {
            cursor: enabled,
            ..self.state
        })
    }

    pub fn set_cursor_blinking_enabled(&mut self, enabled: bool) -> LcdResult<()> {
        self.update_display_control(DisplayState {
            cursor_blinking: enabled,
            ..self.state
        })
    }

    fn update_display_control(&mut self, state: DisplayState) -> LcdResult<()> {
        self.send_display_control(state)?;
        self.state = state;
        Ok(())
    }

    pub fn backlight_enabled(&self) -> bool {
        self.state.backlight
    }

    pub fn display_enabled(&self) -> bool {
        self.state.display
    }

    pub fn cursor_enabled(&self) -> bool {
        self.state.cursor
    }

    pub fn cursor_blinking_enabled(&self) -> bool {
        self.state.cursor_blinking
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Number of character cells.
    pub fn capacity(&self) -> usize {
        self.geometry.capacity()
    }

    /// Where the next character goes if no index is given, or `None` if the address counter has
    /// moved off the glass, e.g. after writing the last cell of a row.
    pub fn cursor_index(&self) -> Option<usize> {
        self.geometry.index_of(self.address)
    }

    /// The controller's DDRAM address counter, as far as the display can tell.
    pub fn address_counter(&self) -> u8 {
        self.address
    }

    /// Everything written since the last clear, row after row. Unwritten cells are spaces.
    pub fn text(&self) -> String {
        self.text.iter().map(|&b| b as char).collect()
    }

    pub fn row_text(&self, row: usize) -> Option<String> {
        let columns = self.geometry.columns() as usize;
        self.text
            .chunks(columns)
            .nth(row)
            .map(|row| row.iter().map(|&b| b as char).collect())
    }

    pub fn controller(&self) -> &HD44780Controller<L> {
        &self.controller
    }

    /// Gives back the link. The display is left as it is.
    pub fn release(self) -> L {
        self.controller.release()
    }
}
