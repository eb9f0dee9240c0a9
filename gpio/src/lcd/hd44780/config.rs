use crate::lcd::hd44780::{command, ConfigError, Direction};
use serde::{Deserialize, Serialize};

/// Width of the data bus between the link and the controller.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum BitWidth {
    /// Only D4–D7 are connected, every byte is sent as two nibbles.
    #[default]
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "8")]
    Eight,
}

impl BitWidth {
    pub fn bits(self) -> u8 {
        match self {
            BitWidth::Four => 4,
            BitWidth::Eight => 8,
        }
    }
}

/// Number of character rows on the glass.
///
/// The controller itself only knows one- and two-line operation. Four-row modules run the
/// controller in two-line mode and split each of its 40-character lines between two rows.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Lines {
    One,
    #[default]
    Two,
    Four,
}

impl Lines {
    pub fn rows(self) -> u8 {
        match self {
            Lines::One => 1,
            Lines::Two => 2,
            Lines::Four => 4,
        }
    }

    /// Whether the controller runs in two-line mode (the `N` bit of function set).
    pub fn two_line_mode(self) -> bool {
        self != Lines::One
    }

    /// The longest row the DDRAM can hold for this layout.
    pub fn max_columns(self) -> u8 {
        match self {
            Lines::One => 80,
            Lines::Two => 40,
            Lines::Four => 20,
        }
    }
}

/// Character cell size. The eighth (or eleventh) dot row is taken by the cursor.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum MatrixSize {
    #[default]
    #[serde(rename = "5x7")]
    Dots5x7,
    #[serde(rename = "5x10")]
    Dots5x10,
}

/// Everything the function set instruction encodes.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct OperatingMode {
    bit_width: BitWidth,
    lines: Lines,
    matrix_size: MatrixSize,
}

impl OperatingMode {
    /// Checks the combination against what the controller can drive.
    ///
    /// # Errors
    /// - [ConfigError::InvalidDisplayConfig] for two-line operation with 5x10 characters.
    pub fn new(bit_width: BitWidth, lines: Lines, matrix_size: MatrixSize) -> Result<Self, ConfigError> {
        if lines.two_line_mode() && matrix_size == MatrixSize::Dots5x10 {
            return Err(ConfigError::InvalidDisplayConfig);
        }
        Ok(OperatingMode { bit_width, lines, matrix_size })
    }

    pub fn bit_width(&self) -> BitWidth {
        self.bit_width
    }

    pub fn lines(&self) -> Lines {
        self.lines
    }

    pub fn matrix_size(&self) -> MatrixSize {
        self.matrix_size
    }

    /// The function set instruction for this mode.
    pub fn function_set(&self) -> u8 {
        command::function_set(
            self.bit_width == BitWidth::Eight,
            self.lines.two_line_mode(),
            self.matrix_size == MatrixSize::Dots5x10,
        )
    }
}

/// The entry mode set during initialization.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct EntryMode {
    pub increment: bool,
    pub display_shift: bool,
}

impl EntryMode {
    pub fn command(&self) -> u8 {
        command::entry_mode_set(self.increment, self.display_shift)
    }
}

impl Default for EntryMode {
    fn default() -> Self {
        EntryMode {
            increment: true,
            display_shift: false,
        }
    }
}

/// Rows and columns of the glass, and how they map onto the DDRAM.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Geometry {
    lines: Lines,
    columns: u8,
}

impl Geometry {
    /// # Errors
    /// - [ConfigError::InvalidColumns] if there are no columns, or more than the DDRAM holds.
    pub fn new(lines: Lines, columns: u8) -> Result<Self, ConfigError> {
        if columns == 0 || columns > lines.max_columns() {
            return Err(ConfigError::InvalidColumns {
                columns,
                rows: lines.rows(),
            });
        }
        Ok(Geometry { lines, columns })
    }

    pub fn lines(&self) -> Lines {
        self.lines
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    pub fn rows(&self) -> u8 {
        self.lines.rows()
    }

    /// Number of character cells.
    pub fn capacity(&self) -> usize {
        self.columns as usize * self.rows() as usize
    }

    /// First DDRAM address of each row.
    ///
    /// The second controller line always starts at `0x40`, no matter how long the first one is.
    /// Four-row modules continue the first and second lines on the third and fourth rows.
    fn row_offset(&self, row: usize) -> u8 {
        match row {
            0 => 0x00,
            1 => 0x40,
            2 => self.columns,
            _ => 0x40 + self.columns,
        }
    }

    /// Translates a 0-based character index (row by row, left to right) into a DDRAM address.
    ///
    /// Returns `None` if the index is past the last cell.
    pub fn ddram_address(&self, index: usize) -> Option<u8> {
        if index >= self.capacity() {
            return None;
        }
        let columns = self.columns as usize;
        let (row, column) = (index / columns, index % columns);
        Some(self.row_offset(row) + column as u8)
    }

    /// The character index shown at a DDRAM address, if the address is on the glass at all.
    pub fn index_of(&self, address: u8) -> Option<usize> {
        let columns = self.columns as usize;
        (0..self.rows() as usize).find_map(|row| {
            let offset = self.row_offset(row);
            (address >= offset && address < offset + self.columns)
                .then(|| row * columns + (address - offset) as usize)
        })
    }

    /// Where the controller's address counter goes after a write or a cursor shift.
    ///
    /// In one-line mode the DDRAM is a single 80-character ring. In two-line mode each line holds
    /// 40 characters, and the counter runs from the end of one line into the start of the other.
    pub fn next_address(&self, address: u8, direction: Direction) -> u8 {
        if self.lines.two_line_mode() {
            match (address, direction) {
                (0x27, Direction::Right) => 0x40,
                (0x67, Direction::Right) => 0x00,
                (0x00, Direction::Left) => 0x67,
                (0x40, Direction::Left) => 0x27,
                (address, Direction::Right) => address + 1,
                (address, Direction::Left) => address - 1,
            }
        } else {
            match direction {
                Direction::Right => (address + 1) % 0x50,
                Direction::Left => address.checked_sub(1).unwrap_or(0x4F),
            }
        }
    }
}

/// Display configuration. Everything is checked by [DisplayConfig::validate] before the bus is
/// touched.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
#[serde(default)]
pub struct DisplayConfig {
    pub lines: Lines,
    pub columns: u8,
    pub matrix_size: MatrixSize,
    pub bit_width: BitWidth,
    /// Move the cursor right after every write.
    pub increment: bool,
    /// Shift the whole display on every write.
    pub display_shift: bool,
    /// Attach to a controller that has already been initialized, without the handshake.
    pub skip_initialization: bool,
    pub backlight: bool,
    pub display: bool,
    pub cursor: bool,
    pub cursor_blinking: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            lines: Lines::Two,
            columns: 16,
            matrix_size: MatrixSize::Dots5x7,
            bit_width: BitWidth::Four,
            increment: true,
            display_shift: false,
            skip_initialization: false,
            backlight: true,
            display: true,
            cursor: true,
            cursor_blinking: true,
        }
    }
}

impl DisplayConfig {
    pub fn operating_mode(&self) -> Result<OperatingMode, ConfigError> {
        OperatingMode::new(self.bit_width, self.lines, self.matrix_size)
    }

    pub fn geometry(&self) -> Result<Geometry, ConfigError> {
        Geometry::new(self.lines, self.columns)
    }

    pub fn entry_mode(&self) -> EntryMode {
        EntryMode {
            increment: self.increment,
            display_shift: self.display_shift,
        }
    }

    pub fn validate(&self) -> Result<(OperatingMode, Geometry), ConfigError> {
        Ok((self.operating_mode()?, self.geometry()?))
    }
}

/// Logical controller pins other than the data lines.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PinRole {
    /// RS: low for instructions, high for data.
    RegisterSelect,
    /// R/W: low for writes. This driver never reads.
    ReadWrite,
    /// E: the controller samples the other lines on its falling edge.
    Enable,
    /// A: backlight anode, usually switched through a transistor.
    Backlight,
}

/// Maps pin roles to physical identifiers: GPIO line numbers for the direct link, or bit
/// positions in the expander byte.
///
/// `data[0]` is the lowest connected data line: D4 in 4-bit operation, D0 in 8-bit operation.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PinAssignment<const N: usize> {
    pub register_select: usize,
    pub read_write: Option<usize>,
    pub enable: usize,
    pub backlight: Option<usize>,
    pub data: [usize; N],
}

impl PinAssignment<4> {
    /// The wiring of the common PCF8574 backpacks: P0=RS, P1=RW, P2=E, P3=backlight, P4–P7=D4–D7.
    pub const PCF8574: Self = PinAssignment {
        register_select: 0,
        read_write: Some(1),
        enable: 2,
        backlight: Some(3),
        data: [4, 5, 6, 7],
    };
}

impl<const N: usize> PinAssignment<N> {
    pub fn get(&self, role: PinRole) -> Option<usize> {
        match role {
            PinRole::RegisterSelect => Some(self.register_select),
            PinRole::ReadWrite => self.read_write,
            PinRole::Enable => Some(self.enable),
            PinRole::Backlight => self.backlight,
        }
    }

    /// Every assigned identifier, control pins first.
    pub fn all(&self) -> impl Iterator<Item = usize> + '_ {
        [self.register_select, self.enable]
            .into_iter()
            .chain(self.read_write)
            .chain(self.backlight)
            .chain(self.data.iter().copied())
    }

    /// # Errors
    /// - [ConfigError::InvalidPinAssignment] if two roles share a pin.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = Vec::with_capacity(N + 4);
        for pin in self.all() {
            if seen.contains(&pin) {
                return Err(ConfigError::InvalidPinAssignment("two roles share a pin"));
            }
            seen.push(pin);
        }
        Ok(())
    }

    /// Like [PinAssignment::validate], and additionally checks every identifier is a bit of a byte.
    pub fn validate_bits(&self) -> Result<(), ConfigError> {
        if self.all().any(|bit| bit > 7) {
            return Err(ConfigError::InvalidPinAssignment("bit position past 7"));
        }
        self.validate()
    }
}
