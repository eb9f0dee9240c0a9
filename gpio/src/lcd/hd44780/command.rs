//! HD44780 instruction encoders.
//!
//! Every function here is pure and only builds the instruction byte. Sending it, and waiting for
//! the controller to finish, is the [HD44780Controller](super::HD44780Controller)'s job.

/// `00000001`: clears the DDRAM and sets the address counter to 0.
pub const CLEAR_DISPLAY: u8 = 0b00000001;

/// `0000001?`: sets the address counter to 0 and undoes any display shift.
pub const RETURN_HOME: u8 = 0b00000010;

/// The high nibble of the function set instruction with the 8-bit flag set. Sent alone three
/// times during initialization.
pub const WAKE_UP_NIBBLE: u8 = 0b0011;

/// The high nibble of the function set instruction with the 8-bit flag cleared. Switches the
/// controller to 4-bit operation.
pub const FOUR_BIT_NIBBLE: u8 = 0b0010;

/// Highest address accepted by [set_ddram_address].
pub const DDRAM_ADDRESS_MAX: u8 = 0b01111111;

/// Direction of a cursor move or display shift.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Direction {
    Left,
    Right,
}

/// `000001IS`: entry mode set.
///
/// `I` is `1` to increment the address after every write, `S` is `1` to shift the whole display
/// on every write instead of moving the cursor.
pub const fn entry_mode_set(increment: bool, shift: bool) -> u8 {
    let mut command = 0b00000100;
    if increment {
        command |= 0b00000010;
    }
    if shift {
        command |= 0b00000001;
    }
    command
}

/// `00001DCB`: display on/off control.
///
/// All three flags live in the same instruction, so changing one of them means sending the other
/// two again.
pub const fn display_control(display_on: bool, cursor_on: bool, blink_on: bool) -> u8 {
    let mut command = 0b00001000;
    if display_on {
        command |= 0b00000100;
    }
    if cursor_on {
        command |= 0b00000010;
    }
    if blink_on {
        command |= 0b00000001;
    }
    command
}

/// `0001SR??`: moves the cursor or shifts the display, without touching the DDRAM.
///
/// `S` is `1` to shift the display, `0` to move the cursor.
pub const fn cursor_shift(display_shift: bool, direction: Direction) -> u8 {
    let mut command = 0b00010000;
    if display_shift {
        command |= 0b00001000;
    }
    if matches!(direction, Direction::Right) {
        command |= 0b00000100;
    }
    command
}

/// `001DNF??`: function set.
///
/// `D` is `1` for the 8-bit interface, `N` is `1` for two lines and `F` is `1` for the 5x10 font.
pub const fn function_set(eight_bit: bool, two_lines: bool, large_font: bool) -> u8 {
    let mut command = 0b00100000;
    if eight_bit {
        command |= 0b00010000;
    }
    if two_lines {
        command |= 0b00001000;
    }
    if large_font {
        command |= 0b00000100;
    }
    command
}

/// `1AAAAAAA`: sets the DDRAM address. Returns `None` if the address doesn't fit in 7 bits.
pub const fn set_ddram_address(address: u8) -> Option<u8> {
    if address > DDRAM_ADDRESS_MAX {
        return None;
    }
    Some(0b10000000 | address)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_control_packs_all_flags() {
        assert_eq!(display_control(false, false, false), 0x08);
        assert_eq!(display_control(true, true, false), 0x0E);
        assert_eq!(display_control(true, true, true), 0x0F);
        assert_eq!(display_control(false, false, true), 0x09);
    }

    #[test]
    fn entry_mode_bits() {
        assert_eq!(entry_mode_set(true, false), 0x06);
        assert_eq!(entry_mode_set(false, true), 0x05);
    }

    #[test]
    fn cursor_shift_bits() {
        assert_eq!(cursor_shift(false, Direction::Left), 0x10);
        assert_eq!(cursor_shift(false, Direction::Right), 0x14);
        assert_eq!(cursor_shift(true, Direction::Left), 0x18);
        assert_eq!(cursor_shift(true, Direction::Right), 0x1C);
    }

    #[test]
    fn function_set_bits() {
        assert_eq!(function_set(false, false, false), 0x20);
        assert_eq!(function_set(false, true, false), 0x28);
        assert_eq!(function_set(true, false, true), 0x34);
        assert_eq!(function_set(true, true, false), 0x38);
    }

    #[test]
    fn ddram_address_is_seven_bits() {
        assert_eq!(set_ddram_address(0x40), Some(0xC0));
        assert_eq!(set_ddram_address(0x7F), Some(0xFF));
        assert_eq!(set_ddram_address(0x80), None);
    }
}
