//! Packed pin identifiers
//!
//! A pin is stored as `(bank_letter - 'A') << 8 | number`: the bank index in
//! the high byte and the pin number in the low byte. Identifiers written by
//! other tools using the same packing stay interchangeable.

use core::fmt;

use crate::map;

/// A GPIO pin: bank index plus number within the bank
///
/// Construction does not check either half. A bank past `I` or a number
/// past 15 addresses registers that do not belong to any pin, so only pass
/// pins that exist on the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin(u16);

impl Pin {
    /// Pack a bank letter (`'A'`, `'B'`, ...) and pin number
    #[inline]
    pub const fn new(bank: char, number: u8) -> Self {
        let index = (bank as u32).wrapping_sub('A' as u32) as u16;
        Self((index << 8) | number as u16)
    }

    /// Reinterpret a packed identifier
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// The packed identifier
    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// 0-based bank index (`A` = 0)
    #[inline]
    pub const fn bank(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Pin number within the bank
    #[inline]
    pub const fn number(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Bank letter (`'A'` for bank 0)
    pub const fn bank_letter(self) -> char {
        b'A'.wrapping_add(self.bank()) as char
    }

    /// Parse the board-silkscreen form, e.g. `"PD8"`
    ///
    /// Unlike [`Pin::new`] this rejects banks the chip does not have and
    /// numbers above 15.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let rest = s.strip_prefix('P')?;
        let mut chars = rest.chars();

        let bank = chars.next()?;
        let last_bank = (b'A' + map::gpio::BANK_COUNT - 1) as char;
        if !('A'..=last_bank).contains(&bank) {
            return None;
        }

        // Plain decimal only: no sign, no leading zero
        let digits = chars.as_str();
        let canonical = match digits.as_bytes() {
            [d] => d.is_ascii_digit(),
            [b'1'..=b'9', d] => d.is_ascii_digit(),
            _ => false,
        };
        if !canonical {
            return None;
        }
        let number: u8 = digits.parse().ok()?;
        if number > 15 {
            return None;
        }

        Some(Self::new(bank, number))
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}{}", self.bank_letter(), self.number())
    }
}
