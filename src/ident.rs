//! Classification of free-form device identifiers.
//!
//! Users name a board by slot index, model name, serial string, 64-bit hex
//! serial or a locator such as `host:port`. These helpers decide which one
//! a string looks like. They hold no state and never touch a device.

use tracing::trace;

use crate::device::SerialNumber;

/// Maximum number of digits accepted as a local slot index.
pub const MAX_INDEX_DIGITS: usize = 2;

/// Returns true for `0-9`, `a-f` and `A-F`.
pub const fn is_hex_digit(ch: char) -> bool {
    ch.is_ascii_hexdigit()
}

/// Returns true for `0-9`.
pub const fn is_decimal_digit(ch: char) -> bool {
    ch.is_ascii_digit()
}

/// Returns true for ASCII letters and digits.
pub const fn is_alpha_numeric_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
}

/// True if every character is a decimal digit and the string has at most
/// `max_len` characters.
pub fn is_legal_decimal_number(text: &str, max_len: usize) -> bool {
    text.len() <= max_len && text.chars().all(is_decimal_digit)
}

/// Parse a 64-bit serial written in hex, with or without a `0x` prefix.
///
/// Returns `None` if the input is shorter than three characters, has more
/// than sixteen digits after the prefix, contains a non-hex character, or
/// evaluates to zero.
pub fn parse_hex_serial(text: &str) -> Option<SerialNumber> {
    if text.len() < 3 {
        return None;
    }
    let lowered = text.to_ascii_lowercase();
    let digits = lowered.strip_prefix("0x").unwrap_or(&lowered);
    if digits.is_empty() || digits.len() > 16 || !digits.chars().all(is_hex_digit) {
        return None;
    }
    let padded = format!("{digits:0>16}");
    let value = u64::from_str_radix(&padded, 16).ok()?;
    trace!(input = text, value, "Parsed hex serial");
    SerialNumber::new(value)
}

/// True if every character is an ASCII letter or digit.
pub fn is_alpha_numeric(text: &str) -> bool {
    text.chars().all(is_alpha_numeric_char)
}

/// True for the 8 or 9 character alphanumeric serial strings printed on
/// boards. Longer strings are treated as locators or names.
pub fn is_legal_serial_number(text: &str) -> bool {
    matches!(text.len(), 8 | 9) && is_alpha_numeric(text)
}

/// What a free-form identifier looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Empty,
    /// Local slot index.
    Index(u32),
    /// 64-bit serial written in hex.
    HexSerial(SerialNumber),
    /// Printed serial string.
    SerialString(String),
    /// Anything with a `:`, e.g. `host:port` or `scheme://...`.
    Locator(String),
    /// Model name or other text.
    Text(String),
}

/// Classify an identifier. Checks run in the order of the variants.
///
/// Hex serials must carry the `0x` prefix unless they are exactly sixteen
/// digits long, so that an all-digit printed serial is never mistaken for
/// a hex value.
pub fn classify(text: &str) -> Identifier {
    if text.is_empty() {
        return Identifier::Empty;
    }
    if is_legal_decimal_number(text, MAX_INDEX_DIGITS) {
        if let Ok(index) = text.parse() {
            return Identifier::Index(index);
        }
    }
    let prefixed = text.len() > 2 && text.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("0x"));
    if prefixed || (text.len() == 16 && text.chars().all(is_hex_digit)) {
        if let Some(serial) = parse_hex_serial(text) {
            return Identifier::HexSerial(serial);
        }
    }
    if is_legal_serial_number(text) {
        return Identifier::SerialString(text.to_string());
    }
    if text.contains(':') {
        return Identifier::Locator(text.to_string());
    }
    Identifier::Text(text.to_string())
}
