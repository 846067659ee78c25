//! UTF-8 decoding and commentary classification
//!
//! The lexer walks raw bytes, so it decodes characters itself instead of
//! trusting the input to be a valid `&str`. Every decoded character has
//! a width (how many bytes to advance) and a codepoint.
//!
//! ```text
//! 1 byte:                             0xxxxxxx
//! 2 bytes:                   110xxxxx 10xxxxxx
//! 3 bytes:          1110xxxx 10xxxxxx 10xxxxxx
//! 4 bytes: 11110xxx 10xxxxxx 10xxxxxx 10xxxxxx
//! ```
//!
//! The codepoint is the concatenation of the `x` bits, most significant
//! byte first.

use thiserror::Error;

/// How many bytes one UTF-8 character occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CharWidth {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
}

impl CharWidth {
    pub const fn bytes(self) -> usize {
        self as usize
    }

    pub fn from_bytes(width: usize) -> Result<Self, Utf8Error> {
        match width {
            1 => Ok(CharWidth::One),
            2 => Ok(CharWidth::Two),
            3 => Ok(CharWidth::Three),
            4 => Ok(CharWidth::Four),
            other => Err(Utf8Error::InvalidWidth(other)),
        }
    }

    /// Payload bits carried by the leading byte
    const fn lead_mask(self) -> u8 {
        match self {
            CharWidth::One => 0b0111_1111,
            CharWidth::Two => 0b0001_1111,
            CharWidth::Three => 0b0000_1111,
            CharWidth::Four => 0b0000_0111,
        }
    }

    /// Smallest codepoint that legitimately needs this many bytes
    const fn min_codepoint(self) -> u32 {
        match self {
            CharWidth::One => 0,
            CharWidth::Two => 0x80,
            CharWidth::Three => 0x800,
            CharWidth::Four => 0x1_0000,
        }
    }
}

/// Malformed UTF-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Utf8Error {
    #[error("byte 0x{0:02X} cannot start a UTF-8 character")]
    InvalidLeadingByte(u8),
    #[error("a UTF-8 character cannot be {0} bytes wide")]
    InvalidWidth(usize),
    #[error("UTF-8 character needs {expected} bytes but only {available} remain")]
    Truncated { expected: usize, available: usize },
    #[error("byte 0x{0:02X} is not a UTF-8 continuation byte")]
    InvalidContinuation(u8),
    #[error("U+{codepoint:04X} is encoded in {width} bytes, which is overlong")]
    Overlong { codepoint: u32, width: usize },
    #[error("0x{0:X} is not a Unicode scalar value")]
    NotScalar(u32),
}

/// A character decoded from a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedChar {
    pub codepoint: u32,
    pub width: CharWidth,
}

/// Width of the character that starts with `first_byte`
pub fn character_width(first_byte: u8) -> Result<CharWidth, Utf8Error> {
    if first_byte & 0b1000_0000 == 0 {
        Ok(CharWidth::One)
    } else if first_byte & 0b1110_0000 == 0b1100_0000 {
        Ok(CharWidth::Two)
    } else if first_byte & 0b1111_0000 == 0b1110_0000 {
        Ok(CharWidth::Three)
    } else if first_byte & 0b1111_1000 == 0b1111_0000 {
        Ok(CharWidth::Four)
    } else {
        Err(Utf8Error::InvalidLeadingByte(first_byte))
    }
}

/// Decodes the first `width` bytes of `bytes` into a codepoint
pub fn decode(bytes: &[u8], width: usize) -> Result<u32, Utf8Error> {
    let width = CharWidth::from_bytes(width)?;
    let bundle = bytes.get(..width.bytes()).ok_or(Utf8Error::Truncated {
        expected: width.bytes(),
        available: bytes.len(),
    })?;

    let mut codepoint = u32::from(bundle[0] & width.lead_mask());
    for &byte in &bundle[1..] {
        if byte & 0b1100_0000 != 0b1000_0000 {
            return Err(Utf8Error::InvalidContinuation(byte));
        }
        codepoint = (codepoint << 6) | u32::from(byte & 0b0011_1111);
    }

    if codepoint < width.min_codepoint() {
        return Err(Utf8Error::Overlong {
            codepoint,
            width: width.bytes(),
        });
    }
    if (0xD800..=0xDFFF).contains(&codepoint) || codepoint > 0x10_FFFF {
        return Err(Utf8Error::NotScalar(codepoint));
    }

    Ok(codepoint)
}

/// Decodes the character starting at `offset`
///
/// `offset` must be inside `line`.
pub fn decode_at(line: &[u8], offset: usize) -> Result<DecodedChar, Utf8Error> {
    let rest = &line[offset..];
    let width = character_width(rest[0])?;
    let codepoint = decode(rest, width.bytes())?;
    Ok(DecodedChar { codepoint, width })
}

/// Unicode blocks treated as commentary
///
/// https://www.unicode.org/charts/
const COMMENTARY_RANGES: &[(u32, u32)] = &[
    (0x3000, 0x303F),   // CJK Symbols and Punctuation
    (0x3400, 0x4DBF),   // CJK Extension A
    (0x4E00, 0x9FFF),   // CJK Unified Ideographs (Han)
    (0x20000, 0x2A6DF), // CJK Extension B
    (0x2A700, 0x2B739), // CJK Extension C
    (0x2B740, 0x2B81D), // CJK Extension D
    (0x2B820, 0x2CEA1), // CJK Extension E
    (0x2CEB0, 0x2EBE0), // CJK Extension F
    (0x2EBF0, 0x2EE5D), // CJK Extension I
    (0x30000, 0x3134A), // CJK Extension G
    (0x31350, 0x323AF), // CJK Extension H
];

/// Fullwidth punctuation treated as commentary: ！，．：；？
const COMMENTARY_PUNCTUATION: [u32; 6] = [0xFF01, 0xFF0C, 0xFF0E, 0xFF1A, 0xFF1B, 0xFF1F];

/// Is this codepoint Chinese, as far as Day is concerned?
pub fn is_commentary(codepoint: u32) -> bool {
    COMMENTARY_RANGES
        .iter()
        .any(|&(low, high)| (low..=high).contains(&codepoint))
        || COMMENTARY_PUNCTUATION.contains(&codepoint)
}
