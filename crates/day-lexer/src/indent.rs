//! Indentation levels
//!
//! To indent a line by one level, Day accepts two regular spaces, one
//! tab, or one fullwidth space (U+3000). A single regular space is half
//! a level, so the lexer measures indentation in half-levels and stores
//! the count exactly: three spaces are level 1.5, never rounded.
//!
//! Only whole levels are valid Day. The lexer records whatever it finds
//! and [`Indentation::validate`] rejects odd indents afterwards.

use crate::error::{LexError, LexErrorKind};
use std::fmt;

/// A non-negative multiple of 0.5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct IndentLevel {
    halves: u32,
}

impl IndentLevel {
    pub const ZERO: Self = Self { halves: 0 };

    pub const fn from_halves(halves: u32) -> Self {
        Self { halves }
    }

    pub const fn from_levels(levels: u32) -> Self {
        Self { halves: levels * 2 }
    }

    /// Number of half-levels; one per regular space
    pub const fn halves(self) -> u32 {
        self.halves
    }

    pub fn as_f32(self) -> f32 {
        self.halves as f32 / 2.0
    }

    pub const fn is_whole(self) -> bool {
        self.halves % 2 == 0
    }

    /// The level as a whole number, if it is one
    pub const fn whole(self) -> Option<u32> {
        if self.is_whole() {
            Some(self.halves / 2)
        } else {
            None
        }
    }

    pub(crate) fn add_halves(&mut self, halves: u32) {
        self.halves = self.halves.saturating_add(halves);
    }
}

impl fmt::Display for IndentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.whole() {
            Some(levels) => write!(f, "{}", levels),
            None => write!(f, "{}.5", self.halves / 2),
        }
    }
}

/// The leading whitespace of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Indentation {
    pub level: IndentLevel,
    /// Characters of indentation
    pub columns: u32,
    /// Bytes of indentation
    pub bytes: usize,
}

impl Indentation {
    /// Checks that the indent is a whole number of levels
    ///
    /// `line` and `line_start` locate the error, if there is one.
    pub fn validate(&self, line: u32, line_start: usize) -> Result<u32, LexError> {
        self.level.whole().ok_or_else(|| {
            LexError::new(
                LexErrorKind::OddIndentation {
                    halves: self.level.halves(),
                },
                0,
                1,
            )
            .spanning(self.columns, self.bytes)
            .at_line(line, line_start)
        })
    }
}
