//! Span - Source code location
//!
//! Day is processed one line at a time, so most spans start and end on
//! the same line. A Span still records absolute byte offsets so that
//! diagnostics from different lines of the same file can be ordered.

/// Represents a position in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Line (1-indexed)
    pub line: u32,
    /// Column (1-indexed, counted in characters)
    pub column: u32,
    /// Byte offset from the beginning of the file
    pub offset: usize,
}

impl Position {
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        Self { line, column, offset }
    }
}

/// Represents a region in the source code (start to end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start position
    pub start: Position,
    /// End position
    pub end: Position,
    /// Source file ID
    pub file_id: u32,
}

impl Span {
    pub fn new(start: Position, end: Position, file_id: u32) -> Self {
        Self { start, end, file_id }
    }

    /// Creates a span covering `width` characters of a single line.
    ///
    /// `offset` is the absolute byte offset of the first character and
    /// `byte_len` the number of bytes those characters occupy.
    pub fn on_line(
        file_id: u32,
        line: u32,
        column: u32,
        width: u32,
        offset: usize,
        byte_len: usize,
    ) -> Self {
        Self {
            start: Position::new(line, column, offset),
            end: Position::new(line, column + width, offset + byte_len),
            file_id,
        }
    }

    /// Returns the length in bytes
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_on_line() {
        // "    give" starting at byte 20 of the file, line 3
        let span = Span::on_line(0, 3, 5, 4, 24, 4);
        assert_eq!(span.start.line, 3);
        assert_eq!(span.end.line, 3);
        assert_eq!(span.start.column, 5);
        assert_eq!(span.end.column, 9);
        assert_eq!(span.len(), 4);
    }

    #[test]
    fn test_multibyte_width() {
        // One CJK character: 1 column wide, 3 bytes long
        let span = Span::on_line(0, 1, 1, 1, 0, 3);
        assert_eq!(span.end.column - span.start.column, 1);
        assert_eq!(span.len(), 3);
        assert!(!span.is_empty());
    }
}
