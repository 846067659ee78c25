//! Limits and indentation rules for the line lexer

/// Longest line Day accepts, in characters
pub const MAX_LINE_CHARACTERS: usize = 120;

/// Widest possible UTF-8 character, in bytes
pub const MAX_CHARACTER_WIDTH: usize = 4;

/// Configuration shared by the lexer, the line reader and the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexerConfig {
    /// Maximum bytes of content per line, excluding the line terminator
    pub max_line_length: usize,
    /// Maximum chunks per line; more is an error, never a truncation
    pub max_chunks_per_line: usize,
    /// Half-levels contributed by one tab or fullwidth space
    pub wide_indent_halves: u32,
}

impl Default for LexerConfig {
    fn default() -> Self {
        Self {
            max_line_length: MAX_LINE_CHARACTERS * MAX_CHARACTER_WIDTH,
            max_chunks_per_line: MAX_LINE_CHARACTERS / 2,
            wide_indent_halves: 2,
        }
    }
}

impl LexerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_length(mut self, bytes: usize) -> Self {
        self.max_line_length = bytes;
        self
    }

    pub fn with_max_chunks(mut self, chunks: usize) -> Self {
        self.max_chunks_per_line = chunks;
        self
    }

    /// Counts tabs and fullwidth spaces as `halves` half-levels each
    ///
    /// Earlier revisions of Day counted them as half a level; the
    /// default is a full level, the same as two regular spaces.
    pub fn with_wide_indent_halves(mut self, halves: u32) -> Self {
        self.wide_indent_halves = halves;
        self
    }

    /// Arena bytes needed for the worst-case line
    ///
    /// Every chunk copies its bytes plus one sentinel, and chunks never
    /// overlap, so the text can never need more than this.
    pub fn arena_capacity(&self) -> usize {
        self.max_line_length + self.max_chunks_per_line
    }
}
