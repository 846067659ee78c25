//! Line lexer for the Day language
//!
//! Turns one line of source into an indent level and a list of chunks:
//!
//! ```text
//! "DotProduct [Vector2D, Vector2D] -> Vector2D"
//!     indent 0, chunks: DotProduct | [Vector2D, | Vector2D] | -> | Vector2D
//!
//! "    give vector的x"
//!     indent 2, chunks: give | vector | x
//! ```
//!
//! Whitespace and commentary (Chinese characters) separate chunks and
//! are dropped. A line whose first non-indent character is commentary
//! is ignored entirely.
//!
//! The scan is a small state machine over UTF-8 characters:
//!
//! ```text
//! CalculatingIndent --non-indent--> SeekingChunkStart <--delimiter-- InsideChunk
//!                                          |                              ^
//!                                          +-------------code-------------+
//! ```

use crate::arena::{Arena, ArenaSlice};
use crate::config::LexerConfig;
use crate::error::{LexError, LexErrorKind};
use crate::indent::{IndentLevel, Indentation};
use crate::source::SourceLine;
use crate::text::copy_text;
use crate::utf8::{decode_at, is_commentary};
use std::fmt;

pub const REGULAR_SPACE: u32 = 0x0020;
pub const FULLWIDTH_SPACE: u32 = 0x3000;
pub const TAB: u32 = 0x0009;
pub const QUOTATION_MARK: u32 = 0x0022;

/// Does this codepoint separate chunks?
pub fn is_delimiter(codepoint: u32) -> bool {
    matches!(codepoint, REGULAR_SPACE | FULLWIDTH_SPACE | TAB) || is_commentary(codepoint)
}

/// A piece of code copied into the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    text: &'a str,
    with_sentinel: &'a [u8],
    handle: ArenaSlice,
    offset: usize,
    column: u32,
}

impl<'a> Chunk<'a> {
    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// The arena bytes, including the trailing sentinel
    pub fn as_bytes_with_sentinel(&self) -> &'a [u8] {
        self.with_sentinel
    }

    /// Handle for resolving the chunk again through [`Arena::get`]
    pub fn handle(&self) -> ArenaSlice {
        self.handle
    }

    /// Byte offset of the chunk within its line
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Column of the chunk's first character (1-indexed)
    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for Chunk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text)
    }
}

impl PartialEq<str> for Chunk<'_> {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for Chunk<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

/// One lexed line; borrows its chunks from the arena
///
/// Only the chunk text (plus one sentinel per chunk) lives in the arena,
/// which is what [`LexerConfig::arena_capacity`] accounts for. The list of
/// chunks itself is a heap `Vec`, capped at `max_chunks_per_line`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedLine<'a> {
    indentation: Indentation,
    chunks: Vec<Chunk<'a>>,
    line: u32,
    line_start: usize,
}

impl<'a> TokenizedLine<'a> {
    /// The result for commentary lines: no chunks, indent level 0
    pub fn empty() -> Self {
        Self {
            indentation: Indentation::default(),
            chunks: Vec::new(),
            line: 1,
            line_start: 0,
        }
    }

    pub fn indent_level(&self) -> IndentLevel {
        self.indentation.level
    }

    pub fn indentation(&self) -> Indentation {
        self.indentation
    }

    pub fn chunks(&self) -> &[Chunk<'a>] {
        &self.chunks
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// True when the line holds no code (blank, whitespace or commentary)
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn texts(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.chunks.iter().map(|chunk| chunk.as_str())
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.texts().map(str::to_string).collect()
    }

    /// The whole indent level, or an error for an odd indent
    pub fn validate_indent(&self) -> Result<u32, LexError> {
        self.indentation.validate(self.line, self.line_start)
    }

    fn at_line(mut self, number: u32, start: usize) -> Self {
        self.line = number;
        self.line_start = start;
        self
    }
}

/// What the lexer is currently looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    CalculatingIndent,
    SeekingChunkStart,
    InsideChunk { start: usize, column: u32 },
    // TODO: scan quoted text once the string syntax is settled.
    InsideQuotation { start: usize, column: u32 },
}

/// A chunk copied during the scan, before the arena is frozen
struct PendingChunk {
    handle: ArenaSlice,
    offset: usize,
    column: u32,
}

enum Scan {
    Commentary,
    Code {
        indentation: Indentation,
        chunks: Vec<PendingChunk>,
    },
}

/// The Day line lexer
#[derive(Debug, Clone, Copy, Default)]
pub struct Lexer {
    config: LexerConfig,
}

impl Lexer {
    pub fn new(config: LexerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LexerConfig {
        &self.config
    }

    /// Lexes a single line into `arena`
    ///
    /// The line may end with `\n`, `\r\n` or a NUL byte; anything after
    /// the first terminator is ignored. Errors are reported on line 1;
    /// use [`Lexer::tokenize_source_line`] to keep the real location.
    pub fn tokenize_line<'a>(
        &self,
        line: impl AsRef<[u8]>,
        arena: &'a mut Arena,
    ) -> Result<TokenizedLine<'a>, LexError> {
        self.tokenize_content(line_content(line.as_ref()), arena)
    }

    /// Lexes a line produced by [`crate::LineReader`]
    ///
    /// The reader has already removed the terminator, so every byte is
    /// content and a NUL byte is rejected rather than ending the line.
    pub fn tokenize_source_line<'a>(
        &self,
        source: &SourceLine,
        arena: &'a mut Arena,
    ) -> Result<TokenizedLine<'a>, LexError> {
        let result = match reject_nul(&source.bytes) {
            Ok(()) => self.tokenize_content(&source.bytes, arena),
            Err(error) => Err(error),
        };

        match result {
            Ok(line) => Ok(line.at_line(source.number, source.start)),
            Err(error) => Err(error.at_line(source.number, source.start)),
        }
    }

    fn tokenize_content<'a>(
        &self,
        line: &[u8],
        arena: &'a mut Arena,
    ) -> Result<TokenizedLine<'a>, LexError> {
        let scan = self.scan(line, &mut *arena)?;
        let arena: &'a Arena = arena;

        match scan {
            Scan::Commentary => Ok(TokenizedLine::empty()),
            Scan::Code {
                indentation,
                chunks,
            } => {
                let chunks = chunks
                    .into_iter()
                    .map(|pending| freeze(pending, arena))
                    .collect::<Result<Vec<_>, _>>()?;

                tracing::trace!(
                    chunks = chunks.len(),
                    indent = %indentation.level,
                    "line tokenized"
                );

                Ok(TokenizedLine {
                    indentation,
                    chunks,
                    line: 1,
                    line_start: 0,
                })
            }
        }
    }

    fn scan(&self, line: &[u8], arena: &mut Arena) -> Result<Scan, LexError> {
        if line.len() > self.config.max_line_length {
            let max = self.config.max_line_length;
            let column = String::from_utf8_lossy(&line[..max]).chars().count() as u32 + 1;
            return Err(LexError::new(
                LexErrorKind::LineTooLong {
                    length: line.len(),
                    max,
                },
                max,
                column,
            ));
        }

        let mut state = ScanState::CalculatingIndent;
        let mut indentation = Indentation::default();
        let mut chunks: Vec<PendingChunk> = Vec::new();

        // Where is the next character we're going to examine?
        let mut next_offset = 0;
        // Characters examined so far
        let mut column = 0u32;

        while next_offset < line.len() {
            let offset = next_offset;
            column += 1;

            let ch = decode_at(line, offset).map_err(|e| LexError::new(e, offset, column))?;
            next_offset += ch.width.bytes();

            if state == ScanState::CalculatingIndent {
                match ch.codepoint {
                    REGULAR_SPACE => {
                        indentation.level.add_halves(1);
                        continue;
                    }
                    FULLWIDTH_SPACE | TAB => {
                        indentation.level.add_halves(self.config.wide_indent_halves);
                        continue;
                    }
                    codepoint => {
                        indentation.columns = column - 1;
                        indentation.bytes = offset;
                        state = ScanState::SeekingChunkStart;

                        // A Chinese first character makes the whole line commentary.
                        if is_commentary(codepoint) {
                            tracing::debug!(column, "commentary line");
                            return Ok(Scan::Commentary);
                        }
                    }
                }
            }

            if is_delimiter(ch.codepoint) {
                if let ScanState::InsideChunk { start, column } = state {
                    chunks.push(self.extract(line, start, offset, column, arena)?);
                    state = ScanState::SeekingChunkStart;
                }
                continue;
            }

            if ch.codepoint == QUOTATION_MARK {
                state = ScanState::InsideQuotation {
                    start: offset,
                    column,
                };
                break;
            }

            if state == ScanState::SeekingChunkStart {
                if chunks.len() >= self.config.max_chunks_per_line {
                    return Err(LexError::new(
                        LexErrorKind::TooManyChunksOnLine {
                            max: self.config.max_chunks_per_line,
                        },
                        offset,
                        column,
                    ));
                }
                state = ScanState::InsideChunk {
                    start: offset,
                    column,
                };
            }
        }

        match state {
            ScanState::CalculatingIndent => {
                // Blank or whitespace-only; keep the raw indent for validation.
                indentation.columns = column;
                indentation.bytes = line.len();
            }
            ScanState::SeekingChunkStart => {}
            ScanState::InsideChunk { start, column } => {
                chunks.push(self.extract(line, start, line.len(), column, arena)?);
            }
            ScanState::InsideQuotation { start, column } => {
                return Err(LexError::new(
                    LexErrorKind::UnsupportedConstruct {
                        construct: "quotations",
                    },
                    start,
                    column,
                ));
            }
        }

        Ok(Scan::Code {
            indentation,
            chunks,
        })
    }

    fn extract(
        &self,
        line: &[u8],
        start: usize,
        just_after_end: usize,
        column: u32,
        arena: &mut Arena,
    ) -> Result<PendingChunk, LexError> {
        let handle = copy_text(line, start, just_after_end, arena).map_err(|kind| {
            LexError::new(kind, start, column).spanning(1, just_after_end.saturating_sub(start))
        })?;

        tracing::trace!(offset = start, len = just_after_end - start, "chunk");

        Ok(PendingChunk {
            handle,
            offset: start,
            column,
        })
    }
}

/// Resolves a copied chunk now that the arena is no longer mutated
fn freeze(pending: PendingChunk, arena: &Arena) -> Result<Chunk<'_>, LexError> {
    let locate = |kind: LexErrorKind| LexError::new(kind, pending.offset, pending.column);

    let with_sentinel = arena.get(pending.handle).map_err(|e| locate(e.into()))?;
    let text_len = with_sentinel.len().saturating_sub(1);
    let text = std::str::from_utf8(&with_sentinel[..text_len]).map_err(|_| {
        locate(LexErrorKind::InvalidRange {
            start: pending.offset,
            end: pending.offset + text_len,
        })
    })?;

    Ok(Chunk {
        text,
        with_sentinel,
        handle: pending.handle,
        offset: pending.offset,
        column: pending.column,
    })
}

/// The part of `line` before its terminator
fn line_content(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .position(|&b| b == b'\n' || b == 0)
        .unwrap_or(line.len());
    let content = &line[..end];

    if line.get(end) == Some(&b'\n') {
        content.strip_suffix(b"\r").unwrap_or(content)
    } else {
        content
    }
}

/// Fails on the first NUL byte of a line that has no terminator left
fn reject_nul(line: &[u8]) -> Result<(), LexError> {
    match line.iter().position(|&b| b == 0) {
        None => Ok(()),
        Some(offset) => {
            let column = String::from_utf8_lossy(&line[..offset]).chars().count() as u32 + 1;
            tracing::debug!(offset, "NUL byte inside line");
            Err(LexError::new(LexErrorKind::EmbeddedNul, offset, column))
        }
    }
}

/// Lexes one line with the default configuration
pub fn tokenize_line<'a>(
    line: impl AsRef<[u8]>,
    arena: &'a mut Arena,
) -> Result<TokenizedLine<'a>, LexError> {
    Lexer::default().tokenize_line(line, arena)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaError;
    use crate::utf8::Utf8Error;
    use pretty_assertions::assert_eq;

    fn lex(line: &str) -> (f32, Vec<String>) {
        let mut arena = Arena::for_lines(&LexerConfig::default());
        let tokenized = tokenize_line(line, &mut arena).unwrap();
        (tokenized.indent_level().as_f32(), tokenized.to_strings())
    }

    fn lex_err(config: LexerConfig, line: &[u8]) -> LexError {
        let mut arena = Arena::for_lines(&config);
        Lexer::new(config).tokenize_line(line, &mut arena).unwrap_err()
    }

    #[test]
    fn test_signature_line() {
        assert_eq!(
            lex("DotProduct [Vector2D, Vector2D] -> Vector2D"),
            (
                0.0,
                vec![
                    "DotProduct".to_string(),
                    "[Vector2D,".to_string(),
                    "Vector2D]".to_string(),
                    "->".to_string(),
                    "Vector2D".to_string(),
                ]
            )
        );
    }

    #[test]
    fn test_indented_line() {
        assert_eq!(
            lex("    give vectorX"),
            (2.0, vec!["give".to_string(), "vectorX".to_string()])
        );
    }

    #[test]
    fn test_commentary_line() {
        let mut arena = Arena::with_capacity(64);
        let tokenized = tokenize_line("  给 this is ignored", &mut arena).unwrap();
        assert_eq!(tokenized, TokenizedLine::empty());
        assert_eq!(tokenized.indent_level(), IndentLevel::ZERO);
        assert!(tokenized.is_empty());
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn test_whitespace_only_line_keeps_raw_indent() {
        assert_eq!(lex("   "), (1.5, vec![]));
        assert_eq!(lex("\t\u{3000} "), (2.5, vec![]));
        assert_eq!(lex(""), (0.0, vec![]));
    }

    #[test]
    fn test_commentary_mid_line_splits_chunks() {
        assert_eq!(
            lex("    give vector的x"),
            (
                2.0,
                vec!["give".to_string(), "vector".to_string(), "x".to_string()]
            )
        );
        assert_eq!(
            lex("total，sum"),
            (0.0, vec!["total".to_string(), "sum".to_string()])
        );
    }

    #[test]
    fn test_tabs_and_fullwidth_spaces() {
        assert_eq!(lex("\tgive x"), (1.0, vec!["give".to_string(), "x".to_string()]));
        assert_eq!(lex("\u{3000}\u{3000}give"), (2.0, vec!["give".to_string()]));
        assert_eq!(lex(" \tgive"), (1.5, vec!["give".to_string()]));
    }

    #[test]
    fn test_half_level_tab_convention() {
        let config = LexerConfig::default().with_wide_indent_halves(1);
        let mut arena = Arena::for_lines(&config);
        let tokenized = Lexer::new(config).tokenize_line("\t\tgive", &mut arena).unwrap();
        assert_eq!(tokenized.indent_level().as_f32(), 1.0);
    }

    #[test]
    fn test_internal_and_trailing_whitespace() {
        assert_eq!(
            lex("a \t\u{3000}  b   "),
            (0.0, vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_line_terminators() {
        assert_eq!(lex("give x\n"), (0.0, vec!["give".to_string(), "x".to_string()]));
        assert_eq!(lex("give x\r\n"), (0.0, vec!["give".to_string(), "x".to_string()]));
        assert_eq!(lex("give\0ignored"), (0.0, vec!["give".to_string()]));
        assert_eq!(lex("give\nnext line"), (0.0, vec!["give".to_string()]));
    }

    #[test]
    fn test_chunks_are_sentinel_terminated() {
        let mut arena = Arena::with_capacity(64);
        let tokenized = tokenize_line("-> Vector2D", &mut arena).unwrap();
        let last = tokenized.chunks()[1];

        assert_eq!(last, "Vector2D");
        assert_eq!(last.as_bytes_with_sentinel(), b"Vector2D\0");
        assert_eq!(last.offset(), 3);
        assert_eq!(last.column(), 4);
        assert_eq!(arena_used_after(&tokenized), 3 + 9);
    }

    fn arena_used_after(line: &TokenizedLine<'_>) -> usize {
        line.chunks().iter().map(|c| c.as_bytes_with_sentinel().len()).sum()
    }

    #[test]
    fn test_chunk_columns_count_characters() {
        let mut arena = Arena::with_capacity(64);
        let tokenized = tokenize_line("给x 的 y", &mut arena).unwrap();
        // Commentary first character: the whole line is ignored
        assert!(tokenized.is_empty());

        let tokenized = tokenize_line("x 的的 y", &mut arena).unwrap();
        let columns: Vec<u32> = tokenized.chunks().iter().map(|c| c.column()).collect();
        assert_eq!(columns, vec![1, 6]);
    }

    #[test]
    fn test_too_many_chunks() {
        let config = LexerConfig::default().with_max_chunks(2);
        let error = lex_err(config, b"a b c");
        assert_eq!(error.kind, LexErrorKind::TooManyChunksOnLine { max: 2 });
        assert_eq!(error.offset, 4);
        assert_eq!(error.column, 5);

        // Exactly at the limit is fine
        let mut arena = Arena::for_lines(&config);
        let tokenized = Lexer::new(config).tokenize_line("a b  ", &mut arena).unwrap();
        assert_eq!(tokenized.chunk_count(), 2);
    }

    #[test]
    fn test_line_too_long() {
        let config = LexerConfig::default().with_max_line_length(8);
        let error = lex_err(config, b"abcdefghi");
        assert_eq!(error.kind, LexErrorKind::LineTooLong { length: 9, max: 8 });
        assert_eq!(error.column, 9);
    }

    #[test]
    fn test_line_at_exact_limit() {
        let config = LexerConfig::default().with_max_line_length(8);
        let mut arena = Arena::for_lines(&config);
        let tokenized = Lexer::new(config)
            .tokenize_line("ab cdefg\n", &mut arena)
            .unwrap();
        assert_eq!(tokenized.to_strings(), vec!["ab", "cdefg"]);
        assert_eq!(tokenized.chunks()[1].as_bytes_with_sentinel(), b"cdefg\0");
    }

    #[test]
    fn test_malformed_encoding() {
        let error = lex_err(LexerConfig::default(), b"give \xFFx");
        assert_eq!(
            error.kind,
            LexErrorKind::MalformedEncoding(Utf8Error::InvalidLeadingByte(0xFF))
        );
        assert_eq!(error.offset, 5);
        assert_eq!(error.column, 6);

        let error = lex_err(LexerConfig::default(), b"give \xE7\xBB");
        assert!(matches!(
            error.kind,
            LexErrorKind::MalformedEncoding(Utf8Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_quotations_are_unsupported() {
        let error = lex_err(LexerConfig::default(), b"  say \"hello\"");
        assert_eq!(
            error.kind,
            LexErrorKind::UnsupportedConstruct {
                construct: "quotations"
            }
        );
        assert_eq!(error.offset, 6);
        assert_eq!(error.column, 7);
    }

    #[test]
    fn test_arena_exhaustion() {
        let mut arena = Arena::with_capacity(6);
        let error = tokenize_line("give vectorX", &mut arena).unwrap_err();
        assert_eq!(
            error.kind,
            LexErrorKind::Arena(ArenaError::Exhausted {
                requested: 8,
                capacity: 6,
                used: 5
            })
        );
        assert_eq!(error.offset, 5);
    }

    #[test]
    fn test_relex_after_reset_is_identical() {
        let mut arena = Arena::with_capacity(64);
        let first = tokenize_line("  take [a, b] -> c", &mut arena)
            .unwrap()
            .to_strings();
        arena.reset();
        let second = tokenize_line("  take [a, b] -> c", &mut arena)
            .unwrap()
            .to_strings();
        assert_eq!(first, second);
    }

    #[test]
    fn test_handles_go_stale_after_reset() {
        let mut arena = Arena::with_capacity(64);
        let handle = tokenize_line("give", &mut arena).unwrap().chunks()[0].handle();
        assert_eq!(arena.get(handle).unwrap(), b"give\0");

        arena.reset();
        assert!(matches!(
            arena.get(handle),
            Err(ArenaError::StaleHandle { .. })
        ));
    }

    #[test]
    fn test_source_line_location() {
        let source = SourceLine {
            number: 3,
            start: 42,
            bytes: b"   give".to_vec(),
        };
        let mut arena = Arena::with_capacity(64);
        let tokenized = Lexer::default()
            .tokenize_source_line(&source, &mut arena)
            .unwrap();
        assert_eq!(tokenized.line(), 3);

        let error = tokenized.validate_indent().unwrap_err();
        assert_eq!(error.line, 3);
        assert_eq!(error.line_start, 42);
        assert_eq!(error.kind, LexErrorKind::OddIndentation { halves: 3 });
    }

    #[test]
    fn test_arena_holds_only_chunk_text() {
        let config = LexerConfig::default()
            .with_max_line_length(9)
            .with_max_chunks(5);
        let mut arena = Arena::for_lines(&config);
        let tokenized = Lexer::new(config)
            .tokenize_line("a b c d e", &mut arena)
            .unwrap();
        assert_eq!(tokenized.chunk_count(), 5);

        // five 1-byte chunks, each followed by its sentinel
        assert_eq!(arena.used(), 10);
        assert!(arena.used() <= config.arena_capacity());
    }

    #[test]
    fn test_nul_inside_source_line_is_rejected() {
        let source = SourceLine {
            number: 7,
            start: 90,
            bytes: b"give x\0 secret".to_vec(),
        };
        let mut arena = Arena::with_capacity(64);
        let error = Lexer::default()
            .tokenize_source_line(&source, &mut arena)
            .unwrap_err();

        assert_eq!(error.kind, LexErrorKind::EmbeddedNul);
        assert_eq!((error.line, error.offset, error.column), (7, 6, 7));
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn test_nul_still_ends_a_raw_line() {
        let (_, chunks) = lex("give x\0 secret");
        assert_eq!(chunks, vec!["give", "x"]);
    }

    #[test]
    fn test_delimiters() {
        for codepoint in [REGULAR_SPACE, FULLWIDTH_SPACE, TAB, '的' as u32, '！' as u32] {
            assert!(is_delimiter(codepoint));
        }
        for codepoint in ['a' as u32, '[' as u32, '\n' as u32, QUOTATION_MARK] {
            assert!(!is_delimiter(codepoint));
        }
    }
}
