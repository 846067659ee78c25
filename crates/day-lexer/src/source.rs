//! Reading source files line by line
//!
//! [`LineReader`] splits a byte stream into lines and enforces the
//! maximum line length before anything is lexed. An overlong line is
//! reported and skipped; reading resumes on the following line.
//!
//! [`lex_source`] is the whole pipeline for one file: read a line, lex
//! it into a shared arena, keep an owned copy of the result, reset the
//! arena, repeat.

use crate::arena::Arena;
use crate::config::LexerConfig;
use crate::error::{LexError, LexErrorKind};
use crate::indent::{IndentLevel, Indentation};
use crate::lexer::Lexer;
use std::io::{self, BufRead, Read};
use thiserror::Error;

/// One line of source, without its terminator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// Line number (1-indexed)
    pub number: u32,
    /// Byte offset of the line within the file
    pub start: usize,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read source: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Line(#[from] LexError),
}

/// Iterator over the lines of a reader
pub struct LineReader<R> {
    reader: R,
    max_line_length: usize,
    next_number: u32,
    offset: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R, config: &LexerConfig) -> Self {
        Self {
            reader,
            max_line_length: config.max_line_length,
            next_number: 1,
            offset: 0,
        }
    }

    fn read_line(&mut self) -> Result<Option<SourceLine>, ReadError> {
        let number = self.next_number;
        let start = self.offset;

        // Room for the content plus "\r\n"; filling it without a newline
        // means the line is too long.
        let limit = self.max_line_length + 2;
        let mut bytes = Vec::with_capacity(limit);
        let read = (&mut self.reader)
            .take(limit as u64)
            .read_until(b'\n', &mut bytes)?;

        if read == 0 {
            return Ok(None);
        }
        self.next_number += 1;
        self.offset += read;

        let terminated = bytes.last() == Some(&b'\n');
        if terminated {
            bytes.pop();
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
        }

        if bytes.len() > self.max_line_length {
            let mut length = bytes.len();
            if !terminated && read == limit {
                let rest = self.skip_rest_of_line(bytes.last().copied())?;
                self.offset += rest.consumed;
                length = (length + rest.consumed)
                    .saturating_sub(usize::from(rest.newline) + usize::from(rest.carriage_return));
            }

            let max = self.max_line_length;
            let column = String::from_utf8_lossy(&bytes[..max]).chars().count() as u32 + 1;
            tracing::debug!(line = number, length, "line too long");
            return Err(LexError::new(LexErrorKind::LineTooLong { length, max }, max, column)
                .at_line(number, start)
                .into());
        }

        Ok(Some(SourceLine {
            number,
            start,
            bytes,
        }))
    }

    /// Consumes the remainder of an overlong line, terminator included
    ///
    /// `last_byte` is the final byte already read from the line; a '\r'
    /// there may pair with a '\n' at the start of the remainder.
    fn skip_rest_of_line(&mut self, mut last_byte: Option<u8>) -> io::Result<Remainder> {
        let mut rest = Remainder::default();
        loop {
            let available = self.reader.fill_buf()?;
            if available.is_empty() {
                return Ok(rest);
            }

            match available.iter().position(|&b| b == b'\n') {
                Some(newline) => {
                    let before = match newline {
                        0 => last_byte,
                        _ => Some(available[newline - 1]),
                    };
                    rest.consumed += newline + 1;
                    rest.newline = true;
                    rest.carriage_return = before == Some(b'\r');
                    self.reader.consume(newline + 1);
                    return Ok(rest);
                }
                None => {
                    let len = available.len();
                    last_byte = available.last().copied();
                    rest.consumed += len;
                    self.reader.consume(len);
                }
            }
        }
    }
}

/// What [`LineReader::skip_rest_of_line`] consumed
#[derive(Debug, Default)]
struct Remainder {
    consumed: usize,
    /// The line ended with '\n'
    newline: bool,
    /// The '\n' was preceded by '\r'
    carriage_return: bool,
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = Result<SourceLine, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_line().transpose()
    }
}

/// A lexed line that no longer borrows the arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexedLine {
    pub number: u32,
    pub start: usize,
    pub indentation: Indentation,
    pub chunks: Vec<String>,
}

impl LexedLine {
    pub fn indent_level(&self) -> IndentLevel {
        self.indentation.level
    }

    pub fn validate_indent(&self) -> Result<u32, LexError> {
        self.indentation.validate(self.number, self.start)
    }
}

/// Everything learned from lexing one source
#[derive(Debug, Default)]
pub struct LexReport {
    pub lines: Vec<LexedLine>,
    pub errors: Vec<LexError>,
}

impl LexReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Lexes every line of `reader`, continuing past lines with errors
///
/// Only I/O failures stop the run.
pub fn lex_source<R: BufRead>(reader: R, config: LexerConfig) -> io::Result<LexReport> {
    let lexer = Lexer::new(config);
    let mut arena = Arena::for_lines(&config);
    let mut report = LexReport::default();

    for line in LineReader::new(reader, &config) {
        let line = match line {
            Ok(line) => line,
            Err(ReadError::Io(e)) => return Err(e),
            Err(ReadError::Line(error)) => {
                tracing::warn!(%error, "skipping line");
                report.errors.push(error);
                continue;
            }
        };

        match lexer.tokenize_source_line(&line, &mut arena) {
            Ok(tokenized) => report.lines.push(LexedLine {
                number: line.number,
                start: line.start,
                indentation: tokenized.indentation(),
                chunks: tokenized.to_strings(),
            }),
            Err(error) => {
                tracing::warn!(%error, "skipping line");
                report.errors.push(error);
            }
        }

        arena.reset();
    }

    tracing::debug!(
        lines = report.lines.len(),
        errors = report.errors.len(),
        "source lexed"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{BufReader, Cursor};

    fn read_all(source: &[u8], config: &LexerConfig) -> Vec<Result<SourceLine, String>> {
        LineReader::new(Cursor::new(source.to_vec()), config)
            .map(|line| line.map_err(|e| e.to_string()))
            .collect()
    }

    #[test]
    fn test_splits_lines() {
        let lines = read_all(b"first\nsecond\r\n\nlast", &LexerConfig::default());
        let lines: Vec<SourceLine> = lines.into_iter().map(Result::unwrap).collect();

        assert_eq!(
            lines,
            vec![
                SourceLine { number: 1, start: 0, bytes: b"first".to_vec() },
                SourceLine { number: 2, start: 6, bytes: b"second".to_vec() },
                SourceLine { number: 3, start: 14, bytes: b"".to_vec() },
                SourceLine { number: 4, start: 15, bytes: b"last".to_vec() },
            ]
        );
    }

    #[test]
    fn test_empty_source() {
        assert!(read_all(b"", &LexerConfig::default()).is_empty());
    }

    #[test]
    fn test_line_of_exact_length() {
        let config = LexerConfig::default().with_max_line_length(4);
        let lines = read_all(b"abcd\r\nefgh", &config);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].as_ref().unwrap().bytes, b"abcd");
        assert_eq!(lines[1].as_ref().unwrap().bytes, b"efgh");
    }

    #[test]
    fn test_overlong_line_is_skipped() {
        let config = LexerConfig::default().with_max_line_length(4);
        let lines = read_all(b"ok\nabcdefghijkl\nfine\n", &config);

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].as_ref().unwrap().bytes, b"ok");
        assert_eq!(
            lines[1].as_ref().unwrap_err(),
            "line 2, column 5: line is 12 bytes long, but the maximum is 4 bytes"
        );
        let last = lines[2].as_ref().unwrap();
        assert_eq!(last.number, 3);
        assert_eq!(last.start, 16);
        assert_eq!(last.bytes, b"fine");
    }

    #[test]
    fn test_overlong_final_line_without_newline() {
        let config = LexerConfig::default().with_max_line_length(4);
        let lines = read_all(b"abcde", &config);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_err());
    }

    #[test]
    fn test_skipping_crosses_buffer_boundaries() {
        let config = LexerConfig::default().with_max_line_length(4);
        let mut source = vec![b'x'; 100];
        source.extend_from_slice(b"\r\ngive\n");

        // A tiny buffer forces several fill_buf calls while skipping
        let reader = BufReader::with_capacity(8, Cursor::new(source));
        let lines: Vec<_> = LineReader::new(reader, &config).collect();

        assert_eq!(lines.len(), 2);
        match &lines[0] {
            Err(ReadError::Line(error)) => {
                assert_eq!(error.kind, LexErrorKind::LineTooLong { length: 100, max: 4 })
            }
            other => panic!("expected a line error, got {:?}", other),
        }
        let give = lines[1].as_ref().unwrap();
        assert_eq!(give.bytes, b"give");
        assert_eq!(give.start, 102);
    }

    #[test]
    fn test_nul_byte_rejects_the_line() {
        let source = b"give x\0 secret code\nnext\n";
        let report = lex_source(Cursor::new(&source[..]), LexerConfig::default()).unwrap();

        assert_eq!(report.errors.len(), 1);
        let error = &report.errors[0];
        assert_eq!(error.kind, LexErrorKind::EmbeddedNul);
        assert_eq!((error.line, error.offset, error.column), (1, 6, 7));

        assert_eq!(report.lines.len(), 1);
        assert_eq!(report.lines[0].number, 2);
        assert_eq!(report.lines[0].chunks, vec!["next"]);
    }

    #[test]
    fn test_lex_source_continues_after_errors() {
        let source = "DotProduct [Vector2D, Vector2D] -> Vector2D\n  \
                      say \"hi\"\n    give vectorX\n给 commentary\n";
        let report = lex_source(Cursor::new(source), LexerConfig::default()).unwrap();

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].line, 2);
        assert!(report.has_errors());

        let numbers: Vec<u32> = report.lines.iter().map(|l| l.number).collect();
        assert_eq!(numbers, vec![1, 3, 4]);
        assert_eq!(report.lines[1].chunks, vec!["give", "vectorX"]);
        assert_eq!(report.lines[1].validate_indent(), Ok(2));
        assert!(report.lines[2].chunks.is_empty());
    }
}
