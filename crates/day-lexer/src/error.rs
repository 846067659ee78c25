//! Lexer errors
//!
//! Every error aborts the current line only. It records where the line
//! sits in the file and where in the line the problem is, so the driver
//! can render a diagnostic and move on to the next line.

use crate::arena::ArenaError;
use crate::indent::IndentLevel;
use crate::utf8::Utf8Error;
use day_error::{Diagnostic, ErrorCode, Span};
use thiserror::Error;

/// What went wrong
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("malformed UTF-8: {0}")]
    MalformedEncoding(#[from] Utf8Error),
    #[error("line is {length} bytes long, but the maximum is {max} bytes")]
    LineTooLong { length: usize, max: usize },
    #[error("line has more than {max} chunks of code")]
    TooManyChunksOnLine { max: usize },
    /// Arena exhaustion, or a handle misused by the caller
    #[error("{0}")]
    Arena(#[from] ArenaError),
    #[error("{construct} are not supported yet")]
    UnsupportedConstruct { construct: &'static str },
    #[error("indent is {} levels; it must be a whole number", levels(.halves))]
    OddIndentation { halves: u32 },
    #[error("cannot copy text from offset {start} to offset {end}")]
    InvalidRange { start: usize, end: usize },
    #[error("line contains a NUL byte")]
    EmbeddedNul,
}

fn levels(halves: &u32) -> IndentLevel {
    IndentLevel::from_halves(*halves)
}

impl LexErrorKind {
    pub fn code(&self) -> ErrorCode {
        match self {
            LexErrorKind::MalformedEncoding(_) => ErrorCode::MALFORMED_ENCODING,
            LexErrorKind::LineTooLong { .. } => ErrorCode::LINE_TOO_LONG,
            LexErrorKind::TooManyChunksOnLine { .. } => ErrorCode::TOO_MANY_CHUNKS,
            LexErrorKind::Arena(ArenaError::Exhausted { .. }) => ErrorCode::ARENA_EXHAUSTED,
            LexErrorKind::Arena(_) => ErrorCode::INVALID_RANGE,
            LexErrorKind::UnsupportedConstruct { .. } => ErrorCode::UNSUPPORTED_CONSTRUCT,
            LexErrorKind::OddIndentation { .. } => ErrorCode::ODD_INDENTATION,
            LexErrorKind::InvalidRange { .. } => ErrorCode::INVALID_RANGE,
            LexErrorKind::EmbeddedNul => ErrorCode::EMBEDDED_NUL,
        }
    }

    pub fn is_arena_exhausted(&self) -> bool {
        matches!(self, LexErrorKind::Arena(ArenaError::Exhausted { .. }))
    }

    fn help(&self) -> String {
        match self {
            LexErrorKind::MalformedEncoding(_) => "save the source file as UTF-8".to_string(),
            LexErrorKind::LineTooLong { max, .. } => {
                format!("split this line so it is at most {} bytes long", max)
            }
            LexErrorKind::TooManyChunksOnLine { .. } => {
                "split this line into several shorter lines".to_string()
            }
            LexErrorKind::Arena(ArenaError::Exhausted { .. }) => {
                "give the lexer a larger arena or shorten this line".to_string()
            }
            LexErrorKind::UnsupportedConstruct { .. } => {
                "remove the quotation mark; quoted text is not supported yet".to_string()
            }
            LexErrorKind::OddIndentation { .. } => {
                "indent with a multiple of two spaces, or with tabs".to_string()
            }
            LexErrorKind::Arena(_) | LexErrorKind::InvalidRange { .. } => {
                "this is a bug in the lexer; please report it".to_string()
            }
            LexErrorKind::EmbeddedNul => {
                "remove the NUL byte; Day sources are plain text".to_string()
            }
        }
    }

    fn note(&self) -> Option<String> {
        match self {
            LexErrorKind::OddIndentation { halves } => Some(format!(
                "measured {} half-levels; two half-levels make one level",
                halves
            )),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            LexErrorKind::MalformedEncoding(_) => "invalid byte sequence",
            LexErrorKind::LineTooLong { .. } => "line exceeds the limit here",
            LexErrorKind::TooManyChunksOnLine { .. } => "one chunk too many",
            LexErrorKind::Arena(_) => "while copying this chunk",
            LexErrorKind::UnsupportedConstruct { .. } => "quotation starts here",
            LexErrorKind::OddIndentation { .. } => "indentation",
            LexErrorKind::InvalidRange { .. } => "while copying this chunk",
            LexErrorKind::EmbeddedNul => "NUL byte here",
        }
    }
}

/// An error located in the source
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: {kind}")]
pub struct LexError {
    pub kind: LexErrorKind,
    /// Line number (1-indexed)
    pub line: u32,
    /// Byte offset of the line within the file
    pub line_start: usize,
    /// Byte offset of the problem within the line
    pub offset: usize,
    /// Column of the problem (1-indexed, in characters)
    pub column: u32,
    /// How many characters the problem spans
    pub width: u32,
    /// How many bytes the problem spans
    pub len: usize,
}

impl LexError {
    pub fn new(kind: impl Into<LexErrorKind>, offset: usize, column: u32) -> Self {
        Self {
            kind: kind.into(),
            line: 1,
            line_start: 0,
            offset,
            column,
            width: 1,
            len: 1,
        }
    }

    pub fn spanning(mut self, width: u32, len: usize) -> Self {
        self.width = width.max(1);
        self.len = len;
        self
    }

    /// Places the error on line `number`, which starts at byte `start`
    pub fn at_line(mut self, number: u32, start: usize) -> Self {
        self.line = number;
        self.line_start = start;
        self
    }

    pub fn code(&self) -> ErrorCode {
        self.kind.code()
    }

    pub fn to_diagnostic(&self, file_id: u32) -> Diagnostic {
        self.describe(Diagnostic::error(self.kind.to_string()), file_id)
    }

    /// Like [`LexError::to_diagnostic`], at warning level
    pub fn to_warning(&self, file_id: u32) -> Diagnostic {
        self.describe(Diagnostic::warning(self.kind.to_string()), file_id)
    }

    fn describe(&self, diagnostic: Diagnostic, file_id: u32) -> Diagnostic {
        let span = Span::on_line(
            file_id,
            self.line,
            self.column,
            self.width,
            self.line_start + self.offset,
            self.len,
        );

        let diagnostic = diagnostic
            .with_code(self.code())
            .with_label(span, self.kind.label())
            .with_help(self.kind.help());

        match self.kind.note() {
            Some(note) => diagnostic.with_note(note),
            None => diagnostic,
        }
    }
}
