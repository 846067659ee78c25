//! day-lexer - Line lexer for the Day language
//!
//! Day is processed one line at a time. For each line the lexer:
//!
//! - Measures the indentation in half-levels (2 spaces = 1 tab = 1 level)
//! - Drops whitespace and commentary (Chinese characters)
//! - Copies the remaining chunks of code into a per-line [`Arena`]
//!
//! # Example
//!
//! ```rust
//! use day_lexer::{Arena, Lexer, LexerConfig};
//!
//! let config = LexerConfig::default();
//! let lexer = Lexer::new(config);
//! let mut arena = Arena::for_lines(&config);
//!
//! let line = lexer.tokenize_line("    give vector的x", &mut arena).unwrap();
//! assert_eq!(line.indent_level().as_f32(), 2.0);
//! assert_eq!(line.to_strings(), vec!["give", "vector", "x"]);
//!
//! // The chunks borrow the arena, so they must be gone before a reset.
//! drop(line);
//! arena.reset();
//! ```

pub mod arena;
pub mod config;
pub mod error;
pub mod indent;
pub mod lexer;
pub mod source;
pub mod text;
pub mod utf8;

pub use arena::{Arena, ArenaError, ArenaSlice};
pub use config::LexerConfig;
pub use error::{LexError, LexErrorKind};
pub use indent::{IndentLevel, Indentation};
pub use lexer::{is_delimiter, tokenize_line, Chunk, Lexer, TokenizedLine};
pub use source::{lex_source, LexReport, LexedLine, LineReader, ReadError, SourceLine};
pub use utf8::{is_commentary, CharWidth, Utf8Error};
