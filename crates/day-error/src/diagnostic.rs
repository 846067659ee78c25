//! Diagnostic - compiler-style error messages
//!
//! A diagnostic carries:
//! - An error code (EL001, EL002, etc.)
//! - The offending line and column
//! - The source line itself, underlined
//! - An actionable hint

use crate::span::Span;
use std::fmt;

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Stops the line from being processed
    Error,
    /// Reported, but the line is still usable
    Warning,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
        }
    }

    /// ANSI color escape for this level
    fn color_code(&self) -> &'static str {
        match self {
            Level::Error => "\x1b[1;31m",   // Bold Red
            Level::Warning => "\x1b[1;33m", // Bold Yellow
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured error code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode {
    /// Category (L = Lexer, D = Driver)
    pub category: char,
    /// Error number
    pub number: u16,
}

impl ErrorCode {
    pub const fn new(category: char, number: u16) -> Self {
        Self { category, number }
    }

    // Lexer errors
    pub const MALFORMED_ENCODING: Self = Self::new('L', 1);
    pub const LINE_TOO_LONG: Self = Self::new('L', 2);
    pub const TOO_MANY_CHUNKS: Self = Self::new('L', 3);
    pub const ARENA_EXHAUSTED: Self = Self::new('L', 4);
    pub const UNSUPPORTED_CONSTRUCT: Self = Self::new('L', 5);
    pub const ODD_INDENTATION: Self = Self::new('L', 6);
    pub const INVALID_RANGE: Self = Self::new('L', 7);
    pub const EMBEDDED_NUL: Self = Self::new('L', 8);

    // Driver errors
    pub const UNREADABLE_SOURCE: Self = Self::new('D', 1);
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}{:03}", self.category, self.number)
    }
}

/// A label pointing at a region of a line
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

/// A complete diagnostic
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: Level,
    pub code: Option<ErrorCode>,
    /// Main message
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    /// Fix suggestions
    pub help: Vec<String>,
}

impl Diagnostic {
    fn with_level(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
            help: Vec::new(),
        }
    }

    /// Creates a new error
    pub fn error(message: impl Into<String>) -> Self {
        Self::with_level(Level::Error, message)
    }

    /// Creates a new warning
    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_level(Level::Warning, message)
    }

    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label {
            span,
            message: message.into(),
        });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help.push(help.into());
        self
    }

    /// Line of the first label, if any
    pub fn line(&self) -> Option<u32> {
        self.labels.first().map(|label| label.span.start.line)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{}[{}]: {}", self.level, code, self.message)?,
            None => write!(f, "{}: {}", self.level, self.message)?,
        }
        if let Some(line) = self.line() {
            write!(f, " (line {})", line)?;
        }
        Ok(())
    }
}

/// Stores source files so diagnostics can quote the offending line
#[derive(Debug, Default)]
pub struct SourceCache {
    files: Vec<SourceFile>,
}

#[derive(Debug)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    /// Byte offset where each line starts
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// Returns a line without its terminator (line is 1-indexed)
    pub fn get_line(&self, line: u32) -> Option<&str> {
        let line_idx = line.checked_sub(1)? as usize;
        let start = *self.line_starts.get(line_idx)?;
        let end = self
            .line_starts
            .get(line_idx + 1)
            .map(|&e| e.saturating_sub(1))
            .unwrap_or(self.source.len());

        Some(self.source[start..end].trim_end_matches('\r'))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file and returns its ID
    pub fn add(&mut self, name: impl Into<String>, source: impl Into<String>) -> u32 {
        let id = self.files.len() as u32;
        self.files.push(SourceFile::new(name, source));
        id
    }

    pub fn get(&self, id: u32) -> Option<&SourceFile> {
        self.files.get(id as usize)
    }
}

/// ANSI escapes used by the renderer; all empty when colors are off
struct Palette {
    level: &'static str,
    bold: &'static str,
    blue: &'static str,
    green: &'static str,
    reset: &'static str,
}

impl Palette {
    fn new(level: Level, use_colors: bool) -> Self {
        if use_colors {
            Self {
                level: level.color_code(),
                bold: "\x1b[1m",
                blue: "\x1b[1;34m",
                green: "\x1b[1;32m",
                reset: "\x1b[0m",
            }
        } else {
            Self {
                level: "",
                bold: "",
                blue: "",
                green: "",
                reset: "",
            }
        }
    }
}

/// Renders a diagnostic for display
pub struct DiagnosticRenderer<'a> {
    cache: &'a SourceCache,
    use_colors: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(cache: &'a SourceCache) -> Self {
        Self {
            cache,
            use_colors: true,
        }
    }

    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// Renders the diagnostic as a string
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let p = Palette::new(diagnostic.level, self.use_colors);
        let mut output = String::new();

        // error[EL001]: message
        output.push_str(p.level);
        output.push_str(diagnostic.level.as_str());
        if let Some(code) = &diagnostic.code {
            output.push_str(&format!("[{}]", code));
        }
        output.push_str(&format!("{}{}: {}{}\n", p.reset, p.bold, diagnostic.message, p.reset));

        for label in &diagnostic.labels {
            self.render_label(&mut output, label, &p);
        }

        for note in &diagnostic.notes {
            output.push_str(&format!("   = {}note{}: {}\n", p.bold, p.reset, note));
        }

        for help in &diagnostic.help {
            output.push_str(&format!("   = {}help{}: {}\n", p.green, p.reset, help));
        }

        output
    }

    fn render_label(&self, output: &mut String, label: &Label, p: &Palette) {
        let Some(file) = self.cache.get(label.span.file_id) else {
            return;
        };
        let start = label.span.start;

        // --> file:line:column
        output.push_str(&format!(
            " {}-->{} {}:{}:{}\n",
            p.blue, p.reset, file.name, start.line, start.column
        ));

        let Some(line_content) = file.get_line(start.line) else {
            return;
        };
        let gutter = " ".repeat(start.line.to_string().len());

        output.push_str(&format!(" {} {}|{}\n", gutter, p.blue, p.reset));
        output.push_str(&format!(
            " {}{}{} | {}\n",
            p.blue, start.line, p.reset, line_content
        ));

        let underline_len = if label.span.end.line == start.line {
            label.span.end.column.saturating_sub(start.column).max(1) as usize
        } else {
            1
        };
        let indent = " ".repeat((start.column as usize).saturating_sub(1));

        output.push_str(&format!(
            " {} {}|{} {}{}{}{} {}\n",
            gutter,
            p.blue,
            p.reset,
            indent,
            p.level,
            "^".repeat(underline_len),
            p.reset,
            label.message
        ));
    }
}
