//! day-error - Diagnostics system for the Day language
//!
//! This crate provides the structures every Day tool uses to report
//! problems: a location ([`Span`]), a structured message ([`Diagnostic`])
//! and a renderer that quotes the offending source line.
//!
//! # Example
//!
//! ```rust
//! use day_error::{Diagnostic, DiagnosticRenderer, ErrorCode, SourceCache, Span};
//!
//! let mut cache = SourceCache::new();
//! let file_id = cache.add("example.day", "   give vectorX");
//!
//! let diagnostic = Diagnostic::error("indent uses an odd number of spaces")
//!     .with_code(ErrorCode::ODD_INDENTATION)
//!     .with_label(Span::on_line(file_id, 1, 1, 3, 0, 3), "3 spaces");
//!
//! let renderer = DiagnosticRenderer::new(&cache);
//! println!("{}", renderer.render(&diagnostic));
//! ```

pub mod diagnostic;
pub mod span;

pub use diagnostic::{
    Diagnostic, DiagnosticRenderer, ErrorCode, Label, Level, SourceCache, SourceFile,
};
pub use span::{Position, Span};

/// Collection of diagnostics accumulated while processing a file
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|d| d.level == Level::Error)
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.level == Level::Error).count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Renders all diagnostics, separated by blank lines
    pub fn render(&self, renderer: &DiagnosticRenderer<'_>) -> String {
        self.items
            .iter()
            .map(|d| renderer.render(d))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
