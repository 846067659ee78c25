//! Integration tests for the Day line lexer
//!
//! Exercises the whole pipeline the way the `day` binary runs it:
//! Source → LineReader → Lexer → Arena reset → Diagnostics

use day_error::{DiagnosticRenderer, Diagnostics, SourceCache};
use day_lexer::{lex_source, Arena, LexError, LexReport, Lexer, LexerConfig};
use std::io::Cursor;

/// Lexes a whole source with the default configuration
pub fn lex(source: &str) -> LexReport {
    lex_with(source, LexerConfig::default())
}

/// Lexes a whole source with a custom configuration
pub fn lex_with(source: &str, config: LexerConfig) -> LexReport {
    lex_source(Cursor::new(source), config).expect("reading from memory cannot fail")
}

/// Lexes one line and returns its indent level and chunks
pub fn lex_line(line: &str) -> Result<(f32, Vec<String>), LexError> {
    let config = LexerConfig::default();
    let mut arena = Arena::for_lines(&config);
    let tokenized = Lexer::new(config).tokenize_line(line, &mut arena)?;
    Ok((tokenized.indent_level().as_f32(), tokenized.to_strings()))
}

/// Asserts that a source lexes without errors, indentation included
pub fn assert_lexes(source: &str) -> LexReport {
    let report = lex(source);
    if report.has_errors() {
        panic!(
            "Expected source to lex, but got errors:\n{:?}",
            report.errors
        );
    }
    for line in &report.lines {
        if let Err(error) = line.validate_indent() {
            panic!("Expected valid indentation, but got: {}", error);
        }
    }
    report
}

/// Asserts that a source produces at least one error
pub fn assert_lex_fails(source: &str) -> Vec<LexError> {
    let report = lex(source);
    if !report.has_errors() {
        panic!("Expected source to fail lexing, but it succeeded");
    }
    report.errors
}

/// Asserts the chunks of a single line
pub fn assert_chunks(line: &str, expected: &[&str]) {
    match lex_line(line) {
        Ok((_, chunks)) => {
            if chunks != expected {
                panic!(
                    "Expected chunks {:?} for {:?}, but got {:?}",
                    expected, line, chunks
                );
            }
        }
        Err(error) => panic!("Expected {:?} to lex, but got: {}", line, error),
    }
}

/// Asserts that a line is ignored as commentary
pub fn assert_commentary(line: &str) {
    match lex_line(line) {
        Ok((level, chunks)) => {
            if level != 0.0 || !chunks.is_empty() {
                panic!(
                    "Expected {:?} to be commentary, but got indent {} and chunks {:?}",
                    line, level, chunks
                );
            }
        }
        Err(error) => panic!("Expected {:?} to lex, but got: {}", line, error),
    }
}

/// Renders every error of a report without colors
pub fn render_errors(name: &str, source: &str, report: &LexReport) -> String {
    let mut cache = SourceCache::new();
    let file_id = cache.add(name, source);
    let renderer = DiagnosticRenderer::new(&cache).without_colors();

    let mut diagnostics = Diagnostics::new();
    diagnostics.extend(report.errors.iter().map(|e| e.to_diagnostic(file_id)));
    diagnostics.render(&renderer)
}



#[cfg(test)]
mod diagnostic_tests {
    use super::*;

    #[test]
    fn test_rendered_quotation_error() {
        let source = "ok\n  say \"hi\"\n";
        let report = lex(source);
        let rendered = render_errors("greeting.day", source, &report);

        assert!(rendered.contains("error[EL005]: quotations are not supported yet"));
        assert!(rendered.contains(" --> greeting.day:2:7"));
        assert!(rendered.contains("  say \"hi\""));
        assert!(rendered.contains("help: remove the quotation mark"));
    }

    #[test]
    fn test_rendered_odd_indentation_warning() {
        let source = "Square [Number] -> Number\n\t give number\n";
        let report = lex(source);
        let error = report.lines[1].validate_indent().unwrap_err();

        let mut cache = SourceCache::new();
        let file_id = cache.add("square.day", source);
        let rendered = DiagnosticRenderer::new(&cache)
            .without_colors()
            .render(&error.to_warning(file_id));

        assert!(rendered.starts_with("warning[EL006]: indent is 1.5 levels; it must be a whole number"));
        assert!(rendered.contains(" --> square.day:2:1"));
        assert!(rendered.contains("note: measured 3 half-levels"));
    }

    #[test]
    fn test_nul_byte_is_reported() {
        let source = "give x\0 secret code\nnext\n";
        let report = lex(source);
        let rendered = render_errors("nul.day", source, &report);

        assert_eq!(report.lines.len(), 1);
        assert!(rendered.contains("error[EL008]: line contains a NUL byte"));
        assert!(rendered.contains(" --> nul.day:1:7"));
    }

    #[test]
    fn test_rendered_line_too_long() {
        let source = "abcdefgh\n";
        let report = lex_with(source, LexerConfig::default().with_max_line_length(4));
        let rendered = render_errors("long.day", source, &report);

        assert!(rendered.contains("error[EL002]: line is 8 bytes long, but the maximum is 4 bytes"));
        assert!(rendered.contains(" --> long.day:1:5"));
    }
}

/// Helper to lex a file from the demos directory
#[cfg(test)]
fn lex_demo_file(filename: &str) -> (String, LexReport) {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
        .join(filename);

    let source = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));

    let report = lex(&source);
    (source, report)
}
