//! Day lexer CLI

use clap::{Args, Parser, Subcommand};
use day_error::{Diagnostic, DiagnosticRenderer, Diagnostics, ErrorCode, SourceCache};
use day_lexer::utf8::decode_at;
use day_lexer::{is_commentary, Arena, Lexer, LexerConfig, LineReader, ReadError, TokenizedLine};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "day")]
#[command(author = "Guilherme Mendes")]
#[command(version = "0.1.0")]
#[command(about = "Day language line lexer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    limits: Limits,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored diagnostics
    #[arg(long, global = true)]
    no_color: bool,
}

/// Lexer limits, mirrored into `LexerConfig`
#[derive(Args)]
struct Limits {
    /// Maximum bytes per line, excluding the line terminator
    #[arg(long, global = true, value_name = "BYTES")]
    max_line_length: Option<usize>,

    /// Maximum chunks of code per line
    #[arg(long, global = true, value_name = "COUNT")]
    max_chunks: Option<usize>,

    /// Half-levels of indentation per tab or fullwidth space
    #[arg(long, global = true, value_name = "HALVES")]
    wide_indent_halves: Option<u32>,
}

impl Limits {
    fn config(&self) -> LexerConfig {
        let mut config = LexerConfig::default();
        if let Some(bytes) = self.max_line_length {
            config = config.with_max_line_length(bytes);
        }
        if let Some(chunks) = self.max_chunks {
            config = config.with_max_chunks(chunks);
        }
        if let Some(halves) = self.wide_indent_halves {
            config = config.with_wide_indent_halves(halves);
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Shows the indent level and chunks of every line
    Lex {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Checks every line, including indentation, without printing chunks
    Check {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Shows the codepoint of every character and whether it is commentary
    Chars {
        /// Text to inspect
        #[arg(value_name = "TEXT")]
        text: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.limits.config();
    tracing::debug!(?config, "lexer configuration");

    match cli.command {
        Commands::Lex { input } => {
            println!("Tokenizing: {}\n", input.display());
            run_file(&input, config, !cli.no_color, Mode::Lex)
        }
        Commands::Check { input } => {
            println!("Checking: {}\n", input.display());
            run_file(&input, config, !cli.no_color, Mode::Check)
        }
        Commands::Chars { text } => {
            print_chars(&text);
            ExitCode::SUCCESS
        }
    }
}

/// Installs the stderr log subscriber
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Lex,
    Check,
}

#[derive(Default)]
struct Summary {
    lines: usize,
    code_lines: usize,
    chunks: usize,
}

fn run_file(input: &Path, config: LexerConfig, use_colors: bool, mode: Mode) -> ExitCode {
    let bytes = match fs::read(input) {
        Ok(bytes) => bytes,
        Err(e) => {
            let diagnostic = Diagnostic::error(format!("could not read {}: {}", input.display(), e))
                .with_code(ErrorCode::UNREADABLE_SOURCE);
            eprintln!("{}", diagnostic);
            return ExitCode::FAILURE;
        }
    };

    let mut cache = SourceCache::new();
    let file_id = cache.add(input.display().to_string(), String::from_utf8_lossy(&bytes));
    let renderer = DiagnosticRenderer::new(&cache).with_colors(use_colors);

    let lexer = Lexer::new(config);
    let mut arena = Arena::for_lines(&config);
    let mut diagnostics = Diagnostics::new();
    let mut summary = Summary::default();

    for line in LineReader::new(&bytes[..], &config) {
        summary.lines += 1;

        let line = match line {
            Ok(line) => line,
            Err(ReadError::Line(error)) => {
                report(&mut diagnostics, &renderer, error.to_diagnostic(file_id));
                continue;
            }
            Err(ReadError::Io(e)) => {
                eprintln!("Error reading file: {}", e);
                return ExitCode::FAILURE;
            }
        };

        match lexer.tokenize_source_line(&line, &mut arena) {
            Ok(tokenized) => {
                if !tokenized.is_empty() {
                    summary.code_lines += 1;
                    summary.chunks += tokenized.chunk_count();
                }
                if mode == Mode::Lex {
                    render_line(&tokenized);
                }
                // Odd indentation only fails `check`; `lex` still shows the line.
                if let Err(error) = tokenized.validate_indent() {
                    let diagnostic = match mode {
                        Mode::Lex => error.to_warning(file_id),
                        Mode::Check => error.to_diagnostic(file_id),
                    };
                    report(&mut diagnostics, &renderer, diagnostic);
                }
            }
            Err(error) => report(&mut diagnostics, &renderer, error.to_diagnostic(file_id)),
        }

        arena.reset();
    }

    println!(
        "\nTotal: {} lines, {} with code, {} chunks",
        summary.lines, summary.code_lines, summary.chunks
    );

    let warnings = diagnostics.len() - diagnostics.error_count();
    if warnings > 0 {
        println!("{} warning(s)", warnings);
    }

    if diagnostics.has_errors() {
        println!("{} error(s) found", diagnostics.error_count());
        ExitCode::FAILURE
    } else {
        if mode == Mode::Check {
            println!("No errors found!");
        }
        ExitCode::SUCCESS
    }
}

/// Prints a diagnostic right away and keeps it for the summary
fn report(diagnostics: &mut Diagnostics, renderer: &DiagnosticRenderer<'_>, diagnostic: Diagnostic) {
    tracing::info!(%diagnostic, "line reported");
    eprintln!("{}", renderer.render(&diagnostic));
    diagnostics.push(diagnostic);
}

/// Renders a tokenized line for debug purposes
fn render_line(tokenized: &TokenizedLine<'_>) {
    println!("Line #{}", tokenized.line());
    println!("  Indent level: {}", tokenized.indent_level());
    println!("  Chunk count: {}", tokenized.chunk_count());
    for chunk in tokenized.chunks() {
        println!("    {}", chunk);
    }
}

fn print_chars(text: &str) {
    let bytes = text.as_bytes();
    let mut offset = 0;

    while offset < bytes.len() {
        let ch = match decode_at(bytes, offset) {
            Ok(ch) => ch,
            Err(e) => {
                eprintln!("offset {}: {}", offset, e);
                return;
            }
        };
        let width = ch.width.bytes();
        let kind = if is_commentary(ch.codepoint) {
            "commentary"
        } else {
            "code"
        };

        println!(
            "{}\t(0x{:08x})   {}",
            &text[offset..offset + width],
            ch.codepoint,
            kind
        );
        offset += width;
    }
}
