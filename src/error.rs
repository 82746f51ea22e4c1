//! Error types shared by every stage of the pipeline.
//!
//! All fallible operations return [`CompileResult`]; the first failure aborts
//! the compilation unit and surfaces as a non-zero exit code in the driver.
//! Source-anchored problems are carried as [`Diagnostic`]s which render with a
//! `file:line:column` header and an underlined excerpt of the offending line.

use strum::VariantNames;

use crate::backend::targets::Target;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Diagnostic(#[from] Diagnostic),

    #[error("unknown target `{name}` (expected one of: {})", Target::VARIANTS.join(", "))]
    UnknownTarget { name: String },

    #[error("target `{target}` is not supported yet")]
    UnimplementedTarget { target: Target },

    #[error("target `{target}` cannot lower {construct}")]
    UnsupportedLowering {
        target: Target,
        construct: &'static str,
    },

    #[error("malformed program handed to code generation: {detail}")]
    MalformedProgram { detail: String },
}

/// Which class of front-end error a [`Diagnostic`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum DiagnosticKind {
    Lexical,
    Syntax,
    Semantic,
}

/// A source-anchored error with a pre-rendered excerpt of the offending line.
///
/// Line and column are 1-based and computed by rescanning the buffer from the
/// start; that lookup is O(n) and only ever runs while building one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub origin: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub excerpt: String,
    pub notes: Vec<DiagnosticNote>,
}

/// A secondary location attached to a [`Diagnostic`], e.g. pointing at the
/// original definition in a redeclaration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticNote {
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub excerpt: String,
}

impl Diagnostic {
    pub fn with_note(mut self, note: DiagnosticNote) -> Self {
        self.notes.push(note);
        self
    }
}

impl core::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        use colored::Colorize;

        write!(
            f,
            "{}:{}:{}: {} {}\n{}",
            self.origin,
            self.line,
            self.column,
            format!("{} error:", self.kind).red().bold(),
            self.message,
            self.excerpt
        )?;

        for note in &self.notes {
            write!(
                f,
                "\n{}:{}:{}: {} {}\n{}",
                self.origin,
                note.line,
                note.column,
                "note:".cyan().bold(),
                note.message,
                note.excerpt
            )?;
        }

        Ok(())
    }
}

impl std::error::Error for Diagnostic {}
