use std::path::PathBuf;

use colored::{Color, Colorize};

use self::lexer::Span;
use crate::error::{Diagnostic, DiagnosticKind, DiagnosticNote};

pub mod intern;
pub mod lexer;
pub mod parser;

#[derive(Debug)]
pub struct SourceFile {
    pub contents: String,
    pub origin: SourceFileOrigin,
}

impl SourceFile {
    pub fn new(contents: impl Into<String>, origin: SourceFileOrigin) -> Self {
        Self {
            contents: contents.into(),
            origin,
        }
    }

    pub fn in_memory(contents: impl Into<String>) -> Self {
        Self::new(contents, SourceFileOrigin::Memory)
    }

    pub fn value_of_span(&self, span: Span) -> &str {
        &self.contents[span.start..span.end]
    }

    /// 1-based line number of a byte offset, found by rescanning the buffer
    /// from the start. O(n); only for diagnostic and dump paths.
    pub fn line_number_for_position(&self, position: usize) -> usize {
        let position = position.min(self.contents.len());

        1 + self.contents[..position]
            .bytes()
            .filter(|b| *b == b'\n')
            .count()
    }

    /// 1-based column of a byte offset. Same rescan cost caveat as
    /// [`Self::line_number_for_position`].
    pub fn column_for_position(&self, position: usize) -> usize {
        let (line_start, _) = self.line_bounds_for_position(position);
        position.min(self.contents.len()) - line_start + 1
    }

    /// Byte range of the line containing `position`, excluding the newline.
    fn line_bounds_for_position(&self, position: usize) -> (usize, usize) {
        let position = position.min(self.contents.len());

        let start = self.contents[..position]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let end = self.contents[position..]
            .find('\n')
            .map(|i| position + i)
            .unwrap_or(self.contents.len());

        (start, end)
    }

    pub fn diagnostic(
        &self,
        kind: DiagnosticKind,
        span: Span,
        message: impl Into<String>,
    ) -> Diagnostic {
        Diagnostic {
            kind,
            origin: self.origin.to_string(),
            line: self.line_number_for_position(span.start),
            column: self.column_for_position(span.start),
            message: message.into(),
            excerpt: self.underline_span(span, Color::Red),
            notes: Vec::new(),
        }
    }

    pub fn note(&self, span: Span, message: impl Into<String>) -> DiagnosticNote {
        DiagnosticNote {
            line: self.line_number_for_position(span.start),
            column: self.column_for_position(span.start),
            message: message.into(),
            excerpt: self.underline_span(span, Color::Cyan),
        }
    }

    /// Renders the source line containing the start of `span` with a
    /// caret/tilde marker underneath the spanned characters.
    fn underline_span(&self, span: Span, tint: Color) -> String {
        let (line_start, line_end) = self.line_bounds_for_position(span.start);
        let line = &self.contents[line_start..line_end];

        let offset = span.start.min(line_end) - line_start;
        let width = span.end.min(line_end).saturating_sub(span.start).max(1);

        let marker = format!("{}^{}", " ".repeat(offset), "~".repeat(width - 1));

        format!("{line}\n{}", marker.color(tint).bold())
    }
}

#[derive(Debug)]
pub enum SourceFileOrigin {
    Memory,
    File(PathBuf),
}

impl core::fmt::Display for SourceFileOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFileOrigin::Memory => f.write_str("<memory>"),
            SourceFileOrigin::File(path) => f.write_fmt(format_args!("{}", path.display())),
        }
    }
}
