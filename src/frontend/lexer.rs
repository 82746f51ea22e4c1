use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::str::Chars;

use itertools::{PeekNth, peek_nth};
use once_cell::sync::Lazy;

use crate::SourceFile;
use crate::error::{CompileResult, DiagnosticKind};

/// Fixed capacity of the scratch buffer string literals are decoded into.
/// Exceeding it is a lexical error, not a reallocation.
pub const STRING_STORAGE_SIZE: usize = 1024;

/// Closed set of reserved words. Words lex as [`TokenKind::Identifier`]
/// either way; the parser decides keyword-vs-identifier meaning contextually.
static KEYWORDS: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    BTreeSet::from(["None", "def", "else", "if", "int", "return", "while"])
});

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(word)
}

/// Table of single char tokens (matched after longer sequences are checked for)
static SINGLE_TOKENS: Lazy<BTreeMap<char, TokenKind>> = Lazy::new(|| {
    BTreeMap::from([
        ('(', TokenKind::OpenParen),
        (')', TokenKind::CloseParen),
        ('{', TokenKind::OpenBrace),
        ('}', TokenKind::CloseBrace),
        (';', TokenKind::Semicolon),
        (':', TokenKind::Colon),
        (',', TokenKind::Comma),
        ('+', TokenKind::Plus),
        ('-', TokenKind::Minus),
        ('*', TokenKind::Asterisk),
        ('/', TokenKind::Divide),
        ('%', TokenKind::Modulus),
        ('&', TokenKind::Ampersand),
        ('|', TokenKind::Pipe),
        ('^', TokenKind::Caret),
        ('!', TokenKind::Bang),
        ('=', TokenKind::Equals),
        ('<', TokenKind::LessThan),
        ('>', TokenKind::GreaterThan),
    ])
});

#[derive(Debug)]
pub struct Lexer<'source> {
    source: &'source SourceFile,
    chars: PeekNth<Chars<'source>>,
    position: usize,
    peek_buffer: VecDeque<Token>,
    /// When set, logical line boundaries produce NEWLINE tokens and changes in
    /// leading-whitespace width produce INDENT/DEDENT via `indent_stack`.
    significant_indentation: bool,
    at_line_start: bool,
    indent_stack: Vec<usize>,
    string_storage: Box<[u8; STRING_STORAGE_SIZE]>,
    string_len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TokenKind {
    /* Words */
    Identifier, // main (keywords included; meaning is contextual)

    /* Literals */
    IntegerLiteral, // 1, 0x41
    FloatLiteral,   // 1.0, 1e5 (lexed but unused by the grammar)
    StringLiteral,  // "hello", 'hello'

    /* Block structure (significant-indentation mode only) */
    Newline,
    Indent,
    Dedent,

    /* Delimiters */
    OpenParen,  // (
    CloseParen, // )
    OpenBrace,  // {
    CloseBrace, // }
    Semicolon,  // ;
    Colon,      // :
    Comma,      // ,

    /* Other */
    Arrow, // ->

    /* Binary Ops */
    Plus,                 // +
    Minus,                // -
    Asterisk,             // *
    Divide,               // /
    Modulus,              // %
    Ampersand,            // &
    Pipe,                 // |
    Caret,                // ^
    Bang,                 // !
    ShiftLeft,            // <<
    ShiftRight,           // >>
    DoubleEquals,         // ==
    NotEquals,            // !=
    LessThan,             // <
    LessThanOrEqualTo,    // <=
    GreaterThan,          // >
    GreaterThanOrEqualTo, // >=

    /* Assignment */
    Equals,           // =
    PlusEquals,       // +=
    MinusEquals,      // -=
    MultiplyEquals,   // *=
    DivideEquals,     // /=
    ModulusEquals,    // %=
    AndEquals,        // &=
    OrEquals,         // |=
    XorEquals,        // ^=
    ShiftLeftEquals,  // <<=
    ShiftRightEquals, // >>=
}

impl TokenKind {
    pub fn is_comparison_operator(&self) -> bool {
        matches!(
            self,
            Self::DoubleEquals
                | Self::NotEquals
                | Self::LessThan
                | Self::LessThanOrEqualTo
                | Self::GreaterThan
                | Self::GreaterThanOrEqualTo
        )
    }

    pub fn is_term_operator(&self) -> bool {
        matches!(self, Self::Plus | Self::Minus)
    }

    pub fn is_factor_operator(&self) -> bool {
        matches!(self, Self::Asterisk)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source SourceFile) -> Self {
        Self {
            source,
            chars: peek_nth(source.contents.chars()),
            position: 0,
            peek_buffer: VecDeque::new(),
            significant_indentation: false,
            at_line_start: true,
            indent_stack: vec![0],
            string_storage: Box::new([0; STRING_STORAGE_SIZE]),
            string_len: 0,
        }
    }

    /// A lexer that treats indentation as significant from the first line.
    /// Used by the token dumper; the parser flips the mode on mid-stream when
    /// it sees a `:` body opener instead.
    pub fn with_significant_indentation(source: &'source SourceFile) -> Self {
        let mut lexer = Self::new(source);
        lexer.significant_indentation = true;
        lexer
    }

    pub fn enable_significant_indentation(&mut self) {
        self.significant_indentation = true;
        // The switch happens mid-line (right after a `:` body opener), so the
        // rest of the current line must not be measured as a line start.
        self.at_line_start = false;
    }

    pub fn source(&self) -> &'source SourceFile {
        self.source
    }

    /// Decoded bytes of the most recently lexed string literal.
    pub fn string_value(&self) -> &[u8] {
        &self.string_storage[..self.string_len]
    }

    pub fn next(&mut self) -> CompileResult<Option<Token>> {
        if self.peek_buffer.is_empty() {
            self.refill()?;
        }

        Ok(self.peek_buffer.pop_front())
    }

    pub fn peek(&mut self) -> CompileResult<Option<Token>> {
        if self.peek_buffer.is_empty() {
            self.refill()?;
        }

        Ok(self.peek_buffer.front().copied())
    }

    /// Scans forward until at least one token lands in the peek buffer or the
    /// end of input is reached (buffer left empty).
    fn refill(&mut self) -> CompileResult<()> {
        if self.significant_indentation && self.at_line_start {
            self.scan_line_structure()?;

            if !self.peek_buffer.is_empty() {
                return Ok(());
            }
        }

        self.skip_whitespace_and_comments();

        if self.significant_indentation && self.chars.peek() == Some(&'\n') {
            let start = self.position;
            self.bump();
            self.at_line_start = true;
            self.push_token(TokenKind::Newline, Span::new(start, self.position));
            return Ok(());
        }

        if self.chars.peek().is_none() {
            self.drain_indentation_at_eof();
            return Ok(());
        }

        let token = self.scan_token()?;
        self.peek_buffer.push_back(token);

        Ok(())
    }

    /// At the start of a logical line, skips blank and comment-only lines,
    /// measures the first content line's leading-whitespace width, and emits
    /// INDENT/DEDENT tokens against the indentation stack.
    fn scan_line_structure(&mut self) -> CompileResult<()> {
        loop {
            let line_start = self.position;
            let mut width = 0usize;

            while let Some(c) = self.chars.peek().copied() {
                if c == ' ' || c == '\t' {
                    self.bump();
                    width += 1;
                } else {
                    break;
                }
            }

            match self.chars.peek().copied() {
                // EOF structure is handled by the caller
                None => return Ok(()),
                Some('\r') => {
                    self.bump();
                }
                Some('\n') => {
                    self.bump();
                }
                Some('#') => {
                    self.ignore_line();
                }
                Some(_) => {
                    self.at_line_start = false;

                    let span = Span::new(line_start, line_start + width);
                    let top = *self.indent_stack.last().unwrap();

                    if width > top {
                        self.indent_stack.push(width);
                        self.push_token(TokenKind::Indent, span);
                    } else {
                        while width < *self.indent_stack.last().unwrap() {
                            self.indent_stack.pop();
                            self.push_token(TokenKind::Dedent, span);
                        }

                        if width != *self.indent_stack.last().unwrap() {
                            return Err(self
                                .source
                                .diagnostic(
                                    DiagnosticKind::Lexical,
                                    span,
                                    format!(
                                        "inconsistent indentation: width {width} does not match \
                                         any enclosing block"
                                    ),
                                )
                                .into());
                        }
                    }

                    return Ok(());
                }
            }
        }
    }

    /// Synthesizes the final NEWLINE (when the last line is unterminated) and
    /// one DEDENT per still-open indentation level.
    fn drain_indentation_at_eof(&mut self) {
        if !self.significant_indentation {
            return;
        }

        let end = Span::new(self.position, self.position);

        if !self.at_line_start {
            self.at_line_start = true;
            self.push_token(TokenKind::Newline, end);
        }

        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push_token(TokenKind::Dedent, end);
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while let Some(c) = self.chars.peek().copied() {
                if c == '\n' && self.significant_indentation {
                    return;
                }

                if c.is_whitespace() {
                    self.bump();
                } else {
                    break;
                }
            }

            if self.chars.peek() == Some(&'#') {
                self.ignore_line();
                continue;
            }

            return;
        }
    }

    fn ignore_line(&mut self) {
        while let Some(c) = self.chars.peek().copied() {
            if c == '\n' {
                break;
            }

            self.bump();
        }
    }

    fn scan_token(&mut self) -> CompileResult<Token> {
        let c = *self.chars.peek().unwrap();

        let token = match c {
            // String literals
            '"' => self.read_string('"')?,
            '\'' => self.read_string('\'')?,

            // Integer and float literals
            n if n.is_ascii_digit() => self.read_number()?,

            // Identifiers (keywords included)
            a if a.is_ascii_alphabetic() || a == '_' => self.read_word(),

            // Shift left equals (<<=)
            '<' if self.chars.peek_nth(1).is_some_and(|c| *c == '<')
                && self.chars.peek_nth(2).is_some_and(|c| *c == '=') =>
            {
                self.read_triple(TokenKind::ShiftLeftEquals)
            }
            // Shift right equals (>>=)
            '>' if self.chars.peek_nth(1).is_some_and(|c| *c == '>')
                && self.chars.peek_nth(2).is_some_and(|c| *c == '=') =>
            {
                self.read_triple(TokenKind::ShiftRightEquals)
            }

            // Arrow (->)
            '-' if self.chars.peek_nth(1).is_some_and(|c| *c == '>') => {
                self.read_double(TokenKind::Arrow)
            }
            // Double equals (==)
            '=' if self.chars.peek_nth(1).is_some_and(|c| *c == '=') => {
                self.read_double(TokenKind::DoubleEquals)
            }
            // Not equals (!=)
            '!' if self.chars.peek_nth(1).is_some_and(|c| *c == '=') => {
                self.read_double(TokenKind::NotEquals)
            }
            // Less than or equal (<=)
            '<' if self.chars.peek_nth(1).is_some_and(|c| *c == '=') => {
                self.read_double(TokenKind::LessThanOrEqualTo)
            }
            // Greater than or equal (>=)
            '>' if self.chars.peek_nth(1).is_some_and(|c| *c == '=') => {
                self.read_double(TokenKind::GreaterThanOrEqualTo)
            }
            // Shift left (<<)
            '<' if self.chars.peek_nth(1).is_some_and(|c| *c == '<') => {
                self.read_double(TokenKind::ShiftLeft)
            }
            // Shift right (>>)
            '>' if self.chars.peek_nth(1).is_some_and(|c| *c == '>') => {
                self.read_double(TokenKind::ShiftRight)
            }
            // Plus equals (+=)
            '+' if self.chars.peek_nth(1).is_some_and(|c| *c == '=') => {
                self.read_double(TokenKind::PlusEquals)
            }
            // Minus equals (-=)
            '-' if self.chars.peek_nth(1).is_some_and(|c| *c == '=') => {
                self.read_double(TokenKind::MinusEquals)
            }
            // Multiply equals (*=)
            '*' if self.chars.peek_nth(1).is_some_and(|c| *c == '=') => {
                self.read_double(TokenKind::MultiplyEquals)
            }
            // Divide equals (/=)
            '/' if self.chars.peek_nth(1).is_some_and(|c| *c == '=') => {
                self.read_double(TokenKind::DivideEquals)
            }
            // Modulus equals (%=)
            '%' if self.chars.peek_nth(1).is_some_and(|c| *c == '=') => {
                self.read_double(TokenKind::ModulusEquals)
            }
            // Bitwise and equals (&=)
            '&' if self.chars.peek_nth(1).is_some_and(|c| *c == '=') => {
                self.read_double(TokenKind::AndEquals)
            }
            // Bitwise or equals (|=)
            '|' if self.chars.peek_nth(1).is_some_and(|c| *c == '=') => {
                self.read_double(TokenKind::OrEquals)
            }
            // Bitwise xor equals (^=)
            '^' if self.chars.peek_nth(1).is_some_and(|c| *c == '=') => {
                self.read_double(TokenKind::XorEquals)
            }

            s if SINGLE_TOKENS.contains_key(&s) => self.read_single(SINGLE_TOKENS[&s]),

            c => {
                return Err(self
                    .source
                    .diagnostic(
                        DiagnosticKind::Lexical,
                        Span::new(self.position, self.position + c.len_utf8()),
                        format!("unexpected character `{c}` in stream"),
                    )
                    .into());
            }
        };

        Ok(token)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();

        if let Some(c) = c {
            self.position += c.len_utf8();
        }

        c
    }

    fn push_token(&mut self, kind: TokenKind, span: Span) {
        self.peek_buffer.push_back(Token { kind, span });
    }

    fn new_span(&self, start: usize) -> Span {
        Span::new(start, self.position)
    }

    fn read_word(&mut self) -> Token {
        let start = self.position;

        while let Some(c) = self.chars.peek().copied() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }

            self.bump();
        }

        Token {
            kind: TokenKind::Identifier,
            span: self.new_span(start),
        }
    }

    fn read_number(&mut self) -> CompileResult<Token> {
        let start = self.position;

        // 0x/0X hexadecimal
        if self.chars.peek() == Some(&'0')
            && self
                .chars
                .peek_nth(1)
                .is_some_and(|c| *c == 'x' || *c == 'X')
        {
            self.bump();
            self.bump();

            let digits_start = self.position;

            while self.chars.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }

            if self.position == digits_start {
                return Err(self
                    .source
                    .diagnostic(
                        DiagnosticKind::Lexical,
                        self.new_span(start),
                        "malformed hexadecimal literal: expected at least one digit after `0x`",
                    )
                    .into());
            }

            return Ok(Token {
                kind: TokenKind::IntegerLiteral,
                span: self.new_span(start),
            });
        }

        let mut kind = TokenKind::IntegerLiteral;

        while self.chars.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }

        if self.chars.peek() == Some(&'.') {
            kind = TokenKind::FloatLiteral;
            self.bump();

            while self.chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }

        if self.chars.peek().is_some_and(|c| *c == 'e' || *c == 'E') {
            kind = TokenKind::FloatLiteral;
            self.bump();

            if self.chars.peek().is_some_and(|c| *c == '+' || *c == '-') {
                self.bump();
            }

            let digits_start = self.position;

            while self.chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }

            if self.position == digits_start {
                return Err(self
                    .source
                    .diagnostic(
                        DiagnosticKind::Lexical,
                        self.new_span(start),
                        "malformed float literal: expected digits in the exponent",
                    )
                    .into());
            }
        }

        Ok(Token {
            kind,
            span: self.new_span(start),
        })
    }

    /// Reads a quoted literal, decoding escapes into the scratch buffer. The
    /// decoded value stays valid until the next string literal is lexed.
    fn read_string(&mut self, delimiter: char) -> CompileResult<Token> {
        let start = self.position;

        // Opening delimiter
        self.bump();
        self.string_len = 0;

        loop {
            let Some(c) = self.chars.peek().copied() else {
                return Err(self.unterminated_string(start));
            };

            if c == '\n' {
                return Err(self.unterminated_string(start));
            }

            if c == delimiter {
                self.bump();
                break;
            }

            if c == '\\' {
                self.bump();

                let decoded = match self.chars.peek().copied() {
                    Some('\\') => Some(b'\\'),
                    Some('"') => Some(b'"'),
                    Some('\'') => Some(b'\''),
                    Some('t') => Some(b'\t'),
                    Some('f') => Some(0x0c),
                    Some('n') => Some(b'\n'),
                    Some('r') => Some(b'\r'),
                    Some('0') => Some(0),
                    _ => None,
                };

                match decoded {
                    Some(byte) => {
                        self.bump();
                        self.push_string_byte(byte, start)?;
                    }
                    // Unknown escapes keep the backslash; the following
                    // character is handled by the next iteration.
                    None => self.push_string_byte(b'\\', start)?,
                }

                continue;
            }

            self.bump();

            let mut buffer = [0u8; 4];
            for byte in c.encode_utf8(&mut buffer).bytes() {
                self.push_string_byte(byte, start)?;
            }
        }

        Ok(Token {
            kind: TokenKind::StringLiteral,
            span: self.new_span(start),
        })
    }

    fn push_string_byte(&mut self, byte: u8, literal_start: usize) -> CompileResult<()> {
        if self.string_len >= STRING_STORAGE_SIZE {
            return Err(self
                .source
                .diagnostic(
                    DiagnosticKind::Lexical,
                    Span::new(literal_start, self.position),
                    format!("string literal exceeds the {STRING_STORAGE_SIZE} byte storage limit"),
                )
                .into());
        }

        self.string_storage[self.string_len] = byte;
        self.string_len += 1;

        Ok(())
    }

    fn unterminated_string(&self, start: usize) -> crate::error::CompileError {
        self.source
            .diagnostic(
                DiagnosticKind::Lexical,
                Span::new(start, self.position),
                "unterminated string literal",
            )
            .into()
    }

    fn read_single(&mut self, kind: TokenKind) -> Token {
        let start = self.position;

        self.bump();

        Token {
            kind,
            span: self.new_span(start),
        }
    }

    fn read_double(&mut self, kind: TokenKind) -> Token {
        let start = self.position;

        self.bump();
        self.bump();

        Token {
            kind,
            span: self.new_span(start),
        }
    }

    fn read_triple(&mut self, kind: TokenKind) -> Token {
        let start = self.position;

        self.bump();
        self.bump();
        self.bump();

        Token {
            kind,
            span: self.new_span(start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;

    fn lex_kinds(contents: &str) -> Vec<TokenKind> {
        let source = SourceFile::in_memory(contents);
        let mut lexer = Lexer::new(&source);
        let mut kinds = Vec::new();

        while let Some(token) = lexer.next().expect("lexing should succeed") {
            kinds.push(token.kind);
        }

        kinds
    }

    fn lex_kinds_indented(contents: &str) -> CompileResult<Vec<TokenKind>> {
        let source = SourceFile::in_memory(contents);
        let mut lexer = Lexer::with_significant_indentation(&source);
        let mut kinds = Vec::new();

        while let Some(token) = lexer.next()? {
            kinds.push(token.kind);
        }

        Ok(kinds)
    }

    fn diagnostic_kind(error: CompileError) -> DiagnosticKind {
        match error {
            CompileError::Diagnostic(diagnostic) => diagnostic.kind,
            other => panic!("expected a diagnostic, got {other:?}"),
        }
    }

    #[test]
    fn multi_character_operators_take_the_longest_match() {
        use TokenKind::*;

        assert_eq!(
            lex_kinds("a <<= b >>= c -> d == e != f <= g >= h << i >> j += k"),
            vec![
                Identifier,
                ShiftLeftEquals,
                Identifier,
                ShiftRightEquals,
                Identifier,
                Arrow,
                Identifier,
                DoubleEquals,
                Identifier,
                NotEquals,
                Identifier,
                LessThanOrEqualTo,
                Identifier,
                GreaterThanOrEqualTo,
                Identifier,
                ShiftLeft,
                Identifier,
                ShiftRight,
                Identifier,
                PlusEquals,
                Identifier,
            ]
        );
    }

    #[test]
    fn unmatched_prefixes_fall_back_to_single_character_tokens() {
        use TokenKind::*;

        assert_eq!(
            lex_kinds("a < b > c = d - e"),
            vec![
                Identifier, LessThan, Identifier, GreaterThan, Identifier, Equals, Identifier,
                Minus, Identifier,
            ]
        );
    }

    #[test]
    fn integer_and_float_literals() {
        use TokenKind::*;

        assert_eq!(
            lex_kinds("42 0x41 0XFF 1.5 2e10 3.0e-2"),
            vec![
                IntegerLiteral,
                IntegerLiteral,
                IntegerLiteral,
                FloatLiteral,
                FloatLiteral,
                FloatLiteral,
            ]
        );
    }

    #[test]
    fn malformed_hex_literal_is_a_lexical_error() {
        let source = SourceFile::in_memory("0x");
        let mut lexer = Lexer::new(&source);

        let error = lexer.next().unwrap_err();
        assert_eq!(diagnostic_kind(error), DiagnosticKind::Lexical);
    }

    #[test]
    fn comments_run_to_end_of_line() {
        use TokenKind::*;

        assert_eq!(
            lex_kinds("a # the rest is ignored\nb"),
            vec![Identifier, Identifier]
        );
    }

    #[test]
    fn keywords_are_a_closed_membership_check() {
        assert!(is_keyword("def"));
        assert!(is_keyword("while"));
        assert!(is_keyword("None"));
        assert!(!is_keyword("print"));
        assert!(!is_keyword("putchar"));
        assert!(!is_keyword("main"));
    }

    #[test]
    fn string_escapes_are_decoded_into_the_scratch_buffer() {
        let source = SourceFile::in_memory(r#""a\tb\n\\\0""#);
        let mut lexer = Lexer::new(&source);

        let token = lexer.next().unwrap().unwrap();
        assert_eq!(token.kind, TokenKind::StringLiteral);
        assert_eq!(lexer.string_value(), b"a\tb\n\\\0");
    }

    #[test]
    fn unknown_escapes_keep_the_backslash() {
        let source = SourceFile::in_memory(r#""a\qb""#);
        let mut lexer = Lexer::new(&source);

        lexer.next().unwrap().unwrap();
        assert_eq!(lexer.string_value(), b"a\\qb");
    }

    #[test]
    fn oversized_string_literal_is_a_hard_error() {
        let contents = format!("\"{}\"", "x".repeat(STRING_STORAGE_SIZE + 1));
        let source = SourceFile::in_memory(contents);
        let mut lexer = Lexer::new(&source);

        let error = lexer.next().unwrap_err();
        assert_eq!(diagnostic_kind(error), DiagnosticKind::Lexical);
    }

    #[test]
    fn unterminated_string_literal() {
        let source = SourceFile::in_memory("\"abc\ndef\"");
        let mut lexer = Lexer::new(&source);

        let error = lexer.next().unwrap_err();
        assert_eq!(diagnostic_kind(error), DiagnosticKind::Lexical);
    }

    #[test]
    fn indentation_blocks_emit_indent_and_dedent() {
        use TokenKind::*;

        let kinds = lex_kinds_indented("a\n    b\n        c\n    d\ne\n").unwrap();

        assert_eq!(
            kinds,
            vec![
                Identifier, // a
                Newline,
                Indent,
                Identifier, // b
                Newline,
                Indent,
                Identifier, // c
                Newline,
                Dedent,
                Identifier, // d
                Newline,
                Dedent,
                Identifier, // e
                Newline,
            ]
        );
    }

    #[test]
    fn blank_and_comment_lines_do_not_affect_indentation() {
        use TokenKind::*;

        let kinds = lex_kinds_indented("a\n    b\n\n  # comment\n    c\n").unwrap();

        assert_eq!(
            kinds,
            vec![
                Identifier, // a
                Newline,
                Indent,
                Identifier, // b
                Newline,
                Identifier, // c
                Newline,
                Dedent,
            ]
        );
    }

    #[test]
    fn unterminated_last_line_gets_a_synthetic_newline_and_dedents() {
        use TokenKind::*;

        let kinds = lex_kinds_indented("a\n    b").unwrap();

        assert_eq!(
            kinds,
            vec![Identifier, Newline, Indent, Identifier, Newline, Dedent]
        );
    }

    #[test]
    fn dedent_to_an_unknown_width_is_a_lexical_error() {
        let result = lex_kinds_indented("a\n    b\n        c\n      d\n");

        let error = result.unwrap_err();
        let CompileError::Diagnostic(diagnostic) = error else {
            panic!("expected a diagnostic");
        };

        assert_eq!(diagnostic.kind, DiagnosticKind::Lexical);
        assert!(diagnostic.message.contains("inconsistent indentation"));
    }
}
