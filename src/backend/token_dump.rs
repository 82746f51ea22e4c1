//! Dumps the lexer's view of the input, one token per line, without going
//! through the parser at all. Used to validate the lexer in isolation.
//!
//! Line format (a stable contract for golden tests):
//! `<file>:<line>:<col>: <token-name> (<col>, <end-col>)`

use itertools::Itertools;

use crate::SourceFile;
use crate::error::CompileResult;
use crate::frontend::lexer::Lexer;

pub fn dump_tokens(source: &SourceFile) -> CompileResult<String> {
    // Indentation is significant from the first line so the block-structure
    // tokens show up in the dump.
    let mut lexer = Lexer::with_significant_indentation(source);
    let mut lines = Vec::new();

    while let Some(token) = lexer.next()? {
        // O(n) rescans per token are fine here; dumping is a debug surface
        let line = source.line_number_for_position(token.span.start);
        let column = source.column_for_position(token.span.start);
        let end_column = column + (token.span.end - token.span.start);

        lines.push(format!(
            "{}:{line}:{column}: {} ({column}, {end_column})",
            source.origin, token.kind
        ));
    }

    Ok(lines.iter().join("\n") + "\n")
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn one_line_per_token_with_locations() {
        let source = SourceFile::in_memory("def main() -> None:\n    print(0x41)\n");

        let dump = dump_tokens(&source).unwrap();

        assert_eq!(
            dump,
            indoc! {"
                <memory>:1:1: identifier (1, 4)
                <memory>:1:5: identifier (5, 9)
                <memory>:1:9: open_paren (9, 10)
                <memory>:1:10: close_paren (10, 11)
                <memory>:1:12: arrow (12, 14)
                <memory>:1:15: identifier (15, 19)
                <memory>:1:19: colon (19, 20)
                <memory>:1:20: newline (20, 21)
                <memory>:2:1: indent (1, 5)
                <memory>:2:5: identifier (5, 10)
                <memory>:2:10: open_paren (10, 11)
                <memory>:2:11: integer_literal (11, 15)
                <memory>:2:15: close_paren (15, 16)
                <memory>:2:16: newline (16, 17)
                <memory>:3:1: dedent (1, 1)
            "}
        );
    }

    #[test]
    fn lexical_errors_propagate_instead_of_producing_a_partial_dump() {
        let source = SourceFile::in_memory("a\n  b\n c\n");

        assert!(dump_tokens(&source).is_err());
    }
}
