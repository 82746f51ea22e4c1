//! Renders each statement as a canonical opcode plus a bracketed operand
//! list, one statement per line, grouped per function. The output is a stable
//! contract used for golden-file regression tests of the front end, so it is
//! deliberately free of color or other presentation concerns.

use itertools::Itertools;

use crate::backend::targets::CodeGenerator;
use crate::error::CompileResult;
use crate::middle::ir::{Function, Program, Statement};

pub struct IrDumper;

impl CodeGenerator for IrDumper {
    fn generate(&self, program: &Program) -> CompileResult<String> {
        Ok(program.functions.iter().map(dump_function).join("\n"))
    }
}

fn dump_function(function: &Function) -> String {
    let mut lines = vec![format!("FUNCTION {} {{", function.name)];

    lines.extend(
        function
            .statements
            .iter()
            .enumerate()
            .map(|(index, statement)| format!("    {index}: {}", render_statement(statement))),
    );

    lines.push("}".to_owned());

    lines.join("\n") + "\n"
}

fn render_statement(statement: &Statement) -> String {
    match *statement {
        Statement::Assign { slot, value } => format!("ASSIGN [slot {slot}, {value}]"),
        Statement::DeclareAssign { slot, value } => {
            format!("DECLARE_ASSIGN [slot {slot}, {value}]")
        }
        Statement::BinaryAssign {
            slot,
            operator,
            lhs,
            rhs,
        } => format!("BINARY_ASSIGN [slot {slot}, {operator}, {lhs}, {rhs}]"),
        Statement::DeclareBinaryAssign {
            slot,
            operator,
            lhs,
            rhs,
        } => format!("DECLARE_BINARY_ASSIGN [slot {slot}, {operator}, {lhs}, {rhs}]"),
        Statement::Call { target, argument } => format!("CALL [{target}, {argument}]"),
        Statement::Jump { target } => format!("JUMP [{target}]"),
        Statement::ConditionalJump { target } => format!("CONDITIONAL_JUMP [{target}]"),
        Statement::BlockStart { index } => format!("BLOCK_START [{index}]"),
        Statement::BlockEnd { index } => format!("BLOCK_END [{index}]"),
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::SourceFile;
    use crate::frontend::parser::Parser;

    fn dump(contents: &str) -> String {
        let source = SourceFile::in_memory(contents);
        let program = Parser::parse_program(&source).expect("program should parse");

        IrDumper.generate(&program).expect("dumping cannot fail")
    }

    #[test]
    fn statements_render_one_per_line_with_indices() {
        let text = dump(
            "def main() -> None:\n    x : int = 0\n    while x < 3:\n        x = x + 1\n    print(x)\n",
        );

        assert_eq!(
            text,
            indoc! {"
                FUNCTION main {
                    0: DECLARE_ASSIGN [slot 0, int 0]
                    1: BLOCK_START [1]
                    2: DECLARE_BINARY_ASSIGN [slot 1, less_than, slot 0, int 3]
                    3: CONDITIONAL_JUMP [6]
                    4: BINARY_ASSIGN [slot 0, add, slot 0, int 1]
                    5: JUMP [1]
                    6: BLOCK_END [6]
                    7: CALL [print, slot 0]
                }
            "}
        );
    }

    #[test]
    fn output_is_deterministic() {
        let contents = "def main() -> None {\n  x : int = 1 + 2 * 3;\n  putchar(x);\n}";

        assert_eq!(dump(contents), dump(contents));
    }
}
