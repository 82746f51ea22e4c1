//! x86-64 assembly emitter for macOS: AT&T syntax, `_`-prefixed symbols,
//! linked against a C runtime that provides `putchar`.

use std::collections::BTreeSet;

use crate::backend::assemblers::x86_64::{Assembler, align_to, slot_operand, term_operand};
use crate::backend::targets::CodeGenerator;
use crate::error::{CompileError, CompileResult};
use crate::middle::ir::{BinaryOperator, Function, Program, Slot, Statement, Term};

pub struct CodeGeneratorX86_64MacOs;

impl CodeGenerator for CodeGeneratorX86_64MacOs {
    fn generate(&self, program: &Program) -> CompileResult<String> {
        let functions = program
            .functions
            .iter()
            .map(codegen_function)
            .collect::<CompileResult<Vec<_>>>()?;

        Ok(functions.join("\n"))
    }
}

fn codegen_function(function: &Function) -> CompileResult<String> {
    validate_jump_targets(function)?;

    // One 4-byte stack slot per IR slot, frame rounded up so %rsp stays
    // 16-byte aligned at call sites.
    let frame_size = align_to(function.slot_count() * 4, 16);

    let mut assembler = Assembler::new();

    assembler.emit(format!(".globl _{}", function.name));
    assembler.label(format!("_{}", function.name));
    assembler.function_prologue(frame_size);

    // The slot most recently computed into, which a conditional jump tests
    // against zero.
    let mut last_computed: Option<Slot> = None;

    for statement in &function.statements {
        match *statement {
            Statement::Assign { slot, value } | Statement::DeclareAssign { slot, value } => {
                match value {
                    // Immediates store straight to the destination offset;
                    // memory-to-memory copies bounce through a scratch register
                    Term::IntLiteral(_) => {
                        assembler.emit(format!(
                            "movl {}, {}",
                            term_operand(value),
                            slot_operand(slot)
                        ));
                    }
                    Term::VariableRef(_) => {
                        assembler.emit(format!("movl {}, %eax", term_operand(value)));
                        assembler.emit(format!("movl %eax, {}", slot_operand(slot)));
                    }
                }
            }
            Statement::BinaryAssign {
                slot,
                operator,
                lhs,
                rhs,
            }
            | Statement::DeclareBinaryAssign {
                slot,
                operator,
                lhs,
                rhs,
            } => {
                let rhs_operand = term_operand(rhs);

                assembler.emit(format!("movl {}, %eax", term_operand(lhs)));

                match operator {
                    BinaryOperator::Add => {
                        assembler.emit(format!("addl {rhs_operand}, %eax"));
                    }
                    BinaryOperator::Subtract => {
                        assembler.emit(format!("subl {rhs_operand}, %eax"));
                    }
                    BinaryOperator::Multiply => {
                        assembler.emit(format!("imull {rhs_operand}, %eax"));
                    }
                    operator @ (BinaryOperator::LessThan
                    | BinaryOperator::LessThanOrEqualTo
                    | BinaryOperator::GreaterThan
                    | BinaryOperator::GreaterThanOrEqualTo
                    | BinaryOperator::Equals
                    | BinaryOperator::NotEquals) => {
                        assembler.emit("xorl %ecx, %ecx");
                        assembler.emit(format!("cmpl {rhs_operand}, %eax"));
                        assembler.emit(format!("set{} %cl", condition_code(operator)));
                        assembler.emit("movl %ecx, %eax");
                    }
                }

                assembler.emit(format!("movl %eax, {}", slot_operand(slot)));
            }
            Statement::Call { argument, .. } => {
                // Both whitelisted targets lower to the same runtime symbol
                assembler.emit(format!("movl {}, %edi", term_operand(argument)));
                assembler.emit("callq _putchar");
            }
            Statement::Jump { target } => {
                assembler.emit(format!("jmp {}", block_label(function, target)));
            }
            Statement::ConditionalJump { target } => {
                let Some(slot) = last_computed else {
                    return Err(CompileError::MalformedProgram {
                        detail: format!(
                            "conditional jump in `{}` has no preceding computed value",
                            function.name
                        ),
                    });
                };

                assembler.emit(format!("cmpl $0, {}", slot_operand(slot)));
                assembler.emit(format!("je {}", block_label(function, target)));
            }
            Statement::BlockStart { index } | Statement::BlockEnd { index } => {
                assembler.label(block_label(function, index));
            }
        }

        if let Some(slot) = statement.destination_slot() {
            last_computed = Some(slot);
        }
    }

    assembler.function_epilogue(frame_size);

    Ok(assembler.into_output())
}

/// Darwin-local label for a block anchor, keyed by the anchor's IR index.
fn block_label(function: &Function, index: usize) -> String {
    format!("L_{}_{}", function.name, index)
}

fn condition_code(operator: BinaryOperator) -> &'static str {
    match operator {
        BinaryOperator::LessThan => "l",
        BinaryOperator::LessThanOrEqualTo => "le",
        BinaryOperator::GreaterThan => "g",
        BinaryOperator::GreaterThanOrEqualTo => "ge",
        BinaryOperator::Equals => "e",
        BinaryOperator::NotEquals => "ne",
        BinaryOperator::Add | BinaryOperator::Subtract | BinaryOperator::Multiply => {
            unreachable!("`{operator}` has no condition code")
        }
    }
}

/// Every jump must land on a block anchor that actually exists; anything else
/// would assemble into a reference to an undefined label.
fn validate_jump_targets(function: &Function) -> CompileResult<()> {
    let anchors: BTreeSet<usize> = function
        .statements
        .iter()
        .filter_map(|statement| match statement {
            Statement::BlockStart { index } | Statement::BlockEnd { index } => Some(*index),
            _ => None,
        })
        .collect();

    for statement in &function.statements {
        let target = match statement {
            Statement::Jump { target } | Statement::ConditionalJump { target } => *target,
            _ => continue,
        };

        if !anchors.contains(&target) {
            return Err(CompileError::MalformedProgram {
                detail: format!(
                    "jump target {target} does not name a block anchor in `{}`",
                    function.name
                ),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::SourceFile;
    use crate::frontend::parser::Parser;

    fn generate(contents: &str) -> String {
        let source = SourceFile::in_memory(contents);
        let program = Parser::parse_program(&source).expect("program should parse");

        CodeGeneratorX86_64MacOs
            .generate(&program)
            .expect("codegen should succeed")
    }

    #[test]
    fn declaration_and_print_lower_to_slot_stores_and_a_putchar_call() {
        let assembly = generate("def main() -> None {\n  x : int = 2 + 3;\n  print(x);\n}");

        assert_eq!(
            assembly,
            indoc! {"
                    .globl _main
                _main:
                    pushq %rbp
                    movq %rsp, %rbp
                    subq $16, %rsp
                    movl $2, %eax
                    addl $3, %eax
                    movl %eax, 0(%rsp)
                    movl 0(%rsp), %edi
                    callq _putchar
                    movl $0, %eax
                    addq $16, %rsp
                    popq %rbp
                    ret
            "}
        );
    }

    #[test]
    fn comparisons_materialize_a_zero_or_one() {
        let assembly = generate("def main() -> None {\n  x : int = 1 < 2;\n}");

        assert!(assembly.contains("xorl %ecx, %ecx"));
        assert!(assembly.contains("cmpl $2, %eax"));
        assert!(assembly.contains("setl %cl"));
        assert!(assembly.contains("movl %ecx, %eax"));
    }

    #[test]
    fn while_loops_branch_on_the_last_computed_value() {
        let assembly = generate(
            "def main() -> None:\n    x : int = 0\n    while x < 3:\n        x = x + 1\n",
        );

        // Condition result lands in slot 1; the conditional jump tests it
        // against zero and exits to the BlockEnd label.
        assert!(assembly.contains("L_main_1:"));
        assert!(assembly.contains("cmpl $0, 4(%rsp)"));
        assert!(assembly.contains("je L_main_6"));
        assert!(assembly.contains("jmp L_main_1"));
        assert!(assembly.contains("L_main_6:"));
    }

    #[test]
    fn dangling_jump_targets_fail_closed() {
        use crate::frontend::intern::InternedSymbol;
        use crate::middle::ir::{Function, Program, Statement};

        let program = Program {
            functions: vec![Function {
                name: InternedSymbol::new("broken"),
                statements: vec![Statement::Jump { target: 7 }],
            }],
        };

        let error = CodeGeneratorX86_64MacOs.generate(&program).unwrap_err();
        assert!(matches!(error, CompileError::MalformedProgram { .. }));
    }
}
