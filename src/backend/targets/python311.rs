//! Re-emits the IR as surface syntax (indentation dialect). Slot `n` renders
//! as the variable `x<n>`.
//!
//! Control flow is an intentionally unimplemented capability here: loops and
//! conditionals are already lowered to jumps by the time a backend runs, and
//! reconstructing structured blocks from them is out of scope. Any jump or
//! block anchor therefore fails closed rather than being silently dropped.

use crate::backend::targets::{CodeGenerator, Target};
use crate::error::{CompileError, CompileResult};
use crate::middle::ir::{Function, Program, Statement, Term};

pub struct SourceReemitter;

impl CodeGenerator for SourceReemitter {
    fn generate(&self, program: &Program) -> CompileResult<String> {
        let functions = program
            .functions
            .iter()
            .map(emit_function)
            .collect::<CompileResult<Vec<_>>>()?;

        Ok(functions.join("\n"))
    }
}

fn emit_function(function: &Function) -> CompileResult<String> {
    let mut lines = vec![format!("def {}() -> None:", function.name)];

    if function.statements.is_empty() {
        lines.push("    pass".to_owned());
    }

    for statement in &function.statements {
        lines.push(format!("    {}", emit_statement(statement)?));
    }

    Ok(lines.join("\n") + "\n")
}

fn emit_statement(statement: &Statement) -> CompileResult<String> {
    let line = match *statement {
        Statement::Assign { slot, value } => format!("x{slot} = {}", emit_term(value)),
        Statement::DeclareAssign { slot, value } => {
            format!("x{slot} : int = {}", emit_term(value))
        }
        Statement::BinaryAssign {
            slot,
            operator,
            lhs,
            rhs,
        } => format!(
            "x{slot} = {} {} {}",
            emit_term(lhs),
            operator.surface_symbol(),
            emit_term(rhs)
        ),
        Statement::DeclareBinaryAssign {
            slot,
            operator,
            lhs,
            rhs,
        } => format!(
            "x{slot} : int = {} {} {}",
            emit_term(lhs),
            operator.surface_symbol(),
            emit_term(rhs)
        ),
        Statement::Call { target, argument } => format!("{target}({})", emit_term(argument)),
        Statement::Jump { .. }
        | Statement::ConditionalJump { .. }
        | Statement::BlockStart { .. }
        | Statement::BlockEnd { .. } => {
            return Err(CompileError::UnsupportedLowering {
                target: Target::Python311,
                construct: "control flow statements",
            });
        }
    };

    Ok(line)
}

fn emit_term(term: Term) -> String {
    match term {
        Term::IntLiteral(value) => value.to_string(),
        Term::VariableRef(slot) => format!("x{slot}"),
    }
}
