//! Recognized by target selection so the CLI can name it, but no lowering
//! exists yet; selecting it is a fixed failure.

use crate::backend::targets::{CodeGenerator, Target};
use crate::error::{CompileError, CompileResult};
use crate::middle::ir::Program;

pub struct CodeGeneratorAarch64MacM1;

impl CodeGenerator for CodeGeneratorAarch64MacM1 {
    fn generate(&self, _program: &Program) -> CompileResult<String> {
        Err(CompileError::UnimplementedTarget {
            target: Target::Aarch64MacM1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_reports_not_supported_yet() {
        let program = Program {
            functions: Vec::new(),
        };

        let error = CodeGeneratorAarch64MacM1.generate(&program).unwrap_err();
        assert_eq!(
            error.to_string(),
            "target `aarch64-mac-m1` is not supported yet"
        );
    }
}
