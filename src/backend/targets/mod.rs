use crate::error::{CompileError, CompileResult};
use crate::middle::ir::Program;

pub mod aarch64_mac_m1;
pub mod ir_dump;
pub mod python311;
pub mod x86_64_macos;

/// A backend consuming a fully built program. Pure: the IR is never mutated
/// and output text is returned in one piece.
pub trait CodeGenerator {
    fn generate(&self, program: &Program) -> CompileResult<String>;
}

#[allow(non_camel_case_types)]
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    strum::Display,
    strum::EnumString,
    strum::VariantNames,
)]
pub enum Target {
    #[default]
    #[strum(serialize = "x86-64-macos")]
    x86_64MacOs,
    #[strum(serialize = "aarch64-mac-m1")]
    Aarch64MacM1,
    #[strum(serialize = "python311")]
    Python311,
    #[strum(serialize = "ir")]
    Ir,
    #[strum(serialize = "lexer")]
    Lexer,
}

impl Target {
    /// The backend consuming the parsed IR, or `None` for the token dumper,
    /// which bypasses the parser entirely.
    pub fn code_generator(self) -> Option<&'static dyn CodeGenerator> {
        match self {
            Target::x86_64MacOs => Some(&x86_64_macos::CodeGeneratorX86_64MacOs),
            Target::Aarch64MacM1 => Some(&aarch64_mac_m1::CodeGeneratorAarch64MacM1),
            Target::Python311 => Some(&python311::SourceReemitter),
            Target::Ir => Some(&ir_dump::IrDumper),
            Target::Lexer => None,
        }
    }

    pub fn output_extension(self) -> &'static str {
        match self {
            Target::x86_64MacOs | Target::Aarch64MacM1 => "s",
            Target::Python311 => "py",
            Target::Ir | Target::Lexer => "txt",
        }
    }
}

pub fn select_target(name: &str) -> CompileResult<Target> {
    name.parse().map_err(|_| CompileError::UnknownTarget {
        name: name.to_owned(),
    })
}
