//! Crate root: wires together the compilation pipeline.
//!
//! The stages are intentionally small and composable:
//! - `frontend` lexes and parses source text straight into the linear IR.
//! - `middle` holds the IR data model every backend consumes.
//! - `backend` renders the IR (or the raw token stream) as output text.
//! - `error` centralises the diagnostics shared by the other stages.
//!
//! The pipeline is strictly staged: the whole input is in memory before
//! lexing starts, the IR is fully built before any backend runs, and output
//! text is returned in one piece. The first failure anywhere aborts the run.

use std::path::{Path, PathBuf};

pub mod backend;
pub mod error;
pub mod frontend;
pub mod middle;

pub use crate::backend::targets::{Target, select_target};
pub use crate::error::{CompileError, CompileResult};
pub use crate::frontend::{SourceFile, SourceFileOrigin};

/// Compile one source file for the given target, returning the complete
/// output text. Nothing is written anywhere; the caller owns all I/O.
pub fn compile(source: &SourceFile, target: Target) -> CompileResult<String> {
    match target.code_generator() {
        Some(generator) => {
            let program = frontend::parser::Parser::parse_program(source)?;
            generator.generate(&program)
        }
        // The token dumper bypasses the parser and IR entirely
        None => backend::token_dump::dump_tokens(source),
    }
}

/// Output path used when `-o` is omitted: the input path with the target's
/// extension.
pub fn default_output_path(input: &Path, target: Target) -> PathBuf {
    input.with_extension(target.output_extension())
}
