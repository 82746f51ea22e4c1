//! End-to-end coverage of the public library surface: one source file in,
//! one output text (or one error) out per target.

use std::path::Path;

use indoc::indoc;
use spyc::error::{CompileError, DiagnosticKind};
use spyc::{SourceFile, Target};

const LOOP_PROGRAM: &str = indoc! {"
    # counts up and prints the final value
    def main() -> None:
        x : int = 0x40
        while x < 0x45:
            x = x + 1
        if x == 69:
            print(x)
"};

#[test]
fn the_default_target_emits_linkable_assembly() {
    let source = SourceFile::in_memory(LOOP_PROGRAM);
    let assembly = spyc::compile(&source, Target::default()).unwrap();

    assert!(assembly.contains(".globl _main"));
    assert!(assembly.contains("_main:"));
    assert!(assembly.contains("callq _putchar"));
    assert!(assembly.contains("pushq %rbp"));
    assert!(assembly.ends_with("ret\n"));
}

#[test]
fn the_ir_dump_is_byte_identical_across_runs() {
    let source = SourceFile::in_memory(LOOP_PROGRAM);

    let first = spyc::compile(&source, Target::Ir).unwrap();
    let second = spyc::compile(&source, Target::Ir).unwrap();

    assert_eq!(first, second);
    assert!(first.starts_with("FUNCTION main {"));
}

#[test]
fn jump_targets_in_the_dump_point_at_block_anchors() {
    let source = SourceFile::in_memory(LOOP_PROGRAM);
    let dump = spyc::compile(&source, Target::Ir).unwrap();

    for line in dump.lines() {
        let Some((_, rest)) = line.trim_start().split_once(": ") else {
            continue;
        };

        let Some(target) = rest
            .strip_prefix("JUMP [")
            .or_else(|| rest.strip_prefix("CONDITIONAL_JUMP ["))
            .and_then(|tail| tail.strip_suffix("]"))
        else {
            continue;
        };

        let anchor = format!("    {target}: BLOCK_");
        assert!(
            dump.contains(&anchor),
            "target {target} has no anchor in:\n{dump}"
        );
    }
}

#[test]
fn the_token_dump_bypasses_the_parser() {
    // This program never parses (undeclared variable), but it lexes fine
    let source = SourceFile::in_memory("def main() -> None:\n    print(nope)\n");

    assert!(matches!(
        spyc::compile(&source, Target::default()),
        Err(CompileError::Diagnostic(_))
    ));

    let dump = spyc::compile(&source, Target::Lexer).unwrap();
    assert!(dump.contains("identifier"));
    assert!(dump.contains("indent"));
    assert!(dump.contains("dedent"));
}

#[test]
fn straight_line_programs_survive_reemission_and_reparsing() {
    let source = SourceFile::in_memory(indoc! {"
        def main() -> None:
            a : int = 2 + 3 * 4
            b : int = a
            b = b - 1
            putchar(b)
    "});

    let emitted = spyc::compile(&source, Target::Python311).unwrap();
    let reparsed_source = SourceFile::in_memory(emitted.clone());

    // Emitting the re-parsed program again is a fixed point
    let emitted_again = spyc::compile(&reparsed_source, Target::Python311).unwrap();
    assert_eq!(emitted, emitted_again);
}

#[test]
fn the_reemitter_fails_closed_on_control_flow() {
    let source = SourceFile::in_memory(LOOP_PROGRAM);

    let error = spyc::compile(&source, Target::Python311).unwrap_err();
    assert!(matches!(error, CompileError::UnsupportedLowering { .. }));
}

#[test]
fn the_aarch64_target_is_recognized_but_unimplemented() {
    let source = SourceFile::in_memory("def main() -> None {\n  print(65);\n}");

    let error = spyc::compile(&source, Target::Aarch64MacM1).unwrap_err();
    assert_eq!(
        error.to_string(),
        "target `aarch64-mac-m1` is not supported yet"
    );
}

#[test]
fn unknown_target_names_report_the_full_list() {
    let error = spyc::select_target("riscv").unwrap_err();
    let message = error.to_string();

    assert!(message.contains("unknown target `riscv`"));
    assert!(message.contains("x86-64-macos"));
    assert!(message.contains("lexer"));
}

#[test]
fn default_output_paths_derive_from_the_input_path() {
    let input = Path::new("demos/count.spy");

    assert_eq!(
        spyc::default_output_path(input, Target::x86_64MacOs),
        Path::new("demos/count.s")
    );
    assert_eq!(
        spyc::default_output_path(input, Target::Python311),
        Path::new("demos/count.py")
    );
    assert_eq!(
        spyc::default_output_path(input, Target::Ir),
        Path::new("demos/count.txt")
    );
}

#[test]
fn diagnostics_carry_location_kind_and_excerpt() {
    let source = SourceFile::in_memory(indoc! {"
        def main() -> None:
            x : int = 1
            x : int = 2
    "});

    let error = spyc::compile(&source, Target::default()).unwrap_err();
    let CompileError::Diagnostic(diagnostic) = error else {
        panic!("expected a diagnostic");
    };

    assert_eq!(diagnostic.kind, DiagnosticKind::Semantic);
    assert_eq!((diagnostic.line, diagnostic.column), (3, 5));
    assert_eq!(
        (diagnostic.notes[0].line, diagnostic.notes[0].column),
        (2, 5)
    );

    let rendered = strip_ansi_escapes::strip_str(diagnostic.to_string());
    assert!(rendered.contains("<memory>:3:5: semantic error: variable `x` is already declared"));
    assert!(rendered.contains("note: `x` first declared here"));
}
