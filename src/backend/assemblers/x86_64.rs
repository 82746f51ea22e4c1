//! Textual x86-64 assembly builder (AT&T syntax, Darwin symbol conventions).

use crate::middle::ir::{Slot, Term};

pub fn align_to(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}

/// Memory operand for an IR slot: 4 bytes each, addressed from the frame base.
pub fn slot_operand(slot: Slot) -> String {
    format!("{}(%rsp)", slot * 4)
}

/// Instruction operand for an IR term: an immediate or a slot's memory operand.
pub fn term_operand(term: Term) -> String {
    match term {
        Term::IntLiteral(value) => format!("${value}"),
        Term::VariableRef(slot) => slot_operand(slot),
    }
}

pub struct Assembler {
    output: String,
}

impl Assembler {
    pub fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    pub fn into_output(self) -> String {
        self.output
    }

    fn push_line(&mut self, string: impl AsRef<str>) {
        self.output.push_str(string.as_ref());
        self.output.push('\n');
    }

    /// An indented instruction or directive line.
    pub fn emit(&mut self, string: impl AsRef<str>) {
        self.output.push_str("    ");
        self.push_line(string);
    }

    /// A column-zero label definition.
    pub fn label(&mut self, name: impl AsRef<str>) {
        self.push_line(format!("{}:", name.as_ref()));
    }

    pub fn function_prologue(&mut self, frame_size: usize) {
        self.emit("pushq %rbp");
        self.emit("movq %rsp, %rbp");

        if frame_size > 0 {
            self.emit(format!("subq ${frame_size}, %rsp"));
        }
    }

    /// Implicit zero return value; there is no general return-value support.
    pub fn function_epilogue(&mut self, frame_size: usize) {
        self.emit("movl $0, %eax");

        if frame_size > 0 {
            self.emit(format!("addq ${frame_size}, %rsp"));
        }

        self.emit("popq %rbp");
        self.emit("ret");
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operands() {
        assert_eq!(slot_operand(0), "0(%rsp)");
        assert_eq!(slot_operand(3), "12(%rsp)");
        assert_eq!(term_operand(Term::IntLiteral(65)), "$65");
        assert_eq!(term_operand(Term::VariableRef(2)), "8(%rsp)");
    }

    #[test]
    fn alignment() {
        assert_eq!(align_to(0, 16), 0);
        assert_eq!(align_to(4, 16), 16);
        assert_eq!(align_to(16, 16), 16);
        assert_eq!(align_to(20, 16), 32);
    }

    #[test]
    fn slotless_frames_skip_the_stack_adjustment() {
        let mut assembler = Assembler::new();
        assembler.function_prologue(0);
        assembler.function_epilogue(0);

        let output = assembler.into_output();
        assert!(!output.contains("subq"));
        assert!(!output.contains("addq"));
    }
}
