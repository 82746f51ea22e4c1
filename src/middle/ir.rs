//! The linear IR produced by the parser and consumed by the backends. Loops
//! and conditionals are already simplified to label anchors and jumps, and
//! expression trees are flattened into ordered assignments to integer slots.
//!
//! The IR is built once during parsing and never mutated afterwards; every
//! backend is a pure function over a [`Program`].

use std::str::FromStr;

use crate::frontend::intern::InternedSymbol;

/// A sequential integer identifying one function-local storage location.
/// Slots are allocated in strictly increasing order and never reused.
pub type Slot = usize;

/// An IR operand: either an integer literal or a reference to a slot that was
/// declared earlier in the same function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    IntLiteral(i64),
    VariableRef(Slot),
}

impl core::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::IntLiteral(value) => write!(f, "int {value}"),
            Term::VariableRef(slot) => write!(f, "slot {slot}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    Equals,
    NotEquals,
}

impl BinaryOperator {
    pub fn is_comparison(self) -> bool {
        !matches!(self, Self::Add | Self::Subtract | Self::Multiply)
    }

    /// The operator's spelling in the surface syntax, used by the source
    /// re-emitter.
    pub fn surface_symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::LessThan => "<",
            Self::LessThanOrEqualTo => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqualTo => ">=",
            Self::Equals => "==",
            Self::NotEquals => "!=",
        }
    }
}

/// The closed set of callable names. Both lower to the C runtime's `putchar`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Builtin {
    Print,
    Putchar,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        Self::from_str(name).ok()
    }
}

/// One IR statement. The `Declare` variants additionally mark the destination
/// slot as live; jump targets always name the index of a [`Self::BlockStart`]
/// or [`Self::BlockEnd`] in the same function's statement list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    Assign {
        slot: Slot,
        value: Term,
    },
    DeclareAssign {
        slot: Slot,
        value: Term,
    },
    BinaryAssign {
        slot: Slot,
        operator: BinaryOperator,
        lhs: Term,
        rhs: Term,
    },
    DeclareBinaryAssign {
        slot: Slot,
        operator: BinaryOperator,
        lhs: Term,
        rhs: Term,
    },
    Call {
        target: Builtin,
        argument: Term,
    },
    Jump {
        target: usize,
    },
    /// Branches to `target` when the most recently computed value is zero.
    ConditionalJump {
        target: usize,
    },
    /// Label anchor; `index` equals the statement's own position in the list.
    BlockStart {
        index: usize,
    },
    BlockEnd {
        index: usize,
    },
}

impl Statement {
    /// The slot this statement computes into, if any. The backends use this
    /// to track the "last computed value" a conditional jump tests.
    pub fn destination_slot(self) -> Option<Slot> {
        match self {
            Statement::Assign { slot, .. }
            | Statement::DeclareAssign { slot, .. }
            | Statement::BinaryAssign { slot, .. }
            | Statement::DeclareBinaryAssign { slot, .. } => Some(slot),
            Statement::Call { .. }
            | Statement::Jump { .. }
            | Statement::ConditionalJump { .. }
            | Statement::BlockStart { .. }
            | Statement::BlockEnd { .. } => None,
        }
    }

    pub(crate) fn referenced_slots(self) -> impl Iterator<Item = Slot> {
        let terms: [Option<Term>; 2] = match self {
            Statement::Assign { value, .. } | Statement::DeclareAssign { value, .. } => {
                [Some(value), None]
            }
            Statement::BinaryAssign { lhs, rhs, .. }
            | Statement::DeclareBinaryAssign { lhs, rhs, .. } => [Some(lhs), Some(rhs)],
            Statement::Call { argument, .. } => [Some(argument), None],
            Statement::Jump { .. }
            | Statement::ConditionalJump { .. }
            | Statement::BlockStart { .. }
            | Statement::BlockEnd { .. } => [None, None],
        };

        terms.into_iter().flatten().filter_map(|term| match term {
            Term::VariableRef(slot) => Some(slot),
            Term::IntLiteral(_) => None,
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Function {
    pub name: InternedSymbol,
    pub statements: Vec<Statement>,
}

impl Function {
    /// Number of stack slots the function needs: one past the highest slot
    /// index that appears anywhere in its statements.
    pub fn slot_count(&self) -> usize {
        self.statements
            .iter()
            .flat_map(|statement| {
                statement
                    .destination_slot()
                    .into_iter()
                    .chain(statement.referenced_slots())
            })
            .map(|slot| slot + 1)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Program {
    pub functions: Vec<Function>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_count_covers_destinations_and_operands() {
        let function = Function {
            name: InternedSymbol::new("main"),
            statements: vec![
                Statement::DeclareAssign {
                    slot: 0,
                    value: Term::IntLiteral(1),
                },
                Statement::Call {
                    target: Builtin::Print,
                    argument: Term::VariableRef(2),
                },
            ],
        };

        assert_eq!(function.slot_count(), 3);
    }

    #[test]
    fn builtin_whitelist() {
        assert_eq!(Builtin::from_name("print"), Some(Builtin::Print));
        assert_eq!(Builtin::from_name("putchar"), Some(Builtin::Putchar));
        assert_eq!(Builtin::from_name("puts"), None);
        assert_eq!(Builtin::Print.to_string(), "print");
    }
}
