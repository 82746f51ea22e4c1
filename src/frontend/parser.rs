use hashbrown::HashMap;

use super::intern::InternedSymbol;
use crate::SourceFile;
use crate::error::{CompileError, CompileResult, DiagnosticKind};
use crate::frontend::lexer::{self, Lexer, Span, Token, TokenKind};
use crate::middle::ir::{BinaryOperator, Builtin, Function, Program, Slot, Statement, Term};

/// Placeholder jump target emitted while a control-flow construct's end index
/// is still unknown; always patched before the statement list is returned.
const UNRESOLVED_JUMP_TARGET: usize = usize::MAX;

/// Which block-structure flavor the current function uses. Selected once at
/// the function-body opener; both feed the same IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    /// `{` ... `}` blocks with `;` statement terminators
    Braces,
    /// `:` NEWLINE INDENT ... DEDENT blocks with NEWLINE terminators
    Indentation,
}

#[derive(Debug, Clone, Copy)]
struct VariableEntry {
    slot: Slot,
    /// Where the variable was declared, for "first declared here" notes
    span: Span,
}

#[derive(Debug)]
pub struct Parser<'source> {
    lexer: Lexer<'source>,
    dialect: Dialect,
    symbols: HashMap<InternedSymbol, VariableEntry>,
    next_slot: Slot,
    statements: Vec<Statement>,
}

impl<'source> Parser<'source> {
    /// Parses a whole compilation unit. The grammar accepts exactly one
    /// top-level function; anything after it is a syntax error.
    pub fn parse_program(source: &'source SourceFile) -> CompileResult<Program> {
        let mut parser = Self {
            lexer: Lexer::new(source),
            dialect: Dialect::Braces,
            symbols: HashMap::new(),
            next_slot: 0,
            statements: Vec::new(),
        };

        let function = parser.parse_function()?;
        parser.expect_end_of_file()?;

        Ok(Program {
            functions: vec![function],
        })
    }

    /* Function header and body */

    /// def name() -> None { ... }   |   def name() -> None: NEWLINE INDENT ...
    fn parse_function(&mut self) -> CompileResult<Function> {
        self.expect_word("def")?;

        let name_token = self.expect_next_to_be(TokenKind::Identifier)?;
        let name_text = self.text(name_token);

        if lexer::is_keyword(name_text) {
            return Err(self.error(
                DiagnosticKind::Syntax,
                name_token.span,
                format!("`{name_text}` is a reserved keyword and cannot name a function"),
            ));
        }

        let name = InternedSymbol::new(name_text);

        self.expect_next_to_be(TokenKind::OpenParen)?;
        self.expect_next_to_be(TokenKind::CloseParen)?;
        self.expect_next_to_be(TokenKind::Arrow)?;
        self.expect_word("None")?;

        let opener = self.expect_next("`{` or `:` to open the function body")?;

        match opener.kind {
            TokenKind::OpenBrace => self.dialect = Dialect::Braces,
            TokenKind::Colon => {
                self.dialect = Dialect::Indentation;
                self.lexer.enable_significant_indentation();
                self.expect_next_to_be(TokenKind::Newline)?;
                self.expect_next_to_be(TokenKind::Indent)?;
            }
            kind => {
                return Err(self.error(
                    DiagnosticKind::Syntax,
                    opener.span,
                    format!(
                        "expected `{{` or `:` to open the function body but found {kind} (`{}`)",
                        self.text(opener)
                    ),
                ));
            }
        }

        self.parse_block_body()?;

        Ok(Function {
            name,
            statements: core::mem::take(&mut self.statements),
        })
    }

    /// Parses statements until the dialect's block closer. EOF also closes an
    /// indentation block (the lexer has already drained its DEDENTs by then).
    fn parse_block_body(&mut self) -> CompileResult<()> {
        loop {
            let Some(token) = self.lexer.peek()? else {
                return match self.dialect {
                    Dialect::Indentation => Ok(()),
                    Dialect::Braces => Err(self.error(
                        DiagnosticKind::Syntax,
                        self.end_of_file_span(),
                        "expected `}` to close the block but reached end of file",
                    )),
                };
            };

            match (self.dialect, token.kind) {
                (Dialect::Braces, TokenKind::CloseBrace)
                | (Dialect::Indentation, TokenKind::Dedent) => {
                    self.lexer.next()?;
                    return Ok(());
                }
                _ => self.parse_statement()?,
            }
        }
    }

    /* Statements */

    fn parse_statement(&mut self) -> CompileResult<()> {
        let token = self.expect_next("a statement")?;

        if token.kind != TokenKind::Identifier {
            return Err(self.error(
                DiagnosticKind::Syntax,
                token.span,
                format!(
                    "expected a statement but found {} (`{}`)",
                    token.kind,
                    self.text(token)
                ),
            ));
        }

        match self.text(token) {
            "while" => return self.parse_control_flow(ControlFlow::While),
            "if" => return self.parse_control_flow(ControlFlow::If),
            _ => {}
        }

        let peeked = self.expect_peek("`(`, `:`, or `=` after the identifier")?;

        match peeked.kind {
            TokenKind::OpenParen => self.parse_call_statement(token),
            TokenKind::Colon => self.parse_declaration(token),
            TokenKind::Equals => self.parse_reassignment(token),
            kind => Err(self.error(
                DiagnosticKind::Syntax,
                peeked.span,
                format!(
                    "expected `(`, `:`, or `=` after the identifier but found {kind} (`{}`)",
                    self.text(peeked)
                ),
            )),
        }
    }

    /// print(expression)
    fn parse_call_statement(&mut self, name_token: Token) -> CompileResult<()> {
        let name = self.text(name_token);

        let Some(target) = Builtin::from_name(name) else {
            return Err(self.error(
                DiagnosticKind::Semantic,
                name_token.span,
                format!("unknown call target `{name}`; only `print` and `putchar` are supported"),
            ));
        };

        self.expect_next_to_be(TokenKind::OpenParen)?;

        let mut pending = Vec::new();
        let argument = self.parse_expression(&mut pending)?;

        self.expect_next_to_be(TokenKind::CloseParen)?;

        pending.push(Statement::Call { target, argument });

        self.expect_statement_terminator()?;
        self.statements.append(&mut pending);

        Ok(())
    }

    /// name : int = expression
    fn parse_declaration(&mut self, name_token: Token) -> CompileResult<()> {
        let name_text = self.text(name_token);

        if lexer::is_keyword(name_text) {
            return Err(self.error(
                DiagnosticKind::Syntax,
                name_token.span,
                format!("`{name_text}` is a reserved keyword and cannot name a variable"),
            ));
        }

        let name = InternedSymbol::new(name_text);

        self.expect_next_to_be(TokenKind::Colon)?;

        let annotation = self.expect_next_to_be(TokenKind::Identifier)?;

        if self.text(annotation) != "int" {
            return Err(self.error(
                DiagnosticKind::Semantic,
                annotation.span,
                format!(
                    "unsupported type annotation `{}`; only `int` is supported",
                    self.text(annotation)
                ),
            ));
        }

        self.expect_next_to_be(TokenKind::Equals)?;

        let mut pending = Vec::new();
        let value = self.parse_expression(&mut pending)?;

        if let Some(existing) = self.symbols.get(&name) {
            let source = self.lexer.source();

            return Err(source
                .diagnostic(
                    DiagnosticKind::Semantic,
                    name_token.span,
                    format!("variable `{name_text}` is already declared"),
                )
                .with_note(
                    source.note(existing.span, format!("`{name_text}` first declared here")),
                )
                .into());
        }

        // When the initializer materialized its result, that slot simply
        // becomes the variable; otherwise allocate the next slot and copy.
        let slot = match materialized_slot(&pending, value) {
            Some(slot) => slot,
            None => {
                let slot = self.allocate_slot();
                pending.push(Statement::DeclareAssign { slot, value });
                slot
            }
        };

        self.symbols.insert(
            name,
            VariableEntry {
                slot,
                span: name_token.span,
            },
        );

        self.expect_statement_terminator()?;
        self.statements.append(&mut pending);

        Ok(())
    }

    /// name = expression
    fn parse_reassignment(&mut self, name_token: Token) -> CompileResult<()> {
        let name_text = self.text(name_token);

        let Some(entry) = self.symbols.get(&InternedSymbol::new(name_text)).copied() else {
            return Err(self.error(
                DiagnosticKind::Semantic,
                name_token.span,
                format!("assignment to undeclared variable `{name_text}`"),
            ));
        };

        self.expect_next_to_be(TokenKind::Equals)?;

        let mut pending = Vec::new();
        let value = self.parse_expression(&mut pending)?;

        // Fold the root chain directly onto the variable's slot when that
        // preserves evaluation order; otherwise keep the temporary and copy.
        match materialized_slot(&pending, value) {
            Some(temp) if retarget_is_safe(&pending, temp, entry.slot) => {
                retarget(&mut pending, temp, entry.slot);
            }
            _ => pending.push(Statement::Assign {
                slot: entry.slot,
                value,
            }),
        }

        self.expect_statement_terminator()?;
        self.statements.append(&mut pending);

        Ok(())
    }

    /* Control flow */

    /// Shared emission protocol for `while` and `if`:
    ///
    /// 1. emit BlockStart at the current index
    /// 2. compute the condition into a slot
    /// 3. open the block
    /// 4. emit a placeholder ConditionalJump
    /// 5. parse the nested statements
    /// 6. (`while` only) emit the back-edge Jump to the BlockStart
    /// 7. emit BlockEnd and patch the ConditionalJump to its index
    fn parse_control_flow(&mut self, kind: ControlFlow) -> CompileResult<()> {
        let start_index = self.statements.len();

        let mut pending = vec![Statement::BlockStart { index: start_index }];

        let condition = self.parse_expression(&mut pending)?;

        // The branch always tests "last computed value is zero", so a bare
        // term must be copied into a slot first.
        if materialized_slot(&pending, condition).is_none() {
            let slot = self.allocate_slot();
            pending.push(Statement::DeclareAssign {
                slot,
                value: condition,
            });
        }

        self.expect_block_opener()?;

        let cj_index = start_index + pending.len();
        pending.push(Statement::ConditionalJump {
            target: UNRESOLVED_JUMP_TARGET,
        });

        self.statements.append(&mut pending);

        self.parse_block_body()?;

        if kind == ControlFlow::While {
            self.statements.push(Statement::Jump {
                target: start_index,
            });
        }

        let end_index = self.statements.len();
        self.statements.push(Statement::BlockEnd { index: end_index });

        let Statement::ConditionalJump { target } = &mut self.statements[cj_index] else {
            unreachable!("conditional jump placeholder moved during block parsing")
        };
        *target = end_index;

        Ok(())
    }

    fn expect_block_opener(&mut self) -> CompileResult<()> {
        match self.dialect {
            Dialect::Braces => {
                self.expect_next_to_be(TokenKind::OpenBrace)?;
            }
            Dialect::Indentation => {
                self.expect_next_to_be(TokenKind::Colon)?;
                self.expect_next_to_be(TokenKind::Newline)?;
                self.expect_next_to_be(TokenKind::Indent)?;
            }
        }

        Ok(())
    }

    fn expect_statement_terminator(&mut self) -> CompileResult<()> {
        match self.dialect {
            Dialect::Braces => self.expect_next_to_be(TokenKind::Semicolon)?,
            Dialect::Indentation => self.expect_next_to_be(TokenKind::Newline)?,
        };

        Ok(())
    }

    /* Expressions
     *
     * Three precedence levels, lowest binding first:
     *
     *   comparison -> term ( ( "<" | ">" | "<=" | ">=" | "==" | "!=" ) term )*
     *   term       -> factor ( ( "+" | "-" ) factor )*
     *   factor     -> terminal ( "*" terminal )*
     *   terminal   -> INTEGER | IDENTIFIER | "(" comparison ")"
     *
     * A chain with at least one operator materializes exactly one fresh slot:
     * the first application emits the declare variant, later applications the
     * plain variant into the same slot, with the running left operand
     * referenced by slot rather than recomputed.
     */

    fn parse_expression(&mut self, pending: &mut Vec<Statement>) -> CompileResult<Term> {
        self.parse_comparison_chain(pending)
    }

    fn parse_comparison_chain(&mut self, pending: &mut Vec<Statement>) -> CompileResult<Term> {
        let mut lhs = self.parse_term_chain(pending)?;
        let mut destination = None;

        while let Some(operator) = self.match_operator(TokenKind::is_comparison_operator)? {
            let rhs = self.parse_term_chain(pending)?;
            lhs = self.apply_binary(pending, &mut destination, operator, lhs, rhs);
        }

        Ok(lhs)
    }

    fn parse_term_chain(&mut self, pending: &mut Vec<Statement>) -> CompileResult<Term> {
        let mut lhs = self.parse_factor_chain(pending)?;
        let mut destination = None;

        while let Some(operator) = self.match_operator(TokenKind::is_term_operator)? {
            let rhs = self.parse_factor_chain(pending)?;
            lhs = self.apply_binary(pending, &mut destination, operator, lhs, rhs);
        }

        Ok(lhs)
    }

    fn parse_factor_chain(&mut self, pending: &mut Vec<Statement>) -> CompileResult<Term> {
        let mut lhs = self.parse_terminal(pending)?;
        let mut destination = None;

        while let Some(operator) = self.match_operator(TokenKind::is_factor_operator)? {
            let rhs = self.parse_terminal(pending)?;
            lhs = self.apply_binary(pending, &mut destination, operator, lhs, rhs);
        }

        Ok(lhs)
    }

    /// One binary application within a chain. The first application in a
    /// chain allocates the chain's slot and emits the declare variant; later
    /// applications reuse it with the plain variant.
    fn apply_binary(
        &mut self,
        pending: &mut Vec<Statement>,
        destination: &mut Option<Slot>,
        operator: BinaryOperator,
        lhs: Term,
        rhs: Term,
    ) -> Term {
        let slot = match *destination {
            Some(slot) => {
                pending.push(Statement::BinaryAssign {
                    slot,
                    operator,
                    lhs,
                    rhs,
                });
                slot
            }
            None => {
                let slot = self.allocate_slot();
                pending.push(Statement::DeclareBinaryAssign {
                    slot,
                    operator,
                    lhs,
                    rhs,
                });
                *destination = Some(slot);
                slot
            }
        };

        Term::VariableRef(slot)
    }

    fn parse_terminal(&mut self, pending: &mut Vec<Statement>) -> CompileResult<Term> {
        let token = self.expect_next("an expression")?;

        match token.kind {
            TokenKind::IntegerLiteral => Ok(Term::IntLiteral(self.integer_value(token)?)),
            TokenKind::Identifier => {
                let name = self.text(token);

                if lexer::is_keyword(name) {
                    return Err(self.error(
                        DiagnosticKind::Syntax,
                        token.span,
                        format!("expected an expression but found the keyword `{name}`"),
                    ));
                }

                let Some(entry) = self.symbols.get(&InternedSymbol::new(name)) else {
                    return Err(self.error(
                        DiagnosticKind::Semantic,
                        token.span,
                        format!("undeclared variable `{name}`"),
                    ));
                };

                Ok(Term::VariableRef(entry.slot))
            }
            TokenKind::OpenParen => {
                let term = self.parse_expression(pending)?;
                self.expect_next_to_be(TokenKind::CloseParen)?;
                Ok(term)
            }
            TokenKind::FloatLiteral => Err(self.error(
                DiagnosticKind::Syntax,
                token.span,
                "float literals are not supported in expressions",
            )),
            kind => Err(self.error(
                DiagnosticKind::Syntax,
                token.span,
                format!(
                    "expected an integer literal, variable, or `(` but found {kind} (`{}`)",
                    self.text(token)
                ),
            )),
        }
    }

    /// Consumes the next token when it is a continuing operator at the
    /// current precedence level; leaves it buffered otherwise. This one-token
    /// lookahead is the grammar's only backtracking point.
    fn match_operator(
        &mut self,
        accepts: fn(&TokenKind) -> bool,
    ) -> CompileResult<Option<BinaryOperator>> {
        let Some(token) = self.lexer.peek()? else {
            return Ok(None);
        };

        if !accepts(&token.kind) {
            return Ok(None);
        }

        self.lexer.next()?;

        Ok(Some(binary_operator_for(token.kind)))
    }

    fn integer_value(&self, token: Token) -> CompileResult<i64> {
        let text = self.text(token);

        let parsed = if let Some(digits) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            i64::from_str_radix(digits, 16)
        } else {
            text.parse()
        };

        parsed.map_err(|_| {
            self.error(
                DiagnosticKind::Lexical,
                token.span,
                format!("integer literal `{text}` is out of range"),
            )
        })
    }

    fn allocate_slot(&mut self) -> Slot {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    /* Token plumbing */

    fn expect_next(&mut self, expecting: &str) -> CompileResult<Token> {
        match self.lexer.next()? {
            Some(token) => Ok(token),
            None => Err(self.error(
                DiagnosticKind::Syntax,
                self.end_of_file_span(),
                format!("expected {expecting} but reached end of file"),
            )),
        }
    }

    fn expect_peek(&mut self, expecting: &str) -> CompileResult<Token> {
        match self.lexer.peek()? {
            Some(token) => Ok(token),
            None => Err(self.error(
                DiagnosticKind::Syntax,
                self.end_of_file_span(),
                format!("expected {expecting} but reached end of file"),
            )),
        }
    }

    fn expect_next_to_be(&mut self, kind: TokenKind) -> CompileResult<Token> {
        let token = self.expect_next(&kind.to_string())?;

        if token.kind != kind {
            return Err(self.error(
                DiagnosticKind::Syntax,
                token.span,
                format!(
                    "expected {kind} but found {} (`{}`)",
                    token.kind,
                    self.text(token)
                ),
            ));
        }

        Ok(token)
    }

    fn expect_word(&mut self, word: &str) -> CompileResult<Token> {
        let token = self.expect_next(&format!("`{word}`"))?;

        if token.kind != TokenKind::Identifier || self.text(token) != word {
            return Err(self.error(
                DiagnosticKind::Syntax,
                token.span,
                format!("expected `{word}` but found `{}`", self.text(token)),
            ));
        }

        Ok(token)
    }

    fn expect_end_of_file(&mut self) -> CompileResult<()> {
        match self.lexer.next()? {
            None => Ok(()),
            Some(token) => Err(self.error(
                DiagnosticKind::Syntax,
                token.span,
                format!(
                    "expected end of file but found {} (`{}`)",
                    token.kind,
                    self.text(token)
                ),
            )),
        }
    }

    fn text(&self, token: Token) -> &'source str {
        self.lexer.source().value_of_span(token.span)
    }

    fn end_of_file_span(&self) -> Span {
        let end = self.lexer.source().contents.len();
        Span::new(end, end)
    }

    fn error(&self, kind: DiagnosticKind, span: Span, message: impl Into<String>) -> CompileError {
        self.lexer.source().diagnostic(kind, span, message).into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlFlow {
    While,
    If,
}

fn binary_operator_for(kind: TokenKind) -> BinaryOperator {
    match kind {
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Minus => BinaryOperator::Subtract,
        TokenKind::Asterisk => BinaryOperator::Multiply,
        TokenKind::LessThan => BinaryOperator::LessThan,
        TokenKind::LessThanOrEqualTo => BinaryOperator::LessThanOrEqualTo,
        TokenKind::GreaterThan => BinaryOperator::GreaterThan,
        TokenKind::GreaterThanOrEqualTo => BinaryOperator::GreaterThanOrEqualTo,
        TokenKind::DoubleEquals => BinaryOperator::Equals,
        TokenKind::NotEquals => BinaryOperator::NotEquals,
        kind => unreachable!("`{kind}` is not a binary operator token"),
    }
}

/// The slot the expression's root chain computed into, when the expression
/// materialized its result as the most recent statement.
fn materialized_slot(pending: &[Statement], term: Term) -> Option<Slot> {
    let Term::VariableRef(slot) = term else {
        return None;
    };

    (pending.last()?.destination_slot() == Some(slot)).then_some(slot)
}

/// Whether the root chain writing `temp` can be redirected onto `dest`
/// without changing evaluation order: no statement after the chain's first
/// write may read `dest` (e.g. `x = 1 + 2 + x` must keep the temporary).
fn retarget_is_safe(pending: &[Statement], temp: Slot, dest: Slot) -> bool {
    let Some(first_write) = pending
        .iter()
        .position(|statement| statement.destination_slot() == Some(temp))
    else {
        return false;
    };

    !pending[first_write..]
        .iter()
        .skip(1)
        .any(|statement| statement.referenced_slots().any(|slot| slot == dest))
}

/// Rewrites the chain that computed `temp` to compute into `dest` instead,
/// downgrading the declare variant to the plain one.
fn retarget(pending: &mut [Statement], temp: Slot, dest: Slot) {
    let rewrite_term = |term: Term| match term {
        Term::VariableRef(slot) if slot == temp => Term::VariableRef(dest),
        other => other,
    };
    let rewrite_slot = |slot: Slot| if slot == temp { dest } else { slot };

    for statement in pending.iter_mut() {
        *statement = match *statement {
            Statement::DeclareAssign { slot, value } if slot == temp => Statement::Assign {
                slot: dest,
                value: rewrite_term(value),
            },
            Statement::DeclareBinaryAssign {
                slot,
                operator,
                lhs,
                rhs,
            } if slot == temp => Statement::BinaryAssign {
                slot: dest,
                operator,
                lhs: rewrite_term(lhs),
                rhs: rewrite_term(rhs),
            },
            Statement::Assign { slot, value } => Statement::Assign {
                slot: rewrite_slot(slot),
                value: rewrite_term(value),
            },
            Statement::DeclareAssign { slot, value } => Statement::DeclareAssign {
                slot,
                value: rewrite_term(value),
            },
            Statement::BinaryAssign {
                slot,
                operator,
                lhs,
                rhs,
            } => Statement::BinaryAssign {
                slot: rewrite_slot(slot),
                operator,
                lhs: rewrite_term(lhs),
                rhs: rewrite_term(rhs),
            },
            Statement::DeclareBinaryAssign {
                slot,
                operator,
                lhs,
                rhs,
            } => Statement::DeclareBinaryAssign {
                slot,
                operator,
                lhs: rewrite_term(lhs),
                rhs: rewrite_term(rhs),
            },
            Statement::Call { target, argument } => Statement::Call {
                target,
                argument: rewrite_term(argument),
            },
            statement @ (Statement::Jump { .. }
            | Statement::ConditionalJump { .. }
            | Statement::BlockStart { .. }
            | Statement::BlockEnd { .. }) => statement,
        };
    }
}
