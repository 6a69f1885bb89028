//! Pratt expression parsing.
//!
//! [`Parser::parse_expression`] parses at the lowest precedence (comma).
//! Each recursive step parses a prefix/primary expression, then greedily
//! consumes suffix and infix operators whose precedence is at least the
//! caller's minimum.  Left-associative operators recurse with `min + 1`,
//! right-associative ones with the same minimum, and same-precedence
//! left-associative chains (including comma chains) flatten into one
//! [`Expr::Binary`] node with N operands.
//!
//! Error recovery never fails: missing operands become [`Expr::Invalid`]
//! leaves at the operator's range, unmatched `(` closes implicitly at the
//! end of the expression (innermost reported first), and an invalid
//! assignment target keeps the parse.

use smallvec::{smallvec, SmallVec};

use crate::diag::DiagKind;
use crate::locator::Span;
use crate::parser::ast::{Expr, FunctionAttributes, Identifier, ObjectEntry};
use crate::parser::lexer::{Token, TokenKind};
use crate::parser::visit::{ParseVisitor, ScopeFlavor, VarKind};
use crate::parser::{Parser, ParserFlags};

/// A short inline buffer for AST child accumulation.
type ChildVec<'a> = SmallVec<[&'a Expr<'a>; 4]>;

// ─────────────────────────────────────────────────────────────────────────────
// Precedence ladder
// ─────────────────────────────────────────────────────────────────────────────

/// Binding powers, lowest to highest.  Gaps are intentional: suffix forms
/// (`++`, calls, members) sit above every infix operator.
pub(crate) mod prec {
    pub const COMMA: u8 = 1;
    pub const SPREAD: u8 = 2;
    pub const YIELD: u8 = 3;
    pub const ASSIGN: u8 = 4;
    pub const CONDITIONAL: u8 = 5;
    pub const LOGICAL_OR: u8 = 6;
    pub const LOGICAL_AND: u8 = 7;
    pub const BIT_OR: u8 = 8;
    pub const BIT_XOR: u8 = 9;
    pub const BIT_AND: u8 = 10;
    pub const EQUALITY: u8 = 11;
    pub const RELATIONAL: u8 = 12;
    pub const SHIFT: u8 = 13;
    pub const ADDITIVE: u8 = 14;
    pub const MULTIPLICATIVE: u8 = 15;
    pub const EXPONENT: u8 = 16;
    pub const UNARY: u8 = 17;
    pub const POSTFIX: u8 = 18;
    pub const CALL_MEMBER: u8 = 19;
}

/// Binding power and associativity of a binary infix operator token, or
/// `None` when the token is not one.
fn binary_level(kind: TokenKind) -> Option<(u8, bool)> {
    use TokenKind::*;
    let left = |l| Some((l, false));
    match kind {
        PipePipe => left(prec::LOGICAL_OR),
        AmpersandAmpersand => left(prec::LOGICAL_AND),
        Pipe => left(prec::BIT_OR),
        Caret => left(prec::BIT_XOR),
        Ampersand => left(prec::BIT_AND),
        EqualEqual | BangEqual | EqualEqualEqual | BangEqualEqual => left(prec::EQUALITY),
        Less | LessEqual | Greater | GreaterEqual | Instanceof | In => left(prec::RELATIONAL),
        LessLess | GreaterGreater | GreaterGreaterGreater => left(prec::SHIFT),
        Plus | Minus => left(prec::ADDITIVE),
        Star | Slash | Percent => left(prec::MULTIPLICATIVE),
        StarStar => Some((prec::EXPONENT, true)),
        _ => None,
    }
}

/// Returns `true` for the compound-assignment operator tokens.
fn is_updating_assignment(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(
        kind,
        StarEqual
            | SlashEqual
            | PercentEqual
            | PlusEqual
            | MinusEqual
            | LessLessEqual
            | GreaterGreaterEqual
            | GreaterGreaterGreaterEqual
            | AmpersandEqual
            | CaretEqual
            | PipeEqual
            | StarStarEqual
    )
}

/// Returns `true` when `kind` can begin an expression.
fn token_starts_expression(kind: TokenKind) -> bool {
    use TokenKind::*;
    kind.is_identifier_like()
        || matches!(
            kind,
            Number
                | String
                | Regexp
                | CompleteTemplate
                | TemplateHead
                | True
                | False
                | Null
                | This
                | LeftParen
                | LeftBracket
                | LeftBrace
                | Function
                | Class
                | New
                | Super
                | Import
                | Slash
                | SlashEqual
                | Bang
                | Tilde
                | Plus
                | Minus
                | Typeof
                | Void
                | Delete
                | PlusPlus
                | MinusMinus
                | DotDotDot
        )
}

impl<'alloc, 'src, 'r> Parser<'alloc, 'src, 'r> {
    // ── Node helpers ────────────────────────────────────────────────────────

    fn make(&self, e: Expr<'alloc>) -> &'alloc Expr<'alloc> {
        self.zone.alloc(e)
    }

    fn make_children(&self, children: ChildVec<'alloc>) -> &'alloc [&'alloc Expr<'alloc>] {
        self.zone.alloc_slice(children.into_iter())
    }

    /// Build an [`Identifier`] from an identifier-like or keyword token.
    pub(crate) fn identifier_from(&self, tok: &Token) -> Identifier<'alloc> {
        let text = match tok.identifier() {
            Some(s) => s,
            None => self.token_text(tok.begin, tok.end),
        };
        Identifier {
            span: tok.span(),
            name: self.zone.alloc_str(text),
        }
    }

    // ── Entry points ────────────────────────────────────────────────────────

    /// Parse a full expression (comma precedence).
    pub fn parse_expression(&mut self, v: &mut dyn ParseVisitor) -> &'alloc Expr<'alloc> {
        self.parse_expr(v, prec::COMMA)
    }

    /// Parse an expression whose every operator binds at least as tightly as
    /// `min`.
    pub(crate) fn parse_expr(&mut self, v: &mut dyn ParseVisitor, min: u8) -> &'alloc Expr<'alloc> {
        let lhs = match self.parse_prefix(v, min) {
            Some(e) => e,
            None => {
                // Nothing that can start an expression.  If an infix
                // operator is sitting here, its left operand is missing and
                // the suffix loop below will still consume the operator.
                let span = self.lexer.peek().span();
                let kind = self.lexer.peek().kind;
                if binary_level(kind).is_some()
                    || is_updating_assignment(kind)
                    || matches!(kind, TokenKind::Equal | TokenKind::Question)
                {
                    self.reporter.report(DiagKind::MissingOperandForOperator, span);
                } else {
                    self.reporter.report(DiagKind::UnexpectedToken, span);
                }
                self.make(Expr::Invalid { span })
            }
        };
        self.parse_suffixes(v, lhs, min)
    }

    /// Parse the operand to the right of an operator at `op_span`.  A
    /// missing operand becomes an [`Expr::Invalid`] leaf at the operator's
    /// own range.
    fn parse_operand(
        &mut self,
        v: &mut dyn ParseVisitor,
        min: u8,
        op_span: Span,
    ) -> &'alloc Expr<'alloc> {
        match self.parse_prefix(v, min) {
            Some(e) => self.parse_suffixes(v, e, min),
            None => {
                self.reporter
                    .report(DiagKind::MissingOperandForOperator, op_span);
                self.make(Expr::Invalid { span: op_span })
            }
        }
    }

    // ── Prefix ──────────────────────────────────────────────────────────────

    /// Parse a prefix operator or primary expression.  Returns `None`
    /// without consuming anything when the current token cannot start an
    /// expression.
    fn parse_prefix(
        &mut self,
        v: &mut dyn ParseVisitor,
        min: u8,
    ) -> Option<&'alloc Expr<'alloc>> {
        let tok = self.lexer.peek().clone();
        match tok.kind {
            TokenKind::Bang
            | TokenKind::Tilde
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Typeof
            | TokenKind::Void
            | TokenKind::Delete => {
                self.lexer.skip();
                let child = self.parse_operand(v, prec::UNARY, tok.span());
                Some(self.make(Expr::Unary {
                    operator: tok.span(),
                    child,
                }))
            }
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                self.lexer.skip();
                let child = self.parse_operand(v, prec::UNARY, tok.span());
                Some(self.make(Expr::RwUnaryPrefix {
                    operator: tok.span(),
                    child,
                }))
            }
            TokenKind::Await => {
                self.lexer.skip();
                if !self.flags.contains(ParserFlags::IN_ASYNC_FUNCTION) {
                    self.reporter
                        .report(DiagKind::AwaitOutsideAsyncFunction, tok.span());
                }
                let child = self.parse_operand(v, prec::UNARY, tok.span());
                Some(self.make(Expr::Await {
                    span: tok.span().to(child.span()),
                    child,
                }))
            }
            TokenKind::Yield if min <= prec::YIELD => {
                self.lexer.skip();
                let next = self.lexer.peek();
                if token_starts_expression(next.kind) && !next.has_leading_newline {
                    let child = self.parse_operand(v, prec::ASSIGN, tok.span());
                    Some(self.make(Expr::Unary {
                        operator: tok.span(),
                        child,
                    }))
                } else {
                    // Bare `yield`.
                    Some(self.make(Expr::Literal { span: tok.span() }))
                }
            }
            TokenKind::DotDotDot if min <= prec::SPREAD => {
                self.lexer.skip();
                let child = self.parse_operand(v, prec::ASSIGN, tok.span());
                Some(self.make(Expr::Spread {
                    span: tok.span().to(child.span()),
                    child,
                }))
            }
            _ => self.parse_primary(v, &tok),
        }
    }

    /// Parse a primary expression.  Returns `None` without consuming when
    /// the token cannot start one.
    fn parse_primary(
        &mut self,
        v: &mut dyn ParseVisitor,
        tok: &Token,
    ) -> Option<&'alloc Expr<'alloc>> {
        match tok.kind {
            TokenKind::Async => Some(self.parse_async_primary(v, tok)),
            k if k.is_identifier_like() => {
                self.lexer.skip();
                Some(self.make(Expr::Variable {
                    name: self.identifier_from(tok),
                }))
            }
            TokenKind::Number
            | TokenKind::String
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null
            | TokenKind::This
            | TokenKind::CompleteTemplate => {
                self.lexer.skip();
                Some(self.make(Expr::Literal { span: tok.span() }))
            }
            TokenKind::Slash | TokenKind::SlashEqual => {
                // Expression-start position: the slash is a regexp literal.
                self.lexer.reparse_as_regexp();
                let regexp = self.lexer.peek().span();
                self.lexer.skip();
                Some(self.make(Expr::Literal { span: regexp }))
            }
            TokenKind::TemplateHead => Some(self.parse_template(v)),
            TokenKind::LeftParen => Some(self.parse_paren_or_arrow(v, tok)),
            TokenKind::LeftBracket => Some(self.parse_array_literal(v, tok)),
            TokenKind::LeftBrace => Some(self.parse_object_literal(v, tok)),
            TokenKind::Function => {
                Some(self.parse_function_expression(v, FunctionAttributes::Normal, tok.begin))
            }
            TokenKind::Class => Some(self.parse_class_expression(v, tok)),
            TokenKind::New => Some(self.parse_new_expression(v, tok)),
            TokenKind::Super => {
                self.lexer.skip();
                Some(self.make(Expr::Super { span: tok.span() }))
            }
            TokenKind::Import => {
                self.lexer.skip();
                Some(self.make(Expr::Import { span: tok.span() }))
            }
            _ => None,
        }
    }

    // ── Suffix / infix loop ─────────────────────────────────────────────────

    /// Greedily consume suffix and infix operators binding at least as
    /// tightly as `min`.
    fn parse_suffixes(
        &mut self,
        v: &mut dyn ParseVisitor,
        mut lhs: &'alloc Expr<'alloc>,
        min: u8,
    ) -> &'alloc Expr<'alloc> {
        loop {
            let tok = self.lexer.peek().clone();
            match tok.kind {
                // ── Call / member (precedence 19) ──
                TokenKind::LeftParen if prec::CALL_MEMBER >= min => {
                    lhs = self.parse_call_suffix(v, lhs, &tok);
                }
                TokenKind::Dot if prec::CALL_MEMBER >= min => {
                    lhs = self.parse_dot_suffix(lhs, &tok);
                }
                TokenKind::LeftBracket if prec::CALL_MEMBER >= min => {
                    lhs = self.parse_index_suffix(v, lhs, &tok);
                }
                TokenKind::CompleteTemplate if prec::CALL_MEMBER >= min => {
                    // Tagged template with no substitutions.
                    self.lexer.skip();
                    let children = self.make_children(smallvec![lhs]);
                    lhs = self.make(Expr::Call {
                        span: lhs.span().to(tok.span()),
                        children,
                    });
                }
                TokenKind::TemplateHead if prec::CALL_MEMBER >= min => {
                    let template = self.parse_template(v);
                    let mut children: ChildVec<'alloc> = smallvec![lhs];
                    if let Expr::Template {
                        children: subs, ..
                    } = template
                    {
                        children.extend_from_slice(subs);
                    }
                    let span = lhs.span().to(template.span());
                    let children = self.make_children(children);
                    lhs = self.make(Expr::Call { span, children });
                }

                // ── Postfix ++/-- (precedence 18) ──
                TokenKind::PlusPlus | TokenKind::MinusMinus if prec::POSTFIX >= min => {
                    if tok.has_leading_newline {
                        // ASI: the operand is a complete statement; the
                        // operator starts the next one.
                        self.lexer.insert_semicolon();
                        break;
                    }
                    self.lexer.skip();
                    lhs = self.make(Expr::RwUnarySuffix {
                        operator: tok.span(),
                        child: lhs,
                    });
                }

                // ── Arrow from a lone identifier parameter ──
                TokenKind::Arrow if prec::ASSIGN >= min => {
                    self.lexer.skip();
                    let begin = lhs.span().begin;
                    lhs = self.parse_arrow_body(
                        v,
                        smallvec![lhs],
                        FunctionAttributes::Normal,
                        begin,
                        tok.span(),
                    );
                }

                // ── Assignment (precedence 4, right-associative) ──
                TokenKind::Equal if prec::ASSIGN >= min => {
                    self.lexer.skip();
                    if !lhs.is_assignment_target() {
                        self.reporter
                            .report(DiagKind::InvalidExpressionLeftOfAssignment, lhs.span());
                    }
                    let right = self.parse_operand(v, prec::ASSIGN, tok.span());
                    lhs = self.make(Expr::Assignment { left: lhs, right });
                }
                k if is_updating_assignment(k) && prec::ASSIGN >= min => {
                    self.lexer.skip();
                    if !matches!(
                        lhs,
                        Expr::Variable { .. } | Expr::Dot { .. } | Expr::Index { .. }
                    ) {
                        self.reporter
                            .report(DiagKind::InvalidExpressionLeftOfAssignment, lhs.span());
                    }
                    let right = self.parse_operand(v, prec::ASSIGN, tok.span());
                    lhs = self.make(Expr::UpdatingAssignment { left: lhs, right });
                }

                // ── Conditional (precedence 5, right-associative) ──
                TokenKind::Question if prec::CONDITIONAL >= min => {
                    self.lexer.skip();
                    let consequent = self.parse_operand(v, prec::ASSIGN, tok.span());
                    if self.lexer.peek().kind == TokenKind::Colon {
                        self.lexer.skip();
                    } else {
                        self.reporter
                            .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
                    }
                    let alternate = self.parse_operand(v, prec::CONDITIONAL, tok.span());
                    lhs = self.make(Expr::Conditional {
                        test: lhs,
                        consequent,
                        alternate,
                    });
                }

                // ── Comma (precedence 1) — flattened ──
                TokenKind::Comma if prec::COMMA >= min => {
                    let mut children: ChildVec<'alloc> = smallvec![lhs];
                    while self.lexer.peek().kind == TokenKind::Comma {
                        let comma = self.lexer.peek().span();
                        self.lexer.skip();
                        // A comma directly before `)` ends the chain; the
                        // enclosing construct owns the parenthesis.
                        if self.lexer.peek().kind == TokenKind::RightParen {
                            break;
                        }
                        children.push(self.parse_operand(v, prec::SPREAD, comma));
                    }
                    // `(a,)` — a trailing comma with a single operand stays
                    // a plain expression.
                    if children.len() > 1 {
                        let children = self.make_children(children);
                        lhs = self.make(Expr::Binary { children });
                    }
                }

                // ── Binary operators (precedences 6–16) — flattened ──
                k if binary_level(k).is_some_and(|(level, _)| level >= min) => {
                    if k == TokenKind::In && self.flags.contains(ParserFlags::NO_IN) {
                        break;
                    }
                    let (level, right_assoc) =
                        binary_level(k).expect("guard checked binary_level");
                    let mut children: ChildVec<'alloc> = smallvec![lhs];
                    loop {
                        let op = self.lexer.peek().clone();
                        let same_level = binary_level(op.kind)
                            .is_some_and(|(l, _)| l == level)
                            && !(op.kind == TokenKind::In
                                && self.flags.contains(ParserFlags::NO_IN));
                        if !same_level {
                            break;
                        }
                        self.lexer.skip();
                        let rhs_min = if right_assoc { level } else { level + 1 };
                        children.push(self.parse_operand(v, rhs_min, op.span()));
                        if right_assoc {
                            break;
                        }
                    }
                    let children = self.make_children(children);
                    lhs = self.make(Expr::Binary { children });
                }

                _ => break,
            }
        }
        lhs
    }

    // ── Call / member suffixes ──────────────────────────────────────────────

    /// Parse `(args…)` after `callee`.
    fn parse_call_suffix(
        &mut self,
        v: &mut dyn ParseVisitor,
        callee: &'alloc Expr<'alloc>,
        lparen: &Token,
    ) -> &'alloc Expr<'alloc> {
        self.lexer.skip();
        let mut children: ChildVec<'alloc> = smallvec![callee];
        let end = self.parse_argument_list(v, lparen, &mut children);
        let children = self.make_children(children);
        self.make(Expr::Call {
            span: Span::new(callee.span().begin, end),
            children,
        })
    }

    /// Parse the arguments of an already-opened argument list, appending to
    /// `children`.  Returns the end offset (after `)` when matched).
    fn parse_argument_list(
        &mut self,
        v: &mut dyn ParseVisitor,
        lparen: &Token,
        children: &mut ChildVec<'alloc>,
    ) -> usize {
        self.with_flags(ParserFlags::empty(), ParserFlags::NO_IN, |p| loop {
            match p.lexer.peek().kind {
                TokenKind::RightParen => {
                    let end = p.lexer.peek().end;
                    p.lexer.skip();
                    return end;
                }
                TokenKind::Eof => {
                    p.reporter
                        .report(DiagKind::UnmatchedParenthesis, lparen.span());
                    return p.lexer.peek().begin;
                }
                _ => {
                    children.push(p.parse_expr(v, prec::SPREAD));
                    match p.lexer.peek().kind {
                        TokenKind::Comma => p.lexer.skip(),
                        TokenKind::RightParen => {}
                        _ => {
                            p.reporter
                                .report(DiagKind::UnmatchedParenthesis, lparen.span());
                            return p.lexer.peek().begin;
                        }
                    }
                }
            }
        })
    }

    /// Parse `.property` after `object`.
    fn parse_dot_suffix(
        &mut self,
        object: &'alloc Expr<'alloc>,
        dot: &Token,
    ) -> &'alloc Expr<'alloc> {
        self.lexer.skip();
        let prop = self.lexer.peek().clone();
        let property = if prop.kind.is_property_name() {
            self.lexer.skip();
            self.identifier_from(&prop)
        } else {
            self.reporter.report(DiagKind::UnexpectedToken, prop.span());
            Identifier {
                span: dot.span(),
                name: "",
            }
        };
        self.make(Expr::Dot { object, property })
    }

    /// Parse `[subscript]` after `object`.
    fn parse_index_suffix(
        &mut self,
        v: &mut dyn ParseVisitor,
        object: &'alloc Expr<'alloc>,
        lbracket: &Token,
    ) -> &'alloc Expr<'alloc> {
        self.lexer.skip();
        let subscript =
            self.with_flags(ParserFlags::empty(), ParserFlags::NO_IN, |p| {
                p.parse_expression(v)
            });
        let end = if self.lexer.peek().kind == TokenKind::RightBracket {
            let end = self.lexer.peek().end;
            self.lexer.skip();
            end
        } else {
            self.reporter
                .report(DiagKind::UnexpectedToken, lbracket.span());
            self.lexer.peek().begin
        };
        self.make(Expr::Index {
            span: Span::new(object.span().begin, end),
            object,
            subscript,
        })
    }

    // ── new ─────────────────────────────────────────────────────────────────

    /// Parse `new Callee` with an optional argument list, or `new.target`.
    fn parse_new_expression(
        &mut self,
        v: &mut dyn ParseVisitor,
        new_tok: &Token,
    ) -> &'alloc Expr<'alloc> {
        self.lexer.skip();

        // `new.target` is a value, not a construction.
        if self.lexer.peek().kind == TokenKind::Dot {
            self.lexer.skip();
            let mut end = self.lexer.peek().end;
            if self.lexer.peek().kind.is_property_name() {
                self.lexer.skip();
            } else {
                self.reporter
                    .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
                end = new_tok.end;
            }
            return self.make(Expr::Literal {
                span: Span::new(new_tok.begin, end),
            });
        }

        let callee = self.parse_new_callee(v, new_tok);
        if self.lexer.peek().kind == TokenKind::LeftParen {
            let lparen = self.lexer.peek().clone();
            self.lexer.skip();
            let mut children: ChildVec<'alloc> = smallvec![callee];
            let end = self.parse_argument_list(v, &lparen, &mut children);
            let children = self.make_children(children);
            self.make(Expr::New {
                span: Span::new(new_tok.begin, end),
                children,
            })
        } else {
            let children = self.make_children(smallvec![callee]);
            self.make(Expr::New {
                span: Span::new(new_tok.begin, callee.span().end),
                children,
            })
        }
    }

    /// Parse the callee of `new`: a primary expression plus member suffixes,
    /// but no call — the argument list belongs to the `new` itself.
    fn parse_new_callee(
        &mut self,
        v: &mut dyn ParseVisitor,
        new_tok: &Token,
    ) -> &'alloc Expr<'alloc> {
        let tok = self.lexer.peek().clone();
        let mut callee = match self.parse_primary(v, &tok) {
            Some(e) => e,
            None => {
                self.reporter
                    .report(DiagKind::MissingOperandForOperator, new_tok.span());
                return self.make(Expr::Invalid {
                    span: new_tok.span(),
                });
            }
        };
        loop {
            let tok = self.lexer.peek().clone();
            callee = match tok.kind {
                TokenKind::Dot => self.parse_dot_suffix(callee, &tok),
                TokenKind::LeftBracket => self.parse_index_suffix(v, callee, &tok),
                _ => break,
            };
        }
        callee
    }

    // ── Templates ───────────────────────────────────────────────────────────

    /// Parse a substituted template; the current token is the template head.
    fn parse_template(&mut self, v: &mut dyn ParseVisitor) -> &'alloc Expr<'alloc> {
        let head = self.lexer.peek().clone();
        debug_assert_eq!(head.kind, TokenKind::TemplateHead);
        self.lexer.skip();
        let mut children: ChildVec<'alloc> = smallvec![];
        let end;
        loop {
            let sub = self.with_flags(ParserFlags::empty(), ParserFlags::NO_IN, |p| {
                p.parse_expression(v)
            });
            children.push(sub);
            if self.lexer.peek().kind == TokenKind::RightBrace {
                self.lexer.skip_in_template();
                match self.lexer.peek().kind {
                    TokenKind::TemplateMiddle => {
                        self.lexer.skip();
                        continue;
                    }
                    _ => {
                        // TemplateTail (possibly truncated at EOF).
                        end = self.lexer.peek().end;
                        self.lexer.skip();
                        break;
                    }
                }
            } else {
                self.reporter.report(
                    DiagKind::UnclosedTemplate,
                    Span::new(head.begin, self.lexer.peek().begin),
                );
                end = self.lexer.peek().begin;
                break;
            }
        }
        let children = self.make_children(children);
        self.make(Expr::Template {
            span: Span::new(head.begin, end),
            children,
        })
    }

    // ── Parenthesized expressions and arrow functions ───────────────────────

    /// Parse `(…)`: a parenthesized expression, or — when `=>` follows — the
    /// cover grammar reinterprets it as an arrow parameter list.
    ///
    /// The contents are parsed as a comma-separated item list up front, so a
    /// comma list destined to become parameters is never confused with some
    /// other flattened operator chain (`(a + b)` is one item, `(a, b)` is
    /// two).  When no `=>` follows, the items are reconstituted into the
    /// ordinary parenthesized expression.
    fn parse_paren_or_arrow(
        &mut self,
        v: &mut dyn ParseVisitor,
        lparen: &Token,
    ) -> &'alloc Expr<'alloc> {
        self.lexer.skip();
        let mut items: ChildVec<'alloc> = smallvec![];
        let end = self.parse_argument_list(v, lparen, &mut items);

        if self.lexer.peek().kind == TokenKind::Arrow {
            let arrow = self.lexer.peek().span();
            self.lexer.skip();
            return self.parse_arrow_body(
                v,
                items,
                FunctionAttributes::Normal,
                lparen.begin,
                arrow,
            );
        }
        match items.len() {
            // `()` with no arrow after it.
            0 => {
                let span = Span::new(lparen.begin, end);
                self.reporter.report(DiagKind::UnexpectedToken, span);
                self.make(Expr::Invalid { span })
            }
            // A parenthesized expression keeps the inner node (and range).
            1 => items[0],
            // A top-level comma list: the comma-chain expression.
            _ => {
                let children = self.make_children(items);
                self.make(Expr::Binary { children })
            }
        }
    }

    /// Parse an arrow function body after `=>` was consumed.  `params` hold
    /// the parameters as expression nodes; `begin` is the offset of the
    /// first parameter-list token (or of `async`).
    fn parse_arrow_body(
        &mut self,
        v: &mut dyn ParseVisitor,
        params: ChildVec<'alloc>,
        attributes: FunctionAttributes,
        begin: usize,
        arrow_span: Span,
    ) -> &'alloc Expr<'alloc> {
        // The cover grammar accepts any expression in parameter position;
        // only binding patterns survive the reinterpretation.
        for param in &params {
            if !is_parameter_pattern(param) {
                self.reporter
                    .report(DiagKind::UnexpectedToken, param.span());
            }
        }
        let (add, remove) = function_body_flags(attributes);
        if self.lexer.peek().kind == TokenKind::LeftBrace {
            // Statement body: visited inline, only the parameters survive in
            // the AST.
            let lbrace = self.lexer.peek().clone();
            self.lexer.skip();
            v.visit_enter_scope(ScopeFlavor::Function);
            for param in &params {
                self.declare_pattern(param, v, VarKind::Parameter);
            }
            self.with_flags(add, remove, |p| {
                p.parse_statements_until_right_brace(v, &lbrace);
            });
            let end = if self.lexer.peek().kind == TokenKind::RightBrace {
                let end = self.lexer.peek().end;
                self.lexer.skip();
                end
            } else {
                self.lexer.peek().begin
            };
            v.visit_exit_scope();
            let children = self.make_children(params);
            self.make(Expr::ArrowFunctionWithStatements {
                attributes,
                span: Span::new(begin, end),
                children,
            })
        } else {
            // Expression body: stored as the final child; scoping is handled
            // by the expression-tree walk.
            let body = self.with_flags(add, remove, |p| {
                p.parse_operand(v, prec::ASSIGN, arrow_span)
            });
            let mut children = params;
            children.push(body);
            let span = Span::new(begin, body.span().end);
            let children = self.make_children(children);
            self.make(Expr::ArrowFunctionWithExpression {
                attributes,
                span,
                children,
            })
        }
    }

    // ── async ───────────────────────────────────────────────────────────────

    /// Parse the many meanings of `async` at expression start: an async
    /// function expression, an async arrow, a call of a variable named
    /// `async`, or a plain variable reference.
    fn parse_async_primary(
        &mut self,
        v: &mut dyn ParseVisitor,
        async_tok: &Token,
    ) -> &'alloc Expr<'alloc> {
        self.lexer.skip();
        let next = self.lexer.peek().clone();

        // `async` only modifies something on the same line.
        if !next.has_leading_newline {
            match next.kind {
                TokenKind::Function => {
                    return self.parse_function_expression(
                        v,
                        FunctionAttributes::Async,
                        async_tok.begin,
                    );
                }
                TokenKind::LeftParen => {
                    // Either `async (params) =>` or a call of `async`.
                    self.lexer.skip();
                    let mut items: ChildVec<'alloc> = smallvec![];
                    let end = self.parse_argument_list(v, &next, &mut items);
                    if self.lexer.peek().kind == TokenKind::Arrow {
                        let arrow = self.lexer.peek().span();
                        self.lexer.skip();
                        return self.parse_arrow_body(
                            v,
                            items,
                            FunctionAttributes::Async,
                            async_tok.begin,
                            arrow,
                        );
                    }
                    let callee = self.make(Expr::Variable {
                        name: self.identifier_from(async_tok),
                    });
                    let mut children: ChildVec<'alloc> = smallvec![callee];
                    children.extend(items);
                    let children = self.make_children(children);
                    return self.make(Expr::Call {
                        span: Span::new(async_tok.begin, end),
                        children,
                    });
                }
                k if k.is_identifier_like() => {
                    self.lexer.skip();
                    if self.lexer.peek().kind == TokenKind::Arrow {
                        let arrow = self.lexer.peek().span();
                        self.lexer.skip();
                        let param = self.make(Expr::Variable {
                            name: self.identifier_from(&next),
                        });
                        return self.parse_arrow_body(
                            v,
                            smallvec![param],
                            FunctionAttributes::Async,
                            async_tok.begin,
                            arrow,
                        );
                    }
                    // Not an arrow after all; un-consume the identifier.
                    self.lexer.push_back(next);
                }
                _ => {}
            }
        }

        self.make(Expr::Variable {
            name: self.identifier_from(async_tok),
        })
    }

    // ── Array literals ──────────────────────────────────────────────────────

    /// Parse `[…]`; elided holes are dropped.
    fn parse_array_literal(
        &mut self,
        v: &mut dyn ParseVisitor,
        lbracket: &Token,
    ) -> &'alloc Expr<'alloc> {
        self.lexer.skip();
        let mut children: ChildVec<'alloc> = smallvec![];
        let end = self.with_flags(ParserFlags::empty(), ParserFlags::NO_IN, |p| loop {
            while p.lexer.peek().kind == TokenKind::Comma {
                p.lexer.skip();
            }
            match p.lexer.peek().kind {
                TokenKind::RightBracket => {
                    let end = p.lexer.peek().end;
                    p.lexer.skip();
                    return end;
                }
                TokenKind::Eof => {
                    p.reporter
                        .report(DiagKind::UnexpectedToken, lbracket.span());
                    return p.lexer.peek().begin;
                }
                _ => {
                    children.push(p.parse_expr(v, prec::SPREAD));
                    match p.lexer.peek().kind {
                        TokenKind::Comma | TokenKind::RightBracket => {}
                        _ => {
                            p.reporter
                                .report(DiagKind::UnexpectedToken, p.lexer.peek().span());
                            return p.lexer.peek().begin;
                        }
                    }
                }
            }
        });
        let children = self.make_children(children);
        self.make(Expr::Array {
            span: Span::new(lbracket.begin, end),
            children,
        })
    }

    // ── Object literals ─────────────────────────────────────────────────────

    /// Parse `{…}` as an object literal (also the cover grammar for object
    /// destructuring patterns).
    fn parse_object_literal(
        &mut self,
        v: &mut dyn ParseVisitor,
        lbrace: &Token,
    ) -> &'alloc Expr<'alloc> {
        self.lexer.skip();
        let mut entries: SmallVec<[ObjectEntry<'alloc>; 4]> = smallvec![];
        let end = self.with_flags(ParserFlags::empty(), ParserFlags::NO_IN, |p| loop {
            match p.lexer.peek().kind {
                TokenKind::RightBrace => {
                    let end = p.lexer.peek().end;
                    p.lexer.skip();
                    return end;
                }
                TokenKind::Eof => {
                    p.reporter.report(DiagKind::UnexpectedToken, lbrace.span());
                    return p.lexer.peek().begin;
                }
                _ => {}
            }
            if let Some(entry) = p.parse_object_entry(v) {
                entries.push(entry);
            }
            match p.lexer.peek().kind {
                TokenKind::Comma => p.lexer.skip(),
                TokenKind::RightBrace | TokenKind::Eof => {}
                _ => {
                    p.reporter
                        .report(DiagKind::UnexpectedToken, p.lexer.peek().span());
                    p.lexer.skip();
                }
            }
        });
        let entries = self.zone.alloc_slice(entries.into_iter());
        self.make(Expr::Object {
            span: Span::new(lbrace.begin, end),
            entries,
        })
    }

    /// Parse one object literal entry.  Returns `None` after reporting when
    /// the entry is unparsable (the offending token is consumed).
    fn parse_object_entry(&mut self, v: &mut dyn ParseVisitor) -> Option<ObjectEntry<'alloc>> {
        let tok = self.lexer.peek().clone();
        match tok.kind {
            // `...expr`
            TokenKind::DotDotDot => {
                self.lexer.skip();
                let child = self.parse_operand(v, prec::ASSIGN, tok.span());
                let value = self.make(Expr::Spread {
                    span: tok.span().to(child.span()),
                    child,
                });
                Some(ObjectEntry {
                    property: None,
                    value,
                })
            }
            // `[computed]: value`
            TokenKind::LeftBracket => {
                self.lexer.skip();
                let key = self.parse_expr(v, prec::ASSIGN);
                if self.lexer.peek().kind == TokenKind::RightBracket {
                    self.lexer.skip();
                } else {
                    self.reporter.report(DiagKind::UnexpectedToken, tok.span());
                }
                let value = if self.lexer.peek().kind == TokenKind::Colon {
                    let colon = self.lexer.peek().span();
                    self.lexer.skip();
                    self.parse_operand(v, prec::ASSIGN, colon)
                } else if self.lexer.peek().kind == TokenKind::LeftParen {
                    self.parse_method_value(v, FunctionAttributes::Normal, key.span().begin)
                } else {
                    self.reporter
                        .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
                    self.make(Expr::Invalid { span: key.span() })
                };
                Some(ObjectEntry {
                    property: Some(key),
                    value,
                })
            }
            // `'key': value` / `42: value`
            TokenKind::String | TokenKind::Number => {
                self.lexer.skip();
                let key = self.make(Expr::Literal { span: tok.span() });
                let value = if self.lexer.peek().kind == TokenKind::Colon {
                    let colon = self.lexer.peek().span();
                    self.lexer.skip();
                    self.parse_operand(v, prec::ASSIGN, colon)
                } else {
                    self.reporter
                        .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
                    self.make(Expr::Invalid { span: tok.span() })
                };
                Some(ObjectEntry {
                    property: Some(key),
                    value,
                })
            }
            k if k.is_property_name() => {
                self.lexer.skip();

                // Accessor / async-method sugar: `get name() {}`,
                // `set name(v) {}`, `async name() {}`.
                if matches!(
                    tok.kind,
                    TokenKind::Get | TokenKind::Set | TokenKind::Async
                ) && self.lexer.peek().kind.is_property_name()
                {
                    let name = self.lexer.peek().clone();
                    self.lexer.skip();
                    let attributes = if tok.kind == TokenKind::Async {
                        FunctionAttributes::Async
                    } else {
                        FunctionAttributes::Normal
                    };
                    let value = self.parse_method_value(v, attributes, tok.begin);
                    let key = self.make(Expr::Literal { span: name.span() });
                    return Some(ObjectEntry {
                        property: Some(key),
                        value,
                    });
                }

                let key = self.make(Expr::Literal { span: tok.span() });
                match self.lexer.peek().kind {
                    // `key: value`
                    TokenKind::Colon => {
                        let colon = self.lexer.peek().span();
                        self.lexer.skip();
                        let value = self.parse_operand(v, prec::ASSIGN, colon);
                        Some(ObjectEntry {
                            property: Some(key),
                            value,
                        })
                    }
                    // `key = default` — cover grammar for destructuring.
                    TokenKind::Equal => {
                        let eq = self.lexer.peek().span();
                        self.lexer.skip();
                        let left = self.make(Expr::Variable {
                            name: self.identifier_from(&tok),
                        });
                        let right = self.parse_operand(v, prec::ASSIGN, eq);
                        let value = self.make(Expr::Assignment { left, right });
                        Some(ObjectEntry {
                            property: Some(key),
                            value,
                        })
                    }
                    // Method shorthand: `key(params) { body }`.
                    TokenKind::LeftParen => {
                        let value =
                            self.parse_method_value(v, FunctionAttributes::Normal, tok.begin);
                        Some(ObjectEntry {
                            property: Some(key),
                            value,
                        })
                    }
                    // Shorthand: `{ key }`.
                    _ => {
                        let value = self.make(Expr::Variable {
                            name: self.identifier_from(&tok),
                        });
                        Some(ObjectEntry {
                            property: Some(key),
                            value,
                        })
                    }
                }
            }
            _ => {
                self.reporter.report(DiagKind::UnexpectedToken, tok.span());
                self.lexer.skip();
                None
            }
        }
    }

    /// Parse a method's parameter list and body as a function-expression
    /// value.  The current token is the `(`.
    fn parse_method_value(
        &mut self,
        v: &mut dyn ParseVisitor,
        attributes: FunctionAttributes,
        begin: usize,
    ) -> &'alloc Expr<'alloc> {
        v.visit_enter_scope(ScopeFlavor::Function);
        let end = self.parse_params_and_body_in_scope(v, attributes);
        v.visit_exit_scope();
        self.make(Expr::Function {
            attributes,
            span: Span::new(begin, end),
        })
    }

    // ── Function expressions ────────────────────────────────────────────────

    /// Parse a function expression; the current token is `function` (an
    /// `async` prefix was already consumed by the caller, whose offset is
    /// `begin`).
    pub(crate) fn parse_function_expression(
        &mut self,
        v: &mut dyn ParseVisitor,
        attributes: FunctionAttributes,
        begin: usize,
    ) -> &'alloc Expr<'alloc> {
        debug_assert_eq!(self.lexer.peek().kind, TokenKind::Function);
        self.lexer.skip();
        // Generator star: parsed, not modelled.
        if self.lexer.peek().kind == TokenKind::Star {
            self.lexer.skip();
        }
        let name = if self.lexer.peek().kind.is_identifier_like() {
            let tok = self.lexer.peek().clone();
            self.lexer.skip();
            Some(self.identifier_from(&tok))
        } else {
            None
        };
        v.visit_enter_scope(ScopeFlavor::Function);
        if let Some(name) = &name {
            // A named function expression's name is visible inside its own
            // body only.
            v.visit_variable_declaration(name.name, name.span, VarKind::Function);
        }
        let end = self.parse_params_and_body_in_scope(v, attributes);
        v.visit_exit_scope();
        let span = Span::new(begin, end);
        match name {
            Some(name) => self.make(Expr::NamedFunction {
                attributes,
                name,
                span,
            }),
            None => self.make(Expr::Function { attributes, span }),
        }
    }

    /// Parse `(params) { body }` inside an already-entered function scope,
    /// declaring the parameters and visiting the body statements.  Returns
    /// the end offset.
    pub(crate) fn parse_params_and_body_in_scope(
        &mut self,
        v: &mut dyn ParseVisitor,
        attributes: FunctionAttributes,
    ) -> usize {
        // Parameter list.
        if self.lexer.peek().kind == TokenKind::LeftParen {
            let lparen = self.lexer.peek().clone();
            self.lexer.skip();
            self.with_flags(ParserFlags::empty(), ParserFlags::NO_IN, |p| loop {
                match p.lexer.peek().kind {
                    TokenKind::RightParen => {
                        p.lexer.skip();
                        break;
                    }
                    TokenKind::Eof => {
                        p.reporter
                            .report(DiagKind::UnmatchedParenthesis, lparen.span());
                        break;
                    }
                    _ => {
                        let param = p.parse_expr(v, prec::SPREAD);
                        if !is_parameter_pattern(param) {
                            p.reporter
                                .report(DiagKind::UnexpectedToken, param.span());
                        }
                        p.declare_pattern(param, v, VarKind::Parameter);
                        match p.lexer.peek().kind {
                            TokenKind::Comma => p.lexer.skip(),
                            TokenKind::RightParen => {}
                            _ => {
                                p.reporter
                                    .report(DiagKind::UnmatchedParenthesis, lparen.span());
                                break;
                            }
                        }
                    }
                }
            });
        } else {
            self.reporter
                .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
        }

        // Body.
        let (add, remove) = function_body_flags(attributes);
        if self.lexer.peek().kind == TokenKind::LeftBrace {
            let lbrace = self.lexer.peek().clone();
            self.lexer.skip();
            self.with_flags(add, remove, |p| {
                p.parse_statements_until_right_brace(v, &lbrace);
            });
            if self.lexer.peek().kind == TokenKind::RightBrace {
                let end = self.lexer.peek().end;
                self.lexer.skip();
                end
            } else {
                self.lexer.peek().begin
            }
        } else {
            self.reporter
                .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
            self.lexer.peek().begin
        }
    }

    // ── Class expressions ───────────────────────────────────────────────────

    /// Parse a class expression; the current token is `class`.
    fn parse_class_expression(
        &mut self,
        v: &mut dyn ParseVisitor,
        class_tok: &Token,
    ) -> &'alloc Expr<'alloc> {
        self.lexer.skip();
        // An expression-position class name binds nowhere relevant to the
        // linter; consume it.
        if self.lexer.peek().kind.is_identifier_like() {
            self.lexer.skip();
        }
        let end = self.parse_class_tail(v);
        self.make(Expr::Class {
            span: Span::new(class_tok.begin, end),
        })
    }
}

/// Flags for parsing a function/arrow body with the given attributes.
fn function_body_flags(attributes: FunctionAttributes) -> (ParserFlags, ParserFlags) {
    match attributes {
        FunctionAttributes::Async => (
            ParserFlags::IN_FUNCTION | ParserFlags::IN_ASYNC_FUNCTION,
            ParserFlags::NO_IN,
        ),
        FunctionAttributes::Normal => (
            ParserFlags::IN_FUNCTION,
            ParserFlags::NO_IN | ParserFlags::IN_ASYNC_FUNCTION,
        ),
    }
}

/// Returns `true` when `expr` can be reinterpreted as an arrow-function
/// binding pattern: an identifier, a destructuring object/array literal, a
/// default (`pattern = init`), or a rest element.
fn is_parameter_pattern(expr: &Expr<'_>) -> bool {
    match expr {
        Expr::Variable { .. } | Expr::Object { .. } | Expr::Array { .. } => true,
        Expr::Assignment { left, .. } => is_parameter_pattern(left),
        Expr::Spread { child, .. } => is_parameter_pattern(child),
        _ => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
