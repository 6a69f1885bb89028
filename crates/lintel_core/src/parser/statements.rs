//! Statement parsing and the expression-tree walk that narrates variable
//! uses to the visitor.
//!
//! Statements are not materialised as AST nodes: the parser consumes them
//! and emits [`ParseVisitor`] events (declarations, uses, assignments, scope
//! boundaries).  Expressions *are* materialised (see
//! [`super::expression`]); after parsing an expression statement the tree is
//! walked with [`Parser::visit_expression`] to emit its use events.

use crate::diag::DiagKind;
use crate::parser::ast::{Expr, FunctionAttributes};
use crate::parser::expression::prec;
use crate::parser::lexer::{Token, TokenKind};
use crate::parser::visit::{ParseVisitor, ScopeFlavor, VarKind};
use crate::parser::{Parser, ParserFlags};

/// How a walked expression position treats variable references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UseMode {
    /// The variable's value is read.
    Use,
    /// The variable is written (assignment target, `++`, destructuring).
    AssignTarget,
}

impl<'alloc, 'src, 'r> Parser<'alloc, 'src, 'r> {
    // ── Module entry point ──────────────────────────────────────────────────

    /// Parse the whole source as a module, driving `v`, and finish with
    /// [`ParseVisitor::visit_end_of_module`].
    pub fn parse_and_visit_module(&mut self, v: &mut dyn ParseVisitor) {
        while self.lexer.peek().kind != TokenKind::Eof {
            self.parse_and_visit_statement(v);
        }
        v.visit_end_of_module();
    }

    /// Parse one statement, driving `v`.  Always makes progress: a token no
    /// statement can start with is reported and dropped.
    pub fn parse_and_visit_statement(&mut self, v: &mut dyn ParseVisitor) {
        let entry_kind = self.lexer.peek().kind;
        let entry_begin = self.lexer.peek().begin;
        self.parse_statement_inner(v);
        let peek = self.lexer.peek();
        if peek.kind == entry_kind && peek.begin == entry_begin && peek.kind != TokenKind::Eof {
            self.lexer.skip();
        }
    }

    fn parse_statement_inner(&mut self, v: &mut dyn ParseVisitor) {
        let tok = self.lexer.peek().clone();
        match tok.kind {
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                self.parse_variable_declaration_statement(v)
            }
            TokenKind::Function => {
                self.parse_function_declaration(v, FunctionAttributes::Normal, tok.begin)
            }
            TokenKind::Class => self.parse_class_declaration(v),
            TokenKind::LeftBrace => self.parse_block(v),
            TokenKind::Semicolon => self.lexer.skip(),
            TokenKind::If => self.parse_if_statement(v),
            TokenKind::While => self.parse_while_statement(v),
            TokenKind::Do => self.parse_do_while_statement(v),
            TokenKind::For => self.parse_for_statement(v),
            TokenKind::Switch => self.parse_switch_statement(v),
            TokenKind::Try => self.parse_try_statement(v),
            TokenKind::Throw => self.parse_throw_statement(v),
            TokenKind::Return => self.parse_return_statement(v),
            TokenKind::Break | TokenKind::Continue => {
                self.lexer.skip();
                let label = self.lexer.peek();
                if label.kind.is_identifier_like() && !label.has_leading_newline {
                    self.lexer.skip();
                }
                self.parse_semicolon_or_asi();
            }
            TokenKind::Debugger => {
                self.lexer.skip();
                self.parse_semicolon_or_asi();
            }
            TokenKind::With => self.parse_with_statement(v),
            TokenKind::Import => self.parse_import_statement(v),
            TokenKind::Export => self.parse_export_statement(v),
            TokenKind::Async => {
                // `async function` declaration, else an expression statement.
                self.lexer.skip();
                let next = self.lexer.peek().clone();
                if next.kind == TokenKind::Function && !next.has_leading_newline {
                    self.parse_function_declaration(v, FunctionAttributes::Async, tok.begin);
                } else {
                    self.lexer.push_back(tok);
                    self.parse_expression_statement(v);
                }
            }
            k if k.is_identifier_like() => {
                // `label: statement`, else an expression statement.
                self.lexer.skip();
                if self.lexer.peek().kind == TokenKind::Colon {
                    self.lexer.skip();
                    self.parse_and_visit_statement(v);
                } else {
                    self.lexer.push_back(tok);
                    self.parse_expression_statement(v);
                }
            }
            _ => self.parse_expression_statement(v),
        }
    }

    // ── Shared small pieces ─────────────────────────────────────────────────

    fn parse_expression_statement(&mut self, v: &mut dyn ParseVisitor) {
        let expr = self.parse_expression(v);
        self.visit_expression(expr, v, UseMode::Use);
        self.parse_semicolon_or_asi();
    }

    /// Consume a `;`, or let ASI succeed when the next token is `}`, EOF, or
    /// on a new line; otherwise report.
    pub(crate) fn parse_semicolon_or_asi(&mut self) {
        let kind = self.lexer.peek().kind;
        let newline = self.lexer.peek().has_leading_newline;
        let span = self.lexer.peek().span();
        if kind == TokenKind::Semicolon {
            self.lexer.skip();
        } else if !(kind == TokenKind::RightBrace || kind == TokenKind::Eof || newline) {
            self.reporter
                .report(DiagKind::MissingSemicolonAfterExpression, span);
        }
    }

    fn expect(&mut self, kind: TokenKind) {
        if self.lexer.peek().kind == kind {
            self.lexer.skip();
        } else {
            self.reporter
                .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
        }
    }

    /// Parse statements until the `}` matching `lbrace` (left for the caller
    /// to consume) or EOF (reported at the opener).
    pub(crate) fn parse_statements_until_right_brace(
        &mut self,
        v: &mut dyn ParseVisitor,
        lbrace: &Token,
    ) {
        loop {
            match self.lexer.peek().kind {
                TokenKind::RightBrace => return,
                TokenKind::Eof => {
                    self.reporter
                        .report(DiagKind::UnexpectedToken, lbrace.span());
                    return;
                }
                _ => self.parse_and_visit_statement(v),
            }
        }
    }

    /// Parse a `{ … }` block statement with its own block scope.
    fn parse_block(&mut self, v: &mut dyn ParseVisitor) {
        let lbrace = self.lexer.peek().clone();
        self.lexer.skip();
        v.visit_enter_scope(ScopeFlavor::Block);
        self.parse_statements_until_right_brace(v, &lbrace);
        if self.lexer.peek().kind == TokenKind::RightBrace {
            self.lexer.skip();
        }
        v.visit_exit_scope();
    }

    // ── Declarations ────────────────────────────────────────────────────────

    fn parse_variable_declaration_statement(&mut self, v: &mut dyn ParseVisitor) {
        let kind = match self.lexer.peek().kind {
            TokenKind::Var => VarKind::Var,
            TokenKind::Let => VarKind::Let,
            _ => VarKind::Const,
        };
        self.lexer.skip();
        loop {
            // One declarator: a pattern with an optional `= init`, which the
            // expression grammar covers as an assignment.
            let declarator = self.parse_expr(v, prec::SPREAD);
            self.declare_pattern(declarator, v, kind);
            if self.lexer.peek().kind == TokenKind::Comma {
                self.lexer.skip();
            } else {
                break;
            }
        }
        self.parse_semicolon_or_asi();
    }

    /// Parse a `function` declaration.  The name binds in the *enclosing*
    /// scope; parameters and body get a fresh function scope.
    fn parse_function_declaration(
        &mut self,
        v: &mut dyn ParseVisitor,
        attributes: FunctionAttributes,
        _begin: usize,
    ) {
        debug_assert_eq!(self.lexer.peek().kind, TokenKind::Function);
        self.lexer.skip();
        if self.lexer.peek().kind == TokenKind::Star {
            self.lexer.skip();
        }
        if self.lexer.peek().kind.is_identifier_like() {
            let name_tok = self.lexer.peek().clone();
            self.lexer.skip();
            let name = self.identifier_from(&name_tok);
            v.visit_variable_declaration(name.name, name.span, VarKind::Function);
        } else {
            self.reporter
                .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
        }
        v.visit_enter_scope(ScopeFlavor::Function);
        self.parse_params_and_body_in_scope(v, attributes);
        v.visit_exit_scope();
    }

    fn parse_class_declaration(&mut self, v: &mut dyn ParseVisitor) {
        debug_assert_eq!(self.lexer.peek().kind, TokenKind::Class);
        self.lexer.skip();
        if self.lexer.peek().kind.is_identifier_like() {
            let name_tok = self.lexer.peek().clone();
            self.lexer.skip();
            let name = self.identifier_from(&name_tok);
            v.visit_variable_declaration(name.name, name.span, VarKind::Class);
        } else {
            self.reporter
                .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
        }
        self.parse_class_tail(v);
    }

    /// Parse `extends …` and the `{ … }` class body; shared between class
    /// declarations and class expressions.  Returns the end offset.
    pub(crate) fn parse_class_tail(&mut self, v: &mut dyn ParseVisitor) -> usize {
        if self.lexer.peek().kind == TokenKind::Extends {
            self.lexer.skip();
            let superclass = self.parse_expr(v, prec::CALL_MEMBER);
            self.visit_expression(superclass, v, UseMode::Use);
        }
        if self.lexer.peek().kind != TokenKind::LeftBrace {
            self.reporter
                .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
            return self.lexer.peek().begin;
        }
        let lbrace = self.lexer.peek().clone();
        self.lexer.skip();
        loop {
            match self.lexer.peek().kind {
                TokenKind::RightBrace => {
                    let end = self.lexer.peek().end;
                    self.lexer.skip();
                    return end;
                }
                TokenKind::Eof => {
                    self.reporter
                        .report(DiagKind::UnexpectedToken, lbrace.span());
                    return self.lexer.peek().begin;
                }
                TokenKind::Semicolon | TokenKind::Static => self.lexer.skip(),
                _ => self.parse_class_member(v),
            }
        }
    }

    /// Parse one class member: a method (possibly `get`/`set`/`async`/`*`),
    /// or a field with an optional initializer.  Member names are not
    /// variable declarations.
    fn parse_class_member(&mut self, v: &mut dyn ParseVisitor) {
        let mut attributes = FunctionAttributes::Normal;

        // Modifier prefixes, each only when a member name still follows.
        loop {
            let tok = self.lexer.peek().clone();
            match tok.kind {
                TokenKind::Async | TokenKind::Get | TokenKind::Set => {
                    self.lexer.skip();
                    let next = self.lexer.peek().kind;
                    let modifies = next.is_property_name()
                        || matches!(
                            next,
                            TokenKind::String
                                | TokenKind::Number
                                | TokenKind::LeftBracket
                                | TokenKind::Star
                        );
                    if modifies {
                        if tok.kind == TokenKind::Async {
                            attributes = FunctionAttributes::Async;
                        }
                        continue;
                    }
                    // `tok` itself was the member name (e.g. `get() {}`).
                    self.parse_class_member_rest(v, attributes);
                    return;
                }
                TokenKind::Star => {
                    self.lexer.skip();
                    continue;
                }
                _ => break,
            }
        }

        // The member name proper.
        let tok = self.lexer.peek().clone();
        match tok.kind {
            TokenKind::String | TokenKind::Number => self.lexer.skip(),
            TokenKind::LeftBracket => {
                self.lexer.skip();
                let key = self.parse_expr(v, prec::ASSIGN);
                self.visit_expression(key, v, UseMode::Use);
                self.expect(TokenKind::RightBracket);
            }
            k if k.is_property_name() => self.lexer.skip(),
            _ => {
                self.reporter.report(DiagKind::UnexpectedToken, tok.span());
                self.lexer.skip();
                return;
            }
        }
        self.parse_class_member_rest(v, attributes);
    }

    /// Parse what follows a class member name: `(params) { body }`, `=
    /// initializer`, or nothing (a bare field).
    fn parse_class_member_rest(
        &mut self,
        v: &mut dyn ParseVisitor,
        attributes: FunctionAttributes,
    ) {
        match self.lexer.peek().kind {
            TokenKind::LeftParen => {
                v.visit_enter_scope(ScopeFlavor::Function);
                self.parse_params_and_body_in_scope(v, attributes);
                v.visit_exit_scope();
            }
            TokenKind::Equal => {
                self.lexer.skip();
                let init = self.parse_expr(v, prec::SPREAD);
                self.visit_expression(init, v, UseMode::Use);
                if self.lexer.peek().kind == TokenKind::Semicolon {
                    self.lexer.skip();
                }
            }
            _ => {
                if self.lexer.peek().kind == TokenKind::Semicolon {
                    self.lexer.skip();
                }
            }
        }
    }

    // ── Control flow ────────────────────────────────────────────────────────

    fn parse_if_statement(&mut self, v: &mut dyn ParseVisitor) {
        self.lexer.skip();
        self.expect(TokenKind::LeftParen);
        let test = self.parse_expression(v);
        self.visit_expression(test, v, UseMode::Use);
        self.expect(TokenKind::RightParen);
        self.parse_and_visit_statement(v);
        if self.lexer.peek().kind == TokenKind::Else {
            self.lexer.skip();
            self.parse_and_visit_statement(v);
        }
    }

    fn parse_while_statement(&mut self, v: &mut dyn ParseVisitor) {
        self.lexer.skip();
        self.expect(TokenKind::LeftParen);
        let test = self.parse_expression(v);
        self.visit_expression(test, v, UseMode::Use);
        self.expect(TokenKind::RightParen);
        self.parse_and_visit_statement(v);
    }

    fn parse_do_while_statement(&mut self, v: &mut dyn ParseVisitor) {
        self.lexer.skip();
        self.parse_and_visit_statement(v);
        self.expect(TokenKind::While);
        self.expect(TokenKind::LeftParen);
        let test = self.parse_expression(v);
        self.visit_expression(test, v, UseMode::Use);
        self.expect(TokenKind::RightParen);
        if self.lexer.peek().kind == TokenKind::Semicolon {
            self.lexer.skip();
        }
    }

    fn parse_for_statement(&mut self, v: &mut dyn ParseVisitor) {
        self.lexer.skip();
        // `for await (… of …)`.
        if self.lexer.peek().kind == TokenKind::Await {
            self.lexer.skip();
        }
        v.visit_enter_scope(ScopeFlavor::For);
        self.expect(TokenKind::LeftParen);

        match self.lexer.peek().kind {
            TokenKind::Semicolon => {
                self.lexer.skip();
                self.parse_for_condition_and_update(v);
            }
            TokenKind::Var | TokenKind::Let | TokenKind::Const => {
                let kind = match self.lexer.peek().kind {
                    TokenKind::Var => VarKind::Var,
                    TokenKind::Let => VarKind::Let,
                    _ => VarKind::Const,
                };
                self.lexer.skip();
                let first = self.with_flags(ParserFlags::NO_IN, ParserFlags::empty(), |p| {
                    p.parse_expr(v, prec::SPREAD)
                });
                self.declare_pattern(first, v, kind);
                match self.lexer.peek().kind {
                    TokenKind::In | TokenKind::Of => {
                        self.lexer.skip();
                        let object = self.parse_expression(v);
                        self.visit_expression(object, v, UseMode::Use);
                    }
                    _ => {
                        while self.lexer.peek().kind == TokenKind::Comma {
                            self.lexer.skip();
                            let declarator =
                                self.with_flags(ParserFlags::NO_IN, ParserFlags::empty(), |p| {
                                    p.parse_expr(v, prec::SPREAD)
                                });
                            self.declare_pattern(declarator, v, kind);
                        }
                        self.expect(TokenKind::Semicolon);
                        self.parse_for_condition_and_update(v);
                    }
                }
            }
            _ => {
                let first = self.with_flags(ParserFlags::NO_IN, ParserFlags::empty(), |p| {
                    p.parse_expression(v)
                });
                match self.lexer.peek().kind {
                    TokenKind::In | TokenKind::Of => {
                        self.lexer.skip();
                        self.visit_expression(first, v, UseMode::AssignTarget);
                        let object = self.parse_expression(v);
                        self.visit_expression(object, v, UseMode::Use);
                    }
                    _ => {
                        self.visit_expression(first, v, UseMode::Use);
                        self.expect(TokenKind::Semicolon);
                        self.parse_for_condition_and_update(v);
                    }
                }
            }
        }

        self.expect(TokenKind::RightParen);
        self.parse_and_visit_statement(v);
        v.visit_exit_scope();
    }

    fn parse_for_condition_and_update(&mut self, v: &mut dyn ParseVisitor) {
        if self.lexer.peek().kind != TokenKind::Semicolon {
            let test = self.parse_expression(v);
            self.visit_expression(test, v, UseMode::Use);
        }
        self.expect(TokenKind::Semicolon);
        if !matches!(
            self.lexer.peek().kind,
            TokenKind::RightParen | TokenKind::Eof
        ) {
            let update = self.parse_expression(v);
            self.visit_expression(update, v, UseMode::Use);
        }
    }

    fn parse_switch_statement(&mut self, v: &mut dyn ParseVisitor) {
        self.lexer.skip();
        self.expect(TokenKind::LeftParen);
        let discriminant = self.parse_expression(v);
        self.visit_expression(discriminant, v, UseMode::Use);
        self.expect(TokenKind::RightParen);
        if self.lexer.peek().kind != TokenKind::LeftBrace {
            self.reporter
                .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
            return;
        }
        let lbrace = self.lexer.peek().clone();
        self.lexer.skip();
        v.visit_enter_scope(ScopeFlavor::Block);
        loop {
            match self.lexer.peek().kind {
                TokenKind::RightBrace => {
                    self.lexer.skip();
                    break;
                }
                TokenKind::Eof => {
                    self.reporter
                        .report(DiagKind::UnexpectedToken, lbrace.span());
                    break;
                }
                TokenKind::Case => {
                    self.lexer.skip();
                    let test = self.parse_expression(v);
                    self.visit_expression(test, v, UseMode::Use);
                    self.expect(TokenKind::Colon);
                }
                TokenKind::Default => {
                    self.lexer.skip();
                    self.expect(TokenKind::Colon);
                }
                _ => self.parse_and_visit_statement(v),
            }
        }
        v.visit_exit_scope();
    }

    fn parse_try_statement(&mut self, v: &mut dyn ParseVisitor) {
        self.lexer.skip();
        if self.lexer.peek().kind == TokenKind::LeftBrace {
            self.parse_block(v);
        } else {
            self.reporter
                .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
        }
        if self.lexer.peek().kind == TokenKind::Catch {
            self.lexer.skip();
            v.visit_enter_scope(ScopeFlavor::Catch);
            if self.lexer.peek().kind == TokenKind::LeftParen {
                let lparen = self.lexer.peek().clone();
                self.lexer.skip();
                let pattern = self.parse_expr(v, prec::SPREAD);
                self.declare_pattern(pattern, v, VarKind::Catch);
                if self.lexer.peek().kind == TokenKind::RightParen {
                    self.lexer.skip();
                } else {
                    self.reporter
                        .report(DiagKind::UnmatchedParenthesis, lparen.span());
                }
            }
            if self.lexer.peek().kind == TokenKind::LeftBrace {
                self.parse_block(v);
            } else {
                self.reporter
                    .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
            }
            v.visit_exit_scope();
        }
        if self.lexer.peek().kind == TokenKind::Finally {
            self.lexer.skip();
            if self.lexer.peek().kind == TokenKind::LeftBrace {
                self.parse_block(v);
            } else {
                self.reporter
                    .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
            }
        }
    }

    fn parse_throw_statement(&mut self, v: &mut dyn ParseVisitor) {
        let throw_span = self.lexer.peek().span();
        self.lexer.skip();
        let peek = self.lexer.peek();
        if matches!(
            peek.kind,
            TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof
        ) || peek.has_leading_newline
        {
            self.reporter
                .report(DiagKind::MissingOperandForOperator, throw_span);
        } else {
            let argument = self.parse_expression(v);
            self.visit_expression(argument, v, UseMode::Use);
        }
        self.parse_semicolon_or_asi();
    }

    fn parse_return_statement(&mut self, v: &mut dyn ParseVisitor) {
        let return_span = self.lexer.peek().span();
        self.lexer.skip();
        if !self.flags.contains(ParserFlags::IN_FUNCTION) {
            self.reporter
                .report(DiagKind::UnexpectedToken, return_span);
        }
        let peek = self.lexer.peek();
        if !(matches!(
            peek.kind,
            TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof
        ) || peek.has_leading_newline)
        {
            let argument = self.parse_expression(v);
            self.visit_expression(argument, v, UseMode::Use);
        }
        self.parse_semicolon_or_asi();
    }

    fn parse_with_statement(&mut self, v: &mut dyn ParseVisitor) {
        let with_span = self.lexer.peek().span();
        self.lexer.skip();
        self.reporter.report(DiagKind::WithStatement, with_span);
        self.expect(TokenKind::LeftParen);
        let object = self.parse_expression(v);
        self.visit_expression(object, v, UseMode::Use);
        self.expect(TokenKind::RightParen);
        self.parse_and_visit_statement(v);
    }

    // ── Modules ─────────────────────────────────────────────────────────────

    fn parse_import_statement(&mut self, v: &mut dyn ParseVisitor) {
        let import_tok = self.lexer.peek().clone();
        self.lexer.skip();
        match self.lexer.peek().kind {
            // `import(…)` / `import.meta` are expressions.
            TokenKind::LeftParen | TokenKind::Dot => {
                self.lexer.push_back(import_tok);
                self.parse_expression_statement(v);
            }
            // `import 'module';` — side effect only.
            TokenKind::String => {
                self.lexer.skip();
                self.parse_semicolon_or_asi();
            }
            _ => {
                if self.lexer.peek().kind.is_identifier_like() {
                    // Default binding.
                    let name_tok = self.lexer.peek().clone();
                    self.lexer.skip();
                    let name = self.identifier_from(&name_tok);
                    v.visit_variable_declaration(name.name, name.span, VarKind::Import);
                    if self.lexer.peek().kind == TokenKind::Comma {
                        self.lexer.skip();
                        self.parse_import_clause_tail(v);
                    }
                } else {
                    self.parse_import_clause_tail(v);
                }
                self.expect(TokenKind::From);
                self.expect(TokenKind::String);
                self.parse_semicolon_or_asi();
            }
        }
    }

    /// Parse `* as ns` or `{ a, b as c }` of an import declaration.
    fn parse_import_clause_tail(&mut self, v: &mut dyn ParseVisitor) {
        match self.lexer.peek().kind {
            TokenKind::Star => {
                self.lexer.skip();
                self.expect(TokenKind::As);
                if self.lexer.peek().kind.is_identifier_like() {
                    let name_tok = self.lexer.peek().clone();
                    self.lexer.skip();
                    let name = self.identifier_from(&name_tok);
                    v.visit_variable_declaration(name.name, name.span, VarKind::Import);
                } else {
                    self.reporter
                        .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
                }
            }
            TokenKind::LeftBrace => {
                self.lexer.skip();
                loop {
                    match self.lexer.peek().kind {
                        TokenKind::RightBrace => {
                            self.lexer.skip();
                            break;
                        }
                        TokenKind::Eof => {
                            self.reporter
                                .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
                            break;
                        }
                        _ => {}
                    }
                    let imported = self.lexer.peek().clone();
                    if imported.kind.is_property_name() || imported.kind == TokenKind::String {
                        self.lexer.skip();
                        if self.lexer.peek().kind == TokenKind::As {
                            self.lexer.skip();
                            if self.lexer.peek().kind.is_identifier_like() {
                                let local_tok = self.lexer.peek().clone();
                                self.lexer.skip();
                                let local = self.identifier_from(&local_tok);
                                v.visit_variable_declaration(
                                    local.name,
                                    local.span,
                                    VarKind::Import,
                                );
                            } else {
                                self.reporter.report(
                                    DiagKind::UnexpectedToken,
                                    self.lexer.peek().span(),
                                );
                            }
                        } else if imported.kind.is_identifier_like() {
                            let name = self.identifier_from(&imported);
                            v.visit_variable_declaration(name.name, name.span, VarKind::Import);
                        } else {
                            // A keyword import must be renamed with `as`.
                            self.reporter
                                .report(DiagKind::UnexpectedToken, imported.span());
                        }
                    } else {
                        self.reporter
                            .report(DiagKind::UnexpectedToken, imported.span());
                        self.lexer.skip();
                    }
                    match self.lexer.peek().kind {
                        TokenKind::Comma => self.lexer.skip(),
                        TokenKind::RightBrace => {
                            self.lexer.skip();
                            break;
                        }
                        _ => {
                            self.reporter
                                .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
                            break;
                        }
                    }
                }
            }
            _ => {
                self.reporter
                    .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
            }
        }
    }

    fn parse_export_statement(&mut self, v: &mut dyn ParseVisitor) {
        self.lexer.skip();
        match self.lexer.peek().kind {
            TokenKind::Default => {
                self.lexer.skip();
                let value = self.parse_expression(v);
                self.visit_expression(value, v, UseMode::Use);
                self.parse_semicolon_or_asi();
            }
            TokenKind::Var
            | TokenKind::Let
            | TokenKind::Const
            | TokenKind::Function
            | TokenKind::Class
            | TokenKind::Async => {
                self.parse_and_visit_statement(v);
            }
            TokenKind::Star => {
                self.lexer.skip();
                if self.lexer.peek().kind == TokenKind::As {
                    self.lexer.skip();
                    if self.lexer.peek().kind.is_identifier_like() {
                        self.lexer.skip();
                    } else {
                        self.reporter
                            .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
                    }
                }
                self.expect(TokenKind::From);
                self.expect(TokenKind::String);
                self.parse_semicolon_or_asi();
            }
            TokenKind::LeftBrace => {
                self.lexer.skip();
                let mut exported: Vec<(String, crate::locator::Span)> = Vec::new();
                loop {
                    match self.lexer.peek().kind {
                        TokenKind::RightBrace => {
                            self.lexer.skip();
                            break;
                        }
                        TokenKind::Eof => {
                            self.reporter
                                .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
                            break;
                        }
                        _ => {}
                    }
                    let tok = self.lexer.peek().clone();
                    if tok.kind.is_property_name() {
                        self.lexer.skip();
                        if self.lexer.peek().kind == TokenKind::As {
                            self.lexer.skip();
                            if self.lexer.peek().kind.is_property_name()
                                || self.lexer.peek().kind == TokenKind::String
                            {
                                self.lexer.skip();
                            } else {
                                self.reporter.report(
                                    DiagKind::UnexpectedToken,
                                    self.lexer.peek().span(),
                                );
                            }
                        }
                        if tok.kind.is_identifier_like() {
                            let name = self.identifier_from(&tok);
                            exported.push((name.name.to_string(), tok.span()));
                        }
                    } else {
                        self.reporter.report(DiagKind::UnexpectedToken, tok.span());
                        self.lexer.skip();
                    }
                    match self.lexer.peek().kind {
                        TokenKind::Comma => self.lexer.skip(),
                        TokenKind::RightBrace => {
                            self.lexer.skip();
                            break;
                        }
                        _ => {
                            self.reporter
                                .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
                            break;
                        }
                    }
                }
                if self.lexer.peek().kind == TokenKind::From {
                    // Re-export: the names are not local uses.
                    self.lexer.skip();
                    self.expect(TokenKind::String);
                } else {
                    for (name, span) in exported {
                        v.visit_variable_use(&name, span);
                    }
                }
                self.parse_semicolon_or_asi();
            }
            _ => {
                self.reporter
                    .report(DiagKind::UnexpectedToken, self.lexer.peek().span());
            }
        }
    }

    // ── Pattern declaration and the expression walk ─────────────────────────

    /// Declare every binding in a pattern-shaped expression: identifiers,
    /// defaults (`= init` visits its initializer as uses), rest elements,
    /// array and object destructuring.
    pub(crate) fn declare_pattern(
        &mut self,
        expr: &Expr<'_>,
        v: &mut dyn ParseVisitor,
        kind: VarKind,
    ) {
        match expr {
            Expr::Variable { name } => {
                v.visit_variable_declaration(name.name, name.span, kind);
            }
            Expr::Assignment { left, right } => {
                self.declare_pattern(left, v, kind);
                self.visit_expression(right, v, UseMode::Use);
            }
            Expr::Spread { child, .. } => self.declare_pattern(child, v, kind),
            Expr::Array { children, .. } => {
                for child in *children {
                    self.declare_pattern(child, v, kind);
                }
            }
            Expr::Object { entries, .. } => {
                for entry in *entries {
                    if let Some(property) = entry.property {
                        // Computed keys are uses; plain literal keys are not.
                        self.visit_expression(property, v, UseMode::Use);
                    }
                    self.declare_pattern(entry.value, v, kind);
                }
            }
            _ => {}
        }
    }

    /// Walk an expression tree, emitting variable use/assignment events.
    ///
    /// Function expressions, class expressions, and statement-bodied arrows
    /// were already visited during parsing; expression-bodied arrows are
    /// scoped here because their parameters and body live in the tree.
    pub(crate) fn visit_expression(
        &mut self,
        expr: &Expr<'_>,
        v: &mut dyn ParseVisitor,
        mode: UseMode,
    ) {
        match expr {
            Expr::Variable { name } => match mode {
                UseMode::Use => v.visit_variable_use(name.name, name.span),
                UseMode::AssignTarget => v.visit_variable_assignment(name.name, name.span),
            },
            Expr::Invalid { .. }
            | Expr::Literal { .. }
            | Expr::Super { .. }
            | Expr::Import { .. }
            | Expr::Function { .. }
            | Expr::NamedFunction { .. }
            | Expr::Class { .. }
            | Expr::ArrowFunctionWithStatements { .. } => {}
            Expr::Unary { child, .. } | Expr::Await { child, .. } => {
                self.visit_expression(child, v, UseMode::Use);
            }
            Expr::RwUnaryPrefix { child, .. } | Expr::RwUnarySuffix { child, .. } => {
                self.visit_expression(child, v, UseMode::AssignTarget);
            }
            Expr::Binary { children } => {
                for child in *children {
                    self.visit_expression(child, v, UseMode::Use);
                }
            }
            Expr::Assignment { left, right } | Expr::UpdatingAssignment { left, right } => {
                self.visit_expression(left, v, UseMode::AssignTarget);
                self.visit_expression(right, v, UseMode::Use);
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                self.visit_expression(test, v, UseMode::Use);
                self.visit_expression(consequent, v, UseMode::Use);
                self.visit_expression(alternate, v, UseMode::Use);
            }
            Expr::Dot { object, .. } => self.visit_expression(object, v, UseMode::Use),
            Expr::Index {
                object, subscript, ..
            } => {
                self.visit_expression(object, v, UseMode::Use);
                self.visit_expression(subscript, v, UseMode::Use);
            }
            Expr::Call { children, .. }
            | Expr::New { children, .. }
            | Expr::Template { children, .. } => {
                for child in *children {
                    self.visit_expression(child, v, UseMode::Use);
                }
            }
            // Array literals and spreads propagate the mode: they double as
            // destructuring assignment targets.
            Expr::Array { children, .. } => {
                for child in *children {
                    self.visit_expression(child, v, mode);
                }
            }
            Expr::Spread { child, .. } => self.visit_expression(child, v, mode),
            Expr::Object { entries, .. } => {
                for entry in *entries {
                    if let Some(property) = entry.property {
                        self.visit_expression(property, v, UseMode::Use);
                    }
                    self.visit_expression(entry.value, v, mode);
                }
            }
            Expr::ArrowFunctionWithExpression { children, .. } => {
                v.visit_enter_scope(ScopeFlavor::Function);
                let (params, body) = children.split_at(children.len() - 1);
                for param in params {
                    self.declare_pattern(param, v, VarKind::Parameter);
                }
                self.visit_expression(body[0], v, UseMode::Use);
                v.visit_exit_scope();
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::diag::DiagReporter;
    use crate::locator::Span;
    use crate::parser::visit::{ParseVisitor, ScopeFlavor, VarKind};
    use crate::parser::Parser;
    use crate::zone::Zone;

    /// Records every visitor event as a readable string.
    #[derive(Default)]
    struct EventLog {
        events: Vec<String>,
    }

    impl ParseVisitor for EventLog {
        fn visit_variable_declaration(&mut self, name: &str, _span: Span, kind: VarKind) {
            self.events.push(format!("decl {kind:?} {name}"));
        }
        fn visit_variable_use(&mut self, name: &str, _span: Span) {
            self.events.push(format!("use {name}"));
        }
        fn visit_variable_assignment(&mut self, name: &str, _span: Span) {
            self.events.push(format!("assign {name}"));
        }
        fn visit_enter_scope(&mut self, flavor: ScopeFlavor) {
            self.events.push(format!("enter {flavor:?}"));
        }
        fn visit_exit_scope(&mut self) {
            self.events.push("exit".to_string());
        }
        fn visit_end_of_module(&mut self) {
            self.events.push("end".to_string());
        }
    }

    fn events(src: &str) -> (Vec<String>, Vec<&'static str>) {
        let zone = Zone::new();
        let reporter = DiagReporter::new();
        let mut log = EventLog::default();
        {
            let mut parser = Parser::new(src, &zone, &reporter);
            parser.parse_and_visit_module(&mut log);
        }
        let codes = reporter.finish().iter().map(|d| d.code()).collect();
        (log.events, codes)
    }

    // ── Declarations ─────────────────────────────────────────────────────────

    #[test]
    fn test_var_declarations() {
        let (events, codes) = events("var x; let y = z; const w = 1;");
        assert_eq!(
            events,
            vec![
                "decl Var x",
                "decl Let y",
                "use z",
                "decl Const w",
                "end"
            ]
        );
        assert!(codes.is_empty());
    }

    #[test]
    fn test_destructuring_declaration() {
        let (events, codes) = events("let {a, b: c, d = e} = f;");
        assert_eq!(
            events,
            vec![
                "decl Let a",
                "decl Let c",
                "decl Let d",
                "use e",
                "use f",
                "end"
            ]
        );
        assert!(codes.is_empty());
    }

    #[test]
    fn test_array_destructuring_declaration() {
        let (events, _) = events("let [a, , ...rest] = xs;");
        assert_eq!(
            events,
            vec!["decl Let a", "decl Let rest", "use xs", "end"]
        );
    }

    #[test]
    fn test_function_declaration_scopes() {
        let (events, codes) = events("function add(a, b) { return a + b; }");
        assert_eq!(
            events,
            vec![
                "decl Function add",
                "enter Function",
                "decl Parameter a",
                "decl Parameter b",
                "use a",
                "use b",
                "exit",
                "end"
            ]
        );
        assert!(codes.is_empty());
    }

    #[test]
    fn test_class_declaration() {
        let (events, codes) = events("class Foo extends Bar { m(x) { return x; } }");
        assert_eq!(
            events,
            vec![
                "decl Class Foo",
                "use Bar",
                "enter Function",
                "decl Parameter x",
                "use x",
                "exit",
                "end"
            ]
        );
        assert!(codes.is_empty());
    }

    #[test]
    fn test_import_declarations() {
        let (events, codes) = events("import d, {a, b as c} from 'mod';");
        assert_eq!(
            events,
            vec![
                "decl Import d",
                "decl Import a",
                "decl Import c",
                "end"
            ]
        );
        assert!(codes.is_empty());
    }

    #[test]
    fn test_export_names_are_uses() {
        let (events, codes) = events("let a; export {a};");
        assert_eq!(events, vec!["decl Let a", "use a", "end"]);
        assert!(codes.is_empty());
    }

    #[test]
    fn test_reexport_names_are_not_uses() {
        let (events, codes) = events("export {a} from 'mod';");
        assert_eq!(events, vec!["end"]);
        assert!(codes.is_empty());
    }

    // ── Control flow ─────────────────────────────────────────────────────────

    #[test]
    fn test_block_scope_events() {
        let (events, _) = events("{ let x; }");
        assert_eq!(
            events,
            vec!["enter Block", "decl Let x", "exit", "end"]
        );
    }

    #[test]
    fn test_for_of_declares_in_for_scope() {
        let (events, codes) = events("for (const x of xs) { x; }");
        assert_eq!(
            events,
            vec![
                "enter For",
                "decl Const x",
                "use xs",
                "enter Block",
                "use x",
                "exit",
                "exit",
                "end"
            ]
        );
        assert!(codes.is_empty());
    }

    #[test]
    fn test_for_in_assigns_existing_variable() {
        let (events, _) = events("for (k in obj) ;");
        assert_eq!(
            events,
            vec!["enter For", "assign k", "use obj", "exit", "end"]
        );
    }

    #[test]
    fn test_c_style_for() {
        let (events, codes) = events("for (let i = 0; i < n; i++) ;");
        assert_eq!(
            events,
            vec![
                "enter For",
                "decl Let i",
                "use i",
                "use n",
                "assign i",
                "exit",
                "end"
            ]
        );
        assert!(codes.is_empty());
    }

    #[test]
    fn test_catch_parameter() {
        let (events, codes) = events("try { f(); } catch (e) { g(e); }");
        assert_eq!(
            events,
            vec![
                "enter Block",
                "use f",
                "exit",
                "enter Catch",
                "decl Catch e",
                "enter Block",
                "use g",
                "use e",
                "exit",
                "exit",
                "end"
            ]
        );
        assert!(codes.is_empty());
    }

    #[test]
    fn test_switch_gets_one_block_scope() {
        let (events, _) = events("switch (x) { case 1: let y; break; default: y; }");
        assert_eq!(
            events,
            vec![
                "use x",
                "enter Block",
                "decl Let y",
                "use y",
                "exit",
                "end"
            ]
        );
    }

    #[test]
    fn test_with_statement_is_flagged() {
        let (_, codes) = events("with (o) { x; }");
        assert_eq!(codes, vec!["E012"]);
    }

    // ── Expressions inside statements ────────────────────────────────────────

    #[test]
    fn test_assignment_events() {
        let (events, _) = events("x = y;");
        assert_eq!(events, vec!["assign x", "use y", "end"]);
    }

    #[test]
    fn test_increment_is_an_assignment() {
        let (events, _) = events("x++;");
        assert_eq!(events, vec!["assign x", "end"]);
    }

    #[test]
    fn test_arrow_with_expression_scopes_in_walk() {
        let (events, codes) = events("f(x => x + y);");
        assert_eq!(
            events,
            vec![
                "use f",
                "enter Function",
                "decl Parameter x",
                "use x",
                "use y",
                "exit",
                "end"
            ]
        );
        assert!(codes.is_empty());
    }

    #[test]
    fn test_arrow_with_statements_scopes_during_parse() {
        let (events, codes) = events("let g = (a) => { a; b; };");
        assert_eq!(
            events,
            vec![
                "enter Function",
                "decl Parameter a",
                "use a",
                "use b",
                "exit",
                "decl Let g",
                "end"
            ]
        );
        assert!(codes.is_empty());
    }

    // ── ASI ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_asi_accepts_newline() {
        let (_, codes) = events("x\ny");
        assert!(codes.is_empty());
    }

    #[test]
    fn test_asi_accepts_eof_and_brace() {
        let (_, codes) = events("{ x }");
        assert!(codes.is_empty());
    }

    #[test]
    fn test_missing_semicolon_reported() {
        let (_, codes) = events("x y");
        assert_eq!(codes, vec!["E010"]);
    }

    #[test]
    fn test_newline_before_increment_splits_statements() {
        let (events, codes) = events("x\n++\ny");
        assert_eq!(events, vec!["use x", "assign y", "end"]);
        assert!(codes.is_empty());
    }

    // ── await / async context ────────────────────────────────────────────────

    #[test]
    fn test_await_inside_async_function_is_fine() {
        let (_, codes) = events("async function f() { await p; }");
        assert!(codes.is_empty());
    }

    #[test]
    fn test_await_outside_async_function() {
        let (_, codes) = events("function f() { await p; }");
        assert_eq!(codes, vec!["E038"]);
    }

    #[test]
    fn test_await_in_async_arrow_body() {
        let (_, codes) = events("let f = async () => await p;");
        assert!(codes.is_empty());
    }

    #[test]
    fn test_await_in_plain_arrow_inside_async_function() {
        let (_, codes) = events("async function f() { g(() => await p); }");
        assert_eq!(codes, vec!["E038"]);
    }

    // ── return placement ─────────────────────────────────────────────────────

    #[test]
    fn test_top_level_return_is_flagged() {
        let (_, codes) = events("return 1;");
        assert_eq!(codes, vec!["E014"]);
    }

    // ── Recovery ─────────────────────────────────────────────────────────────

    #[test]
    fn test_stray_token_makes_progress() {
        let (events, codes) = events(") x;");
        assert_eq!(events, vec!["use x", "end"]);
        assert!(codes.contains(&"E014"));
    }

    #[test]
    fn test_unclosed_function_body_reports() {
        let (_, codes) = events("function f() { x;");
        assert!(codes.contains(&"E014"));
    }
}
