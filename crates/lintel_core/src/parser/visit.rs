//! The parse-event visitor interface.
//!
//! The statement parser does not build statement nodes; it narrates the
//! program to a [`ParseVisitor`]: variable declarations, uses, assignments,
//! and scope boundaries.  The lint pass
//! ([`LintVisitor`][crate::lint::LintVisitor]) is the production consumer;
//! tests use [`NullVisitor`].

use crate::locator::Span;

// ─────────────────────────────────────────────────────────────────────────────
// Event payloads
// ─────────────────────────────────────────────────────────────────────────────

/// The syntactic origin of a variable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    /// `var` — function-scoped, hoisted.
    Var,
    /// `let` — block-scoped.
    Let,
    /// `const` — block-scoped, non-reassignable.
    Const,
    /// A `function` declaration — hoisted to the enclosing function scope.
    Function,
    /// A `class` declaration — block-scoped.
    Class,
    /// A formal parameter.
    Parameter,
    /// A binding introduced by an `import` declaration.
    Import,
    /// A `catch (param)` binding.
    Catch,
}

impl VarKind {
    /// Returns `true` for bindings hoisted to the enclosing *function* scope.
    pub fn is_function_scoped(self) -> bool {
        matches!(self, VarKind::Var | VarKind::Function)
    }

    /// Returns `true` for bindings that forbid redeclaration in their scope.
    pub fn is_lexical(self) -> bool {
        matches!(
            self,
            VarKind::Let | VarKind::Const | VarKind::Class | VarKind::Import
        )
    }
}

/// What introduced a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeFlavor {
    /// A `{ … }` block (also `switch` bodies and `with` bodies).
    Block,
    /// A function, method, or arrow body (a `var` hoisting boundary).
    Function,
    /// The head-plus-body of a `for` statement.
    For,
    /// A `catch` clause.
    Catch,
}

impl ScopeFlavor {
    /// Returns `true` if this scope is a `var` hoisting boundary.
    pub fn is_function_boundary(self) -> bool {
        matches!(self, ScopeFlavor::Function)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ParseVisitor
// ─────────────────────────────────────────────────────────────────────────────

/// Consumer of the statement parser's structural events.
///
/// All methods default to no-ops so consumers implement only what they need.
pub trait ParseVisitor {
    /// A variable was declared: `name` at `span` with the given kind.
    fn visit_variable_declaration(&mut self, name: &str, span: Span, kind: VarKind) {
        let _ = (name, span, kind);
    }

    /// A variable was read.
    fn visit_variable_use(&mut self, name: &str, span: Span) {
        let _ = (name, span);
    }

    /// A variable was written (assignment, `++`, `--`, destructuring target).
    fn visit_variable_assignment(&mut self, name: &str, span: Span) {
        let _ = (name, span);
    }

    /// A new scope was entered.
    fn visit_enter_scope(&mut self, flavor: ScopeFlavor) {
        let _ = flavor;
    }

    /// The innermost scope was exited.
    fn visit_exit_scope(&mut self) {}

    /// The whole module has been parsed.
    fn visit_end_of_module(&mut self) {}
}

/// A visitor that ignores every event.
pub struct NullVisitor;

impl ParseVisitor for NullVisitor {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_kind_predicates() {
        assert!(VarKind::Var.is_function_scoped());
        assert!(VarKind::Function.is_function_scoped());
        assert!(!VarKind::Let.is_function_scoped());
        assert!(VarKind::Let.is_lexical());
        assert!(VarKind::Const.is_lexical());
        assert!(VarKind::Class.is_lexical());
        assert!(!VarKind::Var.is_lexical());
        assert!(!VarKind::Parameter.is_lexical());
    }

    #[test]
    fn test_scope_flavor_boundaries() {
        assert!(ScopeFlavor::Function.is_function_boundary());
        assert!(!ScopeFlavor::Block.is_function_boundary());
        assert!(!ScopeFlavor::For.is_function_boundary());
        assert!(!ScopeFlavor::Catch.is_function_boundary());
    }
}
