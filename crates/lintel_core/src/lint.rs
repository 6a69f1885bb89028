//! Variable resolution and the semantic lint rules.
//!
//! [`LintVisitor`] consumes the parser's events (see
//! [`crate::parser::visit`]) and reports:
//!
//! - **E034** — redeclaration of a variable (two lexical declarations of one
//!   name in a scope, or a lexical/`var` clash).
//! - **E030** — use of a variable that is declared nowhere in scope and is
//!   not a known global (warning).
//! - **E033** — assignment to a `const` binding.
//!
//! Resolution is lazy: uses collect per scope and resolve when the scope
//! exits, so `var`/`function` hoisting works without a second pass over the
//! source.

use std::collections::HashMap;

use crate::diag::{DiagKind, DiagReporter};
use crate::locator::Span;
use crate::parser::visit::{ParseVisitor, ScopeFlavor, VarKind};

/// Names that resolve without a declaration: ECMAScript built-ins plus the
/// common host globals.  Referencing anything else undeclared is E030.
const GLOBALS: &[&str] = &[
    "globalThis",
    "undefined",
    "NaN",
    "Infinity",
    "Object",
    "Function",
    "Boolean",
    "Symbol",
    "Error",
    "AggregateError",
    "EvalError",
    "RangeError",
    "ReferenceError",
    "SyntaxError",
    "TypeError",
    "URIError",
    "Number",
    "BigInt",
    "Math",
    "Date",
    "String",
    "RegExp",
    "Array",
    "Int8Array",
    "Uint8Array",
    "Uint8ClampedArray",
    "Int16Array",
    "Uint16Array",
    "Int32Array",
    "Uint32Array",
    "Float32Array",
    "Float64Array",
    "BigInt64Array",
    "BigUint64Array",
    "Map",
    "Set",
    "WeakMap",
    "WeakSet",
    "ArrayBuffer",
    "SharedArrayBuffer",
    "DataView",
    "JSON",
    "Promise",
    "Reflect",
    "Proxy",
    "Atomics",
    "eval",
    "isFinite",
    "isNaN",
    "parseFloat",
    "parseInt",
    "decodeURI",
    "decodeURIComponent",
    "encodeURI",
    "encodeURIComponent",
    "arguments",
    "console",
    "window",
    "document",
    "navigator",
    "location",
    "performance",
    "fetch",
    "setTimeout",
    "clearTimeout",
    "setInterval",
    "clearInterval",
    "queueMicrotask",
    "structuredClone",
    "alert",
    "atob",
    "btoa",
    "require",
    "module",
    "exports",
    "process",
    "Buffer",
];

/// A variable reference waiting for its declaration.
#[derive(Debug)]
struct PendingRef {
    name: String,
    span: Span,
    is_assignment: bool,
}

/// One scope's declarations and unresolved references.
#[derive(Debug)]
struct LintScope {
    /// `true` when `var`/`function` declarations hoist to this scope.
    is_function_boundary: bool,
    /// Names declared directly in this scope, with their first kind.
    declared: HashMap<String, VarKind>,
    /// References seen in (or escalated into) this scope, not yet resolved.
    pending: Vec<PendingRef>,
}

impl LintScope {
    fn new(is_function_boundary: bool) -> Self {
        Self {
            is_function_boundary,
            declared: HashMap::new(),
            pending: Vec::new(),
        }
    }
}

/// The variable-resolution lint pass.
pub struct LintVisitor<'r> {
    reporter: &'r DiagReporter,
    scopes: Vec<LintScope>,
}

impl<'r> LintVisitor<'r> {
    /// Create a visitor reporting into `reporter`, with the module's root
    /// scope already open.
    pub fn new(reporter: &'r DiagReporter) -> Self {
        Self {
            reporter,
            scopes: vec![LintScope::new(true)],
        }
    }

    /// Index of the scope a declaration of `kind` lands in.
    fn declaration_scope(&self, kind: VarKind) -> usize {
        if kind.is_function_scoped() {
            self.scopes
                .iter()
                .rposition(|s| s.is_function_boundary)
                .unwrap_or(0)
        } else {
            self.scopes.len() - 1
        }
    }

}

impl ParseVisitor for LintVisitor<'_> {
    fn visit_variable_declaration(&mut self, name: &str, span: Span, kind: VarKind) {
        let target = self.declaration_scope(kind);
        let scope = &mut self.scopes[target];
        match scope.declared.get(name) {
            Some(existing) => {
                // `var`+`var`, `function`+`function`, and parameter/`var`
                // mixes are legal; anything touching a lexical binding is
                // not.
                if existing.is_lexical() || kind.is_lexical() {
                    self.reporter
                        .report(DiagKind::RedeclarationOfVariable(name.to_string()), span);
                }
            }
            None => {
                scope.declared.insert(name.to_string(), kind);
            }
        }
    }

    fn visit_variable_use(&mut self, name: &str, span: Span) {
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .pending
            .push(PendingRef {
                name: name.to_string(),
                span,
                is_assignment: false,
            });
    }

    fn visit_variable_assignment(&mut self, name: &str, span: Span) {
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .pending
            .push(PendingRef {
                name: name.to_string(),
                span,
                is_assignment: true,
            });
    }

    fn visit_enter_scope(&mut self, flavor: ScopeFlavor) {
        self.scopes
            .push(LintScope::new(flavor.is_function_boundary()));
    }

    fn visit_exit_scope(&mut self) {
        let LintScope {
            declared, pending, ..
        } = self.scopes.pop().expect("exit without matching enter");
        let reporter = self.reporter;
        let parent = self
            .scopes
            .last_mut()
            .expect("root scope is never popped");
        for reference in pending {
            match declared.get(&reference.name) {
                Some(kind) => {
                    if reference.is_assignment && *kind == VarKind::Const {
                        reporter.report(DiagKind::AssignmentToConstVariable, reference.span);
                    }
                }
                // Not declared here: the parent scope decides.
                None => parent.pending.push(reference),
            }
        }
    }

    fn visit_end_of_module(&mut self) {
        let root = self.scopes.last_mut().expect("root scope is present");
        let pending = std::mem::take(&mut root.pending);
        for reference in pending {
            match root.declared.get(&reference.name) {
                Some(kind) => {
                    if reference.is_assignment && *kind == VarKind::Const {
                        self.reporter
                            .report(DiagKind::AssignmentToConstVariable, reference.span);
                    }
                }
                None => {
                    if !GLOBALS.contains(&reference.name.as_str()) {
                        self.reporter.report(
                            DiagKind::UseOfUndeclaredVariable(reference.name),
                            reference.span,
                        );
                    }
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::{Diagnostic, Severity};
    use crate::parser::Parser;
    use crate::zone::Zone;

    fn lint(src: &str) -> Vec<Diagnostic> {
        let zone = Zone::new();
        let reporter = DiagReporter::new();
        {
            let mut parser = Parser::new(src, &zone, &reporter);
            let mut visitor = LintVisitor::new(&reporter);
            parser.parse_and_visit_module(&mut visitor);
        }
        reporter.finish()
    }

    fn codes(src: &str) -> Vec<&'static str> {
        lint(src).iter().map(|d| d.code()).collect()
    }

    // ── Redeclaration (E034) ─────────────────────────────────────────────────

    #[test]
    fn test_let_redeclaration() {
        let diags = lint("let x;let x;");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code(), "E034");
        assert_eq!(diags[0].severity(), Severity::Error);
        assert_eq!(diags[0].message(), "redeclaration of variable: x");
        // The error points at the second `x`.
        assert_eq!((diags[0].span.begin, diags[0].span.end), (10, 11));
    }

    #[test]
    fn test_var_var_is_legal() {
        assert!(codes("var x; var x;").is_empty());
    }

    #[test]
    fn test_function_function_is_legal() {
        assert!(codes("function f() {} function f() {}").is_empty());
    }

    #[test]
    fn test_let_then_var_clash() {
        assert_eq!(codes("let x; var x;"), vec!["E034"]);
    }

    #[test]
    fn test_const_then_let_clash() {
        assert_eq!(codes("const x = 1; let x;"), vec!["E034"]);
    }

    #[test]
    fn test_shadowing_in_inner_block_is_legal() {
        assert!(codes("let x; { let x; }").is_empty());
    }

    #[test]
    fn test_parameter_var_mix_is_legal() {
        assert!(codes("function f(a) { var a; }").is_empty());
    }

    #[test]
    fn test_parameter_let_clash() {
        assert_eq!(codes("function f(a) { let a; }"), vec!["E034"]);
    }

    // ── Undeclared use (E030) ────────────────────────────────────────────────

    #[test]
    fn test_undeclared_use_warns() {
        let diags = lint("undeclaredVariable;");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code(), "E030");
        assert_eq!(diags[0].severity(), Severity::Warning);
        assert_eq!(
            diags[0].message(),
            "use of undeclared variable: undeclaredVariable"
        );
    }

    #[test]
    fn test_declared_use_is_fine() {
        assert!(codes("let x; x;").is_empty());
    }

    #[test]
    fn test_use_before_var_declaration_hoists() {
        assert!(codes("x; var x;").is_empty());
    }

    #[test]
    fn test_call_before_function_declaration_hoists() {
        assert!(codes("f(); function f() {}").is_empty());
    }

    #[test]
    fn test_block_scoped_let_does_not_leak() {
        assert_eq!(codes("{ let x; } x;"), vec!["E030"]);
    }

    #[test]
    fn test_inner_scope_sees_outer_declaration() {
        assert!(codes("let x; { x; }").is_empty());
    }

    #[test]
    fn test_closure_sees_outer_declaration() {
        assert!(codes("let x; function f() { x; }").is_empty());
    }

    #[test]
    fn test_var_in_block_hoists_to_function() {
        assert!(codes("function f() { { var x; } x; }").is_empty());
    }

    #[test]
    fn test_known_globals_are_fine() {
        assert!(codes("console.log(Math.max(1, 2));").is_empty());
    }

    #[test]
    fn test_parameters_resolve() {
        assert!(codes("function f(a, b) { return a + b; }").is_empty());
    }

    #[test]
    fn test_catch_binding_resolves() {
        assert!(codes("function f() {} try { f(); } catch (e) { e; }").is_empty());
        assert_eq!(
            codes("function f() {} try { f(); } catch (e) { } e;"),
            vec!["E030"]
        );
    }

    #[test]
    fn test_import_binding_resolves() {
        assert!(codes("import {a} from 'mod'; a;").is_empty());
    }

    #[test]
    fn test_undeclared_assignment_warns() {
        assert_eq!(codes("mystery = 1;"), vec!["E030"]);
    }

    // ── const assignment (E033) ──────────────────────────────────────────────

    #[test]
    fn test_assignment_to_const() {
        let diags = lint("const x = 1; x = 2;");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code(), "E033");
        // The error points at the assigned `x`.
        assert_eq!((diags[0].span.begin, diags[0].span.end), (13, 14));
    }

    #[test]
    fn test_increment_of_const() {
        assert_eq!(codes("const x = 1; x++;"), vec!["E033"]);
    }

    #[test]
    fn test_const_read_is_fine() {
        assert!(codes("const x = 1; x;").is_empty());
    }

    #[test]
    fn test_const_assignment_in_block() {
        assert_eq!(codes("const x = 1; { x = 2; }"), vec!["E033"]);
    }

    #[test]
    fn test_reassigning_shadow_of_const_is_fine() {
        assert!(codes("const x = 1; { let x; x = 2; }").is_empty());
    }

    // ── Ordering and determinism ─────────────────────────────────────────────

    #[test]
    fn test_parse_errors_precede_end_of_module_warnings() {
        let diags = lint("let x;let x;\nundeclaredVariable;");
        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].code(), "E034");
        assert_eq!(diags[0].severity(), Severity::Error);
        assert_eq!(diags[1].code(), "E030");
        assert_eq!(diags[1].severity(), Severity::Warning);
    }

    #[test]
    fn test_deterministic_order() {
        let a = lint("a; b; c;");
        let b = lint("a; b; c;");
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
    }
}
