//! Zone allocator for one parse's AST.
//!
//! A [`Zone`] is a bump-pointer region allocator backed by [`bumpalo`].
//! Every AST node, child slice, and decoded identifier produced by a parse
//! is allocated inside the zone passed to the parser; all of it is freed in
//! bulk when the [`Zone`] is dropped, which happens as soon as the
//! diagnostics have been extracted.
//!
//! # Example
//!
//! ```
//! use lintel_core::zone::Zone;
//!
//! let zone = Zone::new();
//! let name: &str = zone.alloc_str("answer");
//! assert_eq!(name, "answer");
//! ```

use bumpalo::Bump;

/// A bump-pointer region allocator for AST nodes.
///
/// All allocations made through [`Zone::alloc`], [`Zone::alloc_slice`], and
/// [`Zone::alloc_str`] are tied to the lifetime of the `Zone`.  When the
/// `Zone` is dropped, every allocation is freed at once without running
/// individual destructors (the same semantics as `bumpalo`), which is why
/// the AST stores zone-allocated `&str` names rather than `String`s.
pub struct Zone {
    bump: Bump,
}

impl Zone {
    /// Create a new, empty `Zone`.
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Allocate `value` inside the zone and return a reference to it.
    ///
    /// The returned reference is valid for the lifetime of the `Zone`.
    /// Destructors are **not** run when the zone is dropped; if `T` has a
    /// non-trivial `Drop` impl that you must not skip, do not allocate it
    /// here.
    pub fn alloc<T>(&self, value: T) -> &T {
        self.bump.alloc(value)
    }

    /// Move the elements of `values` into the zone and return them as a
    /// slice reference.
    ///
    /// Used for AST child lists: the parser accumulates children in a stack
    /// buffer and copies them into the zone once the node is complete.
    pub fn alloc_slice<T>(&self, values: impl ExactSizeIterator<Item = T>) -> &[T] {
        self.bump.alloc_slice_fill_iter(values)
    }

    /// Copy `s` into the zone and return it as a string slice.
    ///
    /// Used for decoded identifier text, whose escapes may make it differ
    /// from any slice of the source.
    pub fn alloc_str(&self, s: &str) -> &str {
        self.bump.alloc_str(s)
    }
}

impl Default for Zone {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Zone;
    use crate::locator::Span;
    use crate::parser::ast::{Expr, Identifier};

    #[test]
    fn test_alloc_ast_node() {
        let zone = Zone::new();
        let literal = zone.alloc(Expr::Literal {
            span: Span::new(0, 2),
        });
        assert_eq!(literal.span(), Span::new(0, 2));
    }

    #[test]
    fn test_alloc_str_for_decoded_identifier() {
        let zone = Zone::new();
        // `foo` decodes to `foo`; the decoded text lives in the zone.
        let name = zone.alloc_str("foo");
        let variable = zone.alloc(Expr::Variable {
            name: Identifier {
                span: Span::new(0, 8),
                name,
            },
        });
        match variable {
            Expr::Variable { name } => assert_eq!(name.name, "foo"),
            other => panic!("expected a variable, got {other:?}"),
        }
    }

    #[test]
    fn test_alloc_slice_builds_child_lists() {
        let zone = Zone::new();
        let a = zone.alloc(Expr::Literal {
            span: Span::new(0, 1),
        });
        let b = zone.alloc(Expr::Literal {
            span: Span::new(4, 5),
        });
        let children = zone.alloc_slice(vec![a, b].into_iter());
        let binary = zone.alloc(Expr::Binary { children });
        assert_eq!(children.len(), 2);
        assert_eq!(binary.span(), Span::new(0, 5));
    }

    #[test]
    fn test_alloc_slice_of_empty_list() {
        let zone = Zone::new();
        let children: &[&Expr<'_>] = zone.alloc_slice(Vec::<&Expr<'_>>::new().into_iter());
        assert!(children.is_empty());
    }

    #[test]
    fn test_tree_survives_later_allocations() {
        let zone = Zone::new();
        let child = zone.alloc(Expr::Literal {
            span: Span::new(3, 4),
        });
        let unary = zone.alloc(Expr::Unary {
            operator: Span::new(0, 1),
            child,
        });
        // Grow the zone well past its first chunk, then re-read the tree.
        for i in 0..10_000_usize {
            zone.alloc(Expr::Invalid {
                span: Span::new(i, i + 1),
            });
            zone.alloc_str("padding-string");
        }
        assert_eq!(unary.span(), Span::new(0, 4));
        assert_eq!(child.span(), Span::new(3, 4));
    }

    #[test]
    fn test_default_zone_is_usable() {
        let zone = Zone::default();
        assert_eq!(zone.alloc_str("x"), "x");
    }
}
