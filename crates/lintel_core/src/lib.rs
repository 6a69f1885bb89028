//! `lintel_core` — the core of the lintel JavaScript linter.
//!
//! A fast, opinion-free lint pipeline built for editor latency: a document
//! accepts text splices and re-runs lexing, parsing, and variable resolution
//! from scratch, producing a stable vector of structured diagnostics.
//!
//! # Crate layout
//!
//! - [`error`] — Crate error types and the `LintelResult` alias.
//! - [`zone`] — Bump-pointer arena owning one parse's AST.
//! - [`locator`] — Byte offset ↔ `(line, UTF-16 character)` conversion.
//! - [`diag`] — Diagnostic kinds, stable codes, and the shared reporter.
//! - [`parser`] — Lexer, expression AST, expression and statement parsers,
//!   and the visitor interface.
//! - [`lint`] — The variable-resolution visitor (undeclared uses,
//!   redeclarations, `const` assignment).
//! - [`document`] — The incremental front end (`replace_text` + `lint`).

/// Diagnostic kinds, codes, severities, and the shared reporter.
pub mod diag;
/// The incremental document front end.
pub mod document;
/// Crate error types and [`error::LintelResult`] alias.
pub mod error;
/// Variable resolution and semantic lint rules.
pub mod lint;
/// Source positions and the offset ↔ position locator.
pub mod locator;
/// Lexing and parsing.
pub mod parser;
/// Bump-pointer arena for AST nodes.
pub mod zone;

pub use document::Document;
