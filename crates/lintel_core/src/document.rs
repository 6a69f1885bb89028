//! The incremental front end: a mutable document that re-lints on demand.
//!
//! A [`Document`] owns the current source text.  Editors apply changes with
//! [`Document::replace_text`] using `(line, UTF-16 character)` coordinates;
//! [`Document::lint`] re-runs the whole pipeline — lexer, parser, variable
//! resolution — into a fresh [`Zone`] and caches the diagnostic vector.
//! The AST never outlives the lint call; diagnostics live until the next
//! splice.

use crate::diag::{DiagReporter, Diagnostic};
use crate::error::{LintelError, LintelResult};
use crate::lint::LintVisitor;
use crate::locator::{Locator, Position};
use crate::parser::Parser;
use crate::zone::Zone;

/// One lintable document.
///
/// # Example
///
/// ```
/// use lintel_core::document::Document;
///
/// let mut doc = Document::new();
/// doc.replace_text(0, 0, 1, 0, "let x;let x;").unwrap();
/// let diagnostics = doc.lint();
/// assert_eq!(diagnostics.len(), 1);
/// assert_eq!(diagnostics[0].code(), "E034");
/// ```
#[derive(Default)]
pub struct Document {
    source: String,
    diagnostics: Vec<Diagnostic>,
    dirty: bool,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            source: String::new(),
            diagnostics: Vec::new(),
            dirty: false,
        }
    }

    /// The current source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// A locator for the current source snapshot.
    ///
    /// Invalidated by the next [`Document::replace_text`]; used to convert
    /// diagnostic byte spans to editor positions.
    pub fn locator(&self) -> Locator<'_> {
        Locator::new(&self.source)
    }

    /// Splice `text` over the range `(start_line, start_character)` ..
    /// `(end_line, end_character)`, in 0-based line / UTF-16 code-unit
    /// coordinates.
    ///
    /// Out-of-range coordinates clamp to the line or document end, so
    /// `(end_line=1, end_character=0)` against an empty document replaces
    /// the whole document.  A range that ends before it starts is
    /// [`LintelError::BackwardsRange`].
    pub fn replace_text(
        &mut self,
        start_line: u32,
        start_character: u32,
        end_line: u32,
        end_character: u32,
        text: &str,
    ) -> LintelResult<()> {
        let locator = Locator::new(&self.source);
        let begin = locator.offset(Position {
            line: start_line,
            character: start_character,
        });
        let end = locator.offset(Position {
            line: end_line,
            character: end_character,
        });
        if end < begin {
            return Err(LintelError::BackwardsRange);
        }
        self.source.replace_range(begin..end, text);
        self.dirty = true;
        Ok(())
    }

    /// Lint the current source, re-running the pipeline if the text changed
    /// since the last call, and return the diagnostics in their stable
    /// order.
    pub fn lint(&mut self) -> &[Diagnostic] {
        if self.dirty {
            self.run_pipeline();
            self.dirty = false;
        }
        &self.diagnostics
    }

    fn run_pipeline(&mut self) {
        let zone = Zone::new();
        let reporter = DiagReporter::new();
        {
            let mut parser = Parser::new(&self.source, &zone, &reporter);
            let mut visitor = LintVisitor::new(&reporter);
            parser.parse_and_visit_module(&mut visitor);
        }
        self.diagnostics = reporter.finish();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_has_no_diagnostics() {
        let mut doc = Document::new();
        assert!(doc.lint().is_empty());
    }

    #[test]
    fn test_whole_document_replace_convention() {
        let mut doc = Document::new();
        doc.replace_text(0, 0, 1, 0, "let x;let x;").unwrap();
        assert_eq!(doc.source(), "let x;let x;");
        let diags = doc.lint().to_vec();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code(), "E034");
        let (start, end) = doc.locator().range(diags[0].span);
        assert_eq!((start.line, start.character), (0, 10));
        assert_eq!((end.line, end.character), (0, 11));
    }

    #[test]
    fn test_insertion_at_start() {
        let mut doc = Document::new();
        doc.replace_text(0, 0, 1, 0, "let x;").unwrap();
        assert!(doc.lint().is_empty());
        // Insert a second copy before the first: "let x;let x;".
        doc.replace_text(0, 0, 0, 0, "let x;").unwrap();
        assert_eq!(doc.source(), "let x;let x;");
        let diags = doc.lint();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code(), "E034");
    }

    #[test]
    fn test_replacement_fixes_diagnostics() {
        let mut doc = Document::new();
        doc.replace_text(0, 0, 1, 0, "let x;let x;").unwrap();
        assert_eq!(doc.lint().len(), 1);
        // Rename the second declaration: replace its `x` (chars 10..11).
        doc.replace_text(0, 10, 0, 11, "y").unwrap();
        assert_eq!(doc.source(), "let x;let y;");
        assert!(doc.lint().is_empty());
    }

    #[test]
    fn test_multi_line_splice() {
        let mut doc = Document::new();
        doc.replace_text(0, 0, 1, 0, "let a;\nlet b;\nlet c;").unwrap();
        // Delete the middle line (line 1 through the start of line 2).
        doc.replace_text(1, 0, 2, 0, "").unwrap();
        assert_eq!(doc.source(), "let a;\nlet c;");
        assert!(doc.lint().is_empty());
    }

    #[test]
    fn test_utf16_coordinates_splice() {
        let mut doc = Document::new();
        doc.replace_text(0, 0, 1, 0, "let s = '😀😀';").unwrap();
        // The emoji is two UTF-16 units; replace the second emoji
        // (characters 11..13) with an ASCII letter.
        doc.replace_text(0, 11, 0, 13, "a").unwrap();
        assert_eq!(doc.source(), "let s = '😀a';");
        assert!(doc.lint().is_empty());
    }

    #[test]
    fn test_backwards_range_is_rejected() {
        let mut doc = Document::new();
        doc.replace_text(0, 0, 1, 0, "let x;").unwrap();
        let err = doc.replace_text(0, 3, 0, 1, "y");
        assert!(err.is_err());
        // The document is unchanged.
        assert_eq!(doc.source(), "let x;");
    }

    #[test]
    fn test_lint_is_cached_until_next_edit() {
        let mut doc = Document::new();
        doc.replace_text(0, 0, 1, 0, "undeclaredVariable;").unwrap();
        let first: Vec<_> = doc.lint().to_vec();
        let second: Vec<_> = doc.lint().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn test_appending_semicolon_adds_no_earlier_errors() {
        let sources = ["2+", "x+y=z", "let x;let x;", "a b"];
        for src in sources {
            let mut with = Document::new();
            with.replace_text(0, 0, 1, 0, src).unwrap();
            let before: Vec<_> = with
                .lint()
                .iter()
                .filter(|d| d.span.begin < src.len())
                .cloned()
                .collect();

            let appended = format!("{src};");
            let mut doc = Document::new();
            doc.replace_text(0, 0, 1, 0, &appended).unwrap();
            let after: Vec<_> = doc
                .lint()
                .iter()
                .filter(|d| d.span.begin < src.len())
                .cloned()
                .collect();
            assert!(
                after.len() <= before.len(),
                "appending ';' must not add errors before the appended character for {src:?}"
            );
        }
    }
}
