//! JavaScript parsing: lexer, expression AST, and the statement parser that
//! drives the visitor interface.
//!
//! The entry point is [`Parser`]: construct one over a source string, a
//! [`Zone`], and a [`DiagReporter`], then call
//! [`Parser::parse_and_visit_module`] (or [`Parser::parse_expression`] for a
//! bare expression).

/// Expression AST nodes.
pub mod ast;
/// Pratt expression parsing.
pub mod expression;
/// The context-sensitive lexer.
pub mod lexer;
/// Statement parsing and expression-tree visiting.
pub mod statements;
/// The parse-event visitor interface.
pub mod visit;

use bitflags::bitflags;

use crate::diag::DiagReporter;
use crate::parser::lexer::Lexer;
use crate::zone::Zone;

bitflags! {
    /// Statement/expression context the parser threads through recursion.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub(crate) struct ParserFlags: u8 {
        /// Inside an `async` function body: `await` is an operator and legal.
        const IN_ASYNC_FUNCTION = 0b001;
        /// Inside any function body: `return` is legal.
        const IN_FUNCTION = 0b010;
        /// The `in` operator is disabled (`for (… in …)` head).
        const NO_IN = 0b100;
    }
}

/// A single-use parser over one source snapshot.
///
/// The parser owns the lexer, allocates AST nodes in the supplied [`Zone`],
/// and reports every problem to the supplied [`DiagReporter`]; it never
/// fails and never stops early.
pub struct Parser<'alloc, 'src, 'r> {
    pub(crate) zone: &'alloc Zone,
    pub(crate) source: &'src str,
    pub(crate) lexer: Lexer<'src, 'r>,
    pub(crate) reporter: &'r DiagReporter,
    pub(crate) flags: ParserFlags,
}

impl<'alloc, 'src, 'r> Parser<'alloc, 'src, 'r> {
    /// Create a parser over `source`, allocating into `zone` and reporting
    /// into `reporter`.
    pub fn new(source: &'src str, zone: &'alloc Zone, reporter: &'r DiagReporter) -> Self {
        Self {
            zone,
            source,
            lexer: Lexer::new(source, reporter),
            reporter,
            flags: ParserFlags::default(),
        }
    }

    /// The parser's lexer (tests drive ASI through this).
    pub fn lexer(&mut self) -> &mut Lexer<'src, 'r> {
        &mut self.lexer
    }

    /// The raw source text of the token span `[begin, end)`.
    pub(crate) fn token_text(&self, begin: usize, end: usize) -> &'src str {
        &self.source[begin..end]
    }

    /// Run `f` with `add` flags set and `remove` flags cleared, restoring
    /// the previous flags afterwards.
    pub(crate) fn with_flags<T>(
        &mut self,
        add: ParserFlags,
        remove: ParserFlags,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let saved = self.flags;
        self.flags.insert(add);
        self.flags.remove(remove);
        let result = f(self);
        self.flags = saved;
        result
    }
}
