//! Fuzzes the parser: any UTF-8 input must produce a module parse and a
//! well-formed diagnostic vector, never a panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use lintel_core::diag::DiagReporter;
use lintel_core::lint::LintVisitor;
use lintel_core::parser::Parser;
use lintel_core::zone::Zone;

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let zone = Zone::new();
    let reporter = DiagReporter::new();
    {
        let mut parser = Parser::new(source, &zone, &reporter);
        let mut visitor = LintVisitor::new(&reporter);
        parser.parse_and_visit_module(&mut visitor);
    }
    for diagnostic in reporter.finish() {
        assert!(diagnostic.span.begin <= diagnostic.span.end);
        assert!(diagnostic.span.end <= source.len());
    }
});
