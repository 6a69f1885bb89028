//! Fuzzes the lexer: any UTF-8 input must tokenize to EOF without panicking
//! and with every token span inside the source.

#![no_main]

use libfuzzer_sys::fuzz_target;
use lintel_core::diag::DiagReporter;
use lintel_core::parser::lexer::{Lexer, TokenKind};

fuzz_target!(|data: &[u8]| {
    let Ok(source) = std::str::from_utf8(data) else {
        return;
    };
    let reporter = DiagReporter::new();
    let mut lexer = Lexer::new(source, &reporter);
    loop {
        let token = lexer.peek();
        assert!(token.begin <= token.end);
        assert!(token.end <= source.len());
        if token.kind == TokenKind::Eof {
            break;
        }
        lexer.skip();
    }
    for diagnostic in reporter.finish() {
        assert!(diagnostic.span.begin <= diagnostic.span.end);
        assert!(diagnostic.span.end <= source.len());
    }
});
