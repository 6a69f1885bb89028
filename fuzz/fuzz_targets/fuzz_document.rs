//! Fuzzes the document splice path: a sequence of edits derived from the
//! input must keep the document consistent and lintable.

#![no_main]

use libfuzzer_sys::fuzz_target;
use lintel_core::Document;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let mut document = Document::new();
    document
        .replace_text(0, 0, 1, 0, text)
        .expect("forward range");
    document.lint();

    // Derive a few splices from the input itself; coordinates clamp, so any
    // values are in contract as long as start <= end.
    let mut coordinates = data.iter().map(|&b| (b % 17) as u32);
    for _ in 0..4 {
        let Some(line) = coordinates.next() else { break };
        let Some(column) = coordinates.next() else { break };
        let Some(width) = coordinates.next() else { break };
        document
            .replace_text(line, column, line, column + width, "x")
            .expect("forward range");
        let source_len = document.source().len();
        for diagnostic in document.lint() {
            assert!(diagnostic.span.begin <= diagnostic.span.end);
            assert!(diagnostic.span.end <= source_len);
        }
    }
});
