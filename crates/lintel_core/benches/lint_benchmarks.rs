//! Criterion benchmarks for the lint pipeline.
//!
//! Run with: `cargo bench --package lintel_core`

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use lintel_core::Document;
use lintel_core::diag::DiagReporter;
use lintel_core::parser::Parser;
use lintel_core::parser::lexer::{Lexer, TokenKind};
use lintel_core::parser::visit::NullVisitor;
use lintel_core::zone::Zone;

/// A small but representative program: declarations, functions, arrows,
/// templates, regexps, and control flow.
const SAMPLE: &str = r#"
import {format} from 'util';

const GREETING = `hello ${name}`;

function classify(values) {
  let even = 0;
  let odd = 0;
  for (const value of values) {
    if (value % 2 === 0) {
      even++;
    } else {
      odd++;
    }
  }
  return {even, odd};
}

const isWord = (text) => /\w+/.test(text);

async function main() {
  const {even, odd} = classify([1, 2, 3, 4, 5]);
  await report(format('%d / %d', even, odd));
}
"#;

// ---------------------------------------------------------------------------
// Tokenisation throughput
// ---------------------------------------------------------------------------

fn bench_tokenize(c: &mut Criterion) {
    c.bench_function("lexer_tokenize_sample", |b| {
        b.iter(|| {
            let reporter = DiagReporter::new();
            let mut lexer = Lexer::new(black_box(SAMPLE), &reporter);
            let mut count = 0usize;
            while lexer.peek().kind != TokenKind::Eof {
                count += 1;
                lexer.skip();
            }
            black_box(count);
        });
    });
}

// ---------------------------------------------------------------------------
// Expression parsing
// ---------------------------------------------------------------------------

fn bench_parse_expression(c: &mut Criterion) {
    let expression = "a + f(x + y, -z - w) * (b ? c : d) + values[i].prop ** 2";
    c.bench_function("parse_expression", |b| {
        b.iter(|| {
            let zone = Zone::new();
            let reporter = DiagReporter::new();
            let mut visitor = NullVisitor;
            let mut parser = Parser::new(black_box(expression), &zone, &reporter);
            black_box(parser.parse_expression(&mut visitor).span());
        });
    });
}

// ---------------------------------------------------------------------------
// Full document lint (the editor-latency path)
// ---------------------------------------------------------------------------

fn bench_document_lint(c: &mut Criterion) {
    c.bench_function("document_lint_sample", |b| {
        b.iter(|| {
            let mut document = Document::new();
            document
                .replace_text(0, 0, 1, 0, black_box(SAMPLE))
                .expect("splice is well-formed");
            black_box(document.lint().len());
        });
    });
}

fn bench_document_incremental_edit(c: &mut Criterion) {
    c.bench_function("document_edit_and_relint", |b| {
        let mut document = Document::new();
        document
            .replace_text(0, 0, 1, 0, SAMPLE)
            .expect("splice is well-formed");
        document.lint();
        b.iter(|| {
            // Toggle one character, forcing a full re-lint.
            document.replace_text(3, 6, 3, 7, "X").expect("in range");
            document.replace_text(3, 6, 3, 7, "G").expect("in range");
            black_box(document.lint().len());
        });
    });
}

criterion_group!(
    benches,
    bench_tokenize,
    bench_parse_expression,
    bench_document_lint,
    bench_document_incremental_edit,
);
criterion_main!(benches);
