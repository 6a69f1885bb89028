//! Source positions and the offset ↔ position locator.
//!
//! The pipeline works in byte offsets internally; editors talk in
//! `(line, UTF-16 character)` pairs.  [`Locator`] converts between the two
//! using a line-start table built in one linear pass over the source.

// ─────────────────────────────────────────────────────────────────────────────
// Span / Position
// ─────────────────────────────────────────────────────────────────────────────

/// A half-open `[begin, end)` byte range in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Inclusive start byte offset.
    pub begin: usize,
    /// Exclusive end byte offset.
    pub end: usize,
}

impl Span {
    /// Create a span from begin/end byte offsets.
    pub fn new(begin: usize, end: usize) -> Self {
        debug_assert!(begin <= end);
        Self { begin, end }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span {
            begin: self.begin.min(other.begin),
            end: self.end.max(other.end),
        }
    }
}

/// A `(line, character)` position: 0-based line, 0-based UTF-16 code-unit
/// column.  This is the coordinate system editors (LSP, VS Code) use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// 0-based line number.
    pub line: u32,
    /// 0-based UTF-16 code-unit offset within the line.
    pub character: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Line terminator helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Returns `true` for ECMAScript *LineTerminator* code points.
pub(crate) fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Number of UTF-16 code units contributed by the byte at `b` when it is the
/// first byte of a UTF-8 sequence.  Continuation bytes contribute zero.
fn utf16_units_of_lead_byte(b: u8) -> u32 {
    if b < 0x80 {
        1
    } else if b < 0xC0 {
        0 // continuation byte
    } else if b < 0xF0 {
        1 // 2- or 3-byte sequence: one UTF-16 unit
    } else {
        2 // 4-byte sequence: surrogate pair
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Locator
// ─────────────────────────────────────────────────────────────────────────────

/// Maps byte offsets to [`Position`]s and back for one source snapshot.
///
/// Borrowy: a `Locator` is cheap to build and is reconstructed from scratch
/// after every document edit.
pub struct Locator<'src> {
    source: &'src str,
    /// Byte offset of the first byte of each line, in ascending order.
    /// Always contains at least offset 0.
    line_starts: Vec<usize>,
}

impl<'src> Locator<'src> {
    /// Build the line-start table for `source`.
    pub fn new(source: &'src str) -> Self {
        let mut line_starts = vec![0];
        let bytes = source.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\n' => {
                    line_starts.push(i + 1);
                    i += 1;
                }
                b'\r' => {
                    // CRLF counts as a single terminator.
                    if bytes.get(i + 1) == Some(&b'\n') {
                        i += 2;
                    } else {
                        i += 1;
                    }
                    line_starts.push(i);
                }
                0xE2 => {
                    // U+2028 / U+2029 are E2 80 A8 / E2 80 A9.
                    if bytes.get(i + 1) == Some(&0x80)
                        && matches!(bytes.get(i + 2), Some(&0xA8) | Some(&0xA9))
                    {
                        i += 3;
                        line_starts.push(i);
                    } else {
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        }
        Self {
            source,
            line_starts,
        }
    }

    /// Number of lines in the source (at least 1).
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Convert a byte offset to a [`Position`].
    ///
    /// Offsets past the end of the source are clamped to the end.
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert - 1,
        };
        let mut character = 0u32;
        for &b in &self.source.as_bytes()[self.line_starts[line]..offset] {
            character += utf16_units_of_lead_byte(b);
        }
        Position {
            line: line as u32,
            character,
        }
    }

    /// Convert a byte [`Span`] to its start/end [`Position`] pair.
    pub fn range(&self, span: Span) -> (Position, Position) {
        (self.position(span.begin), self.position(span.end))
    }

    /// Convert a [`Position`] back to a byte offset.
    ///
    /// Out-of-range coordinates clamp: a line past the last line maps to the
    /// end of the document, and a character past the end of its line maps to
    /// the end of that line (before the terminator).
    pub fn offset(&self, position: Position) -> usize {
        let line = position.line as usize;
        if line >= self.line_starts.len() {
            return self.source.len();
        }
        let start = self.line_starts[line];
        let mut units = 0u32;
        let mut offset = start;
        for c in self.source[start..].chars() {
            if is_line_terminator(c) || units >= position.character {
                break;
            }
            units += c.len_utf16() as u32;
            offset += c.len_utf8();
        }
        offset
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_has_one_line() {
        let loc = Locator::new("");
        assert_eq!(loc.line_count(), 1);
        assert_eq!(loc.position(0), Position { line: 0, character: 0 });
    }

    #[test]
    fn test_offsets_on_single_line() {
        let loc = Locator::new("hello");
        assert_eq!(loc.position(0), Position { line: 0, character: 0 });
        assert_eq!(loc.position(3), Position { line: 0, character: 3 });
        assert_eq!(loc.position(5), Position { line: 0, character: 5 });
    }

    #[test]
    fn test_lf_lines() {
        let loc = Locator::new("ab\ncd\nef");
        assert_eq!(loc.position(0), Position { line: 0, character: 0 });
        assert_eq!(loc.position(3), Position { line: 1, character: 0 });
        assert_eq!(loc.position(4), Position { line: 1, character: 1 });
        assert_eq!(loc.position(7), Position { line: 2, character: 1 });
    }

    #[test]
    fn test_crlf_counts_once() {
        let loc = Locator::new("ab\r\ncd");
        assert_eq!(loc.line_count(), 2);
        assert_eq!(loc.position(4), Position { line: 1, character: 0 });
    }

    #[test]
    fn test_cr_alone_is_a_terminator() {
        let loc = Locator::new("ab\rcd");
        assert_eq!(loc.line_count(), 2);
        assert_eq!(loc.position(3), Position { line: 1, character: 0 });
    }

    #[test]
    fn test_unicode_line_separators() {
        let loc = Locator::new("a\u{2028}b\u{2029}c");
        assert_eq!(loc.line_count(), 3);
        assert_eq!(loc.position(4), Position { line: 1, character: 0 });
        assert_eq!(loc.position(8), Position { line: 2, character: 0 });
    }

    #[test]
    fn test_utf16_columns() {
        // 'é' is 2 bytes / 1 UTF-16 unit; '😀' is 4 bytes / 2 units.
        let src = "é😀x";
        let loc = Locator::new(src);
        assert_eq!(loc.position(0).character, 0);
        assert_eq!(loc.position(2).character, 1);
        assert_eq!(loc.position(6).character, 3);
    }

    #[test]
    fn test_offset_round_trip() {
        let src = "let x;\nlet y = 'é';\n";
        let loc = Locator::new(src);
        for (offset, _) in src.char_indices() {
            assert_eq!(loc.offset(loc.position(offset)), offset);
        }
    }

    #[test]
    fn test_offset_clamps_past_line_end() {
        let loc = Locator::new("ab\ncd");
        let off = loc.offset(Position {
            line: 0,
            character: 99,
        });
        assert_eq!(off, 2);
    }

    #[test]
    fn test_offset_clamps_past_document_end() {
        let loc = Locator::new("ab");
        let off = loc.offset(Position {
            line: 7,
            character: 0,
        });
        assert_eq!(off, 2);
    }

    #[test]
    fn test_span_to_merges() {
        let a = Span::new(2, 4);
        let b = Span::new(7, 9);
        assert_eq!(a.to(b), Span::new(2, 9));
        assert_eq!(b.to(a), Span::new(2, 9));
    }
}
