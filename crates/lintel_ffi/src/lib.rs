//! `lintel_ffi` — C-ABI surface for the lintel JavaScript linter.
//!
//! This crate exposes a stable C API (`extern "C"`, `#[no_mangle]`) so that
//! editors and plugin hosts can link against lintel without depending on
//! Rust tooling.
//!
//! # Design
//! The one opaque handle type is [`LintelParser`], passed as a raw pointer.
//! Memory is always owned by the lintel side: callers obtain a handle
//! through [`lintel_create_parser`] and must release it with
//! [`lintel_destroy_parser`].  The diagnostic array returned by
//! [`lintel_lint`] is owned by the parser and valid until the next call on
//! the same parser.

use std::ffi::{c_char, c_int, CString};

use lintel_core::diag::Severity;
use lintel_core::Document;

/// One diagnostic record, in editor coordinates.
///
/// The array returned by [`lintel_lint`] is terminated by an entry whose
/// `message` and `code` are both null.
#[repr(C)]
pub struct LintelDiagnostic {
    /// Human-readable message; null in the terminator entry.
    pub message: *const c_char,
    /// Stable diagnostic code (e.g. `"E034"`); null in the terminator.
    pub code: *const c_char,
    /// 1 = error, 2 = warning.
    pub severity: c_int,
    /// 0-based line of the first offending character.
    pub start_line: c_int,
    /// 0-based UTF-16 column of the first offending character.
    pub start_character: c_int,
    /// 0-based line one past the offending range.
    pub end_line: c_int,
    /// 0-based UTF-16 column one past the offending range.
    pub end_character: c_int,
}

/// An opaque parser handle: a document plus the storage backing the most
/// recent diagnostic array.
pub struct LintelParser {
    document: Document,
    /// Owns the `message`/`code` strings pointed to by `diagnostics`.
    strings: Vec<CString>,
    /// The last array handed to the caller, terminator included.
    diagnostics: Vec<LintelDiagnostic>,
}

/// Create a new parser with an empty document.
///
/// The returned pointer must eventually be passed to
/// [`lintel_destroy_parser`] to free all associated resources.
#[unsafe(no_mangle)]
pub extern "C" fn lintel_create_parser() -> *mut LintelParser {
    Box::into_raw(Box::new(LintelParser {
        document: Document::new(),
        strings: Vec::new(),
        diagnostics: Vec::new(),
    }))
}

/// Destroy a parser previously created with [`lintel_create_parser`].
///
/// # Safety
/// - `parser` must be a non-null pointer returned by `lintel_create_parser`.
/// - `parser` must not be used again after this call.
/// - This function must not be called more than once for the same pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn lintel_destroy_parser(parser: *mut LintelParser) {
    if !parser.is_null() {
        // SAFETY: pointer was created by `Box::into_raw` in
        // `lintel_create_parser`.
        drop(unsafe { Box::from_raw(parser) });
    }
}

/// Splice `length` bytes of UTF-8 at `text` over the given range, in
/// 0-based line / UTF-16 code-unit coordinates.
///
/// Out-of-range coordinates clamp to the line or document end, so passing
/// `end_line = 1, end_character = 0` against an empty document replaces the
/// whole document.  Invalid UTF-8 is replaced, backwards ranges are
/// ignored.
///
/// # Safety
/// - `parser` must be a non-null, valid pointer to a live [`LintelParser`].
/// - `text` must be valid for reads of `length` bytes (it may be null when
///   `length` is zero).
#[unsafe(no_mangle)]
pub unsafe extern "C" fn lintel_replace_text(
    parser: *mut LintelParser,
    start_line: c_int,
    start_character: c_int,
    end_line: c_int,
    end_character: c_int,
    text: *const c_char,
    length: usize,
) {
    if parser.is_null() || (text.is_null() && length != 0) {
        return;
    }
    // SAFETY: caller guarantees `text` is valid for `length` bytes.
    let bytes: &[u8] = if length == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(text as *const u8, length) }
    };
    let replacement = String::from_utf8_lossy(bytes);
    // SAFETY: caller guarantees `parser` is valid.
    let parser = unsafe { &mut *parser };
    let clamp = |coordinate: c_int| coordinate.max(0) as u32;
    // A backwards range is a caller bug; the splice is skipped and the
    // document keeps its previous contents.
    let _ = parser.document.replace_text(
        clamp(start_line),
        clamp(start_character),
        clamp(end_line),
        clamp(end_character),
        &replacement,
    );
}

/// Lint the parser's current document.
///
/// Returns a pointer to an array of [`LintelDiagnostic`] terminated by an
/// entry with null `message` and `code`.  The array is owned by the parser
/// and is valid until the next `lintel_replace_text` / `lintel_lint` /
/// `lintel_destroy_parser` call on the same parser.
///
/// # Safety
/// `parser` must be a non-null, valid pointer to a live [`LintelParser`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn lintel_lint(parser: *mut LintelParser) -> *const LintelDiagnostic {
    if parser.is_null() {
        return std::ptr::null();
    }
    // SAFETY: caller guarantees `parser` is valid.
    let parser = unsafe { &mut *parser };

    parser.strings.clear();
    parser.diagnostics.clear();

    let diagnostics = parser.document.lint().to_vec();
    let locator = parser.document.locator();
    for diagnostic in &diagnostics {
        let (start, end) = locator.range(diagnostic.span);
        let message =
            CString::new(diagnostic.message()).unwrap_or_else(|_| CString::new("").expect("empty"));
        let code = CString::new(diagnostic.code()).expect("codes contain no null bytes");
        let record = LintelDiagnostic {
            message: message.as_ptr(),
            code: code.as_ptr(),
            severity: match diagnostic.severity() {
                Severity::Error => 1,
                Severity::Warning => 2,
            },
            start_line: start.line as c_int,
            start_character: start.character as c_int,
            end_line: end.line as c_int,
            end_character: end.character as c_int,
        };
        parser.strings.push(message);
        parser.strings.push(code);
        parser.diagnostics.push(record);
    }
    // Zero terminator.
    parser.diagnostics.push(LintelDiagnostic {
        message: std::ptr::null(),
        code: std::ptr::null(),
        severity: 0,
        start_line: 0,
        start_character: 0,
        end_line: 0,
        end_character: 0,
    });

    parser.diagnostics.as_ptr()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    unsafe fn replace_whole(parser: *mut LintelParser, text: &str) {
        unsafe {
            lintel_replace_text(
                parser,
                0,
                0,
                1,
                0,
                text.as_ptr() as *const c_char,
                text.len(),
            );
        }
    }

    unsafe fn message_at(diagnostics: *const LintelDiagnostic, index: usize) -> Option<String> {
        let entry = unsafe { &*diagnostics.add(index) };
        if entry.message.is_null() {
            return None;
        }
        Some(
            unsafe { CStr::from_ptr(entry.message) }
                .to_string_lossy()
                .into_owned(),
        )
    }

    unsafe fn code_at(diagnostics: *const LintelDiagnostic, index: usize) -> Option<String> {
        let entry = unsafe { &*diagnostics.add(index) };
        if entry.code.is_null() {
            return None;
        }
        Some(
            unsafe { CStr::from_ptr(entry.code) }
                .to_string_lossy()
                .into_owned(),
        )
    }

    #[test]
    fn test_empty_document_has_no_diagnostics() {
        unsafe {
            let parser = lintel_create_parser();
            let diagnostics = lintel_lint(parser);
            assert!(message_at(diagnostics, 0).is_none());
            lintel_destroy_parser(parser);
        }
    }

    #[test]
    fn test_lint_error_after_text_insertion() {
        unsafe {
            let parser = lintel_create_parser();
            replace_whole(parser, "let x;let x;");
            let diagnostics = lintel_lint(parser);

            assert!(message_at(diagnostics, 0).is_some());
            assert!(message_at(diagnostics, 1).is_none());
            assert!(code_at(diagnostics, 1).is_none());

            assert_eq!(
                message_at(diagnostics, 0).unwrap(),
                "redeclaration of variable: x"
            );
            assert_eq!(code_at(diagnostics, 0).unwrap(), "E034");
            let entry = &*diagnostics;
            assert_eq!(entry.start_line, 0);
            assert_eq!(entry.start_character, "let x;let ".len() as c_int);
            assert_eq!(entry.end_line, 0);
            assert_eq!(entry.end_character, "let x;let x".len() as c_int);

            lintel_destroy_parser(parser);
        }
    }

    #[test]
    fn test_lint_new_error_after_second_text_insertion() {
        unsafe {
            let parser = lintel_create_parser();
            replace_whole(parser, "let x;");
            let diagnostics = lintel_lint(parser);
            assert!(message_at(diagnostics, 0).is_none());

            // Insert a second copy before the first; the parser's text is
            // now "let x;let x;".
            let text = "let x;";
            lintel_replace_text(
                parser,
                0,
                0,
                0,
                0,
                text.as_ptr() as *const c_char,
                text.len(),
            );
            let diagnostics = lintel_lint(parser);
            assert!(message_at(diagnostics, 0).is_some());
            assert!(message_at(diagnostics, 1).is_none());

            assert_eq!(
                message_at(diagnostics, 0).unwrap(),
                "redeclaration of variable: x"
            );
            assert_eq!(code_at(diagnostics, 0).unwrap(), "E034");
            let entry = &*diagnostics;
            assert_eq!(entry.start_character, "let x;let ".len() as c_int);
            assert_eq!(entry.end_character, "let x;let x".len() as c_int);

            lintel_destroy_parser(parser);
        }
    }

    #[test]
    fn test_diagnostic_severity() {
        unsafe {
            let parser = lintel_create_parser();
            replace_whole(parser, "let x;let x;\nundeclaredVariable;");
            let diagnostics = lintel_lint(parser);

            assert!(message_at(diagnostics, 0).is_some());
            assert!(message_at(diagnostics, 1).is_some());
            assert!(message_at(diagnostics, 2).is_none());
            assert!(code_at(diagnostics, 2).is_none());

            assert_eq!((*diagnostics.add(0)).severity, 1);
            assert_eq!((*diagnostics.add(1)).severity, 2);

            lintel_destroy_parser(parser);
        }
    }

    #[test]
    fn test_null_parser_is_tolerated() {
        unsafe {
            assert!(lintel_lint(std::ptr::null_mut()).is_null());
            lintel_destroy_parser(std::ptr::null_mut());
            lintel_replace_text(std::ptr::null_mut(), 0, 0, 0, 0, std::ptr::null(), 0);
        }
    }
}
