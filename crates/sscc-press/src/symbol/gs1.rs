//! GS1 element strings as Code 128 writer input.

use crate::RenderError;

/// Marker the Code 128 writer encodes as Function 1.
pub const FNC1: char = '\u{00f1}';

/// Turns a human-readable element string such as `(00)123456789012345678`
/// into writer input: a leading FNC1, then the application identifiers and
/// data with the parentheses removed.
///
/// Only numeric data is accepted, which covers every fixed-length
/// identifier including the SSCC.
///
/// # Errors
///
/// Returns [`RenderError::Encoding`] for non-digit data, unbalanced
/// parentheses, or an empty string.
pub fn writer_contents(data: &str) -> Result<String, RenderError> {
    let fail = |reason: &str| RenderError::Encoding {
        data: data.to_owned(),
        reason: reason.to_owned(),
    };

    let mut contents = String::with_capacity(data.len() + 1);
    contents.push(FNC1);
    let mut in_ai = false;
    for ch in data.chars() {
        match ch {
            '(' if !in_ai => in_ai = true,
            ')' if in_ai => in_ai = false,
            '0'..='9' => contents.push(ch),
            _ => return Err(fail("only digits and application identifiers are supported")),
        }
    }
    if in_ai {
        return Err(fail("unterminated application identifier"));
    }
    if contents.len() == FNC1.len_utf8() {
        return Err(fail("nothing to encode"));
    }
    Ok(contents)
}
