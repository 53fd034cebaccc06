//! Token-level rules: identifiers, number literals, string literals and escapes.
//!
//! Every rule takes a [`Cursor`] by value and returns the parsed token with the
//! cursor just past it, or a [`ParseFailure`] describing where it gave up.

use crate::ast::{NumberLiteral, StringLiteral};
use crate::config::{MAX_IDENTIFIER_LENGTH, MAX_NUMBER_LENGTH, MAX_STRING_LITERAL_LENGTH};
use crate::syntax::cursor::Cursor;
use crate::syntax::error::{FailureKind, ParseFailure};

pub type ParseResult<'s, T> = Result<(T, Cursor<'s>), ParseFailure>;

// ============================================================================
// SINGLE CHARACTERS
// ============================================================================

/// Consumes exactly `expected` or fails.
pub fn expect_char(cursor: Cursor<'_>, expected: char) -> Result<Cursor<'_>, ParseFailure> {
    if cursor.current() == Some(expected) {
        Ok(cursor.bump())
    } else {
        Err(ParseFailure::new(
            cursor.pos(),
            FailureKind::ExpectedToken(expected),
        ))
    }
}

pub fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic()
}

pub fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-'
}

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// `[a-zA-Z][a-zA-Z0-9_-]*`, at most [`MAX_IDENTIFIER_LENGTH`] characters.
pub fn parse_identifier(cursor: Cursor<'_>) -> ParseResult<'_, &str> {
    match cursor.current() {
        Some(ch) if is_identifier_start(ch) => {}
        _ => {
            return Err(ParseFailure::new(
                cursor.pos(),
                FailureKind::ExpectedCharRange("a-zA-Z"),
            ))
        }
    }
    let end = cursor.bump().skip_while(is_identifier_char);
    let name = end.slice_from(cursor);
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ParseFailure::new(
            cursor.pos(),
            FailureKind::TokenTooLong {
                what: "identifier",
                max: MAX_IDENTIFIER_LENGTH,
            },
        ));
    }
    Ok((name, end))
}

// ============================================================================
// NUMBERS
// ============================================================================

/// `-?[0-9]+(\.[0-9]+)?`, at most [`MAX_NUMBER_LENGTH`] characters.
pub fn parse_number(cursor: Cursor<'_>) -> ParseResult<'_, NumberLiteral> {
    let start = cursor;
    let after_sign = if cursor.current() == Some('-') {
        cursor.bump()
    } else {
        cursor
    };
    let mut end = parse_digits(after_sign)?;
    if end.current() == Some('.') {
        end = parse_digits(end.bump())?;
    }
    let raw = end.slice_from(start);
    if raw.len() > MAX_NUMBER_LENGTH {
        return Err(ParseFailure::new(
            start.pos(),
            FailureKind::TokenTooLong {
                what: "number literal",
                max: MAX_NUMBER_LENGTH,
            },
        ));
    }
    let literal = NumberLiteral::new(raw)
        .map_err(|error| ParseFailure::new(start.pos(), error.into()))?;
    Ok((literal, end))
}

fn parse_digits(cursor: Cursor<'_>) -> Result<Cursor<'_>, ParseFailure> {
    let end = cursor.skip_while(|ch| ch.is_ascii_digit());
    if end.pos() == cursor.pos() {
        return Err(ParseFailure::new(
            cursor.pos(),
            FailureKind::ExpectedCharRange("0-9"),
        ));
    }
    Ok(end)
}

// ============================================================================
// STRINGS
// ============================================================================

/// `"..."` with escapes, on a single line.
pub fn parse_string_literal(cursor: Cursor<'_>) -> ParseResult<'_, StringLiteral> {
    let open = expect_char(cursor, '"')?;
    let ((value, raw), end) = parse_quoted_text(open)?;
    if end.current() != Some('"') {
        return Err(ParseFailure::new(
            end.pos(),
            FailureKind::UnterminatedStringLiteral,
        ));
    }
    Ok((
        StringLiteral::from_parts(value, raw.to_string()),
        end.bump(),
    ))
}

/// Reads string-literal content up to (not including) the closing quote or EOF.
/// Returns the unescaped value and the raw text.
fn parse_quoted_text(cursor: Cursor<'_>) -> ParseResult<'_, (String, &str)> {
    let start = cursor;
    let mut value = String::new();
    let mut cursor = cursor;
    loop {
        if cursor.pos() - start.pos() > MAX_STRING_LITERAL_LENGTH {
            return Err(ParseFailure::new(
                start.pos(),
                FailureKind::TokenTooLong {
                    what: "string literal",
                    max: MAX_STRING_LITERAL_LENGTH,
                },
            ));
        }
        match cursor.current() {
            None | Some('"') => break,
            Some('\n') | Some('\r') => {
                return Err(ParseFailure::new(
                    cursor.pos(),
                    FailureKind::LineEndInStringLiteral,
                ))
            }
            Some('\\') => {
                let (ch, next) = parse_escape_sequence(cursor)?;
                value.push(ch);
                cursor = next;
            }
            Some(ch) => {
                value.push(ch);
                cursor = cursor.bump();
            }
        }
    }
    Ok(((value, cursor.slice_from(start)), cursor))
}

/// `\\`, `\"`, `\n`, `\uHHHH` or `\UHHHHHH`. The cursor must sit on the backslash.
pub fn parse_escape_sequence(cursor: Cursor<'_>) -> ParseResult<'_, char> {
    let after_slash = expect_char(cursor, '\\')?;
    match after_slash.current() {
        Some('\\') => Ok(('\\', after_slash.bump())),
        Some('"') => Ok(('"', after_slash.bump())),
        Some('n') => Ok(('\n', after_slash.bump())),
        Some('u') => parse_unicode_escape(after_slash, 4),
        Some('U') => parse_unicode_escape(after_slash, 6),
        Some(other) => Err(ParseFailure::new(
            cursor.pos(),
            FailureKind::UnknownEscapeSequence(other.to_string()),
        )
        .expecting(&["\\\\", "\\\"", "\\n", "\\uHHHH", "\\UHHHHHH"])),
        None => Err(ParseFailure::new(
            after_slash.pos(),
            FailureKind::UnterminatedStringLiteral,
        )),
    }
}

/// Reads exactly `digits` hex digits after the `u`/`U` marker under `cursor`.
fn parse_unicode_escape(cursor: Cursor<'_>, digits: usize) -> ParseResult<'_, char> {
    let hex_start = cursor.bump();
    let mut end = hex_start;
    for _ in 0..digits {
        match end.current() {
            Some(ch) if ch.is_ascii_hexdigit() => end = end.bump(),
            _ => break,
        }
    }
    let hex = end.slice_from(hex_start);
    let sequence = end.slice_from(cursor);
    let invalid = || {
        ParseFailure::new(
            cursor.pos(),
            FailureKind::InvalidUnicodeEscapeSequence(sequence.to_string()),
        )
    };
    if hex.len() != digits {
        return Err(invalid());
    }
    let code_point = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
    // from_u32 rejects surrogates and anything above U+10FFFF.
    let ch = char::from_u32(code_point).ok_or_else(invalid)?;
    Ok((ch, end))
}

/// Unescapes the text written between the quotes of a string literal.
///
/// # Examples
///
/// ```rust
/// use ftl_engine::syntax::primitives::unescape;
/// assert_eq!(unescape(r"\u0041\\").unwrap(), "A\\");
/// assert_eq!(unescape(r"a\nb").unwrap(), "a\nb");
/// assert!(unescape(r"\t").is_err());
/// ```
pub fn unescape(raw: &str) -> Result<String, FailureKind> {
    let cursor = Cursor::new(raw);
    let ((value, _), end) = parse_quoted_text(cursor).map_err(|failure| failure.kind)?;
    if !end.is_eof() {
        return Err(FailureKind::UnescapedQuote);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        let (name, rest) = parse_identifier(Cursor::new("brand-name_2 = x")).unwrap();
        assert_eq!(name, "brand-name_2");
        assert_eq!(rest.current(), Some(' '));
        assert!(parse_identifier(Cursor::new("2fast")).is_err());
        assert!(parse_identifier(Cursor::new("_x")).is_err());
    }

    #[test]
    fn test_identifier_too_long() {
        let long = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        let err = parse_identifier(Cursor::new(&long)).unwrap_err();
        assert!(matches!(err.kind, FailureKind::TokenTooLong { .. }));
        let exact = "a".repeat(MAX_IDENTIFIER_LENGTH);
        assert!(parse_identifier(Cursor::new(&exact)).is_ok());
    }

    #[test]
    fn test_number() {
        let (number, rest) = parse_number(Cursor::new("-3.50]")).unwrap();
        assert_eq!(number.raw(), "-3.50");
        assert_eq!(number.precision(), 2);
        assert_eq!(rest.current(), Some(']'));
        assert!(parse_number(Cursor::new("1.")).is_err());
        assert!(parse_number(Cursor::new("-x")).is_err());
    }

    #[test]
    fn test_string_literal_escapes() {
        let (literal, rest) =
            parse_string_literal(Cursor::new(r#""a\"b\\cé\U01F600" tail"#)).unwrap();
        assert_eq!(literal.value(), "a\"b\\cé😀");
        assert_eq!(literal.raw(), r#"a\"b\\cé\U01F600"#);
        assert_eq!(rest.current(), Some(' '));
    }

    #[test]
    fn test_string_literal_errors() {
        let unterminated = parse_string_literal(Cursor::new("\"abc")).unwrap_err();
        assert_eq!(unterminated.kind, FailureKind::UnterminatedStringLiteral);
        let newline = parse_string_literal(Cursor::new("\"ab\nc\"")).unwrap_err();
        assert_eq!(newline.kind, FailureKind::LineEndInStringLiteral);
        let unknown = parse_string_literal(Cursor::new(r#""\t""#)).unwrap_err();
        assert_eq!(
            unknown.kind,
            FailureKind::UnknownEscapeSequence("t".into())
        );
    }

    #[test]
    fn test_escaped_line_feed() {
        let (literal, _) = parse_string_literal(Cursor::new(r#""a\nb""#)).unwrap();
        assert_eq!(literal.value(), "a\nb");
        assert_eq!(literal.raw(), r"a\nb");
    }

    #[test]
    fn test_unicode_escape_bounds() {
        assert!(unescape(r"\u00").is_err());
        assert!(unescape(r"\uD800").is_err());
        assert!(unescape(r"\U110000").is_err());
        assert_eq!(unescape(r"\U10FFFF").unwrap(), "\u{10FFFF}");
        // Only four digits belong to \u; the fifth is literal text.
        assert_eq!(unescape(r"\u00411").unwrap(), "A1");
    }

    #[test]
    fn test_unescape_rejects_bare_quote() {
        assert_eq!(unescape("a\"b"), Err(FailureKind::UnescapedQuote));
    }
}
