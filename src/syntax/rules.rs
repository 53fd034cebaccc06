//! Grammar rules above the token level: entries, patterns, placeables,
//! expressions, select expressions and call arguments.
//!
//! Rules are plain functions over an immutable [`Cursor`]. Recursion through
//! `{` and `(` goes through [`ParseContext::enter`], which bounds the nesting
//! depth so hostile input cannot exhaust the stack.

use crate::ast::{
    Attribute, CallArguments, Comment, CommentLevel, Entry, Expression, Identifier, Literal, Message,
    NamedArgument, Pattern, PatternElement, Placeable, SelectExpression, Term, Variant,
    VariantKey,
};
use crate::syntax::cursor::Cursor;
use crate::syntax::error::{FailureKind, ParseFailure};
use crate::syntax::primitives::{
    expect_char, is_identifier_start, parse_identifier, parse_number, parse_string_literal,
    ParseResult,
};

// ============================================================================
// NESTING CONTEXT
// ============================================================================

/// Tracks how deeply placeables and call arguments are nested.
///
/// The context is `Copy`; entering returns a deeper copy, and returning from a
/// rule drops back to the caller's copy automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseContext {
    pub max_nesting_depth: usize,
    pub current_depth: usize,
}

impl ParseContext {
    pub fn new(max_nesting_depth: usize) -> Self {
        Self {
            max_nesting_depth,
            current_depth: 0,
        }
    }

    /// One level deeper, or a failure at `position` if that breaks the limit.
    pub fn enter(self, position: usize) -> Result<Self, ParseFailure> {
        if self.current_depth >= self.max_nesting_depth {
            return Err(ParseFailure::new(
                position,
                FailureKind::NestingDepthExceeded(self.max_nesting_depth),
            ));
        }
        Ok(Self {
            current_depth: self.current_depth + 1,
            ..self
        })
    }
}

// ============================================================================
// ENTRIES
// ============================================================================

/// Parses one message, term or comment. The returned cursor sits on the line
/// end (or EOF) that terminates the entry.
pub fn parse_entry(cursor: Cursor<'_>, ctx: ParseContext) -> ParseResult<'_, Entry> {
    match cursor.current() {
        Some('#') => parse_comment(cursor).map(|(comment, c)| (Entry::Comment(comment), c)),
        Some('-') => parse_term(cursor, ctx).map(|(term, c)| (Entry::Term(term), c)),
        Some(ch) if is_identifier_start(ch) => {
            parse_message(cursor, ctx).map(|(message, c)| (Entry::Message(message), c))
        }
        _ => Err(ParseFailure::new(cursor.pos(), FailureKind::ExpectedEntry)
            .expecting(&["a message", "a term", "a comment"])),
    }
}

pub fn parse_message(cursor: Cursor<'_>, ctx: ParseContext) -> ParseResult<'_, Message> {
    let start = cursor.pos();
    let (id, cursor) = parse_identifier(cursor)?;
    let cursor = expect_char(cursor.skip_blank_inline(), '=')?;
    let (value, cursor) = parse_pattern(cursor.skip_blank_inline(), ctx)?;
    let (attributes, cursor) = parse_attributes(cursor, ctx)?;
    if value.is_none() && attributes.is_empty() {
        return Err(ParseFailure::new(
            start,
            FailureKind::ExpectedMessageField(id.to_string()),
        ));
    }
    let message = Message {
        id: Identifier::new(id),
        value,
        attributes,
        comment: None,
    };
    Ok((message, cursor))
}

pub fn parse_term(cursor: Cursor<'_>, ctx: ParseContext) -> ParseResult<'_, Term> {
    let start = cursor.pos();
    let (id, cursor) = parse_identifier(expect_char(cursor, '-')?)?;
    let cursor = expect_char(cursor.skip_blank_inline(), '=')?;
    let (value, cursor) = parse_pattern(cursor.skip_blank_inline(), ctx)?;
    let value =
        value.ok_or_else(|| ParseFailure::new(start, FailureKind::ExpectedTermField(id.into())))?;
    let (attributes, cursor) = parse_attributes(cursor, ctx)?;
    let term = Term {
        id: Identifier::new(id),
        value,
        attributes,
        comment: None,
    };
    Ok((term, cursor))
}

/// Zero or more `.name = pattern` lines following a message or term value.
fn parse_attributes(
    cursor: Cursor<'_>,
    ctx: ParseContext,
) -> ParseResult<'_, Vec<Attribute>> {
    let mut attributes = Vec::new();
    let mut cursor = cursor;
    // Attributes must start on a fresh line.
    while cursor.current() == Some('\n') {
        let line = cursor.skip_blank();
        if line.current() != Some('.') {
            break;
        }
        let (attribute, next) = parse_attribute(line, ctx)?;
        attributes.push(attribute);
        cursor = next;
    }
    Ok((attributes, cursor))
}

fn parse_attribute(cursor: Cursor<'_>, ctx: ParseContext) -> ParseResult<'_, Attribute> {
    let (id, cursor) = parse_identifier(expect_char(cursor, '.')?)?;
    let cursor = expect_char(cursor.skip_blank_inline(), '=')?;
    let (value, cursor) = parse_pattern(cursor.skip_blank_inline(), ctx)?;
    let value = value.ok_or_else(|| ParseFailure::new(cursor.pos(), FailureKind::MissingValue))?;
    Ok((
        Attribute {
            id: Identifier::new(id),
            value,
        },
        cursor,
    ))
}

// ============================================================================
// COMMENTS
// ============================================================================

/// One or more consecutive comment lines of the same level.
pub fn parse_comment(cursor: Cursor<'_>) -> ParseResult<'_, Comment> {
    let (level, hashes) = comment_level(cursor)?;
    let mut lines = Vec::new();
    let mut cursor = cursor;
    loop {
        let (line, end) = parse_comment_line(cursor, hashes)?;
        lines.push(line);
        cursor = end;
        // Merge the next line only if it is a comment of exactly this level.
        let next = cursor.bump();
        if cursor.current() != Some('\n') || !is_comment_line(next, hashes) {
            break;
        }
        cursor = next;
    }
    let comment = Comment {
        level,
        content: lines.join("\n"),
    };
    Ok((comment, cursor))
}

fn comment_level(cursor: Cursor<'_>) -> Result<(CommentLevel, usize), ParseFailure> {
    let hashes = cursor.skip_while(|ch| ch == '#').pos() - cursor.pos();
    let level = match hashes {
        1 => CommentLevel::Comment,
        2 => CommentLevel::Group,
        3 => CommentLevel::Resource,
        _ => {
            return Err(ParseFailure::new(
                cursor.pos(),
                FailureKind::TooManyCommentHashes,
            ))
        }
    };
    Ok((level, hashes))
}

fn is_comment_line(cursor: Cursor<'_>, hashes: usize) -> bool {
    let after = cursor.skip_while(|ch| ch == '#');
    after.pos() - cursor.pos() == hashes && matches!(after.current(), None | Some(' ' | '\n'))
}

/// `#{hashes}` followed by a line end, or by a space and the line's content.
fn parse_comment_line(cursor: Cursor<'_>, hashes: usize) -> ParseResult<'_, &str> {
    let after = cursor.advance(hashes);
    match after.current() {
        None | Some('\n') => Ok(("", after)),
        Some(' ') => {
            let text = after.bump();
            let end = text.skip_while(|ch| ch != '\n');
            Ok((end.slice_from(text), end))
        }
        Some('#') => Err(ParseFailure::new(
            after.pos(),
            FailureKind::TooManyCommentHashes,
        )),
        Some(_) => Err(ParseFailure::new(after.pos(), FailureKind::ExpectedToken(' '))),
    }
}

// ============================================================================
// PATTERNS
// ============================================================================

/// Accumulates pattern elements, merging adjacent text.
#[derive(Default)]
struct PatternBuilder {
    elements: Vec<PatternElement>,
    text: String,
}

impl PatternBuilder {
    fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.text.is_empty()
    }

    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn push_placeable(&mut self, placeable: Placeable) {
        self.flush_text();
        self.elements.push(PatternElement::Placeable(placeable));
    }

    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            let value = std::mem::take(&mut self.text);
            self.elements.push(PatternElement::TextElement { value });
        }
    }

    fn finish(mut self) -> Option<Pattern> {
        // Trailing spaces of the final text run are layout, not content.
        let trimmed = self.text.trim_end_matches(' ').len();
        self.text.truncate(trimmed);
        self.flush_text();
        if self.elements.is_empty() {
            None
        } else {
            Some(Pattern::new(self.elements))
        }
    }
}

/// Where the next continuation line of a pattern begins.
struct Continuation<'s> {
    blank_lines: usize,
    indent: usize,
    resume: Cursor<'s>,
}

/// Looks past the line end under `cursor` for an indented continuation line.
///
/// A continuation needs at least one space of indentation and must not start
/// with `[`, `*`, `.` or `}`; those begin variants, attributes or close a
/// placeable. Blank lines in between are counted.
fn continuation(cursor: Cursor<'_>) -> Option<Continuation<'_>> {
    let mut line = cursor.bump();
    let mut blank_lines = 0;
    loop {
        let content = line.skip_blank_inline();
        match content.current() {
            Some('\n') => {
                blank_lines += 1;
                line = content.bump();
            }
            None => return None,
            Some(ch) => {
                let indent = content.pos() - line.pos();
                if indent == 0 || matches!(ch, '[' | '*' | '.' | '}') {
                    return None;
                }
                return Some(Continuation {
                    blank_lines,
                    indent,
                    resume: content,
                });
            }
        }
    }
}

/// Parses a (possibly multiline) pattern. Returns `None` when the pattern is
/// empty. The returned cursor sits on the line end (or EOF) of its last line.
pub fn parse_pattern(cursor: Cursor<'_>, ctx: ParseContext) -> ParseResult<'_, Option<Pattern>> {
    let mut builder = PatternBuilder::default();
    let mut common_indent: Option<usize> = None;
    let mut cursor = cursor;
    loop {
        match cursor.current() {
            None => break,
            Some('{') => {
                let (placeable, next) = parse_placeable(cursor, ctx)?;
                builder.push_placeable(placeable);
                cursor = next;
            }
            Some('}') => {
                return Err(ParseFailure::new(
                    cursor.pos(),
                    FailureKind::UnbalancedClosingBrace,
                ))
            }
            Some('\n') => {
                let Some(next) = continuation(cursor) else {
                    break;
                };
                let common = *common_indent.get_or_insert(next.indent);
                if !builder.is_empty() {
                    for _ in 0..=next.blank_lines {
                        builder.push_text("\n");
                    }
                    let extra = next.indent.saturating_sub(common);
                    builder.push_text(&" ".repeat(extra));
                }
                cursor = next.resume;
            }
            Some(_) => {
                let start = cursor;
                cursor = cursor.skip_while(|ch| !matches!(ch, '{' | '}' | '\n'));
                builder.push_text(cursor.slice_from(start));
            }
        }
    }
    Ok((builder.finish(), cursor))
}

// ============================================================================
// PLACEABLES & EXPRESSIONS
// ============================================================================

/// `{ expression }` or `{ selector -> variants }`.
///
/// A run of bare openers such as `{ { { x } } }` is consumed in a loop, so
/// wrapper placeables cost a depth level each but no native stack.
pub fn parse_placeable(cursor: Cursor<'_>, ctx: ParseContext) -> ParseResult<'_, Placeable> {
    let mut ctx = ctx;
    // Start of each nested placeable that is the whole body of its parent.
    let mut wrapped = Vec::new();
    let mut opener = cursor;
    let inner = loop {
        ctx = ctx.enter(opener.pos())?;
        let inner = expect_char(opener, '{')?.skip_blank();
        if inner.current() != Some('{') {
            break inner;
        }
        wrapped.push(inner.pos());
        opener = inner;
    };
    let (expression, cursor) = parse_placeable_body(inner, ctx)?;
    let mut cursor = expect_char(cursor.skip_blank(), '}')?;
    let mut placeable = Placeable::new(expression);
    while let Some(start) = wrapped.pop() {
        let after = cursor.skip_blank();
        if after.starts_with("->") {
            // A placeable is never a valid selector.
            return Err(ParseFailure::new(
                start,
                FailureKind::ExpectedSimpleExpressionAsSelector,
            ));
        }
        cursor = expect_char(after, '}')?;
        placeable = Placeable::new(Expression::Placeable(placeable));
    }
    Ok((placeable, cursor))
}

fn parse_placeable_body(cursor: Cursor<'_>, ctx: ParseContext) -> ParseResult<'_, Expression> {
    let (selector, after) = parse_inline_expression(cursor, ctx)?;
    let arrow = after.skip_blank();
    if arrow.starts_with("->") {
        check_selector(&selector, cursor.pos())?;
        let (variants, end) = parse_variants(arrow.advance(2).skip_blank_inline(), ctx)?;
        let select = SelectExpression::new(selector, variants)
            .map_err(|error| ParseFailure::new(arrow.pos(), error.into()))?;
        return Ok((Expression::SelectExpression(select), end));
    }
    if let Expression::TermReference {
        attribute: Some(_), ..
    } = &selector
    {
        return Err(ParseFailure::new(
            cursor.pos(),
            FailureKind::TermAttributeAsPlaceable,
        ));
    }
    Ok((selector, after))
}

fn check_selector(selector: &Expression, position: usize) -> Result<(), ParseFailure> {
    let kind = match selector {
        Expression::MessageReference { .. } => FailureKind::MessageReferenceAsSelector,
        Expression::TermReference {
            attribute: None, ..
        } => FailureKind::TermReferenceAsSelector,
        Expression::Placeable(_) | Expression::SelectExpression(_) => {
            FailureKind::ExpectedSimpleExpressionAsSelector
        }
        _ => return Ok(()),
    };
    Err(ParseFailure::new(position, kind))
}

pub fn parse_inline_expression(
    cursor: Cursor<'_>,
    ctx: ParseContext,
) -> ParseResult<'_, Expression> {
    match cursor.current() {
        Some('"') => parse_string_literal(cursor)
            .map(|(literal, c)| (Expression::StringLiteral(literal), c)),
        Some(ch) if ch.is_ascii_digit() => {
            parse_number(cursor).map(|(number, c)| (Expression::NumberLiteral(number), c))
        }
        Some('-') if cursor.peek(1).is_some_and(|ch| ch.is_ascii_digit()) => {
            parse_number(cursor).map(|(number, c)| (Expression::NumberLiteral(number), c))
        }
        Some('-') => parse_term_reference(cursor, ctx),
        Some('$') => {
            let (id, c) = parse_identifier(cursor.bump())?;
            Ok((
                Expression::VariableReference {
                    id: Identifier::new(id),
                },
                c,
            ))
        }
        Some('{') => {
            parse_placeable(cursor, ctx).map(|(placeable, c)| (Expression::Placeable(placeable), c))
        }
        Some(ch) if is_identifier_start(ch) => {
            let (id, after) = parse_identifier(cursor)?;
            let call = after.skip_blank();
            if call.current() == Some('(') {
                let (arguments, c) = parse_call_arguments(call, ctx)?;
                return Ok((
                    Expression::FunctionReference {
                        id: Identifier::new(id),
                        arguments,
                    },
                    c,
                ));
            }
            let (attribute, c) = parse_attribute_accessor(after)?;
            Ok((
                Expression::MessageReference {
                    id: Identifier::new(id),
                    attribute,
                },
                c,
            ))
        }
        _ => Err(
            ParseFailure::new(cursor.pos(), FailureKind::ExpectedInlineExpression).expecting(&[
                "a string literal",
                "a number literal",
                "a variable reference",
                "a message or term reference",
                "a function call",
            ]),
        ),
    }
}

fn parse_term_reference(cursor: Cursor<'_>, ctx: ParseContext) -> ParseResult<'_, Expression> {
    let (id, after) = parse_identifier(expect_char(cursor, '-')?)?;
    let (attribute, after) = parse_attribute_accessor(after)?;
    let call = after.skip_blank();
    let (arguments, end) = if call.current() == Some('(') {
        let (arguments, c) = parse_call_arguments(call, ctx)?;
        (Some(arguments), c)
    } else {
        (None, after)
    };
    Ok((
        Expression::TermReference {
            id: Identifier::new(id),
            attribute,
            arguments,
        },
        end,
    ))
}

fn parse_attribute_accessor(cursor: Cursor<'_>) -> ParseResult<'_, Option<Identifier>> {
    if cursor.current() != Some('.') {
        return Ok((None, cursor));
    }
    let (name, c) = parse_identifier(cursor.bump())?;
    Ok((Some(Identifier::new(name)), c))
}

// ============================================================================
// SELECT EXPRESSIONS
// ============================================================================

/// The variant list after `->`. Each variant starts on its own line.
fn parse_variants(cursor: Cursor<'_>, ctx: ParseContext) -> ParseResult<'_, Vec<Variant>> {
    if cursor.current() != Some('\n') {
        return Err(ParseFailure::new(cursor.pos(), FailureKind::ExpectedLineEnd));
    }
    let mut variants = Vec::new();
    let mut cursor = cursor;
    while cursor.current() == Some('\n') {
        let line = cursor.skip_blank();
        let default = line.current() == Some('*');
        let key_start = if default { line.bump() } else { line };
        if key_start.current() != Some('[') {
            if default {
                return Err(ParseFailure::new(
                    key_start.pos(),
                    FailureKind::ExpectedToken('['),
                ));
            }
            break;
        }
        let (key, after_key) = parse_variant_key(key_start)?;
        let (value, end) = parse_pattern(after_key.skip_blank_inline(), ctx)?;
        let value = value.ok_or_else(|| ParseFailure::new(end.pos(), FailureKind::MissingValue))?;
        variants.push(Variant {
            key,
            value,
            default,
        });
        cursor = end;
    }
    if variants.is_empty() {
        return Err(ParseFailure::new(cursor.pos(), FailureKind::MissingVariants));
    }
    Ok((variants, cursor))
}

fn parse_variant_key(cursor: Cursor<'_>) -> ParseResult<'_, VariantKey> {
    let inner = expect_char(cursor, '[')?.skip_blank();
    let (key, after) = match inner.current() {
        Some(ch) if ch.is_ascii_digit() || ch == '-' => {
            let (number, c) = parse_number(inner)?;
            (VariantKey::NumberLiteral(number), c)
        }
        _ => {
            let (name, c) = parse_identifier(inner)?;
            (VariantKey::Identifier(Identifier::new(name)), c)
        }
    };
    let end = expect_char(after.skip_blank(), ']')?;
    Ok((key, end))
}

// ============================================================================
// CALL ARGUMENTS
// ============================================================================

enum Argument {
    Positional(Expression),
    Named(NamedArgument),
}

/// `( arg, arg, name: literal )`. Counts as one nesting level.
fn parse_call_arguments(cursor: Cursor<'_>, ctx: ParseContext) -> ParseResult<'_, CallArguments> {
    let ctx = ctx.enter(cursor.pos())?;
    let mut cursor = expect_char(cursor, '(')?.skip_blank();
    let mut positional = Vec::new();
    let mut named: Vec<NamedArgument> = Vec::new();
    while cursor.current() != Some(')') {
        let (argument, after) = parse_argument(cursor, ctx)?;
        match argument {
            Argument::Positional(expression) => {
                if !named.is_empty() {
                    return Err(ParseFailure::new(
                        cursor.pos(),
                        FailureKind::PositionalArgumentFollowsNamed,
                    ));
                }
                positional.push(expression);
            }
            Argument::Named(argument) => {
                if named.iter().any(|prev| prev.name == argument.name) {
                    return Err(ParseFailure::new(
                        cursor.pos(),
                        FailureKind::DuplicatedNamedArgument(argument.name.name),
                    ));
                }
                named.push(argument);
            }
        }
        cursor = after.skip_blank();
        match cursor.current() {
            Some(',') => cursor = cursor.bump().skip_blank(),
            Some(')') => break,
            _ => {
                return Err(ParseFailure::new(cursor.pos(), FailureKind::ExpectedToken(')'))
                    .expecting(&["\",\"", "\")\""]))
            }
        }
    }
    let end = expect_char(cursor, ')')?;
    let arguments = CallArguments::new(positional, named)
        .map_err(|error| ParseFailure::new(cursor.pos(), error.into()))?;
    Ok((arguments, end))
}

fn parse_argument(cursor: Cursor<'_>, ctx: ParseContext) -> ParseResult<'_, Argument> {
    let (expression, after) = parse_inline_expression(cursor, ctx)?;
    if let Expression::MessageReference {
        id,
        attribute: None,
    } = &expression
    {
        let colon = after.skip_blank();
        if colon.current() == Some(':') {
            let (value, end) = parse_literal(colon.bump().skip_blank())?;
            let argument = NamedArgument {
                name: id.clone(),
                value,
            };
            return Ok((Argument::Named(argument), end));
        }
    }
    Ok((Argument::Positional(expression), after))
}

fn parse_literal(cursor: Cursor<'_>) -> ParseResult<'_, Literal> {
    match cursor.current() {
        Some('"') => {
            parse_string_literal(cursor).map(|(literal, c)| (Literal::StringLiteral(literal), c))
        }
        Some(ch) if ch.is_ascii_digit() => {
            parse_number(cursor).map(|(number, c)| (Literal::NumberLiteral(number), c))
        }
        Some('-') if cursor.peek(1).is_some_and(|ch| ch.is_ascii_digit()) => {
            parse_number(cursor).map(|(number, c)| (Literal::NumberLiteral(number), c))
        }
        _ => Err(ParseFailure::new(
            cursor.pos(),
            FailureKind::NamedArgumentNotLiteral,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ParseContext {
        ParseContext::new(100)
    }

    fn pattern_text(source: &str) -> String {
        let (pattern, _) = parse_pattern(Cursor::new(source), ctx()).unwrap();
        pattern
            .unwrap()
            .elements
            .iter()
            .map(|element| match element {
                PatternElement::TextElement { value } => value.clone(),
                PatternElement::Placeable(_) => "{}".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_context_enter_limit() {
        let ctx = ParseContext::new(1);
        let inner = ctx.enter(0).unwrap();
        assert_eq!(inner.current_depth, 1);
        assert!(inner.enter(5).unwrap_err().is_depth_exceeded());
        // The outer copy is untouched.
        assert_eq!(ctx.current_depth, 0);
    }

    #[test]
    fn test_pattern_common_indent() {
        assert_eq!(pattern_text("\n    a\n      b\n    c"), "a\n  b\nc");
        assert_eq!(pattern_text("first\n  second"), "first\nsecond");
    }

    #[test]
    fn test_pattern_blank_lines_and_trailing_spaces() {
        assert_eq!(pattern_text("a\n\n\n  b   "), "a\n\n\nb");
        assert_eq!(pattern_text("a\n  \n  b"), "a\n\nb");
    }

    #[test]
    fn test_pattern_stops_at_special_line_starts() {
        for stop in ["[", "*", ".", "}"] {
            let source = format!("a\n    {stop}x");
            let (pattern, rest) = parse_pattern(Cursor::new(&source), ctx()).unwrap();
            assert_eq!(pattern, Some(Pattern::text("a")));
            assert_eq!(rest.pos(), 1);
        }
    }

    #[test]
    fn test_pattern_unbalanced_brace() {
        let err = parse_pattern(Cursor::new("a } b"), ctx()).unwrap_err();
        assert_eq!(err.kind, FailureKind::UnbalancedClosingBrace);
        assert_eq!(err.position, 2);
    }

    #[test]
    fn test_select_selector_rules() {
        let msg = parse_placeable(Cursor::new("{ msg ->\n *[a] A\n}"), ctx()).unwrap_err();
        assert_eq!(msg.kind, FailureKind::MessageReferenceAsSelector);
        let term = parse_placeable(Cursor::new("{ -t ->\n *[a] A\n}"), ctx()).unwrap_err();
        assert_eq!(term.kind, FailureKind::TermReferenceAsSelector);
        let ok = parse_placeable(Cursor::new("{ -t.gender ->\n *[a] A\n}"), ctx());
        assert!(ok.is_ok());
    }

    #[test]
    fn test_wrapped_placeables() {
        let (placeable, rest) = parse_placeable(Cursor::new("{ {{ $x }} }!"), ctx()).unwrap();
        assert_eq!(rest.pos(), 12);
        let Expression::Placeable(middle) = placeable.expression.as_ref() else {
            panic!("expected a nested placeable");
        };
        let Expression::Placeable(inner) = middle.expression.as_ref() else {
            panic!("expected a nested placeable");
        };
        assert!(matches!(
            inner.expression.as_ref(),
            Expression::VariableReference { .. }
        ));

        let select = parse_placeable(Cursor::new("{ { $x } ->\n *[a] A\n}"), ctx()).unwrap_err();
        assert_eq!(select.kind, FailureKind::ExpectedSimpleExpressionAsSelector);
        assert_eq!(select.position, 2);
        let unclosed = parse_placeable(Cursor::new("{ { $x }"), ctx()).unwrap_err();
        assert_eq!(unclosed.kind, FailureKind::ExpectedToken('}'));
    }

    #[test]
    fn test_wrapped_placeables_count_toward_nesting() {
        assert!(parse_placeable(Cursor::new("{{{1}}}"), ParseContext::new(3)).is_ok());
        let err = parse_placeable(Cursor::new("{{{{1}}}}"), ParseContext::new(3)).unwrap_err();
        assert!(err.is_depth_exceeded());
        assert_eq!(err.position, 3);
    }

    #[test]
    fn test_term_attribute_not_a_placeable() {
        let err = parse_placeable(Cursor::new("{ -t.attr }"), ctx()).unwrap_err();
        assert_eq!(err.kind, FailureKind::TermAttributeAsPlaceable);
    }

    #[test]
    fn test_call_argument_rules() {
        let named = parse_inline_expression(Cursor::new("F(1, a: \"x\", b: -2)"), ctx());
        let (expression, _) = named.unwrap();
        let Expression::FunctionReference { arguments, .. } = expression else {
            panic!("expected a function reference");
        };
        assert_eq!(arguments.positional().len(), 1);
        assert_eq!(arguments.named().len(), 2);

        let order = parse_inline_expression(Cursor::new("F(a: 1, 2)"), ctx()).unwrap_err();
        assert_eq!(order.kind, FailureKind::PositionalArgumentFollowsNamed);
        let dup = parse_inline_expression(Cursor::new("F(a: 1, a: 2)"), ctx()).unwrap_err();
        assert_eq!(dup.kind, FailureKind::DuplicatedNamedArgument("a".into()));
        let not_literal = parse_inline_expression(Cursor::new("F(a: $x)"), ctx()).unwrap_err();
        assert_eq!(not_literal.kind, FailureKind::NamedArgumentNotLiteral);
    }

    #[test]
    fn test_call_arguments_count_toward_nesting() {
        let ctx = ParseContext::new(1);
        let err = parse_placeable(Cursor::new("{ F() }"), ctx).unwrap_err();
        assert!(err.is_depth_exceeded());
    }

    #[test]
    fn test_comment_merging() {
        let (comment, rest) = parse_comment(Cursor::new("# a\n#\n# b\n## c")).unwrap();
        assert_eq!(comment.level, CommentLevel::Comment);
        assert_eq!(comment.content, "a\n\nb");
        assert_eq!(rest.pos(), 9);
    }

    #[test]
    fn test_comment_requires_space() {
        assert!(parse_comment(Cursor::new("#oops")).is_err());
        assert!(parse_comment(Cursor::new("#### deep")).is_err());
    }
}
