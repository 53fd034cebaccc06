//! FTL Serializer - Canonical Source Output
//!
//! Turns a [`Resource`] back into FTL text. Output uses the canonical layout
//! (four-space indentation, one blank line between entries) and reparses into
//! an equal AST for any resource the parser produced without junk. Junk is
//! written back verbatim.

use crate::ast::{
    Attribute, CallArguments, Comment, CommentLevel, Entry, Expression, Literal, Message,
    Pattern, PatternElement, Resource, SelectExpression, Term, Variant, VariantKey,
};

const INDENT: &str = "    ";

// ============================================================================
// PUBLIC API
// ============================================================================

/// Serializes a whole resource.
///
/// # Examples
///
/// ```rust
/// use ftl_engine::syntax::{parse, serialize};
/// let source = "hello = Hello, { $name }!\n";
/// assert_eq!(serialize(&parse(source)), source);
/// ```
pub fn serialize(resource: &Resource) -> String {
    let mut out = String::new();
    let mut previous_was_junk = true;
    for entry in &resource.entries {
        match entry {
            Entry::Junk(junk) => {
                out.push_str(&junk.content);
                previous_was_junk = true;
                continue;
            }
            _ if !previous_was_junk => out.push('\n'),
            _ => {}
        }
        previous_was_junk = false;
        match entry {
            Entry::Message(message) => serialize_message(message, &mut out),
            Entry::Term(term) => serialize_term(term, &mut out),
            Entry::Comment(comment) => serialize_comment(comment, &mut out),
            Entry::Junk(_) => {}
        }
    }
    out
}

/// Serializes a pattern as it would appear after `id =` (without the leading
/// space or line break).
pub fn serialize_pattern(pattern: &Pattern) -> String {
    let mut out = String::new();
    write_pattern_body(pattern, &mut out);
    out
}

// ============================================================================
// ENTRIES
// ============================================================================

fn serialize_comment(comment: &Comment, out: &mut String) {
    let prefix = match comment.level {
        CommentLevel::Comment => "#",
        CommentLevel::Group => "##",
        CommentLevel::Resource => "###",
    };
    for line in comment.content.split('\n') {
        out.push_str(prefix);
        if !line.is_empty() {
            out.push(' ');
            out.push_str(line);
        }
        out.push('\n');
    }
}

fn serialize_message(message: &Message, out: &mut String) {
    if let Some(comment) = &message.comment {
        serialize_comment(comment, out);
    }
    out.push_str(&message.id.name);
    out.push_str(" =");
    if let Some(value) = &message.value {
        write_value(value, out);
    }
    write_attributes(&message.attributes, out);
    out.push('\n');
}

fn serialize_term(term: &Term, out: &mut String) {
    if let Some(comment) = &term.comment {
        serialize_comment(comment, out);
    }
    out.push('-');
    out.push_str(&term.id.name);
    out.push_str(" =");
    write_value(&term.value, out);
    write_attributes(&term.attributes, out);
    out.push('\n');
}

fn write_attributes(attributes: &[Attribute], out: &mut String) {
    for attribute in attributes {
        out.push('\n');
        out.push_str(INDENT);
        out.push('.');
        out.push_str(&attribute.id.name);
        out.push_str(" =");
        let mut value = String::new();
        write_value(&attribute.value, &mut value);
        out.push_str(&indent_continuations(&value));
    }
}

// ============================================================================
// PATTERNS
// ============================================================================

/// Writes ` value` for single-line patterns, or the pattern on indented lines
/// below for multiline ones.
fn write_value(pattern: &Pattern, out: &mut String) {
    let body = serialize_pattern(pattern);
    if is_multiline(pattern) {
        // A continuation line cannot start with these, so keep the first
        // line next to the `=`.
        if body.starts_with(['[', '*', '.']) {
            out.push(' ');
            out.push_str(&indent_continuations(&body));
        } else {
            out.push('\n');
            out.push_str(&indent_lines(&body));
        }
    } else {
        out.push(' ');
        out.push_str(&body);
    }
}

fn is_multiline(pattern: &Pattern) -> bool {
    pattern.elements.iter().any(|element| match element {
        PatternElement::TextElement { value } => value.contains('\n'),
        PatternElement::Placeable(placeable) => {
            matches!(*placeable.expression, Expression::SelectExpression(_))
        }
    })
}

fn write_pattern_body(pattern: &Pattern, out: &mut String) {
    for element in &pattern.elements {
        match element {
            PatternElement::TextElement { value } => write_text(value, out),
            PatternElement::Placeable(placeable) => {
                write_placeable(&placeable.expression, out);
            }
        }
    }
}

/// Braces cannot appear in text, and `[`, `*` or `.` cannot start a
/// continuation line; those are written as string literal placeables.
fn write_text(text: &str, out: &mut String) {
    let mut at_line_start = out.ends_with('\n');
    for ch in text.chars() {
        match ch {
            '{' | '}' => out.push_str(&format!("{{ \"{ch}\" }}")),
            '[' | '*' | '.' if at_line_start => out.push_str(&format!("{{ \"{ch}\" }}")),
            other => out.push(other),
        }
        at_line_start = ch == '\n';
    }
}

fn write_placeable(expression: &Expression, out: &mut String) {
    match expression {
        Expression::SelectExpression(select) => {
            out.push_str("{ ");
            write_select(select, out);
            out.push('}');
        }
        other => {
            out.push_str("{ ");
            write_expression(other, out);
            out.push_str(" }");
        }
    }
}

fn write_select(select: &SelectExpression, out: &mut String) {
    write_expression(select.selector(), out);
    out.push_str(" ->\n");
    for variant in select.variants() {
        write_variant(variant, out);
    }
}

fn write_variant(variant: &Variant, out: &mut String) {
    out.push_str(if variant.default { "   *[" } else { "    [" });
    match &variant.key {
        VariantKey::Identifier(id) => out.push_str(&id.name),
        VariantKey::NumberLiteral(number) => out.push_str(number.raw()),
    }
    out.push(']');
    let mut value = String::new();
    write_value(&variant.value, &mut value);
    out.push_str(&indent_continuations(&value));
    out.push('\n');
}

// ============================================================================
// EXPRESSIONS
// ============================================================================

fn write_expression(expression: &Expression, out: &mut String) {
    match expression {
        Expression::StringLiteral(literal) => {
            out.push('"');
            out.push_str(literal.raw());
            out.push('"');
        }
        Expression::NumberLiteral(number) => out.push_str(number.raw()),
        Expression::VariableReference { id } => {
            out.push('$');
            out.push_str(&id.name);
        }
        Expression::MessageReference { id, attribute } => {
            out.push_str(&id.name);
            if let Some(attribute) = attribute {
                out.push('.');
                out.push_str(&attribute.name);
            }
        }
        Expression::TermReference {
            id,
            attribute,
            arguments,
        } => {
            out.push('-');
            out.push_str(&id.name);
            if let Some(attribute) = attribute {
                out.push('.');
                out.push_str(&attribute.name);
            }
            if let Some(arguments) = arguments {
                write_call_arguments(arguments, out);
            }
        }
        Expression::FunctionReference { id, arguments } => {
            out.push_str(&id.name);
            write_call_arguments(arguments, out);
        }
        Expression::SelectExpression(_) | Expression::Placeable(_) => {
            write_placeable(inner_placeable(expression), out);
        }
    }
}

fn inner_placeable(expression: &Expression) -> &Expression {
    match expression {
        Expression::Placeable(placeable) => &placeable.expression,
        other => other,
    }
}

fn write_call_arguments(arguments: &CallArguments, out: &mut String) {
    out.push('(');
    let mut first = true;
    for positional in arguments.positional() {
        if !first {
            out.push_str(", ");
        }
        first = false;
        write_expression(positional, out);
    }
    for named in arguments.named() {
        if !first {
            out.push_str(", ");
        }
        first = false;
        out.push_str(&named.name.name);
        out.push_str(": ");
        match &named.value {
            Literal::StringLiteral(literal) => {
                out.push('"');
                out.push_str(literal.raw());
                out.push('"');
            }
            Literal::NumberLiteral(number) => out.push_str(number.raw()),
        }
    }
    out.push(')');
}

// ============================================================================
// LAYOUT HELPERS
// ============================================================================

/// Indents every non-empty line by one level.
fn indent_lines(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{INDENT}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Indents every line after the first by one level.
fn indent_continuations(text: &str) -> String {
    match text.split_once('\n') {
        Some((first, rest)) => format!("{first}\n{}", indent_lines(rest)),
        None => text.to_string(),
    }
}
