//! FTL Parser - Fault-Tolerant Resource Driver
//!
//! Converts FTL source text into a [`Resource`]. The parser never fails: any
//! entry that does not parse becomes a `Junk` entry covering the original text
//! up to the next blank line or line that could start an entry, and parsing
//! resumes there.
//!
//! Limits from [`ParserConfig`] bound the work done on hostile input: sources
//! larger than `max_source_size` are not parsed at all, and after
//! `max_parse_errors` junk entries the rest of the source is kept as one final
//! junk entry.
//!
//! Entries are parsed on the caller's stack up to a small nesting bound. An
//! entry nested deeper than that is parsed again on a scoped thread whose
//! stack is sized for `max_nesting_depth`, so the configured limit holds
//! whatever stack the caller runs on.

use std::borrow::Cow;

use tracing::{debug, warn};

use crate::ast::{
    Annotation, AnnotationCode, Comment, CommentLevel, Entry, Junk, Resource, Span,
};
use crate::config::ParserConfig;
use crate::syntax::cursor::Cursor;
use crate::syntax::error::{FailureKind, ParseFailure};
use crate::syntax::primitives::ParseResult;
use crate::syntax::rules::{parse_entry, ParseContext};

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parses FTL source with the default limits.
///
/// # Examples
///
/// ```rust
/// use ftl_engine::syntax::parse;
/// let resource = parse("hello = Hello, { $name }!\n");
/// assert_eq!(resource.messages().count(), 1);
/// assert!(!resource.has_errors());
/// ```
pub fn parse(source: &str) -> Resource {
    parse_with_config(source, &ParserConfig::default())
}

/// Parses FTL source with explicit limits.
pub fn parse_with_config(source: &str, config: &ParserConfig) -> Resource {
    if config.max_source_size != 0 && source.len() > config.max_source_size {
        warn!(
            size = source.len(),
            limit = config.max_source_size,
            "FTL source exceeds the size limit; not parsed"
        );
        return oversized(source, config.max_source_size);
    }
    let normalized = normalize_line_endings(source);
    let resource = ResourceParser::new(&normalized, config).run();
    debug!(
        entries = resource.entries.len(),
        junk = resource.junk().count(),
        "parsed FTL resource"
    );
    resource
}

/// Converts CRLF and lone CR line endings to LF.
pub fn normalize_line_endings(source: &str) -> Cow<'_, str> {
    if source.contains('\r') {
        Cow::Owned(source.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(source)
    }
}

fn oversized(source: &str, limit: usize) -> Resource {
    let span = Span::new(0, source.len());
    let junk = Junk {
        content: source.to_string(),
        annotations: vec![Annotation {
            code: AnnotationCode::SourceTooLarge,
            message: format!(
                "source is {} bytes, larger than the limit of {limit}",
                source.len()
            ),
            span,
        }],
        span,
    };
    Resource {
        entries: vec![Entry::Junk(junk)],
    }
}

// ============================================================================
// RESOURCE DRIVER
// ============================================================================

/// A `#` comment waiting to see whether a message or term follows directly.
struct PendingComment {
    comment: Comment,
    end: usize,
}

struct ResourceParser<'s> {
    source: &'s str,
    config: &'s ParserConfig,
    entries: Vec<Entry>,
    junk_count: usize,
    pending: Option<PendingComment>,
}

impl<'s> ResourceParser<'s> {
    fn new(source: &'s str, config: &'s ParserConfig) -> Self {
        Self {
            source,
            config,
            entries: Vec::new(),
            junk_count: 0,
            pending: None,
        }
    }

    fn run(mut self) -> Resource {
        let ctx = ParseContext::new(self.config.max_nesting_depth.min(INLINE_NESTING));
        let mut cursor = skip_blank_lines(Cursor::new(self.source));
        while !cursor.is_eof() {
            let start = cursor;
            let parsed = match parse_full_entry(start, ctx) {
                Err(failure)
                    if failure.is_depth_exceeded()
                        && ctx.max_nesting_depth < self.config.max_nesting_depth =>
                {
                    parse_deep_entry(start, self.config.max_nesting_depth, failure)
                }
                parsed => parsed,
            };
            match parsed {
                Ok((entry, next)) => {
                    self.push_entry(entry, start.pos(), next.pos());
                    cursor = next;
                }
                Err(failure) => {
                    let next = next_entry_start(start);
                    if !self.push_junk(start.pos(), next.pos(), failure) {
                        break;
                    }
                    cursor = next;
                }
            }
            cursor = skip_blank_lines(cursor);
        }
        self.flush_comment();
        Resource {
            entries: self.entries,
        }
    }

    fn push_entry(&mut self, entry: Entry, start: usize, end: usize) {
        match entry {
            Entry::Comment(comment) if comment.level == CommentLevel::Comment => {
                self.flush_comment();
                self.pending = Some(PendingComment { comment, end });
            }
            Entry::Message(mut message) => {
                message.comment = self.take_adjacent_comment(start);
                self.entries.push(Entry::Message(message));
            }
            Entry::Term(mut term) => {
                term.comment = self.take_adjacent_comment(start);
                self.entries.push(Entry::Term(term));
            }
            other => {
                self.flush_comment();
                self.entries.push(other);
            }
        }
    }

    /// Hands out the pending comment if it ends on the line right above
    /// `start`; otherwise it becomes a standalone entry.
    fn take_adjacent_comment(&mut self, start: usize) -> Option<Comment> {
        match self.pending.take() {
            Some(pending) if pending.end == start => Some(pending.comment),
            Some(pending) => {
                self.entries.push(Entry::Comment(pending.comment));
                None
            }
            None => None,
        }
    }

    fn flush_comment(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.entries.push(Entry::Comment(pending.comment));
        }
    }

    /// Records junk for `start..end`. Returns false once the error limit is hit,
    /// in which case the junk has been extended to the end of the source.
    fn push_junk(&mut self, start: usize, end: usize, failure: ParseFailure) -> bool {
        self.flush_comment();
        self.junk_count += 1;
        let mut junk = Junk {
            content: self.source[start..end].to_string(),
            annotations: vec![annotation_for(&failure, self.source.len())],
            span: Span::new(start, end),
        };
        let limit = self.config.max_parse_errors;
        let limit_hit = limit != 0 && self.junk_count >= limit && end < self.source.len();
        if limit_hit {
            warn!(
                limit,
                offset = end,
                "too many FTL syntax errors; the rest of the source is kept as junk"
            );
            let total = self.source.len();
            junk.content = self.source[start..].to_string();
            junk.span = Span::new(start, total);
            junk.annotations.push(Annotation {
                code: AnnotationCode::ParseErrorLimit,
                message: format!("parsing stopped after {limit} errors"),
                span: Span::new(end, total),
            });
        }
        debug!(
            start,
            end = junk.span.end,
            reason = %failure,
            "recovered from FTL syntax error"
        );
        self.entries.push(Entry::Junk(junk));
        !limit_hit
    }
}

fn annotation_for(failure: &ParseFailure, source_len: usize) -> Annotation {
    let code = if failure.is_depth_exceeded() {
        AnnotationCode::NestingDepthExceeded
    } else {
        AnnotationCode::ParseJunk
    };
    let start = failure.position.min(source_len);
    Annotation {
        code,
        message: failure.to_string(),
        span: Span::new(start, (start + 1).min(source_len)),
    }
}

// ============================================================================
// DEEP ENTRIES
// ============================================================================

/// Nesting parsed on the caller's stack. Entries nested deeper than this are
/// parsed again on a dedicated thread sized for the configured limit.
const INLINE_NESTING: usize = 32;
const STACK_PER_LEVEL: usize = 32 * 1024;
const BASE_STACK: usize = 256 * 1024;

/// One entry plus the line end that must follow it.
fn parse_full_entry(start: Cursor<'_>, ctx: ParseContext) -> ParseResult<'_, Entry> {
    parse_entry(start, ctx).and_then(|(entry, end)| Ok((entry, line_end(end)?)))
}

/// Re-parses an entry that broke the inline nesting bound with the full
/// limit, on a thread whose stack grows with that limit. If the thread cannot
/// be spawned the inline failure stands.
fn parse_deep_entry<'s>(
    start: Cursor<'s>,
    max_nesting_depth: usize,
    inline_failure: ParseFailure,
) -> ParseResult<'s, Entry> {
    let stack_size = max_nesting_depth
        .saturating_mul(STACK_PER_LEVEL)
        .saturating_add(BASE_STACK);
    debug!(
        offset = start.pos(),
        max_nesting_depth,
        stack_size,
        "deeply nested FTL entry; parsing on a dedicated thread"
    );
    let span = tracing::Span::current();
    let ctx = ParseContext::new(max_nesting_depth);
    std::thread::scope(|scope| {
        let spawned = std::thread::Builder::new()
            .name("ftl-parse".to_string())
            .stack_size(stack_size)
            .spawn_scoped(scope, || span.in_scope(|| parse_full_entry(start, ctx)));
        match spawned {
            Ok(handle) => handle
                .join()
                .unwrap_or_else(|payload| std::panic::resume_unwind(payload)),
            Err(error) => {
                warn!(
                    %error,
                    inline_limit = INLINE_NESTING,
                    "could not spawn the FTL parser thread; keeping the inline nesting limit"
                );
                Err(inline_failure)
            }
        }
    })
}

// ============================================================================
// LINE HELPERS
// ============================================================================

/// An entry must be followed by a line end or EOF.
fn line_end(cursor: Cursor<'_>) -> Result<Cursor<'_>, ParseFailure> {
    match cursor.current() {
        None => Ok(cursor),
        Some('\n') => Ok(cursor.bump()),
        Some(_) => Err(ParseFailure::new(cursor.pos(), FailureKind::ExpectedLineEnd)),
    }
}

/// Skips whole lines that hold nothing but spaces.
fn skip_blank_lines(cursor: Cursor<'_>) -> Cursor<'_> {
    let mut cursor = cursor;
    loop {
        let content = cursor.skip_blank_inline();
        match content.current() {
            Some('\n') => cursor = content.bump(),
            None => return content,
            Some(_) => return cursor,
        }
    }
}

/// Where junk starting at `cursor` ends: the start of the first following
/// line that is blank or begins with `[a-zA-Z]`, `-` or `#`, or EOF. Always
/// moves past at least one line.
fn next_entry_start(cursor: Cursor<'_>) -> Cursor<'_> {
    let mut cursor = cursor;
    loop {
        cursor = cursor.skip_while(|ch| ch != '\n');
        if cursor.is_eof() {
            return cursor;
        }
        cursor = cursor.bump();
        match cursor.skip_blank_inline().current() {
            None | Some('\n') => return cursor,
            _ => {}
        }
        match cursor.current() {
            Some(ch) if ch.is_ascii_alphabetic() || ch == '-' || ch == '#' => return cursor,
            _ => {}
        }
    }
}
