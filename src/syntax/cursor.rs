//! Immutable position-tracking view over source text.
//!
//! A `Cursor` is `Copy`: every "advance" returns a new cursor and leaves the
//! original untouched, so a rule that fails simply hands back nothing and the
//! caller keeps the cursor it started with.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor<'s> {
    source: &'s str,
    pos: usize,
}

impl<'s> Cursor<'s> {
    pub fn new(source: &'s str) -> Self {
        Self { source, pos: 0 }
    }

    /// Byte offset into the source.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn source(&self) -> &'s str {
        self.source
    }

    /// The unconsumed remainder of the source.
    pub fn rest(&self) -> &'s str {
        &self.source[self.pos..]
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// The character under the cursor, `None` at EOF.
    pub fn current(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// The character `n` positions ahead of the current one.
    pub fn peek(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.rest().starts_with(prefix)
    }

    /// Moves forward by `n` characters, stopping at EOF.
    pub fn advance(self, n: usize) -> Self {
        let rest = self.rest();
        let offset = rest
            .char_indices()
            .nth(n)
            .map(|(offset, _)| offset)
            .unwrap_or(rest.len());
        Self {
            pos: self.pos + offset,
            ..self
        }
    }

    /// Moves forward by one character.
    pub fn bump(self) -> Self {
        match self.current() {
            Some(ch) => Self {
                pos: self.pos + ch.len_utf8(),
                ..self
            },
            None => self,
        }
    }

    pub fn skip_while(self, mut predicate: impl FnMut(char) -> bool) -> Self {
        let rest = self.rest();
        let offset = rest
            .char_indices()
            .find(|&(_, ch)| !predicate(ch))
            .map(|(offset, _)| offset)
            .unwrap_or(rest.len());
        Self {
            pos: self.pos + offset,
            ..self
        }
    }

    /// Skips spaces (the only inline blank FTL recognizes).
    pub fn skip_blank_inline(self) -> Self {
        self.skip_while(|ch| ch == ' ')
    }

    /// Skips spaces and line ends.
    pub fn skip_blank(self) -> Self {
        self.skip_while(|ch| ch == ' ' || ch == '\n')
    }

    /// Source text between two byte offsets.
    pub fn slice(&self, start: usize, end: usize) -> &'s str {
        &self.source[start..end]
    }

    /// Source text consumed since `start`.
    pub fn slice_from(&self, start: Cursor<'s>) -> &'s str {
        &self.source[start.pos..self.pos]
    }
}
