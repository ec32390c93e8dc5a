use miette::SourceSpan;
use std::fmt;

/// A point in the source: byte offset plus 1-based line and column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Location {
    pub pos: usize,
    pub line: usize,
    pub col: usize,
}

impl Location {
    pub const fn new(pos: usize, line: usize, col: usize) -> Self {
        Self { pos, line, col }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Half-open source range `[start, end)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Location,
    pub end: Location,
}

impl Span {
    pub const fn new(start: Location, end: Location) -> Self {
        Self { start, end }
    }

    pub const fn point(at: Location) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end.pos.saturating_sub(self.start.pos)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both `self` and `other`.
    pub fn union(self, other: Span) -> Span {
        let start = if other.start.pos < self.start.pos {
            other.start
        } else {
            self.start
        };
        let end = if other.end.pos > self.end.pos {
            other.end
        } else {
            self.end
        };
        Span { start, end }
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.start.pos..self.end.pos).unwrap_or("")
    }

    pub fn to_source_span(&self) -> SourceSpan {
        (self.start.pos, self.len()).into()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        span.to_source_span()
    }
}
