use std::fmt;
use std::ops::Range;

/// A single point in some source text. Lines and columns are 1-indexed, with
/// columns counting characters; the offset is a byte offset into the source.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    /// The position of the very first character of a source.
    pub const START: Self = Self {
        line: 1,
        column: 1,
        offset: 0,
    };

    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A location represents a continuous range of text, optionally in a
/// particular source file. The source is identified by the file id used with
/// [`codespan_reporting::files::SimpleFiles`]-style file databases.
///
/// Locations can be combined using the `+` operator, which keeps the start of
/// the left operand and the end of the right one.
///
/// [`codespan_reporting::files::SimpleFiles`]: https://docs.rs/codespan-reporting
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Location {
    pub start: Position,
    pub end: Position,
    pub source: Option<usize>,
}

impl Location {
    pub fn new(start: Position, end: Position) -> Self {
        Self {
            start,
            end,
            source: None,
        }
    }

    /// A zero-width location at the given position.
    pub fn at(position: Position) -> Self {
        Self::new(position, position)
    }

    pub fn with_source(self, source: Option<usize>) -> Self {
        Self { source, ..self }
    }

    /// The smallest location starting where `self` starts and ending where
    /// `other` ends.
    pub fn merge(self, other: Self) -> Self {
        Self {
            start: self.start,
            end: other.end,
            source: self.source.or(other.source),
        }
    }

    /// The byte range covered by this location.
    pub fn range(&self) -> Range<usize> {
        self.start.offset..self.end.offset.max(self.start.offset)
    }
}

impl std::ops::Add for Location {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.merge(rhs)
    }
}

impl std::ops::AddAssign for Location {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
