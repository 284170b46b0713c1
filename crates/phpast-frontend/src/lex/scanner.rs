use phpast_common::Position;

/// Returned by [`Scanner::peek`] past the end of the input.
pub const END: char = '\0';

/// A character cursor over some source text, keeping track of the line,
/// column and byte offset of the current position.
#[derive(Clone, Debug)]
pub struct Scanner<'src> {
    source: &'src str,
    chars: Vec<char>,
    state: ScannerState,
}

/// A checkpoint produced by [`Scanner::save`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ScannerState {
    /// Index into the characters of the source.
    index: usize,
    line: usize,
    column: usize,
    offset: usize,
}

impl<'src> Scanner<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            state: ScannerState {
                index: 0,
                line: 1,
                column: 1,
                offset: 0,
            },
        }
    }

    /// Get the character `offset` characters ahead of the cursor, or [`END`]
    /// if that is past the end of the input.
    pub fn peek(&self, offset: usize) -> char {
        self.chars
            .get(self.state.index + offset)
            .copied()
            .unwrap_or(END)
    }

    /// Consume and return the current character.
    pub fn advance(&mut self) -> char {
        let Some(&c) = self.chars.get(self.state.index) else {
            return END;
        };

        self.state.index += 1;
        self.state.offset += c.len_utf8();

        if c == '\n' {
            self.state.line += 1;
            self.state.column = 1;
        } else {
            self.state.column += 1;
        }

        c
    }

    pub fn skip(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    /// Returns `true` if the input at the cursor starts with `text`.
    pub fn matches(&self, text: &str) -> bool {
        text.chars().enumerate().all(|(i, c)| {
            self.chars
                .get(self.state.index + i)
                .is_some_and(|&actual| actual == c)
        })
    }

    /// Like [`Scanner::matches`], but ignoring ASCII case.
    pub fn matches_ignore_case(&self, text: &str) -> bool {
        text.chars().enumerate().all(|(i, c)| {
            self.chars
                .get(self.state.index + i)
                .is_some_and(|actual| actual.eq_ignore_ascii_case(&c))
        })
    }

    /// Advance past `text` if the input at the cursor starts with it.
    pub fn consume(&mut self, text: &str) -> bool {
        if self.matches(text) {
            self.skip(text.chars().count());
            true
        } else {
            false
        }
    }

    /// Consume characters for as long as `pred` holds and return them.
    pub fn consume_while(&mut self, mut pred: impl FnMut(char) -> bool) -> String {
        let mut res = String::new();
        while !self.is_at_end() && pred(self.peek(0)) {
            res.push(self.advance());
        }
        res
    }

    /// Consume characters until `pred` holds or the input ends.
    pub fn consume_until(&mut self, mut pred: impl FnMut(char) -> bool) -> String {
        self.consume_while(|c| !pred(c))
    }

    pub fn save(&self) -> ScannerState {
        self.state
    }

    pub fn restore(&mut self, state: ScannerState) {
        self.state = state;
    }

    pub fn is_at_end(&self) -> bool {
        self.state.index >= self.chars.len()
    }

    pub fn position(&self) -> Position {
        Position::new(self.state.line, self.state.column, self.state.offset)
    }

    /// The source text between two checkpoints.
    pub fn slice(&self, from: ScannerState, to: ScannerState) -> &'src str {
        &self.source[from.offset..to.offset]
    }

    /// The source text from a checkpoint up to the cursor.
    pub fn slice_from(&self, from: ScannerState) -> &'src str {
        self.slice(from, self.state)
    }

    /// Whether the cursor is at the very start of a line.
    pub fn at_line_start(&self) -> bool {
        self.state.column == 1
    }
}

impl ScannerState {
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_lines_and_columns() {
        let mut scanner = Scanner::new("ab\ncd");
        scanner.skip(2);
        assert_eq!(Position::new(1, 3, 2), scanner.position());

        assert_eq!('\n', scanner.advance());
        assert_eq!(Position::new(2, 1, 3), scanner.position());
    }

    #[test]
    fn peek_past_end_is_sentinel() {
        let scanner = Scanner::new("x");
        assert_eq!('x', scanner.peek(0));
        assert_eq!(END, scanner.peek(1));
        assert_eq!(END, scanner.peek(100));
    }

    #[test]
    fn restore_rewinds_everything() {
        let mut scanner = Scanner::new("héllo\nworld");
        let saved = scanner.save();

        assert_eq!("héllo", scanner.consume_until(|c| c == '\n'));
        assert_eq!(6, scanner.position().offset);

        scanner.restore(saved);
        assert_eq!(Position::START, scanner.position());
        assert!(scanner.matches("hé"));
    }

    #[test]
    fn consume_only_advances_on_match() {
        let mut scanner = Scanner::new("<<<EOD");
        assert!(!scanner.consume("<<="));
        assert!(scanner.consume("<<<"));
        assert_eq!("EOD", scanner.consume_while(char::is_alphanumeric));
        assert!(scanner.is_at_end());
    }
}
