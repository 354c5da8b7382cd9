//! Text spans and line maps for source location tracking.
//!
//! Positions are byte offsets into the UTF-8 source. Diagnostics report
//! 1-based lines and 1-based columns counted in characters.

use std::fmt;
use std::ops::Range;

/// A position in source text, measured as a byte offset from the start.
pub type TextPos = u32;

/// A half-open byte range `[start, start + length)` in source text.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct TextSpan {
    /// The byte offset where this span starts.
    pub start: TextPos,
    /// The length of this span in bytes.
    pub length: TextPos,
}

impl TextSpan {
    #[inline]
    pub fn new(start: TextPos, length: TextPos) -> Self {
        Self { start, length }
    }

    /// Create a span from start and end positions.
    #[inline]
    pub fn from_bounds(start: TextPos, end: TextPos) -> Self {
        debug_assert!(end >= start);
        Self {
            start,
            length: end.saturating_sub(start),
        }
    }

    /// Create an empty span at a position.
    #[inline]
    pub fn empty(pos: TextPos) -> Self {
        Self { start: pos, length: 0 }
    }

    /// The end position of this span (exclusive).
    #[inline]
    pub fn end(&self) -> TextPos {
        self.start + self.length
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    #[inline]
    pub fn contains(&self, pos: TextPos) -> bool {
        pos >= self.start && pos < self.end()
    }

    /// Whether `other` lies entirely within this span.
    #[inline]
    pub fn covers(&self, other: &TextSpan) -> bool {
        other.start >= self.start && other.end() <= self.end()
    }

    #[inline]
    pub fn to_range(&self) -> Range<usize> {
        self.start as usize..self.end() as usize
    }

    /// Return a new span covering both this span and the other.
    pub fn union(&self, other: &TextSpan) -> TextSpan {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        TextSpan::from_bounds(start, end)
    }
}

impl fmt::Debug for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}

/// A 1-based line and column pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
}

impl SourcePosition {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.line, self.column)
    }
}

/// Whether `ch` terminates a line. `\r\n` counts once (see [`LineMap::new`]).
#[inline]
pub fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{0085}' | '\u{2028}' | '\u{2029}')
}

/// Byte offsets of line starts, used to turn offsets into line/column pairs.
///
/// A lone `\r` ends a line just like `\n` and `\r\n`.
#[derive(Debug, Clone)]
pub struct LineMap {
    line_starts: Vec<TextPos>,
    text: String,
}

impl LineMap {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0u32];
        let mut chars = text.char_indices().peekable();
        while let Some((i, ch)) = chars.next() {
            if !is_line_terminator(ch) {
                continue;
            }
            if ch == '\r' {
                if let Some(&(_, '\n')) = chars.peek() {
                    continue;
                }
            }
            line_starts.push((i + ch.len_utf8()) as u32);
        }
        Self {
            line_starts,
            text: text.to_string(),
        }
    }

    /// The 0-based line index containing `pos`.
    pub fn line_index(&self, pos: TextPos) -> usize {
        match self.line_starts.binary_search(&pos) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        }
    }

    /// Convert a byte offset to a 1-based line and character column.
    pub fn position_of(&self, pos: TextPos) -> SourcePosition {
        let line = self.line_index(pos);
        let line_start = self.line_starts[line] as usize;
        let end = (pos as usize).min(self.text.len());
        let column = self
            .text
            .get(line_start..end)
            .map(|s| s.chars().count())
            .unwrap_or(end.saturating_sub(line_start));
        SourcePosition::new(line as u32 + 1, column as u32 + 1)
    }

    /// The byte offset of a 1-based line's first character.
    pub fn line_start(&self, line: u32) -> Option<TextPos> {
        self.line_starts.get(line.checked_sub(1)? as usize).copied()
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_span() {
        let span = TextSpan::new(5, 10);
        assert_eq!(span.end(), 15);
        assert!(span.contains(5));
        assert!(span.contains(14));
        assert!(!span.contains(15));
        assert!(span.covers(&TextSpan::new(6, 2)));
        assert!(!span.covers(&TextSpan::new(14, 2)));
    }

    #[test]
    fn test_union() {
        let a = TextSpan::from_bounds(2, 4);
        let b = TextSpan::from_bounds(8, 9);
        assert_eq!(a.union(&b), TextSpan::from_bounds(2, 9));
    }

    #[test]
    fn test_line_map_mixed_terminators() {
        let map = LineMap::new("a\nb\r\nc\rd");
        assert_eq!(map.line_count(), 4);
        assert_eq!(map.position_of(0), SourcePosition::new(1, 1));
        assert_eq!(map.position_of(2), SourcePosition::new(2, 1));
        assert_eq!(map.position_of(5), SourcePosition::new(3, 1));
        assert_eq!(map.position_of(7), SourcePosition::new(4, 1));
    }

    #[test]
    fn test_columns_count_characters() {
        let map = LineMap::new("é x");
        // 'é' is two bytes; 'x' is at byte 3 but character column 3.
        assert_eq!(map.position_of(3), SourcePosition::new(1, 3));
    }
}
