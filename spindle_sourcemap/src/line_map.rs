use std::fmt;

use crate::Span;

/// A 1-based line/column location in a source string.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Precomputed line starts for a single source string, used to convert
/// byte positions back into line/column locations.
#[derive(Clone, Debug)]
pub struct LineMap {
    span_base: u32,
    line_starts: Vec<u32>,
}

impl LineMap {
    /// Builds a line map over `source`, whose first byte sits at `span_base`.
    pub fn new(source: &str, span_base: u32) -> Self {
        let mut line_starts = vec![span_base];
        for (idx, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(span_base + idx as u32 + 1);
            }
        }

        LineMap {
            span_base,
            line_starts,
        }
    }

    /// Returns the location of a byte position. Positions past the end of the
    /// source land on the last line.
    pub fn location(&self, pos: u32) -> Location {
        let line_idx = match self.line_starts.binary_search(&pos) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };

        Location {
            line: line_idx as u32 + 1,
            column: pos - self.line_starts[line_idx] + 1,
        }
    }

    /// Returns the location of the start of a span.
    pub fn span_location(&self, span: Span) -> Location {
        self.location(span.base.max(self.span_base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locates_lines_and_columns() {
        let map = LineMap::new("ab\ncd\n\nf", 0);

        assert_eq!(map.location(0), Location { line: 1, column: 1 });
        assert_eq!(map.location(1), Location { line: 1, column: 2 });
        assert_eq!(map.location(3), Location { line: 2, column: 1 });
        assert_eq!(map.location(6), Location { line: 3, column: 1 });
        assert_eq!(map.location(7), Location { line: 4, column: 1 });
    }

    #[test]
    fn respects_span_base() {
        let map = LineMap::new("ab\ncd", 10);

        assert_eq!(map.location(10), Location { line: 1, column: 1 });
        assert_eq!(map.location(13), Location { line: 2, column: 1 });
    }
}
