//! Byte regions of template source, used to point errors at directives.

use std::ops::{Index, Range};

use serde::{Deserialize, Serialize};

/// The half-open byte range `m..n` of a template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub m: usize,
    pub n: usize,
}

impl Span {
    /// The smallest span covering both spans.
    pub fn combine(self, other: Self) -> Self {
        Self {
            m: self.m.min(other.m),
            n: self.n.max(other.n),
        }
    }
}

impl Index<Span> for str {
    type Output = str;

    fn index(&self, Span { m, n }: Span) -> &str {
        &self[m..n]
    }
}

impl From<Range<usize>> for Span {
    fn from(Range { start, end }: Range<usize>) -> Self {
        Self { m: start, n: end }
    }
}
