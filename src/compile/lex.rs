use crate::types::span::Span;

/// A lexer that splits the template source into literal text and directive
/// spans so that the compiler doesn't have to operate on raw text.
///
/// Directives are not nesting-aware: a directive is a single `{` followed by a
/// body that contains no brace and a single `}`. A doubled brace `{{` or `}}`
/// is an escape for a literal brace. Any other brace arrangement is passed
/// through as literal text, so the lexer never fails.
#[derive(Debug)]
pub struct Lexer<'source> {
    /// The original template source.
    pub source: &'source str,

    /// A cursor over the template source.
    cursor: usize,
}

/// The unit yielded by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// Literal template text, including stray braces.
    Raw,
    /// An escaped brace, `{{` or `}}`, which stands for a single brace.
    Escape,
    /// A directive, e.g. `{IF:COUNT > 0}`, the span includes both braces.
    Directive,
}

impl<'source> Lexer<'source> {
    /// Construct a new lexer.
    pub fn new(source: &'source str) -> Self {
        Self { source, cursor: 0 }
    }

    fn lex(&mut self) -> Option<(Token, Span)> {
        let i = self.cursor;
        let rest = &self.source[i..];

        if rest.is_empty() {
            return None;
        }

        // The following diagram helps describe the variable naming.
        //
        // xxxxxx{IF:COUNT}xxxx
        //       ^         ^
        //       i         j
        let (tk, j) = if rest.starts_with("{{") || rest.starts_with("}}") {
            (Token::Escape, i + 2)
        } else if rest.starts_with('{') {
            match find_brace(self.source, i + 1) {
                Some(j) if self.source.as_bytes()[j] == b'}' => (Token::Directive, j + 1),
                // A stray open brace, either unclosed or followed by another
                // open brace before any close brace.
                _ => (Token::Raw, i + 1),
            }
        } else if rest.starts_with('}') {
            (Token::Raw, i + 1)
        } else {
            let j = find_brace(self.source, i).unwrap_or(self.source.len());
            (Token::Raw, j)
        };

        self.cursor = j;
        Some((tk, Span::from(i..j)))
    }
}

impl Iterator for Lexer<'_> {
    type Item = (Token, Span);

    fn next(&mut self) -> Option<Self::Item> {
        self.lex()
    }
}

impl Token {
    /// Returns the span of the directive body, excluding the braces.
    pub fn body(self, span: Span) -> Span {
        debug_assert!(self == Token::Directive);
        Span::from(span.m + 1..span.n - 1)
    }
}

/// Returns the byte index of the next brace at or after `i`.
fn find_brace(source: &str, i: usize) -> Option<usize> {
    source[i..].find(['{', '}']).map(|d| i + d)
}
