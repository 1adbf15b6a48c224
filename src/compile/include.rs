//! Inline include expansion.
//!
//! Each `{INCLUDE:name}` directive is replaced textually with the source of
//! the named template before the result is compiled as a whole. Expansion
//! restarts from the top after every replacement so that includes inside
//! included templates are expanded too.

use crate::compile::directive::{self, Directive};
use crate::compile::lex::{Lexer, Token};
use crate::loader::Loader;
use crate::types::span::Span;
use crate::{Error, Result};

/// Expand inline includes until none are left.
///
/// Fails if more than `max` expansions are needed, which is always the case
/// for a template that includes itself.
pub fn expand(loader: &dyn Loader, mut source: String, max: usize) -> Result<String> {
    let mut count = 0;
    while let Some((span, name)) = find_include(&source) {
        let name = source.as_str()[name].to_owned();
        if name.is_empty() {
            return Err(Error::syntax("expected template name", &source, span));
        }
        if count == max {
            return Err(Error::include_expansions(max, &source, span));
        }
        let text = loader
            .load(&name)
            .ok_or_else(|| Error::missing_include(&name, &source, span))?;
        tracing::debug!(include = %name, bytes = text.len(), "expanding inline include");
        source.replace_range(span.m..span.n, &text);
        count += 1;
    }
    Ok(source)
}

/// Returns the span of the first include directive and of its name.
///
/// The same lexer as the compiler is used so that escaped braces never start
/// an include.
fn find_include(source: &str) -> Option<(Span, Span)> {
    Lexer::new(source).find_map(|(tk, span)| match tk {
        Token::Directive => match directive::classify(source, tk.body(span)) {
            Directive::Include(name) => Some((span, name)),
            _ => None,
        },
        _ => None,
    })
}
