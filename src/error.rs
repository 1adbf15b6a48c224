use std::cmp::max;
use std::error::Error as StdError;
use std::fmt;
use std::io;

use crate::types::span::Span;

/// The category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A directive matched none of the recognized forms, or an expression
    /// inside a directive could not be parsed.
    Syntax,
    /// The loader could not resolve the root template or an `INCLUDE` target.
    MissingTemplate,
    /// An `IF`, `SWITCH` or `FOREACH` block was not closed, or a closing
    /// directive had no matching opening directive.
    UnresolvedBlock,
    /// Inline include expansion or delegated rendering exceeded its bound.
    IncludeLimit,
    /// The compiled program failed while rendering.
    Render,
    /// Reading or publishing a cached artifact failed.
    Io,
    /// Converting a render context or a cached artifact failed.
    Serialize,
}

/// An error that can occur during template compilation or rendering.
pub struct Error {
    kind: ErrorKind,
    name: Option<String>,
    msg: String,
    span: Option<(String, Span)>,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl Error {
    fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            name: None,
            msg: msg.into(),
            span: None,
            source: None,
        }
    }

    fn with_span(mut self, source: &str, span: impl Into<Span>) -> Self {
        self.span = Some((source.to_owned(), span.into()));
        self
    }

    pub(crate) fn syntax(msg: impl Into<String>, source: &str, span: impl Into<Span>) -> Self {
        Self::new(ErrorKind::Syntax, msg).with_span(source, span)
    }

    pub(crate) fn unresolved_block(
        msg: impl Into<String>,
        source: &str,
        span: impl Into<Span>,
    ) -> Self {
        Self::new(ErrorKind::UnresolvedBlock, msg).with_span(source, span)
    }

    pub(crate) fn missing_template(name: &str) -> Self {
        Self::new(ErrorKind::MissingTemplate, format!("unknown template `{name}`"))
    }

    pub(crate) fn missing_include(name: &str, source: &str, span: impl Into<Span>) -> Self {
        Self::missing_template(name).with_span(source, span)
    }

    pub(crate) fn include_expansions(max: usize, source: &str, span: impl Into<Span>) -> Self {
        Self::new(
            ErrorKind::IncludeLimit,
            format!("reached maximum of {max} inline include expansions"),
        )
        .with_span(source, span)
    }

    pub(crate) fn max_include_depth(max: usize) -> Self {
        Self::new(
            ErrorKind::IncludeLimit,
            format!("reached maximum include depth ({max})"),
        )
    }

    pub(crate) fn render(msg: impl Into<String>, source: &str, span: impl Into<Span>) -> Self {
        let e = Self::new(ErrorKind::Render, msg);
        if source.is_empty() {
            e
        } else {
            e.with_span(source, span)
        }
    }

    /// A render error without a location, e.g. raised by a function. The
    /// renderer attaches the call site when it has one.
    pub(crate) fn runtime(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Render, msg)
    }

    pub(crate) fn io(msg: impl Into<String>, err: io::Error) -> Self {
        let mut e = Self::new(ErrorKind::Io, msg);
        e.source = Some(Box::new(err));
        e
    }

    pub(crate) fn serde(msg: impl Into<String>, err: serde_json::Error) -> Self {
        let mut e = Self::new(ErrorKind::Serialize, msg);
        e.source = Some(Box::new(err));
        e
    }

    /// Attaches a template name to the error if it does not already have one.
    pub(crate) fn with_template_name(mut self, name: &str) -> Self {
        if self.name.is_none() && !name.is_empty() {
            self.name = Some(name.to_owned());
        }
        self
    }

    /// Attaches a span to an error raised without one, e.g. by a function.
    pub(crate) fn enrich(mut self, source: &str, span: Span) -> Self {
        if self.span.is_none() && !source.is_empty() {
            self.span = Some((source.to_owned(), span));
        }
        self
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the name of the template in which the error occurred, if known.
    pub fn template_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the bare error message without any source context.
    pub fn message(&self) -> &str {
        &self.msg
    }
}

impl serde::ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Self::new(ErrorKind::Serialize, msg.to_string())
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Self::new(ErrorKind::Render, "failed to write rendered output")
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::io("failed to write rendered output", err)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|s| &**s as &(dyn StdError + 'static))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some((source, span)) => fmt_pretty(self, source, *span, f),
            None => fmt::Display::fmt(self, f),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some((source, span)) if f.alternate() => fmt_pretty(self, source, *span, f),
            Some((_, span)) => {
                write!(f, "{} between bytes {} and {}", self.msg, span.m, span.n)?;
                if let Some(name) = &self.name {
                    write!(f, " in template `{name}`")?;
                }
                Ok(())
            }
            None => {
                f.write_str(&self.msg)?;
                if let Some(name) = &self.name {
                    write!(f, " in template `{name}`")?;
                }
                if let Some(source) = &self.source {
                    write!(f, ": {source}")?;
                }
                Ok(())
            }
        }
    }
}

fn fmt_pretty(err: &Error, source: &str, span: Span, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let lines: Vec<_> = source.split_terminator('\n').collect();
    let (line, col) = to_line_col(&lines, span.m);
    let width = max(1, str_width(&source[span.m..span.n.min(source.len())]));
    let code = lines.get(line).copied().unwrap_or("");

    let num = (line + 1).to_string();
    let pad = str_width(&num);
    let pipe = "|";
    let underline = "^".repeat(width);

    if let Some(name) = &err.name {
        write!(f, "\n {0:pad$}--> {name}:{num}:{col}", "", col = col + 1)?;
    }

    write!(
        f,
        "\n \
        {0:pad$} {pipe}\n \
        {num:>} {pipe} {code}\n \
        {0:pad$} {pipe} {underline:>width$} {msg}\n",
        "",
        pad = pad,
        pipe = pipe,
        num = num,
        code = code,
        underline = underline,
        width = col + width,
        msg = err.msg
    )
}

fn to_line_col(lines: &[&str], offset: usize) -> (usize, usize) {
    let mut n = 0;
    for (i, line) in lines.iter().enumerate() {
        let len = line.len() + 1;
        if n + len > offset {
            return (i, str_width(&line[..offset - n]));
        }
        n += len;
    }
    let last = lines.len().saturating_sub(1);
    (last, lines.last().map(|l| str_width(l)).unwrap_or(0))
}

#[cfg(feature = "unicode")]
fn str_width(s: &str) -> usize {
    unicode_width::UnicodeWidthStr::width(s)
}

#[cfg(not(feature = "unicode"))]
fn str_width(s: &str) -> usize {
    s.chars().count()
}
