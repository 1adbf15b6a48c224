//! Classifies the body of a directive span into one of the directive forms.

use crate::types::span::Span;

/// The words that introduce a directive and can never name a variable.
pub const KEYWORDS: &[&str] = &[
    "IF",
    "ELSEIF",
    "ELSE",
    "ENDIF",
    "SWITCH",
    "CASE",
    "ENDSWITCH",
    "FOREACH",
    "ENDFOR",
    "INCLUDE",
    "TR",
];

/// A classified directive, argument spans are absolute and trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// `{}` or a body consisting only of whitespace.
    Empty,
    /// `{// ...}`
    Comment,
    /// `{IF:cond}`
    If(Span),
    /// `{ELSEIF:cond}`
    ElseIf(Span),
    /// `{ELSE}`
    Else,
    /// `{ENDIF}`
    EndIf,
    /// `{SWITCH:expr}`
    Switch(Span),
    /// `{CASE:expr}`
    Case(Span),
    /// `{ENDSWITCH}`
    EndSwitch,
    /// `{FOREACH:expr:VAR}` or `{FOREACH:expr:KEY:VAL}`
    ForEach(Span),
    /// `{ENDFOR}`
    EndFor,
    /// `{INCLUDE:name}`
    Include(Span),
    /// `{TR:phrase}` or `{TR:phrase:arg:...}`
    Translate(Span),
    /// Any other body is an expression to echo.
    Echo(Span),
}

impl Directive {
    /// Returns the keyword used in error messages about this directive.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Empty | Self::Comment | Self::Echo(_) => "expression",
            Self::If(_) => "IF",
            Self::ElseIf(_) => "ELSEIF",
            Self::Else => "ELSE",
            Self::EndIf => "ENDIF",
            Self::Switch(_) => "SWITCH",
            Self::Case(_) => "CASE",
            Self::EndSwitch => "ENDSWITCH",
            Self::ForEach(_) => "FOREACH",
            Self::EndFor => "ENDFOR",
            Self::Include(_) => "INCLUDE",
            Self::Translate(_) => "TR",
        }
    }
}

/// Classify the directive body found at `body` in `source`.
///
/// Keyword forms are matched first: a bare closing keyword, or an opening
/// keyword followed by `:` and its argument. A body starting with `//` is a
/// comment. Everything else is an echo expression, whether or not it later
/// parses.
pub fn classify(source: &str, body: Span) -> Directive {
    let raw = &source[body];
    let trimmed_start = raw.trim_start();
    let lead = raw.len() - trimmed_start.len();
    let trimmed = trimmed_start.trim_end();

    match trimmed {
        "" => return Directive::Empty,
        "ELSE" => return Directive::Else,
        "ENDIF" => return Directive::EndIf,
        "ENDSWITCH" => return Directive::EndSwitch,
        "ENDFOR" => return Directive::EndFor,
        _ => {}
    }

    if trimmed.starts_with("//") {
        return Directive::Comment;
    }

    let word_len = trimmed
        .bytes()
        .take_while(|b| b.is_ascii_uppercase())
        .count();
    let (word, rest) = trimmed.split_at(word_len);
    let after = rest.trim_start();

    if let Some(arg) = after.strip_prefix(':') {
        let arg_trimmed = arg.trim_start();
        // Offsets relative to `raw`, the argument runs to the end of the
        // trimmed body.
        let m = lead + (trimmed.len() - arg_trimmed.len());
        let n = lead + trimmed.len();
        let span = Span::from(body.m + m..body.m + n);
        match word {
            "IF" => return Directive::If(span),
            "ELSEIF" => return Directive::ElseIf(span),
            "SWITCH" => return Directive::Switch(span),
            "CASE" => return Directive::Case(span),
            "FOREACH" => return Directive::ForEach(span),
            "INCLUDE" => return Directive::Include(span),
            "TR" => return Directive::Translate(span),
            _ => {}
        }
    }

    Directive::Echo(Span::from(body.m + lead..body.m + lead + trimmed.len()))
}
