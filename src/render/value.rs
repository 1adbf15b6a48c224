//! Loose scalar semantics used while evaluating expressions.
//!
//! Values convert between strings, numbers and booleans the way a template
//! author expects from a dynamically typed language: `"0"` is falsy, a
//! numeric string compares equal to the number, and `null` renders as an
//! empty string.

use std::borrow::Cow;
use std::cmp::Ordering;

use crate::Value;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn to_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    pub fn to_i64(self) -> i64 {
        match self {
            Self::Int(i) => i,
            Self::Float(f) => f as i64,
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Int(i) => Value::Integer(i),
            Self::Float(f) => Value::Float(f),
        }
    }

    fn cmp(self, other: Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.to_f64().partial_cmp(&b.to_f64()),
        }
    }
}

impl Value {
    pub(crate) fn is_truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Integer(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::String(s) => !(s.is_empty() || s == "0"),
            Self::List(l) => !l.is_empty(),
            Self::Map(m) => !m.is_empty(),
        }
    }

    /// Returns the text this value renders as, lists and maps have none.
    pub(crate) fn to_text(&self) -> Option<Cow<'_, str>> {
        let s = match self {
            Self::None | Self::Bool(false) => Cow::Borrowed(""),
            Self::Bool(true) => Cow::Borrowed("1"),
            Self::Integer(i) => Cow::Owned(i.to_string()),
            Self::Float(f) => Cow::Owned(format_float(*f)),
            Self::String(s) => Cow::Borrowed(s.as_str()),
            Self::List(_) | Self::Map(_) => return None,
        };
        Some(s)
    }

    /// Returns the number used for arithmetic, lists and maps have none.
    ///
    /// Strings use their leading numeric prefix, or zero.
    pub(crate) fn to_number(&self) -> Option<Number> {
        let n = match self {
            Self::None => Number::Int(0),
            Self::Bool(b) => Number::Int(i64::from(*b)),
            Self::Integer(i) => Number::Int(*i),
            Self::Float(f) => Number::Float(*f),
            Self::String(s) => numeric_prefix(s),
            Self::List(_) | Self::Map(_) => return None,
        };
        Some(n)
    }
}

/// Formats a float with at most 14 significant digits, without trailing
/// zeros.
pub fn format_float(f: f64) -> String {
    if !f.is_finite() {
        return match f {
            f if f.is_nan() => String::from("NAN"),
            f if f > 0.0 => String::from("INF"),
            _ => String::from("-INF"),
        };
    }
    if f == 0.0 {
        return String::from("0");
    }
    let magnitude = f.abs().log10().floor() as i32;
    let decimals = 13 - magnitude;
    if !(0..=17).contains(&decimals) {
        return f.to_string();
    }
    let s = format!("{:.*}", decimals as usize, f);
    let s = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        &s
    };
    match s {
        "-0" => String::from("0"),
        s => s.to_owned(),
    }
}

/// Parses a string that is numeric in its entirety, ignoring surrounding
/// whitespace.
pub fn parse_numeric(s: &str) -> Option<Number> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit() || b"+-.eE".contains(&b)) {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::Int(i));
    }
    // Rust also accepts `inf` and `nan` but those were excluded above.
    s.parse::<f64>().ok().map(Number::Float)
}

/// Parses the longest numeric prefix of a string, or zero.
fn numeric_prefix(s: &str) -> Number {
    let t = s.trim_start();
    let bytes = t.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits_start = end;
    while bytes.get(end).map_or(false, u8::is_ascii_digit) {
        end += 1;
    }
    let int_end = end;
    if bytes.get(end) == Some(&b'.') {
        let mut frac = end + 1;
        while bytes.get(frac).map_or(false, u8::is_ascii_digit) {
            frac += 1;
        }
        if frac > end + 1 || int_end > digits_start {
            end = frac;
        }
    }
    if end > digits_start && matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = exp;
        while bytes.get(exp).map_or(false, u8::is_ascii_digit) {
            exp += 1;
        }
        if exp > exp_digits {
            end = exp;
        }
    }
    match parse_numeric(&t[..end]) {
        Some(n) => n,
        None => Number::Int(0),
    }
}

/// Loose equality, `==`.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(x, y)| loose_eq(x, y))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, x)| y.get(k).map_or(false, |y| loose_eq(x, y)))
        }
        _ => loose_cmp(a, b) == Some(Ordering::Equal),
    }
}

/// Loose ordering used by `<`, `<=`, `>` and `>=`.
///
/// Returns `None` when the values are not comparable.
pub fn loose_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    use Value::*;

    match (a, b) {
        (None, String(s)) => Some("".cmp(s.as_str())),
        (String(s), None) => Some(s.as_str().cmp("")),
        (Bool(_) | None, _) | (_, Bool(_) | None) => Some(a.is_truthy().cmp(&b.is_truthy())),
        (String(x), String(y)) => match (parse_numeric(x), parse_numeric(y)) {
            (Some(x), Some(y)) => x.cmp(y),
            _ => Some(x.cmp(y)),
        },
        (Integer(_) | Float(_), String(s)) => match parse_numeric(s) {
            Some(n) => a.to_number()?.cmp(n),
            Option::None => Some(a.to_text()?.as_ref().cmp(s.as_str())),
        },
        (String(s), Integer(_) | Float(_)) => match parse_numeric(s) {
            Some(n) => n.cmp(b.to_number()?),
            Option::None => Some(s.as_str().cmp(b.to_text()?.as_ref())),
        },
        (Integer(_) | Float(_), Integer(_) | Float(_)) => a.to_number()?.cmp(b.to_number()?),
        (List(x), List(y)) => Some(x.len().cmp(&y.len())),
        (Map(x), Map(y)) => Some(x.len().cmp(&y.len())),
        // A list or map is always greater than a scalar.
        (List(_) | Map(_), _) => Some(Ordering::Greater),
        (_, List(_) | Map(_)) => Some(Ordering::Less),
    }
}
