//! Builtin functions.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::functions::{self, FunctionFn};
use crate::render::value::loose_eq;
use crate::Value;

type Args<'a> = &'a [Value];

pub fn register(functions: &mut BTreeMap<String, Box<FunctionFn>>) {
    let builtins: [(&str, fn(Args<'_>) -> Result<Value, String>); 15] = [
        ("count", count),
        ("strlen", strlen),
        ("strtolower", strtolower),
        ("strtoupper", strtoupper),
        ("ucfirst", ucfirst),
        ("trim", trim),
        ("htmlspecialchars", htmlspecialchars),
        ("urlencode", urlencode),
        ("nl2br", nl2br),
        ("implode", implode),
        ("substr", substr),
        ("number_format", number_format),
        ("empty", empty),
        ("isset", isset),
        ("in_array", in_array),
    ];
    for (name, f) in builtins {
        functions.insert(name.to_owned(), functions::new(f));
    }
}

/// Returns the number of elements in a list or map, or 1 for a scalar and 0
/// for `null`.
pub fn count(args: Args<'_>) -> Result<Value, String> {
    arity("count", args, 1, 1)?;
    let n = match &args[0] {
        Value::None => 0,
        Value::List(l) => l.len(),
        Value::Map(m) => m.len(),
        _ => 1,
    };
    Ok(Value::from(n))
}

/// Returns the length of a string in bytes.
pub fn strlen(args: Args<'_>) -> Result<Value, String> {
    arity("strlen", args, 1, 1)?;
    Ok(Value::from(text(args, 0)?.len()))
}

pub fn strtolower(args: Args<'_>) -> Result<Value, String> {
    arity("strtolower", args, 1, 1)?;
    Ok(Value::from(text(args, 0)?.to_lowercase()))
}

pub fn strtoupper(args: Args<'_>) -> Result<Value, String> {
    arity("strtoupper", args, 1, 1)?;
    Ok(Value::from(text(args, 0)?.to_uppercase()))
}

/// Uppercases the first character of a string.
pub fn ucfirst(args: Args<'_>) -> Result<Value, String> {
    arity("ucfirst", args, 1, 1)?;
    let s = text(args, 0)?;
    let mut chars = s.chars();
    let result: String = match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    };
    Ok(Value::from(result))
}

pub fn trim(args: Args<'_>) -> Result<Value, String> {
    arity("trim", args, 1, 1)?;
    Ok(Value::from(text(args, 0)?.trim()))
}

/// Escapes `&`, `<`, `>`, `"` and `'` for use in HTML.
pub fn htmlspecialchars(args: Args<'_>) -> Result<Value, String> {
    arity("htmlspecialchars", args, 1, 1)?;
    let s = text(args, 0)?;
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            c => escaped.push(c),
        }
    }
    Ok(Value::from(escaped))
}

/// Percent-encodes a string for use in a query string, spaces become `+`.
pub fn urlencode(args: Args<'_>) -> Result<Value, String> {
    arity("urlencode", args, 1, 1)?;
    let s = text(args, 0)?;
    let mut encoded = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' => {
                encoded.push(b as char)
            }
            b' ' => encoded.push('+'),
            b => {
                let _ = write!(encoded, "%{b:02X}");
            }
        }
    }
    Ok(Value::from(encoded))
}

/// Inserts `<br />` before every newline.
pub fn nl2br(args: Args<'_>) -> Result<Value, String> {
    arity("nl2br", args, 1, 1)?;
    let s = text(args, 0)?;
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                result.push_str("<br />\r\n");
            }
            '\n' | '\r' => {
                result.push_str("<br />");
                result.push(c);
            }
            c => result.push(c),
        }
    }
    Ok(Value::from(result))
}

/// Joins the values of a list or map with a separator.
///
/// Called as `implode(separator, list)` or `implode(list)`.
pub fn implode(args: Args<'_>) -> Result<Value, String> {
    arity("implode", args, 1, 2)?;
    let (sep, items) = match args {
        [sep, items] => {
            let sep = sep.to_text().ok_or_else(|| {
                format!("implode: expected string separator, found {}", sep.human())
            })?;
            (sep, items)
        }
        _ => (Cow::Borrowed(""), &args[0]),
    };
    let values: Vec<&Value> = match items {
        Value::List(l) => l.iter().collect(),
        Value::Map(m) => m.values().collect(),
        v => return Err(format!("implode: expected list, found {}", v.human())),
    };
    let mut joined = String::new();
    for (i, v) in values.into_iter().enumerate() {
        if i > 0 {
            joined.push_str(&sep);
        }
        let s = v
            .to_text()
            .ok_or_else(|| format!("implode: cannot join nested {}", v.human()))?;
        joined.push_str(&s);
    }
    Ok(Value::from(joined))
}

/// Returns part of a string, `substr(string, start[, length])`.
///
/// Offsets count characters. A negative start counts from the end, a
/// negative length leaves that many characters off the end.
pub fn substr(args: Args<'_>) -> Result<Value, String> {
    arity("substr", args, 2, 3)?;
    let s = text(args, 0)?;
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;

    let start = int(args, 1)?;
    let start = if start < 0 { len.saturating_add(start).max(0) } else { start.min(len) };
    let end = match args.get(2) {
        None | Some(Value::None) => len,
        Some(_) => {
            let n = int(args, 2)?;
            if n < 0 {
                len.saturating_add(n).max(start)
            } else {
                start.saturating_add(n).min(len)
            }
        }
    };
    let result: String = chars[start as usize..end.max(start) as usize].iter().collect();
    Ok(Value::from(result))
}

/// Formats a number with grouped thousands,
/// `number_format(number[, decimals[, decimal_point, thousands_separator]])`.
pub fn number_format(args: Args<'_>) -> Result<Value, String> {
    arity("number_format", args, 1, 4)?;
    let n = args[0]
        .to_number()
        .ok_or_else(|| format!("number_format: expected number, found {}", args[0].human()))?
        .to_f64();
    let decimals = match args.get(1) {
        Some(_) => int(args, 1)?.clamp(0, 20) as usize,
        None => 0,
    };
    let point = match args.get(2) {
        Some(_) => text(args, 2)?.into_owned(),
        None => String::from("."),
    };
    let thousands = match args.get(3) {
        Some(_) => text(args, 3)?.into_owned(),
        None => String::from(","),
    };

    let formatted = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut result = String::new();
    if n < 0.0 && formatted.bytes().any(|b| matches!(b, b'1'..=b'9')) {
        result.push('-');
    }
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            result.push_str(&thousands);
        }
        result.push(c);
    }
    if let Some(frac) = frac_part {
        result.push_str(&point);
        result.push_str(frac);
    }
    Ok(Value::from(result))
}

/// Returns `true` if the value is falsy.
pub fn empty(args: Args<'_>) -> Result<Value, String> {
    arity("empty", args, 1, 1)?;
    Ok(Value::Bool(!args[0].is_truthy()))
}

/// Returns `true` if the value is not `null`.
pub fn isset(args: Args<'_>) -> Result<Value, String> {
    arity("isset", args, 1, usize::MAX)?;
    Ok(Value::Bool(args.iter().all(|v| !matches!(v, Value::None))))
}

/// Returns `true` if the list or map contains a loosely equal value.
pub fn in_array(args: Args<'_>) -> Result<Value, String> {
    arity("in_array", args, 2, 2)?;
    let needle = &args[0];
    let found = match &args[1] {
        Value::List(l) => l.iter().any(|v| loose_eq(needle, v)),
        Value::Map(m) => m.values().any(|v| loose_eq(needle, v)),
        v => return Err(format!("in_array: expected list, found {}", v.human())),
    };
    Ok(Value::Bool(found))
}

fn arity(name: &str, args: Args<'_>, min: usize, max: usize) -> Result<(), String> {
    match args.len() {
        n if n < min => Err(format!("{name}: expected at least {min} argument(s), found {n}")),
        n if n > max => Err(format!("{name}: expected at most {max} argument(s), found {n}")),
        _ => Ok(()),
    }
}

fn text<'a>(args: Args<'a>, i: usize) -> Result<Cow<'a, str>, String> {
    args[i]
        .to_text()
        .ok_or_else(|| format!("expected string argument, found {}", args[i].human()))
}

fn int(args: Args<'_>, i: usize) -> Result<i64, String> {
    args[i]
        .to_number()
        .map(|n| n.to_i64())
        .ok_or_else(|| format!("expected integer argument, found {}", args[i].human()))
}
