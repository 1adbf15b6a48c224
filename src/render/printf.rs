//! Formats translated phrases that take arguments, e.g. `There are %d posts`.
//!
//! Supports the conversions `%s %d %u %f %F %e %E %x %X %o %b %c`, the
//! literal `%%`, positional arguments `%1$s`, the flags `-`, `+`, `0`, space
//! and `'c` (custom padding), a minimum width, and a precision.

use std::iter::Peekable;
use std::str::Chars;

use crate::value::ValueCow;

#[derive(Debug)]
struct Spec {
    position: Option<usize>,
    left: bool,
    plus: bool,
    pad: char,
    width: usize,
    precision: Option<usize>,
    conversion: char,
}

/// Formats the arguments according to the format string.
pub fn format(fmt: &str, args: &[ValueCow<'_>]) -> Result<String, String> {
    let mut out = String::with_capacity(fmt.len());
    let mut next = 0;
    let mut chars = fmt.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }

        let spec = parse_spec(&mut chars)?;
        let i = match spec.position {
            Some(n) => n - 1,
            None => {
                next += 1;
                next - 1
            }
        };
        let arg = args
            .get(i)
            .ok_or_else(|| format!("too few arguments, expected at least {}", i + 1))?;
        write_arg(&mut out, &spec, arg)?;
    }

    Ok(out)
}

fn parse_spec(chars: &mut Peekable<Chars<'_>>) -> Result<Spec, String> {
    let mut spec = Spec {
        position: None,
        left: false,
        plus: false,
        pad: ' ',
        width: 0,
        precision: None,
        conversion: '\0',
    };

    let digits = take_digits(chars);
    if !digits.is_empty() && chars.peek() == Some(&'$') {
        chars.next();
        match parse_usize(&digits)? {
            0 => return Err(String::from("argument number must be greater than zero")),
            n => spec.position = Some(n),
        }
        parse_flags(chars, &mut spec);
        spec.width = parse_usize(&take_digits(chars))?;
    } else if !digits.is_empty() {
        // Without a position a leading zero is the zero padding flag.
        if digits.starts_with('0') {
            spec.pad = '0';
        }
        spec.width = parse_usize(digits.trim_start_matches('0'))?;
    } else {
        parse_flags(chars, &mut spec);
        spec.width = parse_usize(&take_digits(chars))?;
    }

    if chars.peek() == Some(&'.') {
        chars.next();
        spec.precision = Some(parse_usize(&take_digits(chars))?);
    }

    spec.conversion = chars
        .next()
        .ok_or_else(|| String::from("missing conversion specifier"))?;
    Ok(spec)
}

fn parse_flags(chars: &mut Peekable<Chars<'_>>, spec: &mut Spec) {
    loop {
        match chars.peek() {
            Some('-') => spec.left = true,
            Some('+') => spec.plus = true,
            Some('0') => spec.pad = '0',
            Some(' ') => spec.pad = ' ',
            Some('\'') => {
                chars.next();
                if let Some(c) = chars.peek() {
                    spec.pad = *c;
                }
            }
            _ => break,
        }
        chars.next();
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}

fn parse_usize(digits: &str) -> Result<usize, String> {
    if digits.is_empty() {
        return Ok(0);
    }
    digits
        .parse()
        .map_err(|_| format!("number `{digits}` in format string is too large"))
}

fn write_arg(out: &mut String, spec: &Spec, arg: &ValueCow<'_>) -> Result<(), String> {
    let number = || {
        arg.to_number()
            .ok_or_else(|| format!("expected scalar argument, found {}", arg.human()))
    };

    let (s, numeric) = match spec.conversion {
        's' => {
            let text = arg
                .to_text()
                .ok_or_else(|| format!("expected scalar argument, found {}", arg.human()))?;
            let s = match spec.precision {
                Some(p) => text.chars().take(p).collect(),
                None => text.into_owned(),
            };
            (s, false)
        }
        'd' => {
            let i = number()?.to_i64();
            (signed(i.to_string(), i >= 0, spec.plus), true)
        }
        'u' => ((number()?.to_i64() as u64).to_string(), true),
        'f' | 'F' => {
            let f = number()?.to_f64();
            let p = spec.precision.unwrap_or(6);
            (signed(format!("{f:.p$}"), f >= 0.0, spec.plus), true)
        }
        'e' | 'E' => {
            let f = number()?.to_f64();
            let p = spec.precision.unwrap_or(6);
            let s = format!("{f:.p$e}");
            // Always sign the exponent, e.g. `1.5e2` becomes `1.5e+2`.
            let s = match s.find('e') {
                Some(i) if !s[i + 1..].starts_with('-') => format!("{}e+{}", &s[..i], &s[i + 1..]),
                _ => s,
            };
            let s = if spec.conversion == 'E' {
                s.to_uppercase()
            } else {
                s
            };
            (signed(s, f >= 0.0, spec.plus), true)
        }
        'x' => (format!("{:x}", number()?.to_i64() as u64), true),
        'X' => (format!("{:X}", number()?.to_i64() as u64), true),
        'o' => (format!("{:o}", number()?.to_i64() as u64), true),
        'b' => (format!("{:b}", number()?.to_i64() as u64), true),
        'c' => {
            let code = number()?.to_i64();
            if let Some(c) = u32::try_from(code).ok().and_then(char::from_u32) {
                out.push(c);
            }
            return Ok(());
        }
        c => return Err(format!("unknown format specifier `{c}`")),
    };

    pad(out, &s, spec, numeric);
    Ok(())
}

fn signed(s: String, non_negative: bool, plus: bool) -> String {
    if plus && non_negative {
        format!("+{s}")
    } else {
        s
    }
}

fn pad(out: &mut String, s: &str, spec: &Spec, numeric: bool) {
    let len = s.chars().count();
    if len >= spec.width {
        out.push_str(s);
        return;
    }
    let fill = spec.width - len;
    if spec.left {
        out.push_str(s);
        out.extend(std::iter::repeat(spec.pad).take(fill));
    } else if spec.pad == '0' && numeric && s.starts_with(['-', '+']) {
        out.push_str(&s[..1]);
        out.extend(std::iter::repeat('0').take(fill));
        out.push_str(&s[1..]);
    } else {
        out.extend(std::iter::repeat(spec.pad).take(fill));
        out.push_str(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn printf_basic() {
        assert_eq!(fmt("Il y a %d", [Value::from(5)]), "Il y a 5");
        assert_eq!(fmt("%s and %s", ["a".into(), "b".into()]), "a and b");
        assert_eq!(fmt("100%%", []), "100%");
    }

    #[test]
    fn printf_positional() {
        assert_eq!(fmt("%2$s %1$s", ["a".into(), "b".into()]), "b a");
    }

    #[test]
    fn printf_floats() {
        assert_eq!(fmt("%.2f", [Value::from(1.005)]), "1.00");
        assert_eq!(fmt("%f", [Value::from(1.5)]), "1.500000");
        assert_eq!(fmt("%.1e", [Value::from(150.0)]), "1.5e+2");
    }

    #[test]
    fn printf_padding() {
        assert_eq!(fmt("%05d", [Value::from(-42)]), "-0042");
        assert_eq!(fmt("%5s|", ["ab".into()]), "   ab|");
        assert_eq!(fmt("%-5s|", ["ab".into()]), "ab   |");
        assert_eq!(fmt("%'*5s", ["ab".into()]), "***ab");
        assert_eq!(fmt("%+d", [Value::from(3)]), "+3");
    }

    #[test]
    fn printf_conversions() {
        assert_eq!(
            fmt("%x %X %o %b", [255.into(), 255.into(), 8.into(), 5.into()]),
            "ff FF 10 101"
        );
        assert_eq!(fmt("%c", [Value::from(65)]), "A");
        assert_eq!(fmt("%d", [Value::from("12abc")]), "12");
        assert_eq!(fmt("%.3s", [Value::from("abcdef")]), "abc");
        assert_eq!(fmt("%u", [Value::from(-1)]), "18446744073709551615");
    }

    #[test]
    fn printf_errors() {
        let args = [ValueCow::Owned(Value::from(1))];
        assert_eq!(
            format("%s %s", &args).unwrap_err(),
            "too few arguments, expected at least 2"
        );
        assert_eq!(
            format("%q", &args).unwrap_err(),
            "unknown format specifier `q`"
        );
        assert_eq!(
            format("%", &args).unwrap_err(),
            "missing conversion specifier"
        );
    }

    fn fmt<const N: usize>(f: &str, args: [Value; N]) -> String {
        let args: Vec<_> = args.into_iter().map(ValueCow::Owned).collect();
        format(f, &args).unwrap()
    }
}
