use std::cmp::Ordering;

use crate::render::core::RendererImpl;
use crate::render::value::{loose_cmp, loose_eq, Number};
use crate::types::expr::{Binary, BinaryOp, Call, Expr, Index, Member, Ternary, Unary, UnaryOp};
use crate::types::span::Span;
use crate::value::ValueCow;
use crate::{Error, Result, Value};

impl<'render> RendererImpl<'render> {
    /// Evaluates an expression against the bound variable slots.
    pub(crate) fn eval(
        &self,
        source: &str,
        slots: &[ValueCow<'render>],
        expr: &Expr,
    ) -> Result<ValueCow<'render>> {
        let value = match expr {
            Expr::Literal(lit) => ValueCow::Owned(lit.value.clone()),

            Expr::Var(var) => slots
                .get(var.slot)
                .cloned()
                .ok_or_else(|| Error::render("unbound variable slot", source, var.span))?,

            Expr::Index(Index { receiver, key, .. }) => {
                let receiver = self.eval(source, slots, receiver)?;
                let key = self.eval(source, slots, key)?;
                index(receiver, &key)
            }

            Expr::Member(Member { receiver, name, .. }) => {
                let receiver = self.eval(source, slots, receiver)?;
                index(receiver, &Value::from(name.as_str()))
            }

            Expr::Unary(Unary { op, operand, span }) => {
                let v = self.eval(source, slots, operand)?;
                let result = match op {
                    UnaryOp::Not => Value::Bool(!v.is_truthy()),
                    UnaryOp::Plus => to_number(source, &v, *span)?.into_value(),
                    UnaryOp::Neg => match to_number(source, &v, *span)? {
                        Number::Int(i) => match i.checked_neg() {
                            Some(i) => Value::Integer(i),
                            None => Value::Float(-(i as f64)),
                        },
                        Number::Float(f) => Value::Float(-f),
                    },
                };
                ValueCow::Owned(result)
            }

            Expr::Binary(Binary { op, lhs, rhs, span }) => {
                let lhs = self.eval(source, slots, lhs)?;
                // Logical operators short circuit.
                match op {
                    BinaryOp::And if !lhs.is_truthy() => return Ok(ValueCow::Owned(Value::Bool(false))),
                    BinaryOp::Or if lhs.is_truthy() => return Ok(ValueCow::Owned(Value::Bool(true))),
                    _ => {}
                }
                let rhs = self.eval(source, slots, rhs)?;
                ValueCow::Owned(binary(source, *op, &lhs, &rhs, *span)?)
            }

            Expr::Ternary(Ternary {
                cond,
                then,
                otherwise,
                ..
            }) => {
                if self.eval(source, slots, cond)?.is_truthy() {
                    self.eval(source, slots, then)?
                } else {
                    self.eval(source, slots, otherwise)?
                }
            }

            Expr::Call(Call { name, args, span }) => {
                let f = self.engine.function(name).ok_or_else(|| {
                    Error::render(format!("unknown function `{name}`"), source, *span)
                })?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(source, slots, arg).map(ValueCow::into_owned))
                    .collect::<Result<Vec<_>>>()?;
                let result = f(&args).map_err(|err| err.enrich(source, *span))?;
                ValueCow::Owned(result)
            }
        };
        Ok(value)
    }
}

/// Looks up a key in a list or map, anything missing is `null`.
fn index<'a>(receiver: ValueCow<'a>, key: &Value) -> ValueCow<'a> {
    match receiver {
        ValueCow::Borrowed(v) => lookup(v, key)
            .map(ValueCow::Borrowed)
            .unwrap_or(ValueCow::Owned(Value::None)),
        ValueCow::Owned(v) => ValueCow::Owned(lookup(&v, key).cloned().unwrap_or_default()),
    }
}

fn lookup<'v>(value: &'v Value, key: &Value) -> Option<&'v Value> {
    match value {
        Value::Map(map) => map.get(key.to_text()?.as_ref()),
        Value::List(list) => {
            let i = match key {
                Value::Integer(i) => *i,
                Value::Bool(b) => i64::from(*b),
                Value::Float(f) => *f as i64,
                Value::String(s) => s.trim().parse().ok()?,
                _ => return None,
            };
            list.get(usize::try_from(i).ok()?)
        }
        _ => None,
    }
}

fn to_number(source: &str, v: &Value, span: Span) -> Result<Number> {
    v.to_number().ok_or_else(|| {
        Error::render(
            format!("unsupported operand type {}", v.human()),
            source,
            span,
        )
    })
}

fn binary(source: &str, op: BinaryOp, lhs: &Value, rhs: &Value, span: Span) -> Result<Value> {
    let cmp = |f: fn(Ordering) -> bool| Value::Bool(loose_cmp(lhs, rhs).map_or(false, f));

    let value = match op {
        BinaryOp::And | BinaryOp::Or => Value::Bool(rhs.is_truthy()),
        BinaryOp::Eq => Value::Bool(loose_eq(lhs, rhs)),
        BinaryOp::Ne => Value::Bool(!loose_eq(lhs, rhs)),
        BinaryOp::Identical => Value::Bool(lhs == rhs),
        BinaryOp::NotIdentical => Value::Bool(lhs != rhs),
        BinaryOp::Lt => cmp(Ordering::is_lt),
        BinaryOp::Le => cmp(Ordering::is_le),
        BinaryOp::Gt => cmp(Ordering::is_gt),
        BinaryOp::Ge => cmp(Ordering::is_ge),
        BinaryOp::Concat => {
            let text = |v: &Value| {
                v.to_text().map(|s| s.into_owned()).ok_or_else(|| {
                    Error::render(
                        format!("cannot concatenate {}", v.human()),
                        source,
                        span,
                    )
                })
            };
            let mut s = text(lhs)?;
            s.push_str(&text(rhs)?);
            Value::String(s)
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            let a = to_number(source, lhs, span)?;
            let b = to_number(source, rhs, span)?;
            arithmetic(op, a, b).ok_or_else(|| {
                let msg = match op {
                    BinaryOp::Rem => "modulo by zero",
                    _ => "division by zero",
                };
                Error::render(msg, source, span)
            })?
        }
    };
    Ok(value)
}

/// Returns `None` on division by zero. Integer overflow falls back to float
/// arithmetic.
fn arithmetic(op: BinaryOp, a: Number, b: Number) -> Option<Value> {
    use Number::*;

    let value = match (op, a, b) {
        (BinaryOp::Rem, a, b) => {
            let (a, b) = (a.to_i64(), b.to_i64());
            if b == 0 {
                return None;
            }
            Value::Integer(a.checked_rem(b).unwrap_or(0))
        }
        (BinaryOp::Div, _, b) if b.to_f64() == 0.0 => return None,
        (BinaryOp::Div, Int(a), Int(b)) if a.checked_rem(b) == Some(0) => {
            Value::Integer(a / b)
        }
        (BinaryOp::Div, a, b) => Value::Float(a.to_f64() / b.to_f64()),
        (op, Int(a), Int(b)) => {
            let checked = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                _ => a.checked_mul(b),
            };
            match checked {
                Some(i) => Value::Integer(i),
                None => float_op(op, a as f64, b as f64),
            }
        }
        (op, a, b) => float_op(op, a.to_f64(), b.to_f64()),
    };
    Some(value)
}

fn float_op(op: BinaryOp, a: f64, b: f64) -> Value {
    Value::Float(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        _ => a * b,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_ints() {
        use Number::*;
        assert_eq!(arithmetic(BinaryOp::Add, Int(2), Int(3)), Some(Value::Integer(5)));
        assert_eq!(arithmetic(BinaryOp::Div, Int(6), Int(3)), Some(Value::Integer(2)));
        assert_eq!(arithmetic(BinaryOp::Div, Int(7), Int(2)), Some(Value::Float(3.5)));
        assert_eq!(arithmetic(BinaryOp::Rem, Int(7), Int(2)), Some(Value::Integer(1)));
        assert_eq!(arithmetic(BinaryOp::Div, Int(1), Int(0)), None);
        assert_eq!(arithmetic(BinaryOp::Rem, Int(1), Int(0)), None);
        assert_eq!(
            arithmetic(BinaryOp::Add, Int(i64::MAX), Int(1)),
            Some(Value::Float(i64::MAX as f64 + 1.0))
        );
    }

    #[test]
    fn lookup_keys() {
        let list = Value::from(["a", "b"]);
        assert_eq!(lookup(&list, &Value::from("1")), Some(&Value::from("b")));
        assert_eq!(lookup(&list, &Value::from(-1)), None);
        let map = Value::from_iter([("42", "x")]);
        assert_eq!(lookup(&map, &Value::from(42)), Some(&Value::from("x")));
        assert_eq!(lookup(&Value::from("str"), &Value::from(0)), None);
    }
}
