use std::iter::Enumerate;
use std::slice;
use std::vec;

use crate::types::span::Span;
use crate::value::{btree_map, ValueCow};
use crate::{Error, Result, Value};

/// The iteration state of a `FOREACH` loop.
///
/// Borrowed iterables are iterated without cloning the items, owned ones,
/// e.g. the result of a function call, are consumed.
pub enum LoopState<'render> {
    ListBorrowed(Enumerate<slice::Iter<'render, Value>>),
    ListOwned(Enumerate<vec::IntoIter<Value>>),
    MapBorrowed(btree_map::Iter<'render, String, Value>),
    MapOwned(btree_map::IntoIter<String, Value>),
    /// Iterating over `null` or an empty string does nothing.
    Empty,
}

impl<'render> LoopState<'render> {
    pub fn new(source: &str, iterable: ValueCow<'render>, span: Span) -> Result<Self> {
        let state = match iterable {
            ValueCow::Borrowed(Value::List(list)) => Self::ListBorrowed(list.iter().enumerate()),
            ValueCow::Borrowed(Value::Map(map)) => Self::MapBorrowed(map.iter()),
            ValueCow::Owned(Value::List(list)) => Self::ListOwned(list.into_iter().enumerate()),
            ValueCow::Owned(Value::Map(map)) => Self::MapOwned(map.into_iter()),
            v => match &*v {
                Value::None => Self::Empty,
                Value::String(s) if s.is_empty() => Self::Empty,
                v => {
                    return Err(Error::render(
                        format!("expected iterable, but expression evaluated to {}", v.human()),
                        source,
                        span,
                    ))
                }
            },
        };
        Ok(state)
    }

    /// Advances the loop, returning the next key and value.
    ///
    /// The key of a list item is its index.
    pub fn next(&mut self) -> Option<(ValueCow<'render>, ValueCow<'render>)> {
        let (key, value) = match self {
            Self::ListBorrowed(iter) => {
                let (i, v) = iter.next()?;
                (Value::from(i), ValueCow::Borrowed(v))
            }
            Self::ListOwned(iter) => {
                let (i, v) = iter.next()?;
                (Value::from(i), ValueCow::Owned(v))
            }
            Self::MapBorrowed(iter) => {
                let (k, v) = iter.next()?;
                (Value::from(k.as_str()), ValueCow::Borrowed(v))
            }
            Self::MapOwned(iter) => {
                let (k, v) = iter.next()?;
                (Value::String(k), ValueCow::Owned(v))
            }
            Self::Empty => return None,
        };
        Some((ValueCow::Owned(key), value))
    }
}
