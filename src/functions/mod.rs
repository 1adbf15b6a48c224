//! Functions callable from template expressions, e.g. `{strlen(TITLE)}`.

#[cfg(feature = "builtins")]
mod builtins;

use std::collections::BTreeMap;
use std::fmt::Display;

use crate::{Error, Result, Value};

pub type FunctionFn = dyn Fn(&[Value]) -> Result<Value> + Send + Sync + 'static;

pub fn new<F, R>(f: F) -> Box<FunctionFn>
where
    F: Fn(&[Value]) -> R + Send + Sync + 'static,
    R: FunctionReturn,
{
    Box::new(move |args: &[Value]| -> Result<Value> { f(args).to_value() })
}

#[cfg(feature = "builtins")]
pub fn register_builtins(functions: &mut BTreeMap<String, Box<FunctionFn>>) {
    builtins::register(functions);
}

#[cfg(not(feature = "builtins"))]
pub fn register_builtins(_: &mut BTreeMap<String, Box<FunctionFn>>) {}

/// The return type of a function registered with
/// [`Engine::add_function`][crate::Engine::add_function].
///
/// Implemented for the following types.
///
/// - [`Value`], [`String`], [`&str`][str], [`bool`], [`i64`], [`usize`] and
///   [`f64`]
/// - `Option<R>`, where `None` becomes `null`
/// - `Result<R, E>` where `E` implements [`Display`], an error fails the
///   render
pub trait FunctionReturn {
    #[doc(hidden)]
    fn to_value(self) -> Result<Value>;
}

macro_rules! impl_function_return {
    ($($ty:ty)+) => {
        $(
            impl FunctionReturn for $ty {
                fn to_value(self) -> Result<Value> {
                    Ok(Value::from(self))
                }
            }
        )+
    };
}

impl_function_return! { Value String &'static str bool i64 usize f64 }

impl<R> FunctionReturn for Option<R>
where
    R: FunctionReturn,
{
    fn to_value(self) -> Result<Value> {
        match self {
            Some(r) => r.to_value(),
            None => Ok(Value::None),
        }
    }
}

impl<R, E> FunctionReturn for std::result::Result<R, E>
where
    R: FunctionReturn,
    E: Display,
{
    fn to_value(self) -> Result<Value> {
        match self {
            Ok(r) => r.to_value(),
            Err(err) => Err(Error::runtime(err.to_string())),
        }
    }
}
