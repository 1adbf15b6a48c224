//! Interprets a compiled [`Program`] against a render context.
//!
//! Rendering is iterative: every delegated include pushes a frame onto a
//! stack instead of recursing, so the include depth bound is enforced without
//! growing the native stack.

mod core;
mod eval;
mod fmt;
mod iter;
pub(crate) mod printf;
pub(crate) mod value;

use std::io;

use crate::render::core::RendererImpl;
use crate::render::fmt::Writer;
use crate::types::program::Program;
use crate::{Engine, Error, Map, Result, Value};

pub(crate) fn to_string(engine: &Engine, program: &Program, ctx: &Value) -> Result<String> {
    let mut s = String::with_capacity(program.source.len());
    render(engine, program, ctx, &mut s)?;
    Ok(s)
}

pub(crate) fn to_writer<W>(engine: &Engine, program: &Program, ctx: &Value, writer: W) -> Result<()>
where
    W: io::Write,
{
    let mut w = Writer::new(writer);
    render(engine, program, ctx, &mut w).map_err(|err| w.take_err().map(Error::from).unwrap_or(err))
}

fn render(
    engine: &Engine,
    program: &Program,
    ctx: &Value,
    f: &mut dyn std::fmt::Write,
) -> Result<()> {
    let empty = Map::new();
    let globals = match ctx {
        Value::Map(map) => map,
        Value::None => &empty,
        v => {
            return Err(Error::runtime(format!(
                "expected map render context, found {}",
                v.human()
            ))
            .with_template_name(&program.name))
        }
    };
    RendererImpl { engine, globals }.render(f, program)
}
