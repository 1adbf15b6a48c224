use std::fmt::Write;
use std::ops::Deref;
use std::sync::Arc;

use crate::render::iter::LoopState;
use crate::render::printf;
use crate::render::value::loose_eq;
use crate::types::program::{Instr, Program};
use crate::types::span::Span;
use crate::value::ValueCow;
use crate::{Engine, Error, Map, Result, Value};

pub(crate) struct RendererImpl<'render> {
    pub(crate) engine: &'render Engine,
    pub(crate) globals: &'render Map<String, Value>,
}

/// The execution state of one program. Each delegated include pushes a new
/// frame.
struct Frame<'render> {
    program: ProgramRef<'render>,
    pc: usize,
    slots: Vec<ValueCow<'render>>,
    loops: Vec<ActiveLoop<'render>>,
}

struct ActiveLoop<'render> {
    state: LoopState<'render>,
    key: Option<usize>,
    value: usize,
}

enum ProgramRef<'render> {
    Borrowed(&'render Program),
    Shared(Arc<Program>),
}

enum RenderState {
    Done,
    Include { name: String, span: Span },
}

impl Deref for ProgramRef<'_> {
    type Target = Program;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::Borrowed(p) => p,
            Self::Shared(p) => p,
        }
    }
}

impl<'render> RendererImpl<'render> {
    pub(crate) fn render(&self, f: &mut dyn Write, program: &'render Program) -> Result<()> {
        let max_include_depth = self.engine.config().max_include_depth();
        let mut frames = vec![self.frame(ProgramRef::Borrowed(program))];

        while let Some(frame) = frames.last_mut() {
            let state = self
                .render_one(f, frame)
                .map_err(|err| err.with_template_name(&frame.program.name))?;
            match state {
                RenderState::Done => {
                    frames.pop();
                }
                RenderState::Include { name, span } => {
                    let parent = &frame.program;
                    tracing::trace!(template = %parent.name, include = %name, "rendering include");
                    let program = self
                        .engine
                        .get(&name, &parent.language)
                        .map_err(|err| {
                            err.enrich(&parent.source, span)
                                .with_template_name(&parent.name)
                        })?;
                    frames.push(self.frame(ProgramRef::Shared(program)));
                }
            }
            if frames.len() > max_include_depth {
                return Err(Error::max_include_depth(max_include_depth));
            }
        }

        Ok(())
    }

    /// Binds every variable of the program to its render context field.
    fn frame(&self, program: ProgramRef<'render>) -> Frame<'render> {
        let slots = program
            .variables
            .iter()
            .map(|name| match self.globals.get(&name.to_lowercase()) {
                Some(value) => ValueCow::Borrowed(value),
                None => ValueCow::Owned(Value::String(String::new())),
            })
            .collect();
        Frame {
            program,
            pc: 0,
            slots,
            loops: Vec::new(),
        }
    }

    fn render_one(&self, f: &mut dyn Write, frame: &mut Frame<'render>) -> Result<RenderState> {
        let Frame {
            program,
            pc,
            slots,
            loops,
        } = frame;
        let source = program.source.as_str();

        while let Some(instr) = program.instrs.get(*pc) {
            match instr {
                Instr::EmitRaw(raw) => {
                    f.write_str(raw)?;
                }

                Instr::Emit(expr) => {
                    let value = self.eval(source, slots, expr)?;
                    match value.to_text() {
                        Some(s) => f.write_str(&s)?,
                        None => {
                            return Err(Error::render(
                                format!(
                                    "expected renderable value, but expression evaluated to {}",
                                    value.human()
                                ),
                                source,
                                expr.span(),
                            ));
                        }
                    }
                }

                Instr::Printf(p) => {
                    let args = p
                        .args
                        .iter()
                        .map(|arg| self.eval(source, slots, arg))
                        .collect::<Result<Vec<_>>>()?;
                    let s = printf::format(&p.format, &args)
                        .map_err(|msg| Error::render(msg, source, p.span))?;
                    f.write_str(&s)?;
                }

                Instr::Jump(j) => {
                    *pc = *j;
                    continue;
                }

                Instr::JumpIfFalse(cond, j) => {
                    if !self.eval(source, slots, cond)?.is_truthy() {
                        *pc = *j;
                        continue;
                    }
                }

                Instr::Switch(switch) => {
                    let subject = self.eval(source, slots, &switch.subject)?;
                    let mut target = None;
                    for case in &switch.cases {
                        let value = self.eval(source, slots, &case.value)?;
                        if loose_eq(&subject, &value) {
                            target = Some(case.target);
                            break;
                        }
                    }
                    if let Some(t) = target {
                        *pc = t;
                        continue;
                    }
                }

                Instr::LoopStart(l) => {
                    let iterable = self.eval(source, slots, &l.iterable)?;
                    loops.push(ActiveLoop {
                        state: LoopState::new(source, iterable, l.iterable.span())?,
                        key: l.key,
                        value: l.value,
                    });
                }

                Instr::LoopNext(j) => {
                    let active = loops.last_mut().ok_or_else(corrupt)?;
                    match active.state.next() {
                        Some((key, value)) => {
                            // Loop variables keep their last value after the
                            // loop ends.
                            *slots.get_mut(active.value).ok_or_else(corrupt)? = value;
                            if let Some(k) = active.key {
                                *slots.get_mut(k).ok_or_else(corrupt)? = key;
                            }
                        }
                        None => {
                            loops.pop();
                            *pc = *j;
                            continue;
                        }
                    }
                }

                Instr::Include(include) => {
                    *pc += 1;
                    return Ok(RenderState::Include {
                        name: include.name.clone(),
                        span: include.span,
                    });
                }
            }
            *pc += 1;
        }

        Ok(RenderState::Done)
    }
}

/// A program loaded from an artifact that the compiler would never emit.
fn corrupt() -> Error {
    Error::runtime("corrupt program, loop state does not match instructions")
}
