//! Compile a template into a program that can be executed by the renderer.
//!
//! This process has four stages:
//! - In inline include mode every `INCLUDE` directive is expanded textually.
//! - The lexer chunks the template source into raw text and directive spans.
//! - Each directive body is classified and its expressions are parsed, with
//!   variables bound to slots in order of first use.
//! - The compiler emits instructions, resolving translations and patching
//!   jumps as blocks are closed.

mod bind;
pub(crate) mod directive;
mod expr;
mod include;
mod lex;

use crate::compile::bind::Binder;
use crate::compile::directive::Directive;
use crate::compile::lex::{Lexer, Token};
use crate::translate;
use crate::types::expr::Expr;
use crate::types::program::{Case, Include, Instr, Loop, Printf, Program, Switch, FIXME};
use crate::types::span::Span;
use crate::{Engine, Error, IncludeMode, Result};

/// Load and compile a template by name.
pub fn template(engine: &Engine, name: &str, language: &str) -> Result<Program> {
    let source = engine
        .loader()
        .load(name)
        .ok_or_else(|| Error::missing_template(name))?;
    program(engine, name, source, language)
}

/// Compile the template source into a program.
pub fn program(engine: &Engine, name: &str, source: String, language: &str) -> Result<Program> {
    tracing::debug!(template = name, language, "compiling template");

    let config = engine.config();
    let source = match config.include_mode() {
        IncludeMode::Inline => {
            include::expand(engine.loader(), source, config.max_include_expansions())
                .map_err(|err| err.with_template_name(name))?
        }
        IncludeMode::Delegate => source,
    };

    let compiler = Compiler::new(engine, &source, language);
    let (variables, instrs) = compiler
        .compile()
        .map_err(|err| err.with_template_name(name))?;

    tracing::debug!(
        template = name,
        language,
        instrs = instrs.len(),
        variables = variables.len(),
        "compiled template"
    );

    Ok(Program {
        name: name.to_owned(),
        language: language.to_owned(),
        source,
        variables,
        instrs,
    })
}

/// A compiler that constructs a program from the lexed template.
///
/// Open blocks are tracked on a stack. Forward jumps are emitted with a
/// `FIXME` target and updated once the block is closed.
struct Compiler<'engine, 'source> {
    engine: &'engine Engine,
    source: &'source str,
    language: &'source str,
    binder: Binder,
    instrs: Vec<Instr>,
    blocks: Vec<Block>,
    /// Raw text not yet emitted, adjacent text and escapes are merged.
    pending: String,
}

/// Stores the state of an open block.
enum Block {
    If(IfBlock),
    Switch(SwitchBlock),
    ForEach(ForEachBlock),
}

struct IfBlock {
    /// The span of the `IF` directive.
    span: Span,
    /// The conditional jump of the latest branch, if it still needs a target.
    next: Option<usize>,
    /// The jumps at the end of each taken branch.
    exits: Vec<usize>,
    has_else: bool,
}

struct SwitchBlock {
    span: Span,
    /// The index of the `Switch` instruction.
    switch: usize,
    /// The jumps at the end of each case body.
    breaks: Vec<usize>,
}

struct ForEachBlock {
    span: Span,
    /// The index of the `LoopNext` instruction.
    next: usize,
}

impl<'engine, 'source> Compiler<'engine, 'source> {
    fn new(engine: &'engine Engine, source: &'source str, language: &'source str) -> Self {
        Self {
            engine,
            source,
            language,
            binder: Binder::new(),
            instrs: Vec::new(),
            blocks: Vec::new(),
            pending: String::new(),
        }
    }

    fn compile(mut self) -> Result<(Vec<String>, Vec<Instr>)> {
        for (tk, span) in Lexer::new(self.source) {
            match tk {
                Token::Raw => self.pending.push_str(&self.source[span]),
                Token::Escape => self.pending.push_str(&self.source[span.m..span.m + 1]),
                Token::Directive => {
                    let d = directive::classify(self.source, tk.body(span));
                    self.compile_directive(d, span)?;
                }
            }
        }
        self.flush();

        if let Some(block) = self.blocks.first() {
            let (msg, span) = match block {
                Block::If(b) => ("unclosed `IF` block", b.span),
                Block::Switch(b) => ("unclosed `SWITCH` block", b.span),
                Block::ForEach(b) => ("unclosed `FOREACH` block", b.span),
            };
            return Err(Error::unresolved_block(msg, self.source, span));
        }

        Ok((self.binder.into_names(), self.instrs))
    }

    fn compile_directive(&mut self, d: Directive, span: Span) -> Result<()> {
        match d {
            Directive::Empty | Directive::Comment => {}

            Directive::Echo(arg) => {
                let expr = self.parse_expr(arg)?;
                self.push(Instr::Emit(expr));
            }

            // The start of an `IF` block. For example:
            //
            //   {IF:COUNT > 0}
            //
            // The jump past the body is patched by the next `ELSEIF`, `ELSE`
            // or `ENDIF`.
            Directive::If(arg) => {
                let cond = self.parse_expr(arg)?;
                let j = self.push(Instr::JumpIfFalse(cond, FIXME));
                self.blocks.push(Block::If(IfBlock {
                    span,
                    next: Some(j),
                    exits: Vec::new(),
                    has_else: false,
                }));
            }

            // An `ELSEIF` clause. The previous branch exits the block and its
            // conditional jump lands on this condition.
            Directive::ElseIf(arg) => {
                let cond = self.parse_expr(arg)?;
                let mut block = self.pop_if(d, span)?;
                let exit = self.push(Instr::Jump(FIXME));
                block.exits.push(exit);
                if let Some(prev) = block.next.take() {
                    self.update_jump(prev);
                }
                block.next = Some(self.push(Instr::JumpIfFalse(cond, FIXME)));
                self.blocks.push(Block::If(block));
            }

            Directive::Else => {
                let mut block = self.pop_if(d, span)?;
                let exit = self.push(Instr::Jump(FIXME));
                block.exits.push(exit);
                if let Some(prev) = block.next.take() {
                    self.update_jump(prev);
                }
                block.has_else = true;
                self.blocks.push(Block::If(block));
            }

            Directive::EndIf => {
                let block = match self.pop_block(d, span)? {
                    Block::If(block) => block,
                    block => return Err(self.err_mismatched(d, &block, span)),
                };
                if let Some(prev) = block.next {
                    self.update_jump(prev);
                }
                for exit in block.exits {
                    self.update_jump(exit);
                }
            }

            // The start of a `SWITCH` block. For example:
            //
            //   {SWITCH:STATUS}
            //
            // Anything before the first `CASE` is the default body, it
            // directly follows the `Switch` instruction.
            Directive::Switch(arg) => {
                let subject = self.parse_expr(arg)?;
                let switch = self.push(Instr::Switch(Switch {
                    subject,
                    cases: Vec::new(),
                }));
                self.blocks.push(Block::Switch(SwitchBlock {
                    span,
                    switch,
                    breaks: Vec::new(),
                }));
            }

            // A `CASE` clause ends the previous body with a break and adds a
            // jump target to the `Switch` instruction.
            Directive::Case(arg) => {
                let value = self.parse_expr(arg)?;
                let mut block = match self.pop_block(d, span)? {
                    Block::Switch(block) => block,
                    block => return Err(self.err_mismatched(d, &block, span)),
                };
                let brk = self.push(Instr::Jump(FIXME));
                block.breaks.push(brk);
                let target = self.instrs.len();
                match &mut self.instrs[block.switch] {
                    Instr::Switch(switch) => switch.cases.push(Case { value, target }),
                    _ => panic!("not a switch instr"),
                }
                self.blocks.push(Block::Switch(block));
            }

            Directive::EndSwitch => {
                let block = match self.pop_block(d, span)? {
                    Block::Switch(block) => block,
                    block => return Err(self.err_mismatched(d, &block, span)),
                };
                for brk in block.breaks {
                    self.update_jump(brk);
                }
            }

            // The start of a `FOREACH` block. For example:
            //
            //   {FOREACH:ITEMS:ITEM}
            //
            //   {FOREACH:ROWS:KEY:ROW}
            //
            Directive::ForEach(arg) => {
                let pieces = split_top_level(self.source, arg);
                let (iterable, key, value) = match pieces[..] {
                    [iterable, value] => (iterable, None, value),
                    [iterable, key, value] => (iterable, Some(key), value),
                    _ => {
                        return Err(Error::syntax(
                            "expected `FOREACH:expr:VALUE` or `FOREACH:expr:KEY:VALUE`",
                            self.source,
                            arg,
                        ))
                    }
                };
                let iterable = self.parse_expr(iterable)?;
                let key = key
                    .map(|key| expr::parse_loop_var(self.source, key, &mut self.binder))
                    .transpose()?;
                let value = expr::parse_loop_var(self.source, value, &mut self.binder)?;
                self.push(Instr::LoopStart(Loop {
                    iterable,
                    key,
                    value,
                }));
                let next = self.push(Instr::LoopNext(FIXME));
                self.blocks.push(Block::ForEach(ForEachBlock { span, next }));
            }

            Directive::EndFor => {
                let block = match self.pop_block(d, span)? {
                    Block::ForEach(block) => block,
                    block => return Err(self.err_mismatched(d, &block, span)),
                };
                self.push(Instr::Jump(block.next));
                self.update_jump(block.next);
            }

            Directive::Include(arg) => {
                let name = self.source[arg].to_owned();
                if name.is_empty() {
                    return Err(Error::syntax("expected template name", self.source, span));
                }
                self.push(Instr::Include(Include { name, span }));
            }

            // A `TR` directive is translated now. Without arguments the text
            // joins the surrounding raw text, otherwise it is a format string
            // for the arguments.
            Directive::Translate(arg) => {
                let (phrase, args) = translate::split_args(&self.source[arg]);
                if phrase.is_empty() {
                    return Err(Error::syntax("expected phrase", self.source, span));
                }
                let text = self.engine.translate(&phrase, self.language);
                if args.is_empty() {
                    self.pending.push_str(&text);
                } else {
                    let mut exprs = Vec::with_capacity(args.len());
                    for (m, n) in args {
                        let span = trim_span(self.source, Span::from(arg.m + m..arg.m + n));
                        exprs.push(self.parse_expr(span)?);
                    }
                    self.push(Instr::Printf(Printf {
                        format: text,
                        args: exprs,
                        span,
                    }));
                }
            }
        }
        Ok(())
    }

    fn parse_expr(&mut self, span: Span) -> Result<Expr> {
        if span.m == span.n {
            return Err(Error::syntax("expected expression", self.source, span));
        }
        expr::parse(self.source, span, &mut self.binder)
    }

    fn pop_block(&mut self, d: Directive, span: Span) -> Result<Block> {
        self.blocks.pop().ok_or_else(|| {
            Error::unresolved_block(
                format!("unexpected `{}` block", d.keyword()),
                self.source,
                span,
            )
        })
    }

    fn pop_if(&mut self, d: Directive, span: Span) -> Result<IfBlock> {
        match self.pop_block(d, span)? {
            Block::If(block) if !block.has_else => Ok(block),
            Block::If(block) => {
                self.blocks.push(Block::If(block));
                Err(Error::unresolved_block(
                    format!("unexpected `{}` block after `ELSE`", d.keyword()),
                    self.source,
                    span,
                ))
            }
            block => Err(self.err_mismatched(d, &block, span)),
        }
    }

    fn err_mismatched(&self, d: Directive, block: &Block, span: Span) -> Error {
        let open = match block {
            Block::If(_) => "IF",
            Block::Switch(_) => "SWITCH",
            Block::ForEach(_) => "FOREACH",
        };
        Error::unresolved_block(
            format!("unexpected `{}` block, the open block is `{open}`", d.keyword()),
            self.source,
            span,
        )
    }

    fn update_jump(&mut self, i: usize) {
        self.flush();
        let n = self.instrs.len();
        let j = match &mut self.instrs[i] {
            Instr::Jump(j) | Instr::JumpIfFalse(_, j) | Instr::LoopNext(j) => j,
            _ => panic!("not a jump instr"),
        };
        *j = n;
    }

    fn push(&mut self, instr: Instr) -> usize {
        self.flush();
        let i = self.instrs.len();
        self.instrs.push(instr);
        i
    }

    /// Emit any pending raw text.
    fn flush(&mut self) {
        if !self.pending.is_empty() {
            let raw = std::mem::take(&mut self.pending);
            self.instrs.push(Instr::EmitRaw(raw));
        }
    }
}

/// Splits the span on `:` that is not nested in brackets, parentheses or
/// quotes.
fn split_top_level(source: &str, span: Span) -> Vec<Span> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut quote = None;
    let mut escaped = false;
    let mut start = span.m;
    for (i, c) in source[span].char_indices() {
        let i = span.m + i;
        match (quote, c) {
            (Some(_), _) if escaped => escaped = false,
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(' | '[') => depth += 1,
            (None, ')' | ']') => depth = depth.saturating_sub(1),
            (None, ':') if depth == 0 => {
                pieces.push(trim_span(source, Span::from(start..i)));
                start = i + 1;
            }
            (None, _) => {}
        }
    }
    pieces.push(trim_span(source, Span::from(start..span.n)));
    pieces
}

fn trim_span(source: &str, span: Span) -> Span {
    let raw = &source[span];
    let start = raw.len() - raw.trim_start().len();
    let end = raw.trim_end().len();
    if start >= end {
        return Span::from(span.m + start..span.m + start);
    }
    Span::from(span.m + start..span.m + end)
}
