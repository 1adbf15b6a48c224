//! A compile-once template engine with brace directives and baked-in
//! translations.
//!
//! # Features
//!
//! ### Syntax
//!
//! - Expressions: `{TITLE}`, `{ROW[id]}`, `{USER->name}`, `{strlen(TITLE)}`
//! - Conditionals: `{IF:COUNT > 0} ... {ELSEIF:COUNT < 0} ... {ELSE} ... {ENDIF}`
//! - Switches: `{SWITCH:STATUS} default {CASE:'draft'} ... {ENDSWITCH}`
//! - Loops: `{FOREACH:ITEMS:ITEM} ... {ENDFOR}`, `{FOREACH:ROWS:KEY:ROW}`
//! - Nested templates: `{INCLUDE:header}`, inlined at compile time or rendered
//!   by delegation
//! - Translations resolved at compile time: `{TR:Hello}`,
//!   `{TR:There are %d comments:COUNT}`
//! - Comments `{// ...}` and literal braces `{{` and `}}`
//!
//! ### Engine
//!
//! - Every `(template, language)` pair compiles once to a [`Program`]
//! - Compiled programs can be persisted to a cache directory, publishing is
//!   atomic
//! - Render to a [`String`] or any [`std::io::Write`] implementor
//! - Render using any [`serde`] serializable values
//! - Convenient macro for quick rendering:
//!   `braces::value!{ title: "Hello", count: 3 }`
//!
//! # Getting started
//!
//! Your entry point is the [`Engine`] struct. The engine stores the config,
//! the template loader, the translator, functions and the compiled programs.
//!
//! ```
//! let mut loader = braces::MemoryLoader::new();
//! loader.insert("hello", "Hello {NAME}!");
//!
//! let mut engine = braces::Engine::new();
//! engine.set_loader(loader);
//! ```
//!
//! A template is compiled for a language the first time it is requested with
//! [`.template`][Engine::template] and reused afterwards.
//!
//! ```
//! # let mut loader = braces::MemoryLoader::new();
//! # loader.insert("hello", "Hello {NAME}!");
//! # let mut engine = braces::Engine::new();
//! # engine.set_loader(loader);
//! let template = engine.template("hello", "en")?;
//! let result = template.render(braces::value!{ name: "John Smith" })?;
//! assert_eq!(result, "Hello John Smith!");
//! # Ok::<(), braces::Error>(())
//! ```
//!
//! Variables are written in uppercase in templates and are looked up in the
//! render context by their lower-cased name. A variable that is missing from
//! the context renders as an empty string.
//!
//! Template source that is not provided by the loader can be compiled
//! directly with [`.compile_str`][Engine::compile_str].
//!
//! ```
//! let engine = braces::Engine::new();
//! let result = engine
//!     .compile_str("{FOREACH:ITEMS:X}[{X}]{ENDFOR}", "en")?
//!     .render(braces::value!{ items: ["a", "b"] })?;
//! assert_eq!(result, "[a][b]");
//! # Ok::<(), braces::Error>(())
//! ```
//!
//! # Examples
//!
//! ### Translate phrases
//!
//! Phrases are translated once, when the template is compiled. A phrase with
//! arguments is a `printf` style format string.
//!
//! ```
//! let mut catalog = braces::Catalog::new();
//! catalog.insert("fr", "Hello", "Bonjour");
//! catalog.insert("fr", "There are %d comments", "Il y a %d commentaires");
//!
//! let mut engine = braces::Engine::new();
//! engine.set_translator(catalog);
//!
//! let result = engine
//!     .compile_str("{TR:Hello}, {TR:There are %d comments:COUNT}", "fr")?
//!     .render(braces::value!{ count: 5 })?;
//! assert_eq!(result, "Bonjour, Il y a 5 commentaires");
//! # Ok::<(), braces::Error>(())
//! ```
//!
//! ### Render using structured data
//!
//! ```
//! #[derive(serde::Serialize)]
//! struct Context { user: User }
//!
//! #[derive(serde::Serialize)]
//! struct User { name: String }
//!
//! let ctx = Context { user: User { name: "John Smith".into() } };
//!
//! let result = braces::Engine::new()
//!     .compile_str("Hello {USER->name}", "en")?
//!     .render(&ctx)?;
//!
//! assert_eq!(result, "Hello John Smith");
//! # Ok::<(), braces::Error>(())
//! ```
//!
//! ### Add a custom function
//!
//! ```
//! let mut engine = braces::Engine::new();
//! engine.add_function("shout", |args: &[braces::Value]| match args {
//!     [braces::Value::String(s)] => Ok(format!("{}!", s.to_uppercase())),
//!     _ => Err("expected one string"),
//! });
//!
//! let result = engine
//!     .compile_str("{shout(NAME)}", "en")?
//!     .render(braces::value!{ name: "hey" })?;
//! assert_eq!(result, "HEY!");
//! # Ok::<(), braces::Error>(())
//! ```
//!
//! ### Persist compiled programs
//!
//! ```no_run
//! use braces::{Config, Engine, FileLoader};
//!
//! let config = Config::builder().cache_dir("/var/cache/braces").build();
//! let mut engine = Engine::with_config(config);
//! engine.set_loader(FileLoader::new("templates"));
//!
//! // Compiled and published on the first call, read back from the cache
//! // directory by any later engine.
//! let page = engine.template("index", "en")?;
//! # Ok::<(), braces::Error>(())
//! ```

mod cache;
mod compile;
mod config;
mod error;
mod functions;
mod loader;
mod macros;
mod render;
mod translate;
mod types;
mod value;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::io;
use std::sync::{Arc, PoisonError, RwLock};

pub use crate::config::{Config, ConfigBuilder, IncludeMode};
pub use crate::error::{Error, ErrorKind};
pub use crate::functions::FunctionReturn;
pub use crate::loader::{FileLoader, Loader, MemoryLoader};
pub use crate::translate::{Catalog, Translator};
pub use crate::types::program::Program;
pub use crate::value::{to_value, List, Map, Value};

use crate::cache::Cache;
use crate::functions::FunctionFn;

/// A type alias for results in this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The compilation and rendering engine.
pub struct Engine {
    config: Config,
    loader: Box<dyn Loader>,
    translator: Option<Box<dyn Translator>>,
    functions: BTreeMap<String, Box<FunctionFn>>,
    cache: Option<Cache>,
    programs: RwLock<HashMap<(String, String), Arc<Program>>>,
}

/// A template compiled from source with [`Engine::compile_str`].
pub struct Template<'engine> {
    engine: &'engine Engine,
    program: Program,
}

/// A reference to a compiled template registered in an [`Engine`].
#[derive(Clone)]
pub struct TemplateRef<'engine> {
    engine: &'engine Engine,
    program: Arc<Program>,
}

impl Default for Engine {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Construct a new engine with the default config.
    ///
    /// The engine has no templates until a loader is set with
    /// [`.set_loader`][Engine::set_loader].
    #[inline]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Construct a new engine with a custom config.
    ///
    /// # Examples
    ///
    /// ```
    /// use braces::{Config, Engine, IncludeMode};
    ///
    /// let config = Config::builder().include_mode(IncludeMode::Inline).build();
    /// let engine = Engine::with_config(config);
    /// ```
    pub fn with_config(config: Config) -> Self {
        let cache = config.cache_dir().map(Cache::new);
        let mut functions = BTreeMap::new();
        functions::register_builtins(&mut functions);
        Self {
            config,
            loader: Box::new(MemoryLoader::new()),
            translator: None,
            functions,
            cache,
            programs: RwLock::new(HashMap::new()),
        }
    }

    /// Set the loader that provides template source by name.
    #[inline]
    pub fn set_loader<L>(&mut self, loader: L)
    where
        L: Loader + 'static,
    {
        self.loader = Box::new(loader);
    }

    /// Set the translator used to resolve `TR` directives.
    ///
    /// Without a translator every phrase is used as is.
    #[inline]
    pub fn set_translator<T>(&mut self, translator: T)
    where
        T: Translator + 'static,
    {
        self.translator = Some(Box::new(translator));
    }

    /// Add a function that can be called from template expressions.
    ///
    /// A function with the same name as a builtin replaces it.
    #[inline]
    pub fn add_function<F, R>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> R + Send + Sync + 'static,
        R: FunctionReturn,
    {
        self.functions.insert(name.into(), functions::new(f));
    }

    /// Returns the engine config.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compile a template from the loader for the given language.
    ///
    /// The program is neither registered in the engine nor published to the
    /// cache directory.
    #[inline]
    pub fn compile(&self, name: &str, language: &str) -> Result<Program> {
        compile::template(self, name, language)
    }

    /// Compile template source for the given language.
    ///
    /// The template is not stored in the engine. Delegated `INCLUDE`
    /// directives in it are still resolved through the engine.
    #[inline]
    pub fn compile_str(&self, source: &str, language: &str) -> Result<Template<'_>> {
        let program = compile::program(self, "", source.to_owned(), language)?;
        Ok(Template {
            engine: self,
            program,
        })
    }

    /// Returns the program for a template and language.
    ///
    /// The program is looked up in the engine first, then in the cache
    /// directory. Otherwise the template is compiled, published to the cache
    /// directory and registered in the engine.
    pub fn get(&self, name: &str, language: &str) -> Result<Arc<Program>> {
        let key = (name.to_owned(), language.to_owned());

        if let Some(program) = self
            .programs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(program.clone());
        }

        let program = match self.load_cached(name, language)? {
            Some(program) => program,
            None => {
                let program = compile::template(self, name, language)?;
                if let Some(cache) = &self.cache {
                    cache.publish(&program)?;
                }
                program
            }
        };

        let mut programs = self
            .programs
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Another thread may have registered the same program meanwhile, both
        // are identical so the first one is kept.
        let program = programs.entry(key).or_insert_with(|| Arc::new(program));
        Ok(program.clone())
    }

    /// Lookup a template, compiling it if needed.
    ///
    /// See [`.get`][Engine::get].
    #[inline]
    pub fn template(&self, name: &str, language: &str) -> Result<TemplateRef<'_>> {
        let program = self.get(name, language)?;
        Ok(TemplateRef {
            engine: self,
            program,
        })
    }

    /// Register a compiled program, replacing any program for the same
    /// template and language.
    ///
    /// This does not publish it to the cache directory.
    pub fn register(&self, program: Program) -> Arc<Program> {
        let key = (program.name.clone(), program.language.clone());
        let program = Arc::new(program);
        self.programs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, program.clone());
        program
    }

    /// Drop every registered program.
    ///
    /// Artifacts in the cache directory are kept.
    pub fn clear(&self) {
        self.programs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn load_cached(&self, name: &str, language: &str) -> Result<Option<Program>> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };
        let program = cache.load(name, language)?;
        if program.is_some() {
            tracing::debug!(template = name, language, "cache hit");
        }
        Ok(program)
    }

    pub(crate) fn loader(&self) -> &dyn Loader {
        &*self.loader
    }

    pub(crate) fn translate(&self, phrase: &str, language: &str) -> String {
        match &self.translator {
            Some(t) => t.translate(phrase, language),
            None => phrase.to_owned(),
        }
    }

    pub(crate) fn function(&self, name: &str) -> Option<&FunctionFn> {
        self.functions.get(name).map(|f| &**f)
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let programs = self
            .programs
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("functions", &self.functions.keys())
            .field("programs", &programs.keys())
            .finish_non_exhaustive()
    }
}

impl<'engine> Template<'engine> {
    /// Render the template to a string using the provided value.
    #[inline]
    pub fn render<S>(&self, ctx: S) -> Result<String>
    where
        S: serde::Serialize,
    {
        render::to_string(self.engine, &self.program, &to_value(ctx)?)
    }

    /// Render the template to a string using a [`Value`] context.
    #[inline]
    pub fn render_from(&self, ctx: &Value) -> Result<String> {
        render::to_string(self.engine, &self.program, ctx)
    }

    /// Render the template to a writer using the provided value.
    #[inline]
    pub fn render_to_writer<W, S>(&self, writer: W, ctx: S) -> Result<()>
    where
        W: io::Write,
        S: serde::Serialize,
    {
        render::to_writer(self.engine, &self.program, &to_value(ctx)?, writer)
    }

    /// Returns the compiled program.
    #[inline]
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Consumes the template returning the compiled program.
    #[inline]
    pub fn into_program(self) -> Program {
        self.program
    }
}

impl fmt::Debug for Template<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

impl<'engine> TemplateRef<'engine> {
    /// Render the template to a string using the provided value.
    #[inline]
    pub fn render<S>(&self, ctx: S) -> Result<String>
    where
        S: serde::Serialize,
    {
        render::to_string(self.engine, &self.program, &to_value(ctx)?)
    }

    /// Render the template to a string using a [`Value`] context.
    #[inline]
    pub fn render_from(&self, ctx: &Value) -> Result<String> {
        render::to_string(self.engine, &self.program, ctx)
    }

    /// Render the template to a writer using the provided value.
    #[inline]
    pub fn render_to_writer<W, S>(&self, writer: W, ctx: S) -> Result<()>
    where
        W: io::Write,
        S: serde::Serialize,
    {
        render::to_writer(self.engine, &self.program, &to_value(ctx)?, writer)
    }

    /// Returns the compiled program.
    #[inline]
    pub fn program(&self) -> &Program {
        &self.program
    }
}

impl fmt::Debug for TemplateRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRef")
            .field("name", &self.program.name)
            .field("language", &self.program.language)
            .finish_non_exhaustive()
    }
}
