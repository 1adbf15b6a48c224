use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// How `{INCLUDE:name}` directives are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludeMode {
    /// Splice the included source into the including template before
    /// compiling. Variables of the included template join the includer's
    /// preamble and its translations use the includer's language.
    Inline,

    /// Compile the included template separately and render it at runtime
    /// with the same render context.
    #[default]
    Delegate,
}

/// Engine configuration.
///
/// Can be built with [`Config::builder`] or deserialized, every field is
/// optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    include_mode: IncludeMode,
    max_include_expansions: usize,
    max_include_depth: usize,
    cache_dir: Option<PathBuf>,
}

/// A builder for a [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include_mode: IncludeMode::default(),
            max_include_expansions: 64,
            max_include_depth: 64,
            cache_dir: None,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn include_mode(&self) -> IncludeMode {
        self.include_mode
    }

    /// The maximum number of inline include expansions for one template.
    pub fn max_include_expansions(&self) -> usize {
        self.max_include_expansions
    }

    /// The maximum nesting of delegated includes while rendering.
    pub fn max_include_depth(&self) -> usize {
        self.max_include_depth
    }

    /// The directory compiled programs are published to, if any.
    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }
}

impl ConfigBuilder {
    pub fn include_mode(&mut self, mode: IncludeMode) -> &mut Self {
        self.config.include_mode = mode;
        self
    }

    pub fn max_include_expansions(&mut self, max: usize) -> &mut Self {
        self.config.max_include_expansions = max;
        self
    }

    pub fn max_include_depth(&mut self, max: usize) -> &mut Self {
        self.config.max_include_depth = max;
        self
    }

    /// Publish compiled programs to the directory and reuse them across
    /// engines.
    pub fn cache_dir(&mut self, dir: impl Into<PathBuf>) -> &mut Self {
        self.config.cache_dir = Some(dir.into());
        self
    }

    pub fn build(&self) -> Config {
        self.config.clone()
    }
}
