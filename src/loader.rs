//! Template source providers.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Resolves a template name to its raw source text.
///
/// Returning `None` causes a
/// [`MissingTemplate`][crate::ErrorKind::MissingTemplate] error for the root
/// template or for any `INCLUDE` target.
///
/// Implemented for any `Fn(&str) -> Option<String>`.
pub trait Loader: Send + Sync {
    fn load(&self, name: &str) -> Option<String>;
}

impl<F> Loader for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn load(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// A loader backed by an in-memory map of template sources.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    templates: BTreeMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a template source.
    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) -> &mut Self {
        self.templates.insert(name.into(), source.into());
        self
    }

    /// Remove a template source, returning it if it existed.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.templates.remove(name)
    }
}

impl Loader for MemoryLoader {
    fn load(&self, name: &str) -> Option<String> {
        self.templates.get(name.trim()).cloned()
    }
}

impl<K, V> FromIterator<(K, V)> for MemoryLoader
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            templates: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A loader that reads `<dir>/<name>.html` from the filesystem.
#[derive(Debug, Clone)]
pub struct FileLoader {
    dir: PathBuf,
    extension: String,
}

impl FileLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: String::from("html"),
        }
    }

    /// Set the file extension, without the leading dot.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", name.trim(), self.extension))
    }
}

impl Loader for FileLoader {
    fn load(&self, name: &str) -> Option<String> {
        let path = self.path(name);
        match fs::read_to_string(&path) {
            Ok(source) => Some(source),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to read template");
                None
            }
        }
    }
}
