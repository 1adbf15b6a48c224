//! Persists compiled programs so that they can be reused by later engines.
//!
//! A program is published by writing it to a temporary file in the cache
//! directory and renaming it over the final path. Readers therefore see
//! either the previous artifact or the new one, never a partial write.

use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::types::program::Program;
use crate::{Error, Result};

#[derive(Debug)]
pub(crate) struct Cache {
    dir: PathBuf,
}

impl Cache {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_owned(),
        }
    }

    /// Returns the artifact path for a template and language.
    pub fn path(&self, name: &str, language: &str) -> PathBuf {
        self.dir
            .join(format!("template.{}.{}.json", sanitize(language), sanitize(name)))
    }

    /// Load a previously published program.
    pub fn load(&self, name: &str, language: &str) -> Result<Option<Program>> {
        let path = self.path(name, language);
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(Error::io(
                    format!("failed to open `{}`", path.display()),
                    err,
                ))
            }
        };
        let program: Program = serde_json::from_reader(BufReader::new(file)).map_err(|err| {
            Error::serde(format!("failed to read `{}`", path.display()), err)
        })?;
        // Distinct names can share a file once sanitized.
        if program.name != name || program.language != language {
            tracing::debug!(
                path = %path.display(),
                template = %program.name,
                language = %program.language,
                "cached program belongs to another template"
            );
            return Ok(None);
        }
        tracing::debug!(path = %path.display(), "loaded cached program");
        Ok(Some(program))
    }

    /// Atomically publish a program, replacing any previous artifact.
    pub fn publish(&self, program: &Program) -> Result<PathBuf> {
        let path = self.path(&program.name, &program.language);
        let context = || format!("failed to publish `{}`", path.display());

        fs::create_dir_all(&self.dir).map_err(|err| Error::io(context(), err))?;
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|err| Error::io(context(), err))?;
        {
            let mut w = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer(&mut w, program).map_err(|err| Error::serde(context(), err))?;
            w.flush().map_err(|err| Error::io(context(), err))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|err| Error::io(context(), err))?;
        tmp.persist(&path)
            .map_err(|err| Error::io(context(), err.error))?;

        tracing::info!(
            template = %program.name,
            language = %program.language,
            path = %path.display(),
            "published compiled program"
        );
        Ok(path)
    }
}

/// Replaces every character that is not alphanumeric or `_` so that any
/// name maps to a single file in the cache directory.
fn sanitize(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}
