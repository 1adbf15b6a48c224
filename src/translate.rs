//! Compile-time phrase translation.
//!
//! Every `{TR:phrase}` directive is resolved once, while compiling, by the
//! engine's [`Translator`]. A program therefore only ever contains text for
//! the language it was compiled for.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, PoisonError};

use crate::{Error, Result};

/// Maps a phrase and a language code to the translated text.
///
/// Implementations must be infallible: a phrase without a translation should
/// be returned unchanged. Implemented for any `Fn(&str, &str) -> String`
/// taking the phrase and the language.
pub trait Translator: Send + Sync {
    fn translate(&self, phrase: &str, language: &str) -> String;
}

impl<F> Translator for F
where
    F: Fn(&str, &str) -> String + Send + Sync,
{
    fn translate(&self, phrase: &str, language: &str) -> String {
        self(phrase, language)
    }
}

/// A phrase catalog keyed by language code.
///
/// Phrases without a translation are returned as is and remembered, see
/// [`Catalog::missing`].
#[derive(Debug, Default)]
pub struct Catalog {
    phrases: BTreeMap<String, BTreeMap<String, String>>,
    missing: Mutex<BTreeSet<(String, String)>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a catalog from JSON of the form `{"fr": {"Hello": "Bonjour"}}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let phrases = serde_json::from_str(json)
            .map_err(|err| Error::serde("failed to parse phrase catalog", err))?;
        Ok(Self {
            phrases,
            missing: Mutex::default(),
        })
    }

    /// Add or replace the translation of a phrase.
    pub fn insert(
        &mut self,
        language: impl Into<String>,
        phrase: impl Into<String>,
        text: impl Into<String>,
    ) -> &mut Self {
        self.phrases
            .entry(language.into())
            .or_default()
            .insert(phrase.into(), text.into());
        self
    }

    /// Returns every `(language, phrase)` pair that was looked up without a
    /// translation, in sorted order.
    pub fn missing(&self) -> Vec<(String, String)> {
        self.missing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

impl Translator for Catalog {
    fn translate(&self, phrase: &str, language: &str) -> String {
        if let Some(text) = self.phrases.get(language).and_then(|p| p.get(phrase)) {
            return text.clone();
        }
        let mut missing = self.missing.lock().unwrap_or_else(PoisonError::into_inner);
        if missing.insert((language.to_owned(), phrase.to_owned())) {
            tracing::warn!(language, phrase, "missing translation");
        }
        phrase.to_owned()
    }
}

/// Splits a `TR` argument into the phrase and the argument expressions.
///
/// Pieces are separated by `:` unless the colon is escaped as `\:`. The
/// phrase is unescaped and trimmed, argument spans are returned untouched.
pub(crate) fn split_args(arg: &str) -> (String, Vec<(usize, usize)>) {
    let mut pieces = Vec::new();
    let mut start = 0;
    let bytes = arg.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b':' && (i == 0 || bytes[i - 1] != b'\\') {
            pieces.push((start, i));
            start = i + 1;
        }
    }
    pieces.push((start, arg.len()));

    let (m, n) = pieces.remove(0);
    let phrase = arg[m..n].replace("\\:", ":").trim().to_owned();
    (phrase, pieces)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_translates() {
        let mut catalog = Catalog::new();
        catalog.insert("fr", "Hello", "Bonjour");
        assert_eq!(catalog.translate("Hello", "fr"), "Bonjour");
        assert!(catalog.missing().is_empty());
    }

    #[test]
    fn catalog_records_missing_once() {
        let catalog = Catalog::new();
        assert_eq!(catalog.translate("Hello", "de"), "Hello");
        assert_eq!(catalog.translate("Hello", "de"), "Hello");
        assert_eq!(
            catalog.missing(),
            [(String::from("de"), String::from("Hello"))]
        );
    }

    #[test]
    fn catalog_from_json() {
        let catalog = Catalog::from_json(r#"{"fr": {"There are %d": "Il y a %d"}}"#).unwrap();
        assert_eq!(catalog.translate("There are %d", "fr"), "Il y a %d");
    }

    #[test]
    fn split_args_phrase_only() {
        let (phrase, args) = split_args(" Hello ");
        assert_eq!(phrase, "Hello");
        assert!(args.is_empty());
    }

    #[test]
    fn split_args_with_args() {
        let arg = "There are %d:COUNT";
        let (phrase, args) = split_args(arg);
        assert_eq!(phrase, "There are %d");
        assert_eq!(args, [(13, 18)]);
        assert_eq!(&arg[13..18], "COUNT");
    }

    #[test]
    fn split_args_escaped_colon() {
        let (phrase, args) = split_args(r"Time\: %s:NOW");
        assert_eq!(phrase, "Time: %s");
        assert_eq!(args.len(), 1);
    }
}
