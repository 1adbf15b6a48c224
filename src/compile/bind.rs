use std::collections::HashMap;

use crate::compile::directive::KEYWORDS;

/// Binds template variable names to dense slot indexes.
///
/// Slots are handed out in order of first use, this order is also the order
/// of the variable preamble in the compiled program.
#[derive(Debug, Default)]
pub struct Binder {
    names: Vec<String>,
    slots: HashMap<String, usize>,
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot for the variable, allocating one on first use.
    pub fn bind(&mut self, name: &str) -> usize {
        if let Some(&slot) = self.slots.get(name) {
            return slot;
        }
        let slot = self.names.len();
        self.names.push(name.to_owned());
        self.slots.insert(name.to_owned(), slot);
        slot
    }

    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}

/// Returns `true` if the word has the shape of a template variable, an
/// uppercase ASCII letter followed by uppercase letters, digits or `_`.
pub fn is_variable(word: &str) -> bool {
    let mut bytes = word.bytes();
    matches!(bytes.next(), Some(b'A'..=b'Z'))
        && bytes.all(|b| matches!(b, b'A'..=b'Z' | b'0'..=b'9' | b'_'))
}

/// Returns `true` if the word is reserved for a directive.
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}
