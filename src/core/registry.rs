//! Named registry of loaded vocabularies.
//!
//! The registry is built once during startup, before the engine accepts
//! calls, and is then shared immutably: `encode` and `decode` take `&self`
//! and never lock. It is an owned value, not an ambient global; the
//! transport layer decides where it lives.

use rustc_hash::FxHashMap;
use tracing::debug;

use super::special::EncodeOptions;
use super::tokenizer::{Tokenizer, TokenizerError};
use super::vocab::Vocabulary;

/// All loaded vocabularies, by name, for the lifetime of the process.
#[derive(Default)]
pub struct Registry {
    tokenizers: FxHashMap<String, Tokenizer>,
    names: Vec<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a validated vocabulary under its name.
    ///
    /// Compiles the split pattern and special-token matcher up front, so a
    /// vocabulary that registers successfully can always serve calls.
    /// Re-registering a name replaces the previous bundle.
    pub fn register(&mut self, vocab: Vocabulary) -> Result<(), TokenizerError> {
        let name = vocab.name().to_string();
        let tokenizer = Tokenizer::new(vocab)?;
        debug!(
            name = %name,
            vocab_size = tokenizer.vocab_size(),
            merge_count = tokenizer.vocab().merge_count(),
            special_count = tokenizer.vocab().special_tokens().len(),
            "vocabulary registered"
        );
        if self.tokenizers.insert(name.clone(), tokenizer).is_none() {
            self.names.push(name);
        }
        Ok(())
    }

    /// Tokenizer for a registered vocabulary name.
    pub fn resolve(&self, name: &str) -> Result<&Tokenizer, TokenizerError> {
        self.tokenizers
            .get(name)
            .ok_or_else(|| TokenizerError::UnknownVocabulary(name.to_string()))
    }

    /// Registered names, in registration order.
    pub fn list_names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.tokenizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokenizers.is_empty()
    }

    /// Encode `text` under the named vocabulary and the call's policy.
    pub fn encode(
        &self,
        text: &str,
        vocabulary: &str,
        options: &EncodeOptions,
    ) -> Result<Vec<u32>, TokenizerError> {
        self.resolve(vocabulary)?.encode(text, options)
    }

    /// Decode `ids` under the named vocabulary, back to bytes.
    pub fn decode(&self, ids: &[u32], vocabulary: &str) -> Result<Vec<u8>, TokenizerError> {
        self.resolve(vocabulary)?.decode_bytes(ids)
    }
}
