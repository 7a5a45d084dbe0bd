//! Per-vocabulary tokenization engine.
//!
//! A [`Tokenizer`] bundles one immutable [`Vocabulary`] with its compiled
//! split pattern, its special-token matcher, and an LRU cache of merged
//! pieces. Encode and decode calls are pure with respect to callers: the
//! only interior state is the cache, behind a mutex, and a missed or
//! poisoned lock only costs a recomputation.
//!
//! Batch variants fan out over Rayon; single calls stay sequential, which is
//! faster for typical request-sized inputs.

use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHasher};
use thiserror::Error;

use super::bpe::byte_pair_encode;
use super::pretokenizer::Pretokenizer;
use super::special::{EncodeOptions, SpecialTokenSet, SpecialTreatment};
use super::vocab::{
    derive_merge_ranks, load_tiktoken_bpe, load_tiktoken_bpe_file, VocabError, Vocabulary,
};

/// Errors surfaced to the transport layer.
///
/// None of these are retried internally: every operation is deterministic,
/// so a retry would reproduce the same failure.
#[derive(Error, Debug)]
pub enum TokenizerError {
    #[error("Regex error: {0}")]
    Regex(#[from] Box<fancy_regex::Error>),
    #[error("Vocabulary error: {0}")]
    Vocab(#[from] VocabError),
    #[error("Special token matcher build error: {0}")]
    SpecialMatcher(#[from] aho_corasick::BuildError),
    #[error("Unknown vocabulary: {0}")]
    UnknownVocabulary(String),
    #[error("Special token {0:?} is not allowed in this call")]
    DisallowedSpecialToken(String),
    #[error("Symbol has no id in the token table: {0:?}")]
    UnmergeableSymbol(Vec<u8>),
    #[error("Unknown token id: {0}")]
    UnknownTokenId(u32),
    #[error("Decoded bytes are not valid UTF-8")]
    Utf8Error,
}

/// Default number of cached piece encodings.
const DEFAULT_CACHE_SIZE: usize = 4096;

/// Byte-level BPE tokenizer for one vocabulary.
pub struct Tokenizer {
    vocab: Vocabulary,
    pretokenizer: Pretokenizer,
    special: SpecialTokenSet,
    chunk_cache: Mutex<LruCache<u64, Vec<u32>>>,
}

impl Tokenizer {
    /// Build a tokenizer from a validated vocabulary.
    ///
    /// Compiles the vocabulary's split pattern and special-token matcher.
    pub fn new(vocab: Vocabulary) -> Result<Self, TokenizerError> {
        Self::with_cache_size(vocab, DEFAULT_CACHE_SIZE)
    }

    /// Build a tokenizer with a custom piece-cache capacity.
    pub fn with_cache_size(vocab: Vocabulary, cache_size: usize) -> Result<Self, TokenizerError> {
        let pretokenizer = Pretokenizer::new(vocab.pattern())?;
        let special = SpecialTokenSet::new(vocab.special_tokens())?;
        let slots = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            vocab,
            pretokenizer,
            special,
            chunk_cache: Mutex::new(LruCache::new(slots)),
        })
    }

    /// Build a tokenizer from tiktoken-format vocabulary bytes.
    ///
    /// Merge ranks are recovered from the ranked token table with
    /// [`derive_merge_ranks`].
    pub fn from_tiktoken_bytes(
        name: &str,
        data: &[u8],
        special_tokens: FxHashMap<String, u32>,
        pattern: &str,
    ) -> Result<Self, TokenizerError> {
        let table = load_tiktoken_bpe(data)?;
        let merge_ranks = derive_merge_ranks(&table);
        let vocab = Vocabulary::new(name, table, merge_ranks, special_tokens, pattern)?;
        Self::new(vocab)
    }

    /// Build a tokenizer from a tiktoken-format vocabulary file.
    pub fn from_tiktoken_file(
        name: &str,
        vocab_path: &str,
        special_tokens: FxHashMap<String, u32>,
        pattern: &str,
    ) -> Result<Self, TokenizerError> {
        let table = load_tiktoken_bpe_file(vocab_path)?;
        let merge_ranks = derive_merge_ranks(&table);
        let vocab = Vocabulary::new(name, table, merge_ranks, special_tokens, pattern)?;
        Self::new(vocab)
    }

    /// The vocabulary this tokenizer serves.
    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Total id range: dense table plus the highest reserved id, if any.
    pub fn vocab_size(&self) -> usize {
        match self.vocab.special_tokens().values().max() {
            Some(&id) => self.vocab.token_count().max(id as usize + 1),
            None => self.vocab.token_count(),
        }
    }

    #[inline]
    fn hash_piece(piece: &[u8]) -> u64 {
        let mut hasher = FxHasher::default();
        piece.hash(&mut hasher);
        hasher.finish()
    }

    /// Merge one piece, consulting and feeding the LRU cache.
    fn encode_piece_cached(&self, piece: &[u8]) -> Result<Vec<u32>, TokenizerError> {
        // Fast path: the whole piece is a token.
        if let Some(id) = self.vocab.id_of(piece) {
            return Ok(vec![id]);
        }

        let key = Self::hash_piece(piece);
        if let Ok(mut cache) = self.chunk_cache.lock() {
            if let Some(hit) = cache.get(&key) {
                return Ok(hit.clone());
            }
        }

        let ids = byte_pair_encode(piece, &self.vocab)?;

        if let Ok(mut cache) = self.chunk_cache.lock() {
            cache.put(key, ids.clone());
        }

        Ok(ids)
    }

    /// Encode text with no special-token recognition at all: a special
    /// literal in the input is split and merged like any other text.
    pub fn encode_ordinary(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        let mut ids = Vec::new();
        for piece in self.pretokenizer.split(text)? {
            ids.extend(self.encode_piece_cached(piece.as_bytes())?);
        }
        Ok(ids)
    }

    /// Encode text under a per-call special-token policy.
    ///
    /// The input is scanned for special literals before pre-tokenization.
    /// Allowed occurrences emit their reserved id and skip BPE for that
    /// span; disallowed occurrences fail the whole call; occurrences in
    /// neither set are left in the surrounding text and encoded ordinarily.
    pub fn encode(&self, text: &str, options: &EncodeOptions) -> Result<Vec<u32>, TokenizerError> {
        if self.special.is_empty() {
            return self.encode_ordinary(text);
        }

        let mut ids = Vec::new();
        let mut cursor = 0;
        for m in self.special.occurrences(text) {
            match options.treatment(m.literal) {
                SpecialTreatment::Reject => {
                    return Err(TokenizerError::DisallowedSpecialToken(m.literal.to_string()));
                }
                SpecialTreatment::Emit => {
                    if m.start > cursor {
                        ids.extend(self.encode_ordinary(&text[cursor..m.start])?);
                    }
                    if let Some(id) = self.special.id_of(m.literal) {
                        ids.push(id);
                    }
                    cursor = m.end;
                }
                // The span stays in the text ahead of the cursor and is
                // encoded with the next ordinary stretch.
                SpecialTreatment::Ordinary => {}
            }
        }
        if cursor < text.len() {
            ids.extend(self.encode_ordinary(&text[cursor..])?);
        }

        Ok(ids)
    }

    /// Encode text with every registered special literal recognized.
    pub fn encode_with_special(&self, text: &str) -> Result<Vec<u32>, TokenizerError> {
        self.encode(text, &EncodeOptions::allow_all())
    }

    /// Number of tokens `text` encodes to under `options`.
    pub fn count_tokens(&self, text: &str, options: &EncodeOptions) -> Result<usize, TokenizerError> {
        Ok(self.encode(text, options)?.len())
    }

    /// Decode ids to the exact concatenation of their byte representations.
    ///
    /// Reserved ids round-trip to their literal string's bytes. The output
    /// is not guaranteed to be valid text for arbitrary id sequences.
    pub fn decode_bytes(&self, ids: &[u32]) -> Result<Vec<u8>, TokenizerError> {
        let mut out = Vec::with_capacity(ids.len() * 4);
        for &id in ids {
            if let Some(bytes) = self.vocab.bytes_of(id) {
                out.extend_from_slice(bytes);
            } else if let Some(literal) = self.special.literal_of(id) {
                out.extend_from_slice(literal.as_bytes());
            } else {
                return Err(TokenizerError::UnknownTokenId(id));
            }
        }
        Ok(out)
    }

    /// Decode ids to text, failing on byte sequences that are not UTF-8.
    pub fn decode(&self, ids: &[u32]) -> Result<String, TokenizerError> {
        let bytes = self.decode_bytes(ids)?;
        String::from_utf8(bytes).map_err(|_| TokenizerError::Utf8Error)
    }

    /// Decode ids to text, substituting U+FFFD for invalid UTF-8. Unknown
    /// ids still fail; only the text conversion is lossy.
    pub fn decode_lossy(&self, ids: &[u32]) -> Result<String, TokenizerError> {
        let bytes = self.decode_bytes(ids)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Encode many texts in parallel under one policy.
    pub fn encode_batch(
        &self,
        texts: &[String],
        options: &EncodeOptions,
    ) -> Result<Vec<Vec<u32>>, TokenizerError> {
        texts.par_iter().map(|text| self.encode(text, options)).collect()
    }

    /// Decode many id sequences in parallel, strict UTF-8.
    pub fn decode_batch(&self, token_lists: &[Vec<u32>]) -> Result<Vec<String>, TokenizerError> {
        token_lists.par_iter().map(|ids| self.decode(ids)).collect()
    }

    /// Decode many id sequences in parallel, lossy UTF-8.
    pub fn decode_batch_lossy(
        &self,
        token_lists: &[Vec<u32>],
    ) -> Result<Vec<String>, TokenizerError> {
        token_lists
            .par_iter()
            .map(|ids| self.decode_lossy(ids))
            .collect()
    }

    /// Drop every cached piece encoding.
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.chunk_cache.lock() {
            cache.clear();
        }
    }

    /// Number of cached piece encodings.
    pub fn cache_len(&self) -> usize {
        self.chunk_cache.lock().map(|c| c.len()).unwrap_or(0)
    }
}
