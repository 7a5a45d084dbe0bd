//! Vocabulary data model, validation, and tiktoken-format loading.
//!
//! A [`Vocabulary`] is the immutable bundle behind one named tokenization
//! scheme: the token table (byte sequence ↔ dense integer id), the ranked
//! merge table driving the BPE loop, the special-token literals with their
//! reserved ids, and the pre-tokenization split pattern. It is constructed
//! once at startup, validated eagerly, and shared read-only across calls.
//!
//! # Tiktoken Format
//!
//! Ranked vocabularies ship in the tiktoken text format, one token per line:
//! a base64-encoded byte sequence, a space, and the token's integer rank.
//! Lower ranks merge earlier.
//!
//! ```text
//! SGVsbG8= 0
//! V29ybGQ= 1
//! IQ== 2
//! ```
//!
//! Tables in this format carry no separate merge list; the merge ranks are
//! recovered with [`derive_merge_ranks`], which enumerates the split points
//! of every multi-byte token whose halves are themselves tokens.

use base64::{engine::general_purpose::STANDARD, Engine};
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

/// Errors raised while parsing or validating vocabulary data.
///
/// Every variant is fatal to the registration of the vocabulary it concerns;
/// a partially loaded vocabulary never becomes visible to callers.
#[derive(Error, Debug)]
pub enum VocabError {
    #[error("Invalid base64 encoding: {0}")]
    Base64Error(#[from] base64::DecodeError),
    #[error("Invalid line format: {0}")]
    ParseError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Token id {id} falls outside the dense range 0..{len}; ids must be contiguous from 0")]
    SparseId { id: u32, len: usize },
    #[error("Duplicate token id {0}")]
    DuplicateId(u32),
    #[error("Merge rule references a byte sequence with no token id: {0:?}")]
    UnknownMergeSymbol(Vec<u8>),
    #[error("Merge product has no token id: {0:?}")]
    UnknownMergeProduct(Vec<u8>),
    #[error("Duplicate merge rule for pair ({left:?}, {right:?})")]
    DuplicateMergeRule { left: Vec<u8>, right: Vec<u8> },
    #[error("Special token id {0} collides with the dense token-id range")]
    SpecialIdCollision(u32),
    #[error("Duplicate special token id {0}")]
    DuplicateSpecialId(u32),
    #[error("Special token literal must not be empty")]
    EmptySpecialLiteral,
}

/// An immutable, named tokenization scheme.
///
/// The token table is kept in both directions: a hash map from byte sequence
/// to id for encoding, and a dense array indexed by id for decoding. Both are
/// built from the same input, so the bijection holds by construction once
/// validation passes. Merge ranks are stored as a two-level map keyed by the
/// left then the right byte sequence, letting the merge loop probe pairs with
/// plain byte slices.
pub struct Vocabulary {
    name: String,
    encoder: FxHashMap<Vec<u8>, u32>,
    decoder: Vec<Vec<u8>>,
    merge_ranks: FxHashMap<Vec<u8>, FxHashMap<Vec<u8>, u32>>,
    merge_count: usize,
    special_tokens: FxHashMap<String, u32>,
    pattern: String,
}

impl Vocabulary {
    /// Validate and assemble a vocabulary from its raw parts.
    ///
    /// # Arguments
    /// * `name` - Registry name for this vocabulary
    /// * `token_table` - Byte sequence → id; ids must be dense from 0
    /// * `merge_ranks` - `((left, right), rank)` rules; lower rank merges first
    /// * `special_tokens` - Literal → reserved id, outside the dense range
    /// * `pattern` - Pre-tokenization split pattern
    ///
    /// # Errors
    /// Rejects duplicate or non-dense ids, merge rules whose symbols or
    /// product are absent from the token table, and special-token ids that
    /// collide with the dense range or with each other.
    pub fn new(
        name: impl Into<String>,
        token_table: FxHashMap<Vec<u8>, u32>,
        merge_ranks: Vec<((Vec<u8>, Vec<u8>), u32)>,
        special_tokens: FxHashMap<String, u32>,
        pattern: impl Into<String>,
    ) -> Result<Self, VocabError> {
        let len = token_table.len();

        let mut slots: Vec<Option<Vec<u8>>> = vec![None; len];
        for (bytes, &id) in &token_table {
            let idx = id as usize;
            if idx >= len {
                return Err(VocabError::SparseId { id, len });
            }
            if slots[idx].is_some() {
                return Err(VocabError::DuplicateId(id));
            }
            slots[idx] = Some(bytes.clone());
        }
        // len entries, all in range, none colliding: every slot is filled.
        let decoder: Vec<Vec<u8>> = slots.into_iter().flatten().collect();
        debug_assert_eq!(decoder.len(), len);

        let merge_count = merge_ranks.len();
        let mut by_left: FxHashMap<Vec<u8>, FxHashMap<Vec<u8>, u32>> = FxHashMap::default();
        for ((left, right), rank) in merge_ranks {
            if !token_table.contains_key(&left) {
                return Err(VocabError::UnknownMergeSymbol(left));
            }
            if !token_table.contains_key(&right) {
                return Err(VocabError::UnknownMergeSymbol(right));
            }
            let mut product = left.clone();
            product.extend_from_slice(&right);
            if !token_table.contains_key(&product) {
                return Err(VocabError::UnknownMergeProduct(product));
            }
            let by_right = by_left.entry(left.clone()).or_default();
            if by_right.insert(right.clone(), rank).is_some() {
                return Err(VocabError::DuplicateMergeRule { left, right });
            }
        }

        let mut special_ids = FxHashSet::default();
        for (literal, &id) in &special_tokens {
            if literal.is_empty() {
                return Err(VocabError::EmptySpecialLiteral);
            }
            if (id as usize) < len {
                return Err(VocabError::SpecialIdCollision(id));
            }
            if !special_ids.insert(id) {
                return Err(VocabError::DuplicateSpecialId(id));
            }
        }

        Ok(Self {
            name: name.into(),
            encoder: token_table,
            decoder,
            merge_ranks: by_left,
            merge_count,
            special_tokens,
            pattern: pattern.into(),
        })
    }

    /// Registry name of this vocabulary.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pre-tokenization split pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Number of entries in the dense token table (excludes special tokens).
    pub fn token_count(&self) -> usize {
        self.decoder.len()
    }

    /// Number of merge rules.
    pub fn merge_count(&self) -> usize {
        self.merge_count
    }

    /// Id of a byte sequence, if it is a token.
    pub fn id_of(&self, bytes: &[u8]) -> Option<u32> {
        self.encoder.get(bytes).copied()
    }

    /// Byte sequence of a dense-range token id.
    pub fn bytes_of(&self, id: u32) -> Option<&[u8]> {
        self.decoder.get(id as usize).map(Vec::as_slice)
    }

    /// Merge rank of an adjacent symbol pair, if a rule exists for it.
    pub fn pair_rank(&self, left: &[u8], right: &[u8]) -> Option<u32> {
        self.merge_ranks.get(left)?.get(right).copied()
    }

    /// Special-token literals and their reserved ids.
    pub fn special_tokens(&self) -> &FxHashMap<String, u32> {
        &self.special_tokens
    }
}

/// Load a tiktoken-format token table from raw bytes.
///
/// Format: `base64_token rank\n` per line.
/// Example: `SGVsbG8= 0` (where "SGVsbG8=" decodes to "Hello")
pub fn load_tiktoken_bpe(data: &[u8]) -> Result<FxHashMap<Vec<u8>, u32>, VocabError> {
    let mut table = FxHashMap::default();

    for line in data.split(|&b| b == b'\n') {
        if line.is_empty() {
            continue;
        }

        let space_pos = line
            .iter()
            .rposition(|&b| b == b' ')
            .ok_or_else(|| VocabError::ParseError("Missing space separator".to_string()))?;

        let token = STANDARD.decode(&line[..space_pos])?;

        let rank_str = std::str::from_utf8(&line[space_pos + 1..])
            .map_err(|_| VocabError::ParseError("Invalid UTF-8 in rank".to_string()))?;
        let rank: u32 = rank_str
            .trim()
            .parse()
            .map_err(|_| VocabError::ParseError(format!("Invalid rank: {}", rank_str)))?;

        table.insert(token, rank);
    }

    Ok(table)
}

/// Load a tiktoken-format token table from a file path.
pub fn load_tiktoken_bpe_file(path: &str) -> Result<FxHashMap<Vec<u8>, u32>, VocabError> {
    let data = std::fs::read(path)?;
    load_tiktoken_bpe(&data)
}

/// Recover merge rules from a ranked token table.
///
/// A pair `(left, right)` is mergeable exactly when `left`, `right`, and
/// their concatenation are all tokens, and the merge's priority is the
/// concatenation's rank. Every split point of every multi-byte token is
/// enumerated; each produced pair is unique because its concatenation pins
/// the source token.
pub fn derive_merge_ranks(token_table: &FxHashMap<Vec<u8>, u32>) -> Vec<((Vec<u8>, Vec<u8>), u32)> {
    let mut rules = Vec::new();
    for (bytes, &rank) in token_table {
        if bytes.len() < 2 {
            continue;
        }
        for split in 1..bytes.len() {
            let (left, right) = bytes.split_at(split);
            if token_table.contains_key(left) && token_table.contains_key(right) {
                rules.push(((left.to_vec(), right.to_vec()), rank));
            }
        }
    }
    rules
}
