//! Byterank - multi-vocabulary byte-level BPE tokenization engine
//!
//! Given raw text and a named vocabulary, produces the token-id sequence a
//! language model consumes; given an id sequence, reconstructs the original
//! bytes. Features:
//! - Per-vocabulary split patterns (gpt2 family, cl100k_base, o200k_base)
//! - Rank-table BPE merging with leftmost tie-breaking
//! - Aho-Corasick special-token matching with per-call allow/disallow policy
//! - Load-time vocabulary validation (dense ids, bijective tables)
//! - Tiktoken-format vocabulary loading
//! - FxHashMap lookups, LRU piece cache, Rayon batch encoding

pub mod core;

pub use crate::core::{
    byte_pair_encode, derive_merge_ranks, load_tiktoken_bpe, load_tiktoken_bpe_file,
    EncodeOptions, Pretokenizer, Registry, SpecialSet, SpecialTokenSet, Tokenizer, TokenizerError,
    VocabError, Vocabulary, CL100K_BASE_PATTERN, GPT2_PATTERN, O200K_BASE_PATTERN,
};
