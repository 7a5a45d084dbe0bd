//! Core tokenization engine.
//!
//! Control flow for one encode call: the [`Registry`] resolves the
//! vocabulary name, the special-token scan segments the input under the
//! call's policy, the pre-tokenizer splits each ordinary segment into
//! pieces, and the merge engine collapses each piece to token ids. Decode
//! reverses the id lookup and concatenates bytes.
//!
//! # Components
//!
//! - [`Registry`]: named, insertion-ordered set of loaded vocabularies and
//!   the engine-level `encode`/`decode` entry points
//! - [`Vocabulary`]: immutable token table, merge ranks, special tokens,
//!   and split pattern, validated at load time
//! - [`Pretokenizer`]: per-vocabulary regex split with exhaustive coverage
//! - [`byte_pair_encode`]: the merge loop over one piece
//! - [`SpecialTokenSet`] / [`EncodeOptions`]: reserved-literal recognition
//!   and per-call allow/disallow policy
//! - [`Tokenizer`]: one vocabulary's full encode/decode surface, with an
//!   LRU piece cache and Rayon batch variants

mod bpe;
mod pretokenizer;
mod registry;
mod special;
mod tokenizer;
mod vocab;

pub use bpe::byte_pair_encode;
pub use pretokenizer::{Pretokenizer, CL100K_BASE_PATTERN, GPT2_PATTERN, O200K_BASE_PATTERN};
pub use registry::Registry;
pub use special::{EncodeOptions, SpecialMatch, SpecialSet, SpecialTokenSet};
pub use tokenizer::{Tokenizer, TokenizerError};
pub use vocab::{
    derive_merge_ranks, load_tiktoken_bpe, load_tiktoken_bpe_file, VocabError, Vocabulary,
};
