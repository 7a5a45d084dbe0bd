//! Byte-level pre-tokenization ahead of BPE merging.
//!
//! Raw text is partitioned into pieces by a vocabulary-specific regex before
//! any merging happens: contractions, letter runs, digit groups, punctuation
//! clusters, and whitespace runs each become their own piece, and merges
//! never cross a piece boundary. Different vocabularies carry different
//! patterns, so the pattern is data, not code.
//!
//! The split is exhaustive by construction: regex matches are emitted in
//! order, and any gap the pattern leaves between matches (or after the last
//! match) is emitted as its own piece. Concatenating the pieces always
//! reconstructs the input exactly.

use fancy_regex::Regex;

/// Split pattern shared by the gpt2, r50k_base, and p50k family vocabularies.
pub const GPT2_PATTERN: &str =
    r"'s|'t|'re|'ve|'m|'ll|'d| ?\p{L}+| ?\p{N}+| ?[^\s\p{L}\p{N}]+|\s+(?!\S)|\s+";

/// Split pattern for cl100k_base.
pub const CL100K_BASE_PATTERN: &str = r"(?i:'s|'t|'re|'ve|'m|'ll|'d)|[^\r\n\p{L}\p{N}]?\p{L}+|\p{N}{1,3}| ?[^\s\p{L}\p{N}]+[\r\n]*|\s*[\r\n]+|\s+(?!\S)|\s+";

/// Split pattern for o200k_base.
pub const O200K_BASE_PATTERN: &str = r"[^\r\n\p{L}\p{N}]?[\p{Lu}\p{Lt}\p{Lm}\p{Lo}\p{M}]*[\p{Ll}\p{Lm}\p{Lo}\p{M}]+(?i:'s|'t|'re|'ve|'m|'ll|'d)?|[^\r\n\p{L}\p{N}]?[\p{Lu}\p{Lt}\p{Lm}\p{Lo}\p{M}]+[\p{Ll}\p{Lm}\p{Lo}\p{M}]*(?i:'s|'t|'re|'ve|'m|'ll|'d)?|\p{N}{1,3}| ?[^\s\p{L}\p{N}]+[\r\n]*|\s*[\r\n]+|\s+(?!\S)|\s+";

/// Compiled per-vocabulary split pattern.
///
/// The cl100k/o200k patterns use negative lookahead (`\s+(?!\S)`), which the
/// backtracking `fancy-regex` engine supports.
pub struct Pretokenizer {
    regex: Regex,
    pattern: String,
}

impl Pretokenizer {
    /// Compile a split pattern.
    pub fn new(pattern: &str) -> Result<Self, Box<fancy_regex::Error>> {
        let regex = Regex::new(pattern).map_err(Box::new)?;
        Ok(Self {
            regex,
            pattern: pattern.to_string(),
        })
    }

    /// The source pattern this pre-tokenizer was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Partition `text` into ordered, non-overlapping pieces.
    ///
    /// Every byte of the input lands in exactly one piece; bytes the pattern
    /// does not match are recovered as gap pieces so the concatenation of
    /// the result is always the input.
    pub fn split<'t>(&self, text: &'t str) -> Result<Vec<&'t str>, Box<fancy_regex::Error>> {
        let mut pieces = Vec::new();
        let mut cursor = 0;

        for mat in self.regex.find_iter(text) {
            let m = mat.map_err(Box::new)?;
            if m.start() > cursor {
                pieces.push(&text[cursor..m.start()]);
            }
            if !m.as_str().is_empty() {
                pieces.push(m.as_str());
            }
            cursor = m.end();
        }
        if cursor < text.len() {
            pieces.push(&text[cursor..]);
        }

        Ok(pieces)
    }
}
