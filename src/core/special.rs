//! Special-token recognition and per-call policy.
//!
//! Special tokens are literal strings with reserved ids outside the dense
//! token-id range. During encoding they are recognized before the
//! pre-tokenizer runs, by a leftmost-longest Aho-Corasick scan over every
//! registered literal, and each occurrence is resolved against the call's
//! [`EncodeOptions`]: emit the reserved id, reject the call, or fall through
//! to ordinary byte-level encoding.

use aho_corasick::{AhoCorasick, BuildError, MatchKind};
use rustc_hash::{FxHashMap, FxHashSet};

/// One occurrence of a special literal in the input text.
pub struct SpecialMatch<'a> {
    pub start: usize,
    pub end: usize,
    pub literal: &'a str,
}

/// The registered special literals of one vocabulary, with their matcher.
pub struct SpecialTokenSet {
    by_literal: FxHashMap<String, u32>,
    by_id: FxHashMap<u32, String>,
    literals: Vec<String>,
    matcher: Option<AhoCorasick>,
}

impl SpecialTokenSet {
    /// Build the literal/id tables and the Aho-Corasick automaton.
    ///
    /// Overlapping literals resolve leftmost-longest: the longest literal
    /// starting earliest wins.
    pub fn new(tokens: &FxHashMap<String, u32>) -> Result<Self, BuildError> {
        let literals: Vec<String> = tokens.keys().cloned().collect();
        let matcher = if literals.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::builder()
                    .match_kind(MatchKind::LeftmostLongest)
                    .build(&literals)?,
            )
        };
        let by_id = tokens.iter().map(|(k, v)| (*v, k.clone())).collect();

        Ok(Self {
            by_literal: tokens.clone(),
            by_id,
            literals,
            matcher,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.by_literal.is_empty()
    }

    /// Reserved id of a registered literal.
    pub fn id_of(&self, literal: &str) -> Option<u32> {
        self.by_literal.get(literal).copied()
    }

    /// Literal of a reserved id.
    pub fn literal_of(&self, id: u32) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// Occurrences of any registered literal in `text`, in order,
    /// non-overlapping, leftmost-longest.
    pub fn occurrences(&self, text: &str) -> Vec<SpecialMatch<'_>> {
        let Some(ref matcher) = self.matcher else {
            return Vec::new();
        };
        matcher
            .find_iter(text)
            .map(|m| SpecialMatch {
                start: m.start(),
                end: m.end(),
                literal: &self.literals[m.pattern().as_usize()],
            })
            .collect()
    }
}

/// A group of special tokens named by a call: every registered literal, or
/// an explicit set of literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialSet {
    All,
    Names(FxHashSet<String>),
}

impl SpecialSet {
    /// The empty set of names.
    pub fn none() -> Self {
        Self::Names(FxHashSet::default())
    }

    /// An explicit set of literal names.
    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Names(names.into_iter().map(Into::into).collect())
    }

    fn contains(&self, literal: &str) -> bool {
        match self {
            Self::All => true,
            Self::Names(names) => names.contains(literal),
        }
    }
}

/// How one special-literal occurrence is handled under a policy.
pub(crate) enum SpecialTreatment {
    /// Emit the reserved id, skipping BPE for the span.
    Emit,
    /// Fail the call with `DisallowedSpecialToken`.
    Reject,
    /// Leave the span for ordinary byte-level encoding.
    Ordinary,
}

/// Per-call special-token policy.
///
/// The default rejects every special literal found in the input; recognizing
/// or ignoring specials is an explicit opt-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    pub allowed_special: SpecialSet,
    pub disallowed_special: SpecialSet,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            allowed_special: SpecialSet::none(),
            disallowed_special: SpecialSet::All,
        }
    }
}

impl EncodeOptions {
    /// Recognize every registered special literal.
    pub fn allow_all() -> Self {
        Self {
            allowed_special: SpecialSet::All,
            disallowed_special: SpecialSet::none(),
        }
    }

    /// Treat every special literal as ordinary text.
    pub fn ordinary() -> Self {
        Self {
            allowed_special: SpecialSet::none(),
            disallowed_special: SpecialSet::none(),
        }
    }

    /// Recognize the named literals, reject all others.
    pub fn allow<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_special: SpecialSet::names(names),
            disallowed_special: SpecialSet::All,
        }
    }

    /// Resolve this policy for one literal. An explicit disallow entry wins
    /// over any allow; `disallowed_special: All` defers to the allowed set.
    pub(crate) fn treatment(&self, literal: &str) -> SpecialTreatment {
        if let SpecialSet::Names(ref names) = self.disallowed_special {
            if names.contains(literal) {
                return SpecialTreatment::Reject;
            }
        }
        if self.allowed_special.contains(literal) {
            return SpecialTreatment::Emit;
        }
        if self.disallowed_special == SpecialSet::All {
            return SpecialTreatment::Reject;
        }
        SpecialTreatment::Ordinary
    }
}
