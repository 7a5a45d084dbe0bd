//! The byte-pair merge loop.
//!
//! Symbols are `[start, end)` byte ranges into the piece, one byte each to
//! begin with. Each round scans every adjacent pair, looks its byte
//! sequences up in the vocabulary's merge-rank table, and fuses the
//! lowest-ranked pair in place; on rank ties the leftmost pair wins. The
//! sequence strictly shortens by one symbol per merge, so the loop runs at
//! most `piece.len() - 1` times. The full rescan per round is quadratic in
//! the piece length in the worst case; pieces are short by construction of
//! the pre-tokenizer.

use super::tokenizer::TokenizerError;
use super::vocab::Vocabulary;

/// Apply BPE merges to one pre-tokenized piece and map the final symbols to
/// token ids.
///
/// An empty piece yields an empty id sequence. A piece that is itself a
/// token short-circuits to that single id.
///
/// # Errors
/// [`TokenizerError::UnmergeableSymbol`] if a final symbol has no id in the
/// token table. Byte-level vocabularies keep every single byte in the table,
/// so hitting this indicates broken vocabulary data rather than caller
/// input.
pub fn byte_pair_encode(piece: &[u8], vocab: &Vocabulary) -> Result<Vec<u32>, TokenizerError> {
    if piece.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(id) = vocab.id_of(piece) {
        return Ok(vec![id]);
    }

    let mut symbols: Vec<(usize, usize)> = (0..piece.len()).map(|i| (i, i + 1)).collect();

    loop {
        // Strict `<` keeps the leftmost pair on rank ties.
        let mut best: Option<(u32, usize)> = None;
        for i in 0..symbols.len() - 1 {
            let left = &piece[symbols[i].0..symbols[i].1];
            let right = &piece[symbols[i + 1].0..symbols[i + 1].1];
            if let Some(rank) = vocab.pair_rank(left, right) {
                if best.map_or(true, |(r, _)| rank < r) {
                    best = Some((rank, i));
                }
            }
        }
        let Some((_, i)) = best else { break };
        symbols[i].1 = symbols[i + 1].1;
        symbols.remove(i + 1);
    }

    symbols
        .iter()
        .map(|&(start, end)| {
            let symbol = &piece[start..end];
            vocab
                .id_of(symbol)
                .ok_or_else(|| TokenizerError::UnmergeableSymbol(symbol.to_vec()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;

    fn byte_table() -> FxHashMap<Vec<u8>, u32> {
        let mut table = FxHashMap::default();
        for b in 0u8..=255 {
            table.insert(vec![b], b as u32);
        }
        table
    }

    /// Bytes plus the chain he → ll → hell → hello.
    fn hello_vocab() -> Vocabulary {
        let mut table = byte_table();
        table.insert(b"he".to_vec(), 256);
        table.insert(b"ll".to_vec(), 257);
        table.insert(b"hell".to_vec(), 258);
        table.insert(b"hello".to_vec(), 259);
        let merges = vec![
            ((b"h".to_vec(), b"e".to_vec()), 0),
            ((b"l".to_vec(), b"l".to_vec()), 1),
            ((b"he".to_vec(), b"ll".to_vec()), 2),
            ((b"hell".to_vec(), b"o".to_vec()), 3),
        ];
        Vocabulary::new("hello", table, merges, FxHashMap::default(), r"\S+|\s+").unwrap()
    }

    #[test]
    fn test_empty_piece() {
        let vocab = hello_vocab();
        assert_eq!(byte_pair_encode(b"", &vocab).unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_single_byte_piece() {
        let vocab = hello_vocab();
        assert_eq!(byte_pair_encode(b"x", &vocab).unwrap(), vec![120]);
    }

    #[test]
    fn test_merge_chain_to_single_token() {
        let vocab = hello_vocab();
        assert_eq!(byte_pair_encode(b"hello", &vocab).unwrap(), vec![259]);
    }

    #[test]
    fn test_partial_merges() {
        let vocab = hello_vocab();
        // "hell" merges all the way; the trailing "x" stays a byte.
        assert_eq!(byte_pair_encode(b"hellx", &vocab).unwrap(), vec![258, 120]);
        // No rule touches "world".
        assert_eq!(
            byte_pair_encode(b"world", &vocab).unwrap(),
            vec![119, 111, 114, 108, 100]
        );
    }

    #[test]
    fn test_leftmost_wins_on_rank_tie() {
        let mut table = byte_table();
        table.insert(b"aa".to_vec(), 256);
        let merges = vec![((b"a".to_vec(), b"a".to_vec()), 0)];
        let vocab = Vocabulary::new("aa", table, merges, FxHashMap::default(), r"\S+").unwrap();

        // Three candidate pairs share rank 0; the leftmost merges first,
        // then the remaining pair, leaving [aa, aa].
        assert_eq!(byte_pair_encode(b"aaaa", &vocab).unwrap(), vec![256, 256]);
        // Odd count: the trailing byte survives.
        assert_eq!(byte_pair_encode(b"aaa", &vocab).unwrap(), vec![256, 97]);
    }

    #[test]
    fn test_unmergeable_symbol() {
        // A dense table that deliberately lacks the byte 'z'.
        let mut table = FxHashMap::default();
        let mut next = 0u32;
        for b in 0u8..=255 {
            if b != b'z' {
                table.insert(vec![b], next);
                next += 1;
            }
        }
        let vocab = Vocabulary::new("partial", table, vec![], FxHashMap::default(), r"\S+").unwrap();

        let err = byte_pair_encode(b"z", &vocab).unwrap_err();
        assert!(matches!(err, TokenizerError::UnmergeableSymbol(ref s) if s == b"z"));
    }

    #[test]
    fn test_merge_count_bound() {
        // Every adjacent pair of bytes is mergeable somewhere in the chain;
        // the loop still terminates after at most len - 1 merges, which the
        // output length reflects: 5 bytes collapse to 1 token in 4 merges.
        let vocab = hello_vocab();
        let ids = byte_pair_encode(b"hello", &vocab).unwrap();
        assert_eq!(ids.len(), 1);
    }
}
