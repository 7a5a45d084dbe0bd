//! Round-trip and determinism properties of the encode/decode pipeline.
//!
//! The vocabulary here is small and hand-built: all 256 single bytes plus
//! the merge chain he → ll → hell → hello, so expected id sequences can be
//! pinned exactly.

use rustc_hash::FxHashMap;

use byterank::{EncodeOptions, Tokenizer, Vocabulary};

fn test_tokenizer() -> Tokenizer {
    let mut table = FxHashMap::default();
    for b in 0u8..=255 {
        table.insert(vec![b], b as u32);
    }
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
    let mut special = FxHashMap::default();
    special.insert("<|endoftext|>".to_string(), 300);

    let vocab = Vocabulary::new("roundtrip", table, merges, special, r"\S+|\s+").unwrap();
    Tokenizer::new(vocab).unwrap()
}

#[test]
fn test_roundtrip_is_byte_exact() {
    let tokenizer = test_tokenizer();

    let test_cases = [
        "hello, world!",
        "The quick brown fox jumps over the lazy dog.",
        "1234567890",
        "Special characters: !@#$%^&*()",
        "Multi-line\ntext\nwith\nnewlines",
        "  leading and trailing whitespace  ",
        "Unicode: こんにちは 世界 🦀",
    ];

    for text in test_cases {
        let tokens = tokenizer.encode(text, &EncodeOptions::default()).unwrap();
        let decoded = tokenizer.decode(&tokens).unwrap();
        assert_eq!(decoded, text, "roundtrip failed for: {:?}", text);
    }
}

#[test]
fn test_roundtrip_bytes_without_text_detour() {
    let tokenizer = test_tokenizer();
    let text = "hellohello hell hello";
    let tokens = tokenizer.encode_ordinary(text).unwrap();
    assert_eq!(tokenizer.decode_bytes(&tokens).unwrap(), text.as_bytes());
}

#[test]
fn test_encode_is_deterministic() {
    let tokenizer = test_tokenizer();
    let text = "hello hello hello world";
    let first = tokenizer.encode_ordinary(text).unwrap();
    for _ in 0..10 {
        assert_eq!(tokenizer.encode_ordinary(text).unwrap(), first);
    }
}

#[test]
fn test_pinned_id_sequence() {
    let tokenizer = test_tokenizer();
    // "hello" collapses through the full merge chain; "world" stays bytes.
    assert_eq!(
        tokenizer.encode_ordinary("hello world").unwrap(),
        vec![259, 32, 119, 111, 114, 108, 100]
    );
    // "hell" stops one merge short of "hello".
    assert_eq!(tokenizer.encode_ordinary("hell").unwrap(), vec![258]);
}

#[test]
fn test_empty_input_boundaries() {
    let tokenizer = test_tokenizer();
    assert!(tokenizer
        .encode("", &EncodeOptions::default())
        .unwrap()
        .is_empty());
    assert!(tokenizer.decode_bytes(&[]).unwrap().is_empty());
    assert_eq!(tokenizer.decode(&[]).unwrap(), "");
}

#[test]
fn test_single_byte_input() {
    let tokenizer = test_tokenizer();
    assert_eq!(tokenizer.encode_ordinary("x").unwrap(), vec![120]);
}

#[test]
fn test_batch_agrees_with_sequential() {
    let tokenizer = test_tokenizer();
    let texts: Vec<String> = (0..32).map(|i| format!("hello world {}", i)).collect();
    let batch = tokenizer
        .encode_batch(&texts, &EncodeOptions::default())
        .unwrap();
    for (text, tokens) in texts.iter().zip(&batch) {
        assert_eq!(tokens, &tokenizer.encode_ordinary(text).unwrap());
    }
    let decoded = tokenizer.decode_batch(&batch).unwrap();
    assert_eq!(decoded, texts);
}
