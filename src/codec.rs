//! Printable-ASCII to emoji codec.
//!
//! Every byte in `0x20..=0x7E` owns exactly one emoji; the alphabet index is
//! `byte - 0x20`. Encoding and decoding are strict: a byte outside the range or
//! a character outside the alphabet is an error, never skipped.

use std::collections::HashMap;

use crate::error::{CryptoError, CryptoResult};

/// First byte value covered by the alphabet (space).
pub const FIRST_BYTE: u8 = 0x20;
/// Last byte value covered by the alphabet (tilde).
pub const LAST_BYTE: u8 = 0x7E;
/// Number of symbols in an alphabet.
pub const ALPHABET_LEN: usize = (LAST_BYTE - FIRST_BYTE) as usize + 1;

/// Default alphabet: U+1F600..=U+1F64F followed by U+1F910..=U+1F91E.
/// All single code points, so decoding walks `chars()` directly.
#[rustfmt::skip]
pub const STANDARD_ALPHABET: [char; ALPHABET_LEN] = [
    '😀', '😁', '😂', '😃', '😄', '😅', '😆', '😇', '😈', '😉',
    '😊', '😋', '😌', '😍', '😎', '😏', '😐', '😑', '😒', '😓',
    '😔', '😕', '😖', '😗', '😘', '😙', '😚', '😛', '😜', '😝',
    '😞', '😟', '😠', '😡', '😢', '😣', '😤', '😥', '😦', '😧',
    '😨', '😩', '😪', '😫', '😬', '😭', '😮', '😯', '😰', '😱',
    '😲', '😳', '😴', '😵', '😶', '😷', '😸', '😹', '😺', '😻',
    '😼', '😽', '😾', '😿', '🙀', '🙁', '🙂', '🙃', '🙄', '🙅',
    '🙆', '🙇', '🙈', '🙉', '🙊', '🙋', '🙌', '🙍', '🙎', '🙏',
    '🤐', '🤑', '🤒', '🤓', '🤔', '🤕', '🤖', '🤗', '🤘', '🤙',
    '🤚', '🤛', '🤜', '🤝', '🤞',
];

/// Bidirectional byte <-> emoji table. Built once, then shared read-only.
#[derive(Debug, Clone)]
pub struct EmojiCodec {
    symbols: Vec<char>,
    reverse: HashMap<char, u8>,
}

impl EmojiCodec {
    pub fn standard() -> Self {
        // The built-in table is fixed and distinct, so this cannot fail.
        Self::build(STANDARD_ALPHABET.to_vec())
    }

    /// Builds a codec from a custom alphabet of exactly 95 distinct symbols.
    pub fn from_symbols(symbols: &[char]) -> CryptoResult<Self> {
        if symbols.len() != ALPHABET_LEN {
            return Err(CryptoError::InvalidFormat(format!(
                "alphabet must have {} symbols, got {}",
                ALPHABET_LEN,
                symbols.len()
            )));
        }

        let codec = Self::build(symbols.to_vec());
        if codec.reverse.len() != ALPHABET_LEN {
            return Err(CryptoError::InvalidFormat(
                "alphabet contains duplicate symbols".to_string(),
            ));
        }

        Ok(codec)
    }

    fn build(symbols: Vec<char>) -> Self {
        let reverse = symbols
            .iter()
            .enumerate()
            .map(|(i, &symbol)| (symbol, FIRST_BYTE + i as u8))
            .collect();

        Self { symbols, reverse }
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub fn encode(&self, data: &[u8]) -> CryptoResult<String> {
        data.iter()
            .map(|&b| self.symbol_for(b).ok_or(CryptoError::ByteOutOfRange(b)))
            .collect()
    }

    pub fn decode(&self, text: &str) -> CryptoResult<Vec<u8>> {
        if text.is_empty() {
            return Err(CryptoError::InvalidSymbolSequence(
                "no symbols to decode".to_string(),
            ));
        }

        text.chars()
            .enumerate()
            .map(|(pos, symbol)| {
                self.reverse.get(&symbol).copied().ok_or_else(|| {
                    CryptoError::InvalidSymbolSequence(format!(
                        "unknown symbol {:?} at position {}",
                        symbol, pos
                    ))
                })
            })
            .collect()
    }

    fn symbol_for(&self, byte: u8) -> Option<char> {
        if !(FIRST_BYTE..=LAST_BYTE).contains(&byte) {
            return None;
        }
        self.symbols.get((byte - FIRST_BYTE) as usize).copied()
    }
}

impl Default for EmojiCodec {
    fn default() -> Self {
        Self::standard()
    }
}
