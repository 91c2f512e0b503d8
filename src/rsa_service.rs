use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::codec::EmojiCodec;
use crate::error::{CryptoError, CryptoResult};
use crate::keys::{PrivateKey, PublicKey};

/// Default cap on message length, in characters.
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 1000;

// Text <-> RSA ciphertext <-> emoji pipelines. Keys are passed per call; the
// service itself only holds the shared codec and limits.
#[derive(Debug, Clone)]
pub struct RsaService {
    codec: Arc<EmojiCodec>,
    max_message_chars: usize,
}

impl RsaService {
    pub fn new(codec: Arc<EmojiCodec>, max_message_chars: usize) -> Self {
        Self {
            codec,
            max_message_chars,
        }
    }

    pub fn codec(&self) -> &EmojiCodec {
        &self.codec
    }

    pub fn max_message_chars(&self) -> usize {
        self.max_message_chars
    }

    /// message -> PKCS#1 v1.5 ciphertext -> emoji.
    pub fn encrypt(&self, message: &str, public_key: &PublicKey) -> CryptoResult<String> {
        if message.is_empty() {
            return Err(CryptoError::EmptyMessage);
        }

        let chars = message.chars().count();
        if chars > self.max_message_chars {
            return Err(CryptoError::MessageTooLong {
                size: chars,
                max: self.max_message_chars,
            });
        }

        let ciphertext = public_key.encrypt_pkcs1(message.as_bytes())?;
        tracing::debug!("Encrypted {} bytes to {} bytes", message.len(), ciphertext.len());

        self.armor(&ciphertext)
    }

    /// emoji -> ciphertext -> PKCS#1 v1.5 plaintext -> UTF-8.
    pub fn decrypt(&self, symbols: &str, private_key: &PrivateKey) -> CryptoResult<String> {
        let ciphertext = self.unarmor(symbols, private_key.size())?;
        let plaintext = private_key.decrypt_pkcs1(&ciphertext)?;
        tracing::debug!("Decrypted {} bytes", plaintext.len());

        String::from_utf8(plaintext).map_err(|_| CryptoError::InvalidUtf8)
    }

    /// Renders raw ciphertext as emoji. The ciphertext is base64'd first so
    /// every byte handed to the codec is printable ASCII.
    pub fn armor(&self, ciphertext: &[u8]) -> CryptoResult<String> {
        self.codec.encode(STANDARD.encode(ciphertext).as_bytes())
    }

    /// Inverse of [`armor`](Self::armor). A well-formed sequence whose
    /// ciphertext is not one modulus long was made for a different key, so
    /// that is `DecryptionFailed` rather than a format error.
    pub fn unarmor(&self, symbols: &str, expected_len: usize) -> CryptoResult<Vec<u8>> {
        let armored = self.codec.decode(symbols.trim())?;
        let ciphertext = STANDARD.decode(&armored).map_err(|e| {
            CryptoError::InvalidSymbolSequence(format!("not a valid ciphertext encoding: {}", e))
        })?;

        if ciphertext.len() != expected_len {
            tracing::debug!(
                "ciphertext is {} bytes, key expects {}",
                ciphertext.len(),
                expected_len
            );
            return Err(CryptoError::DecryptionFailed);
        }

        Ok(ciphertext)
    }
}

impl Default for RsaService {
    fn default() -> Self {
        Self::new(Arc::new(EmojiCodec::standard()), DEFAULT_MAX_MESSAGE_CHARS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::{KeyPair, KeyStore};

    fn pair(bits: u32) -> KeyPair {
        KeyStore::generate(bits).unwrap()
    }

    #[test]
    fn test_hello_message_roundtrip_2048() {
        let service = RsaService::default();
        let keys = pair(2048);
        let message = "Hello, this is a test message!";

        let ciphertext = keys.public.encrypt_pkcs1(message.as_bytes()).unwrap();
        assert_eq!(ciphertext.len(), 256);

        let emoji = service.armor(&ciphertext).unwrap();
        assert_eq!(service.unarmor(&emoji, 256).unwrap(), ciphertext);
        assert_eq!(service.decrypt(&emoji, &keys.private).unwrap(), message);

        let emoji = service.encrypt(message, &keys.public).unwrap();
        assert_eq!(service.decrypt(&emoji, &keys.private).unwrap(), message);
    }

    #[test]
    fn test_output_is_all_alphabet_symbols() {
        let service = RsaService::default();
        let keys = pair(1024);
        let emoji = service.encrypt("abc", &keys.public).unwrap();

        // 128 ciphertext bytes -> 172 base64 characters -> 172 symbols.
        assert_eq!(emoji.chars().count(), 172);
        assert!(emoji.chars().all(|c| service.codec().symbols().contains(&c)));
    }

    #[test]
    fn test_encryption_is_randomized() {
        let service = RsaService::default();
        let keys = pair(1024);
        let a = service.encrypt("same message", &keys.public).unwrap();
        let b = service.encrypt("same message", &keys.public).unwrap();
        assert_ne!(a, b);
        assert_eq!(service.decrypt(&a, &keys.private).unwrap(), "same message");
        assert_eq!(service.decrypt(&b, &keys.private).unwrap(), "same message");
    }

    #[test]
    fn test_multibyte_messages_roundtrip() {
        let service = RsaService::default();
        let keys = pair(1024);
        for message in ["héllo wörld", "秘密のメッセージ", "emoji inside 🔐 too", " "] {
            let emoji = service.encrypt(message, &keys.public).unwrap();
            assert_eq!(service.decrypt(&emoji, &keys.private).unwrap(), message);
        }
    }

    #[test]
    fn test_largest_message_that_fits() {
        let service = RsaService::default();
        let keys = pair(1024);
        let message = "x".repeat(keys.public.max_plaintext_len());
        let emoji = service.encrypt(&message, &keys.public).unwrap();
        assert_eq!(service.decrypt(&emoji, &keys.private).unwrap(), message);
    }

    #[test]
    fn test_oversize_message_is_rejected() {
        let service = RsaService::default();
        let keys = pair(2048);
        let message = "x".repeat(246);
        assert!(matches!(
            service.encrypt(&message, &keys.public),
            Err(CryptoError::MessageTooLong { size: 246, max: 245 })
        ));

        // Three bytes per character: 90 chars is under the char cap but over capacity.
        let wide = "€".repeat(90);
        assert!(matches!(
            service.encrypt(&wide, &keys.public),
            Err(CryptoError::MessageTooLong { size: 270, max: 245 })
        ));
    }

    #[test]
    fn test_character_limit_is_enforced() {
        let service = RsaService::new(Arc::new(EmojiCodec::standard()), 10);
        let keys = pair(1024);
        assert!(matches!(
            service.encrypt("eleven char", &keys.public),
            Err(CryptoError::MessageTooLong { size: 11, max: 10 })
        ));
        assert!(service.encrypt("ten chars!", &keys.public).is_ok());
    }

    #[test]
    fn test_empty_message_is_rejected() {
        let service = RsaService::default();
        let keys = pair(1024);
        assert!(matches!(
            service.encrypt("", &keys.public),
            Err(CryptoError::EmptyMessage)
        ));
    }

    #[test]
    fn test_wrong_key_is_decryption_failed() {
        let service = RsaService::default();
        let alice = pair(2048);
        let bob = pair(2048);
        let emoji = service.encrypt("for alice only", &alice.public).unwrap();
        assert!(matches!(
            service.decrypt(&emoji, &bob.private),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_unknown_symbol_is_rejected_not_skipped() {
        let service = RsaService::default();
        let keys = pair(1024);
        let emoji = service.encrypt("hi", &keys.public).unwrap();
        let corrupted = format!("{}🔥", emoji);
        assert!(matches!(
            service.decrypt(&corrupted, &keys.private),
            Err(CryptoError::InvalidSymbolSequence(_))
        ));
    }

    #[test]
    fn test_broken_base64_is_invalid_sequence() {
        let service = RsaService::default();
        let keys = pair(1024);
        let emoji = service.encrypt("hi", &keys.public).unwrap();
        // 170 of 172 symbols: not a whole number of base64 quads.
        let truncated: String = emoji.chars().take(170).collect();
        assert!(matches!(
            service.decrypt(&truncated, &keys.private),
            Err(CryptoError::InvalidSymbolSequence(_))
        ));
    }

    #[test]
    fn test_short_ciphertext_is_decryption_failed() {
        let service = RsaService::default();
        let keys = pair(1024);
        let emoji = service.encrypt("hi", &keys.public).unwrap();
        // 168 symbols decode cleanly to 126 bytes, two short of the modulus.
        let truncated: String = emoji.chars().take(168).collect();
        assert!(matches!(
            service.decrypt(&truncated, &keys.private),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_wrong_key_of_different_size_is_decryption_failed() {
        let service = RsaService::default();
        let alice = pair(2048);
        let emoji = service.encrypt("for alice only", &alice.public).unwrap();

        for bits in [1024, 3072] {
            let other = pair(bits);
            assert!(
                matches!(
                    service.decrypt(&emoji, &other.private),
                    Err(CryptoError::DecryptionFailed)
                ),
                "{}-bit key",
                bits
            );
        }
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let service = RsaService::default();
        let keys = pair(1024);
        let emoji = service.encrypt("padded", &keys.public).unwrap();
        let pasted = format!("\n  {}  \n", emoji);
        assert_eq!(service.decrypt(&pasted, &keys.private).unwrap(), "padded");
    }

    #[test]
    fn test_non_utf8_plaintext_is_reported() {
        let service = RsaService::default();
        let keys = pair(1024);
        let ciphertext = keys.public.encrypt_pkcs1(&[0xC3, 0x28, 0xFF]).unwrap();
        let emoji = service.armor(&ciphertext).unwrap();
        assert!(matches!(
            service.decrypt(&emoji, &keys.private),
            Err(CryptoError::InvalidUtf8)
        ));
    }
}
