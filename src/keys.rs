//! RSA key material: parsing, sanity checks and pair verification.

use std::ffi::c_int;
use std::fmt;

use openssl::bn::BigNumRef;
use openssl::pkey::{Private, Public};
use openssl::rsa::{Padding, Rsa};

use crate::error::{CryptoError, CryptoResult};

pub const PUBLIC_KEY_HEADER: &str = "-----BEGIN RSA PUBLIC KEY-----";
pub const PUBLIC_KEY_FOOTER: &str = "-----END RSA PUBLIC KEY-----";

/// PKCS#1 v1.5 encryption padding overhead in bytes.
pub const PKCS1_OVERHEAD: usize = 11;

/// Plaintext used to prove that two keys actually work together.
const PROBE_MESSAGE: &[u8] = b"test";

/// Labels accepted when re-assembling a mangled private key.
const PRIVATE_KEY_LABELS: [&str; 2] = ["RSA PRIVATE KEY", "PRIVATE KEY"];

const PEM_LINE_WIDTH: usize = 64;

/// `RSA_PKCS1_NO_IMPLICIT_REJECT_PADDING`, added in OpenSSL 3.2.
const PKCS1_NO_IMPLICIT_REJECT: c_int = 8;

/// OpenSSL 3.2+ answers a bad PKCS#1 v1.5 block with a synthetic plaintext
/// unless explicit rejection is requested.
fn decrypt_padding() -> Padding {
    if openssl::version::number() >= 0x3020_0000 {
        Padding::from_raw(PKCS1_NO_IMPLICIT_REJECT)
    } else {
        Padding::PKCS1
    }
}

/// An RSA public key (n, e). Immutable once parsed.
#[derive(Clone)]
pub struct PublicKey {
    rsa: Rsa<Public>,
}

impl PublicKey {
    /// Parses PKCS#1 PEM text without any marker checks beyond the parser's own.
    pub fn from_pkcs1_pem(text: &str) -> CryptoResult<Self> {
        let rsa = Rsa::public_key_from_pem_pkcs1(text.trim().as_bytes())
            .map_err(|e| CryptoError::InvalidFormat(format!("Invalid public key format: {}", e)))?;
        Ok(Self { rsa })
    }

    pub fn to_pem(&self) -> CryptoResult<String> {
        let pem = self
            .rsa
            .public_key_to_pem_pkcs1()
            .map_err(|e| CryptoError::Unexpected(format!("Failed to export public key: {}", e)))?;
        String::from_utf8(pem).map_err(|e| CryptoError::Unexpected(e.to_string()))
    }

    pub fn modulus(&self) -> &BigNumRef {
        self.rsa.n()
    }

    /// Modulus length in bytes; also the ciphertext length.
    pub fn size(&self) -> usize {
        self.rsa.size() as usize
    }

    pub fn bits(&self) -> u32 {
        self.modulus().num_bits() as u32
    }

    /// Largest plaintext this key can carry under PKCS#1 v1.5.
    pub fn max_plaintext_len(&self) -> usize {
        self.size().saturating_sub(PKCS1_OVERHEAD)
    }

    /// RSA-PKCS1-v1.5 encryption. Padding is random, so repeated calls differ.
    pub fn encrypt_pkcs1(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        let max = self.max_plaintext_len();
        if data.len() > max {
            return Err(CryptoError::MessageTooLong {
                size: data.len(),
                max,
            });
        }

        let mut buf = vec![0; self.size()];
        let encrypted_len = self
            .rsa
            .public_encrypt(data, &mut buf, Padding::PKCS1)
            .map_err(|e| CryptoError::Unexpected(format!("Encryption failed: {}", e)))?;
        buf.truncate(encrypted_len);

        Ok(buf)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("bits", &self.bits())
            .finish()
    }
}

/// An RSA private key, including CRT parameters when the encoding carries them.
#[derive(Clone)]
pub struct PrivateKey {
    rsa: Rsa<Private>,
}

impl PrivateKey {
    pub(crate) fn from_rsa(rsa: Rsa<Private>) -> Self {
        Self { rsa }
    }

    /// Parses PEM text as-is.
    pub fn from_pem(text: &str) -> CryptoResult<Self> {
        let rsa = Rsa::private_key_from_pem(text.trim().as_bytes())
            .map_err(|e| CryptoError::InvalidFormat(format!("Invalid private key format: {}", e)))?;
        Ok(Self { rsa })
    }

    pub fn to_pem(&self) -> CryptoResult<String> {
        let pem = self
            .rsa
            .private_key_to_pem()
            .map_err(|e| CryptoError::Unexpected(format!("Failed to export private key: {}", e)))?;
        String::from_utf8(pem).map_err(|e| CryptoError::Unexpected(e.to_string()))
    }

    pub fn public_key(&self) -> CryptoResult<PublicKey> {
        let n = self.rsa.n().to_owned();
        let e = self.rsa.e().to_owned();
        let rsa = n
            .and_then(|n| e.and_then(|e| Rsa::from_public_components(n, e)))
            .map_err(|e| CryptoError::Unexpected(format!("Failed to derive public key: {}", e)))?;
        Ok(PublicKey { rsa })
    }

    pub fn modulus(&self) -> &BigNumRef {
        self.rsa.n()
    }

    pub fn size(&self) -> usize {
        self.rsa.size() as usize
    }

    pub fn bits(&self) -> u32 {
        self.modulus().num_bits() as u32
    }

    /// RSA-PKCS1-v1.5 decryption. Any unpad failure is `DecryptionFailed`.
    pub fn decrypt_pkcs1(&self, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        let mut buf = vec![0; self.size()];
        let decrypted_len = self
            .rsa
            .private_decrypt(ciphertext, &mut buf, decrypt_padding())
            .map_err(|e| {
                tracing::debug!("PKCS#1 decryption rejected ciphertext: {}", e);
                CryptoError::DecryptionFailed
            })?;
        buf.truncate(decrypted_len);

        Ok(buf)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

/// Strict public key check: trimmed text must carry the PKCS#1 public key
/// header and footer, then parse.
pub fn validate_public(text: &str) -> CryptoResult<PublicKey> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CryptoError::InvalidFormat("Key is empty".to_string()));
    }
    if !text.starts_with(PUBLIC_KEY_HEADER) {
        return Err(CryptoError::InvalidFormat(format!(
            "Public key must start with '{}'",
            PUBLIC_KEY_HEADER
        )));
    }
    if !text.ends_with(PUBLIC_KEY_FOOTER) {
        return Err(CryptoError::InvalidFormat(format!(
            "Public key must end with '{}'",
            PUBLIC_KEY_FOOTER
        )));
    }

    PublicKey::from_pkcs1_pem(text)
}

/// Lenient private key check: parse as-is, then retry once with the body's
/// whitespace removed and the PEM lines rebuilt.
pub fn validate_private(text: &str) -> CryptoResult<PrivateKey> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CryptoError::InvalidFormat("Key is empty".to_string()));
    }

    PrivateKey::from_pem(text).or_else(|first| {
        tracing::debug!("Private key did not parse as-is, retrying after reflow: {}", first);
        PrivateKey::from_pem(&reflow_private_pem(text))
            .map_err(|_| CryptoError::InvalidFormat("Invalid private key format".to_string()))
    })
}

/// Checks that both keys parse, share a modulus, and round-trip a probe.
pub fn validate_pair(public_text: &str, private_text: &str) -> CryptoResult<()> {
    let public_key = PublicKey::from_pkcs1_pem(public_text)?;
    let private_key = validate_private(private_text)?;

    verify_pair(&public_key, &private_key)
}

/// Pair verification on already-parsed keys.
pub fn verify_pair(public_key: &PublicKey, private_key: &PrivateKey) -> CryptoResult<()> {
    if public_key.modulus() != private_key.modulus() {
        return Err(CryptoError::Mismatch("moduli differ".to_string()));
    }

    let ciphertext = public_key
        .encrypt_pkcs1(PROBE_MESSAGE)
        .map_err(|e| CryptoError::Mismatch(format!("Key pair test failed: {}", e)))?;
    let recovered = private_key
        .decrypt_pkcs1(&ciphertext)
        .map_err(|e| CryptoError::Mismatch(format!("Key pair test failed: {}", e)))?;

    if recovered != PROBE_MESSAGE {
        return Err(CryptoError::Mismatch(
            "probe message did not round-trip".to_string(),
        ));
    }

    Ok(())
}

/// Drops every whitespace character and re-wraps the base64 body at 64
/// columns. Bare base64 without markers is treated as a PKCS#1 private key.
fn reflow_private_pem(text: &str) -> String {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    for label in PRIVATE_KEY_LABELS {
        let squeezed = label.replace(' ', "");
        let begin = format!("-----BEGIN{}-----", squeezed);
        let end = format!("-----END{}-----", squeezed);

        if let Some(body) = compact
            .strip_prefix(begin.as_str())
            .and_then(|rest| rest.strip_suffix(end.as_str()))
        {
            return wrap_pem(label, body);
        }
    }

    wrap_pem(PRIVATE_KEY_LABELS[0], &compact)
}

fn wrap_pem(label: &str, body: &str) -> String {
    let chars: Vec<char> = body.chars().collect();
    let mut pem = format!("-----BEGIN {}-----\n", label);
    for line in chars.chunks(PEM_LINE_WIDTH) {
        pem.extend(line);
        pem.push('\n');
    }
    pem.push_str(&format!("-----END {}-----\n", label));
    pem
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::KeyStore;

    fn pems(bits: u32) -> (String, String) {
        let pair = KeyStore::generate(bits).unwrap();
        (pair.public.to_pem().unwrap(), pair.private.to_pem().unwrap())
    }

    #[test]
    fn test_validate_public_accepts_pkcs1_pem() {
        let (public_pem, _) = pems(1024);
        let key = validate_public(&format!("\n  {}  \n", public_pem)).unwrap();
        assert_eq!(key.bits(), 1024);
    }

    #[test]
    fn test_validate_public_requires_header() {
        let (public_pem, _) = pems(1024);
        let headless = public_pem.replacen(PUBLIC_KEY_HEADER, "", 1);
        match validate_public(&headless) {
            Err(CryptoError::InvalidFormat(msg)) => assert!(msg.contains("must start with")),
            other => panic!("expected InvalidFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_public_requires_footer() {
        let (public_pem, _) = pems(1024);
        let footless = public_pem.replacen(PUBLIC_KEY_FOOTER, "", 1);
        assert!(matches!(
            validate_public(&footless),
            Err(CryptoError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_validate_public_rejects_garbage_between_markers() {
        let text = format!("{}\nnot base64 at all\n{}", PUBLIC_KEY_HEADER, PUBLIC_KEY_FOOTER);
        assert!(matches!(
            validate_public(&text),
            Err(CryptoError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_validate_private_tolerates_mangled_whitespace() {
        let (_, private_pem) = pems(1024);
        let mangled: String = private_pem
            .lines()
            .map(|line| {
                if line.starts_with("-----") {
                    line.to_string()
                } else {
                    line.chars()
                        .enumerate()
                        .flat_map(|(i, c)| if i % 20 == 19 { vec![c, ' '] } else { vec![c] })
                        .collect()
                }
            })
            .collect::<Vec<_>>()
            .join("  \r\n ");

        let key = validate_private(&mangled).unwrap();
        assert_eq!(key.bits(), 1024);
    }

    #[test]
    fn test_validate_private_accepts_bare_body() {
        let (_, private_pem) = pems(1024);
        let body: String = private_pem
            .lines()
            .filter(|line| !line.starts_with("-----"))
            .collect();
        assert!(validate_private(&body).is_ok());
    }

    #[test]
    fn test_validate_private_rejects_garbage() {
        assert!(matches!(
            validate_private("definitely not a key"),
            Err(CryptoError::InvalidFormat(_))
        ));
        assert!(matches!(
            validate_private("   "),
            Err(CryptoError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_validate_pair_accepts_matching_keys() {
        let (public_pem, private_pem) = pems(1024);
        validate_pair(&public_pem, &private_pem).unwrap();
    }

    #[test]
    fn test_validate_pair_detects_mismatch() {
        let (public_pem, _) = pems(1024);
        let (_, other_private) = pems(1024);
        assert!(matches!(
            validate_pair(&public_pem, &other_private),
            Err(CryptoError::Mismatch(_))
        ));
    }

    #[test]
    fn test_validate_pair_reports_parse_failure() {
        let (public_pem, _) = pems(1024);
        assert!(matches!(
            validate_pair(&public_pem, "nope"),
            Err(CryptoError::InvalidFormat(_))
        ));
        assert!(matches!(
            validate_pair("nope", "nope"),
            Err(CryptoError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_derived_public_key_matches_private() {
        let pair = KeyStore::generate(1024).unwrap();
        let derived = pair.private.public_key().unwrap();
        assert_eq!(derived.modulus(), pair.public.modulus());
        verify_pair(&derived, &pair.private).unwrap();
    }

    #[test]
    fn test_encrypt_respects_pkcs1_overhead() {
        let pair = KeyStore::generate(1024).unwrap();
        assert_eq!(pair.public.max_plaintext_len(), 128 - 11);
        assert!(pair.public.encrypt_pkcs1(&[b'a'; 117]).is_ok());
        assert!(matches!(
            pair.public.encrypt_pkcs1(&[b'a'; 118]),
            Err(CryptoError::MessageTooLong { size: 118, max: 117 })
        ));
    }

    #[test]
    fn test_wrong_key_decryption_fails() {
        let pair = KeyStore::generate(1024).unwrap();
        let other = KeyStore::generate(1024).unwrap();
        let ciphertext = pair.public.encrypt_pkcs1(b"secret").unwrap();
        assert!(matches!(
            other.private.decrypt_pkcs1(&ciphertext),
            Err(CryptoError::DecryptionFailed)
        ));
    }
}
