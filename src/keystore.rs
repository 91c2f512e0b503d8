//! Key generation and flat-file key storage.
//!
//! Each half of a pair lives in its own PKCS#1 PEM file:
//! `<dir>/<id>_pub.pem` and `<dir>/<id>_priv.pem`.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use openssl::rsa::Rsa;

use crate::error::{CryptoError, CryptoResult};
use crate::keys::{self, PrivateKey, PublicKey};

/// Smallest modulus the generator will produce.
pub const MIN_KEY_BITS: u32 = 1024;
/// Anything below this is generated with a warning.
pub const RECOMMENDED_KEY_BITS: u32 = 2048;
/// Largest modulus the generator will produce.
pub const MAX_KEY_BITS: u32 = 8192;

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

/// Where a saved pair ended up on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPaths {
    pub public: PathBuf,
    pub private: PathBuf,
}

#[derive(Debug, Clone)]
pub struct KeyStore {
    dir: PathBuf,
}

impl KeyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Generates a fresh pair. CPU-bound; callers on an async runtime should
    /// run it on a blocking worker.
    pub fn generate(bits: u32) -> CryptoResult<KeyPair> {
        if bits < MIN_KEY_BITS {
            return Err(CryptoError::InvalidFormat(format!(
                "Key size {} is below the minimum of {} bits",
                bits, MIN_KEY_BITS
            )));
        }
        if bits > MAX_KEY_BITS {
            return Err(CryptoError::InvalidFormat(format!(
                "Key size {} is above the maximum of {} bits",
                bits, MAX_KEY_BITS
            )));
        }
        if bits < RECOMMENDED_KEY_BITS {
            tracing::warn!(
                "Generating {}-bit key; sizes below {} bits are not recommended",
                bits,
                RECOMMENDED_KEY_BITS
            );
        }

        let rsa = Rsa::generate(bits)
            .map_err(|e| CryptoError::Unexpected(format!("Key generation failed: {}", e)))?;
        let private = PrivateKey::from_rsa(rsa);
        let public = private.public_key()?;

        Ok(KeyPair { public, private })
    }

    pub fn paths(&self, id: &str) -> CryptoResult<KeyPaths> {
        check_key_id(id)?;
        Ok(KeyPaths {
            public: self.dir.join(format!("{}_pub.pem", id)),
            private: self.dir.join(format!("{}_priv.pem", id)),
        })
    }

    pub fn save(&self, id: &str, pair: &KeyPair) -> CryptoResult<KeyPaths> {
        let paths = self.paths(id)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&paths.public, pair.public.to_pem()?)?;
        write_private(&paths.private, &pair.private.to_pem()?)?;

        tracing::info!("Saved key pair '{}' to {}", id, self.dir.display());
        Ok(paths)
    }

    pub fn load_public(&self, id: &str) -> CryptoResult<PublicKey> {
        let text = fs::read_to_string(self.paths(id)?.public)?;
        keys::validate_public(&text)
    }

    pub fn load_private(&self, id: &str) -> CryptoResult<PrivateKey> {
        let text = fs::read_to_string(self.paths(id)?.private)?;
        keys::validate_private(&text)
    }

    pub fn load_pair(&self, id: &str) -> CryptoResult<KeyPair> {
        let public = self.load_public(id)?;
        let private = self.load_private(id)?;
        keys::verify_pair(&public, &private)?;
        Ok(KeyPair { public, private })
    }
}

/// Writes a private key readable by the owner only.
fn write_private(path: &Path, pem: &str) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    // `mode` only applies on creation; tighten a file that already existed.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(pem.as_bytes())
}

/// Key ids become file names, so only a path-safe subset is accepted.
fn check_key_id(id: &str) -> CryptoResult<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CryptoError::InvalidFormat(format!("Invalid key id '{}'", id)))
    }
}
