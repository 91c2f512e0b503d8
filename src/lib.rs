// This file allows the components to be used as a library as well
pub mod codec;
pub mod config;
pub mod error;
pub mod handlers;
pub mod keys;
pub mod keystore;
pub mod models;
pub mod routes;
pub mod rsa_service;
pub mod state;

// Re-export important types for easier use
pub use codec::EmojiCodec;
pub use error::{CryptoError, CryptoResult, ServiceError};
pub use keys::{PrivateKey, PublicKey, validate_pair, validate_private, validate_public};
pub use keystore::{KeyPair, KeyStore};
pub use rsa_service::RsaService;
