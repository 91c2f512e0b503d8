use serde::{Deserialize, Serialize};

// Request/Response models for the emoji encryption endpoints

// Model for encryption request (form or JSON)
#[derive(Debug, Deserialize)]
pub struct EncryptRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub public_key: String,
}

// Model for encryption response
#[derive(Debug, Serialize, Deserialize)]
pub struct EncryptResponse {
    pub encrypted_text: String,
}

// Model for decryption request (form or JSON)
#[derive(Debug, Deserialize)]
pub struct DecryptRequest {
    #[serde(default)]
    pub encrypted_text: String,
    #[serde(default)]
    pub private_key: String,
}

// Model for decryption response
#[derive(Debug, Serialize, Deserialize)]
pub struct DecryptResponse {
    pub decrypted_text: String,
}

// Model for key pair validation request
#[derive(Debug, Deserialize)]
pub struct ValidateKeysRequest {
    pub public_key: Option<String>,
    pub private_key: Option<String>,
}

// Model for key pair validation response
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateKeysResponse {
    pub valid: bool,
    pub error: Option<String>,
}

// Model for key generation request
#[derive(Debug, Default, Deserialize)]
pub struct GenerateKeysRequest {
    pub key_id: Option<String>,
    pub bits: Option<u32>,
}

// Model for generated key pair
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyPairResponse {
    pub public_key: String,
    pub private_key: String,
    pub bits: u32,
}

// Model for error responses
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

// Model for service statistics
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub version: String,
}
