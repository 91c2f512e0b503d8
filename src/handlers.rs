use axum::{
    Form, Json,
    extract::{FromRequest, Request, State},
    http::{StatusCode, header},
};
use serde::de::DeserializeOwned;
use std::time::Instant;

use crate::error::{ServiceError, ServiceResult};
use crate::keys;
use crate::keystore::{KeyStore, MAX_KEY_BITS, MIN_KEY_BITS};
use crate::models::{
    DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse, GenerateKeysRequest,
    KeyPairResponse, StatsResponse, ValidateKeysRequest, ValidateKeysResponse,
};
use crate::state::AppState;

/// Accepts either a urlencoded form (the browser page posts these) or JSON,
/// chosen by `Content-Type`.
pub struct FormOrJson<T>(pub T);

impl<S, T> FromRequest<S> for FormOrJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| ServiceError::BadRequest(e.body_text()))?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| ServiceError::BadRequest(e.body_text()))?;
            Ok(Self(value))
        }
    }
}

pub async fn root() -> &'static str {
    concat!(
        "Emoji RSA Encryption Service API\n\n",
        "Endpoints:\n",
        "- POST /encrypt: Encrypt a message into emoji\n",
        "- POST /decrypt: Decrypt emoji back into a message\n",
        "- POST /validate_keys: Check that a public and private key form a pair\n",
        "- POST /generate_keys: Generate a new key pair\n",
        "- GET /stats: Get service statistics",
    )
}

// Handler to encrypt a message into emoji
pub async fn encrypt(
    State(state): State<AppState>,
    FormOrJson(payload): FormOrJson<EncryptRequest>,
) -> ServiceResult<Json<EncryptResponse>> {
    let start = Instant::now();
    tracing::debug!(
        "encrypt: message length {}, public key length {}",
        payload.message.len(),
        payload.public_key.len()
    );

    let public_key = keys::validate_public(&payload.public_key)?;
    let encrypted_text = state.service.encrypt(&payload.message, &public_key)?;

    tracing::info!("encrypt operation took: {:?}", start.elapsed());

    Ok(Json(EncryptResponse { encrypted_text }))
}

// Handler to decrypt emoji back into a message
pub async fn decrypt(
    State(state): State<AppState>,
    FormOrJson(payload): FormOrJson<DecryptRequest>,
) -> ServiceResult<Json<DecryptResponse>> {
    let start = Instant::now();
    tracing::debug!(
        "decrypt: encrypted text length {}, private key length {}",
        payload.encrypted_text.chars().count(),
        payload.private_key.len()
    );

    let private_key = keys::validate_private(&payload.private_key)?;
    let decrypted_text = state
        .service
        .decrypt(&payload.encrypted_text, &private_key)
        .inspect_err(|e| tracing::warn!("decrypt rejected: {}", e))?;

    tracing::info!("decrypt operation took: {:?}", start.elapsed());

    Ok(Json(DecryptResponse { decrypted_text }))
}

// Handler to check that two keys belong together
pub async fn validate_keys(
    payload: Result<FormOrJson<ValidateKeysRequest>, ServiceError>,
) -> (StatusCode, Json<ValidateKeysResponse>) {
    let rejected = |error: String| {
        (
            StatusCode::BAD_REQUEST,
            Json(ValidateKeysResponse {
                valid: false,
                error: Some(error),
            }),
        )
    };

    let payload = match payload {
        Ok(FormOrJson(payload)) => payload,
        Err(e) => {
            tracing::debug!("validate_keys body rejected: {}", e);
            return rejected(format!("No data provided: {}", e));
        }
    };

    let (public_key, private_key) = match (payload.public_key, payload.private_key) {
        (Some(public), Some(private))
            if !public.trim().is_empty() && !private.trim().is_empty() =>
        {
            (public, private)
        }
        _ => return rejected("Both public and private keys are required".to_string()),
    };

    let response = match keys::validate_pair(&public_key, &private_key) {
        Ok(()) => ValidateKeysResponse {
            valid: true,
            error: None,
        },
        Err(e) => {
            tracing::info!("key pair rejected: {}", e);
            ValidateKeysResponse {
                valid: false,
                error: Some(e.to_string()),
            }
        }
    };

    (StatusCode::OK, Json(response))
}

// Handler to generate (and optionally store) a new key pair
pub async fn generate_keys(
    State(state): State<AppState>,
    FormOrJson(payload): FormOrJson<GenerateKeysRequest>,
) -> ServiceResult<Json<KeyPairResponse>> {
    let start = Instant::now();
    let bits = payload.bits.unwrap_or(state.config.default_key_bits);

    if !(MIN_KEY_BITS..=MAX_KEY_BITS).contains(&bits) {
        return Err(ServiceError::BadRequest(format!(
            "Key size must be between {} and {} bits",
            MIN_KEY_BITS, MAX_KEY_BITS
        )));
    }
    if let Some(id) = &payload.key_id {
        state.keystore.paths(id)?;
    }

    // Generation itself cannot be interrupted, so the permit travels with the
    // blocking task and bounds how many can pile up after timeouts.
    let slots = state.keygen_slots.clone();
    let job = async move {
        let permit = slots
            .acquire_owned()
            .await
            .map_err(|e| ServiceError::Internal(format!("Key generation unavailable: {}", e)))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            KeyStore::generate(bits)
        })
        .await
        .map_err(|e| ServiceError::Internal(format!("Key generation task failed: {}", e)))?
        .map_err(ServiceError::from)
    };

    let pair = tokio::time::timeout(state.keygen_timeout(), job)
        .await
        .map_err(|_| ServiceError::Timeout("Key generation timed out".to_string()))??;

    // Persist only once the caller is actually getting the keys back.
    if let Some(id) = &payload.key_id {
        state.keystore.save(id, &pair)?;
    }

    tracing::info!("generate_keys ({} bits) took: {:?}", bits, start.elapsed());

    Ok(Json(KeyPairResponse {
        public_key: pair.public.to_pem()?,
        private_key: pair.private.to_pem()?,
        bits: pair.public.bits(),
    }))
}

// Service health check and statistics
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        status: "healthy".to_string(),
        uptime_seconds: state.uptime().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn not_found() -> ServiceError {
    ServiceError::NotFound
}
