use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{
    decrypt, encrypt, generate_keys, get_stats, not_found, root, validate_keys,
};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/encrypt", post(encrypt))
        .route("/decrypt", post(decrypt))
        .route("/validate_keys", post(validate_keys))
        .route("/generate_keys", post(generate_keys))
        .route("/stats", get(get_stats))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
