use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

use crate::codec::EmojiCodec;
use crate::config::Config;
use crate::keystore::KeyStore;
use crate::rsa_service::RsaService;

/// Shared application state. Everything in here is read-only after startup,
/// so handlers never take a lock.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RsaService>,
    pub keystore: Arc<KeyStore>,
    pub config: Arc<Config>,
    /// Permits for key generation; a permit is held until the blocking
    /// worker finishes, even if the request gave up waiting.
    pub keygen_slots: Arc<Semaphore>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let codec = Arc::new(EmojiCodec::standard());

        Self {
            service: Arc::new(RsaService::new(codec, config.max_message_length)),
            keystore: Arc::new(KeyStore::new(&config.key_dir)),
            config: Arc::new(config.clone()),
            keygen_slots: Arc::new(Semaphore::new(config.keygen_max_concurrent.max(1))),
            started_at: Instant::now(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn keygen_timeout(&self) -> Duration {
        Duration::from_secs(self.config.keygen_timeout_secs)
    }
}
