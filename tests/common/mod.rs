use std::net::SocketAddr;
use tokio::net::TcpListener;

use emoji_cipher::{KeyStore, config::Config, routes, state::AppState};

pub struct TestServer {
    pub url: String,
    #[allow(dead_code)]
    pub addr: SocketAddr,
    #[allow(dead_code)]
    pub key_dir: tempfile::TempDir,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(customize: impl FnOnce(&mut Config)) -> Self {
        let key_dir = tempfile::tempdir().unwrap();
        let mut config = Config {
            port: 0, // OS assigns port
            key_dir: key_dir.path().display().to_string(),
            default_key_bits: 1024,
            ..Default::default()
        };
        customize(&mut config);

        let state = AppState::new(&config);
        let app = routes::router(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give server a moment to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            url: format!("http://{addr}"),
            addr,
            key_dir,
        }
    }
}

#[allow(dead_code)]
pub fn key_pems(bits: u32) -> (String, String) {
    let pair = KeyStore::generate(bits).unwrap();
    (pair.public.to_pem().unwrap(), pair.private.to_pem().unwrap())
}
