use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::rsa_service::DEFAULT_MAX_MESSAGE_CHARS;

pub const CONFIG_FILE: &str = "emoji-cipher.toml";
pub const ENV_PREFIX: &str = "EMOJI_CIPHER_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound on message length, in characters.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,

    /// Directory for `<id>_pub.pem` / `<id>_priv.pem` files.
    #[serde(default = "default_key_dir")]
    pub key_dir: String,

    #[serde(default = "default_key_bits")]
    pub default_key_bits: u32,

    #[serde(default = "default_keygen_timeout_secs")]
    pub keygen_timeout_secs: u64,

    /// Key generations allowed to run at once, counting ones whose request
    /// already timed out.
    #[serde(default = "default_keygen_max_concurrent")]
    pub keygen_max_concurrent: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_message_length: default_max_message_length(),
            key_dir: default_key_dir(),
            default_key_bits: default_key_bits(),
            keygen_timeout_secs: default_keygen_timeout_secs(),
            keygen_max_concurrent: default_keygen_max_concurrent(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    5000
}
fn default_max_message_length() -> usize {
    DEFAULT_MAX_MESSAGE_CHARS
}
fn default_key_dir() -> String {
    "user_keys".into()
}
fn default_key_bits() -> u32 {
    2048
}
fn default_keygen_timeout_secs() -> u64 {
    60
}
fn default_keygen_max_concurrent() -> usize {
    2
}

impl Config {
    /// Defaults, then `emoji-cipher.toml`, then `EMOJI_CIPHER_*` variables.
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self::figment().extract()?)
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
    }
}
