use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use emoji_cipher::{
    CryptoError, KeyStore, RsaService, config::Config, validate_pair, validate_private,
    validate_public,
};

#[derive(Parser)]
#[command(name = "emojikey")]
#[command(about = "Encrypt messages into emoji with RSA keys")]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a key pair and save it as PEM files
    Generate {
        /// Modulus size in bits
        #[arg(long)]
        bits: Option<u32>,
        /// Key id; files are named <id>_pub.pem and <id>_priv.pem
        #[arg(long, default_value = "default")]
        id: String,
        /// Output directory
        #[arg(long, env = "EMOJI_CIPHER_KEY_DIR")]
        dir: Option<PathBuf>,
    },
    /// Encrypt a message into emoji
    Encrypt {
        #[arg(long)]
        public_key: PathBuf,
        message: String,
    },
    /// Decrypt emoji back into the message
    Decrypt {
        #[arg(long)]
        private_key: PathBuf,
        emoji: String,
    },
    /// Check that a public and private key form a pair
    Validate {
        #[arg(long)]
        public_key: PathBuf,
        #[arg(long)]
        private_key: PathBuf,
    },
}

const WRONG_KEY_MESSAGE: &str =
    "Decryption failed - the private key does not match the public key used for encryption";

fn read_key(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read key file {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "emoji_cipher=debug" } else { "emoji_cipher=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load()?;
    let service = RsaService::default();

    match cli.command {
        Commands::Generate { bits, id, dir } => {
            let bits = bits.unwrap_or(config.default_key_bits);
            let dir = dir.unwrap_or_else(|| PathBuf::from(&config.key_dir));

            eprintln!("Generating {}-bit RSA keys...", bits);
            let start = Instant::now();
            let pair = KeyStore::generate(bits)?;
            let paths = KeyStore::new(dir).save(&id, &pair)?;

            eprintln!("Generation time: {:.2?}", start.elapsed());
            eprintln!("Key size: {} bits", pair.public.bits());
            println!("{}", paths.public.display());
            println!("{}", paths.private.display());
        }
        Commands::Encrypt {
            public_key,
            message,
        } => {
            let key = validate_public(&read_key(&public_key)?)?;
            println!("{}", service.encrypt(&message, &key)?);
        }
        Commands::Decrypt { private_key, emoji } => {
            let key = validate_private(&read_key(&private_key)?)?;
            match service.decrypt(&emoji, &key) {
                Ok(message) => println!("{}", message),
                Err(CryptoError::DecryptionFailed) => {
                    anyhow::bail!(WRONG_KEY_MESSAGE)
                }
                Err(e) => return Err(e.into()),
            }
        }
        Commands::Validate {
            public_key,
            private_key,
        } => {
            validate_pair(&read_key(&public_key)?, &read_key(&private_key)?)?;
            println!("Keys are valid and form a pair");
        }
    }

    Ok(())
}
