//! Command-line arguments and session setup.
//!
//! Every flag has an environment variable fallback so a participant can be
//! configured entirely from the environment.

use std::{fs, path::PathBuf};

use clap::{Parser, ValueEnum};
use murmur_core::{PeerSpec, SessionConfig};
use murmur_crypto::{AsymmetricPerPeer, ConfidentialityScheme, DEFAULT_KEY_BITS, SharedKey};
use rand::{CryptoRng, RngCore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::CliError;

/// Confidentiality scheme selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemeChoice {
    /// No encryption
    Plaintext,
    /// RSA-OAEP per recipient
    Asymmetric,
    /// Shared key from a passphrase or hex key
    Symmetric,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Plain,
    /// One JSON object per event
    Json,
}

/// Murmur peer-to-peer group chat
///
/// Sends every line typed on stdin to all peers over UDP and prints what
/// they send back, ordered by Lamport clock.
#[derive(Parser, Debug)]
#[command(name = "murmur")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Name shown to peers
    #[arg(short, long, env = "MURMUR_ALIAS")]
    pub alias: String,

    /// UDP port to listen on
    #[arg(short, long, env = "MURMUR_PORT", default_value_t = 12345)]
    pub port: u16,

    /// Confidentiality scheme; must match every peer
    #[arg(
        short,
        long,
        env = "MURMUR_SCHEME",
        value_enum,
        default_value_t = SchemeChoice::Symmetric
    )]
    pub scheme: SchemeChoice,

    /// Peer as alias=host:port (repeatable)
    #[arg(
        long = "peer",
        env = "MURMUR_PEERS",
        value_delimiter = ',',
        value_parser = PeerSpec::parse
    )]
    pub peers: Vec<PeerSpec>,

    /// Peer public key as alias=path/to/key.pem (repeatable, asymmetric only)
    #[arg(long = "peer-key", value_parser = parse_peer_key)]
    pub peer_keys: Vec<(String, PathBuf)>,

    /// Passphrase for the symmetric scheme
    #[arg(long, env = "MURMUR_PASSPHRASE", conflicts_with = "key")]
    pub passphrase: Option<String>,

    /// Hex-encoded 256-bit key for the symmetric scheme
    #[arg(long, env = "MURMUR_KEY")]
    pub key: Option<String>,

    /// Where to write our public key PEM (asymmetric only)
    #[arg(long)]
    pub public_key_out: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, env = "MURMUR_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log format
    #[arg(long, env = "MURMUR_LOG_FORMAT", value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

fn parse_peer_key(input: &str) -> Result<(String, PathBuf), String> {
    match input.split_once('=') {
        Some((alias, path)) if !alias.is_empty() && !path.is_empty() => {
            Ok((alias.to_string(), PathBuf::from(path)))
        },
        _ => Err(format!("expected alias=path, got {input:?}")),
    }
}

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `level` when set.
pub fn setup_logging(level: &str, format: LogFormat) -> Result<(), CliError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| CliError::Logging(e.to_string()))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);

    let result = match format {
        LogFormat::Json => builder.json().flatten_event(true).with_current_span(false).try_init(),
        LogFormat::Plain => builder.with_target(true).try_init(),
    };

    result.map_err(|e| CliError::Logging(e.to_string()))
}

/// Key material produced during setup that the operator needs to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyNotice {
    /// Nothing to show
    None,
    /// A random shared key was generated; peers need it to join
    GeneratedSharedKey(String),
    /// Our public key PEM, for peers to pass as `--peer-key`
    PublicKey(String),
}

impl Args {
    /// Build the confidentiality scheme from flags.
    ///
    /// With the symmetric scheme and neither passphrase nor key, a random key
    /// is generated and returned in the notice.
    pub fn build_scheme<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> Result<(ConfidentialityScheme, KeyNotice), CliError> {
        match self.scheme {
            SchemeChoice::Plaintext => {
                if self.passphrase.is_some() || self.key.is_some() {
                    warn!("plaintext scheme ignores --passphrase and --key");
                }
                Ok((ConfidentialityScheme::Plaintext, KeyNotice::None))
            },
            SchemeChoice::Symmetric => match (&self.passphrase, &self.key) {
                (Some(passphrase), _) => {
                    Ok((ConfidentialityScheme::from_passphrase(passphrase)?, KeyNotice::None))
                },
                (None, Some(hex)) => {
                    let key = SharedKey::from_hex(hex)?;
                    Ok((ConfidentialityScheme::from_shared_key(&key), KeyNotice::None))
                },
                (None, None) => {
                    let key = SharedKey::generate(rng);
                    let notice = KeyNotice::GeneratedSharedKey(key.to_hex());
                    Ok((ConfidentialityScheme::from_shared_key(&key), notice))
                },
            },
            SchemeChoice::Asymmetric => {
                if self.passphrase.is_some() || self.key.is_some() {
                    return Err(CliError::Usage(
                        "--passphrase and --key only apply to the symmetric scheme",
                    ));
                }

                info!(bits = DEFAULT_KEY_BITS, "generating RSA key pair");
                let keys = AsymmetricPerPeer::generate(rng, DEFAULT_KEY_BITS)?;
                let pem = keys.public_key_pem()?;

                if let Some(path) = &self.public_key_out {
                    fs::write(path, &pem)
                        .map_err(|source| CliError::KeyFile { path: path.clone(), source })?;
                    info!(path = %path.display(), "public key written");
                }

                Ok((ConfidentialityScheme::AsymmetricPerPeer(keys), KeyNotice::PublicKey(pem)))
            },
        }
    }

    /// Peer specs with any `--peer-key` files attached.
    pub fn peer_specs(&self) -> Result<Vec<PeerSpec>, CliError> {
        let mut specs = self.peers.clone();

        for (alias, path) in &self.peer_keys {
            let spec = specs
                .iter_mut()
                .find(|spec| &spec.alias == alias)
                .ok_or_else(|| CliError::UnknownPeerKey(alias.clone()))?;

            let pem = fs::read_to_string(path)
                .map_err(|source| CliError::KeyFile { path: path.clone(), source })?;
            spec.public_key_pem = Some(pem);
        }

        Ok(specs)
    }

    /// Assemble the session config.
    pub fn session_config<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> Result<(SessionConfig, KeyNotice), CliError> {
        let (scheme, notice) = self.build_scheme(rng)?;
        let config = SessionConfig::new(self.alias.clone(), scheme, self.peer_specs()?);
        Ok((config, notice))
    }
}
