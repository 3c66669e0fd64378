//! CLI error type.

use std::{io, path::PathBuf};

use murmur_core::SessionError;
use murmur_crypto::CryptoError;
use thiserror::Error;

/// Errors that stop the CLI before or while running a session.
#[derive(Error, Debug)]
pub enum CliError {
    /// Session setup failed
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Key material could not be built
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A key file could not be read or written
    #[error("{}: {source}", path.display())]
    KeyFile {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// `--peer-key` names an alias that is not a configured peer
    #[error("--peer-key given for unknown peer {0:?}")]
    UnknownPeerKey(String),

    /// Flags that cannot be combined
    #[error("{0}")]
    Usage(&'static str),

    /// Logging could not be installed
    #[error("failed to install logger: {0}")]
    Logging(String),

    /// Terminal or socket I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
