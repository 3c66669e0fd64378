//! Passphrase acceptance policy for the shared-key scheme.
//!
//! Checked once at session setup, never per message.

use std::fmt;

use crate::CryptoError;

/// Minimum passphrase length, in characters
pub const MIN_PASSPHRASE_LEN: usize = 8;

/// Characters that satisfy the symbol rule
pub const SYMBOLS: &str = "!@#$%^&*(),.<>/?";

/// The policy rule a rejected passphrase broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassphraseRule {
    /// Fewer than [`MIN_PASSPHRASE_LEN`] characters
    TooShort,
    /// No ASCII lowercase letter
    MissingLowercase,
    /// No ASCII uppercase letter
    MissingUppercase,
    /// No decimal digit
    MissingDigit,
    /// No character from [`SYMBOLS`]
    MissingSymbol,
}

impl fmt::Display for PassphraseRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort => write!(f, "must be at least {MIN_PASSPHRASE_LEN} characters"),
            Self::MissingLowercase => f.write_str("must contain a lowercase letter"),
            Self::MissingUppercase => f.write_str("must contain an uppercase letter"),
            Self::MissingDigit => f.write_str("must contain a digit"),
            Self::MissingSymbol => write!(f, "must contain one of {SYMBOLS}"),
        }
    }
}

/// Check a passphrase against the acceptance policy.
///
/// Rules are checked in declaration order of [`PassphraseRule`] and the first
/// violation is reported.
///
/// # Errors
///
/// Returns [`CryptoError::WeakPassphrase`] naming the broken rule.
pub fn validate_passphrase(passphrase: &str) -> Result<(), CryptoError> {
    let checks: [(PassphraseRule, bool); 5] = [
        (PassphraseRule::TooShort, passphrase.chars().count() >= MIN_PASSPHRASE_LEN),
        (PassphraseRule::MissingLowercase, passphrase.chars().any(|c| c.is_ascii_lowercase())),
        (PassphraseRule::MissingUppercase, passphrase.chars().any(|c| c.is_ascii_uppercase())),
        (PassphraseRule::MissingDigit, passphrase.chars().any(|c| c.is_ascii_digit())),
        (PassphraseRule::MissingSymbol, passphrase.chars().any(|c| SYMBOLS.contains(c))),
    ];

    match checks.into_iter().find(|(_, ok)| !ok) {
        Some((rule, _)) => Err(CryptoError::WeakPassphrase(rule)),
        None => Ok(()),
    }
}
