//! Capabilities the security handler can be configured with.

use std::fmt;

use encoding_rs::WINDOWS_1252;

use super::keys::{HardenedHash, hardened_hash_r6};
use super::saslprep::saslprep;
use crate::Result;

/// Unicode password normalizer applied to R6 passwords.
pub type PasswordNormalizer = fn(&str) -> Result<String>;

/// Re-encodes a password typed in the local text encoding as UTF-8.
pub type LocaleToUtf8 = fn(&[u8]) -> Vec<u8>;

/// Pluggable pieces of the password check.
///
/// The defaults match what mainstream PDF readers do: SASLprep for R6, the
/// ISO 32000-2 hardened hash, and a Windows-1252 fallback for passwords that
/// were not typed as UTF-8.
#[derive(Clone, Copy)]
pub struct SecurityOptions {
    /// R6 password hash.
    pub hardened_hash: HardenedHash,
    /// Normalizer for R6 passwords. None compares raw UTF-8 bytes.
    pub saslprep: Option<PasswordNormalizer>,
    /// Fallback re-encoding tried once when an R5/R6 check fails.
    pub locale_to_utf8: Option<LocaleToUtf8>,
}

impl Default for SecurityOptions {
    fn default() -> Self {
        Self {
            hardened_hash: hardened_hash_r6,
            saslprep: Some(saslprep),
            locale_to_utf8: Some(windows_1252_to_utf8),
        }
    }
}

impl SecurityOptions {
    /// Options with no optional normalizers.
    pub fn minimal() -> Self {
        Self {
            hardened_hash: hardened_hash_r6,
            saslprep: None,
            locale_to_utf8: None,
        }
    }

    pub fn with_hardened_hash(mut self, hash: HardenedHash) -> Self {
        self.hardened_hash = hash;
        self
    }

    pub fn with_saslprep(mut self, normalizer: PasswordNormalizer) -> Self {
        self.saslprep = Some(normalizer);
        self
    }

    pub fn without_saslprep(mut self) -> Self {
        self.saslprep = None;
        self
    }

    pub fn with_locale_to_utf8(mut self, convert: LocaleToUtf8) -> Self {
        self.locale_to_utf8 = Some(convert);
        self
    }

    pub fn without_locale_to_utf8(mut self) -> Self {
        self.locale_to_utf8 = None;
        self
    }
}

impl fmt::Debug for SecurityOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityOptions")
            .field("saslprep", &self.saslprep.is_some())
            .field("locale_to_utf8", &self.locale_to_utf8.is_some())
            .finish_non_exhaustive()
    }
}

/// Decode bytes as Windows-1252 and re-encode them as UTF-8.
pub fn windows_1252_to_utf8(bytes: &[u8]) -> Vec<u8> {
    let (text, _, _) = WINDOWS_1252.decode(bytes);
    text.into_owned().into_bytes()
}
