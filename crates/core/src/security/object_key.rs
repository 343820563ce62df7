//! Per-object key derivation (Algorithm 1).

use std::fmt;

use super::descriptor::{CryptMethod, Version};
use super::keys::FileKey;

/// Salt appended for AESV2 object keys.
const AES_SALT: &[u8; 4] = b"sAlT";

/// Key for one indirect object together with the cipher it drives.
#[derive(Clone, PartialEq, Eq)]
pub struct ObjectKey {
    pub method: CryptMethod,
    pub key: Vec<u8>,
}

impl fmt::Debug for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectKey")
            .field("method", &self.method)
            .field("len", &self.key.len())
            .finish()
    }
}

/// Length of a derived object key: `min(n + 5, 16)`, or the whole file key for V5.
pub fn object_key_len(file_key: &FileKey, version: Version) -> usize {
    match version {
        Version::V5 => file_key.len(),
        _ => (file_key.len() + 5).min(16),
    }
}

/// Derive the key for object `objid`/`genno`.
///
/// V5 uses the file key verbatim. Earlier versions hash the file key with the low
/// three bytes of the object number and the low two bytes of the generation,
/// adding `sAlT` for AESV2.
pub fn derive_object_key(
    file_key: &FileKey,
    objid: u32,
    genno: u16,
    method: CryptMethod,
    version: Version,
) -> ObjectKey {
    if version == Version::V5 {
        return ObjectKey {
            method,
            key: file_key.as_bytes().to_vec(),
        };
    }

    let mut context = md5::Context::new();
    context.consume(file_key.as_bytes());
    context.consume(&objid.to_le_bytes()[..3]);
    context.consume(genno.to_le_bytes());
    if method == CryptMethod::AesV2 {
        context.consume(AES_SALT);
    }
    let digest = context.finalize();

    let len = object_key_len(file_key, version);
    ObjectKey {
        method,
        key: digest.0[..len].to_vec(),
    }
}
