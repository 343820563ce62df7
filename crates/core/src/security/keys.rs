//! Password to file-key derivation.
//!
//! Revisions 2-4 derive the key with MD5 over the padded password and the
//! dictionary entries. Revisions 5 and 6 hash the password with a salt taken from
//! /U or /O and unwrap the real key from /UE or /OE; R6 hardens that hash with
//! [`hardened_hash_r6`], which callers may replace through [`HardenedHash`].

use std::fmt;

use sha2::{Digest, Sha256, Sha384, Sha512};

use super::descriptor::{EncryptDescriptor, Revision};
use crate::codec::aes::aes128_cbc_encrypt_blocks;

/// Password padding constant (ISO 32000-1, 7.6.3.3).
pub const PASSWORD_PADDING: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

/// Number of extra MD5 rounds for R >= 3.
const MD5_ROUNDS: usize = 50;

/// Hardened password hash for R6: `(password, salt, extra) -> 32 bytes`.
pub type HardenedHash = fn(&[u8], &[u8], &[u8]) -> [u8; 32];

/// Document-wide decryption key.
///
/// Debug output never shows the key bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct FileKey(Vec<u8>);

impl FileKey {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for FileKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileKey({} bytes)", self.0.len())
    }
}

/// Pad or truncate a password to 32 bytes.
pub fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut padded = [0u8; 32];
    let len = password.len().min(32);
    padded[..len].copy_from_slice(&password[..len]);
    padded[len..].copy_from_slice(&PASSWORD_PADDING[..32 - len]);
    padded
}

/// File key for R2-R4 (Algorithm 2).
///
/// The `FF FF FF FF` suffix for unencrypted metadata is only appended for R >= 4.
/// R3 documents carrying `/EncryptMetadata false` are keyed as if it were true.
pub fn compute_file_key_r2_r4(
    password: &[u8],
    descriptor: &EncryptDescriptor,
    id0: &[u8],
) -> FileKey {
    let n = descriptor.key_length();

    let mut context = md5::Context::new();
    context.consume(pad_password(password));
    context.consume(&descriptor.o[..32]);
    context.consume(descriptor.p.to_le_bytes());
    context.consume(id0);
    if descriptor.revision >= Revision::R4 && !descriptor.encrypt_metadata {
        context.consume([0xFF; 4]);
    }
    let mut digest = context.finalize().0;

    if descriptor.revision >= Revision::R3 {
        for _ in 0..MD5_ROUNDS {
            digest = md5::compute(&digest[..n]).0;
        }
    }

    FileKey::new(&digest[..n])
}

/// RC4 key that wraps the user password inside /O (Algorithm 3, steps a-d).
pub fn compute_owner_key(password: &[u8], descriptor: &EncryptDescriptor) -> Vec<u8> {
    let n = descriptor.key_length();

    let mut digest = md5::compute(pad_password(password)).0;
    if descriptor.revision >= Revision::R3 {
        for _ in 0..MD5_ROUNDS {
            digest = md5::compute(digest).0;
        }
    }

    digest[..n].to_vec()
}

/// SHA-256(password ++ salt ++ extra), the R5 password hash.
pub fn compute_file_key_r5_r6(password: &[u8], salt: &[u8], extra: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(password);
    hasher.update(salt);
    hasher.update(extra);
    hasher.finalize().into()
}

/// ISO 32000-2 Algorithm 2.B.
///
/// Each round encrypts 64 copies of `password ++ K ++ extra` with AES-128-CBC
/// (key and IV taken from K) and picks SHA-256/384/512 by the first 16 bytes of the
/// output mod 3. At least 64 rounds run; afterwards rounds continue while the last
/// output byte exceeds `round - 32`.
pub fn hardened_hash_r6(password: &[u8], salt: &[u8], extra: &[u8]) -> [u8; 32] {
    let mut k = compute_file_key_r5_r6(password, salt, extra).to_vec();
    let mut round: u32 = 0;

    loop {
        let block_len = password.len() + k.len() + extra.len();
        let mut k1 = Vec::with_capacity(block_len * 64);
        for _ in 0..64 {
            k1.extend_from_slice(password);
            k1.extend_from_slice(&k);
            k1.extend_from_slice(extra);
        }

        let mut key = [0u8; 16];
        let mut iv = [0u8; 16];
        key.copy_from_slice(&k[..16]);
        iv.copy_from_slice(&k[16..32]);
        // 64 copies always fill whole AES blocks.
        aes128_cbc_encrypt_blocks(&key, &iv, &mut k1);
        let e = k1;

        k = match bytes_mod_3(&e[..16]) {
            0 => Sha256::digest(&e).to_vec(),
            1 => Sha384::digest(&e).to_vec(),
            _ => Sha512::digest(&e).to_vec(),
        };

        round += 1;
        let last = u32::from(e[e.len() - 1]);
        if round >= 64 && last <= round - 32 {
            break;
        }
    }

    let mut out = [0u8; 32];
    out.copy_from_slice(&k[..32]);
    out
}

/// Sum of bytes mod 3, which equals the big-endian integer mod 3 since 256 = 1 (mod 3).
fn bytes_mod_3(input: &[u8]) -> usize {
    input.iter().map(|&b| usize::from(b % 3)).sum::<usize>() % 3
}

/// R5/R6 password hash dispatch.
pub fn password_hash(
    revision: Revision,
    hardened: HardenedHash,
    password: &[u8],
    salt: &[u8],
    extra: &[u8],
) -> [u8; 32] {
    match revision {
        Revision::R6 => hardened(password, salt, extra),
        _ => compute_file_key_r5_r6(password, salt, extra),
    }
}
