//! Password verification for every revision of the standard security handler.
//!
//! A successful check yields the file key. R2-R4 try the candidate as the user
//! password first, then as the owner password (which unwraps the user password out
//! of /O). R5/R6 compare salted hashes against /U and /O and unwrap the key from
//! /UE or /OE, then confirm it against /Perms.

use super::descriptor::{EncryptDescriptor, Revision};
use super::keys::{
    FileKey, PASSWORD_PADDING, compute_file_key_r2_r4, compute_owner_key, password_hash,
};
use super::options::SecurityOptions;
use crate::codec::aes::aes_cbc_decrypt;
use crate::codec::arcfour::Arcfour;
use crate::{PdfError, Result};

/// R5/R6 passwords are truncated to this many UTF-8 bytes.
const MAX_R6_PASSWORD: usize = 127;

/// Number of RC4 passes in the R3/R4 chains.
const RC4_ROUNDS: u8 = 20;

/// Which password the candidate matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordKind {
    User,
    Owner,
}

/// Outcome of a successful password check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub file_key: FileKey,
    pub kind: PasswordKind,
}

/// `key[j] ^ round` for every byte: the per-round RC4 key of the R3/R4 chains.
pub fn xor_key(key: &[u8], round: u8) -> Vec<u8> {
    key.iter().map(|b| b ^ round).collect()
}

/// Expected /U for R2 (Algorithm 4): the padding string encrypted with the file key.
pub fn compute_u_r2(file_key: &FileKey) -> Vec<u8> {
    Arcfour::apply(file_key.as_bytes(), &PASSWORD_PADDING)
}

/// First 16 bytes of the expected /U for R3/R4 (Algorithm 5).
pub fn compute_u_r3_r4(file_key: &FileKey, id0: &[u8]) -> Vec<u8> {
    let mut context = md5::Context::new();
    context.consume(PASSWORD_PADDING);
    context.consume(id0);
    let hash = context.finalize();

    let key = file_key.as_bytes();
    let mut result = Arcfour::apply(key, &hash.0);
    for round in 1..RC4_ROUNDS {
        Arcfour::new(&xor_key(key, round)).process_in_place(&mut result);
    }
    result
}

/// User password check for R2-R4 (Algorithm 6).
pub fn check_user_password_r2_r4(
    password: &[u8],
    descriptor: &EncryptDescriptor,
    id0: &[u8],
) -> Option<FileKey> {
    let key = compute_file_key_r2_r4(password, descriptor, id0);
    let matches = match descriptor.revision {
        Revision::R2 => compute_u_r2(&key) == descriptor.u[..32],
        _ => compute_u_r3_r4(&key, id0)[..16] == descriptor.u[..16],
    };
    matches.then_some(key)
}

/// Recover the (padded) user password stored in /O using a candidate owner
/// password (Algorithm 7, steps a-b).
pub fn unwrap_owner_password(password: &[u8], descriptor: &EncryptDescriptor) -> Vec<u8> {
    let owner_key = compute_owner_key(password, descriptor);
    let mut user_password = descriptor.o[..32].to_vec();

    match descriptor.revision {
        Revision::R2 => Arcfour::new(&owner_key).process_in_place(&mut user_password),
        _ => {
            for round in (0..RC4_ROUNDS).rev() {
                Arcfour::new(&xor_key(&owner_key, round)).process_in_place(&mut user_password);
            }
        }
    }
    user_password
}

/// Owner password check for R2-R4 (Algorithm 7).
pub fn check_owner_password_r2_r4(
    password: &[u8],
    descriptor: &EncryptDescriptor,
    id0: &[u8],
) -> Option<FileKey> {
    let user_password = unwrap_owner_password(password, descriptor);
    check_user_password_r2_r4(&user_password, descriptor, id0)
}

/// Confirm an R5/R6 file key against /Perms (Algorithm 13).
///
/// Only the `adb` marker is binding. Disagreement between the decrypted flags and
/// /P or /EncryptMetadata is logged.
pub fn verify_perms(descriptor: &EncryptDescriptor, file_key: &FileKey) -> Result<()> {
    let Some(perms) = descriptor.perms.as_deref() else {
        tracing::debug!("no /Perms entry, skipping permissions confirmation");
        return Ok(());
    };

    let block = aes_cbc_decrypt(file_key.as_bytes(), &[0u8; 16], &perms[..16])
        .map_err(|e| PdfError::IntegrityError(format!("cannot decrypt /Perms: {e}")))?;

    if &block[9..12] != b"adb" {
        return Err(PdfError::IntegrityError(
            "/Perms does not decrypt to the expected marker".into(),
        ));
    }
    if block[..4] != descriptor.p.to_le_bytes() {
        tracing::warn!("/Perms permission bits disagree with /P");
    }
    let expected_flag = if descriptor.encrypt_metadata { b'T' } else { b'F' };
    if block[8] != expected_flag {
        tracing::warn!("/Perms metadata flag disagrees with /EncryptMetadata");
    }
    Ok(())
}

fn unwrap_aes_key(hash: &[u8; 32], wrapped: &[u8]) -> Result<FileKey> {
    aes_cbc_decrypt(hash, &[0u8; 16], &wrapped[..32]).map(FileKey::new)
}

/// User password check for R5/R6 (Algorithm 11 + key recovery).
fn check_user_password_r5_r6(
    password: &[u8],
    descriptor: &EncryptDescriptor,
    options: &SecurityOptions,
) -> Result<Option<FileKey>> {
    let u = &descriptor.u;
    let hash = password_hash(
        descriptor.revision,
        options.hardened_hash,
        password,
        &u[32..40],
        &[],
    );
    if hash[..] != u[..32] {
        return Ok(None);
    }

    let Some(ue) = descriptor.ue.as_deref() else {
        return Err(PdfError::FormatError("missing /UE".into()));
    };
    let key_hash = password_hash(
        descriptor.revision,
        options.hardened_hash,
        password,
        &u[40..48],
        &[],
    );
    unwrap_aes_key(&key_hash, ue).map(Some)
}

/// Owner password check for R5/R6 (Algorithm 12 + key recovery).
fn check_owner_password_r5_r6(
    password: &[u8],
    descriptor: &EncryptDescriptor,
    options: &SecurityOptions,
) -> Result<Option<FileKey>> {
    let o = &descriptor.o;
    let u48 = &descriptor.u[..48];
    let hash = password_hash(
        descriptor.revision,
        options.hardened_hash,
        password,
        &o[32..40],
        u48,
    );
    if hash[..] != o[..32] {
        return Ok(None);
    }

    let Some(oe) = descriptor.oe.as_deref() else {
        return Err(PdfError::FormatError("missing /OE".into()));
    };
    let key_hash = password_hash(
        descriptor.revision,
        options.hardened_hash,
        password,
        &o[40..48],
        u48,
    );
    unwrap_aes_key(&key_hash, oe).map(Some)
}

/// Normalize an R5/R6 candidate: SASLprep (R6 only, when configured and the bytes
/// are UTF-8), then truncate to 127 bytes.
fn prepare_r5_r6_password(
    password: &[u8],
    revision: Revision,
    options: &SecurityOptions,
) -> Vec<u8> {
    let mut bytes = password.to_vec();
    if revision == Revision::R6
        && let Some(normalize) = options.saslprep
        && let Ok(text) = std::str::from_utf8(password)
    {
        match normalize(text) {
            Ok(prepped) => bytes = prepped.into_bytes(),
            Err(e) => tracing::debug!(error = %e, "SASLprep rejected password, using raw bytes"),
        }
    }
    bytes.truncate(MAX_R6_PASSWORD);
    bytes
}

fn try_r5_r6(
    password: &[u8],
    descriptor: &EncryptDescriptor,
    options: &SecurityOptions,
) -> Result<Option<Authenticated>> {
    let candidate = prepare_r5_r6_password(password, descriptor.revision, options);

    let (file_key, kind) =
        if let Some(key) = check_user_password_r5_r6(&candidate, descriptor, options)? {
            (key, PasswordKind::User)
        } else if let Some(key) = check_owner_password_r5_r6(&candidate, descriptor, options)? {
            (key, PasswordKind::Owner)
        } else {
            return Ok(None);
        };

    verify_perms(descriptor, &file_key)?;
    Ok(Some(Authenticated { file_key, kind }))
}

/// Check a candidate password and return the file key it unlocks.
///
/// R2-R4: user check, then owner check. R5/R6: the password as given, then once
/// more re-encoded through `options.locale_to_utf8` if that changes the bytes.
///
/// # Errors
/// * `AuthenticationError` when every attempt fails.
/// * `IntegrityError` when a hash matched but /Perms rejected the key. This is
///   terminal: no further candidates are tried.
pub fn check_password(
    descriptor: &EncryptDescriptor,
    id0: &[u8],
    password: &[u8],
    options: &SecurityOptions,
) -> Result<Authenticated> {
    let outcome = if descriptor.revision.is_md5_era() {
        if let Some(file_key) = check_user_password_r2_r4(password, descriptor, id0) {
            Some(Authenticated {
                file_key,
                kind: PasswordKind::User,
            })
        } else {
            check_owner_password_r2_r4(password, descriptor, id0).map(|file_key| Authenticated {
                file_key,
                kind: PasswordKind::Owner,
            })
        }
    } else {
        match try_r5_r6(password, descriptor, options)? {
            Some(auth) => Some(auth),
            None => match options.locale_to_utf8 {
                Some(to_utf8) => {
                    let reencoded = to_utf8(password);
                    if reencoded != password {
                        tracing::debug!("retrying with password re-encoded as UTF-8");
                        try_r5_r6(&reencoded, descriptor, options)?
                    } else {
                        None
                    }
                }
                None => None,
            },
        }
    };

    match outcome {
        Some(auth) => {
            tracing::debug!(
                r = descriptor.revision.number(),
                kind = ?auth.kind,
                key_len = auth.file_key.len(),
                "password accepted"
            );
            Ok(auth)
        }
        None => Err(PdfError::AuthenticationError),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xor_key_round_zero_is_identity() {
        assert_eq!(xor_key(&[1, 2, 3], 0), vec![1, 2, 3]);
        assert_eq!(xor_key(&[1, 2, 3], 1), vec![0, 3, 2]);
    }

    #[test]
    fn prepare_truncates_to_127_bytes() {
        let long = vec![b'a'; 200];
        let prepared = prepare_r5_r6_password(&long, Revision::R5, &SecurityOptions::minimal());
        assert_eq!(prepared.len(), 127);
    }

    #[test]
    fn prepare_applies_saslprep_only_for_r6() {
        let opts = SecurityOptions::default();
        let nbsp = "a\u{00A0}b".as_bytes();
        assert_eq!(prepare_r5_r6_password(nbsp, Revision::R6, &opts), b"a b");
        assert_eq!(prepare_r5_r6_password(nbsp, Revision::R5, &opts), nbsp);
    }
}
