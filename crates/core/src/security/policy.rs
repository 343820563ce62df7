//! Decide whether a password check must run before objects are resolved.

use super::descriptor::{AuthEvent, CryptMethod, EncryptDescriptor, Version};

/// Whether the document needs password verification.
///
/// Only V4+ documents whose string and stream filters are both Identity can be read
/// without a file key, and only when the standard filter is not reserved for
/// embedded files (`/AuthEvent /EFOpen`). An explicitly supplied password always
/// forces verification so embedded streams with their own crypt filters can be
/// decrypted later.
pub fn is_required(descriptor: &EncryptDescriptor, explicit_password_supplied: bool) -> bool {
    if explicit_password_supplied {
        return true;
    }
    if descriptor.version < Version::V4 {
        return true;
    }
    if descriptor.stm_method != CryptMethod::Identity
        || descriptor.str_method != CryptMethod::Identity
    {
        return true;
    }

    let auth_event = descriptor.std_cf().and_then(|cf| cf.auth_event);
    let required = matches!(auth_event, Some(AuthEvent::EFOpen));
    tracing::debug!(?auth_event, required, "identity crypt filters");
    required
}
