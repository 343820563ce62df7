//! PDF Standard Security Handler.
//!
//! - `descriptor`: typed view of the `/Encrypt` dictionary
//! - `policy`: whether a password check is needed
//! - `keys`: password to file-key derivation
//! - `verify`: user and owner password checks
//! - `object_key`: per-object keys
//! - `orchestrator`: per-string and per-stream decryption decisions
//! - `handler`: pre- and post-authentication sessions

pub mod descriptor;
pub mod handler;
pub mod keys;
pub mod object_key;
pub mod options;
pub mod orchestrator;
pub mod policy;
pub mod saslprep;
pub mod verify;

pub use descriptor::{
    AuthEvent, CryptFilter, CryptMethod, EncryptDescriptor, Revision, Version, doc_id_from_trailer,
};
pub use handler::{
    DecryptionSession, IdentityHandler, PDFSecurityHandler, StandardSecurityHandler,
    create_security_handler,
};
pub use keys::{FileKey, HardenedHash, PASSWORD_PADDING, hardened_hash_r6};
pub use object_key::{ObjectKey, derive_object_key};
pub use options::SecurityOptions;
pub use orchestrator::{CryptDecoder, DecodeStage, ObjectDecryption, ResolvedObject};
pub use verify::{Authenticated, PasswordKind, check_password};
