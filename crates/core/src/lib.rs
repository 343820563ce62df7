//! pdfsec - the PDF Standard Security Handler.
//!
//! Reads a document's `/Encrypt` dictionary, verifies user and owner passwords for
//! revisions 2 through 6, and decides per object how strings and streams are
//! decrypted.

pub mod codec;
pub mod error;
pub mod model;
pub mod security;

pub use error::{PdfError, Result};

// Re-export commonly used types
pub use model::objects::{PDFDict, PDFObject, PDFStream};
pub use security::{
    DecryptionSession, EncryptDescriptor, SecurityOptions, StandardSecurityHandler,
    create_security_handler,
};
