//! Security handler sessions.
//!
//! [`StandardSecurityHandler`] wraps a classified `/Encrypt` dictionary before any
//! password is known. A successful [`StandardSecurityHandler::authenticate`] turns it
//! into a [`DecryptionSession`], the only type that holds a file key and therefore
//! the only one that can decrypt.

use super::descriptor::{CryptMethod, EncryptDescriptor, Revision, doc_id_from_trailer};
use super::keys::FileKey;
use super::object_key::{ObjectKey, derive_object_key};
use super::options::SecurityOptions;
use super::orchestrator::{self, DecodeStage, ObjectDecryption, ResolvedObject};
use super::policy;
use super::verify::{self, Authenticated, PasswordKind};
use crate::model::objects::{PDFDict, PDFObject, PDFStream};
use crate::{PdfError, Result};

/// Decryption entry points used while resolving objects.
pub trait PDFSecurityHandler: Send + Sync {
    /// Decrypt a string literal of object `objid`/`genno`.
    fn decrypt_string(&self, objid: u32, genno: u16, data: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt raw stream data. `attrs` is the (already decrypted) stream dictionary.
    fn decrypt_stream(
        &self,
        objid: u32,
        genno: u16,
        data: &[u8],
        attrs: &PDFDict,
    ) -> Result<Vec<u8>>;
}

/// The standard security handler before authentication.
#[derive(Debug, Clone)]
pub struct StandardSecurityHandler {
    descriptor: EncryptDescriptor,
    id0: Vec<u8>,
    options: SecurityOptions,
}

impl StandardSecurityHandler {
    /// Classify `encrypt` and capture the first `/ID` element of `trailer`.
    pub fn new(encrypt: &PDFDict, trailer: &PDFDict, options: SecurityOptions) -> Result<Self> {
        Ok(Self::with_doc_id(
            EncryptDescriptor::classify(encrypt)?,
            doc_id_from_trailer(trailer),
            options,
        ))
    }

    /// Build from an already classified descriptor and document id.
    pub fn with_doc_id(
        descriptor: EncryptDescriptor,
        id0: Vec<u8>,
        options: SecurityOptions,
    ) -> Self {
        Self {
            descriptor,
            id0,
            options,
        }
    }

    pub fn descriptor(&self) -> &EncryptDescriptor {
        &self.descriptor
    }

    pub fn doc_id(&self) -> &[u8] {
        &self.id0
    }

    /// Whether a password check has to run before objects can be read.
    pub fn is_required(&self, explicit_password_supplied: bool) -> bool {
        policy::is_required(&self.descriptor, explicit_password_supplied)
    }

    /// Check `password` without consuming the handler.
    pub fn check_password(&self, password: &[u8]) -> Result<Authenticated> {
        verify::check_password(&self.descriptor, &self.id0, password, &self.options)
    }

    /// Authenticate and open a decryption session.
    pub fn authenticate(self, password: &[u8]) -> Result<DecryptionSession> {
        let Authenticated { file_key, kind } = self.check_password(password)?;
        Ok(DecryptionSession {
            descriptor: self.descriptor,
            file_key,
            kind,
        })
    }
}

/// An authenticated document: descriptor plus file key.
#[derive(Debug, Clone)]
pub struct DecryptionSession {
    descriptor: EncryptDescriptor,
    file_key: FileKey,
    kind: PasswordKind,
}

impl DecryptionSession {
    pub fn descriptor(&self) -> &EncryptDescriptor {
        &self.descriptor
    }

    pub fn file_key(&self) -> &FileKey {
        &self.file_key
    }

    /// Which password opened the document.
    pub fn password_kind(&self) -> PasswordKind {
        self.kind
    }

    /// Key and method for a stream of object `objid`/`genno` under `/StmF`.
    pub fn object_key(&self, objid: u32, genno: u16) -> ObjectKey {
        let method = if self.descriptor.revision < Revision::R4 {
            CryptMethod::Rc4
        } else {
            self.descriptor.stm_method
        };
        derive_object_key(&self.file_key, objid, genno, method, self.descriptor.version)
    }

    /// Key and method for string literals of object `objid`/`genno`.
    pub fn string_key(&self, objid: u32, genno: u16) -> ObjectKey {
        let method = orchestrator::string_method(&self.descriptor);
        derive_object_key(&self.file_key, objid, genno, method, self.descriptor.version)
    }

    pub fn decrypt_string(&self, data: &[u8], objid: u32, genno: u16) -> Result<Vec<u8>> {
        orchestrator::decrypt_string(&self.descriptor, &self.file_key, data, objid, genno)
    }

    pub fn classify_stream(&self, objid: u32, genno: u16, attrs: &PDFDict) -> ObjectDecryption {
        orchestrator::classify_stream(&self.descriptor, &self.file_key, objid, genno, attrs)
    }

    pub fn decode_pipeline(
        &self,
        decision: &ObjectDecryption,
        attrs: &PDFDict,
    ) -> Vec<DecodeStage> {
        orchestrator::decode_pipeline(decision, attrs)
    }

    /// Decrypt a stream's raw data according to its decryption decision.
    pub fn decrypt_stream(&self, stream: &PDFStream, objid: u32, genno: u16) -> Result<Vec<u8>> {
        let decision = self.classify_stream(objid, genno, &stream.attrs);
        let stages = self.decode_pipeline(&decision, &stream.attrs);
        match stages.first() {
            Some(DecodeStage::Decrypt(decoder)) => decoder.decode(&stream.rawdata),
            _ => Ok(stream.rawdata.clone()),
        }
    }

    pub fn decrypt_object(&self, obj: PDFObject, objid: u32, genno: u16) -> Result<ResolvedObject> {
        orchestrator::decrypt_object(&self.descriptor, &self.file_key, obj, objid, genno)
    }
}

impl PDFSecurityHandler for DecryptionSession {
    fn decrypt_string(&self, objid: u32, genno: u16, data: &[u8]) -> Result<Vec<u8>> {
        Self::decrypt_string(self, data, objid, genno)
    }

    fn decrypt_stream(
        &self,
        objid: u32,
        genno: u16,
        data: &[u8],
        attrs: &PDFDict,
    ) -> Result<Vec<u8>> {
        let stream = PDFStream::new(attrs.clone(), data);
        Self::decrypt_stream(self, &stream, objid, genno)
    }
}

/// Open a security handler for a document.
///
/// Returns `None` for an empty `/Encrypt` dictionary. `doc_id` is the trailer `/ID`
/// array. `password` is `None` when the caller has no password; `Some("")` is an
/// explicit empty password and always runs the check.
///
/// # Errors
/// Classification errors, `AuthenticationError` or `IntegrityError` from the
/// password check.
pub fn create_security_handler(
    encrypt: &PDFDict,
    doc_id: &[Vec<u8>],
    password: Option<&str>,
    options: SecurityOptions,
) -> Result<Option<Box<dyn PDFSecurityHandler>>> {
    if encrypt.is_empty() {
        return Ok(None);
    }

    let descriptor = EncryptDescriptor::classify(encrypt)?;
    let id0 = match doc_id.first() {
        Some(id) => id.clone(),
        None => {
            tracing::warn!("no document id, deriving keys with an empty one");
            Vec::new()
        }
    };
    let handler = StandardSecurityHandler::with_doc_id(descriptor, id0, options);

    let candidate = password.unwrap_or_default().as_bytes();
    if handler.is_required(password.is_some()) {
        return Ok(Some(Box::new(handler.authenticate(candidate)?)));
    }

    match handler.check_password(candidate) {
        Ok(Authenticated { file_key, kind }) => Ok(Some(Box::new(DecryptionSession {
            descriptor: handler.descriptor,
            file_key,
            kind,
        }))),
        Err(PdfError::AuthenticationError) => {
            tracing::debug!("identity crypt filters, reading without a file key");
            Ok(Some(Box::new(IdentityHandler)))
        }
        Err(e) => Err(e),
    }
}

/// Pass-through handler for documents whose crypt filters are all Identity and
/// whose password is unknown.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityHandler;

impl PDFSecurityHandler for IdentityHandler {
    fn decrypt_string(&self, _objid: u32, _genno: u16, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decrypt_stream(
        &self,
        objid: u32,
        genno: u16,
        data: &[u8],
        _attrs: &PDFDict,
    ) -> Result<Vec<u8>> {
        tracing::trace!(objid, genno, "identity stream");
        Ok(data.to_vec())
    }
}
