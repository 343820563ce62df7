//! PDF model types.
//!
//! - `objects` - PDF object types (PDFObject, PDFStream)

pub mod objects;

pub use objects::{PDFDict, PDFObject, PDFStream};
