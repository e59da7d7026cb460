//! Validates the leading `EBML` element and locates the `Segment` element
//! that follows it.

use log::debug;

use crate::cursor::{EbmlElement, ElementCursor};
use crate::error::{Error, Result};
use crate::ids;
use crate::io::{ByteSource, SharedSource};
use crate::vint::read_uint;

/// The validated outcome of reading a file's header: the `Segment` element
/// to demultiplex.
pub struct ValidatedHeader {
    /// The `Segment` element found immediately after the `EBML` header.
    pub segment: EbmlElement,
}

/// Read and validate the leading `EBML` element, then locate the following
/// `Segment` element.
///
/// Rejects `EBMLReadVersion > 1` and any `DocType` other than "matroska" or
/// "webm" (stored length must be at most 16 bytes; comparison is a prefix
/// match up to that length, not null-termination).
pub fn validate(root: SharedSource) -> Result<ValidatedHeader> {
    let mut outer = ElementCursor::new(root)?;
    outer.until(&[ids::EBML])?;
    let ebml = outer
        .current()
        .cloned()
        .ok_or(Error::MissingElement(ids::EBML))?;

    validate_ebml_body(&ebml)?;
    debug!("EBML header validated");

    outer.advance()?;
    outer.until(&[ids::SEGMENT])?;
    let segment = outer
        .current()
        .cloned()
        .ok_or(Error::MissingElement(ids::SEGMENT))?;
    debug!("found Segment element, size {} bytes", segment.size);

    Ok(ValidatedHeader { segment })
}

fn validate_ebml_body(ebml: &EbmlElement) -> Result<()> {
    let mut children = ElementCursor::new(ebml.children())?;
    children.until(&[ids::EBML_READ_VERSION])?;
    let elem = children
        .current()
        .cloned()
        .ok_or(Error::MissingElement(ids::EBML_READ_VERSION))?;
    let mut payload = elem.payload.clone();
    let version = read_uint(&mut payload, elem.size)?;
    if version > 1 {
        return Err(Error::UnsupportedVersion(version));
    }
    debug!("EBMLReadVersion = {version}");

    let mut children = ElementCursor::new(ebml.children())?;
    children.until(&[ids::DOC_TYPE])?;
    let doc_type = children
        .current()
        .cloned()
        .ok_or(Error::UnrecognizedDocType)?;
    if doc_type.size > ids::DOC_TYPE_MAX_LEN {
        return Err(Error::UnrecognizedDocType);
    }
    let mut bytes = vec![0u8; doc_type.size as usize];
    doc_type.payload.clone().read_exact(&mut bytes)?;
    if bytes != ids::DOC_TYPE_MATROSKA && bytes != ids::DOC_TYPE_WEBM {
        return Err(Error::UnrecognizedDocType);
    }
    debug!("DocType = {}", String::from_utf8_lossy(&bytes));

    Ok(())
}
