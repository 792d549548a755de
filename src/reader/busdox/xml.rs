//! Event driven decoders for busdox publishing documents.
//!
//! Each document type gets its own explicit decoder producing raw
//! string-level structs; conversion into the typed model happens in the
//! reader on top. Elements are matched by local name, so producer prefixes
//! and default-namespace declarations do not matter here.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::warn;

use crate::reader::LookupError;

/// Raw string-level view of a service metadata document.
#[derive(Debug)]
pub(super) struct RawServiceMetadata {
    pub(super) participant: RawIdentifier,
    pub(super) document_type: RawIdentifier,
    pub(super) processes: Vec<RawProcess>,
}

#[derive(Debug)]
pub(super) struct RawIdentifier {
    pub(super) scheme: String,
    pub(super) value: String,
}

#[derive(Debug)]
pub(super) struct RawProcess {
    pub(super) identifier: RawIdentifier,
    pub(super) endpoints: Vec<RawEndpoint>,
}

#[derive(Debug)]
pub(super) struct RawEndpoint {
    pub(super) transport_profile: String,
    pub(super) address: String,
    pub(super) certificate: String,
}

/// Which variant a metadata payload turned out to be, decided by the root
/// element before any verification or model conversion happens.
#[derive(Debug)]
pub(super) enum MetadataDocument {
    /// A SignedServiceMetadata envelope; the caller still has to verify the
    /// signature over the original bytes.
    Signed(RawServiceMetadata),

    /// A plain ServiceMetadata document.
    Unsigned(RawServiceMetadata),

    /// Some other root element entirely. Carries the root's local name.
    Unrecognized(String),
}

/// Decodes a ServiceGroup listing, returning the href of every
/// ServiceMetadataReference in document order.
///
/// A reference without an href attribute is skipped with a warning; a
/// listing without references decodes to an empty vector.
pub(super) fn decode_service_group(body: &[u8]) -> Result<Vec<String>, LookupError> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);

    let mut hrefs = Vec::new();
    let mut seen_root = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) | Event::Empty(ref e) => {
                if !seen_root {
                    if e.local_name().as_ref() != b"ServiceGroup" {
                        return Err(LookupError::ElementNotFound("ServiceGroup"));
                    }
                    seen_root = true;
                } else if e.local_name().as_ref() == b"ServiceMetadataReference" {
                    match attribute(e, "href")? {
                        Some(href) => hrefs.push(href),
                        None => warn!("service metadata reference without an href attribute"),
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(LookupError::ElementNotFound("ServiceGroup"));
    }

    Ok(hrefs)
}

/// Decodes a metadata payload into its document variant.
pub(super) fn decode_metadata_document(body: &[u8]) -> Result<MetadataDocument, LookupError> {
    let mut reader = Reader::from_reader(body);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                return match e.local_name().as_ref() {
                    b"SignedServiceMetadata" => {
                        find_enveloped_metadata(&mut reader).map(MetadataDocument::Signed)
                    }
                    b"ServiceMetadata" => {
                        decode_service_metadata(&mut reader).map(MetadataDocument::Unsigned)
                    }
                    other => Ok(MetadataDocument::Unrecognized(
                        String::from_utf8_lossy(other).into_owned(),
                    )),
                };
            }
            Event::Empty(ref e) => {
                return match e.local_name().as_ref() {
                    b"SignedServiceMetadata" => Err(LookupError::ElementNotFound("ServiceMetadata")),
                    b"ServiceMetadata" => Err(LookupError::ElementNotFound("ServiceInformation")),
                    other => Ok(MetadataDocument::Unrecognized(
                        String::from_utf8_lossy(other).into_owned(),
                    )),
                };
            }
            Event::Eof => return Err(LookupError::ElementNotFound("ServiceMetadata")),
            _ => {}
        }
        buf.clear();
    }
}

/// Scans the children of SignedServiceMetadata for the enveloped
/// ServiceMetadata element, skipping over the Signature subtree.
fn find_enveloped_metadata(reader: &mut Reader<&[u8]>) -> Result<RawServiceMetadata, LookupError> {
    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                if depth == 0 && e.local_name().as_ref() == b"ServiceMetadata" {
                    return decode_service_metadata(reader);
                }
                depth += 1;
            }
            Event::End(_) => {
                if depth == 0 {
                    return Err(LookupError::ElementNotFound("ServiceMetadata"));
                }
                depth -= 1;
            }
            Event::Eof => return Err(LookupError::ElementNotFound("ServiceMetadata")),
            _ => {}
        }
        buf.clear();
    }
}

/// Decodes the content of a ServiceMetadata element, whose start tag has
/// already been consumed.
fn decode_service_metadata(reader: &mut Reader<&[u8]>) -> Result<RawServiceMetadata, LookupError> {
    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                if depth == 0 {
                    match e.local_name().as_ref() {
                        b"ServiceInformation" => return decode_service_information(reader),
                        b"Redirect" => return Err(redirect_unsupported()),
                        _ => {}
                    }
                }
                depth += 1;
            }
            Event::Empty(ref e) => {
                if depth == 0 && e.local_name().as_ref() == b"Redirect" {
                    return Err(redirect_unsupported());
                }
            }
            Event::End(_) => {
                if depth == 0 {
                    return Err(LookupError::ElementNotFound("ServiceInformation"));
                }
                depth -= 1;
            }
            Event::Eof => return Err(LookupError::ElementNotFound("ServiceInformation")),
            _ => {}
        }
        buf.clear();
    }
}

fn redirect_unsupported() -> LookupError {
    LookupError::InvalidDocument(
        "metadata is a Redirect, which this reader does not follow".to_string(),
    )
}

/// Decodes the content of a ServiceInformation element.
fn decode_service_information(
    reader: &mut Reader<&[u8]>,
) -> Result<RawServiceMetadata, LookupError> {
    let mut participant = None;
    let mut document_type = None;
    let mut processes = Vec::new();

    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"ParticipantIdentifier" => {
                    participant = Some(decode_identifier(reader, e, "ParticipantIdentifier")?);
                }
                b"DocumentIdentifier" => {
                    document_type = Some(decode_identifier(reader, e, "DocumentIdentifier")?);
                }
                b"Process" => processes.push(decode_process(reader)?),
                _ => depth += 1,
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"ParticipantIdentifier" => return Err(empty_identifier("ParticipantIdentifier")),
                b"DocumentIdentifier" => return Err(empty_identifier("DocumentIdentifier")),
                b"Process" => return Err(LookupError::ElementNotFound("ProcessIdentifier")),
                _ => {}
            },
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Eof => return Err(truncated()),
            _ => {}
        }
        buf.clear();
    }

    let participant = participant.ok_or(LookupError::ElementNotFound("ParticipantIdentifier"))?;
    let document_type = document_type.ok_or(LookupError::ElementNotFound("DocumentIdentifier"))?;

    Ok(RawServiceMetadata {
        participant,
        document_type,
        processes,
    })
}

/// Decodes the content of a Process element.
fn decode_process(reader: &mut Reader<&[u8]>) -> Result<RawProcess, LookupError> {
    let mut identifier = None;
    let mut endpoints = Vec::new();

    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"ProcessIdentifier" => {
                    identifier = Some(decode_identifier(reader, e, "ProcessIdentifier")?);
                }
                b"Endpoint" => endpoints.push(decode_endpoint(reader, e)?),
                _ => depth += 1,
            },
            Event::Empty(ref e) => match e.local_name().as_ref() {
                b"ProcessIdentifier" => return Err(empty_identifier("ProcessIdentifier")),
                b"Endpoint" => {
                    require_attribute(e, "Endpoint", "transportProfile")?;
                    return Err(LookupError::ElementNotFound("Address"));
                }
                _ => {}
            },
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Eof => return Err(truncated()),
            _ => {}
        }
        buf.clear();
    }

    let identifier = identifier.ok_or(LookupError::ElementNotFound("ProcessIdentifier"))?;

    Ok(RawProcess {
        identifier,
        endpoints,
    })
}

/// Decodes the content of an Endpoint element. The advertised address lives
/// inside the nested EndpointReference, the certificate is a direct child;
/// both are required.
fn decode_endpoint(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart,
) -> Result<RawEndpoint, LookupError> {
    let transport_profile = require_attribute(start, "Endpoint", "transportProfile")?;

    let mut address = None;
    let mut certificate = None;

    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"Address" => address = Some(collect_text(reader)?),
                b"Certificate" => certificate = Some(collect_text(reader)?),
                _ => depth += 1,
            },
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Eof => return Err(truncated()),
            _ => {}
        }
        buf.clear();
    }

    let address = address
        .filter(|address| !address.is_empty())
        .ok_or(LookupError::ElementNotFound("Address"))?;
    let certificate = certificate
        .filter(|certificate| !certificate.is_empty())
        .ok_or(LookupError::ElementNotFound("Certificate"))?;

    Ok(RawEndpoint {
        transport_profile,
        address,
        certificate,
    })
}

/// Decodes a scheme-qualified identifier element whose start tag has already
/// been consumed: the scheme is an attribute, the value is the text content.
fn decode_identifier(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart,
    element: &'static str,
) -> Result<RawIdentifier, LookupError> {
    let scheme = require_attribute(start, element, "scheme")?;
    let value = collect_text(reader)?;

    if value.is_empty() {
        return Err(empty_identifier(element));
    }

    Ok(RawIdentifier { scheme, value })
}

fn empty_identifier(element: &str) -> LookupError {
    LookupError::InvalidDocument(format!("{element} has no value"))
}

fn truncated() -> LookupError {
    LookupError::InvalidDocument("unexpected end of document".to_string())
}

/// Collects the unescaped text content of the current element, consuming
/// events up to and including its end tag.
fn collect_text(reader: &mut Reader<&[u8]>) -> Result<String, LookupError> {
    let mut text = String::new();
    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Text(ref t) => text.push_str(&t.unescape()?),
            Event::Eof => return Err(truncated()),
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

fn attribute(e: &BytesStart, name: &str) -> Result<Option<String>, LookupError> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn require_attribute(
    e: &BytesStart,
    element: &'static str,
    name: &'static str,
) -> Result<String, LookupError> {
    attribute(e, name)?.ok_or(LookupError::MissingAttribute {
        element,
        attribute: name,
    })
}
