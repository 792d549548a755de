use crate::core::certificate::CertificateError;
use crate::core::identifier::{DocumentTypeIdentifier, MalformedIdentifierError};
use crate::core::service_metadata::ServiceMetadata;
use crate::verification::{SecurityError, SignatureVerifier};

pub mod busdox;

/// A fetched directory document, as handed over by the network layer.
///
/// The reader only ever needs the raw body. Status codes, headers and the
/// fetch itself belong to the collaborator that produced this.
#[derive(Clone, Debug)]
pub struct FetcherResponse {
    body: Vec<u8>,
}

impl FetcherResponse {
    pub fn new(body: Vec<u8>) -> Self {
        Self { body }
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl From<Vec<u8>> for FetcherResponse {
    fn from(body: Vec<u8>) -> Self {
        Self { body }
    }
}

/// Decodes fetched directory documents into the typed model.
///
/// [BusdoxReader](busdox::BusdoxReader) is the shipped implementation for
/// the busdox publishing format; the trait is the seam for other directory
/// dialects.
pub trait MetadataReader {
    /// Decodes a service group listing into the document types advertised
    /// for a participant, in document order.
    ///
    /// A reference entry that does not carry a decodable document type is
    /// skipped with a warning rather than failing the parse; one corrupt
    /// advertisement must not hide the valid ones.
    fn parse_document_identifiers(
        &self,
        response: &FetcherResponse,
    ) -> Result<Vec<DocumentTypeIdentifier>, LookupError>;

    /// Decodes a service metadata document into participant, document type
    /// and receiving endpoints.
    ///
    /// When the document is signed, `verifier` is invoked on the original
    /// fetched bytes and its certificate is recorded as the signer;
    /// verification failures are surfaced untouched. Unsigned documents
    /// never touch the verifier. Unlike the listing parse, any structural
    /// problem fails the whole call.
    fn parse_service_metadata(
        &self,
        response: &FetcherResponse,
        verifier: &dyn SignatureVerifier,
    ) -> Result<ServiceMetadata, LookupError>;
}

/// Directory document decoding error.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The input was not well formed XML.
    #[error("invalid xml: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An element required by the document structure was absent.
    #[error("{0} element not found")]
    ElementNotFound(&'static str),

    /// An element was missing a required attribute.
    #[error("{element} element is missing the '{attribute}' attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    /// The document was well formed XML but not usable as the expected
    /// document type.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// An identifier string did not follow the `<scheme>::<value>` form.
    #[error(transparent)]
    MalformedIdentifier(#[from] MalformedIdentifierError),

    /// An endpoint advertised an address that is not a valid URL.
    #[error("invalid endpoint address '{address}': {source}")]
    InvalidAddress {
        address: String,
        source: url::ParseError,
    },

    /// A signed document failed signature verification.
    #[error(transparent)]
    Security(#[from] SecurityError),

    /// An endpoint carried an undecodable certificate.
    #[error("endpoint certificate could not be decoded: {0}")]
    Certificate(#[from] CertificateError),
}
