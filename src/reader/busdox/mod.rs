use percent_encoding::percent_decode_str;
use tracing::{debug, warn};
use url::Url;

use crate::core::certificate::Certificate;
use crate::core::identifier::{
    DocumentTypeIdentifier, ParticipantIdentifier, ProcessIdentifier, Scheme, TransportProfile,
};
use crate::core::service_metadata::{Endpoint, ServiceMetadata};
use crate::reader::{FetcherResponse, LookupError, MetadataReader};
use crate::verification::SignatureVerifier;

use self::xml::{MetadataDocument, RawServiceMetadata};

mod xml;

/// Marker separating the generic part of a metadata reference href from the
/// document type identifier it advertises.
const SERVICES_MARKER: &str = "/services/";

/// Reader for the busdox publishing document format.
///
/// Stateless; a single instance can be shared freely across threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct BusdoxReader;

impl BusdoxReader {
    /// XML namespace of the documents this reader decodes.
    pub const NAMESPACE: &'static str = "http://busdox.org/serviceMetadata/publishing/1.0/";

    pub fn new() -> Self {
        Self
    }
}

impl MetadataReader for BusdoxReader {
    fn parse_document_identifiers(
        &self,
        response: &FetcherResponse,
    ) -> Result<Vec<DocumentTypeIdentifier>, LookupError> {
        let hrefs = xml::decode_service_group(response.body())?;

        let mut identifiers = Vec::with_capacity(hrefs.len());
        for href in hrefs {
            match document_type_from_href(&href) {
                Some(identifier) => identifiers.push(identifier),
                None => warn!("unable to parse metadata reference '{href}'"),
            }
        }

        Ok(identifiers)
    }

    fn parse_service_metadata(
        &self,
        response: &FetcherResponse,
        verifier: &dyn SignatureVerifier,
    ) -> Result<ServiceMetadata, LookupError> {
        let (raw, signer) = match xml::decode_metadata_document(response.body())? {
            MetadataDocument::Signed(raw) => {
                let signer = verifier.verify(response.body())?;
                debug!("verified signed metadata document; signer is {}", signer.subject());
                (raw, Some(signer))
            }
            MetadataDocument::Unsigned(raw) => (raw, None),
            MetadataDocument::Unrecognized(root) => {
                debug!("expected a metadata document, found root element '{root}'");
                return Err(LookupError::ElementNotFound("ServiceMetadata"));
            }
        };

        let RawServiceMetadata {
            participant,
            document_type,
            processes,
        } = raw;

        let mut endpoints = Vec::new();
        for process in processes {
            let process_id = ProcessIdentifier::new(
                process.identifier.value,
                Scheme::from(process.identifier.scheme),
            );

            for endpoint in process.endpoints {
                let address =
                    Url::parse(&endpoint.address).map_err(|source| LookupError::InvalidAddress {
                        address: endpoint.address.clone(),
                        source,
                    })?;

                endpoints.push(Endpoint::new(
                    process_id.clone(),
                    TransportProfile::from(endpoint.transport_profile),
                    address,
                    Certificate::from_base64(&endpoint.certificate)?,
                ));
            }
        }

        Ok(ServiceMetadata::new(
            ParticipantIdentifier::new(participant.value, Scheme::from(participant.scheme)),
            DocumentTypeIdentifier::new(document_type.value, Scheme::from(document_type.scheme)),
            endpoints,
            signer,
        ))
    }
}

/// Decodes one listing reference href into a document type identifier.
///
/// The document type is the percent encoded `<scheme>::<value>` path segment
/// following the `/services/` marker; the identifier keeps the href it was
/// read from. Returns `None` when the href does not carry a decodable
/// identifier, leaving the skip decision to the caller.
fn document_type_from_href(href: &str) -> Option<DocumentTypeIdentifier> {
    let (_, segment) = href.split_once(SERVICES_MARKER)?;
    let decoded = percent_decode_str(segment).decode_utf8().ok()?;
    let identifier: DocumentTypeIdentifier = decoded.parse().ok()?;
    let href = Url::parse(href).ok()?;

    Some(identifier.with_href(href))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn href_segment_is_percent_decoded() {
        let identifier = document_type_from_href(
            "http://smp.example.com/iso6523-actorid-upis%3A%3A9908%3A810418052\
             /services/busdox-docid-qns%3A%3Aurn%3Ainvoice%232.1",
        )
        .unwrap();

        assert_eq!(identifier.scheme().as_str(), "busdox-docid-qns");
        assert_eq!(identifier.value(), "urn:invoice#2.1");
        assert!(identifier.href().is_some());
    }

    #[test]
    fn href_without_marker_or_separator_is_rejected() {
        assert!(document_type_from_href("http://smp.example.com/other/busdox%3A%3Ax").is_none());
        assert!(document_type_from_href("http://smp.example.com/services/no-separator").is_none());
        assert!(document_type_from_href("http://smp.example.com/services/scheme%3A%3A").is_none());
    }

    #[test]
    fn href_decoding_to_invalid_utf8_is_rejected() {
        // %FF decodes to a byte that is not valid UTF-8.
        assert!(document_type_from_href("http://smp.example.com/services/a%FF%3A%3Ab").is_none());
    }
}
