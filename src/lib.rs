//! Metadata reader for participant lookup in the PEPPOL eDelivery network.
//!
//! Given the raw bytes of a document fetched from a Service Metadata
//! Publisher (SMP), this library decodes the structured routing information
//! inside:
//!
//! - a **service group listing** advertises the document types a participant
//!   can receive, each entry referencing the full metadata document;
//! - a **service metadata document** describes, for one document type, the
//!   endpoints able to receive it: business process, transport profile,
//!   network address and the certificate presented for the transport. The
//!   document may arrive wrapped in a signature envelope, in which case the
//!   supplied [SignatureVerifier](verification::SignatureVerifier) is
//!   consulted and the signer certificate is kept on the result.
//!
//! Fetching over the network, locating the publisher in DNS, XML signature
//! cryptography and certificate trust policy are deliberately not part of
//! this crate; they enter through the
//! [FetcherResponse](reader::FetcherResponse) and
//! [SignatureVerifier](verification::SignatureVerifier) seams.
//!
//! # Usage
//!
//! ```ignore
//! use peppol_lookup::core::identifier::{ProcessIdentifier, Scheme, TransportProfile};
//! use peppol_lookup::reader::busdox::BusdoxReader;
//! use peppol_lookup::reader::{FetcherResponse, MetadataReader};
//!
//! let reader = BusdoxReader::new();
//!
//! // Fetch the participant's service group and list its document types.
//! let listing = FetcherResponse::new(fetcher.fetch(&group_url)?);
//! let document_types = reader.parse_document_identifiers(&listing)?;
//!
//! // Follow a reference to the metadata document for one document type.
//! let invoice = document_types
//!     .iter()
//!     .find(|d| d.value().contains("Invoice"))
//!     .expect("participant does not receive invoices");
//! let response = FetcherResponse::new(fetcher.fetch(invoice.href().unwrap())?);
//!
//! // Decode it, verifying the signature with your own XML-DSig stack.
//! let metadata = reader.parse_service_metadata(&response, &verifier)?;
//!
//! // Pick the endpoint to deliver to.
//! let process = ProcessIdentifier::new(
//!     "urn:fdc:peppol.eu:2017:poacc:billing:01:1.0",
//!     Scheme::from(ProcessIdentifier::DEFAULT_SCHEME),
//! );
//! let endpoint = metadata
//!     .endpoint(&process, &[TransportProfile::As4])
//!     .expect("no AS4 endpoint for process");
//! deliver(endpoint.address(), endpoint.certificate())?;
//! ```

pub mod core;
pub mod reader;
pub mod verification;

pub use crate::core::certificate::CertificateError;
pub use crate::reader::LookupError;
pub use crate::verification::SecurityError;
