use serde::{Deserialize, Serialize};
use url::Url;

use super::certificate::Certificate;
use super::identifier::{
    DocumentTypeIdentifier, ParticipantIdentifier, ProcessIdentifier, TransportProfile,
};

/// A single receiving endpoint, bound to the process it was advertised under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    process: ProcessIdentifier,
    transport_profile: TransportProfile,
    address: Url,
    certificate: Certificate,
}

impl Endpoint {
    pub fn new(
        process: ProcessIdentifier,
        transport_profile: TransportProfile,
        address: Url,
        certificate: Certificate,
    ) -> Self {
        Self {
            process,
            transport_profile,
            address,
            certificate,
        }
    }

    pub fn process(&self) -> &ProcessIdentifier {
        &self.process
    }

    pub fn transport_profile(&self) -> &TransportProfile {
        &self.transport_profile
    }

    /// The network address documents are delivered to.
    pub fn address(&self) -> &Url {
        &self.address
    }

    /// The certificate the endpoint presents for this transport.
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }
}

/// Everything a directory publishes about one document type for one
/// participant: the endpoints able to receive it, flattened across processes
/// in document order, plus the signer certificate when the source document
/// was signed and verified.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceMetadata {
    participant: ParticipantIdentifier,
    document_type: DocumentTypeIdentifier,
    endpoints: Vec<Endpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signer: Option<Certificate>,
}

impl ServiceMetadata {
    pub fn new(
        participant: ParticipantIdentifier,
        document_type: DocumentTypeIdentifier,
        endpoints: Vec<Endpoint>,
        signer: Option<Certificate>,
    ) -> Self {
        Self {
            participant,
            document_type,
            endpoints,
            signer,
        }
    }

    pub fn participant(&self) -> &ParticipantIdentifier {
        &self.participant
    }

    pub fn document_type(&self) -> &DocumentTypeIdentifier {
        &self.document_type
    }

    /// All advertised endpoints, in document order. May be empty.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// The certificate that signed the source document, if it was signed.
    pub fn signer(&self) -> Option<&Certificate> {
        self.signer.as_ref()
    }

    /// Selects the endpoint to deliver to for `process`, accepting any of
    /// `profiles` in preference order: the first profile with a matching
    /// endpoint wins, and ties within a profile go to document order.
    pub fn endpoint(
        &self,
        process: &ProcessIdentifier,
        profiles: &[TransportProfile],
    ) -> Option<&Endpoint> {
        profiles.iter().find_map(|profile| {
            self.endpoints
                .iter()
                .find(|endpoint| endpoint.process() == process && endpoint.transport_profile() == profile)
        })
    }
}
