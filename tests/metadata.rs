use std::sync::Mutex;
use std::time::Duration;

use peppol_lookup::core::certificate::Certificate;
use peppol_lookup::core::identifier::{
    ParticipantIdentifier, ProcessIdentifier, Scheme, TransportProfile,
};
use peppol_lookup::core::service_metadata::ServiceMetadata;
use peppol_lookup::reader::busdox::BusdoxReader;
use peppol_lookup::reader::{FetcherResponse, MetadataReader};
use peppol_lookup::verification::{DenyAll, SecurityError, SignatureVerifier};
use peppol_lookup::{CertificateError, LookupError};

const SERVICE_GROUP: &str = include_str!("fixtures/service_group.xml");
const SERVICE_METADATA: &str = include_str!("fixtures/service_metadata.xml");
const SIGNED_SERVICE_METADATA: &str = include_str!("fixtures/signed_service_metadata.xml");
const REDIRECT: &str = include_str!("fixtures/redirect.xml");
const AP_CERTIFICATE: &str = include_str!("fixtures/ap_certificate.b64");
const SMP_CERTIFICATE: &str = include_str!("fixtures/smp_certificate.b64");

const INVOICE_DOC_TYPE: &str = "urn:oasis:names:specification:ubl:schema:xsd:Invoice-2::Invoice##urn:www.cenbii.eu:transaction:biitrns010:ver2.0:extended:urn:www.peppol.eu:bis:peppol4a:ver2.0::2.1";

fn response(body: &[u8]) -> FetcherResponse {
    FetcherResponse::new(body.to_vec())
}

fn ap_certificate() -> Certificate {
    Certificate::from_base64(AP_CERTIFICATE).unwrap()
}

fn smp_certificate() -> Certificate {
    Certificate::from_base64(SMP_CERTIFICATE).unwrap()
}

fn bii04() -> ProcessIdentifier {
    ProcessIdentifier::new(
        "urn:www.cenbii.eu:profile:bii04:ver2.0",
        Scheme::from(ProcessIdentifier::DEFAULT_SCHEME),
    )
}

fn bii05() -> ProcessIdentifier {
    ProcessIdentifier::new(
        "urn:www.cenbii.eu:profile:bii05:ver2.0",
        Scheme::from(ProcessIdentifier::DEFAULT_SCHEME),
    )
}

/// Accepts every document with a fixed signer, recording the bytes it saw.
struct StaticVerifier {
    signer: Certificate,
    seen: Mutex<Vec<Vec<u8>>>,
}

impl StaticVerifier {
    fn new(signer: Certificate) -> Self {
        Self {
            signer,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl SignatureVerifier for StaticVerifier {
    fn verify(&self, document: &[u8]) -> Result<Certificate, SecurityError> {
        self.seen.lock().unwrap().push(document.to_vec());
        Ok(self.signer.clone())
    }
}

/// Fails every document the way an XML signature stack would on a bad digest.
struct FailingVerifier;

impl SignatureVerifier for FailingVerifier {
    fn verify(&self, _document: &[u8]) -> Result<Certificate, SecurityError> {
        Err(SecurityError::invalid("digest mismatch"))
    }
}

#[test]
fn unsigned_document_decodes_participant_document_type_and_endpoints() {
    let metadata = BusdoxReader::new()
        .parse_service_metadata(&response(SERVICE_METADATA.as_bytes()), &DenyAll)
        .unwrap();

    assert_eq!(
        metadata.participant(),
        &ParticipantIdentifier::new(
            "9908:810418052",
            Scheme::from(ParticipantIdentifier::DEFAULT_SCHEME),
        ),
    );
    assert_eq!(metadata.document_type().value(), INVOICE_DOC_TYPE);
    assert_eq!(metadata.document_type().scheme().as_str(), "busdox-docid-qns");
    assert!(metadata.signer().is_none());

    let endpoints = metadata.endpoints();
    assert_eq!(endpoints.len(), 2);

    assert_eq!(endpoints[0].process(), &bii04());
    assert_eq!(endpoints[0].transport_profile(), &TransportProfile::As2);
    assert_eq!(endpoints[0].address().as_str(), "https://ap.example.com/as2");
    assert_eq!(endpoints[0].certificate(), &ap_certificate());

    assert_eq!(endpoints[1].process(), &bii05());
    assert_eq!(endpoints[1].transport_profile(), &TransportProfile::As4);
    assert_eq!(endpoints[1].address().as_str(), "https://ap.example.org/as4");
}

#[test]
fn endpoint_certificates_expose_subject_and_validity() {
    let certificate = ap_certificate();

    assert!(certificate.subject().contains("ap.example.com"));
    assert!(certificate.subject().contains("Example Access Point"));
    assert!(certificate.not_before() < certificate.not_after());

    let hour = Duration::from_secs(3600);
    assert!(certificate.is_valid_at(certificate.not_before()));
    assert!(certificate.is_valid_at(certificate.not_before() + hour));
    assert!(!certificate.is_valid_at(certificate.not_before() - hour));
    assert!(!certificate.is_valid_at(certificate.not_after() + hour));

    let reparsed = Certificate::from_der(certificate.as_der().to_vec()).unwrap();
    assert_eq!(reparsed, certificate);
}

#[test]
fn endpoint_selection_prefers_earlier_profiles() {
    let metadata = BusdoxReader::new()
        .parse_service_metadata(&response(SERVICE_METADATA.as_bytes()), &DenyAll)
        .unwrap();

    let preference = [TransportProfile::As4, TransportProfile::As2];

    let endpoint = metadata.endpoint(&bii05(), &preference).unwrap();
    assert_eq!(endpoint.transport_profile(), &TransportProfile::As4);

    // bii04 publishes no AS4 endpoint, so selection falls through to AS2.
    let endpoint = metadata.endpoint(&bii04(), &preference).unwrap();
    assert_eq!(endpoint.transport_profile(), &TransportProfile::As2);

    assert!(metadata.endpoint(&bii04(), &[TransportProfile::As4]).is_none());
    assert!(metadata.endpoint(&bii05(), &[TransportProfile::Start]).is_none());

    let unknown = ProcessIdentifier::new("urn:nope", Scheme::from(ProcessIdentifier::DEFAULT_SCHEME));
    assert!(metadata.endpoint(&unknown, &preference).is_none());
}

#[test]
fn endpoints_flatten_in_document_order() {
    let body = format!(
        r#"<ServiceMetadata xmlns="http://busdox.org/serviceMetadata/publishing/1.0/">
  <ServiceInformation>
    <ParticipantIdentifier scheme="iso6523-actorid-upis">9908:810418052</ParticipantIdentifier>
    <DocumentIdentifier scheme="busdox-docid-qns">invoice-01</DocumentIdentifier>
    <ProcessList>
      <Process>
        <ProcessIdentifier scheme="cenbii-procid-ubl">urn:proc</ProcessIdentifier>
        <ServiceEndpointList>
          <Endpoint transportProfile="peppol-transport-as4-v2_0">
            <EndpointReference><Address>https://first.example.com/as4</Address></EndpointReference>
            <Certificate>{cert}</Certificate>
          </Endpoint>
          <Endpoint transportProfile="peppol-transport-as4-v2_0">
            <EndpointReference><Address>https://second.example.com/as4</Address></EndpointReference>
            <Certificate>{cert}</Certificate>
          </Endpoint>
        </ServiceEndpointList>
      </Process>
    </ProcessList>
  </ServiceInformation>
</ServiceMetadata>"#,
        cert = AP_CERTIFICATE.trim(),
    );

    let metadata = BusdoxReader::new()
        .parse_service_metadata(&response(body.as_bytes()), &DenyAll)
        .unwrap();

    let addresses: Vec<_> = metadata
        .endpoints()
        .iter()
        .map(|endpoint| endpoint.address().as_str())
        .collect();
    assert_eq!(
        addresses,
        ["https://first.example.com/as4", "https://second.example.com/as4"],
    );

    // Within one profile, ties go to document order.
    let process = ProcessIdentifier::new("urn:proc", Scheme::from(ProcessIdentifier::DEFAULT_SCHEME));
    let endpoint = metadata.endpoint(&process, &[TransportProfile::As4]).unwrap();
    assert_eq!(endpoint.address().as_str(), "https://first.example.com/as4");
}

#[test]
fn signed_document_verifies_and_records_the_signer() {
    let reader = BusdoxReader::new();
    let verifier = StaticVerifier::new(smp_certificate());

    let metadata = reader
        .parse_service_metadata(&response(SIGNED_SERVICE_METADATA.as_bytes()), &verifier)
        .unwrap();

    assert_eq!(metadata.signer(), Some(&smp_certificate()));
    assert!(metadata.signer().unwrap().subject().contains("smp.example.com"));

    // The verifier must see the document exactly as fetched.
    let seen = verifier.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], SIGNED_SERVICE_METADATA.as_bytes());

    // The enveloped content decodes the same as the unsigned rendition.
    let unsigned = reader
        .parse_service_metadata(&response(SERVICE_METADATA.as_bytes()), &DenyAll)
        .unwrap();
    assert_eq!(metadata.participant(), unsigned.participant());
    assert_eq!(metadata.document_type(), unsigned.document_type());
    assert_eq!(metadata.endpoints(), unsigned.endpoints());
}

#[test]
fn verification_failure_fails_the_parse() {
    let err = BusdoxReader::new()
        .parse_service_metadata(&response(SIGNED_SERVICE_METADATA.as_bytes()), &FailingVerifier)
        .unwrap_err();

    assert!(matches!(
        err,
        LookupError::Security(SecurityError::InvalidSignature(_)),
    ));
    assert_eq!(err.to_string(), "signature verification failed: digest mismatch");
}

#[test]
fn unsigned_documents_never_touch_the_verifier() {
    let verifier = StaticVerifier::new(smp_certificate());

    BusdoxReader::new()
        .parse_service_metadata(&response(SERVICE_METADATA.as_bytes()), &verifier)
        .unwrap();

    assert!(verifier.seen.lock().unwrap().is_empty());
}

#[test]
fn deny_all_rejects_signed_documents_only() {
    let reader = BusdoxReader::new();

    assert!(reader
        .parse_service_metadata(&response(SERVICE_METADATA.as_bytes()), &DenyAll)
        .is_ok());

    let err = reader
        .parse_service_metadata(&response(SIGNED_SERVICE_METADATA.as_bytes()), &DenyAll)
        .unwrap_err();
    assert!(matches!(
        err,
        LookupError::Security(SecurityError::VerifierUnavailable),
    ));
}

#[test]
fn undecodable_certificate_fails_the_parse() {
    // Corrupt the leading bytes of both embedded certificates.
    let body = SERVICE_METADATA.replace("MIIB3zCC", "!!!!!!!!");

    let err = BusdoxReader::new()
        .parse_service_metadata(&response(body.as_bytes()), &DenyAll)
        .unwrap_err();
    assert!(matches!(
        err,
        LookupError::Certificate(CertificateError::Base64(_)),
    ));
}

#[test]
fn redirect_documents_are_rejected() {
    let err = BusdoxReader::new()
        .parse_service_metadata(&response(REDIRECT.as_bytes()), &DenyAll)
        .unwrap_err();

    assert!(matches!(err, LookupError::InvalidDocument(_)));
    assert!(err.to_string().contains("Redirect"));
}

#[test]
fn listing_document_is_not_service_metadata() {
    let err = BusdoxReader::new()
        .parse_service_metadata(&response(SERVICE_GROUP.as_bytes()), &DenyAll)
        .unwrap_err();

    assert!(matches!(err, LookupError::ElementNotFound("ServiceMetadata")));
    assert_eq!(err.to_string(), "ServiceMetadata element not found");
}

#[test]
fn structural_problems_fail_with_descriptive_errors() {
    let reader = BusdoxReader::new();

    let body = SERVICE_METADATA.replace(" transportProfile=\"busdox-transport-as2-ver1p0\"", "");
    let err = reader
        .parse_service_metadata(&response(body.as_bytes()), &DenyAll)
        .unwrap_err();
    assert!(matches!(
        err,
        LookupError::MissingAttribute {
            element: "Endpoint",
            attribute: "transportProfile",
        },
    ));
    assert_eq!(
        err.to_string(),
        "Endpoint element is missing the 'transportProfile' attribute",
    );

    let body = SERVICE_METADATA.replace("ParticipantIdentifier", "OtherIdentifier");
    let err = reader
        .parse_service_metadata(&response(body.as_bytes()), &DenyAll)
        .unwrap_err();
    assert!(matches!(err, LookupError::ElementNotFound("ParticipantIdentifier")));

    let body = SERVICE_METADATA.replace("wsa:Address", "wsa:Location");
    let err = reader
        .parse_service_metadata(&response(body.as_bytes()), &DenyAll)
        .unwrap_err();
    assert!(matches!(err, LookupError::ElementNotFound("Address")));

    let cut = SERVICE_METADATA.find("<ProcessList>").unwrap() + "<ProcessList>".len();
    let err = reader
        .parse_service_metadata(&response(SERVICE_METADATA[..cut].as_bytes()), &DenyAll)
        .unwrap_err();
    assert!(matches!(err, LookupError::InvalidDocument(_)));
    assert!(err.to_string().contains("unexpected end"));
}

#[test]
fn metadata_serde_round_trip() {
    let metadata = BusdoxReader::new()
        .parse_service_metadata(
            &response(SIGNED_SERVICE_METADATA.as_bytes()),
            &StaticVerifier::new(smp_certificate()),
        )
        .unwrap();

    let value = serde_json::to_value(&metadata).unwrap();
    let back: ServiceMetadata = serde_json::from_value(value.clone()).unwrap();
    assert_eq!(back, metadata);

    // Certificates travel as DER bytes and are revalidated on the way in.
    let mut corrupted = value;
    corrupted["endpoints"][0]["certificate"] = serde_json::json!([1, 2, 3]);
    assert!(serde_json::from_value::<ServiceMetadata>(corrupted).is_err());
}
