use std::time::SystemTime;

use base64::prelude::*;
use serde::{Deserialize, Serialize};
use x509_cert::der::Decode;

/// An X.509 certificate as presented by an endpoint or a document signer.
///
/// The certificate is an opaque immutable value: it keeps the raw DER it was
/// decoded from and exposes only the fields the lookup layer needs (subject
/// name and validity window). Whether the certificate is trusted is the
/// business of the caller's trust layer, which can take [as_der](Self::as_der)
/// to its own cryptographic stack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Certificate {
    der: Vec<u8>,
    subject: String,
    not_before: SystemTime,
    not_after: SystemTime,
}

impl Certificate {
    /// Decodes a DER encoded X.509 certificate.
    pub fn from_der(der: impl Into<Vec<u8>>) -> Result<Self, CertificateError> {
        let der = der.into();
        let parsed = x509_cert::Certificate::from_der(&der)?;

        let subject = parsed.tbs_certificate.subject.to_string();
        let validity = parsed.tbs_certificate.validity;

        Ok(Self {
            der,
            subject,
            not_before: validity.not_before.to_system_time(),
            not_after: validity.not_after.to_system_time(),
        })
    }

    /// Decodes a certificate from base64 text as found in metadata documents.
    ///
    /// Directory producers are inconsistent about line wrapping and padding,
    /// so ASCII whitespace is ignored and padding is optional.
    pub fn from_base64(text: &str) -> Result<Self, CertificateError> {
        let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let der = BASE64_STANDARD_NO_PAD.decode(compact.trim_end_matches('='))?;
        Self::from_der(der)
    }

    /// The raw DER this certificate was decoded from.
    pub fn as_der(&self) -> &[u8] {
        &self.der
    }

    /// The subject distinguished name, in string form.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn not_before(&self) -> SystemTime {
        self.not_before
    }

    pub fn not_after(&self) -> SystemTime {
        self.not_after
    }

    /// Whether `at` falls within the certificate validity window, inclusive.
    pub fn is_valid_at(&self, at: SystemTime) -> bool {
        self.not_before <= at && at <= self.not_after
    }
}

impl TryFrom<Vec<u8>> for Certificate {
    type Error = CertificateError;

    fn try_from(der: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_der(der)
    }
}

impl From<Certificate> for Vec<u8> {
    fn from(certificate: Certificate) -> Self {
        certificate.der
    }
}

/// Certificate decoding error.
#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    /// The certificate text was not valid base64.
    #[error("certificate is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded bytes are not a DER encoded X.509 certificate.
    #[error("certificate is not valid DER: {0}")]
    Der(#[from] x509_cert::der::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_base64() {
        let err = Certificate::from_base64("not*base64*at*all").unwrap_err();
        assert!(matches!(err, CertificateError::Base64(_)));
    }

    #[test]
    fn rejects_bytes_that_are_not_der() {
        let err = Certificate::from_base64(&BASE64_STANDARD.encode(b"hello world")).unwrap_err();
        assert!(matches!(err, CertificateError::Der(_)));

        let err = Certificate::from_der(b"hello world".to_vec()).unwrap_err();
        assert!(matches!(err, CertificateError::Der(_)));
    }
}
