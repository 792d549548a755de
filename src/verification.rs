use crate::core::certificate::Certificate;

/// Verification oracle for signed metadata documents.
///
/// The reader calls this with the exact bytes it was handed whenever a
/// document turns out to be signed, and expects back the certificate that
/// produced the signature. XML signature processing itself is out of scope
/// for this crate; implementations typically wrap an existing XML security
/// stack and a trust store.
///
/// Implementations are shared by reference across parse calls and must be
/// safe to use from multiple threads.
pub trait SignatureVerifier: Send + Sync {
    /// Verifies the enveloped signature of `document` and returns the
    /// signer's certificate.
    fn verify(&self, document: &[u8]) -> Result<Certificate, SecurityError>;
}

/// Rejects every signed document.
///
/// The fallback for callers with no XML signature stack wired up: unsigned
/// documents parse as usual, while signed documents fail with
/// [SecurityError::VerifierUnavailable] instead of being silently treated as
/// unverified.
#[derive(Clone, Copy, Debug, Default)]
pub struct DenyAll;

impl SignatureVerifier for DenyAll {
    fn verify(&self, _document: &[u8]) -> Result<Certificate, SecurityError> {
        Err(SecurityError::VerifierUnavailable)
    }
}

/// Signature verification error.
#[derive(Debug, thiserror::Error)]
pub enum SecurityError {
    /// The document carries a signature that did not verify.
    #[error("signature verification failed: {0}")]
    InvalidSignature(String),

    /// The signature verified but the signer is not accepted.
    #[error("signer is not trusted: {0}")]
    UntrustedSigner(String),

    /// A signed document was encountered but no verifier is configured.
    #[error("no signature verifier is available")]
    VerifierUnavailable,
}

impl SecurityError {
    pub fn invalid(e: impl ToString) -> Self {
        Self::InvalidSignature(e.to_string())
    }
}
