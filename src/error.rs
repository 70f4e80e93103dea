//! Error types shared by every conversion and validation routine.

use thiserror::Error;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, BundleError>;

/// Broad classification of a [`BundleError`].
///
/// User errors are always caused by caller-supplied data and must not be
/// retried as-is. Internal errors mean the engine produced or accepted an
/// inconsistent value that a lower layer then rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    User,
    Internal,
}

/// Represents errors that can occur while converting, validating or
/// configuring certificate bundles.
#[derive(Debug, Error, Clone)]
pub enum BundleError {
    /// A PEM block or DER structure could not be decoded.
    #[error("Error decoding {0}")]
    DecodingError(String),

    /// Decoded bytes did not parse as the expected structure.
    #[error("Error parsing {0}")]
    ParsingError(String),

    /// The private key block or wrapped algorithm is not RSA or EC.
    #[error("Unsupported key type: {0}")]
    UnsupportedKeyType(String),

    /// The public keys of the certificate and the private key could not be compared.
    #[error("Could not compare public and private keys: {0}")]
    KeyComparison(String),

    /// The certificate's public key does not belong to the private key.
    #[error("Public key of certificate does not match private key")]
    KeyMismatch,

    /// A certificate above the leaf in the trust path lacks the CA flag.
    #[error("certificate {index} of certificate chain is not a certificate authority")]
    NotCertificateAuthority { index: usize },

    /// The authority key identifier of a certificate does not name its parent.
    #[error("certificate {index} of certificate chain ca trust path is incorrect ({child}/{parent})")]
    TrustPath {
        index: usize,
        child: String,
        parent: String,
    },

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error decoding or encoding the JSON form of a bundle.
    #[error("JSON error: {0}")]
    Json(String),

    /// Error reported by rustls while assembling a configuration.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// The engine produced a value a lower layer refused.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BundleError {
    /// Returns whether the error is attributable to caller input.
    pub fn kind(&self) -> ErrorKind {
        match self {
            BundleError::Tls(_) | BundleError::Internal(_) => ErrorKind::Internal,
            _ => ErrorKind::User,
        }
    }

    pub fn is_user_error(&self) -> bool {
        self.kind() == ErrorKind::User
    }
}

impl From<der::Error> for BundleError {
    /// Converts a `der::Error` into a `BundleError`.
    fn from(err: der::Error) -> Self {
        BundleError::DecodingError(err.to_string())
    }
}

impl From<pem::PemError> for BundleError {
    fn from(err: pem::PemError) -> Self {
        BundleError::DecodingError(err.to_string())
    }
}

impl From<serde_json::Error> for BundleError {
    fn from(err: serde_json::Error) -> Self {
        BundleError::Json(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(BundleError::KeyMismatch.kind(), ErrorKind::User);
        assert_eq!(
            BundleError::NotCertificateAuthority { index: 1 }.kind(),
            ErrorKind::User
        );
        assert_eq!(
            BundleError::Internal("pool".to_string()).kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            BundleError::Tls(rustls::Error::NoCertificatesPresented).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_trust_path_message() {
        let err = BundleError::TrustPath {
            index: 1,
            child: "leaf.example.com".to_string(),
            parent: "Example Root CA".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "certificate 1 of certificate chain ca trust path is incorrect (leaf.example.com/Example Root CA)"
        );
    }
}
