pub mod extensions;
pub mod name;

use der::Decode;
use extensions::{
    AuthorityKeyIdentifier, BasicConstraints, SubjectAltName, SubjectKeyIdentifier,
    find_extension,
};
use name::DistinguishedName;
use rsa::BigUint;
use x509_cert::certificate::CertificateInner;

use crate::error::{BundleError, Result};
use crate::key::PublicKey;
use crate::pem_utils::{CERTIFICATE_LABEL, decode_block, der_to_pem, hex_formatted};

/// A decoded X.509 certificate.
///
/// The fields the bundle engine relies on (CA flag, key identifiers, subject,
/// DNS names) are decoded once when the certificate is parsed, so a malformed
/// extension fails the parse rather than a later check.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
    subject: DistinguishedName,
    is_ca: bool,
    subject_key_id: Vec<u8>,
    authority_key_id: Vec<u8>,
    dns_names: Vec<String>,
}

impl Certificate {
    /// Parses a DER-encoded certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertificateInner::from_der(der)
            .map_err(|e| BundleError::ParsingError(format!("certificate: {e}")))?;
        Self::from_inner(inner)
    }

    /// Wraps an already decoded certificate, reading the extensions the engine uses.
    pub fn from_inner(inner: CertificateInner) -> Result<Self> {
        let tbs = &inner.tbs_certificate;
        let extensions = tbs.extensions.as_deref();
        let invalid = |e: BundleError| BundleError::ParsingError(format!("certificate extension: {e}"));

        let is_ca = find_extension::<BasicConstraints>(extensions)
            .map_err(invalid)?
            .is_some_and(|bc| bc.is_ca);
        let subject_key_id = find_extension::<SubjectKeyIdentifier>(extensions)
            .map_err(invalid)?
            .map(|ski| ski.0)
            .unwrap_or_default();
        let authority_key_id = find_extension::<AuthorityKeyIdentifier>(extensions)
            .map_err(invalid)?
            .map(|aki| aki.key_identifier)
            .unwrap_or_default();
        let dns_names = find_extension::<SubjectAltName>(extensions)
            .map_err(invalid)?
            .map(|san| san.names)
            .unwrap_or_default();
        let subject = DistinguishedName::from_x509_name(&tbs.subject);

        Ok(Self {
            inner,
            subject,
            is_ca,
            subject_key_id,
            authority_key_id,
            dns_names,
        })
    }

    /// The serial number's big-endian magnitude with DER padding removed.
    pub fn serial_number_bytes(&self) -> Vec<u8> {
        let bytes = self.inner.tbs_certificate.serial_number.as_bytes();
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        bytes[start..].to_vec()
    }

    pub fn serial_number(&self) -> BigUint {
        BigUint::from_bytes_be(&self.serial_number_bytes())
    }

    /// The serial number in colon-hex form, e.g. `d3:ad:b3:3f`.
    pub fn serial_number_hex(&self) -> String {
        hex_formatted(&self.serial_number_bytes(), ":")
    }

    pub fn common_name(&self) -> &str {
        &self.subject.common_name
    }

    /// Whether the basic constraints extension marks this certificate as a CA.
    pub fn is_ca(&self) -> bool {
        self.is_ca
    }

    /// Subject key identifier, empty when the extension is absent.
    pub fn subject_key_id(&self) -> &[u8] {
        &self.subject_key_id
    }

    /// Authority key identifier, empty when the extension is absent.
    pub fn authority_key_id(&self) -> &[u8] {
        &self.authority_key_id
    }

    /// DNS names from the subject alternative name extension.
    pub fn dns_names(&self) -> &[String] {
        &self.dns_names
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_spki(&self.inner.tbs_certificate.subject_public_key_info)
    }
}

/// A certificate kept both as raw DER and decoded.
///
/// The bytes are what gets re-encoded to PEM or handed to a TLS stack; the
/// decoded form answers questions about key identifiers and the CA flag.
#[derive(Debug, Clone)]
pub struct CertBlock {
    pub bytes: Vec<u8>,
    pub certificate: Certificate,
}

impl CertBlock {
    pub fn from_der(bytes: Vec<u8>) -> Result<Self> {
        let certificate = Certificate::from_der(&bytes)?;
        Ok(Self { bytes, certificate })
    }

    /// Decodes the first PEM block of `pem_str` and parses it as a certificate.
    ///
    /// `what` names the bundle field in error messages.
    pub fn from_pem(pem_str: &str, what: &str) -> Result<Self> {
        let block = decode_block(pem_str, what)?;
        Self::from_der(block.into_contents())
            .map_err(|e| BundleError::ParsingError(format!("{what}: {e}")))
    }

    pub fn to_pem(&self) -> String {
        der_to_pem(&self.bytes, CERTIFICATE_LABEL)
    }
}
