use const_oid::AssociatedOid;
use der::{Decode, oid::ObjectIdentifier};
use x509_cert::ext::Extension;
use x509_cert::ext::pkix::name::GeneralName;

use crate::error::Result;

/// Trait for decoding the X.509 extensions the bundle engine inspects.
///
/// # Example
/// ```
/// use certbundle::cert::extensions::{BasicConstraints, FromX509Extension};
/// // BasicConstraints { cA TRUE }
/// let der = [0x30, 0x03, 0x01, 0x01, 0xff];
/// let bc = BasicConstraints::from_x509_extension_value(&der).unwrap();
/// assert!(bc.is_ca);
/// ```
pub trait FromX509Extension: Sized {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self>;
}

/// Finds and decodes the first extension of type `E`.
pub fn find_extension<E: FromX509Extension>(extensions: Option<&[Extension]>) -> Result<Option<E>> {
    extensions
        .unwrap_or_default()
        .iter()
        .find(|ext| ext.extn_id == E::OID)
        .map(|ext| E::from_x509_extension_value(ext.extn_value.as_bytes()))
        .transpose()
}

/// Represents the Subject Alternative Name (SAN) extension.
///
/// Only DNS names are kept; other general name forms are skipped.
#[derive(Debug, Clone, Default)]
pub struct SubjectAltName {
    pub names: Vec<String>,
}

impl FromX509Extension for SubjectAltName {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectAltName::OID;

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let san = x509_cert::ext::pkix::SubjectAltName::from_der(extension)?;
        let names = san
            .0
            .iter()
            .filter_map(|name| match name {
                GeneralName::DnsName(dns) => Some(dns.to_string()),
                _ => None,
            })
            .collect();
        Ok(Self { names })
    }
}

/// Represents the Basic Constraints extension. Only the CA flag is read.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicConstraints {
    pub is_ca: bool,
}

impl FromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes)?;
        Ok(Self { is_ca: bc.ca })
    }
}

/// Represents the Authority Key Identifier (AKI) extension.
///
/// `key_identifier` is empty when the extension names the issuer only by
/// name and serial number.
#[derive(Debug, Clone, Default)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: Vec<u8>,
}

impl FromX509Extension for AuthorityKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::AuthorityKeyIdentifier::OID;

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier::from_der(extension)?;

        Ok(Self {
            key_identifier: aki
                .key_identifier
                .map(|id| id.as_bytes().to_vec())
                .unwrap_or_default(),
        })
    }
}

/// Represents the Subject Key Identifier (SKI) extension.
#[derive(Debug, Clone, Default)]
pub struct SubjectKeyIdentifier(pub Vec<u8>);

impl FromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectKeyIdentifier::OID;

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self> {
        let ski = x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(extension)?;
        Ok(Self(ski.0.as_bytes().to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x509_cert::Certificate;

    fn extensions_of(pem: &str) -> Vec<Extension> {
        let der = crate::pem_utils::pem_to_der(pem).unwrap();
        let cert = Certificate::from_der(&der).unwrap();
        cert.tbs_certificate.extensions.unwrap_or_default()
    }

    #[test]
    fn test_basic_constraints_decoding() {
        let intermediate = extensions_of(include_str!("../../tests/data/intermediate.pem"));
        let bc: BasicConstraints = find_extension(Some(intermediate.as_slice())).unwrap().unwrap();
        assert!(bc.is_ca);

        let leaf = extensions_of(include_str!("../../tests/data/leaf_ec.pem"));
        let bc: BasicConstraints = find_extension(Some(leaf.as_slice())).unwrap().unwrap();
        assert!(!bc.is_ca);
    }

    #[test]
    fn test_key_identifiers_link_leaf_to_issuer() {
        let intermediate = extensions_of(include_str!("../../tests/data/intermediate.pem"));
        let leaf = extensions_of(include_str!("../../tests/data/leaf_ec.pem"));

        let ski: SubjectKeyIdentifier = find_extension(Some(intermediate.as_slice())).unwrap().unwrap();
        let aki: AuthorityKeyIdentifier = find_extension(Some(leaf.as_slice())).unwrap().unwrap();
        assert_eq!(ski.0.len(), 20);
        assert_eq!(aki.key_identifier, ski.0);
    }

    #[test]
    fn test_subject_alt_name_dns_names() {
        let leaf = extensions_of(include_str!("../../tests/data/leaf_ec.pem"));
        let san: SubjectAltName = find_extension(Some(leaf.as_slice())).unwrap().unwrap();
        assert_eq!(san.names, vec!["leaf.example.com", "www.example.com"]);
    }

    #[test]
    fn test_missing_extension() {
        let found: Option<SubjectAltName> = find_extension(None).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_malformed_extension_value() {
        assert!(BasicConstraints::from_x509_extension_value(&[0x04, 0x00]).is_err());
    }
}
