use const_oid::db::rfc4519::{CN, C, L, O, OU, ST};
use der::{Tag, Tagged};
use der::asn1::{Ia5StringRef, PrintableStringRef, Utf8StringRef};
use x509_cert::attr::AttributeTypeAndValue;

/// Distinguished name attributes read from a certificate subject.
///
/// # Fields
/// * `common_name` - The common name (CN), empty when absent.
/// * `country` - The country (C).
/// * `state` - The state or province (ST).
/// * `locality` - The locality or city (L).
/// * `organization` - The organization (O).
/// * `organization_unit` - The organizational unit (OU).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub common_name: String,
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
    pub organization_unit: Option<String>,
}

impl DistinguishedName {
    /// Creates a `DistinguishedName` from an X.509 name.
    ///
    /// Attributes with string types other than UTF8, Printable or IA5 are
    /// ignored. When an attribute repeats, the last value wins.
    pub fn from_x509_name(x509dn: &x509_cert::name::DistinguishedName) -> Self {
        let mut dn = DistinguishedName::default();

        for rdn in x509dn.0.iter() {
            for attr in rdn.0.iter() {
                let Some(value) = attribute_string(attr) else {
                    continue;
                };
                match attr.oid {
                    CN => dn.common_name = value,
                    C => dn.country = Some(value),
                    ST => dn.state = Some(value),
                    L => dn.locality = Some(value),
                    O => dn.organization = Some(value),
                    OU => dn.organization_unit = Some(value),
                    _ => {}
                }
            }
        }

        dn
    }
}

fn attribute_string(attr: &AttributeTypeAndValue) -> Option<String> {
    let value = &attr.value;
    match value.tag() {
        Tag::Utf8String => value
            .decode_as::<Utf8StringRef<'_>>()
            .ok()
            .map(|s| s.as_str().to_string()),
        Tag::PrintableString => value
            .decode_as::<PrintableStringRef<'_>>()
            .ok()
            .map(|s| s.as_str().to_string()),
        Tag::Ia5String => value
            .decode_as::<Ia5StringRef<'_>>()
            .ok()
            .map(|s| s.as_str().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use der::Decode;
    use std::str::FromStr;
    use x509_cert::name::RdnSequence;

    #[test]
    fn test_common_name_from_certificate() {
        let der = crate::pem_utils::pem_to_der(include_str!("../../tests/data/root.pem")).unwrap();
        let cert = x509_cert::Certificate::from_der(&der).unwrap();
        let dn = DistinguishedName::from_x509_name(&cert.tbs_certificate.subject);
        assert_eq!(dn.common_name, "Example Root CA");
        assert_eq!(dn.organization, None);
    }

    #[test]
    fn test_all_attributes() {
        let name = RdnSequence::from_str("CN=svc,OU=Ops,O=Example,L=Berlin,ST=Berlin,C=DE").unwrap();
        let dn = DistinguishedName::from_x509_name(&name);
        assert_eq!(dn.common_name, "svc");
        assert_eq!(dn.organization_unit.as_deref(), Some("Ops"));
        assert_eq!(dn.organization.as_deref(), Some("Example"));
        assert_eq!(dn.locality.as_deref(), Some("Berlin"));
        assert_eq!(dn.state.as_deref(), Some("Berlin"));
        assert_eq!(dn.country.as_deref(), Some("DE"));
    }

    #[test]
    fn test_missing_common_name() {
        let name = RdnSequence::from_str("O=Example").unwrap();
        assert_eq!(DistinguishedName::from_x509_name(&name).common_name, "");
    }
}
