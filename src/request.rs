//! Request and response shapes exchanged with an issuance service.

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::bundle::CertBundle;
use crate::csr::CsrBundle;
use crate::error::{BundleError, Result};

/// A response envelope whose `data` object holds a bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Secret {
    pub fn cert_bundle(&self) -> Result<CertBundle> {
        self.decode_data()
    }

    pub fn csr_bundle(&self) -> Result<CsrBundle> {
        self.decode_data()
    }

    fn decode_data<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        if self.data.is_empty() {
            return Err(BundleError::InvalidInput("secret has no data".to_string()));
        }
        Ok(serde_json::from_value(Value::Object(self.data.clone()))?)
    }
}

/// Parameters of a certificate issue request.
///
/// Alternative names and IP SANs are comma-separated lists, as the service
/// expects them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct IssueData {
    #[builder(default, into)]
    pub ttl: String,
    #[builder(default, into)]
    pub common_name: String,
    #[builder(default, into)]
    pub alt_names: String,
    #[builder(default, into)]
    pub ip_sans: String,
    /// PEM-encoded CSR to sign instead of generating a key.
    #[builder(default, into)]
    pub csr: String,
}

impl IssueData {
    pub fn alt_name_list(&self) -> Vec<&str> {
        split_list(&self.alt_names)
    }

    pub fn ip_san_list(&self) -> Vec<&str> {
        split_list(&self.ip_sans)
    }

    /// The caller-supplied CSR as a bundle without a private key.
    pub fn csr_bundle(&self) -> Option<CsrBundle> {
        if self.csr.is_empty() {
            return None;
        }
        Some(CsrBundle::builder().csr(self.csr.clone()).build())
    }
}

fn split_list(list: &str) -> Vec<&str> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyType;

    #[test]
    fn test_secret_cert_bundle() {
        let secret: Secret = serde_json::from_str(
            r#"{"data":{"certificate":"CERT","private_key_type":"rsa","serial_number":"0a:bc"}}"#,
        )
        .unwrap();
        let bundle = secret.cert_bundle().unwrap();
        assert_eq!(bundle.certificate, "CERT");
        assert_eq!(bundle.private_key_type, KeyType::Rsa);
        assert!(bundle.ca_chain.is_empty());
    }

    #[test]
    fn test_secret_csr_bundle() {
        let secret: Secret = serde_json::from_str(r#"{"data":{"csr":"CSR"}}"#).unwrap();
        assert_eq!(secret.csr_bundle().unwrap().csr, "CSR");
    }

    #[test]
    fn test_secret_errors() {
        let err = Secret::default().cert_bundle().unwrap_err();
        assert!(matches!(err, BundleError::InvalidInput(_)));

        let secret: Secret = serde_json::from_str(r#"{"data":{"ca_chain":"not a list"}}"#).unwrap();
        let err = secret.cert_bundle().unwrap_err();
        assert!(matches!(err, BundleError::Json(_)));
        assert!(err.is_user_error());
    }

    #[test]
    fn test_issue_data() {
        let data = IssueData::builder()
            .common_name("svc.example.com")
            .alt_names("a.example.com, b.example.com,")
            .ip_sans("10.0.0.1")
            .ttl("72h")
            .build();
        assert_eq!(data.alt_name_list(), vec!["a.example.com", "b.example.com"]);
        assert_eq!(data.ip_san_list(), vec!["10.0.0.1"]);
        assert!(data.csr_bundle().is_none());

        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value["common_name"], "svc.example.com");
        assert_eq!(value["ttl"], "72h");
        assert_eq!(value["csr"], "");
    }
}
