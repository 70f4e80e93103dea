//! String-encoded and parsed certificate bundles, and conversion between them.

use bon::Builder;
use rsa::BigUint;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cert::CertBlock;
use crate::error::Result;
use crate::key::{
    KeyBlockFormat, KeyType, PrivateKeyContainer, Signer, encode_private_key, load_private_key,
};

/// A certificate bundle in its storage/transport form: PEM text plus the
/// metadata callers use without looking at bytes.
///
/// `issuing_ca` is the legacy single-issuer field. When `ca_chain` is
/// non-empty it is ignored; otherwise it is treated as a one-element chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct CertBundle {
    #[builder(default)]
    pub private_key_type: KeyType,
    #[builder(default, into)]
    pub certificate: String,
    #[builder(default, into)]
    pub issuing_ca: String,
    #[builder(default)]
    pub ca_chain: Vec<String>,
    #[builder(default, into)]
    pub private_key: String,
    #[builder(default, into)]
    pub serial_number: String,
}

/// A certificate bundle in its working form: DER bytes, decoded certificates
/// and a materialized signer.
#[derive(Debug, Clone, Default)]
pub struct ParsedCertBundle {
    pub private_key_type: KeyType,
    /// `None` for bundles assembled in memory rather than parsed from PEM.
    pub private_key_format: Option<KeyBlockFormat>,
    pub private_key_bytes: Vec<u8>,
    pub private_key: Option<Signer>,
    pub certificate: Option<CertBlock>,
    pub ca_chain: Vec<CertBlock>,
    pub serial_number: Option<BigUint>,
}

impl CertBundle {
    /// Converts the string bundle to a parsed bundle.
    ///
    /// Returns the parsed bundle together with a normalized copy of `self`:
    /// the key type is set to the type inferred from the key, a missing serial
    /// number is filled in from the certificate, and a legacy `issuing_ca`
    /// is moved into `ca_chain` when the chain was empty. Absent fields are
    /// not an error; a present field that fails to decode is, and nothing is
    /// returned in that case.
    pub fn to_parsed_cert_bundle(&self) -> Result<(ParsedCertBundle, CertBundle)> {
        let mut parsed = ParsedCertBundle::default();
        let mut normalized = self.clone();

        if !self.private_key.is_empty() {
            let key_type = load_private_key(&self.private_key, &mut parsed)?;
            if self.private_key_type != KeyType::Unknown && self.private_key_type != key_type {
                warn!(
                    declared = %self.private_key_type,
                    inferred = %key_type,
                    "private key type tag disagrees with key contents; using inferred type"
                );
            }
            normalized.private_key_type = key_type;
        }

        if !self.certificate.is_empty() {
            let block = CertBlock::from_pem(&self.certificate, "certificate from cert bundle")?;
            parsed.serial_number = Some(block.certificate.serial_number());
            if self.serial_number.is_empty() {
                normalized.serial_number = block.certificate.serial_number_hex();
            }
            parsed.certificate = Some(block);
        }

        let chain = self.normalized_chain();
        parsed.ca_chain = chain
            .iter()
            .map(|pem| CertBlock::from_pem(pem, "ca certificate from cert bundle"))
            .collect::<Result<Vec<_>>>()?;
        normalized.ca_chain = chain.into_iter().map(str::to_string).collect();

        debug!(
            key_type = %parsed.private_key_type,
            format = ?parsed.private_key_format,
            has_certificate = parsed.certificate.is_some(),
            chain_len = parsed.ca_chain.len(),
            "parsed cert bundle"
        );
        Ok((parsed, normalized))
    }

    /// The CA chain with the legacy `issuing_ca` field folded in.
    fn normalized_chain(&self) -> Vec<&str> {
        if !self.ca_chain.is_empty() {
            self.ca_chain.iter().map(String::as_str).collect()
        } else if !self.issuing_ca.is_empty() {
            vec![self.issuing_ca.as_str()]
        } else {
            Vec::new()
        }
    }

    /// Joins the non-empty PEM fields into one blob in trust path order:
    /// private key, certificate, then the CA chain, separated by newlines.
    pub fn to_pem_bundle(&self) -> String {
        let mut result: Vec<&str> = Vec::new();

        if !self.private_key.is_empty() {
            result.push(&self.private_key);
        }
        if !self.certificate.is_empty() {
            result.push(&self.certificate);
        }
        result.extend(self.ca_chain.iter().map(String::as_str));

        result.join("\n")
    }
}

impl ParsedCertBundle {
    /// Converts the parsed bundle back to PEM text.
    ///
    /// The serial number is always recomputed from the certificate. Fails only
    /// when key bytes are present but the key type is unknown, which means the
    /// bundle was assembled inconsistently.
    pub fn to_cert_bundle(&self) -> Result<CertBundle> {
        let mut result = CertBundle::default();

        if let Some(block) = &self.certificate {
            result.serial_number = block.certificate.serial_number_hex();
            if !block.bytes.is_empty() {
                result.certificate = block.to_pem();
            }
        }

        result.ca_chain = self.ca_chain.iter().map(CertBlock::to_pem).collect();

        if !self.private_key_bytes.is_empty() {
            result.private_key = encode_private_key(
                &self.private_key_bytes,
                self.private_key_format,
                self.private_key_type,
            )?;
            result.private_key_type = self.private_key_type;
        }

        Ok(result)
    }
}

impl PrivateKeyContainer for ParsedCertBundle {
    fn set_parsed_private_key(
        &mut self,
        signer: Signer,
        key_type: KeyType,
        format: KeyBlockFormat,
        bytes: Vec<u8>,
    ) {
        self.private_key = Some(signer);
        self.private_key_type = key_type;
        self.private_key_format = Some(format);
        self.private_key_bytes = bytes;
    }
}
