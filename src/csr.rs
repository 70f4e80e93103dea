//! Certificate signing request bundles.
//!
//! These carry a private key and a CSR and follow the same key handling as
//! certificate bundles. There is no chain and no serial number.

use bon::Builder;
use der::Decode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use x509_cert::request::CertReq;

use crate::cert::name::DistinguishedName;
use crate::error::{BundleError, Result};
use crate::key::{
    KeyBlockFormat, KeyType, PrivateKeyContainer, PublicKey, Signer, encode_private_key,
    load_private_key,
};
use crate::pem_utils::{CERTIFICATE_REQUEST_LABEL, decode_block, der_to_pem};

/// A CSR bundle in its storage/transport form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct CsrBundle {
    #[builder(default)]
    pub private_key_type: KeyType,
    #[builder(default, into)]
    pub csr: String,
    #[builder(default, into)]
    pub private_key: String,
}

/// A CSR bundle in its working form.
#[derive(Debug, Clone, Default)]
pub struct ParsedCsrBundle {
    pub private_key_type: KeyType,
    pub private_key_format: Option<KeyBlockFormat>,
    pub private_key_bytes: Vec<u8>,
    pub private_key: Option<Signer>,
    pub csr_bytes: Vec<u8>,
    pub csr: Option<CertReq>,
}

impl CsrBundle {
    /// Converts the string bundle to a parsed bundle.
    ///
    /// Like [`CertBundle::to_parsed_cert_bundle`](crate::bundle::CertBundle::to_parsed_cert_bundle),
    /// the second value is a copy of `self` carrying the inferred key type.
    pub fn to_parsed_csr_bundle(&self) -> Result<(ParsedCsrBundle, CsrBundle)> {
        let mut parsed = ParsedCsrBundle::default();
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

        if !self.csr.is_empty() {
            let block = decode_block(&self.csr, "certificate request from csr bundle")?;
            let csr = CertReq::from_der(block.contents()).map_err(|e| {
                BundleError::ParsingError(format!("certificate request from csr bundle: {e}"))
            })?;
            parsed.csr = Some(csr);
            parsed.csr_bytes = block.into_contents();
        }

        debug!(
            key_type = %parsed.private_key_type,
            format = ?parsed.private_key_format,
            has_csr = parsed.csr.is_some(),
            "parsed csr bundle"
        );
        Ok((parsed, normalized))
    }
}

impl ParsedCsrBundle {
    /// Converts the parsed bundle back to PEM text.
    pub fn to_csr_bundle(&self) -> Result<CsrBundle> {
        let mut result = CsrBundle::default();

        if !self.csr_bytes.is_empty() {
            result.csr = der_to_pem(&self.csr_bytes, CERTIFICATE_REQUEST_LABEL);
        }

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

    /// Subject of the request, if one was parsed.
    pub fn subject(&self) -> Option<DistinguishedName> {
        self.csr
            .as_ref()
            .map(|csr| DistinguishedName::from_x509_name(&csr.info.subject))
    }

    /// Checks that the private key belongs to the request's public key.
    ///
    /// Passes trivially unless both are present.
    pub fn verify(&self) -> Result<()> {
        let (Some(signer), Some(csr)) = (&self.private_key, &self.csr) else {
            return Ok(());
        };
        let csr_key = PublicKey::from_spki(&csr.info.public_key)?;
        if csr_key != signer.public_key() {
            return Err(BundleError::KeyMismatch);
        }
        Ok(())
    }
}

impl PrivateKeyContainer for ParsedCsrBundle {
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
