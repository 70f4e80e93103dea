//! Private-key block classification.
//!
//! A PEM label only says how a key is wrapped. PKCS#8 can hold RSA or EC
//! material, so the wrapped algorithm has to be read from the structure
//! itself; unlabelled blocks are identified by trial decoding.

use const_oid::ObjectIdentifier;
use const_oid::db::rfc5912::{
    ID_EC_PUBLIC_KEY, RSA_ENCRYPTION, SECP_256_R_1, SECP_384_R_1, SECP_521_R_1,
};
use pkcs8::{DecodePrivateKey, PrivateKeyInfo};
use rsa::RsaPrivateKey;
use rsa::pkcs1::DecodeRsaPrivateKey;

use super::{KeyBlockFormat, KeyType};
use crate::error::{BundleError, Result};

/// An elliptic-curve private key on one of the supported NIST curves.
#[derive(Clone)]
pub enum EcPrivateKey {
    P256(p256::SecretKey),
    P384(p384::SecretKey),
    P521(p521::SecretKey),
}

impl EcPrivateKey {
    /// Decodes a SEC1 `ECPrivateKey` structure.
    ///
    /// The curve is taken from the embedded parameters when present and
    /// otherwise from the scalar length.
    pub fn from_sec1_der(der: &[u8]) -> Result<Self> {
        if let Ok(key) = p256::SecretKey::from_sec1_der(der) {
            return Ok(EcPrivateKey::P256(key));
        }
        if let Ok(key) = p384::SecretKey::from_sec1_der(der) {
            return Ok(EcPrivateKey::P384(key));
        }
        p521::SecretKey::from_sec1_der(der)
            .map(EcPrivateKey::P521)
            .map_err(|e| {
                BundleError::DecodingError(format!("EC private key: {e}"))
            })
    }

    fn from_pkcs8_der(der: &[u8], curve: ObjectIdentifier) -> Result<Self> {
        let decoded = match curve {
            SECP_256_R_1 => p256::SecretKey::from_pkcs8_der(der).map(EcPrivateKey::P256),
            SECP_384_R_1 => p384::SecretKey::from_pkcs8_der(der).map(EcPrivateKey::P384),
            SECP_521_R_1 => p521::SecretKey::from_pkcs8_der(der).map(EcPrivateKey::P521),
            other => {
                return Err(BundleError::UnsupportedKeyType(format!(
                    "EC curve {} in pkcs#8 wrapping",
                    oid_name(&other)
                )));
            }
        };
        decoded.map_err(|e| BundleError::DecodingError(format!("pkcs#8 EC key: {e}")))
    }

    /// Returns the curve name as used in certificate tooling.
    pub fn curve_name(&self) -> &'static str {
        match self {
            EcPrivateKey::P256(_) => "P-256",
            EcPrivateKey::P384(_) => "P-384",
            EcPrivateKey::P521(_) => "P-521",
        }
    }
}

/// The result of structurally decoding a key of unknown algorithm.
pub enum DecodedKey {
    Rsa(Box<RsaPrivateKey>),
    Ec(EcPrivateKey),
    /// Any other algorithm, carrying its registered name or dotted OID.
    Unsupported(String),
}

impl DecodedKey {
    /// Decodes a PKCS#8 `PrivateKeyInfo` and the key it wraps.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let info = PrivateKeyInfo::try_from(der)
            .map_err(|e| BundleError::DecodingError(format!("pkcs#8 key: {e}")))?;

        match info.algorithm.oid {
            RSA_ENCRYPTION => RsaPrivateKey::from_pkcs8_der(der)
                .map(|key| DecodedKey::Rsa(Box::new(key)))
                .map_err(|e| BundleError::DecodingError(format!("pkcs#8 RSA key: {e}"))),
            ID_EC_PUBLIC_KEY => {
                let curve = info.algorithm.parameters_oid().map_err(|e| {
                    BundleError::DecodingError(format!("pkcs#8 EC key parameters: {e}"))
                })?;
                EcPrivateKey::from_pkcs8_der(der, curve).map(DecodedKey::Ec)
            }
            other => Ok(DecodedKey::Unsupported(oid_name(&other))),
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            DecodedKey::Rsa(_) => KeyType::Rsa,
            DecodedKey::Ec(_) => KeyType::Ec,
            DecodedKey::Unsupported(_) => KeyType::Unknown,
        }
    }
}

/// Determines the key type and block format of a decoded PEM private key.
///
/// `label` is the PEM block type. An empty label falls back to trial decoding:
/// SEC1 EC first, then PKCS#1 RSA.
pub fn classify_key_block(label: &str, der: &[u8]) -> Result<(KeyType, KeyBlockFormat)> {
    let label = label.trim();
    if label.is_empty() {
        return classify_untagged(der);
    }

    match KeyBlockFormat::from_label(label) {
        Some(KeyBlockFormat::EcSec1) => Ok((KeyType::Ec, KeyBlockFormat::EcSec1)),
        Some(KeyBlockFormat::Pkcs1Rsa) => Ok((KeyType::Rsa, KeyBlockFormat::Pkcs1Rsa)),
        Some(KeyBlockFormat::Pkcs8) => match DecodedKey::from_pkcs8_der(der)? {
            DecodedKey::Unsupported(name) => Err(BundleError::UnsupportedKeyType(format!(
                "found unknown private key type in pkcs#8 wrapping: {name}"
            ))),
            decoded => Ok((decoded.key_type(), KeyBlockFormat::Pkcs8)),
        },
        None => Err(BundleError::UnsupportedKeyType(format!(
            "unsupported key block type: {label}"
        ))),
    }
}

fn classify_untagged(der: &[u8]) -> Result<(KeyType, KeyBlockFormat)> {
    if EcPrivateKey::from_sec1_der(der).is_ok() {
        return Ok((KeyType::Ec, KeyBlockFormat::EcSec1));
    }
    if RsaPrivateKey::from_pkcs1_der(der).is_ok() {
        return Ok((KeyType::Rsa, KeyBlockFormat::Pkcs1Rsa));
    }
    Err(BundleError::UnsupportedKeyType(
        "unable to determine type of private key; only RSA and EC are supported".to_string(),
    ))
}

fn oid_name(oid: &ObjectIdentifier) -> String {
    const_oid::db::DB
        .by_oid(oid)
        .map(str::to_string)
        .unwrap_or_else(|| oid.to_string())
}
