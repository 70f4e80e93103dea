pub mod classify;

use std::fmt;

use const_oid::ObjectIdentifier;
use const_oid::db::rfc5912::{
    ID_EC_PUBLIC_KEY, RSA_ENCRYPTION, SECP_256_R_1, SECP_384_R_1, SECP_521_R_1,
};
use der::Encode;
use ecdsa::signature::{SignatureEncoding, Signer as _};
use p256::ecdsa::{SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey};
use p384::ecdsa::{SigningKey as P384SigningKey, VerifyingKey as P384VerifyingKey};
use pkcs8::DecodePublicKey;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey as RsaSigningKey;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::debug;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

pub use classify::{DecodedKey, EcPrivateKey, classify_key_block};

use crate::error::{BundleError, Result};
use crate::pem_utils::{decode_block, der_to_pem};

/// Colloquial private key family, independent of how the key is wrapped.
///
/// Serialized as `"rsa"`, `"ec"` or the empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum KeyType {
    #[default]
    #[serde(rename = "")]
    Unknown,
    #[serde(rename = "rsa")]
    Rsa,
    #[serde(rename = "ec")]
    Ec,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Unknown => "",
            KeyType::Rsa => "rsa",
            KeyType::Ec => "ec",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The PEM/DER wrapping of a private key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyBlockFormat {
    /// `RSA PRIVATE KEY`
    Pkcs1Rsa,
    /// `PRIVATE KEY`
    Pkcs8,
    /// `EC PRIVATE KEY`
    EcSec1,
}

impl KeyBlockFormat {
    pub const PKCS1_LABEL: &'static str = "RSA PRIVATE KEY";
    pub const PKCS8_LABEL: &'static str = "PRIVATE KEY";
    pub const EC_LABEL: &'static str = "EC PRIVATE KEY";

    /// Returns the PEM label for this format.
    pub fn label(&self) -> &'static str {
        match self {
            KeyBlockFormat::Pkcs1Rsa => Self::PKCS1_LABEL,
            KeyBlockFormat::Pkcs8 => Self::PKCS8_LABEL,
            KeyBlockFormat::EcSec1 => Self::EC_LABEL,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            Self::PKCS1_LABEL => Some(KeyBlockFormat::Pkcs1Rsa),
            Self::PKCS8_LABEL => Some(KeyBlockFormat::Pkcs8),
            Self::EC_LABEL => Some(KeyBlockFormat::EcSec1),
            _ => None,
        }
    }

    /// The legacy format used for a key of `key_type` when no format was recorded.
    pub fn for_key_type(key_type: KeyType) -> Option<Self> {
        match key_type {
            KeyType::Rsa => Some(KeyBlockFormat::Pkcs1Rsa),
            KeyType::Ec => Some(KeyBlockFormat::EcSec1),
            KeyType::Unknown => None,
        }
    }
}

/// A private key handle able to expose its public key and sign data.
#[derive(Clone)]
pub enum Signer {
    Rsa {
        private: Box<RsaPrivateKey>,
        public: RsaPublicKey,
    },
    EcdsaP256 {
        signing_key: P256SigningKey,
        verifying_key: P256VerifyingKey,
    },
    EcdsaP384 {
        signing_key: P384SigningKey,
        verifying_key: P384VerifyingKey,
    },
    EcdsaP521 {
        secret_key: p521::SecretKey,
    },
}

impl Signer {
    /// Materializes a signer from raw key bytes in the given block format.
    ///
    /// Decode failures are reported as user errors since the bytes are
    /// caller-supplied.
    pub fn from_key_bytes(der: &[u8], format: KeyBlockFormat) -> Result<Self> {
        let decoded = match format {
            KeyBlockFormat::EcSec1 => DecodedKey::Ec(EcPrivateKey::from_sec1_der(der)?),
            KeyBlockFormat::Pkcs1Rsa => {
                let key = RsaPrivateKey::from_pkcs1_der(der).map_err(|e| {
                    BundleError::DecodingError(format!("RSA private key: {e}"))
                })?;
                DecodedKey::Rsa(Box::new(key))
            }
            KeyBlockFormat::Pkcs8 => DecodedKey::from_pkcs8_der(der)?,
        };
        Self::from_decoded(decoded)
    }

    /// Wraps a decoded key, rejecting algorithms other than RSA and EC.
    pub fn from_decoded(decoded: DecodedKey) -> Result<Self> {
        match decoded {
            DecodedKey::Rsa(private) => {
                let public = RsaPublicKey::from(private.as_ref());
                Ok(Signer::Rsa { private, public })
            }
            DecodedKey::Ec(EcPrivateKey::P256(secret)) => {
                let signing_key = P256SigningKey::from(secret);
                let verifying_key = *signing_key.verifying_key();
                Ok(Signer::EcdsaP256 {
                    signing_key,
                    verifying_key,
                })
            }
            DecodedKey::Ec(EcPrivateKey::P384(secret)) => {
                let signing_key = P384SigningKey::from(secret);
                let verifying_key = *signing_key.verifying_key();
                Ok(Signer::EcdsaP384 {
                    signing_key,
                    verifying_key,
                })
            }
            DecodedKey::Ec(EcPrivateKey::P521(secret_key)) => {
                Ok(Signer::EcdsaP521 { secret_key })
            }
            DecodedKey::Unsupported(name) => Err(BundleError::UnsupportedKeyType(format!(
                "found unknown private key type in pkcs#8 wrapping: {name}"
            ))),
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            Signer::Rsa { .. } => KeyType::Rsa,
            _ => KeyType::Ec,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            Signer::Rsa { public, .. } => PublicKey::Rsa(public.clone()),
            Signer::EcdsaP256 { verifying_key, .. } => {
                PublicKey::EcdsaP256(p256::PublicKey::from(verifying_key))
            }
            Signer::EcdsaP384 { verifying_key, .. } => {
                PublicKey::EcdsaP384(p384::PublicKey::from(verifying_key))
            }
            Signer::EcdsaP521 { secret_key } => PublicKey::EcdsaP521(secret_key.public_key()),
        }
    }

    /// Signs `data` with RSA PKCS#1 v1.5/SHA-256 or ECDSA with the curve's
    /// standard digest. ECDSA signatures are DER encoded.
    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Signer::Rsa { private, .. } => {
                let signing_key: RsaSigningKey<Sha256> = RsaSigningKey::new(*private.clone());
                Ok(signing_key.sign(data).to_vec())
            }
            Signer::EcdsaP256 { signing_key, .. } => {
                let signature: p256::ecdsa::Signature = signing_key.sign(data);
                Ok(signature.to_der().as_bytes().to_vec())
            }
            Signer::EcdsaP384 { signing_key, .. } => {
                let signature: p384::ecdsa::Signature = signing_key.sign(data);
                Ok(signature.to_der().as_bytes().to_vec())
            }
            Signer::EcdsaP521 { secret_key } => {
                let signing_key = p521::ecdsa::SigningKey::from_bytes(&secret_key.to_bytes())
                    .map_err(|e| BundleError::Internal(format!("P-521 signing key: {e}")))?;
                let signature: p521::ecdsa::Signature = signing_key.sign(data);
                Ok(signature.to_der().as_bytes().to_vec())
            }
        }
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let algorithm = match self {
            Signer::Rsa { .. } => "RSA",
            Signer::EcdsaP256 { .. } => "ECDSA P-256",
            Signer::EcdsaP384 { .. } => "ECDSA P-384",
            Signer::EcdsaP521 { .. } => "ECDSA P-521",
        };
        f.debug_struct("Signer").field("algorithm", &algorithm).finish_non_exhaustive()
    }
}

/// A public key of one of the supported algorithms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(p256::PublicKey),
    EcdsaP384(p384::PublicKey),
    EcdsaP521(p521::PublicKey),
}

impl PublicKey {
    /// Decodes the public key carried in a certificate or CSR.
    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        let der = spki.to_der()?;
        let unsupported = |what: String| BundleError::KeyComparison(format!("unsupported {what}"));
        let invalid = |e: pkcs8::spki::Error| BundleError::DecodingError(format!("public key: {e}"));

        match spki.algorithm.oid {
            RSA_ENCRYPTION => RsaPublicKey::from_public_key_der(&der)
                .map(PublicKey::Rsa)
                .map_err(invalid),
            ID_EC_PUBLIC_KEY => {
                let curve = spki
                    .algorithm
                    .parameters
                    .as_ref()
                    .and_then(|params| params.decode_as::<ObjectIdentifier>().ok());
                match curve {
                    Some(SECP_256_R_1) => p256::PublicKey::from_public_key_der(&der)
                        .map(PublicKey::EcdsaP256)
                        .map_err(invalid),
                    Some(SECP_384_R_1) => p384::PublicKey::from_public_key_der(&der)
                        .map(PublicKey::EcdsaP384)
                        .map_err(invalid),
                    Some(SECP_521_R_1) => p521::PublicKey::from_public_key_der(&der)
                        .map(PublicKey::EcdsaP521)
                        .map_err(invalid),
                    Some(other) => Err(unsupported(format!("EC curve {other}"))),
                    None => Err(unsupported("EC public key without named curve".to_string())),
                }
            }
            other => {
                let name = const_oid::db::DB.by_oid(&other).unwrap_or("unknown");
                Err(unsupported(format!("public key algorithm {name} ({other})")))
            }
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            PublicKey::Rsa(_) => KeyType::Rsa,
            _ => KeyType::Ec,
        }
    }
}

/// Anything that can receive a freshly parsed private key.
///
/// Implemented by both parsed bundle kinds so key loading is shared.
pub trait PrivateKeyContainer {
    fn set_parsed_private_key(
        &mut self,
        signer: Signer,
        key_type: KeyType,
        format: KeyBlockFormat,
        bytes: Vec<u8>,
    );
}

/// Decodes a PEM private key, infers its type and format, and stores the
/// resulting signer in `container`. Returns the inferred key type.
pub fn load_private_key<C: PrivateKeyContainer>(pem_str: &str, container: &mut C) -> Result<KeyType> {
    let block = decode_block(pem_str, "private key from bundle")?;
    let (key_type, format) = classify_key_block(block.tag(), block.contents())?;
    let signer = Signer::from_key_bytes(block.contents(), format)?;
    debug!(%key_type, ?format, "loaded private key");
    container.set_parsed_private_key(signer, key_type, format, block.into_contents());
    Ok(key_type)
}

/// PEM-encodes private key bytes.
///
/// The recorded format wins; a bundle built in memory without one gets the
/// legacy label for its key type. A key type that is neither RSA nor EC means
/// the parsed bundle is inconsistent.
pub fn encode_private_key(
    bytes: &[u8],
    format: Option<KeyBlockFormat>,
    key_type: KeyType,
) -> Result<String> {
    if key_type == KeyType::Unknown {
        return Err(BundleError::Internal(
            "could not determine private key type when creating block".to_string(),
        ));
    }
    let format = format
        .or_else(|| KeyBlockFormat::for_key_type(key_type))
        .ok_or_else(|| BundleError::Internal("missing private key format".to_string()))?;
    Ok(der_to_pem(bytes, format.label()))
}
