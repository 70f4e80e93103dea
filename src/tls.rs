//! Building TLS configurations from parsed bundles.
//!
//! [`ParsedCertBundle::tls_config`] collects the certificate chain, private
//! key and trust pools into a [`TlsConfig`]. The `rustls` configs are produced
//! on demand by [`TlsConfig::server_config`] and [`TlsConfig::client_config`].

use std::collections::BTreeMap;
use std::sync::Arc;

use rustls::crypto::CryptoProvider;
use rustls::pki_types::{
    CertificateDer, PrivateKeyDer, PrivatePkcs1KeyDer, PrivatePkcs8KeyDer, PrivateSec1KeyDer,
};
use rustls::server::WebPkiClientVerifier;
use rustls::{
    ClientConfig, ProtocolVersion, RootCertStore, ServerConfig, SupportedProtocolVersion,
};
use tracing::debug;

use crate::bundle::ParsedCertBundle;
use crate::error::{BundleError, Result};
use crate::key::KeyBlockFormat;
use crate::pem_utils::{CERTIFICATE_LABEL, der_to_pem};

static TLS13_ONLY: &[&SupportedProtocolVersion] = &[&rustls::version::TLS13];

/// Which side(s) of a connection a configuration is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsUsage {
    Server,
    Client,
    Both,
}

impl TlsUsage {
    pub fn includes_server(&self) -> bool {
        matches!(self, TlsUsage::Server | TlsUsage::Both)
    }

    pub fn includes_client(&self) -> bool {
        matches!(self, TlsUsage::Client | TlsUsage::Both)
    }
}

/// How a server treats client certificates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClientAuth {
    /// Never ask for a client certificate.
    NoClientCert,
    /// Ask for a certificate and verify it against the client CA pool if one
    /// is sent, but accept clients that send none.
    #[default]
    VerifyClientCertIfGiven,
    RequireAndVerifyClientCert,
}

/// A certificate chain with its private key, leaf first.
#[derive(Debug)]
pub struct TlsCertificate {
    pub chain: Vec<CertificateDer<'static>>,
    pub private_key: Option<PrivateKeyDer<'static>>,
}

/// TLS settings derived from a bundle.
///
/// `client_cas` is set for server usage and `root_cas` for client usage;
/// with [`TlsUsage::Both`] they share one pool.
#[derive(Debug)]
pub struct TlsConfig {
    /// Lowest protocol version negotiated. Only TLS 1.2 and 1.3 are accepted.
    pub min_version: ProtocolVersion,
    pub certificates: Vec<TlsCertificate>,
    pub client_auth: ClientAuth,
    pub client_cas: Option<Arc<RootCertStore>>,
    pub root_cas: Option<Arc<RootCertStore>>,
    /// Maps the leaf's common name and DNS names to an index into `certificates`.
    pub name_to_certificate: BTreeMap<String, usize>,
    pub provider: Arc<CryptoProvider>,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            min_version: ProtocolVersion::TLSv1_2,
            certificates: Vec::new(),
            client_auth: ClientAuth::default(),
            client_cas: None,
            root_cas: None,
            name_to_certificate: BTreeMap::new(),
            provider: Arc::new(rustls::crypto::ring::default_provider()),
        }
    }
}

impl ParsedCertBundle {
    /// Builds a TLS configuration for `usage`.
    ///
    /// The certificate, the CA chain and the private key become the presented
    /// certificate; a key without any certificate is left out. The first chain
    /// entry, the immediate issuer, seeds the trust pool: as the client CA pool
    /// for server usage and as the root pool for client usage.
    ///
    /// A key that does not belong to the certificate is rejected with
    /// [`BundleError::KeyMismatch`].
    pub fn tls_config(&self, usage: TlsUsage) -> Result<TlsConfig> {
        self.verify_private_key()?;

        let mut config = TlsConfig::default();
        let mut chain: Vec<CertificateDer<'static>> = Vec::new();

        if let Some(block) = &self.certificate {
            chain.push(CertificateDer::from(block.bytes.clone()));
        }

        let pool = match self.ca_chain.first() {
            Some(issuer) => {
                chain.extend(
                    self.ca_chain
                        .iter()
                        .map(|block| CertificateDer::from(block.bytes.clone())),
                );
                Some(Arc::new(trust_pool(&issuer.bytes)?))
            }
            None => None,
        };

        let private_key = self.tls_private_key()?;

        if usage.includes_server() {
            config.client_cas = pool.clone();
        }
        if usage.includes_client() {
            config.root_cas = pool;
        }

        if !chain.is_empty() {
            config.certificates.push(TlsCertificate { chain, private_key });
            config.build_name_to_certificate(self);
        }

        debug!(
            ?usage,
            certificates = config.certificates.len(),
            has_pool = config.client_cas.is_some() || config.root_cas.is_some(),
            "built tls config"
        );
        Ok(config)
    }

    fn tls_private_key(&self) -> Result<Option<PrivateKeyDer<'static>>> {
        if self.private_key_bytes.is_empty() {
            return Ok(None);
        }
        let format = self
            .private_key_format
            .or_else(|| KeyBlockFormat::for_key_type(self.private_key_type))
            .ok_or_else(|| {
                BundleError::Internal("could not determine private key format".to_string())
            })?;
        let bytes = self.private_key_bytes.clone();
        Ok(Some(match format {
            KeyBlockFormat::Pkcs1Rsa => PrivateKeyDer::from(PrivatePkcs1KeyDer::from(bytes)),
            KeyBlockFormat::Pkcs8 => PrivateKeyDer::from(PrivatePkcs8KeyDer::from(bytes)),
            KeyBlockFormat::EcSec1 => PrivateKeyDer::from(PrivateSec1KeyDer::from(bytes)),
        }))
    }
}

/// A key swapped into a config by hand is caller data, not an engine fault.
fn certified_key_error(err: rustls::Error) -> BundleError {
    match err {
        rustls::Error::InconsistentKeys(rustls::InconsistentKeys::KeyMismatch) => {
            BundleError::KeyMismatch
        }
        other => BundleError::Tls(other),
    }
}

/// Loads a single CA certificate into a fresh pool via its PEM encoding.
fn trust_pool(der: &[u8]) -> Result<RootCertStore> {
    let pem = der_to_pem(der, CERTIFICATE_LABEL);
    let mut pool = RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut pem.as_bytes()) {
        let cert = cert.map_err(|e| {
            BundleError::Internal(format!("could not read CA certificate PEM: {e}"))
        })?;
        pool.add(cert).map_err(|e| {
            BundleError::Internal(format!("could not add CA certificate to pool: {e}"))
        })?;
    }
    if pool.is_empty() {
        return Err(BundleError::Internal(
            "could not append CA certificate to pool".to_string(),
        ));
    }
    Ok(pool)
}

impl TlsConfig {
    fn build_name_to_certificate(&mut self, bundle: &ParsedCertBundle) {
        self.name_to_certificate.clear();
        let Some(block) = &bundle.certificate else {
            return;
        };
        let leaf = &block.certificate;
        if !leaf.common_name().is_empty() {
            self.name_to_certificate.insert(leaf.common_name().to_string(), 0);
        }
        for name in leaf.dns_names() {
            self.name_to_certificate.insert(name.clone(), 0);
        }
    }

    fn protocol_versions(&self) -> Result<&'static [&'static SupportedProtocolVersion]> {
        match self.min_version {
            ProtocolVersion::TLSv1_2 => Ok(rustls::ALL_VERSIONS),
            ProtocolVersion::TLSv1_3 => Ok(TLS13_ONLY),
            other => Err(BundleError::InvalidInput(format!(
                "unsupported minimum protocol version {other:?}"
            ))),
        }
    }

    /// Produces a server configuration presenting the first certificate.
    ///
    /// Client certificates are checked against `client_cas` according to
    /// `client_auth`. Without a client CA pool, client certificates are not
    /// requested unless they are required, which is an error.
    pub fn server_config(&self) -> Result<ServerConfig> {
        let builder = ServerConfig::builder_with_provider(self.provider.clone())
            .with_protocol_versions(self.protocol_versions()?)?;

        let builder = match (&self.client_cas, self.client_auth) {
            (_, ClientAuth::NoClientCert) | (None, ClientAuth::VerifyClientCertIfGiven) => {
                builder.with_no_client_auth()
            }
            (None, ClientAuth::RequireAndVerifyClientCert) => {
                return Err(BundleError::InvalidInput(
                    "client certificates are required but no client CA pool is configured"
                        .to_string(),
                ));
            }
            (Some(roots), policy) => {
                let verifier = WebPkiClientVerifier::builder_with_provider(
                    roots.clone(),
                    self.provider.clone(),
                );
                let verifier = if policy == ClientAuth::VerifyClientCertIfGiven {
                    verifier.allow_unauthenticated()
                } else {
                    verifier
                };
                let verifier = verifier.build().map_err(|e| {
                    BundleError::Internal(format!("could not build client verifier: {e}"))
                })?;
                builder.with_client_cert_verifier(verifier)
            }
        };

        let (chain, key) = self.certified_key().ok_or_else(|| {
            BundleError::InvalidInput(
                "a server configuration needs a certificate and private key".to_string(),
            )
        })?;
        builder.with_single_cert(chain, key).map_err(certified_key_error)
    }

    /// Produces a client configuration trusting `root_cas`.
    ///
    /// Without a root pool no server certificate is trusted. The first
    /// certificate is presented for client authentication when it has a key.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let roots = self
            .root_cas
            .clone()
            .unwrap_or_else(|| Arc::new(RootCertStore::empty()));
        let builder = ClientConfig::builder_with_provider(self.provider.clone())
            .with_protocol_versions(self.protocol_versions()?)?
            .with_root_certificates(roots);

        match self.certified_key() {
            Some((chain, key)) => builder
                .with_client_auth_cert(chain, key)
                .map_err(certified_key_error),
            None => Ok(builder.with_no_client_auth()),
        }
    }

    fn certified_key(&self) -> Option<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
        let cert = self.certificates.first()?;
        let key = cert.private_key.as_ref()?;
        if cert.chain.is_empty() {
            return None;
        }
        Some((cert.chain.clone(), key.clone_key()))
    }
}
