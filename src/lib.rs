//! # certbundle - Certificate and Key Bundles in Pure Rust
//!
//! certbundle converts certificate material between three forms and checks it
//! along the way:
//!
//! - a **string bundle** ([`bundle::CertBundle`]): PEM text for storage and transport,
//! - a **parsed bundle** ([`bundle::ParsedCertBundle`]): DER bytes, decoded
//!   certificates and a ready-to-use signer,
//! - a **TLS configuration** ([`tls::TlsConfig`]) that yields `rustls` server
//!   and client configs.
//!
//! Decoding and key handling are built on the RustCrypto crates.
//!
//! ## Supported Key Types
//!
//! - **RSA**: `RSA PRIVATE KEY` (PKCS#1) or `PRIVATE KEY` (PKCS#8)
//! - **ECDSA**: P-256, P-384 and P-521, as `EC PRIVATE KEY` (SEC1) or PKCS#8
//!
//! Any other algorithm wrapped in PKCS#8, such as Ed25519, is rejected.
//!
//! ## Quick Start
//!
//! ### Parsing and Verifying a Bundle
//!
//! ```rust,no_run
//! use certbundle::bundle::CertBundle;
//!
//! # fn main() -> Result<(), certbundle::error::BundleError> {
//! let bundle = CertBundle::builder()
//!     .certificate(std::fs::read_to_string("leaf.pem").unwrap())
//!     .private_key(std::fs::read_to_string("leaf.key").unwrap())
//!     .ca_chain(vec![std::fs::read_to_string("issuer.pem").unwrap()])
//!     .build();
//!
//! // `normalized` carries the inferred key type and the serial number.
//! let (parsed, normalized) = bundle.to_parsed_cert_bundle()?;
//! parsed.verify()?;
//!
//! println!("{} key, serial {}", normalized.private_key_type, normalized.serial_number);
//! # Ok(())
//! # }
//! ```
//!
//! ### Building a TLS Server Configuration
//!
//! ```rust,no_run
//! use certbundle::{bundle::CertBundle, tls::TlsUsage};
//!
//! # fn main() -> Result<(), certbundle::error::BundleError> {
//! # let bundle = CertBundle::default();
//! let (parsed, _) = bundle.to_parsed_cert_bundle()?;
//! let tls = parsed.tls_config(TlsUsage::Server)?;
//! let server_config = tls.server_config()?;
//! # let _ = server_config;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every error is either caused by caller-supplied data or an internal fault:
//!
//! ```rust
//! use certbundle::{bundle::CertBundle, error::{BundleError, ErrorKind}};
//!
//! let bundle = CertBundle::builder().certificate("invalid pem data").build();
//! match bundle.to_parsed_cert_bundle() {
//!     Ok(_) => println!("Bundle parsed"),
//!     Err(e @ BundleError::DecodingError(_)) => assert_eq!(e.kind(), ErrorKind::User),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`bundle`]: String and parsed certificate bundles
//! - [`chain`]: Key matching and trust path checks
//! - [`csr`]: Certificate signing request bundles
//! - [`tls`]: TLS configuration building
//! - [`key`]: Key format classification, signers and public keys
//! - [`cert`]: Decoded certificates and the extensions the engine reads
//! - [`request`]: Issue request parameters and response envelopes
//! - [`error`]: Error types

pub mod bundle;
pub mod cert;
pub mod chain;
pub mod csr;
pub mod error;
pub mod key;
pub mod pem_utils;
pub mod request;
pub mod tls;
