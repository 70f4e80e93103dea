#![allow(dead_code)]

use certbundle::bundle::{CertBundle, ParsedCertBundle};

pub const ROOT: &str = include_str!("data/root.pem");
pub const ROOT_KEY: &str = include_str!("data/root_ec.key");
pub const INTERMEDIATE: &str = include_str!("data/intermediate.pem");
pub const INTERMEDIATE_KEY: &str = include_str!("data/intermediate_pkcs8.key");
pub const LEAF_EC: &str = include_str!("data/leaf_ec.pem");
pub const LEAF_EC_KEY: &str = include_str!("data/leaf_ec_pkcs8.key");
pub const LEAF_RSA: &str = include_str!("data/leaf_rsa.pem");
pub const LEAF_RSA_KEY: &str = include_str!("data/leaf_rsa_pkcs8.key");
pub const NOT_CA: &str = include_str!("data/notca_intermediate.pem");
pub const LEAF_UNDER_NOT_CA: &str = include_str!("data/leaf_under_notca.pem");
pub const SELF_SIGNED_RSA: &str = include_str!("data/rsa_self_signed.pem");
pub const SELF_SIGNED_RSA_KEY: &str = include_str!("data/rsa_pkcs1.key");
pub const ED25519_KEY: &str = include_str!("data/ed25519_pkcs8.key");
pub const CSR_EC: &str = include_str!("data/csr_ec.pem");
pub const CSR_RSA: &str = include_str!("data/csr_rsa.pem");
pub const CA_WRONG_KEY_ID: &str = include_str!("data/ca_wrong_ski.pem");

/// Leaf, intermediate and root with the leaf's PKCS#8 EC key.
pub fn ec_chain_bundle() -> CertBundle {
    CertBundle::builder()
        .certificate(LEAF_EC)
        .private_key(LEAF_EC_KEY)
        .ca_chain(vec![INTERMEDIATE.to_string(), ROOT.to_string()])
        .build()
}

pub fn self_signed_rsa_bundle() -> CertBundle {
    CertBundle::builder()
        .certificate(SELF_SIGNED_RSA)
        .private_key(SELF_SIGNED_RSA_KEY)
        .build()
}

pub fn parse(bundle: &CertBundle) -> ParsedCertBundle {
    bundle.to_parsed_cert_bundle().unwrap().0
}

/// Removes the PEM label, leaving `-----BEGIN -----` / `-----END -----`.
pub fn untagged(pem: &str, label: &str) -> String {
    pem.replace(&format!("BEGIN {label}-----"), "BEGIN -----")
        .replace(&format!("END {label}-----"), "END -----")
}
