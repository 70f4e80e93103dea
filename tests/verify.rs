mod util;

use certbundle::bundle::CertBundle;
use certbundle::error::{BundleError, ErrorKind};

#[test]
fn matching_key_and_chain_verify() {
    util::parse(&util::ec_chain_bundle()).verify().unwrap();
}

/// A self-signed RSA certificate with its PKCS#1 key and no chain.
#[test]
fn self_signed_rsa_verifies() {
    let (parsed, normalized) = util::self_signed_rsa_bundle().to_parsed_cert_bundle().unwrap();
    assert_eq!(normalized.private_key_type.as_str(), "rsa");
    parsed.verify().unwrap();
}

#[test]
fn rsa_leaf_under_intermediate_verifies() {
    let bundle = CertBundle::builder()
        .certificate(util::LEAF_RSA)
        .private_key(util::LEAF_RSA_KEY)
        .issuing_ca(util::INTERMEDIATE)
        .build();
    util::parse(&bundle).verify().unwrap();
}

#[test]
fn unrelated_key_is_a_mismatch() {
    let cases = [
        // same algorithm, different key
        (util::LEAF_EC, util::ROOT_KEY),
        // different algorithm
        (util::LEAF_EC, util::LEAF_RSA_KEY),
        (util::SELF_SIGNED_RSA, util::LEAF_RSA_KEY),
    ];
    for (cert, key) in cases {
        let bundle = CertBundle::builder().certificate(cert).private_key(key).build();
        let err = util::parse(&bundle).verify().unwrap_err();
        assert!(matches!(err, BundleError::KeyMismatch), "{err}");
        assert_eq!(err.kind(), ErrorKind::User);
    }
}

#[test]
fn non_ca_intermediate_fails_at_index_one() {
    let bundle = CertBundle::builder()
        .certificate(util::LEAF_UNDER_NOT_CA)
        .ca_chain(vec![util::NOT_CA.to_string(), util::ROOT.to_string()])
        .build();
    let err = util::parse(&bundle).verify().unwrap_err();
    assert!(matches!(err, BundleError::NotCertificateAuthority { index: 1 }), "{err}");
    assert_eq!(
        err.to_string(),
        "certificate 1 of certificate chain is not a certificate authority"
    );
}

/// Same leaf and root as above, but the intermediate is a CA whose subject
/// key identifier is not the one the leaf names.
#[test]
fn ca_intermediate_with_wrong_key_id_fails_trust_path() {
    let bundle = CertBundle::builder()
        .certificate(util::LEAF_UNDER_NOT_CA)
        .ca_chain(vec![util::CA_WRONG_KEY_ID.to_string(), util::ROOT.to_string()])
        .build();
    let parsed = util::parse(&bundle);
    assert!(parsed.ca_chain[0].certificate.is_ca());

    let err = parsed.verify().unwrap_err();
    assert!(matches!(err, BundleError::TrustPath { index: 1, .. }), "{err}");
    assert_eq!(
        err.to_string(),
        "certificate 1 of certificate chain ca trust path is incorrect (leaf.example.com/Not A CA)"
    );
}

#[test]
fn wrong_issuer_is_a_trust_path_error() {
    let bundle = CertBundle::builder()
        .certificate(util::LEAF_EC)
        .private_key(util::LEAF_EC_KEY)
        .ca_chain(vec![util::ROOT.to_string()])
        .build();
    let err = util::parse(&bundle).verify().unwrap_err();
    assert!(matches!(err, BundleError::TrustPath { index: 1, .. }), "{err}");
    assert!(err.to_string().contains("(leaf.example.com/Example Root CA)"));
}

#[test]
fn chain_out_of_order_is_rejected() {
    let bundle = CertBundle::builder()
        .certificate(util::LEAF_EC)
        .ca_chain(vec![util::ROOT.to_string(), util::INTERMEDIATE.to_string()])
        .build();
    assert!(util::parse(&bundle).verify().is_err());
}

#[test]
fn self_referential_root_is_not_duplicated() {
    let bundle = CertBundle::builder()
        .certificate(util::ROOT)
        .private_key(util::ROOT_KEY)
        .ca_chain(vec![util::ROOT.to_string()])
        .build();
    let parsed = util::parse(&bundle);
    let path = parsed.certificate_path();
    assert_eq!(path.len(), parsed.ca_chain.len());
    assert_eq!(path[0].certificate.common_name(), "Example Root CA");
    parsed.verify().unwrap();
}

#[test]
fn only_first_chain_entry_is_deduplicated() {
    let bundle = CertBundle::builder()
        .certificate(util::LEAF_EC)
        .ca_chain(vec![
            util::INTERMEDIATE.to_string(),
            util::ROOT.to_string(),
            util::ROOT.to_string(),
        ])
        .build();
    let parsed = util::parse(&bundle);
    assert_eq!(parsed.certificate_path().len(), 4);
    // the root's key identifiers match themselves, so the repeat still links
    parsed.verify().unwrap();
}
