//! Key/certificate matching and trust path checks for parsed bundles.

use tracing::{debug, trace};

use crate::bundle::ParsedCertBundle;
use crate::cert::CertBlock;
use crate::error::{BundleError, Result};

impl ParsedCertBundle {
    /// The leaf certificate followed by the CA chain.
    ///
    /// When the first chain entry has the leaf's serial number it is taken to
    /// be the leaf itself (a self-signed root listed twice) and is skipped.
    /// Later entries are never deduplicated.
    pub fn certificate_path(&self) -> Vec<&CertBlock> {
        let Some(leaf) = &self.certificate else {
            return self.ca_chain.iter().collect();
        };

        let mut path = vec![leaf];
        let rest = match self.ca_chain.first() {
            Some(first)
                if first.certificate.serial_number_bytes()
                    == leaf.certificate.serial_number_bytes() =>
            {
                &self.ca_chain[1..]
            }
            _ => &self.ca_chain[..],
        };
        path.extend(rest);
        path
    }

    /// Checks that the private key belongs to the certificate and that every
    /// link of the trust path is signed for by a CA whose subject key
    /// identifier matches the child's authority key identifier.
    ///
    /// Returns the first failing check.
    pub fn verify(&self) -> Result<()> {
        self.verify_private_key()?;

        let path = self.certificate_path();
        debug!(path_len = path.len(), "verifying certificate path");

        for (i, pair) in path.windows(2).enumerate() {
            let (child, parent) = (&pair[0].certificate, &pair[1].certificate);
            trace!(
                index = i,
                subject = child.common_name(),
                issuer = parent.common_name(),
                "checking trust path link"
            );

            if !parent.is_ca() {
                return Err(BundleError::NotCertificateAuthority { index: i + 1 });
            }
            if parent.subject_key_id() != child.authority_key_id() {
                return Err(BundleError::TrustPath {
                    index: i + 1,
                    child: child.common_name().to_string(),
                    parent: parent.common_name().to_string(),
                });
            }
        }

        Ok(())
    }

    /// Checks that the private key belongs to the certificate. Passes when
    /// either is absent.
    pub fn verify_private_key(&self) -> Result<()> {
        let (Some(signer), Some(block)) = (&self.private_key, &self.certificate) else {
            return Ok(());
        };
        let cert_key = block.certificate.public_key().map_err(|e| match e {
            BundleError::KeyComparison(_) => e,
            other => BundleError::KeyComparison(other.to_string()),
        })?;
        if cert_key != signer.public_key() {
            return Err(BundleError::KeyMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::bundle::CertBundle;
    use crate::error::BundleError;

    const ROOT: &str = include_str!("../tests/data/root.pem");
    const INTERMEDIATE: &str = include_str!("../tests/data/intermediate.pem");
    const LEAF: &str = include_str!("../tests/data/leaf_ec.pem");
    const LEAF_KEY: &str = include_str!("../tests/data/leaf_ec_pkcs8.key");

    fn parse(bundle: CertBundle) -> crate::bundle::ParsedCertBundle {
        bundle.to_parsed_cert_bundle().unwrap().0
    }

    #[test]
    fn test_full_chain_verifies() {
        let parsed = parse(
            CertBundle::builder()
                .certificate(LEAF)
                .private_key(LEAF_KEY)
                .ca_chain(vec![INTERMEDIATE.to_string(), ROOT.to_string()])
                .build(),
        );
        assert_eq!(parsed.certificate_path().len(), 3);
        parsed.verify().unwrap();
    }

    #[test]
    fn test_single_certificate_trivially_passes() {
        let parsed = parse(CertBundle::builder().certificate(LEAF).build());
        assert_eq!(parsed.certificate_path().len(), 1);
        parsed.verify().unwrap();
    }

    #[test]
    fn test_path_without_leaf_is_chain() {
        let parsed = parse(
            CertBundle::builder()
                .ca_chain(vec![INTERMEDIATE.to_string(), ROOT.to_string()])
                .build(),
        );
        let path = parsed.certificate_path();
        assert_eq!(path.len(), 2);
        assert_eq!(path[0].certificate.common_name(), "Example Intermediate CA");
        parsed.verify().unwrap();
    }

    #[test]
    fn test_self_referential_first_entry_is_skipped() {
        let parsed = parse(
            CertBundle::builder()
                .certificate(ROOT)
                .ca_chain(vec![ROOT.to_string()])
                .build(),
        );
        assert_eq!(parsed.certificate_path().len(), 1);
        parsed.verify().unwrap();
    }

    #[test]
    fn test_trust_path_mismatch_names_both_certificates() {
        // the leaf was issued by the intermediate, not the root
        let parsed = parse(
            CertBundle::builder()
                .certificate(LEAF)
                .ca_chain(vec![ROOT.to_string()])
                .build(),
        );
        match parsed.verify().unwrap_err() {
            BundleError::TrustPath {
                index,
                child,
                parent,
            } => {
                assert_eq!(index, 1);
                assert_eq!(child, "leaf.example.com");
                assert_eq!(parent, "Example Root CA");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
