use crate::error::{BundleError, Result};

/// PEM label of a DER-encoded X.509 certificate.
pub const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// PEM label of a PKCS#10 certificate signing request.
pub const CERTIFICATE_REQUEST_LABEL: &str = "CERTIFICATE REQUEST";

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
///
/// Lines end in `\n` and the trailing newline is trimmed, so the output can be
/// stored in a bundle field as-is.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    let config = pem::EncodeConfig::new().set_line_ending(pem::LineEnding::LF);
    pem::encode_config(&pem, config).trim().to_string()
}

const UNTAGGED_BEGIN: &str = "-----BEGIN -----";
const UNTAGGED_END: &str = "-----END -----";
const UNTAGGED_PLACEHOLDER: &str = "UNTAGGED";

/// Decode the first PEM block of `pem_str`, naming `what` in the error.
///
/// A block with an empty label (`-----BEGIN -----`) is accepted and comes
/// back with an empty tag, so callers can fall back to trial decoding.
pub fn decode_block(pem_str: &str, what: &str) -> Result<pem::Pem> {
    let pem_str = pem_str.trim();
    let invalid = |e: pem::PemError| BundleError::DecodingError(format!("{what}: {e}"));

    if !pem_str.starts_with(UNTAGGED_BEGIN) {
        return pem::parse(pem_str).map_err(invalid);
    }

    let relabelled = pem_str
        .replacen(UNTAGGED_BEGIN, &format!("-----BEGIN {UNTAGGED_PLACEHOLDER}-----"), 1)
        .replacen(UNTAGGED_END, &format!("-----END {UNTAGGED_PLACEHOLDER}-----"), 1);
    let block = pem::parse(relabelled).map_err(invalid)?;
    Ok(pem::Pem::new("", block.into_contents()))
}

/// Convert a PEM‑encoded string to DER‑encoded bytes.
pub fn pem_to_der(pem_str: &str) -> Result<Vec<u8>> {
    Ok(decode_block(pem_str, "PEM block")?.into_contents())
}

/// Formats bytes as two-digit lowercase hex joined by `sep`, e.g. `0a:bc`.
pub fn hex_formatted(bytes: &[u8], sep: &str) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(sep)
}
