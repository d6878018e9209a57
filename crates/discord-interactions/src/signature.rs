use ed25519_dalek::{Signature, VerifyingKey};

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PublicKeyError {
    #[error("public key is not valid hex")]
    InvalidHex,
    #[error("public key must be 32 bytes, got {0}")]
    InvalidLength(usize),
    #[error("public key is not a valid Ed25519 point")]
    InvalidPoint,
}

/// Decodes the application's hex-encoded Ed25519 public key.
pub fn parse_public_key(hex_key: &str) -> Result<VerifyingKey, PublicKeyError> {
    let raw = hex::decode(hex_key.trim()).map_err(|_| PublicKeyError::InvalidHex)?;
    let bytes = <[u8; 32]>::try_from(raw.as_slice())
        .map_err(|_| PublicKeyError::InvalidLength(raw.len()))?;
    VerifyingKey::from_bytes(&bytes).map_err(|_| PublicKeyError::InvalidPoint)
}

/// Verifies a Discord interaction signature.
///
/// Discord signs `timestamp ++ body` and sends the hex signature in
/// `X-Signature-Ed25519` and the timestamp in `X-Signature-Timestamp`.
/// A missing header is a failed verification, not an error.
pub fn verify(
    public_key: &VerifyingKey,
    body: &[u8],
    signature_header: Option<&str>,
    timestamp_header: Option<&str>,
) -> bool {
    let (Some(signature_hex), Some(timestamp)) = (signature_header, timestamp_header) else {
        return false;
    };

    let Ok(raw) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(bytes) = <[u8; 64]>::try_from(raw.as_slice()) else {
        return false;
    };
    let signature = Signature::from_bytes(&bytes);

    let mut message = Vec::with_capacity(timestamp.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body);

    public_key.verify_strict(&message, &signature).is_ok()
}
