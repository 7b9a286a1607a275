use ed25519_dalek::{Signature, SignatureError, VerifyingKey, PUBLIC_KEY_LENGTH};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum PublicKeyError {
    #[error("public key is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("public key must be {PUBLIC_KEY_LENGTH} bytes, got {0}")]
    Length(usize),
    #[error("public key is not a valid Ed25519 key: {0}")]
    Key(#[source] SignatureError),
}

/// Process-scoped verifying key for inbound interaction callbacks. Built once
/// at bootstrap from the application's hex-encoded public key.
#[derive(Clone, Debug)]
pub struct SignatureVerifier {
    key: VerifyingKey,
}

impl SignatureVerifier {
    pub fn from_hex(public_key_hex: &str) -> Result<Self, PublicKeyError> {
        let bytes = hex::decode(public_key_hex.trim())?;
        let bytes: [u8; PUBLIC_KEY_LENGTH] =
            bytes.try_into().map_err(|bytes: Vec<u8>| PublicKeyError::Length(bytes.len()))?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(PublicKeyError::Key)?;
        Ok(Self { key })
    }

    /// Checks the platform signature headers against the raw request body.
    /// The signed message is the timestamp string concatenated with the body
    /// bytes. Fails closed: missing headers, malformed hex, or a mismatched
    /// signature all return `false` with a warning, never a fault.
    pub fn verify_request(
        &self,
        timestamp: Option<&str>,
        signature: Option<&str>,
        body: &[u8],
    ) -> bool {
        let Some(timestamp) = timestamp else {
            warn!(
                event_name = "discord.verify.rejected",
                reason = "missing timestamp header",
                "interaction signature rejected"
            );
            return false;
        };
        let Some(signature_hex) = signature else {
            warn!(
                event_name = "discord.verify.rejected",
                reason = "missing signature header",
                "interaction signature rejected"
            );
            return false;
        };

        let signature_bytes = match hex::decode(signature_hex) {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(
                    event_name = "discord.verify.rejected",
                    reason = "signature is not valid hex",
                    error = %error,
                    "interaction signature rejected"
                );
                return false;
            }
        };
        let signature = match Signature::from_slice(&signature_bytes) {
            Ok(signature) => signature,
            Err(error) => {
                warn!(
                    event_name = "discord.verify.rejected",
                    reason = "signature has the wrong shape",
                    error = %error,
                    "interaction signature rejected"
                );
                return false;
            }
        };

        let mut message = Vec::with_capacity(timestamp.len() + body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(body);

        match self.key.verify_strict(&message, &signature) {
            Ok(()) => true,
            Err(error) => {
                warn!(
                    event_name = "discord.verify.rejected",
                    reason = "signature mismatch",
                    error = %error,
                    "interaction signature rejected"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ed25519_dalek::{Signer, SigningKey};

    use super::{PublicKeyError, SignatureVerifier};

    fn fixture() -> (SigningKey, SignatureVerifier) {
        let signing = SigningKey::from_bytes(&[7u8; 32]);
        let public_key_hex = hex::encode(signing.verifying_key().to_bytes());
        let verifier = SignatureVerifier::from_hex(&public_key_hex).expect("key should parse");
        (signing, verifier)
    }

    fn sign(signing: &SigningKey, timestamp: &str, body: &[u8]) -> String {
        let mut message = timestamp.as_bytes().to_vec();
        message.extend_from_slice(body);
        hex::encode(signing.sign(&message).to_bytes())
    }

    #[test]
    fn accepts_a_correctly_signed_request() {
        let (signing, verifier) = fixture();
        let body = br#"{"type":1}"#;
        let signature = sign(&signing, "1724300000", body);

        assert!(verifier.verify_request(Some("1724300000"), Some(&signature), body));
    }

    #[test]
    fn rejects_a_mutated_body() {
        let (signing, verifier) = fixture();
        let signature = sign(&signing, "1724300000", br#"{"type":1}"#);

        assert!(!verifier.verify_request(Some("1724300000"), Some(&signature), br#"{"type":2}"#));
    }

    #[test]
    fn rejects_a_mutated_timestamp() {
        let (signing, verifier) = fixture();
        let body = br#"{"type":1}"#;
        let signature = sign(&signing, "1724300000", body);

        assert!(!verifier.verify_request(Some("1724300001"), Some(&signature), body));
    }

    #[test]
    fn rejects_a_mutated_signature() {
        let (signing, verifier) = fixture();
        let body = br#"{"type":1}"#;
        let mut signature = sign(&signing, "1724300000", body);
        let flipped = if signature.ends_with('0') { "1" } else { "0" };
        signature.replace_range(signature.len() - 1.., flipped);

        assert!(!verifier.verify_request(Some("1724300000"), Some(&signature), body));
    }

    #[test]
    fn rejects_missing_headers_and_malformed_hex() {
        let (signing, verifier) = fixture();
        let body = br#"{"type":1}"#;
        let signature = sign(&signing, "1724300000", body);

        assert!(!verifier.verify_request(None, Some(&signature), body));
        assert!(!verifier.verify_request(Some("1724300000"), None, body));
        assert!(!verifier.verify_request(Some("1724300000"), Some("not-hex"), body));
        assert!(!verifier.verify_request(Some("1724300000"), Some("abcd"), body));
    }

    #[test]
    fn public_key_parse_reports_shape_errors() {
        assert!(matches!(
            SignatureVerifier::from_hex("zz"),
            Err(PublicKeyError::Hex(_))
        ));
        assert!(matches!(
            SignatureVerifier::from_hex("abcd"),
            Err(PublicKeyError::Length(2))
        ));
    }
}
