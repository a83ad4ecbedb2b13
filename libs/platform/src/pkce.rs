//! PKCE verifier/challenge generation (RFC 7636, S256 method).

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// A verifier and its derived challenge. The verifier must be kept for the
/// matching callback and is consumed exactly once during token exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

/// Produces a fresh verifier from 32 random bytes (URL-safe, unpadded) and
/// derives its challenge.
pub fn generate_pair() -> PkcePair {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    let verifier = URL_SAFE_NO_PAD.encode(bytes);
    let challenge = challenge_for(&verifier);
    PkcePair {
        verifier,
        challenge,
    }
}

/// URL-safe, unpadded base64 of the SHA-256 digest of the verifier.
pub fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn challenge_is_deterministic_and_unpadded() {
        let first = challenge_for("some-verifier");
        let second = challenge_for("some-verifier");
        assert_eq!(first, second);
        assert!(!first.contains('='));
    }

    #[test]
    fn challenge_decodes_to_sha256_of_verifier() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        let challenge = challenge_for(verifier);
        let decoded = URL_SAFE_NO_PAD.decode(&challenge).unwrap();
        assert_eq!(decoded, Sha256::digest(verifier.as_bytes()).to_vec());
    }

    #[test]
    fn generated_verifier_encodes_32_bytes() {
        let pair = generate_pair();
        let decoded = URL_SAFE_NO_PAD.decode(&pair.verifier).unwrap();
        assert_eq!(decoded.len(), 32);
        assert_eq!(pair.challenge, challenge_for(&pair.verifier));
    }

    #[test]
    fn pairs_are_unique() {
        assert_ne!(generate_pair().verifier, generate_pair().verifier);
    }
}
