/*!
*   Derives did:web DID Documents and verifiable JWTs from an X.509
*   certificate authority chain.
*
*   The leaf certificate's public key, the key embedded in the DID Document,
*   the signing key for the JWT and the first `x5c` chain entry must all
*   refer to the same key pair. The [`issue`] module ties the individual
*   steps together and enforces that invariant end to end.
*/

use std::fmt;

use thiserror::Error;

pub mod chain;
pub mod document;
pub mod issue;
pub mod jwk;
pub mod key;
pub mod token;
pub mod validate;

/// Signature algorithms supported for certificate-backed keys.
///
/// Only the P-384 ECDSA scheme is supported. The variant is threaded
/// explicitly through key import, signing and verification so each boundary
/// checks the algorithm instead of assuming it.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Algorithm {
    /// ECDSA over P-384 with SHA-384 (JOSE `ES384`)
    #[default]
    ES384,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::ES384 => write!(f, "ES384"),
        }
    }
}

impl TryFrom<&str> for Algorithm {
    type Error = DIDWebX509Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "ES384" => Ok(Algorithm::ES384),
            _ => Err(DIDWebX509Error::KeyImportError(format!(
                "Unsupported algorithm: {value}"
            ))),
        }
    }
}

impl Algorithm {
    /// JWK `crv` value for the algorithm's curve
    pub fn curve(&self) -> &'static str {
        match self {
            Algorithm::ES384 => "P-384",
        }
    }
}

/// Error types for the did:web X.509 derivation flow
#[derive(Error, Debug)]
pub enum DIDWebX509Error {
    /// No certificate boundaries found, or a PEM block is damaged
    #[error("MalformedChainError: {0}")]
    MalformedChainError(String),
    /// X.509 structure couldn't be parsed, or a required field is missing
    #[error("CertificateParseError: {0}")]
    CertificateParseError(String),
    /// PKCS#8 import failed or the key is on the wrong curve
    #[error("KeyImportError: {0}")]
    KeyImportError(String),
    /// Token could not be signed
    #[error("SigningError: {0}")]
    SigningError(String),
    /// Token signature or protected header failed verification
    #[error("SignatureInvalidError: {0}")]
    SignatureInvalidError(String),
    /// Issuer or audience claim differs from the expected value
    #[error("ClaimMismatchError: {0}")]
    ClaimMismatchError(String),
    /// Token expiration instant has passed
    #[error("ExpiredTokenError: {0}")]
    ExpiredTokenError(String),
    /// The first `x5c` entry does not carry the JWK's public key
    #[error("ChainKeyMismatchError: {0}")]
    ChainKeyMismatchError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_display_round_trips() {
        let alg = Algorithm::try_from("ES384").unwrap();
        assert_eq!(alg, Algorithm::ES384);
        assert_eq!(alg.to_string(), "ES384");
        assert_eq!(alg.curve(), "P-384");
    }

    #[test]
    fn unknown_algorithm_rejected() {
        assert!(Algorithm::try_from("ES256").is_err());
        assert!(Algorithm::try_from("none").is_err());
    }
}
