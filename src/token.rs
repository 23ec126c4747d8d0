/*!
*   Signs and verifies compact JWTs (`header.payload.signature`) with a
*   certificate-backed EC key.
*
*   The protected header algorithm always comes from the signing key's
*   algorithm, and verification re-checks it against the verifying key
*   before the signature is examined, so a token can't smuggle in a
*   different scheme. Verification is the single authoritative gate:
*   claims must only be trusted after [`verify`] returns Ok.
*/

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Duration, Utc};
use p384::ecdsa::Signature;
use p384::ecdsa::signature::{Signer, Verifier};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::{
    Algorithm, DIDWebX509Error,
    key::{PrivateKey, PublicKey},
};

/// Protected header of a compact JWT
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct ProtectedHeader {
    /// JOSE algorithm name (`ES384`)
    pub alg: String,

    /// Optional token type marker
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

/// Claims applied when signing a token
#[derive(Clone, Debug)]
pub struct SignOptions {
    /// Algorithm the caller expects to sign with; must match the key
    pub algorithm: Algorithm,

    /// `iss` claim
    pub issuer: String,

    /// `aud` claim
    pub audience: String,

    /// `exp` is set to now + this duration
    pub expires_in: Duration,
}

/// Expected claims when verifying a token
#[derive(Clone, Debug)]
pub struct VerifyOptions {
    /// Algorithm the caller expects the token to be signed with
    pub algorithm: Algorithm,

    /// Expected `iss` claim
    pub issuer: String,

    /// Expected `aud` claim
    pub audience: String,
}

/// Result of a successful verification.
///
/// Callers should still compare `protected_header.alg` against the
/// algorithm they expect before acting on the payload.
#[derive(Clone, Debug)]
pub struct VerifiedToken {
    /// The verified claims, including `iss`/`aud`/`iat`/`exp`
    pub payload: Map<String, Value>,

    /// The verified protected header
    pub protected_header: ProtectedHeader,
}

/// Signs a payload into a compact JWT.
///
/// `iss`, `aud`, `iat` (now) and `exp` (now + `expires_in`) are written
/// into the claims on top of the payload; the protected header `alg` is the
/// key's algorithm.
///
/// # Errors
///
/// `SigningError` when the requested algorithm doesn't match the key's, or
/// serialization fails.
pub fn sign(
    payload: &Map<String, Value>,
    key: &PrivateKey,
    options: &SignOptions,
) -> Result<String, DIDWebX509Error> {
    sign_at(payload, key, options, Utc::now())
}

/// As [`sign`], with an explicit issued-at instant
pub fn sign_at(
    payload: &Map<String, Value>,
    key: &PrivateKey,
    options: &SignOptions,
    now: DateTime<Utc>,
) -> Result<String, DIDWebX509Error> {
    if options.algorithm != key.algorithm() {
        return Err(DIDWebX509Error::SigningError(format!(
            "Requested algorithm {} doesn't match key algorithm {}",
            options.algorithm,
            key.algorithm()
        )));
    }

    let header = ProtectedHeader {
        alg: key.algorithm().to_string(),
        typ: None,
    };

    let mut claims = payload.clone();
    claims.insert("iss".to_string(), json!(options.issuer));
    claims.insert("aud".to_string(), json!(options.audience));
    claims.insert("iat".to_string(), json!(now.timestamp()));
    claims.insert(
        "exp".to_string(),
        json!((now + options.expires_in).timestamp()),
    );

    let header_b64 = encode_part(&header)?;
    let claims_b64 = encode_part(&claims)?;
    let signing_input = format!("{header_b64}.{claims_b64}");

    // RFC 6979 deterministic ECDSA; signature serializes as raw r||s as
    // JOSE requires
    let signature: Signature = key.signing_key().sign(signing_input.as_bytes());
    let signature_b64 = Base64UrlUnpadded::encode_string(signature.to_bytes().as_slice());

    debug!("Signed {} token for iss {}", header.alg, options.issuer);
    Ok(format!("{signing_input}.{signature_b64}"))
}

/// Verifies a compact JWT against a public key and expected claims.
///
/// # Errors
///
/// - `SignatureInvalidError`: malformed token, header algorithm mismatch,
///   or bad signature
/// - `ExpiredTokenError`: the `exp` instant has passed
/// - `ClaimMismatchError`: `iss` or `aud` differ from the expected values,
///   or a required claim is missing
pub fn verify(
    token: &str,
    key: &PublicKey,
    options: &VerifyOptions,
) -> Result<VerifiedToken, DIDWebX509Error> {
    verify_at(token, key, options, Utc::now())
}

/// As [`verify`], evaluating expiry against an explicit instant
pub fn verify_at(
    token: &str,
    key: &PublicKey,
    options: &VerifyOptions,
    now: DateTime<Utc>,
) -> Result<VerifiedToken, DIDWebX509Error> {
    let parts: Vec<&str> = token.split('.').collect();
    let &[header_b64, claims_b64, signature_b64] = parts.as_slice() else {
        return Err(DIDWebX509Error::SignatureInvalidError(format!(
            "Compact token must have 3 parts, found {}",
            parts.len()
        )));
    };

    let header: ProtectedHeader = decode_part(header_b64, "protected header")?;
    if header.alg != options.algorithm.to_string() || options.algorithm != key.algorithm() {
        return Err(DIDWebX509Error::SignatureInvalidError(format!(
            "Protected header algorithm {} doesn't match expected {} for the key",
            header.alg, options.algorithm
        )));
    }

    let signature_bytes = Base64UrlUnpadded::decode_vec(signature_b64).map_err(|e| {
        DIDWebX509Error::SignatureInvalidError(format!(
            "Couldn't decode token signature. Reason: {e}",
        ))
    })?;
    let signature = Signature::from_slice(&signature_bytes).map_err(|e| {
        DIDWebX509Error::SignatureInvalidError(format!(
            "Token signature has the wrong length for {}. Reason: {e}",
            options.algorithm
        ))
    })?;

    let signing_input = format!("{header_b64}.{claims_b64}");
    key.verifying_key()
        .verify(signing_input.as_bytes(), &signature)
        .map_err(|e| {
            DIDWebX509Error::SignatureInvalidError(format!(
                "Token signature doesn't verify. Reason: {e}",
            ))
        })?;

    let claims: Map<String, Value> = decode_part(claims_b64, "claims")?;

    let exp = claims.get("exp").and_then(Value::as_i64).ok_or_else(|| {
        DIDWebX509Error::ClaimMismatchError("Token has no numeric exp claim".to_string())
    })?;
    if now.timestamp() > exp {
        return Err(DIDWebX509Error::ExpiredTokenError(format!(
            "Token expired at {exp}, now {}",
            now.timestamp()
        )));
    }

    check_string_claim(&claims, "iss", &options.issuer)?;
    check_string_claim(&claims, "aud", &options.audience)?;

    Ok(VerifiedToken {
        payload: claims,
        protected_header: header,
    })
}

fn check_string_claim(
    claims: &Map<String, Value>,
    name: &str,
    expected: &str,
) -> Result<(), DIDWebX509Error> {
    match claims.get(name).and_then(Value::as_str) {
        Some(found) if found == expected => Ok(()),
        Some(found) => Err(DIDWebX509Error::ClaimMismatchError(format!(
            "Claim {name} is {found}, expected {expected}",
        ))),
        None => Err(DIDWebX509Error::ClaimMismatchError(format!(
            "Token has no {name} claim, expected {expected}",
        ))),
    }
}

fn encode_part<T: Serialize>(part: &T) -> Result<String, DIDWebX509Error> {
    let json = serde_json::to_vec(part).map_err(|e| {
        DIDWebX509Error::SigningError(format!("Couldn't serialize token part. Reason: {e}",))
    })?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn decode_part<T: for<'de> Deserialize<'de>>(
    part: &str,
    what: &str,
) -> Result<T, DIDWebX509Error> {
    let bytes = Base64UrlUnpadded::decode_vec(part).map_err(|e| {
        DIDWebX509Error::SignatureInvalidError(format!(
            "Couldn't decode token {what}. Reason: {e}",
        ))
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        DIDWebX509Error::SignatureInvalidError(format!(
            "Couldn't parse token {what} as JSON. Reason: {e}",
        ))
    })
}
