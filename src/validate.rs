/*!
*   Binds an `x5c` certificate chain to a JWK, cross-checking that the
*   chain's leaf actually carries the JWK's public key.
*
*   The chain itself is not validated against a trust store here; trust
*   decisions belong to whoever consumes the published key.
*/

use tracing::debug;

use crate::{Algorithm, DIDWebX509Error, chain, jwk::Jwk, key::PublicKey};

/// Returns a copy of the JWK with the `x5c` chain attached.
///
/// The first chain entry is decoded and its public key compared against the
/// JWK's coordinates before anything is attached, closing the gap where a
/// chain for one key gets published under another.
///
/// # Errors
///
/// - `MalformedChainError`: the chain is empty
/// - `CertificateParseError`: the leaf entry can't be parsed
/// - `ChainKeyMismatchError`: the leaf's public key differs from the JWK
pub fn attach_chain_to_key(
    jwk: &Jwk,
    x5c: &[String],
    algorithm: Algorithm,
) -> Result<Jwk, DIDWebX509Error> {
    let Some(leaf_entry) = x5c.first() else {
        return Err(DIDWebX509Error::MalformedChainError(
            "Can't attach an empty x5c chain".to_string(),
        ));
    };

    let leaf_pem = chain::decode(leaf_entry);
    let leaf_jwk = PublicKey::from_certificate_pem(&leaf_pem, algorithm)?.to_jwk();

    let public = jwk.to_public();
    if leaf_jwk != public {
        return Err(DIDWebX509Error::ChainKeyMismatchError(format!(
            "x5c[0] public key (crv {}) doesn't match the JWK it is attached to (crv {})",
            leaf_jwk.crv, public.crv
        )));
    }
    debug!("x5c leaf matches JWK, attaching {} entries", x5c.len());

    let mut attached = jwk.clone();
    attached.x5c = Some(x5c.to_vec());
    Ok(attached)
}
