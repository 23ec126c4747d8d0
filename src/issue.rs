/*!
*   End-to-end issuance: one leaf certificate plus its private key in, one
*   set of derived artifacts out (DID, DID Document, JWKs, signed token).
*
*   Every artifact derives from the same leaf certificate: the DID comes
*   from its Subject CN, the document's verification method and the `x5c`
*   leaf carry its public key, and the token is signed with the matching
*   private key. Divergence anywhere fails the issuance.
*/

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    DIDWebX509Error, chain,
    document::{DIDDocument, VerificationMethod, did_from_domain},
    jwk::Jwk,
    key::{PrivateKey, PublicKey, subject_common_name},
    token::{self, SignOptions},
    validate,
};

/// Raw inputs for one identity issuance
#[derive(Clone, Debug)]
pub struct IssuanceRequest {
    /// Leaf certificate, PEM. The Subject CN supplies the did:web domain.
    pub certificate_pem: String,

    /// Leaf private key, PKCS#8 PEM
    pub private_key_pem: String,

    /// CA certificates above the leaf (intermediate then root), PEM
    pub ca_chain_pem: String,

    /// Token payload claims (before iss/aud/iat/exp are applied)
    pub claims: Map<String, Value>,

    /// Algorithm and registered claims for the signed token
    pub sign: SignOptions,
}

/// Everything derived from one certificate
#[derive(Clone, Debug)]
pub struct IssuedIdentity {
    /// `did:web:<domain>` from the leaf Subject CN
    pub did: String,

    /// Publishable DID Document embedding the public JWK with its chain
    pub document: DIDDocument,

    /// Public JWK with the `x5c` chain attached, leaf first
    pub public_jwk: Jwk,

    /// Private JWK for the same key pair
    pub private_jwk: Jwk,

    /// Compact signed token
    pub token: String,
}

/// How [`issue_all`] reacts to a failing item
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BatchMode {
    /// Report the failure for that item and keep going
    #[default]
    ContinueOnError,

    /// Stop at the first failure; later items are not attempted
    FailFast,
}

/// Derives the full artifact set for one certificate.
///
/// # Errors
///
/// Any of the component errors: certificate parse, key import (including a
/// private key that doesn't match the certificate), malformed chain, chain
/// key mismatch, or signing failure.
pub fn issue(request: &IssuanceRequest) -> Result<IssuedIdentity, DIDWebX509Error> {
    let algorithm = request.sign.algorithm;

    let domain = subject_common_name(&request.certificate_pem)?;
    let did = did_from_domain(&domain);
    debug!("Issuing identity for {did}");

    let public_key = PublicKey::from_certificate_pem(&request.certificate_pem, algorithm)?;
    let private_key = PrivateKey::from_pkcs8_pem(&request.private_key_pem, algorithm)?;
    if private_key.public_key() != public_key {
        return Err(DIDWebX509Error::KeyImportError(format!(
            "Private key doesn't correspond to the public key in the certificate for {domain}",
        )));
    }

    // Leaf first, then whatever the CA chain supplies (intermediate, root)
    let mut x5c = chain::encode(&request.certificate_pem, Some(1))?;
    x5c.extend(chain::encode(&request.ca_chain_pem, None)?);

    let public_jwk = validate::attach_chain_to_key(&public_key.to_jwk(), &x5c, algorithm)?;
    let private_jwk = private_key.to_jwk();

    let vm = VerificationMethod::new(public_jwk.clone(), &did)?;
    let document = DIDDocument::new(vm);

    let token = token::sign(&request.claims, &private_key, &request.sign)?;

    Ok(IssuedIdentity {
        did,
        document,
        public_jwk,
        private_jwk,
        token,
    })
}

/// Issues a batch of identities with per-item isolation.
///
/// Results are positional: `results[i]` is the outcome for `requests[i]`.
/// Failures never corrupt artifacts already produced for earlier items.
/// In `FailFast` mode the returned vector stops at the first error.
pub fn issue_all(
    requests: &[IssuanceRequest],
    mode: BatchMode,
) -> Vec<Result<IssuedIdentity, DIDWebX509Error>> {
    let mut results = Vec::with_capacity(requests.len());
    for (index, request) in requests.iter().enumerate() {
        match issue(request) {
            Ok(identity) => results.push(Ok(identity)),
            Err(e) => {
                warn!("Issuance failed for certificate {index}! Reason: {e}");
                results.push(Err(e));
                if mode == BatchMode::FailFast {
                    break;
                }
            }
        }
    }
    results
}
