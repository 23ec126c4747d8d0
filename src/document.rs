/*!
*   Builds did:web DID Documents from certificate-derived key material.
*
*   The resulting document is meant to be published at
*   `https://<domain>/.well-known/did.json`; publication itself is a
*   deployment concern and stays outside this crate.
*/

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{DIDWebX509Error, jwk::Jwk};

/// W3C DID core context
pub const DID_CONTEXT: &str = "https://www.w3.org/ns/did/v1";

/// JWS 2020 verification suite context
pub const JWS_2020_CONTEXT: &str = "https://w3id.org/security/suites/jws-2020/v1";

/// Verification method type for JWK-backed keys
pub const JSON_WEB_KEY_2020: &str = "JsonWebKey2020";

/// A DID Document verification method binding a DID to a public JWK
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// `<controller>#<thumbprint>`
    pub id: String,

    /// Always `JsonWebKey2020`
    #[serde(rename = "type")]
    pub type_: String,

    /// The DID that controls this key
    pub controller: String,

    /// The public key material
    pub public_key_jwk: Jwk,
}

/// A did:web DID Document carrying a single certificate-backed key
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DIDDocument {
    /// JSON-LD contexts (DID core + JWS 2020 suite)
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    /// The DID itself, equal to the verification method's controller
    pub id: String,

    /// Verification methods, exactly one here
    pub verification_method: Vec<VerificationMethod>,

    /// References the verification method by id
    pub assertion_method: Vec<String>,

    /// References the verification method by id
    pub authentication: Vec<String>,
}

/// Forms a did:web DID from a domain name.
///
/// The domain must already be a validated DNS-style name; certificate CN
/// extraction ([`crate::key::subject_common_name`]) is the expected source.
pub fn did_from_domain(domain: &str) -> String {
    format!("did:web:{domain}")
}

impl VerificationMethod {
    /// Builds a verification method for a public JWK under the given DID.
    ///
    /// The id fragment is the key's RFC 7638 thumbprint, so the same key
    /// always produces the same id under the same controller.
    ///
    /// # Errors
    ///
    /// `CertificateParseError` if the JWK can't be canonicalized for the
    /// thumbprint.
    pub fn new(public_key_jwk: Jwk, did: &str) -> Result<Self, DIDWebX509Error> {
        let fragment = public_key_jwk.thumbprint()?;
        debug!("Verification method fragment for {did}: {fragment}");
        Ok(VerificationMethod {
            id: format!("{did}#{fragment}"),
            type_: JSON_WEB_KEY_2020.to_string(),
            controller: did.to_string(),
            public_key_jwk,
        })
    }
}

impl DIDDocument {
    /// Assembles a DID Document around a single verification method.
    ///
    /// The document id is the method's controller; the assertion and
    /// authentication relationships reference the method by id rather than
    /// embedding it a second time.
    pub fn new(vm: VerificationMethod) -> Self {
        DIDDocument {
            context: vec![DID_CONTEXT.to_string(), JWS_2020_CONTEXT.to_string()],
            id: vm.controller.clone(),
            assertion_method: vec![vm.id.clone()],
            authentication: vec![vm.id.clone()],
            verification_method: vec![vm],
        }
    }

    /// Pretty-printed JSON (2-space indent) ready to host as `did.json`
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
