/*!
*   JSON Web Key representation for certificate-backed EC keys, plus the
*   RFC 7638 thumbprint used as the verification method fragment.
*/

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::DIDWebX509Error;

/// An elliptic-curve JSON Web Key.
///
/// Public and private keys share the same coordinate material; only the
/// presence of the private scalar `d` distinguishes them. The optional
/// `x5c` member carries the certificate chain as base64 DER, leaf first.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct Jwk {
    /// Key type, always `EC` here
    pub kty: String,

    /// Curve name (`P-384`)
    pub crv: String,

    /// X coordinate, base64url unpadded
    pub x: String,

    /// Y coordinate, base64url unpadded
    pub y: String,

    /// Private scalar, base64url unpadded. Only present on private keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,

    /// Certificate chain, leaf first, base64 (not base64url) DER entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x5c: Option<Vec<String>>,
}

impl Jwk {
    /// Strips private material and the certificate chain, leaving only the
    /// public coordinates
    pub fn to_public(&self) -> Jwk {
        Jwk {
            kty: self.kty.clone(),
            crv: self.crv.clone(),
            x: self.x.clone(),
            y: self.y.clone(),
            d: None,
            x5c: None,
        }
    }

    /// Whether the key carries a private scalar
    pub fn is_private(&self) -> bool {
        self.d.is_some()
    }

    /// Computes the RFC 7638 thumbprint of the key.
    ///
    /// Only the required public members (`crv`, `kty`, `x`, `y`) enter the
    /// hash, in JCS canonical order, so the result is a pure function of the
    /// key material. The private scalar and any attached `x5c` chain never
    /// influence it. Output is unpadded base64url of the SHA-256 digest,
    /// safe for use as a DID URL fragment.
    ///
    /// # Errors
    ///
    /// `CertificateParseError` if canonicalization fails, which only happens
    /// on non-string coordinate data and indicates a malformed key.
    pub fn thumbprint(&self) -> Result<String, DIDWebX509Error> {
        let required = json!({
            "crv": self.crv,
            "kty": self.kty,
            "x": self.x,
            "y": self.y,
        });
        let jcs = serde_json_canonicalizer::to_string(&required).map_err(|e| {
            DIDWebX509Error::CertificateParseError(format!(
                "Couldn't canonicalize JWK for thumbprint. Reason: {e}",
            ))
        })?;
        Ok(Base64UrlUnpadded::encode_string(
            Sha256::digest(jcs.as_bytes()).as_slice(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_jwk() -> Jwk {
        Jwk {
            kty: "EC".to_string(),
            crv: "P-384".to_string(),
            x: "WKWGUr_Xx2nMUyDCLm-90pcq-ddKRpPGyKdmLUBbTg-eSW067dQTc2DDNAmV65mq".to_string(),
            y: "XGlbh0dhmnqwBBmb1aVUqQ0zSW0dGCQYm4HgFb37r8bhVQOGrnJrYR2D121x9MKt".to_string(),
            d: None,
            x5c: None,
        }
    }

    #[test]
    fn thumbprint_is_deterministic() {
        let jwk = test_jwk();
        assert_eq!(jwk.thumbprint().unwrap(), jwk.thumbprint().unwrap());
    }

    #[test]
    fn thumbprint_ignores_private_scalar_and_chain() {
        let public = test_jwk();
        let mut loaded = test_jwk();
        loaded.d = Some("AAAA".to_string());
        loaded.x5c = Some(vec!["MIIB".to_string()]);
        assert_eq!(public.thumbprint().unwrap(), loaded.thumbprint().unwrap());
    }

    #[test]
    fn thumbprint_differs_for_distinct_keys() {
        let a = test_jwk();
        let mut b = test_jwk();
        b.x = b.y.clone();
        assert_ne!(a.thumbprint().unwrap(), b.thumbprint().unwrap());
    }

    #[test]
    fn thumbprint_is_url_safe() {
        let fragment = test_jwk().thumbprint().unwrap();
        assert!(
            fragment
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn serde_omits_absent_members() {
        let value = serde_json::to_value(test_jwk()).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("d"));
        assert!(!object.contains_key("x5c"));
    }

    #[test]
    fn to_public_strips_private_material() {
        let mut jwk = test_jwk();
        jwk.d = Some("AAAA".to_string());
        jwk.x5c = Some(vec!["MIIB".to_string()]);
        let public = jwk.to_public();
        assert!(!public.is_private());
        assert!(public.x5c.is_none());
        assert_eq!(public.x, jwk.x);
    }
}
