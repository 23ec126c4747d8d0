/*!
*   Key material extraction: imports PKCS#8 private keys and certificate
*   public keys onto the supported curve, and exports both as JWKs.
*
*   The certificate is parsed structurally with `x509-cert`. The Subject
*   Common Name comes out of the parsed distinguished name, never out of a
*   substring search, so a `CN=` appearing in the Issuer or elsewhere can't
*   be picked up by mistake.
*/

use base64ct::{Base64, Base64UrlUnpadded, Encoding};
use const_oid::db::{rfc4519, rfc5912};
use p384::elliptic_curve::sec1::ToEncodedPoint;
use p384::pkcs8::DecodePrivateKey;
use tracing::debug;
use x509_cert::Certificate;
use x509_cert::der::Decode;
use x509_cert::der::asn1::{Ia5StringRef, ObjectIdentifier, PrintableStringRef, Utf8StringRef};

use crate::{Algorithm, DIDWebX509Error, chain, jwk::Jwk};

/// Slices the first certificate out of a PEM block and parses it.
///
/// Certificate files in the wild often carry a text dump or further chain
/// certificates around the armor; only the first certificate matters here.
fn parse_first_certificate(cert_pem: &str) -> Result<Certificate, DIDWebX509Error> {
    let entries = chain::encode(cert_pem, Some(1)).map_err(|e| {
        DIDWebX509Error::CertificateParseError(format!(
            "No certificate found in input. Reason: {e}",
        ))
    })?;
    let der = Base64::decode_vec(&entries[0]).map_err(|e| {
        DIDWebX509Error::CertificateParseError(format!(
            "Certificate body is not valid base64. Reason: {e}",
        ))
    })?;
    Certificate::from_der(&der).map_err(|e| {
        DIDWebX509Error::CertificateParseError(format!(
            "Couldn't parse X.509 certificate. Reason: {e}",
        ))
    })
}

/// A private key imported from PKCS#8, bound to its algorithm
#[derive(Clone)]
pub struct PrivateKey {
    secret: p384::SecretKey,
    algorithm: Algorithm,
}

/// A public key extracted from an X.509 certificate, bound to its algorithm
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    public: p384::PublicKey,
    algorithm: Algorithm,
}

impl PrivateKey {
    /// Imports a PKCS#8 PEM private key for the given algorithm.
    ///
    /// # Errors
    ///
    /// `KeyImportError` when the PKCS#8 structure is malformed or the key is
    /// not on the algorithm's curve.
    pub fn from_pkcs8_pem(pem: &str, algorithm: Algorithm) -> Result<Self, DIDWebX509Error> {
        let secret = match algorithm {
            Algorithm::ES384 => p384::SecretKey::from_pkcs8_pem(pem).map_err(|e| {
                DIDWebX509Error::KeyImportError(format!(
                    "Couldn't import PKCS#8 key for {algorithm} (curve {}). Reason: {e}",
                    algorithm.curve()
                ))
            })?,
        };
        Ok(PrivateKey { secret, algorithm })
    }

    /// Algorithm the key was imported for
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The corresponding public key
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            public: self.secret.public_key(),
            algorithm: self.algorithm,
        }
    }

    /// Exports the key as a private JWK (includes the `d` scalar)
    pub fn to_jwk(&self) -> Jwk {
        let mut jwk = self.public_key().to_jwk();
        jwk.d = Some(Base64UrlUnpadded::encode_string(
            self.secret.to_bytes().as_slice(),
        ));
        jwk
    }

    pub(crate) fn signing_key(&self) -> p384::ecdsa::SigningKey {
        p384::ecdsa::SigningKey::from(&self.secret)
    }
}

impl PublicKey {
    /// Extracts the public key from the first certificate in a PEM block.
    ///
    /// The certificate is parsed as X.509; the SubjectPublicKeyInfo must
    /// carry an EC key on the algorithm's named curve.
    ///
    /// # Errors
    ///
    /// `CertificateParseError` when the certificate is malformed, the key is
    /// not an EC key, or the named curve differs from the algorithm's.
    pub fn from_certificate_pem(
        cert_pem: &str,
        algorithm: Algorithm,
    ) -> Result<Self, DIDWebX509Error> {
        let cert = parse_first_certificate(cert_pem)?;
        Self::from_certificate(&cert, algorithm)
    }

    /// Extracts the public key from an already-parsed certificate
    pub fn from_certificate(
        cert: &Certificate,
        algorithm: Algorithm,
    ) -> Result<Self, DIDWebX509Error> {
        let spki = &cert.tbs_certificate.subject_public_key_info;

        if spki.algorithm.oid != rfc5912::ID_EC_PUBLIC_KEY {
            return Err(DIDWebX509Error::CertificateParseError(format!(
                "Certificate key is not an EC key (algorithm OID {})",
                spki.algorithm.oid
            )));
        }
        let curve_oid = spki
            .algorithm
            .parameters
            .as_ref()
            .and_then(|params| params.decode_as::<ObjectIdentifier>().ok())
            .ok_or_else(|| {
                DIDWebX509Error::CertificateParseError(
                    "Certificate EC key has no named curve".to_string(),
                )
            })?;
        let expected = match algorithm {
            Algorithm::ES384 => rfc5912::SECP_384_R_1,
        };
        if curve_oid != expected {
            return Err(DIDWebX509Error::CertificateParseError(format!(
                "Certificate key curve {curve_oid} doesn't match {} required by {algorithm}",
                algorithm.curve()
            )));
        }

        let public = p384::PublicKey::from_sec1_bytes(spki.subject_public_key.raw_bytes())
            .map_err(|e| {
                DIDWebX509Error::CertificateParseError(format!(
                    "Couldn't decode SEC1 point from certificate. Reason: {e}",
                ))
            })?;
        debug!("Imported {} public key from certificate", algorithm.curve());
        Ok(PublicKey { public, algorithm })
    }

    /// Algorithm the key was imported for
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Exports the key as a public JWK (no private material)
    pub fn to_jwk(&self) -> Jwk {
        let point = self.public.to_encoded_point(false);
        // Uncompressed SEC1 points always carry both coordinates
        let x = point.x().map(|x| Base64UrlUnpadded::encode_string(x.as_slice()));
        let y = point.y().map(|y| Base64UrlUnpadded::encode_string(y.as_slice()));
        Jwk {
            kty: "EC".to_string(),
            crv: self.algorithm.curve().to_string(),
            x: x.unwrap_or_default(),
            y: y.unwrap_or_default(),
            d: None,
            x5c: None,
        }
    }

    pub(crate) fn verifying_key(&self) -> p384::ecdsa::VerifyingKey {
        p384::ecdsa::VerifyingKey::from(&self.public)
    }
}

/// Extracts the Subject Common Name from a PEM certificate.
///
/// Walks the parsed Subject RDN sequence looking for the CN attribute and
/// decodes it from whichever ASN.1 string form the CA used.
///
/// # Errors
///
/// `CertificateParseError` when the certificate can't be parsed or carries
/// no non-empty Common Name.
pub fn subject_common_name(cert_pem: &str) -> Result<String, DIDWebX509Error> {
    let cert = parse_first_certificate(cert_pem)?;

    for rdn in &cert.tbs_certificate.subject.0 {
        for atv in rdn.0.iter() {
            if atv.oid != rfc4519::CN {
                continue;
            }
            let cn = Utf8StringRef::try_from(&atv.value)
                .map(|s| s.to_string())
                .or_else(|_| PrintableStringRef::try_from(&atv.value).map(|s| s.to_string()))
                .or_else(|_| Ia5StringRef::try_from(&atv.value).map(|s| s.to_string()))
                .map_err(|e| {
                    DIDWebX509Error::CertificateParseError(format!(
                        "Subject CN has an unsupported string encoding. Reason: {e}",
                    ))
                })?;
            if cn.is_empty() {
                return Err(DIDWebX509Error::CertificateParseError(
                    "Subject CN is empty".to_string(),
                ));
            }
            return Ok(cn);
        }
    }

    Err(DIDWebX509Error::CertificateParseError(
        "Certificate subject has no Common Name".to_string(),
    ))
}
