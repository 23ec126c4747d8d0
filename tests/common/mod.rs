use std::fs;

use chrono::Duration;
use didweb_x509::issue::IssuanceRequest;
use didweb_x509::token::SignOptions;
use didweb_x509::Algorithm;
use serde_json::{Map, Value, json};

#[allow(dead_code)]
pub fn load_test_file(file: &str) -> String {
    fs::read_to_string(file).unwrap_or_else(|_| panic!("Failed to read test file: {file}",))
}

#[allow(dead_code)]
pub fn hello_payload() -> Map<String, Value> {
    let mut payload = Map::new();
    payload.insert("hello".to_string(), json!("world"));
    payload
}

#[allow(dead_code)]
pub fn example_sign_options() -> SignOptions {
    SignOptions {
        algorithm: Algorithm::ES384,
        issuer: "urn:example:issuer".to_string(),
        audience: "urn:example:audience".to_string(),
        expires_in: Duration::hours(2),
    }
}

/// Issuance request for the 1.example.com fixture chain
#[allow(dead_code)]
pub fn example_request() -> IssuanceRequest {
    let ca_chain = format!(
        "{}{}",
        load_test_file("tests/test_vectors/intermediate-ca.crt"),
        load_test_file("tests/test_vectors/root-ca.crt")
    );
    IssuanceRequest {
        certificate_pem: load_test_file("tests/test_vectors/1.example.com.crt"),
        private_key_pem: load_test_file("tests/test_vectors/1.example.com.pk8.pem"),
        ca_chain_pem: ca_chain,
        claims: hello_payload(),
        sign: example_sign_options(),
    }
}
