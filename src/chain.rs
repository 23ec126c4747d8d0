/*!
*   Converts between PEM certificate chains and the JOSE `x5c` form.
*
*   An `x5c` entry is the base64 of one certificate's raw DER bytes with no
*   armor and no embedded newlines, ordered leaf first. `encode` walks the
*   PEM armor boundaries structurally; `decode` re-wraps a single entry back
*   into canonical PEM so external tooling (openssl et al) can check it.
*/

use base64ct::{Base64, Encoding};

use crate::DIDWebX509Error;

const BEGIN_CERTIFICATE: &str = "-----BEGIN CERTIFICATE-----";
const END_CERTIFICATE: &str = "-----END CERTIFICATE-----";

/// PEM bodies wrap at 64 columns
const PEM_LINE_WIDTH: usize = 64;

/// Converts a PEM certificate chain to an ordered list of `x5c` entries.
///
/// Certificates are returned in the order they appear in the input, which
/// for a chain file means leaf first. Line endings may be LF or CRLF.
/// `max_depth` of `Some(n)` with `n > 0` keeps only the first `n`
/// certificates.
///
/// # Errors
///
/// `MalformedChainError` when the input contains no certificate boundaries,
/// a `BEGIN` block is never closed, or a certificate body is not valid
/// base64.
pub fn encode(pem_chain: &str, max_depth: Option<usize>) -> Result<Vec<String>, DIDWebX509Error> {
    let mut entries: Vec<String> = Vec::new();
    let mut body: Option<String> = None;

    for line in pem_chain.lines() {
        let line = line.trim_end_matches('\r');
        if line == BEGIN_CERTIFICATE {
            if body.is_some() {
                return Err(DIDWebX509Error::MalformedChainError(format!(
                    "Certificate {} is missing its END boundary",
                    entries.len()
                )));
            }
            body = Some(String::new());
        } else if line == END_CERTIFICATE {
            let Some(entry) = body.take() else {
                return Err(DIDWebX509Error::MalformedChainError(format!(
                    "Certificate {} has an END boundary with no matching BEGIN",
                    entries.len()
                )));
            };
            // Reject bodies that are not base64 DER before they get embedded
            // anywhere
            Base64::decode_vec(&entry).map_err(|e| {
                DIDWebX509Error::MalformedChainError(format!(
                    "Certificate {} body is not valid base64. Reason: {e}",
                    entries.len()
                ))
            })?;
            entries.push(entry);
        } else if let Some(entry) = body.as_mut() {
            entry.push_str(line.trim());
        }
    }

    if body.is_some() {
        return Err(DIDWebX509Error::MalformedChainError(format!(
            "Certificate {} is missing its END boundary",
            entries.len()
        )));
    }
    if entries.is_empty() {
        return Err(DIDWebX509Error::MalformedChainError(
            "No certificate boundaries found in input".to_string(),
        ));
    }

    if let Some(depth) = max_depth
        && depth > 0
    {
        entries.truncate(depth);
    }

    Ok(entries)
}

/// Re-wraps a single `x5c` entry into canonical PEM form.
///
/// The body is wrapped at 64 columns and armored; output uses LF line
/// endings with a trailing newline, matching what `encode` consumed. A body
/// whose length is an exact multiple of 64 gets no empty final line.
pub fn decode(entry: &str) -> String {
    let mut pem = String::with_capacity(entry.len() + entry.len() / PEM_LINE_WIDTH + 64);
    pem.push_str(BEGIN_CERTIFICATE);
    pem.push('\n');
    for chunk in entry.as_bytes().chunks(PEM_LINE_WIDTH) {
        // chunks() never yields an empty slice, so valid UTF-8 boundaries
        // are guaranteed for ASCII base64 input
        pem.push_str(std::str::from_utf8(chunk).unwrap_or_default());
        pem.push('\n');
    }
    pem.push_str(END_CERTIFICATE);
    pem.push('\n');
    pem
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // Two tiny but structurally valid base64 bodies (decoded content is not
    // interpreted here)
    const BODY_A: &str = "AAECAwQFBgcICQoLDA0ODw==";
    const BODY_B: &str = "EBESExQVFhcYGRobHB0eHw==";

    fn pem_block(body: &str) -> String {
        format!("{BEGIN_CERTIFICATE}\n{body}\n{END_CERTIFICATE}\n")
    }

    #[test]
    fn encode_preserves_order() {
        let chain = format!("{}{}", pem_block(BODY_A), pem_block(BODY_B));
        let entries = encode(&chain, None).unwrap();
        assert_eq!(entries, vec![BODY_A.to_string(), BODY_B.to_string()]);
    }

    #[test]
    fn encode_tolerates_crlf() {
        let chain = pem_block(BODY_A).replace('\n', "\r\n");
        let entries = encode(&chain, None).unwrap();
        assert_eq!(entries, vec![BODY_A.to_string()]);
    }

    #[test]
    fn encode_max_depth_truncates() {
        let chain = format!("{}{}", pem_block(BODY_A), pem_block(BODY_B));
        let entries = encode(&chain, Some(1)).unwrap();
        assert_eq!(entries, vec![BODY_A.to_string()]);
        // Zero means "no limit"
        let entries = encode(&chain, Some(0)).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn encode_rejects_empty_input() {
        assert!(matches!(
            encode("no certificates here", None),
            Err(DIDWebX509Error::MalformedChainError(_))
        ));
    }

    #[test]
    fn encode_rejects_unterminated_block() {
        let chain = format!("{BEGIN_CERTIFICATE}\n{BODY_A}\n");
        assert!(matches!(
            encode(&chain, None),
            Err(DIDWebX509Error::MalformedChainError(_))
        ));
    }

    #[test]
    fn encode_rejects_bad_base64_body() {
        let chain = pem_block("not!!valid@@base64");
        assert!(matches!(
            encode(&chain, None),
            Err(DIDWebX509Error::MalformedChainError(_))
        ));
    }

    #[test]
    fn decode_wraps_exact_multiple_of_width() {
        // 128 characters: exactly two full lines, no empty trailing line
        let body = "A".repeat(128);
        let pem = decode(&body);
        let lines: Vec<&str> = pem.lines().collect();
        let full_line = "A".repeat(64);
        assert_eq!(
            lines,
            vec![
                BEGIN_CERTIFICATE,
                full_line.as_str(),
                full_line.as_str(),
                END_CERTIFICATE
            ]
        );
    }

    #[test]
    fn decode_preserves_short_final_chunk() {
        let body = "A".repeat(70);
        let pem = decode(&body);
        let lines: Vec<&str> = pem.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1].len(), 64);
        assert_eq!(lines[2].len(), 6);
    }

    proptest! {
        /// decode(encode(pem)[i]) reproduces the canonical PEM of the i-th
        /// certificate for any 64-column-wrapped input body
        #[test]
        fn round_trip_any_body_length(len in 1usize..600) {
            // Multiple of 4 so the body is decodable base64
            let len = len - (len % 4) + 4;
            let body = "Q".repeat(len);
            let canonical = decode(&body);
            let entries = encode(&canonical, None).unwrap();
            prop_assert_eq!(entries.len(), 1);
            prop_assert_eq!(&entries[0], &body);
            prop_assert_eq!(decode(&entries[0]), canonical);
        }
    }
}
