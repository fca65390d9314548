//! Credential extractor (C8): recovers the field(s) a prober needs from a
//! match's named groups and, when necessary, from its surrounding snippet.

use std::collections::BTreeMap;

use regex::bytes::Regex;

use crate::scan::types::Match;

/// Well-known named-group keys providers commonly require. These are the
/// field names the bundled rule catalog actually produces; `extract_required`
/// asserts every key it is asked for is drawn from this set.
pub const WELL_KNOWN_KEYS: &[&str] = &[
    "token",
    "key",
    "api_key",
    "access_key",
    "secret_key",
    "session_token",
    "secret",
    "connection_string",
    "username",
    "password",
    "host",
    "port",
    "account_name",
    "account_key",
    "account_sid",
    "key_sid",
    "webhook",
];

/// A single pre-compiled auxiliary pattern used to recover a companion
/// value from a match's snippet when it is not itself a named group.
pub struct AuxPattern {
    pub field: &'static str,
    pub regex: Regex,
}

impl AuxPattern {
    pub fn new(field: &'static str, pattern: &str) -> Self {
        Self {
            field,
            regex: Regex::new(pattern).expect("auxiliary pattern must compile"),
        }
    }
}

/// Pulls `required` fields from `m.named_groups`. Returns `Err` with a
/// human-readable "partial credentials" message naming the first missing
/// field if any are absent — callers turn this into an `undetermined`
/// result and skip probing, never a hard error.
pub fn extract_required(
    m: &Match,
    required: &[&str],
) -> Result<BTreeMap<String, Vec<u8>>, String> {
    let mut out = BTreeMap::new();
    for key in required {
        debug_assert!(
            WELL_KNOWN_KEYS.contains(key),
            "'{key}' is not a well-known extraction key"
        );
        match m.named_groups.get(*key) {
            Some(value) => {
                out.insert((*key).to_string(), value.clone());
            }
            None => {
                return Err(format!(
                    "partial credentials: missing required field '{key}'"
                ))
            }
        }
    }
    Ok(out)
}

/// Searches the concatenation of `before`/`matching`/`after` for the first
/// auxiliary pattern (in declaration order) that matches, returning its
/// field name and captured value (group 1 if present, else the whole hit).
pub fn find_companion(m: &Match, patterns: &[AuxPattern]) -> Option<(String, Vec<u8>)> {
    let haystack = m.snippet.joined();

    for aux in patterns {
        if let Some(captures) = aux.regex.captures(&haystack) {
            let value = captures
                .get(1)
                .or_else(|| captures.get(0))
                .map(|mm| mm.as_bytes().to_vec())
                .unwrap_or_default();
            return Some((aux.field.to_string(), value));
        }
    }
    None
}

/// Hosts a database prober MUST refuse to connect to, per the mandatory
/// loopback skip.
pub fn is_mandatory_loopback(host: &str) -> bool {
    matches!(host, "localhost" | "127.0.0.1" | "::1")
}

/// The stricter loopback/private-network policy applied by the
/// declarative HTTP prober (C10): any RFC1918 literal in addition to the
/// mandatory set above.
pub fn is_loopback_or_private(host: &str) -> bool {
    if is_mandatory_loopback(host) {
        return true;
    }
    if let Ok(addr) = host.parse::<std::net::IpAddr>() {
        return match addr {
            std::net::IpAddr::V4(v4) => {
                v4.is_loopback() || v4.is_private() || v4.is_link_local()
            }
            std::net::IpAddr::V6(v6) => v6.is_loopback(),
        };
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::identity::BlobId;
    use crate::scan::types::SnippetView;
    use std::collections::BTreeMap as Map;

    fn bare_match() -> Match {
        Match {
            blob_id: BlobId::compute(b"x").to_hex(),
            rule_id: "r".into(),
            rule_name: "R".into(),
            location: crate::scan::types::Location::compute(b"x", 0, 1),
            groups: vec![],
            named_groups: Map::new(),
            snippet: SnippetView {
                before: vec![],
                matching: vec![],
                after: vec![],
            },
            structural_id: "s".into(),
            finding_id: "f".into(),
            validation_result: None,
        }
    }

    #[test]
    fn extract_required_errors_on_first_missing_field() {
        let m = bare_match();
        let err = extract_required(&m, &["token"]).unwrap_err();
        assert!(err.contains("token"));
    }

    #[test]
    fn extract_required_succeeds_when_all_fields_present() {
        let mut m = bare_match();
        m.named_groups.insert("token".into(), b"abc".to_vec());
        let extracted = extract_required(&m, &["token"]).unwrap();
        assert_eq!(extracted.get("token"), Some(&b"abc".to_vec()));
    }

    #[test]
    fn find_companion_tries_patterns_in_declaration_order() {
        let mut m = bare_match();
        m.snippet.after = b"AWS_SECRET_ACCESS_KEY=wJalrXUtnFEMI".to_vec();
        let patterns = vec![
            AuxPattern::new("shopify_host", r"[\w-]+\.myshopify\.com"),
            AuxPattern::new("aws_secret", r"AWS_SECRET_ACCESS_KEY=([A-Za-z0-9/+=]+)"),
        ];
        let (field, value) = find_companion(&m, &patterns).unwrap();
        assert_eq!(field, "aws_secret");
        assert_eq!(value, b"wJalrXUtnFEMI".to_vec());
    }

    #[test]
    fn mandatory_loopback_set_matches_exact_literals_only() {
        assert!(is_mandatory_loopback("localhost"));
        assert!(is_mandatory_loopback("127.0.0.1"));
        assert!(is_mandatory_loopback("::1"));
        assert!(!is_mandatory_loopback("example.com"));
    }

    #[test]
    fn private_policy_also_rejects_rfc1918_literals() {
        assert!(is_loopback_or_private("10.0.0.5"));
        assert!(is_loopback_or_private("192.168.1.1"));
        assert!(!is_loopback_or_private("8.8.8.8"));
    }
}
