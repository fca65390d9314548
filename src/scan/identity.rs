//! Identity & location service (blob ids, structural ids, line/column math).
//!
//! Every function here is pure: same inputs always produce the same
//! outputs, which is what lets `finding_id`/`structural_id` survive across
//! independent scans and across reimplementations of this crate.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use sha1::{Digest, Sha1};

/// A content-addressed identifier for a scanned blob: `sha1("blob " +
/// len(content) + "\0" + content)`, identical to the convention used by
/// mainstream content-addressable storage.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlobId([u8; 20]);

impl BlobId {
    pub fn compute(content: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(b"blob ");
        hasher.update(content.len().to_string().as_bytes());
        hasher.update([0u8]);
        hasher.update(content);
        let digest = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest);
        BlobId(bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a 40-character hex string (either case) back into a `BlobId`.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 40 {
            return None;
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s, &mut bytes).ok()?;
        Some(BlobId(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobId({})", self.to_hex())
    }
}

/// 1-based `(line, column)` at `offset` into `content`. Never panics: an
/// out-of-range offset clamps to the end of the content.
pub fn line_column(content: &[u8], offset: usize) -> (usize, usize) {
    let offset = offset.min(content.len());
    let mut line = 1usize;
    let mut last_newline: Option<usize> = None;
    for (i, &byte) in content[..offset].iter().enumerate() {
        if byte == b'\n' {
            line += 1;
            last_newline = Some(i);
        }
    }
    let column = match last_newline {
        Some(nl) => offset - nl,
        None => offset + 1,
    };
    (line, column)
}

static NAMED_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\?P<[A-Za-z_][A-Za-z0-9_]*>").expect("static regex"));

/// SHA-1 hex of `pattern` after normalising named capture groups to
/// unnamed ones, so `(?P<x>...)` and `(...)` hash identically.
pub fn rule_structural_id(pattern: &str) -> String {
    let normalized = NAMED_GROUP.replace_all(pattern, "(");
    sha1_hex(normalized.as_bytes())
}

/// SHA-1 hex identifying a single match's content+position identity.
pub fn match_structural_id(rule_structural_id: &str, blob_id: &BlobId, start: usize, end: usize) -> String {
    let mut hasher = Sha1::new();
    hasher.update(rule_structural_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(blob_id.to_hex().as_bytes());
    hasher.update([0u8]);
    hasher.update(start.to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(end.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// The fixed, documented canonical encoding of an ordered list of byte
/// strings: a JSON array where each element is a UTF-8 string if the bytes
/// are valid UTF-8, else an array of byte values.
pub fn canonical_json(groups: &[Vec<u8>]) -> String {
    let values: Vec<serde_json::Value> = groups
        .iter()
        .map(|g| match std::str::from_utf8(g) {
            Ok(s) => serde_json::Value::String(s.to_string()),
            Err(_) => {
                serde_json::Value::Array(g.iter().map(|b| serde_json::Value::from(*b)).collect())
            }
        })
        .collect();
    serde_json::to_string(&serde_json::Value::Array(values))
        .expect("canonical group encoding never fails to serialize")
}

/// SHA-1 hex grouping matches by content identity: two matches of the same
/// rule capturing the same groups always produce the same `finding_id`.
pub fn finding_id(rule_structural_id: &str, groups: &[Vec<u8>]) -> String {
    let json = canonical_json(groups);
    let mut hasher = Sha1::new();
    hasher.update(rule_structural_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(json.as_bytes());
    hex::encode(hasher.finalize())
}

fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_id_of_empty_content_is_the_well_known_git_empty_blob_id() {
        assert_eq!(
            BlobId::compute(b"").to_hex(),
            "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391"
        );
    }

    #[test]
    fn blob_id_literal_vectors() {
        assert_eq!(
            BlobId::compute(b"hello world").to_hex(),
            "95d09f2b10159347eece71399a7e2e907ea3df4f"
        );
        assert_eq!(
            BlobId::compute(b"test content\n").to_hex(),
            "d670460b4b4aece5915caf5c68d12f560a9fe3e4"
        );
    }

    #[test]
    fn blob_id_round_trips_through_hex() {
        let id = BlobId::compute(b"round trip me");
        let hex = id.to_hex();
        let parsed = BlobId::from_hex(&hex).unwrap();
        assert_eq!(parsed.to_hex(), hex);
        assert_eq!(BlobId::from_hex(&hex.to_uppercase()).unwrap().to_hex(), hex);
    }

    #[test]
    fn line_column_matches_literal_vectors() {
        assert_eq!(line_column(b"", 0), (1, 1));
        assert_eq!(line_column(b"hello\nworld", 0), (1, 1));
        assert_eq!(line_column(b"hello\nworld", 6), (2, 1));
        assert_eq!(line_column(b"hello\nworld", 5), (1, 6));
    }

    #[test]
    fn line_column_clamps_past_end_of_content() {
        let content = b"one\ntwo\n";
        let past_end = line_column(content, 1000);
        assert_eq!(past_end, line_column(content, content.len()));
    }

    #[test]
    fn rule_structural_id_ignores_capture_group_names() {
        let unnamed = r"\b((?:A3T[A-Z0-9]|AKIA)[A-Z0-9]{16})\b";
        let named = r"\b(?P<key>(?:A3T[A-Z0-9]|AKIA)[A-Z0-9]{16})\b";
        assert_eq!(rule_structural_id(unnamed), rule_structural_id(named));
    }

    #[test]
    fn rule_structural_id_is_pure_and_distinct_for_distinct_patterns() {
        assert_eq!(rule_structural_id("abc"), rule_structural_id("abc"));
        assert_ne!(rule_structural_id("abc"), rule_structural_id("abd"));
    }

    #[test]
    fn finding_id_groups_identical_captures_together() {
        let rsid = rule_structural_id("pattern");
        let a = finding_id(&rsid, &[b"one".to_vec(), b"two".to_vec()]);
        let b = finding_id(&rsid, &[b"one".to_vec(), b"two".to_vec()]);
        let c = finding_id(&rsid, &[b"one".to_vec(), b"three".to_vec()]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn canonical_json_falls_back_to_byte_arrays_for_invalid_utf8() {
        let groups = vec![vec![0xff, 0xfe]];
        let json = canonical_json(&groups);
        assert_eq!(json, "[[255,254]]");
    }
}
