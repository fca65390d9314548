//! Scanner configuration (A3): a plain, serializable config struct with
//! documented defaults. Loading it from TOML/YAML/JSON is a caller concern;
//! this crate only fixes the shape.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::scan::catalog::RuleSource;

/// Configuration accepted by [`crate::scan::Scanner::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Number of lines of context captured before/after each match.
    pub context_lines: usize,
    /// Whether `scan_with_cancellation` also validates every match.
    pub validation: bool,
    /// Concurrent validation permits (semaphore capacity).
    pub validation_workers: usize,
    /// Per-rule wallclock budget for a single scan; `None` is unbounded.
    #[serde(with = "duration_millis_opt")]
    pub matcher_timeout: Option<Duration>,
    /// Caller-supplied supplemental rule YAML, appended to the primary
    /// rule source after it loads. Each bad rule here is a diagnostic,
    /// never a fatal error.
    pub supplemental_rules: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            context_lines: 2,
            validation: false,
            validation_workers: 4,
            matcher_timeout: None,
            supplemental_rules: Vec::new(),
        }
    }
}

impl ScannerConfig {
    /// Returns the rule source this config implies. A config built with
    /// `Default::default` always resolves to the bundled builtin catalog.
    pub(crate) fn rule_source(&self) -> RuleSource {
        RuleSource::Builtin
    }
}

mod duration_millis_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_millis()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let millis: Option<u64> = Option::deserialize(d)?;
        Ok(millis.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_contract() {
        let cfg = ScannerConfig::default();
        assert_eq!(cfg.context_lines, 2);
        assert!(!cfg.validation);
        assert_eq!(cfg.validation_workers, 4);
        assert!(cfg.matcher_timeout.is_none());
        assert!(cfg.supplemental_rules.is_empty());
    }

    #[test]
    fn serde_round_trips_through_json() {
        let mut cfg = ScannerConfig::default();
        cfg.matcher_timeout = Some(Duration::from_millis(250));
        let json = serde_json::to_string(&cfg).unwrap();
        let parsed: ScannerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.matcher_timeout, Some(Duration::from_millis(250)));
    }
}
