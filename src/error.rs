//! Error and diagnostic types shared by the scan and validate cores.
//!
//! Fatal conditions (bad scanner configuration, an unusable matcher) are
//! typed errors built on `thiserror`; everything recoverable (a single
//! malformed custom rule, a per-rule regex timeout, a prober that could not
//! reach its provider) is surfaced as a `Diagnostic` or folded into an
//! `undetermined` `ValidationResult` instead, per the error handling policy.

use thiserror::Error;

/// Failure while loading or compiling a single rule.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("rule '{rule_id}' failed to compile: {source}")]
    RuleCompile {
        rule_id: String,
        #[source]
        source: regex::Error,
    },
    #[error("failed to parse rule source: {0}")]
    Parse(#[source] anyhow::Error),
    #[error("rule file defines no rules")]
    Empty,
}

/// Fatal, scanner-instance-level failures.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid scanner configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("failed to construct matcher: {0}")]
    MatcherConstruction(#[source] anyhow::Error),
    #[error("failed to construct http client for validation: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("failed to load bundled validator definitions: {0}")]
    ValidatorLoad(#[source] anyhow::Error),
}

/// A non-fatal condition surfaced alongside a scan's matches.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub rule_id: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn matcher_timeout(rule_id: &str) -> Self {
        Self {
            kind: DiagnosticKind::MatcherTimeout,
            rule_id: Some(rule_id.to_string()),
            message: format!("matcher wallclock budget exceeded for rule '{rule_id}'"),
        }
    }

    pub fn rule_load_skipped(rule_id: &str, reason: impl std::fmt::Display) -> Self {
        Self {
            kind: DiagnosticKind::RuleLoadSkipped,
            rule_id: Some(rule_id.to_string()),
            message: format!("skipped rule '{rule_id}': {reason}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A rule exceeded its configured matching wallclock budget; the rule
    /// was abandoned for this scan but other rules still ran.
    MatcherTimeout,
    /// A rule in a supplemental ruleset failed to compile and was skipped.
    RuleLoadSkipped,
}

impl CatalogError {
    /// The id of the rule that caused this error, if it names one.
    pub fn rule_id(&self) -> Option<&str> {
        match self {
            CatalogError::RuleCompile { rule_id, .. } => Some(rule_id),
            CatalogError::Parse(_) | CatalogError::Empty => None,
        }
    }
}
