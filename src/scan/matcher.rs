//! Pattern matcher (C3): runs the candidate rules selected by the prefilter
//! against content, producing raw match spans with extracted capture groups.
//!
//! Mirrors the teacher's legacy `find_all_matches` (line/column bookkeeping
//! while iterating `Regex::captures_iter`), generalised to byte-oriented
//! regexes and arbitrary numbers of rules.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{Diagnostic, ScanError};
use crate::scan::prefilter::Prefilter;
use crate::scan::rule::Rule;

/// A single raw regex match against one rule, before snippet/id enrichment.
#[derive(Debug, Clone)]
pub struct RawMatch {
    pub rule: Arc<Rule>,
    pub start: usize,
    pub end: usize,
    /// Capture groups 1..N, in order; `None` for a group that did not
    /// participate in this particular match.
    pub groups: Vec<Option<Vec<u8>>>,
}

/// Combines the prefilter and per-rule regex matching into one pass.
pub struct Matcher {
    prefilter: Prefilter,
    rules: Vec<Arc<Rule>>,
    /// Per-rule wall-clock budget; a rule whose matching exceeds this is
    /// abandoned for the current content and reported as a diagnostic.
    timeout: Option<Duration>,
}

impl Matcher {
    pub fn new(rules: Vec<Arc<Rule>>, timeout: Option<Duration>) -> Result<Self, ScanError> {
        let prefilter = Prefilter::build(&rules)
            .map_err(|e| ScanError::MatcherConstruction(anyhow::Error::new(e)))?;
        Ok(Self {
            prefilter,
            rules,
            timeout,
        })
    }

    /// Scans `content`, returning every raw match plus any non-fatal
    /// diagnostics (currently: per-rule matcher timeouts).
    pub fn scan(&self, content: &[u8]) -> (Vec<RawMatch>, Vec<Diagnostic>) {
        let candidates = self.prefilter.filter(content);
        let mut matches = Vec::new();
        let mut diagnostics = Vec::new();

        for idx in candidates {
            let rule = &self.rules[idx];
            let started = Instant::now();
            let mut timed_out = false;

            for captures in rule.regex.captures_iter(content) {
                if let Some(budget) = self.timeout {
                    if started.elapsed() > budget {
                        timed_out = true;
                        break;
                    }
                }
                let whole = captures.get(0).expect("group 0 always participates");
                let group_count = rule.capture_group_count();
                let groups = (1..=group_count)
                    .map(|i| captures.get(i).map(|m| m.as_bytes().to_vec()))
                    .collect();
                matches.push(RawMatch {
                    rule: Arc::clone(rule),
                    start: whole.start(),
                    end: whole.end(),
                    groups,
                });
            }

            if timed_out {
                diagnostics.push(Diagnostic::matcher_timeout(&rule.id));
            }
        }

        (matches, diagnostics)
    }
}
