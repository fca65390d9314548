//! Rule catalog (C1): an immutable, in-memory set of compiled rules.

use std::sync::Arc;

use crate::error::{CatalogError, Diagnostic};
use crate::scan::rule::{compile_rule_file, compile_rule_file_tolerant, Rule};

const EMBEDDED_PATTERNS: &str = include_str!("../../assets/patterns.yaml");

/// Where a scanner's rules come from.
pub enum RuleSource {
    /// The bundled catalog shipped with this crate.
    Builtin,
    /// A caller-supplied YAML document (same schema as the bundled one).
    Yaml(String),
    /// Already-compiled rules, e.g. constructed in a test.
    Rules(Vec<Rule>),
}

impl Default for RuleSource {
    fn default() -> Self {
        RuleSource::Builtin
    }
}

/// An immutable set of compiled rules, constructed once per scanner
/// instance and shared (via `Arc`) across every scan call.
pub struct RuleCatalog {
    rules: Vec<Arc<Rule>>,
}

impl RuleCatalog {
    /// Loads the primary rule source. Any rule that fails to compile is a
    /// fatal, terminal error identifying the offending rule id.
    pub fn load(source: RuleSource) -> Result<Self, CatalogError> {
        let rules = match source {
            RuleSource::Builtin => compile_rule_file(EMBEDDED_PATTERNS)?,
            RuleSource::Yaml(yaml) => compile_rule_file(&yaml)?,
            RuleSource::Rules(rules) => rules,
        };
        tracing::info!(rule_count = rules.len(), "loaded rule catalog");
        Ok(Self {
            rules: rules.into_iter().map(Arc::new).collect(),
        })
    }

    /// Loads and appends a supplemental ruleset file. A malformed rule in
    /// `yaml` is reported as a diagnostic and skipped; it never fails the
    /// whole catalog, matching the non-fatal policy for runtime-loaded
    /// custom rulesets.
    pub fn extend_with_supplemental(&mut self, yaml: &str) -> Vec<Diagnostic> {
        let (rules, errors) = compile_rule_file_tolerant(yaml);
        let diagnostics = errors
            .iter()
            .map(|e| Diagnostic::rule_load_skipped(e.rule_id().unwrap_or("<unknown>"), e))
            .collect();
        for rule in rules {
            tracing::debug!(rule_id = %rule.id, "loaded supplemental rule");
            self.rules.push(Arc::new(rule));
        }
        diagnostics
    }

    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
