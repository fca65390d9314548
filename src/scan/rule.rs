//! Rule definitions: YAML-level deserialization plus the compiled,
//! immutable `Rule` the rest of the scan core operates on.
//!
//! Mirrors the teacher's pattern library (`static_data/patterns.rs`):
//! a YAML document deserialized into a plain struct, then compiled once
//! into an `Arc`-shareable list consumed by the prefilter and matcher.

use regex::bytes::Regex;
use serde::Deserialize;

use crate::error::CatalogError;
use crate::scan::identity::rule_structural_id;

/// Positive/negative example strings carried alongside a rule definition.
/// Not used at match time; kept for the catalog's own self-tests and for
/// documentation generation by downstream tooling.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleExamples {
    #[serde(default)]
    pub positive: Vec<String>,
    #[serde(default)]
    pub negative: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RuleDef {
    id: String,
    name: String,
    pattern: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    examples: Option<RuleExamples>,
    #[serde(default)]
    references: Vec<String>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    rules: Vec<RuleDef>,
}

/// A compiled, immutable detection rule.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub pattern: String,
    pub description: Option<String>,
    pub examples: RuleExamples,
    pub references: Vec<String>,
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
    /// SHA-1 hex of the pattern with named groups normalised away.
    pub structural_id: String,
    pub(crate) regex: Regex,
}

impl Rule {
    fn compile(def: RuleDef) -> Result<Self, CatalogError> {
        let regex = Regex::new(&def.pattern).map_err(|source| CatalogError::RuleCompile {
            rule_id: def.id.clone(),
            source,
        })?;
        let structural_id = rule_structural_id(&def.pattern);
        Ok(Rule {
            id: def.id,
            name: def.name,
            pattern: def.pattern,
            description: def.description,
            examples: def.examples.unwrap_or_default(),
            references: def.references,
            categories: def.categories,
            keywords: def.keywords,
            structural_id,
            regex,
        })
    }

    /// Number of capture groups the pattern declares, not counting group 0.
    pub fn capture_group_count(&self) -> usize {
        self.regex.captures_len().saturating_sub(1)
    }

    /// Name of capture group `index` (1-based), if it is named.
    pub fn capture_name(&self, index: usize) -> Option<&str> {
        self.regex.capture_names().nth(index).flatten()
    }
}

/// Parses a rule-file YAML document into a list of compiled rules,
/// failing the whole parse on the first bad rule (used for the primary,
/// fatal-on-error catalog construction path).
pub fn compile_rule_file(yaml: &str) -> Result<Vec<Rule>, CatalogError> {
    let file: RuleFile = serde_yaml_bw::from_str(yaml).map_err(|e| CatalogError::Parse(anyhow::anyhow!(e)))?;
    if file.rules.is_empty() {
        return Err(CatalogError::Empty);
    }
    file.rules.into_iter().map(Rule::compile).collect()
}

/// Parses a rule-file YAML document into compiled rules, skipping (and
/// reporting) any rule that fails to compile instead of failing outright.
/// Used for non-fatal, caller-supplied supplemental rule files.
pub fn compile_rule_file_tolerant(yaml: &str) -> (Vec<Rule>, Vec<CatalogError>) {
    let file: RuleFile = match serde_yaml_bw::from_str(yaml) {
        Ok(f) => f,
        Err(e) => return (Vec::new(), vec![CatalogError::Parse(anyhow::anyhow!(e))]),
    };
    let mut rules = Vec::new();
    let mut errors = Vec::new();
    for def in file.rules {
        match Rule::compile(def) {
            Ok(rule) => rules.push(rule),
            Err(e) => errors.push(e),
        }
    }
    (rules, errors)
}
