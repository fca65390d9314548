//! Prefilter (C2): Aho-Corasick keyword screen selecting the candidate
//! rule subset for a piece of content, built once from the rule catalog.

use std::collections::BTreeSet;
use std::sync::Arc;

use aho_corasick::AhoCorasick;

use crate::scan::rule::Rule;

/// Fast keyword screen built once over a catalog's rules. Rules with no
/// keywords are always-on and never filtered out; rules with keywords are
/// only included when at least one of their keywords occurs in the input.
pub struct Prefilter {
    always_on: Vec<usize>,
    ac: Option<AhoCorasick>,
    /// Aho-Corasick pattern id -> rule indices that keyword maps to.
    pattern_to_rules: Vec<Vec<usize>>,
}

impl Prefilter {
    /// Builds the keyword screen. Fails only if the combined keyword set is
    /// large enough to overflow Aho-Corasick's internal state representation
    /// (`aho_corasick::BuildError`) — unreachable for the bundled catalog but
    /// a real possibility once a caller supplies a large custom ruleset.
    pub fn build(rules: &[Arc<Rule>]) -> Result<Self, aho_corasick::BuildError> {
        let mut always_on = Vec::new();
        let mut keywords: Vec<String> = Vec::new();
        let mut pattern_to_rules: Vec<Vec<usize>> = Vec::new();

        for (idx, rule) in rules.iter().enumerate() {
            if rule.keywords.is_empty() {
                always_on.push(idx);
                continue;
            }
            for keyword in &rule.keywords {
                match keywords.iter().position(|k| k == keyword) {
                    Some(pos) => pattern_to_rules[pos].push(idx),
                    None => {
                        keywords.push(keyword.clone());
                        pattern_to_rules.push(vec![idx]);
                    }
                }
            }
        }

        let ac = if keywords.is_empty() {
            None
        } else {
            Some(AhoCorasick::new(&keywords)?)
        };

        Ok(Self {
            always_on,
            ac,
            pattern_to_rules,
        })
    }

    /// Returns the candidate rule indices for `content`, in ascending
    /// (catalog declaration) order. Always-on rules are never dropped.
    pub fn filter(&self, content: &[u8]) -> Vec<usize> {
        let mut selected: BTreeSet<usize> = self.always_on.iter().copied().collect();
        if let Some(ac) = &self.ac {
            for m in ac.find_iter(content) {
                let pattern_id = m.pattern().as_usize();
                if let Some(rule_indices) = self.pattern_to_rules.get(pattern_id) {
                    selected.extend(rule_indices.iter().copied());
                }
            }
        }
        selected.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::rule::compile_rule_file;

    fn rules(yaml: &str) -> Vec<Arc<Rule>> {
        compile_rule_file(yaml)
            .unwrap()
            .into_iter()
            .map(Arc::new)
            .collect()
    }

    #[test]
    fn always_on_rules_are_never_dropped() {
        let rules = rules(
            r#"
rules:
  - id: r1
    name: R1
    pattern: "AKIA[0-9A-Z]{16}"
    keywords: ["AKIA"]
  - id: r2
    name: R2
    pattern: "secret\\d+"
    keywords: []
"#,
        );
        let pf = Prefilter::build(&rules).unwrap();
        assert_eq!(pf.filter(b""), vec![1]);
        assert_eq!(pf.filter(b"no keywords here"), vec![1]);
    }

    #[test]
    fn keyword_presence_adds_the_rule_and_preserves_declaration_order() {
        let rules = rules(
            r#"
rules:
  - id: r1
    name: R1
    pattern: "AKIA[0-9A-Z]{16}"
    keywords: ["AKIA"]
  - id: r2
    name: R2
    pattern: "secret\\d+"
    keywords: []
"#,
        );
        let pf = Prefilter::build(&rules).unwrap();
        assert_eq!(pf.filter(b"AKIA test content"), vec![0, 1]);
    }

    #[test]
    fn keyword_matching_is_case_sensitive() {
        let rules = rules(
            r#"
rules:
  - id: r1
    name: R1
    pattern: "akia[0-9a-z]{16}"
    keywords: ["AKIA"]
"#,
        );
        let pf = Prefilter::build(&rules).unwrap();
        assert!(pf.filter(b"akia lowercase").is_empty());
    }

    #[test]
    fn empty_keyword_set_across_the_whole_catalog_yields_no_matcher() {
        let rules = rules(
            r#"
rules:
  - id: r1
    name: R1
    pattern: "anything"
    keywords: []
"#,
        );
        let pf = Prefilter::build(&rules).unwrap();
        assert!(pf.ac.is_none());
        assert_eq!(pf.filter(b"anything at all"), vec![0]);
    }
}
