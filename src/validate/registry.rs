//! Validator registry (C7): maps a rule id to the prober that owns it.
//!
//! Mirrors the teacher's `Filter`/`ContentFilter` trait architecture
//! (`scan/filters/traits.rs`): a small behavioral interface, composed in
//! an ordered list, with linear first-match dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::scan::types::Match;
use crate::validate::types::ValidationResult;

/// A provider-specific, read-only credential prober.
#[async_trait]
pub trait Prober: Send + Sync {
    /// A short, stable identifier for this prober, used in diagnostics
    /// and tracing spans. Never the secret material itself.
    fn name(&self) -> &str;

    /// Whether this prober claims matches produced by `rule_id`.
    fn can_validate(&self, rule_id: &str) -> bool;

    /// Performs the read-only probe. Never returns an `Err`: every
    /// failure mode (transport, semantic, cancellation) resolves to an
    /// `undetermined` `ValidationResult`.
    async fn validate(&self, ctx: &CancellationToken, m: &Match) -> ValidationResult;
}

/// An ordered list of probers, consulted by first-match.
///
/// Providers are typically registered in two layers: bespoke code-based
/// probers first (complex multi-credential providers), then declarative
/// YAML probers. Ordering between layers is a deployment choice but is
/// deterministic within a process: registration order is preserved.
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    probers: Vec<Arc<dyn Prober>>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, prober: Arc<dyn Prober>) {
        self.probers.push(prober);
    }

    /// Returns the first prober, in registration order, claiming `rule_id`.
    pub fn lookup(&self, rule_id: &str) -> Option<Arc<dyn Prober>> {
        self.probers
            .iter()
            .find(|p| p.can_validate(rule_id))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.probers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubProber {
        id: &'static str,
        claims: &'static str,
    }

    #[async_trait]
    impl Prober for StubProber {
        fn name(&self) -> &str {
            self.id
        }

        fn can_validate(&self, rule_id: &str) -> bool {
            rule_id == self.claims
        }

        async fn validate(&self, _ctx: &CancellationToken, _m: &Match) -> ValidationResult {
            ValidationResult::undetermined("stub", 0)
        }
    }

    #[test]
    fn lookup_returns_first_registered_match() {
        let mut registry = ValidatorRegistry::new();
        registry.register(Arc::new(StubProber {
            id: "first",
            claims: "np.aws.1",
        }));
        registry.register(Arc::new(StubProber {
            id: "second",
            claims: "np.aws.1",
        }));
        let found = registry.lookup("np.aws.1").unwrap();
        assert_eq!(found.name(), "first");
    }

    #[test]
    fn lookup_returns_none_when_unclaimed() {
        let mut registry = ValidatorRegistry::new();
        registry.register(Arc::new(StubProber {
            id: "only",
            claims: "np.aws.1",
        }));
        assert!(registry.lookup("np.github.1").is_none());
    }
}
