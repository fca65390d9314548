//! Validation engine (C12): coordinates the registry, extractor, cache,
//! and probers with bounded concurrency and cooperative cancellation.

use std::sync::Arc;

use tokio::sync::{oneshot, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::scan::types::Match;
use crate::validate::cache::ValidationCache;
use crate::validate::registry::ValidatorRegistry;
use crate::validate::types::{now_unix, ValidationResult};

/// Secret-extraction order shared by the cache key and the extractor's own
/// convenience lookup: `named_groups["secret"]`, then in order `token`,
/// `key`, `password`, `secret_key`, `api_key`, else the entire snippet's
/// matched text.
const SECRET_FIELD_ORDER: &[&str] = &["secret", "token", "key", "password", "secret_key", "api_key"];

pub fn extract_secret_bytes(m: &Match) -> Vec<u8> {
    for field in SECRET_FIELD_ORDER {
        if let Some(value) = m.named_groups.get(*field) {
            return value.clone();
        }
    }
    m.snippet.matching.clone()
}

/// Coordinates C7–C11 behind a bounded-concurrency, cancellation-aware
/// validation API.
pub struct ValidationEngine {
    registry: ValidatorRegistry,
    cache: ValidationCache,
    semaphore: Arc<Semaphore>,
}

impl ValidationEngine {
    pub fn new(registry: ValidatorRegistry, workers: usize) -> Self {
        Self {
            registry,
            cache: ValidationCache::new(),
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    pub fn registry(&self) -> &ValidatorRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &ValidationCache {
        &self.cache
    }

    /// Validates `m`, awaiting the result directly: extract secret, check
    /// cache, acquire a bounded permit, re-check cache, invoke the prober,
    /// store, return.
    pub async fn validate_match(&self, ctx: &CancellationToken, m: &Match) -> ValidationResult {
        let secret = extract_secret_bytes(m);

        if let Some(cached) = self.cache.get(&secret) {
            tracing::trace!(rule_id = %m.rule_id, "validation cache hit");
            return cached;
        }
        tracing::trace!(rule_id = %m.rule_id, "validation cache miss");

        let permit = tokio::select! {
            permit = self.semaphore.acquire() => match permit {
                Ok(permit) => permit,
                Err(_) => return ValidationResult::undetermined("context cancelled", now_unix()),
            },
            _ = ctx.cancelled() => {
                return ValidationResult::undetermined("context cancelled", now_unix());
            }
        };

        // Re-check the cache now that we hold a permit, to collapse
        // duplicate concurrent work on the same secret.
        if let Some(cached) = self.cache.get(&secret) {
            drop(permit);
            return cached;
        }

        let result = match self.registry.lookup(&m.rule_id) {
            Some(prober) => prober.validate(ctx, m).await,
            None => ValidationResult::undetermined("no validator available", now_unix()),
        };

        self.cache.insert(&secret, result.clone());
        drop(permit);
        result
    }

    /// Returns a single-shot receiver for `m`'s validation outcome. If the
    /// secret is already cached, the result is sent immediately without
    /// scheduling a task; otherwise validation runs on a spawned task.
    pub fn validate_async(
        self: &Arc<Self>,
        ctx: CancellationToken,
        m: Match,
    ) -> oneshot::Receiver<ValidationResult> {
        let (tx, rx) = oneshot::channel();

        let secret = extract_secret_bytes(&m);
        if let Some(cached) = self.cache.get(&secret) {
            let _ = tx.send(cached);
            return rx;
        }

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let result = engine.validate_match(&ctx, &m).await;
            let _ = tx.send(result);
        });

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::identity::BlobId;
    use crate::scan::types::{Location, SnippetView};
    use crate::validate::registry::Prober;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn bare_match(rule_id: &str) -> Match {
        Match {
            blob_id: BlobId::compute(b"x").to_hex(),
            rule_id: rule_id.into(),
            rule_name: "R".into(),
            location: Location::compute(b"x", 0, 1),
            groups: vec![],
            named_groups: BTreeMap::new(),
            snippet: SnippetView {
                before: vec![],
                matching: b"the-secret-value".to_vec(),
                after: vec![],
            },
            structural_id: "s".into(),
            finding_id: "f".into(),
            validation_result: None,
        }
    }

    struct CountingProber {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Prober for CountingProber {
        fn name(&self) -> &str {
            "counting"
        }

        fn can_validate(&self, rule_id: &str) -> bool {
            rule_id == "np.test.1"
        }

        async fn validate(&self, _ctx: &CancellationToken, _m: &Match) -> ValidationResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ValidationResult::valid("stub valid", 0)
        }
    }

    #[tokio::test]
    async fn validate_match_is_served_from_cache_on_repeat_secret() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = ValidatorRegistry::new();
        registry.register(Arc::new(CountingProber { calls: calls.clone() }));
        let engine = ValidationEngine::new(registry, 2);
        let ctx = CancellationToken::new();

        let m = bare_match("np.test.1");
        let first = engine.validate_match(&ctx, &m).await;
        let second = engine.validate_match(&ctx, &m).await;

        assert_eq!(first.status, second.status);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn validate_match_returns_undetermined_when_unclaimed() {
        let engine = ValidationEngine::new(ValidatorRegistry::new(), 2);
        let ctx = CancellationToken::new();
        let m = bare_match("np.unclaimed.1");
        let result = engine.validate_match(&ctx, &m).await;
        assert_eq!(result.status, crate::validate::types::ValidationStatus::Undetermined);
        assert!(result.message.contains("no validator available"));
    }

    #[tokio::test]
    async fn cancelled_context_short_circuits_with_undetermined() {
        let engine = ValidationEngine::new(ValidatorRegistry::new(), 1);
        let ctx = CancellationToken::new();
        ctx.cancel();
        let m = bare_match("np.test.1");
        let result = engine.validate_match(&ctx, &m).await;
        assert_eq!(result.status, crate::validate::types::ValidationStatus::Undetermined);
    }

    #[tokio::test]
    async fn validate_async_fast_path_skips_scheduling_when_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = ValidatorRegistry::new();
        registry.register(Arc::new(CountingProber { calls: calls.clone() }));
        let engine = Arc::new(ValidationEngine::new(registry, 2));
        let ctx = CancellationToken::new();
        let m = bare_match("np.test.1");

        let first_rx = engine.validate_async(ctx.clone(), m.clone());
        let first = first_rx.await.unwrap();
        assert_eq!(first.status, crate::validate::types::ValidationStatus::Valid);

        let second_rx = engine.validate_async(ctx.clone(), m.clone());
        let second = second_rx.await.unwrap();
        assert_eq!(second.status, crate::validate::types::ValidationStatus::Valid);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
