//! Validation cache (C11): content-keyed memoization of validation
//! outcomes, keyed only on secret material, never on surrounding context.

use std::collections::HashMap;
use std::sync::RwLock;

use sha2::{Digest, Sha256};

use crate::validate::types::ValidationResult;

/// SHA-256 hex of the secret bytes. The cache key derivation depends only
/// on the secret itself, never on snippet or provider context.
pub fn cache_key(secret: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret);
    hex::encode(hasher.finalize())
}

/// Thread-safe, engine-lifetime cache of validation outcomes.
#[derive(Default)]
pub struct ValidationCache {
    entries: RwLock<HashMap<String, ValidationResult>>,
}

impl ValidationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, secret: &[u8]) -> Option<ValidationResult> {
        let key = cache_key(secret);
        self.entries
            .read()
            .expect("validation cache lock poisoned")
            .get(&key)
            .cloned()
    }

    pub fn insert(&self, secret: &[u8], result: ValidationResult) {
        let key = cache_key(secret);
        self.entries
            .write()
            .expect("validation cache lock poisoned")
            .insert(key, result);
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("validation cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
