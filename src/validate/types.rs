//! Validation result types shared by the registry, extractor, probers,
//! cache, and engine.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Current time as Unix seconds, used to stamp `ValidationResult::validated_at`.
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Outcome of probing a credential against its provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    Invalid,
    Undetermined,
}

/// The full result of validating a single credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub status: ValidationStatus,
    pub confidence: f64,
    pub message: String,
    pub validated_at: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ValidationResult {
    pub fn valid(message: impl Into<String>, validated_at: u64) -> Self {
        Self {
            status: ValidationStatus::Valid,
            confidence: 1.0,
            message: message.into(),
            validated_at,
            details: None,
        }
    }

    pub fn invalid(message: impl Into<String>, validated_at: u64) -> Self {
        Self {
            status: ValidationStatus::Invalid,
            confidence: 1.0,
            message: message.into(),
            validated_at,
            details: None,
        }
    }

    pub fn undetermined(message: impl Into<String>, validated_at: u64) -> Self {
        Self {
            status: ValidationStatus::Undetermined,
            confidence: 0.0,
            message: message.into(),
            validated_at,
            details: None,
        }
    }

    /// A `0.5`-confidence undetermined result, for "provider returned an
    /// unmapped status" cases (distinct from outright transport failure).
    pub fn undetermined_semantic(message: impl Into<String>, validated_at: u64) -> Self {
        Self {
            status: ValidationStatus::Undetermined,
            confidence: 0.5,
            message: message.into(),
            validated_at,
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
