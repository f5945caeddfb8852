//! Nullable presence model.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use proxima_presence::{ClassifierError, PresenceModel, FEATURE_COUNT};

/// Answers with scripted labels, then a constant.
#[derive(Clone)]
pub struct NullPresenceModel {
    script: Arc<Mutex<VecDeque<Result<bool, ClassifierError>>>>,
    fallback: Result<bool, ClassifierError>,
    calls: Arc<AtomicUsize>,
}

impl NullPresenceModel {
    pub fn constant(with_user: bool) -> Self {
        Self {
            script: Arc::default(),
            fallback: Ok(with_user),
            calls: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            script: Arc::default(),
            fallback: Err(ClassifierError::Model("null model failure".into())),
            calls: Arc::default(),
        }
    }

    /// Answer `labels` first, in order, then `fallback`.
    pub fn scripted(labels: Vec<Result<bool, ClassifierError>>, fallback: bool) -> Self {
        Self {
            script: Arc::new(Mutex::new(labels.into())),
            fallback: Ok(fallback),
            calls: Arc::default(),
        }
    }

    /// Number of windows that reached the model.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PresenceModel for NullPresenceModel {
    fn predict(&self, features: &[f64]) -> Result<bool, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if features.len() != FEATURE_COUNT {
            return Err(ClassifierError::MalformedInput(format!(
                "expected {FEATURE_COUNT} features, got {}",
                features.len()
            )));
        }
        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }

    fn name(&self) -> &str {
        "null-model"
    }
}
