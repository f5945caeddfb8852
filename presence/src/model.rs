//! Boundary to the learned presence model.

use crate::{ClassifierError, FEATURE_COUNT};

/// A binary classifier over the 14-scalar window feature vector.
///
/// `predict` is synchronous and cheap; it runs on the coordinating context.
pub trait PresenceModel: Send {
    /// `true` = the device is with the user.
    fn predict(&self, features: &[f64]) -> Result<bool, ClassifierError>;

    /// Human-readable name of this model.
    fn name(&self) -> &str;
}

impl<M: PresenceModel + ?Sized> PresenceModel for Box<M> {
    fn predict(&self, features: &[f64]) -> Result<bool, ClassifierError> {
        (**self).predict(features)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Reject vectors of the wrong length or with non-finite entries.
pub fn validate_features(features: &[f64]) -> Result<(), ClassifierError> {
    if features.len() != FEATURE_COUNT {
        return Err(ClassifierError::MalformedInput(format!(
            "expected {FEATURE_COUNT} features, got {}",
            features.len()
        )));
    }
    if let Some(i) = features.iter().position(|v| !v.is_finite()) {
        return Err(ClassifierError::MalformedInput(format!(
            "feature {i} is not finite"
        )));
    }
    Ok(())
}

/// Trusts the variance gate alone: every window that reaches the model is
/// "with user". Used when no trained model is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct GateOnlyModel;

impl PresenceModel for GateOnlyModel {
    fn predict(&self, features: &[f64]) -> Result<bool, ClassifierError> {
        validate_features(features)?;
        Ok(true)
    }

    fn name(&self) -> &str {
        "gate-only"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_length_is_malformed() {
        let err = GateOnlyModel.predict(&[0.0; 13]).unwrap_err();
        assert!(matches!(err, ClassifierError::MalformedInput(_)));
    }

    #[test]
    fn nan_is_malformed() {
        let mut features = [0.0; FEATURE_COUNT];
        features[5] = f64::NAN;
        assert!(GateOnlyModel.predict(&features).is_err());
    }

    #[test]
    fn boxed_model_delegates() {
        let model: Box<dyn PresenceModel> = Box::new(GateOnlyModel);
        assert_eq!(model.predict(&[0.0; FEATURE_COUNT]), Ok(true));
        assert_eq!(model.name(), "gate-only");
    }
}
