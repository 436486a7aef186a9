//! Parameter definition and implementation
//!
//! A [`Parameter`] is the fundamental fittable quantity of a project: a value
//! with bounds, a flag saying whether the engine may vary it, and a prior
//! used by the Bayesian procedures.

use serde::{Deserialize, Serialize};

use crate::classlist::Record;
use crate::models::enums::PriorType;
use crate::models::RecordError;

/// A named, bounded value that can be fitted
///
/// A *protected* parameter has the same shape, but once it is part of a
/// project it can never be removed or renamed away (the project's substrate
/// roughness is the canonical example).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameter {
    /// Name of the parameter, unique within its collection
    pub name: String,

    /// Lower bound
    pub min: f64,

    /// Current value
    pub value: f64,

    /// Upper bound
    pub max: f64,

    /// Whether the engine varies this parameter
    pub fit: bool,

    /// Prior distribution used by the Bayesian procedures
    pub prior_type: PriorType,

    /// Mean of a Gaussian prior
    pub mu: f64,

    /// Standard deviation of a Gaussian prior
    #[serde(with = "infinite_as_null")]
    pub sigma: f64,

    /// Whether the parameter is protected from removal
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub protected: bool,
}

impl Default for Parameter {
    fn default() -> Self {
        Self {
            name: String::new(),
            min: 0.0,
            value: 0.0,
            max: 0.0,
            fit: false,
            prior_type: PriorType::Uniform,
            mu: 0.0,
            sigma: f64::INFINITY,
            protected: false,
        }
    }
}

impl Parameter {
    /// Create a new parameter with the given name, bounds and value
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the parameter
    /// * `min` - Minimum allowed value
    /// * `value` - Initial value
    /// * `max` - Maximum allowed value
    /// * `fit` - Whether the engine may vary the parameter
    ///
    /// # Returns
    ///
    /// The parameter, or an error if `min > max` or the value lies outside
    /// the bounds
    ///
    /// # Examples
    ///
    /// ```
    /// use ratapi_rs::models::Parameter;
    ///
    /// let param = Parameter::new("Oxide Thickness", 5.0, 20.0, 60.0, true).unwrap();
    /// assert_eq!(param.name, "Oxide Thickness");
    /// assert!(param.fit);
    /// assert!(Parameter::new("Bad", 5.0, 1.0, 60.0, true).is_err());
    /// ```
    pub fn new(name: &str, min: f64, value: f64, max: f64, fit: bool) -> Result<Self, RecordError> {
        Self {
            name: name.to_string(),
            min,
            value,
            max,
            fit,
            ..Self::default()
        }
        .validated()
    }

    /// Create a parameter that can never be removed from its project.
    pub fn protected(
        name: &str,
        min: f64,
        value: f64,
        max: f64,
        fit: bool,
    ) -> Result<Self, RecordError> {
        let mut param = Self::new(name, min, value, max, fit)?;
        param.protected = true;
        Ok(param)
    }

    /// A parameter pinned at `value` that is not fitted.
    pub fn fixed(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            min: value,
            value,
            max: value,
            ..Self::default()
        }
    }

    /// Attach a prior distribution.
    pub fn with_prior(mut self, prior_type: PriorType, mu: f64, sigma: f64) -> Self {
        self.prior_type = prior_type;
        self.mu = mu;
        self.sigma = sigma;
        self
    }

    /// Whether `value` lies within the bounds of this parameter
    pub fn is_within_bounds(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp `value` into the bounds of this parameter
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    /// The `[min, max]` pair handed to the engine.
    pub fn limits(&self) -> [f64; 2] {
        [self.min, self.max]
    }
}

impl Record for Parameter {
    const KINDS: &'static [&'static str] = &["Parameter"];
    const DEFAULT_NAME: &'static str = "New Parameter";

    fn kind(&self) -> &'static str {
        "Parameter"
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn text_fields(&self) -> Vec<(&'static str, &str)> {
        vec![("name", self.name.as_str())]
    }

    fn replace_text(&mut self, field: &str, old: &str, new: &str) -> bool {
        if field == "name" && crate::classlist::names_match(&self.name, old) {
            self.name = new.to_string();
            return true;
        }
        false
    }

    fn validated(self) -> Result<Self, RecordError> {
        if self.min > self.max {
            return Err(RecordError::InvalidBounds {
                name: self.name,
                min: self.min,
                max: self.max,
            });
        }
        if !self.is_within_bounds(self.value) {
            return Err(RecordError::ValueOutsideBounds {
                name: self.name,
                value: self.value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(self)
    }
}

/// Serialise infinite floats as `null` so they survive a JSON round trip.
pub(crate) mod infinite_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if value.is_infinite() && value.is_sign_positive() {
            serializer.serialize_none()
        } else {
            serializer.serialize_some(value)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<f64>::deserialize(deserializer)?;
        Ok(value.unwrap_or(f64::INFINITY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parameter_creation() {
        let param = Parameter::new("Substrate Roughness", 1.0, 3.0, 5.0, true).unwrap();
        assert_eq!(param.name, "Substrate Roughness");
        assert_eq!(param.limits(), [1.0, 5.0]);
        assert_eq!(param.prior_type, PriorType::Uniform);
        assert!(param.sigma.is_infinite());
        assert!(!param.protected);

        let param = Parameter::protected("Substrate Roughness", 1.0, 3.0, 5.0, true).unwrap();
        assert!(param.protected);

        let param = Parameter::fixed("SLD Air", 0.0);
        assert_eq!(param.limits(), [0.0, 0.0]);
        assert!(!param.fit);
    }

    #[test]
    fn test_parameter_bounds() {
        let err = Parameter::new("Thickness", 10.0, 20.0, 5.0, false).unwrap_err();
        assert!(matches!(err, RecordError::InvalidBounds { .. }));

        let err = Parameter::new("Thickness", 10.0, 20.0, 15.0, false).unwrap_err();
        assert!(matches!(err, RecordError::ValueOutsideBounds { .. }));

        let param = Parameter::new("Thickness", 10.0, 12.0, 15.0, false).unwrap();
        assert!(param.is_within_bounds(15.0));
        assert!(!param.is_within_bounds(15.5));
        assert_eq!(param.clamp(20.0), 15.0);
        assert_eq!(param.clamp(-1.0), 10.0);
    }

    #[test]
    fn test_from_fields_uses_defaults() {
        let fields = json!({"name": "Roughness", "max": 2.0, "value": 1.0})
            .as_object()
            .unwrap()
            .clone();
        let param = Parameter::from_fields("Parameter", fields).unwrap();
        assert_eq!(param.min, 0.0);
        assert_eq!(param.value, 1.0);
        assert!(param.sigma.is_infinite());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let fields = json!({"name": "Roughness", "vary": true})
            .as_object()
            .unwrap()
            .clone();
        let err = Parameter::from_fields("Parameter", fields).unwrap_err();
        assert!(matches!(err, RecordError::InvalidFields { .. }));
    }

    #[test]
    fn test_infinite_sigma_survives_fields() {
        let param = Parameter::new("Thickness", 0.0, 1.0, 2.0, true).unwrap();
        let fields = param.to_fields().unwrap();
        assert!(fields["sigma"].is_null());
        assert!(!fields.contains_key("protected"));

        let rebuilt = Parameter::from_fields("Parameter", fields).unwrap();
        assert_eq!(rebuilt, param);
    }
}
