//! Agent configuration and its explicit validation step.
//!
//! [`AgentConfig`] is an immutable, value-equal description of which
//! reasoning strategy, model, and parameters an evaluation should use.
//! Construction only checks structural shape; business rules live in
//! [`AgentConfig::validate_configuration`], which reports findings as a
//! [`ValidationResult`] instead of failing, so misconfiguration surfaces
//! before any network call is made.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bounds for the `temperature` model parameter.
const TEMPERATURE_RANGE: (f64, f64) = (0.0, 2.0);

/// Immutable description of a reasoning agent to evaluate.
///
/// # Example
///
/// ```
/// use gauntlet_core::AgentConfig;
/// use serde_json::json;
///
/// let config = AgentConfig::new("chain_of_thought", "google", "gemini-3-flash-preview")
///     .with_model_parameter("temperature", json!(0.2));
///
/// let supported = vec!["none".to_string(), "chain_of_thought".to_string()];
/// assert!(config.validate_configuration(&supported).is_valid());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    agent_type: String,
    model_provider: String,
    model_name: String,
    #[serde(default)]
    model_parameters: HashMap<String, serde_json::Value>,
    #[serde(default)]
    agent_parameters: HashMap<String, serde_json::Value>,
}

impl AgentConfig {
    /// Create a configuration with empty parameter maps.
    pub fn new(
        agent_type: impl Into<String>,
        model_provider: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            agent_type: agent_type.into(),
            model_provider: model_provider.into(),
            model_name: model_name.into(),
            model_parameters: HashMap::new(),
            agent_parameters: HashMap::new(),
        }
    }

    /// Set a single model parameter (temperature, max_output_tokens, ...).
    #[must_use]
    pub fn with_model_parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.model_parameters.insert(key.into(), value);
        self
    }

    /// Replace the model parameter map.
    #[must_use]
    pub fn with_model_parameters(
        mut self,
        parameters: HashMap<String, serde_json::Value>,
    ) -> Self {
        self.model_parameters = parameters;
        self
    }

    /// Set a single strategy-specific parameter.
    #[must_use]
    pub fn with_agent_parameter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.agent_parameters.insert(key.into(), value);
        self
    }

    /// Replace the strategy-specific parameter map.
    #[must_use]
    pub fn with_agent_parameters(
        mut self,
        parameters: HashMap<String, serde_json::Value>,
    ) -> Self {
        self.agent_parameters = parameters;
        self
    }

    /// Registry key of the reasoning strategy to use.
    pub fn agent_type(&self) -> &str {
        &self.agent_type
    }

    /// Backend provider identifier (informational; routing happens in the gateway).
    pub fn model_provider(&self) -> &str {
        &self.model_provider
    }

    /// Model identifier passed to the gateway on every call.
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Model parameters forwarded to the gateway (temperature, token caps, ...).
    pub fn model_parameters(&self) -> &HashMap<String, serde_json::Value> {
        &self.model_parameters
    }

    /// Strategy-specific parameters read by the reasoning agent service.
    pub fn agent_parameters(&self) -> &HashMap<String, serde_json::Value> {
        &self.agent_parameters
    }

    /// Check business rules against the given set of supported agent types.
    ///
    /// Never fails; every finding lands in the returned [`ValidationResult`]:
    ///
    /// - `agent_type` must be one of `supported_types` (the error names the
    ///   offending type and lists the supported ones)
    /// - `temperature`, when present, must be a number in `[0, 2]`
    /// - `max_output_tokens`, when present, must be a positive integer
    ///
    /// A temperature above 1.0 is legal but produces a warning, since it
    /// makes accuracy comparisons between runs noisier.
    pub fn validate_configuration(&self, supported_types: &[String]) -> ValidationResult {
        let mut result = ValidationResult::default();

        if !supported_types.iter().any(|t| t == &self.agent_type) {
            result.errors.push(format!(
                "unsupported agent type '{}'; supported types: {}",
                self.agent_type,
                supported_types.join(", ")
            ));
        }

        match self.model_parameters.get("temperature") {
            Some(value) => match value.as_f64() {
                Some(temperature) => {
                    let (min, max) = TEMPERATURE_RANGE;
                    if !(min..=max).contains(&temperature) {
                        result.errors.push(format!(
                            "temperature {} is outside the allowed range [{}, {}]",
                            temperature, min, max
                        ));
                    } else if temperature > 1.0 {
                        result.warnings.push(format!(
                            "temperature {} is above 1.0; repeated runs may score differently",
                            temperature
                        ));
                    }
                }
                None => result
                    .errors
                    .push(format!("temperature must be a number, got {}", value)),
            },
            None => {}
        }

        if let Some(value) = self.model_parameters.get("max_output_tokens") {
            match value.as_u64() {
                Some(0) | None => result.errors.push(format!(
                    "max_output_tokens must be a positive integer, got {}",
                    value
                )),
                Some(_) => {}
            }
        }

        result
    }
}

/// Outcome of [`AgentConfig::validate_configuration`].
///
/// Errors make the configuration unusable; warnings are advisory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Rule violations, in the order they were detected.
    pub errors: Vec<String>,

    /// Non-fatal findings, in the order they were detected.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// A configuration is valid when no errors were recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}
