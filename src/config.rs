//! Engine configuration and its validation.
//!
//! An [`EngineConfig`] selects the relatedness variant and every numeric
//! knob of the power iterations. It deserializes from JSON with every field
//! optional; fields the schema does not know are captured so validation can
//! report them.
//!
//! # JSON shape
//!
//! ```json
//! {
//!   "alpha": 0.85,
//!   "beta": 0.5,
//!   "pagerank_threshold": 0.001,
//!   "sourced_threshold": 0.002,
//!   "max_iterations": 500,
//!   "variant": "decoupled_sourced",
//!   "baseline_transitions": "weighted",
//!   "strict": false
//! }
//! ```
//!
//! [`EngineConfig::validate`] reports every problem it finds, not just the
//! first one.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
pub use crate::pagerank::engine::Transitions;

/// Relatedness algorithm served by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Sourced PageRank over the graph's stored weights
    #[default]
    Sourced,
    /// Sourced PageRank propagating with uniform transitions
    DecoupledSourced,
    /// Personalized PageRank, uniform sink redistribution
    PersonalizedApproximate,
    /// Personalized PageRank, sink mass returned to the seeds
    PersonalizedExact,
}

impl Variant {
    /// Returns the name used in JSON and log output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sourced => "sourced",
            Self::DecoupledSourced => "decoupled_sourced",
            Self::PersonalizedApproximate => "personalized_approximate",
            Self::PersonalizedExact => "personalized_exact",
        }
    }

    /// Whether results are rescaled against the baseline
    pub fn is_sourced(&self) -> bool {
        matches!(self, Self::Sourced | Self::DecoupledSourced)
    }
}

/// Configuration of a [`RelatednessEngine`](crate::RelatednessEngine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Propagation weight; the jump weight is `1 - alpha`
    pub alpha: f64,
    /// Weight of the source vector in Sourced PageRank
    pub beta: f64,
    /// L1 threshold for the global baseline
    pub pagerank_threshold: f64,
    /// L1 threshold for source-biased runs
    pub sourced_threshold: f64,
    /// Iteration cap for every run
    pub max_iterations: usize,
    /// Relatedness algorithm
    pub variant: Variant,
    /// Transition model used to compute the cached baseline
    pub baseline_transitions: Transitions,
    /// If `true`, unrecognized fields are errors; if `false`, warnings.
    pub strict: bool,

    /// Captures any fields not recognized by the schema.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            alpha: 0.85,
            beta: 0.5,
            pagerank_threshold: 0.001,
            sourced_threshold: 0.002,
            max_iterations: 500,
            variant: Variant::Sourced,
            baseline_transitions: Transitions::Weighted,
            strict: false,
            unknown_fields: HashMap::new(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Serialize the configuration to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Set the propagation weight
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the source-vector weight
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Set the iteration cap
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the baseline convergence threshold
    pub fn with_pagerank_threshold(mut self, threshold: f64) -> Self {
        self.pagerank_threshold = threshold;
        self
    }

    /// Set the source-biased convergence threshold
    pub fn with_sourced_threshold(mut self, threshold: f64) -> Self {
        self.sourced_threshold = threshold;
        self
    }

    /// Select the relatedness variant
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Select the baseline transition model
    pub fn with_baseline_transitions(mut self, transitions: Transitions) -> Self {
        self.baseline_transitions = transitions;
        self
    }

    /// Check every field, returning errors and warnings in field order
    ///
    /// Unknown fields are errors in strict mode and warnings otherwise.
    pub fn validate(&self) -> Vec<ConfigDiagnostic> {
        let mut out = Vec::new();

        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            out.push(ConfigDiagnostic::error(
                "/alpha",
                format!("alpha must lie strictly between 0 and 1, got {}", self.alpha),
            ));
        }
        if !self.beta.is_finite() || self.beta < 0.0 {
            out.push(ConfigDiagnostic::error(
                "/beta",
                format!("beta must be finite and non-negative, got {}", self.beta),
            ));
        }

        for (field, value) in [
            ("pagerank_threshold", self.pagerank_threshold),
            ("sourced_threshold", self.sourced_threshold),
        ] {
            if !(value.is_finite() && value > 0.0) {
                out.push(ConfigDiagnostic::error(
                    format!("/{field}"),
                    format!("{field} must be a positive number, got {value}"),
                ));
            }
        }

        if self.max_iterations == 0 {
            out.push(ConfigDiagnostic::error(
                "/max_iterations",
                "max_iterations must be greater than 0",
            ));
        }

        let mut keys: Vec<&String> = self.unknown_fields.keys().collect();
        keys.sort();
        for key in keys {
            let severity = if self.strict {
                Severity::Error
            } else {
                Severity::Warning
            };
            out.push(ConfigDiagnostic {
                severity,
                path: format!("/{key}"),
                message: format!("unrecognized field \"{key}\""),
            });
        }

        out
    }

    /// Validate, failing with every error message joined together
    pub fn check(&self) -> Result<()> {
        let mut errors = Vec::new();
        for diagnostic in self.validate() {
            match diagnostic.severity {
                Severity::Warning => {
                    tracing::warn!(path = %diagnostic.path, "{}", diagnostic.message)
                }
                Severity::Error => errors.push(diagnostic.to_string()),
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidConfig(errors.join("; ")))
        }
    }
}

/// How bad a [`ConfigDiagnostic`] is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One problem found by [`EngineConfig::validate`]
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDiagnostic {
    pub severity: Severity,
    /// JSON pointer of the offending field
    pub path: String,
    pub message: String,
}

impl ConfigDiagnostic {
    fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}
