//! Variant Record - one treatment arm of an experiment

use serde::{Deserialize, Serialize};

/// Variant Record represents a single arm with a relative traffic weight.
///
/// Weights are relative: `[1, 1]` and `[50, 50]` split traffic the same way.
/// A zero weight keeps the arm configured but never assigns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariantRecord {
    variant_id: String,
    experiment_id: String,
    name: String,
    weight: f64,
}

impl VariantRecord {
    /// Create a new variant record.
    ///
    /// # Arguments
    ///
    /// * `variant_id` - Identifier, unique within the experiment
    /// * `experiment_id` - ID of the owning experiment
    /// * `name` - Display name
    /// * `weight` - Relative traffic weight (non-negative)
    #[must_use]
    pub fn new(
        variant_id: impl Into<String>,
        experiment_id: impl Into<String>,
        name: impl Into<String>,
        weight: f64,
    ) -> Self {
        Self {
            variant_id: variant_id.into(),
            experiment_id: experiment_id.into(),
            name: name.into(),
            weight,
        }
    }

    /// Get the variant ID.
    #[must_use]
    pub fn variant_id(&self) -> &str {
        &self.variant_id
    }

    /// Get the owning experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the relative weight.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }
}
