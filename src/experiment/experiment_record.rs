//! Experiment Record - root entity for A/B experiments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::VariantRecord;
use crate::{Error, Result};

/// Lifecycle status of an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    /// Configured but not yet live. Assignment is allowed for previews.
    Draft,
    /// Live: clients are enrolled and tracked.
    Running,
    /// Closed to new clients. Existing assignments stay sticky.
    Stopped,
}

impl ExperimentStatus {
    /// Get status name as string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }

    /// Whether new clients may be assigned a variant.
    #[must_use]
    pub const fn accepts_new_clients(&self) -> bool {
        !matches!(self, Self::Stopped)
    }

    /// Whether `self -> next` is a legal lifecycle step.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Running) | (Self::Running, Self::Stopped)
        )
    }
}

impl std::fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Experiment Record represents a named A/B test.
///
/// Variants are kept in their configured order; that order defines the
/// cumulative distribution used for weighted assignment, and the first
/// variant acts as the control in comparisons.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentRecord {
    experiment_id: String,
    name: String,
    status: ExperimentStatus,
    created_at: DateTime<Utc>,
    variants: Vec<VariantRecord>,
}

impl ExperimentRecord {
    /// Create a new draft experiment with no variants.
    ///
    /// # Arguments
    ///
    /// * `experiment_id` - Unique identifier for the experiment
    /// * `name` - Human-readable name for the experiment
    #[must_use]
    pub fn new(experiment_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            name: name.into(),
            status: ExperimentStatus::Draft,
            created_at: Utc::now(),
            variants: Vec::new(),
        }
    }

    /// Create a builder for constructing an experiment with variants.
    #[must_use]
    pub fn builder(
        experiment_id: impl Into<String>,
        name: impl Into<String>,
    ) -> ExperimentRecordBuilder {
        ExperimentRecordBuilder::new(experiment_id, name)
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ExperimentStatus {
        self.status
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get the variants in configured order.
    #[must_use]
    pub fn variants(&self) -> &[VariantRecord] {
        &self.variants
    }

    /// Look up a variant by ID.
    #[must_use]
    pub fn variant(&self, variant_id: &str) -> Option<&VariantRecord> {
        self.variants.iter().find(|v| v.variant_id() == variant_id)
    }

    /// Sum of all variant weights.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.variants.iter().map(VariantRecord::weight).sum()
    }

    /// Whether some variant carries a positive weight, i.e. the weight sum
    /// is > 0 for non-negative weights (without summing, which can overflow).
    #[must_use]
    pub fn has_positive_weight(&self) -> bool {
        self.variants.iter().any(|v| v.weight() > 0.0)
    }

    fn ensure_runnable(&self) -> Result<()> {
        if self.variants.is_empty() {
            return Err(Error::InvalidState(format!(
                "experiment '{}' cannot run without variants",
                self.experiment_id
            )));
        }
        if !self.has_positive_weight() {
            return Err(Error::InvalidState(format!(
                "experiment '{}' cannot run with zero total weight",
                self.experiment_id
            )));
        }
        Ok(())
    }

    /// Move to `next` status.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` unless the step is `draft -> running`
    /// or `running -> stopped`, or when starting an experiment that has no
    /// variants or a zero weight sum.
    pub fn transition(&mut self, next: ExperimentStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(Error::InvalidState(format!(
                "experiment '{}' cannot move from {} to {next}",
                self.experiment_id, self.status
            )));
        }
        if next == ExperimentStatus::Running {
            self.ensure_runnable()?;
        }
        self.status = next;
        Ok(())
    }

    /// Check the structural invariants of this record.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` when a variant belongs to another
    /// experiment, a variant ID repeats, a weight is negative or not finite,
    /// or the record is running without variants or positive weight.
    pub fn validate(&self) -> Result<()> {
        for (i, variant) in self.variants.iter().enumerate() {
            if variant.experiment_id() != self.experiment_id {
                return Err(Error::InvalidState(format!(
                    "variant '{}' belongs to experiment '{}', not '{}'",
                    variant.variant_id(),
                    variant.experiment_id(),
                    self.experiment_id
                )));
            }
            if !variant.weight().is_finite() || variant.weight() < 0.0 {
                return Err(Error::InvalidState(format!(
                    "variant '{}' has invalid weight {}",
                    variant.variant_id(),
                    variant.weight()
                )));
            }
            if self.variants[..i]
                .iter()
                .any(|v| v.variant_id() == variant.variant_id())
            {
                return Err(Error::InvalidState(format!(
                    "duplicate variant '{}' in experiment '{}'",
                    variant.variant_id(),
                    self.experiment_id
                )));
            }
        }
        if self.status == ExperimentStatus::Running {
            self.ensure_runnable()?;
        }
        Ok(())
    }
}

/// Builder for `ExperimentRecord`.
#[derive(Debug)]
pub struct ExperimentRecordBuilder {
    experiment_id: String,
    name: String,
    status: ExperimentStatus,
    created_at: DateTime<Utc>,
    variants: Vec<VariantRecord>,
}

impl ExperimentRecordBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(experiment_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            name: name.into(),
            status: ExperimentStatus::Draft,
            created_at: Utc::now(),
            variants: Vec::new(),
        }
    }

    /// Append a variant owned by this experiment.
    #[must_use]
    pub fn variant(
        mut self,
        variant_id: impl Into<String>,
        name: impl Into<String>,
        weight: f64,
    ) -> Self {
        let variant = VariantRecord::new(variant_id, self.experiment_id.clone(), name, weight);
        self.variants.push(variant);
        self
    }

    /// Append a pre-built variant record (ownership is checked by `validate`).
    #[must_use]
    pub fn variant_record(mut self, variant: VariantRecord) -> Self {
        self.variants.push(variant);
        self
    }

    /// Set the initial status.
    #[must_use]
    pub const fn status(mut self, status: ExperimentStatus) -> Self {
        self.status = status;
        self
    }

    /// Set a custom creation timestamp (useful for deserialization/testing).
    #[must_use]
    pub const fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Build the `ExperimentRecord`.
    #[must_use]
    pub fn build(self) -> ExperimentRecord {
        ExperimentRecord {
            experiment_id: self.experiment_id,
            name: self.name,
            status: self.status,
            created_at: self.created_at,
            variants: self.variants,
        }
    }
}
