//! In-memory experiment store using `DashMap`.
//!
//! This is the default backend - data is lost on process restart.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rustc_hash::FxHashSet;

use super::{
    AssignmentRecord, ConversionRecord, ExperimentRecord, ExperimentStatus, ExperimentStore,
    ExposureRecord,
};
use crate::{Error, Result};

type PairKey = (String, String);

fn pair(a: &str, b: &str) -> PairKey {
    (a.to_string(), b.to_string())
}

/// In-memory experiment store backed by lock-free concurrent hashmaps.
///
/// Assignments are keyed by (experiment, client); the `DashMap` entry API
/// makes the uniqueness check and insert a single atomic step. Tracking
/// events are bucketed by (experiment, variant) so counts never scan other
/// variants.
///
/// # Example
///
/// ```rust
/// use trueno_ab::experiment::{ExperimentRecord, ExperimentStore, MemoryExperimentStore};
///
/// # async fn example() -> trueno_ab::Result<()> {
/// let store = MemoryExperimentStore::new();
/// let experiment = ExperimentRecord::builder("checkout", "Checkout button")
///     .variant("control", "Blue", 1.0)
///     .build();
/// store.create_experiment(experiment).await?;
/// assert!(store.get_experiment("checkout").await?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryExperimentStore {
    experiments: DashMap<String, ExperimentRecord>,
    assignments: DashMap<PairKey, AssignmentRecord>,
    exposures: DashMap<PairKey, Vec<ExposureRecord>>,
    conversions: DashMap<PairKey, Vec<ConversionRecord>>,
}

impl MemoryExperimentStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the store is empty (no experiments, assignments or events).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
            && self.assignments.is_empty()
            && self.exposures.is_empty()
            && self.conversions.is_empty()
    }

    /// Get the number of experiments in the store.
    #[must_use]
    pub fn experiment_count(&self) -> usize {
        self.experiments.len()
    }

    /// Get the number of assignments across all experiments.
    #[must_use]
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// Get the raw number of exposure events (not deduplicated).
    #[must_use]
    pub fn exposure_event_count(&self) -> usize {
        self.exposures.iter().map(|entry| entry.value().len()).sum()
    }

    /// Get the raw number of conversion events.
    #[must_use]
    pub fn conversion_event_count(&self) -> usize {
        self.conversions.iter().map(|entry| entry.value().len()).sum()
    }

    /// Clear all data.
    pub fn clear(&self) {
        self.experiments.clear();
        self.assignments.clear();
        self.exposures.clear();
        self.conversions.clear();
    }
}

impl ExperimentStore for MemoryExperimentStore {
    async fn get_experiment(&self, experiment_id: &str) -> Result<Option<ExperimentRecord>> {
        Ok(self.experiments.get(experiment_id).map(|e| e.value().clone()))
    }

    async fn create_experiment(&self, experiment: ExperimentRecord) -> Result<()> {
        match self.experiments.entry(experiment.experiment_id().to_string()) {
            Entry::Occupied(existing) => Err(Error::InvalidState(format!(
                "experiment '{}' already exists",
                existing.key()
            ))),
            Entry::Vacant(slot) => {
                slot.insert(experiment);
                Ok(())
            }
        }
    }

    async fn transition_status(
        &self,
        experiment_id: &str,
        next: ExperimentStatus,
    ) -> Result<ExperimentRecord> {
        let mut record = self
            .experiments
            .get_mut(experiment_id)
            .ok_or_else(|| Error::NotFound(format!("experiment '{experiment_id}'")))?;
        record.transition(next)?;
        Ok(record.value().clone())
    }

    async fn get_assignment(
        &self,
        experiment_id: &str,
        client_id: &str,
    ) -> Result<Option<AssignmentRecord>> {
        Ok(self
            .assignments
            .get(&pair(experiment_id, client_id))
            .map(|a| a.value().clone()))
    }

    async fn insert_assignment(&self, assignment: AssignmentRecord) -> Result<()> {
        let key = pair(assignment.experiment_id(), assignment.client_id());
        match self.assignments.entry(key) {
            Entry::Occupied(existing) => Err(Error::DuplicateAssignment {
                experiment_id: existing.key().0.clone(),
                client_id: existing.key().1.clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(assignment);
                Ok(())
            }
        }
    }

    async fn append_exposure(&self, exposure: ExposureRecord) -> Result<()> {
        let key = pair(exposure.experiment_id(), exposure.variant_id());
        self.exposures.entry(key).or_default().push(exposure);
        Ok(())
    }

    async fn append_conversion(&self, conversion: ConversionRecord) -> Result<()> {
        let key = pair(conversion.experiment_id(), conversion.variant_id());
        self.conversions.entry(key).or_default().push(conversion);
        Ok(())
    }

    async fn count_exposures(&self, experiment_id: &str, variant_id: &str) -> Result<u64> {
        let distinct = self
            .exposures
            .get(&pair(experiment_id, variant_id))
            .map_or(0, |events| {
                events
                    .iter()
                    .map(ExposureRecord::client_id)
                    .collect::<FxHashSet<_>>()
                    .len()
            });
        Ok(distinct as u64)
    }

    async fn count_conversions(&self, experiment_id: &str, variant_id: &str) -> Result<u64> {
        let count = self
            .conversions
            .get(&pair(experiment_id, variant_id))
            .map_or(0, |events| events.len());
        Ok(count as u64)
    }
}
