//! Experiment Store - persistence contract for experiment data
//!
//! Assignment and analysis never touch storage directly; they are generic
//! over this trait so any backend (SQL, KV, in-memory) can be injected.

use std::future::Future;

use super::{
    AssignmentRecord, ConversionRecord, ExperimentRecord, ExperimentStatus, ExposureRecord,
};
use crate::Result;

/// Persistence layer for experiments, assignments and tracking events.
///
/// ## Contract
///
/// - `insert_assignment` must be atomic with respect to the
///   (experiment, client) uniqueness check and fail with
///   `Error::DuplicateAssignment` when a row already exists.
/// - Exposures and conversions are append-only.
/// - Counts may lag concurrent appends (eventual consistency is fine).
/// - Backend failures surface as `Error::Store`.
pub trait ExperimentStore: Send + Sync {
    /// Get an experiment (with its variants) by ID.
    fn get_experiment(
        &self,
        experiment_id: &str,
    ) -> impl Future<Output = Result<Option<ExperimentRecord>>> + Send;

    /// Persist a new experiment.
    ///
    /// Fails with `Error::InvalidState` if the ID is taken.
    fn create_experiment(
        &self,
        experiment: ExperimentRecord,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Apply a lifecycle transition (see `ExperimentRecord::transition`).
    ///
    /// Fails with `Error::NotFound` if the experiment doesn't exist and
    /// `Error::InvalidState` if the step is illegal. Check and write must
    /// happen atomically.
    fn transition_status(
        &self,
        experiment_id: &str,
        next: ExperimentStatus,
    ) -> impl Future<Output = Result<ExperimentRecord>> + Send;

    /// Get the assignment for a client, if any.
    fn get_assignment(
        &self,
        experiment_id: &str,
        client_id: &str,
    ) -> impl Future<Output = Result<Option<AssignmentRecord>>> + Send;

    /// Insert a new assignment, enforcing (experiment, client) uniqueness.
    fn insert_assignment(
        &self,
        assignment: AssignmentRecord,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Append an exposure event.
    fn append_exposure(&self, exposure: ExposureRecord) -> impl Future<Output = Result<()>> + Send;

    /// Append a conversion event.
    fn append_conversion(
        &self,
        conversion: ConversionRecord,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Number of distinct clients exposed to a variant.
    fn count_exposures(
        &self,
        experiment_id: &str,
        variant_id: &str,
    ) -> impl Future<Output = Result<u64>> + Send;

    /// Number of conversion events recorded for a variant.
    fn count_conversions(
        &self,
        experiment_id: &str,
        variant_id: &str,
    ) -> impl Future<Output = Result<u64>> + Send;
}
