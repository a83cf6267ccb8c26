//! Sticky weighted variant assignment
//!
//! A client's first request for an experiment draws a variant from the
//! weight distribution and persists it; every later request returns the
//! stored variant. The store is the only source of truth, so assignments are
//! consistent across processes and devices that share it.

use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use crate::experiment::{
    AssignmentRecord, ExperimentRecord, ExperimentStore, ExposureRecord, VariantRecord,
};
use crate::{Error, Result};

/// Pick a variant for a uniform draw in `[0, 1)`.
///
/// Weights are normalized into a cumulative distribution in variant order and
/// the first variant whose cumulative share exceeds `draw` wins. Zero-weight
/// variants are never picked. If rounding leaves the final cumulative share
/// just under `draw`, the last positively weighted variant is returned.
///
/// # Errors
///
/// - `Error::NotFound` if `variants` is empty
/// - `Error::InvalidState` if the weights sum to zero (or are not finite)
///
/// # Example
///
/// ```rust
/// use trueno_ab::assignment::select_variant;
/// use trueno_ab::experiment::VariantRecord;
///
/// let variants = vec![
///     VariantRecord::new("a", "exp", "A", 1.0),
///     VariantRecord::new("b", "exp", "B", 3.0),
/// ];
/// assert_eq!(select_variant(&variants, 0.10)?.variant_id(), "a");
/// assert_eq!(select_variant(&variants, 0.25)?.variant_id(), "b");
/// # Ok::<(), trueno_ab::Error>(())
/// ```
pub fn select_variant(variants: &[VariantRecord], draw: f64) -> Result<&VariantRecord> {
    if variants.is_empty() {
        return Err(Error::NotFound("no variants to select from".to_string()));
    }

    // Scale by the largest weight first so huge finite weights can't overflow the sum
    let max = variants
        .iter()
        .map(VariantRecord::weight)
        .fold(0.0_f64, f64::max);
    if !(max.is_finite() && max > 0.0) {
        return Err(Error::InvalidState(format!(
            "largest variant weight is {max}; assignment needs a positive total"
        )));
    }
    let total: f64 = variants.iter().map(|v| v.weight() / max).sum();
    let threshold = draw * total;

    let mut cumulative = 0.0;
    for variant in variants {
        cumulative += variant.weight() / max;
        if cumulative > threshold {
            return Ok(variant);
        }
    }

    variants
        .iter()
        .rev()
        .find(|v| v.weight() > 0.0)
        .ok_or_else(|| Error::InvalidState("no positively weighted variant".to_string()))
}

/// Assigns clients to experiment variants through an injected store.
///
/// The random source is owned by the assigner; seed it for reproducible
/// assignment sequences in tests and simulations.
pub struct VariantAssigner<S> {
    store: Arc<S>,
    rng: Mutex<StdRng>,
}

impl<S: ExperimentStore> VariantAssigner<S> {
    /// Create an assigner drawing from OS entropy.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create an assigner with a fixed RNG seed.
    #[must_use]
    pub fn with_seed(store: Arc<S>, seed: u64) -> Self {
        Self {
            store,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Get the backing store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Return the client's variant, assigning one on first contact.
    ///
    /// A new assignment also records an exposure. That write is best-effort:
    /// failure is logged and the variant is still returned.
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` if the experiment is unknown or has no variants
    /// - `Error::InvalidState` if the weights sum to zero, the experiment is
    ///   stopped (new clients only), or a stored assignment names a variant
    ///   outside the experiment
    /// - Store errors, unchanged
    pub async fn assign(&self, experiment_id: &str, client_id: &str) -> Result<String> {
        let experiment = self
            .store
            .get_experiment(experiment_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("experiment '{experiment_id}'")))?;

        if experiment.variants().is_empty() {
            return Err(Error::NotFound(format!(
                "experiment '{experiment_id}' has no variants"
            )));
        }

        if let Some(existing) = self.store.get_assignment(experiment_id, client_id).await? {
            return owned_variant(&experiment, &existing);
        }

        if !experiment.status().accepts_new_clients() {
            return Err(Error::InvalidState(format!(
                "experiment '{experiment_id}' is {} and accepts no new clients",
                experiment.status()
            )));
        }

        let draw = self.draw();
        let variant_id = select_variant(experiment.variants(), draw)?
            .variant_id()
            .to_string();

        let assignment = AssignmentRecord::new(experiment_id, client_id, variant_id.clone());
        match self.store.insert_assignment(assignment).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate_assignment() => {
                warn!(experiment_id, client_id, "concurrent assignment won; re-reading");
                let winner = self
                    .store
                    .get_assignment(experiment_id, client_id)
                    .await?
                    .ok_or_else(|| {
                        Error::Store(format!(
                            "assignment for client '{client_id}' in '{experiment_id}' \
                             reported as duplicate but not readable"
                        ))
                    })?;
                return owned_variant(&experiment, &winner);
            }
            Err(e) => return Err(e),
        }

        debug!(experiment_id, client_id, variant_id = %variant_id, draw, "assigned variant");

        let exposure = ExposureRecord::new(experiment_id, variant_id.clone(), client_id);
        if let Err(e) = self.store.append_exposure(exposure).await {
            warn!(
                experiment_id,
                client_id,
                variant_id = %variant_id,
                error = %e,
                "failed to record exposure for new assignment"
            );
        }

        Ok(variant_id)
    }

    fn draw(&self) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen::<f64>()
    }
}

fn owned_variant(experiment: &ExperimentRecord, assignment: &AssignmentRecord) -> Result<String> {
    experiment
        .variant(assignment.variant_id())
        .map(|v| v.variant_id().to_string())
        .ok_or_else(|| {
            Error::InvalidState(format!(
                "client '{}' is assigned variant '{}', which is not part of experiment '{}'",
                assignment.client_id(),
                assignment.variant_id(),
                experiment.experiment_id()
            ))
        })
}
