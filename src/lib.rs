//! # Trueno-AB: Sticky A/B Assignment and Conversion Analysis
//!
//! Trueno-AB assigns clients to weighted experiment variants, keeps those
//! assignments stable, and reports per-variant conversion rates with 95%
//! confidence intervals. Persistence is injected through the
//! [`experiment::ExperimentStore`] trait; [`experiment::MemoryExperimentStore`]
//! ships as the default backend.
//!
//! ## Design Principles
//!
//! - **Single source of truth**: assignments live in the store, never in
//!   process-local caches
//! - **Write races resolve to the first writer**: a uniqueness violation on
//!   insert means "re-read", not "fail"
//! - **Analysis is read-only**: it never mutates tracking data
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use trueno_ab::Experiments;
//! use trueno_ab::experiment::{ExperimentRecord, MemoryExperimentStore};
//!
//! # async fn example() -> trueno_ab::Result<()> {
//! let experiments = Experiments::builder(Arc::new(MemoryExperimentStore::new()))
//!     .seed(42)
//!     .build();
//!
//! experiments
//!     .create_experiment(
//!         ExperimentRecord::builder("checkout", "Checkout button")
//!             .variant("control", "Blue", 1.0)
//!             .variant("green", "Green", 1.0)
//!             .build(),
//!     )
//!     .await?;
//! experiments.start_experiment("checkout").await?;
//!
//! let variant = experiments.assign("checkout", "client-1").await?;
//! experiments.track_conversion("checkout", "client-1", "purchase").await?;
//!
//! for result in experiments.analyze("checkout").await? {
//!     println!("{}: {:.1}%", result.variant_id, result.conversion_rate * 100.0);
//! }
//! # let _ = variant;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod analysis;
pub mod assignment;
pub mod config;
pub mod error;
pub mod experiment;
pub mod logging;

use std::sync::Arc;

use tracing::info;

pub use analysis::{AnalysisResult, VariantComparison};
pub use config::Config;
pub use error::{Error, Result};

use analysis::ConversionAnalyzer;
use assignment::VariantAssigner;
use experiment::{
    AssignmentRecord, ConversionRecord, ExperimentRecord, ExperimentStatus, ExperimentStore,
    ExposureRecord,
};

/// Experiment service bound to one store.
///
/// Owns a [`VariantAssigner`] and a [`ConversionAnalyzer`] sharing the same
/// store, plus the lifecycle and tracking operations around them.
pub struct Experiments<S> {
    store: Arc<S>,
    assigner: VariantAssigner<S>,
    analyzer: ConversionAnalyzer<S>,
}

impl<S: ExperimentStore> Experiments<S> {
    /// Create a new service builder over `store`.
    #[must_use]
    pub fn builder(store: Arc<S>) -> ExperimentsBuilder<S> {
        ExperimentsBuilder::new(store)
    }

    /// Get the backing store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Register a new experiment.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` if the record fails validation or the ID
    /// is already taken.
    pub async fn create_experiment(&self, experiment: ExperimentRecord) -> Result<()> {
        experiment.validate()?;
        let experiment_id = experiment.experiment_id().to_string();
        let variants = experiment.variants().len();
        self.store.create_experiment(experiment).await?;
        info!(experiment_id = %experiment_id, variants, "experiment created");
        Ok(())
    }

    /// Move a draft experiment to running.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` for an unknown ID, `Error::InvalidState` unless the
    /// experiment is a draft.
    pub async fn start_experiment(&self, experiment_id: &str) -> Result<ExperimentRecord> {
        self.transition(experiment_id, ExperimentStatus::Running).await
    }

    /// Stop a running experiment. Existing assignments remain readable.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` for an unknown ID, `Error::InvalidState` unless the
    /// experiment is running.
    pub async fn stop_experiment(&self, experiment_id: &str) -> Result<ExperimentRecord> {
        self.transition(experiment_id, ExperimentStatus::Stopped).await
    }

    async fn transition(
        &self,
        experiment_id: &str,
        next: ExperimentStatus,
    ) -> Result<ExperimentRecord> {
        let record = self.store.transition_status(experiment_id, next).await?;
        info!(experiment_id, status = %next, "experiment status changed");
        Ok(record)
    }

    /// Return the client's variant, assigning one on first contact.
    ///
    /// # Errors
    ///
    /// See [`VariantAssigner::assign`].
    pub async fn assign(&self, experiment_id: &str, client_id: &str) -> Result<String> {
        self.assigner.assign(experiment_id, client_id).await
    }

    /// Record another exposure for an already assigned client.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if the client has no assignment in the experiment;
    /// store errors pass through.
    pub async fn record_exposure(&self, experiment_id: &str, client_id: &str) -> Result<()> {
        let assignment = self.require_assignment(experiment_id, client_id).await?;
        self.store
            .append_exposure(ExposureRecord::new(
                experiment_id,
                assignment.variant_id(),
                client_id,
            ))
            .await
    }

    /// Attribute a goal conversion to the client's assigned variant.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` if the client has no assignment in the experiment;
    /// store errors pass through.
    pub async fn track_conversion(
        &self,
        experiment_id: &str,
        client_id: &str,
        goal: &str,
    ) -> Result<()> {
        let assignment = self.require_assignment(experiment_id, client_id).await?;
        self.store
            .append_conversion(ConversionRecord::new(
                experiment_id,
                assignment.variant_id(),
                client_id,
                goal,
            ))
            .await
    }

    async fn require_assignment(
        &self,
        experiment_id: &str,
        client_id: &str,
    ) -> Result<AssignmentRecord> {
        self.store
            .get_assignment(experiment_id, client_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "client '{client_id}' has no assignment in experiment '{experiment_id}'"
                ))
            })
    }

    /// Per-variant conversion statistics.
    ///
    /// # Errors
    ///
    /// See [`ConversionAnalyzer::analyze`].
    pub async fn analyze(&self, experiment_id: &str) -> Result<Vec<AnalysisResult>> {
        self.analyzer.analyze(experiment_id).await
    }

    /// Compare each variant with the control (first) variant.
    ///
    /// # Errors
    ///
    /// See [`ConversionAnalyzer::compare_to_control`].
    pub async fn compare_to_control(&self, experiment_id: &str) -> Result<Vec<VariantComparison>> {
        self.analyzer.compare_to_control(experiment_id).await
    }
}

/// Experiment service builder
pub struct ExperimentsBuilder<S> {
    store: Arc<S>,
    config: Config,
}

impl<S: ExperimentStore> ExperimentsBuilder<S> {
    /// Create a builder with default configuration.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: Config::default(),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Fix the assignment RNG seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Build the service.
    #[must_use]
    pub fn build(self) -> Experiments<S> {
        let assigner = match self.config.seed {
            Some(seed) => VariantAssigner::with_seed(Arc::clone(&self.store), seed),
            None => VariantAssigner::new(Arc::clone(&self.store)),
        };
        Experiments {
            analyzer: ConversionAnalyzer::new(Arc::clone(&self.store)),
            assigner,
            store: self.store,
        }
    }
}
