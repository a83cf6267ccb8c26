//! Experiment Data Model and Persistence
//!
//! Records are plain serde structs; storage is abstracted behind the
//! [`ExperimentStore`] trait so the assignment and analysis layers can run
//! against any backend.
//!
//! ## Schema Overview
//!
//! ```text
//! ExperimentRecord (1) ──< VariantRecord (N) [ordered, weighted]
//!        │
//!        ├──< AssignmentRecord (N) [unique per client]
//!        ├──< ExposureRecord (N)   [append-only]
//!        └──< ConversionRecord (N) [append-only]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use trueno_ab::experiment::{ExperimentRecord, ExperimentStatus};
//!
//! let mut experiment = ExperimentRecord::builder("checkout", "Checkout button")
//!     .variant("control", "Blue", 1.0)
//!     .variant("green", "Green", 1.0)
//!     .build();
//! experiment.validate()?;
//! experiment.transition(ExperimentStatus::Running)?;
//! # Ok::<(), trueno_ab::Error>(())
//! ```

mod assignment_record;
mod experiment_record;
mod memory;
mod store;
mod tracking_record;
mod variant_record;

pub use assignment_record::AssignmentRecord;
pub use experiment_record::{ExperimentRecord, ExperimentRecordBuilder, ExperimentStatus};
pub use memory::MemoryExperimentStore;
pub use store::ExperimentStore;
pub use tracking_record::{ConversionRecord, ExposureRecord};
pub use variant_record::VariantRecord;
