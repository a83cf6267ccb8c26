//! Assignment Record - durable client to variant mapping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Assignment Record maps a client to the variant it was given.
///
/// At most one assignment exists per (experiment, client) pair, and it is
/// never rewritten once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssignmentRecord {
    experiment_id: String,
    client_id: String,
    variant_id: String,
    assigned_at: DateTime<Utc>,
}

impl AssignmentRecord {
    /// Create a new assignment stamped with the current time.
    #[must_use]
    pub fn new(
        experiment_id: impl Into<String>,
        client_id: impl Into<String>,
        variant_id: impl Into<String>,
    ) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            client_id: client_id.into(),
            variant_id: variant_id.into(),
            assigned_at: Utc::now(),
        }
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Get the assigned variant ID.
    #[must_use]
    pub fn variant_id(&self) -> &str {
        &self.variant_id
    }

    /// Get the assignment timestamp.
    #[must_use]
    pub const fn assigned_at(&self) -> DateTime<Utc> {
        self.assigned_at
    }
}
