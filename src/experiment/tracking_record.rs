//! Exposure and Conversion records - append-only tracking events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Exposure Record: a client was shown a variant.
///
/// Exposures form the denominator of conversion analysis. A client may be
/// exposed many times; analysis counts distinct clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExposureRecord {
    experiment_id: String,
    variant_id: String,
    client_id: String,
    exposed_at: DateTime<Utc>,
}

impl ExposureRecord {
    /// Create a new exposure stamped with the current time.
    #[must_use]
    pub fn new(
        experiment_id: impl Into<String>,
        variant_id: impl Into<String>,
        client_id: impl Into<String>,
    ) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            variant_id: variant_id.into(),
            client_id: client_id.into(),
            exposed_at: Utc::now(),
        }
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the variant ID.
    #[must_use]
    pub fn variant_id(&self) -> &str {
        &self.variant_id
    }

    /// Get the client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Get the exposure timestamp.
    #[must_use]
    pub const fn exposed_at(&self) -> DateTime<Utc> {
        self.exposed_at
    }
}

/// Conversion Record: a client completed a tracked goal under a variant.
///
/// Every record counts toward the numerator, so repeat conversions by the
/// same client are all reflected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversionRecord {
    experiment_id: String,
    variant_id: String,
    client_id: String,
    goal: String,
    converted_at: DateTime<Utc>,
}

impl ConversionRecord {
    /// Create a new conversion stamped with the current time.
    ///
    /// # Arguments
    ///
    /// * `experiment_id` - Experiment the conversion is attributed to
    /// * `variant_id` - Variant the client was assigned
    /// * `client_id` - Converting client
    /// * `goal` - Goal event name (e.g., "checkout", "signup")
    #[must_use]
    pub fn new(
        experiment_id: impl Into<String>,
        variant_id: impl Into<String>,
        client_id: impl Into<String>,
        goal: impl Into<String>,
    ) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            variant_id: variant_id.into(),
            client_id: client_id.into(),
            goal: goal.into(),
            converted_at: Utc::now(),
        }
    }

    /// Get the experiment ID.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the variant ID.
    #[must_use]
    pub fn variant_id(&self) -> &str {
        &self.variant_id
    }

    /// Get the client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Get the goal event name.
    #[must_use]
    pub fn goal(&self) -> &str {
        &self.goal
    }

    /// Get the conversion timestamp.
    #[must_use]
    pub const fn converted_at(&self) -> DateTime<Utc> {
        self.converted_at
    }
}
