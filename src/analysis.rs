//! Conversion analysis with normal-approximation confidence intervals
//!
//! ## Per-variant statistics
//!
//! ```text
//! rate = conversions / exposures            (0 when exposures == 0)
//! se   = sqrt(rate * (1 - rate) / exposures) (0 when exposures == 0)
//! moe  = 1.96 * se
//! ci   = [max(0, rate - moe), min(1, rate + moe)]
//! ```
//!
//! ## Control comparison
//!
//! The first variant of an experiment is the control. Every other variant is
//! compared to it with a pooled two-proportion z-test.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::experiment::ExperimentStore;
use crate::{Error, Result};

/// Two-sided z critical value for 95% confidence.
pub const Z_95: f64 = 1.96;

/// Significance threshold applied to comparison p-values.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Conversion statistics for one variant.
///
/// `exposures == 0` yields a zero rate and a `[0, 0]` interval; check
/// [`AnalysisResult::has_data`] to tell "no data" apart from "no conversions".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Variant the statistics describe
    pub variant_id: String,
    /// Distinct clients exposed to the variant
    pub exposures: u64,
    /// Conversion events attributed to the variant
    pub conversions: u64,
    /// `conversions / exposures`
    pub conversion_rate: f64,
    /// Standard error of the rate
    pub standard_error: f64,
    /// `Z_95 * standard_error`
    pub margin_of_error: f64,
    /// 95% interval clamped to `[0, 1]`
    pub confidence_interval: (f64, f64),
}

impl AnalysisResult {
    /// Whether any client was exposed to this variant.
    #[must_use]
    pub const fn has_data(&self) -> bool {
        self.exposures > 0
    }
}

/// Compute conversion statistics from raw counts.
///
/// # Example
///
/// ```rust
/// use trueno_ab::analysis::conversion_stats;
///
/// let result = conversion_stats("control", 100, 20);
/// assert!((result.conversion_rate - 0.2).abs() < 1e-12);
/// assert!((result.standard_error - 0.04).abs() < 1e-12);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn conversion_stats(
    variant_id: impl Into<String>,
    exposures: u64,
    conversions: u64,
) -> AnalysisResult {
    let (conversion_rate, standard_error) = if exposures > 0 {
        let n = exposures as f64;
        let rate = conversions as f64 / n;
        // Repeat conversions can push the rate past 1; keep the radicand >= 0
        let p = rate.clamp(0.0, 1.0);
        (rate, (p * (1.0 - p) / n).sqrt())
    } else {
        (0.0, 0.0)
    };

    let margin_of_error = Z_95 * standard_error;
    let confidence_interval = if exposures > 0 {
        (
            (conversion_rate - margin_of_error).max(0.0),
            (conversion_rate + margin_of_error).min(1.0),
        )
    } else {
        (0.0, 0.0)
    };

    AnalysisResult {
        variant_id: variant_id.into(),
        exposures,
        conversions,
        conversion_rate,
        standard_error,
        margin_of_error,
        confidence_interval,
    }
}

/// A treatment variant measured against the control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantComparison {
    /// Control variant ID
    pub control_id: String,
    /// Treatment variant ID
    pub variant_id: String,
    /// `treatment_rate - control_rate`
    pub absolute_lift: f64,
    /// `absolute_lift / control_rate`, `None` when the control rate is zero
    pub relative_lift: Option<f64>,
    /// Pooled two-proportion z statistic
    pub z_score: f64,
    /// Two-sided p-value
    pub p_value: f64,
    /// `p_value < SIGNIFICANCE_LEVEL`
    pub significant: bool,
}

/// Compare a treatment against the control with a pooled two-proportion z-test.
///
/// Without exposures on both sides, or with zero pooled variance, the result
/// carries `z_score = 0` and `p_value = 1`.
///
/// # Errors
///
/// Returns `Error::Statistics` if the normal distribution can't be built.
#[allow(clippy::cast_precision_loss)]
pub fn compare(control: &AnalysisResult, treatment: &AnalysisResult) -> Result<VariantComparison> {
    let absolute_lift = treatment.conversion_rate - control.conversion_rate;
    let relative_lift =
        (control.conversion_rate > 0.0).then(|| absolute_lift / control.conversion_rate);

    let (z_score, p_value) = if control.has_data() && treatment.has_data() {
        let n_c = control.exposures as f64;
        let n_t = treatment.exposures as f64;
        let pooled = ((control.conversions + treatment.conversions) as f64 / (n_c + n_t))
            .clamp(0.0, 1.0);
        let se = (pooled * (1.0 - pooled) * (1.0 / n_c + 1.0 / n_t)).sqrt();
        if se > 0.0 {
            let z = absolute_lift / se;
            let normal = Normal::new(0.0, 1.0).map_err(|e| Error::Statistics(e.to_string()))?;
            (z, (2.0 * (1.0 - normal.cdf(z.abs()))).clamp(0.0, 1.0))
        } else {
            (0.0, 1.0)
        }
    } else {
        (0.0, 1.0)
    };

    Ok(VariantComparison {
        control_id: control.variant_id.clone(),
        variant_id: treatment.variant_id.clone(),
        absolute_lift,
        relative_lift,
        z_score,
        p_value,
        significant: p_value < SIGNIFICANCE_LEVEL,
    })
}

/// Read-only analysis over an injected store.
pub struct ConversionAnalyzer<S> {
    store: Arc<S>,
}

impl<S: ExperimentStore> ConversionAnalyzer<S> {
    /// Create an analyzer reading from `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Per-variant conversion statistics, in variant order.
    ///
    /// An experiment without variants yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` for an unknown experiment; store errors pass
    /// through unchanged.
    pub async fn analyze(&self, experiment_id: &str) -> Result<Vec<AnalysisResult>> {
        let experiment = self
            .store
            .get_experiment(experiment_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("experiment '{experiment_id}'")))?;

        let mut results = Vec::with_capacity(experiment.variants().len());
        for variant in experiment.variants() {
            let exposures = self
                .store
                .count_exposures(experiment_id, variant.variant_id())
                .await?;
            let conversions = self
                .store
                .count_conversions(experiment_id, variant.variant_id())
                .await?;
            results.push(conversion_stats(variant.variant_id(), exposures, conversions));
        }

        Ok(results)
    }

    /// Compare every non-control variant to the first (control) variant.
    ///
    /// # Errors
    ///
    /// Same as [`ConversionAnalyzer::analyze`].
    pub async fn compare_to_control(&self, experiment_id: &str) -> Result<Vec<VariantComparison>> {
        let results = self.analyze(experiment_id).await?;
        let Some((control, treatments)) = results.split_first() else {
            return Ok(Vec::new());
        };
        treatments.iter().map(|t| compare(control, t)).collect()
    }
}
