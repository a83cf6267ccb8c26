//! Variant assignment tests
//!
//! Covers stickiness, weight coverage, error taxonomy, the lost-write-race
//! path and best-effort exposure recording.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use trueno_ab::assignment::VariantAssigner;
use trueno_ab::experiment::{
    AssignmentRecord, ConversionRecord, ExperimentRecord, ExperimentStatus, ExperimentStore,
    ExposureRecord, MemoryExperimentStore,
};
use trueno_ab::{Error, Result};

// =============================================================================
// Test stores
// =============================================================================

/// Wraps the memory store with switchable faults.
#[derive(Default)]
struct FaultyStore {
    inner: MemoryExperimentStore,
    fail_exposures: AtomicBool,
    fail_reads: AtomicBool,
    /// Report "no assignment" once, as if another writer commits right after
    stale_first_read: AtomicBool,
}

impl ExperimentStore for FaultyStore {
    async fn get_experiment(&self, experiment_id: &str) -> Result<Option<ExperimentRecord>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::Store("connection reset".to_string()));
        }
        self.inner.get_experiment(experiment_id).await
    }

    async fn create_experiment(&self, experiment: ExperimentRecord) -> Result<()> {
        self.inner.create_experiment(experiment).await
    }

    async fn transition_status(
        &self,
        experiment_id: &str,
        next: ExperimentStatus,
    ) -> Result<ExperimentRecord> {
        self.inner.transition_status(experiment_id, next).await
    }

    async fn get_assignment(
        &self,
        experiment_id: &str,
        client_id: &str,
    ) -> Result<Option<AssignmentRecord>> {
        if self.stale_first_read.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.get_assignment(experiment_id, client_id).await
    }

    async fn insert_assignment(&self, assignment: AssignmentRecord) -> Result<()> {
        self.inner.insert_assignment(assignment).await
    }

    async fn append_exposure(&self, exposure: ExposureRecord) -> Result<()> {
        if self.fail_exposures.load(Ordering::SeqCst) {
            return Err(Error::Store("exposure table unavailable".to_string()));
        }
        self.inner.append_exposure(exposure).await
    }

    async fn append_conversion(&self, conversion: ConversionRecord) -> Result<()> {
        self.inner.append_conversion(conversion).await
    }

    async fn count_exposures(&self, experiment_id: &str, variant_id: &str) -> Result<u64> {
        self.inner.count_exposures(experiment_id, variant_id).await
    }

    async fn count_conversions(&self, experiment_id: &str, variant_id: &str) -> Result<u64> {
        self.inner.count_conversions(experiment_id, variant_id).await
    }
}

fn experiment(weights: &[(&str, f64)]) -> ExperimentRecord {
    weights
        .iter()
        .fold(ExperimentRecord::builder("exp", "Experiment"), |b, (id, w)| {
            b.variant(*id, id.to_uppercase(), *w)
        })
        .status(ExperimentStatus::Running)
        .build()
}

async fn memory_assigner(
    weights: &[(&str, f64)],
    seed: u64,
) -> VariantAssigner<MemoryExperimentStore> {
    let store = Arc::new(MemoryExperimentStore::new());
    store.create_experiment(experiment(weights)).await.unwrap();
    VariantAssigner::with_seed(store, seed)
}

async fn share_of(assigner: &VariantAssigner<MemoryExperimentStore>, trials: usize) -> HashMap<String, f64> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for i in 0..trials {
        let variant = assigner.assign("exp", &format!("client-{i}")).await.unwrap();
        *counts.entry(variant).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(k, v)| (k, v as f64 / trials as f64))
        .collect()
}

// =============================================================================
// Stickiness
// =============================================================================

#[tokio::test]
async fn test_assign_twice_returns_same_variant() {
    let assigner = memory_assigner(&[("a", 1.0), ("b", 1.0)], 1).await;

    let first = assigner.assign("exp", "client1").await.unwrap();
    let second = assigner.assign("exp", "client1").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(assigner.store().assignment_count(), 1);
}

#[tokio::test]
async fn test_assign_sticky_across_assigners_sharing_store() {
    let store = Arc::new(MemoryExperimentStore::new());
    store
        .create_experiment(experiment(&[("a", 1.0), ("b", 1.0), ("c", 1.0)]))
        .await
        .unwrap();

    let first = VariantAssigner::with_seed(Arc::clone(&store), 1);
    let second = VariantAssigner::with_seed(Arc::clone(&store), 999);

    for i in 0..100 {
        let client = format!("client-{i}");
        let v1 = first.assign("exp", &client).await.unwrap();
        let v2 = second.assign("exp", &client).await.unwrap();
        assert_eq!(v1, v2, "{client} flipped variants");
    }
}

#[tokio::test]
async fn test_new_assignment_records_one_exposure() {
    let assigner = memory_assigner(&[("a", 1.0)], 1).await;

    assigner.assign("exp", "c1").await.unwrap();
    assigner.assign("exp", "c1").await.unwrap();
    assigner.assign("exp", "c2").await.unwrap();

    let store = assigner.store();
    assert_eq!(store.exposure_event_count(), 2);
    assert_eq!(store.count_exposures("exp", "a").await.unwrap(), 2);
}

// =============================================================================
// Weight coverage
// =============================================================================

#[tokio::test]
async fn test_equal_weights_split_evenly() {
    let assigner = memory_assigner(&[("a", 1.0), ("b", 1.0)], 2024).await;

    let shares = share_of(&assigner, 10_000).await;

    for variant in ["a", "b"] {
        let share = shares[variant];
        assert!((share - 0.5).abs() <= 0.02, "{variant} got {share}");
    }
}

#[tokio::test]
async fn test_uneven_weights_follow_ratio() {
    let assigner = memory_assigner(&[("a", 1.0), ("b", 3.0)], 77).await;

    let shares = share_of(&assigner, 10_000).await;

    assert!((shares["a"] - 0.25).abs() <= 0.02, "a got {}", shares["a"]);
    assert!((shares["b"] - 0.75).abs() <= 0.02, "b got {}", shares["b"]);
}

#[tokio::test]
async fn test_zero_weight_variant_never_assigned() {
    let assigner = memory_assigner(&[("a", 0.0), ("b", 2.0), ("c", 0.0)], 5).await;

    let shares = share_of(&assigner, 500).await;

    assert_eq!(shares.len(), 1);
    assert!((shares["b"] - 1.0).abs() < f64::EPSILON);
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_assign_unknown_experiment_not_found() {
    let assigner = memory_assigner(&[("a", 1.0)], 1).await;

    let err = assigner.assign("missing", "client1").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_assign_experiment_without_variants_not_found() {
    let store = Arc::new(MemoryExperimentStore::new());
    store
        .create_experiment(ExperimentRecord::new("empty", "No arms"))
        .await
        .unwrap();
    let assigner = VariantAssigner::with_seed(store, 1);

    let err = assigner.assign("empty", "client1").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_assign_zero_total_weight_invalid_state() {
    let assigner = memory_assigner(&[("a", 0.0), ("b", 0.0)], 1).await;

    let err = assigner.assign("exp", "client1").await.unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
    assert_eq!(assigner.store().assignment_count(), 0);
}

#[tokio::test]
async fn test_store_errors_surface_unchanged() {
    let store = Arc::new(FaultyStore::default());
    store.create_experiment(experiment(&[("a", 1.0)])).await.unwrap();
    store.fail_reads.store(true, Ordering::SeqCst);
    let assigner = VariantAssigner::with_seed(store, 1);

    let err = assigner.assign("exp", "client1").await.unwrap_err();
    match err {
        Error::Store(msg) => assert_eq!(msg, "connection reset"),
        other => panic!("expected store error, got {other:?}"),
    }
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_lost_race_returns_winning_assignment() {
    let store = Arc::new(FaultyStore::default());
    // Local draw can only ever pick "a"
    store
        .create_experiment(experiment(&[("a", 1.0), ("b", 0.0)]))
        .await
        .unwrap();
    // Another writer already stored "b"; our first read doesn't see it yet
    store
        .insert_assignment(AssignmentRecord::new("exp", "client1", "b"))
        .await
        .unwrap();
    store.stale_first_read.store(true, Ordering::SeqCst);

    let assigner = VariantAssigner::with_seed(Arc::clone(&store), 1);
    let variant = assigner.assign("exp", "client1").await.unwrap();

    assert_eq!(variant, "b");
    // The loser records no exposure; the winner already did (or will)
    assert_eq!(store.inner.exposure_event_count(), 0);
    assert_eq!(store.inner.assignment_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_assignments_agree() {
    let store = Arc::new(MemoryExperimentStore::new());
    store
        .create_experiment(experiment(&[("a", 1.0), ("b", 1.0), ("c", 1.0), ("d", 1.0)]))
        .await
        .unwrap();
    let assigner = Arc::new(VariantAssigner::new(Arc::clone(&store)));

    let mut handles = vec![];
    for _ in 0..32 {
        let assigner = Arc::clone(&assigner);
        handles.push(tokio::spawn(async move {
            assigner.assign("exp", "shared-client").await.unwrap()
        }));
    }

    let mut seen = Vec::new();
    for handle in handles {
        seen.push(handle.await.unwrap());
    }

    assert!(seen.windows(2).all(|w| w[0] == w[1]), "variants diverged: {seen:?}");
    assert_eq!(store.assignment_count(), 1);
    assert_eq!(store.exposure_event_count(), 1);
}

// =============================================================================
// Best-effort exposure
// =============================================================================

#[tokio::test]
async fn test_exposure_failure_does_not_block_assignment() {
    let store = Arc::new(FaultyStore::default());
    store.create_experiment(experiment(&[("a", 1.0)])).await.unwrap();
    store.fail_exposures.store(true, Ordering::SeqCst);
    let assigner = VariantAssigner::with_seed(Arc::clone(&store), 1);

    let variant = assigner.assign("exp", "client1").await.unwrap();

    assert_eq!(variant, "a");
    assert_eq!(store.inner.assignment_count(), 1);
    assert_eq!(store.inner.exposure_event_count(), 0);

    // Still sticky afterwards
    assert_eq!(assigner.assign("exp", "client1").await.unwrap(), "a");
}
