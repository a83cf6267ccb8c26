//! Conversion analysis tests against a populated store

use std::sync::Arc;

use trueno_ab::analysis::ConversionAnalyzer;
use trueno_ab::experiment::{
    ConversionRecord, ExperimentRecord, ExperimentStore, ExposureRecord, MemoryExperimentStore,
};
use trueno_ab::Error;

async fn populate(
    store: &MemoryExperimentStore,
    variant_id: &str,
    exposures: usize,
    conversions: usize,
) {
    for i in 0..exposures {
        store
            .append_exposure(ExposureRecord::new("exp", variant_id, format!("{variant_id}-{i}")))
            .await
            .unwrap();
    }
    for i in 0..conversions {
        store
            .append_conversion(ConversionRecord::new(
                "exp",
                variant_id,
                format!("{variant_id}-{i}"),
                "purchase",
            ))
            .await
            .unwrap();
    }
}

async fn analyzer_with(
    counts: &[(&str, usize, usize)],
) -> ConversionAnalyzer<MemoryExperimentStore> {
    let store = Arc::new(MemoryExperimentStore::new());
    let record = counts
        .iter()
        .fold(ExperimentRecord::builder("exp", "Experiment"), |b, (id, _, _)| {
            b.variant(*id, *id, 1.0)
        })
        .build();
    store.create_experiment(record).await.unwrap();
    for (id, exposures, conversions) in counts {
        populate(&store, id, *exposures, *conversions).await;
    }
    ConversionAnalyzer::new(store)
}

#[tokio::test]
async fn test_analyze_twenty_percent_variant() {
    let analyzer = analyzer_with(&[("control", 100, 20)]).await;

    let results = analyzer.analyze("exp").await.unwrap();
    assert_eq!(results.len(), 1);

    let r = &results[0];
    assert_eq!(r.variant_id, "control");
    assert_eq!(r.exposures, 100);
    assert_eq!(r.conversions, 20);
    assert!((r.conversion_rate - 0.2).abs() < 1e-12);
    assert!((r.standard_error - 0.04).abs() < 1e-9);
    assert!((r.confidence_interval.0 - 0.122).abs() < 1e-3);
    assert!((r.confidence_interval.1 - 0.278).abs() < 1e-3);
}

#[tokio::test]
async fn test_analyze_results_follow_variant_order() {
    let analyzer = analyzer_with(&[("z", 10, 1), ("a", 10, 2), ("m", 10, 3)]).await;

    let ids: Vec<String> = analyzer
        .analyze("exp")
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.variant_id)
        .collect();
    assert_eq!(ids, vec!["z", "a", "m"]);
}

#[tokio::test]
async fn test_analyze_zero_exposure_variant() {
    let analyzer = analyzer_with(&[("a", 50, 5), ("b", 0, 0)]).await;

    let results = analyzer.analyze("exp").await.unwrap();
    let b = &results[1];
    assert_eq!(b.exposures, 0);
    assert_eq!(b.conversion_rate, 0.0);
    assert_eq!(b.confidence_interval, (0.0, 0.0));
    assert!(!b.has_data());
}

#[tokio::test]
async fn test_analyze_full_conversion_clamps_to_one() {
    let analyzer = analyzer_with(&[("a", 10, 10)]).await;

    let results = analyzer.analyze("exp").await.unwrap();
    assert_eq!(results[0].conversion_rate, 1.0);
    assert_eq!(results[0].confidence_interval.1, 1.0);
}

#[tokio::test]
async fn test_analyze_counts_distinct_exposed_clients() {
    let store = Arc::new(MemoryExperimentStore::new());
    store
        .create_experiment(ExperimentRecord::builder("exp", "E").variant("a", "A", 1.0).build())
        .await
        .unwrap();
    for _ in 0..5 {
        store
            .append_exposure(ExposureRecord::new("exp", "a", "same-client"))
            .await
            .unwrap();
    }
    let results = ConversionAnalyzer::new(store).analyze("exp").await.unwrap();

    assert_eq!(results[0].exposures, 1);
    assert_eq!(results[0].conversions, 0);
}

#[tokio::test]
async fn test_analyze_unknown_experiment_not_found() {
    let analyzer = analyzer_with(&[("a", 1, 0)]).await;

    let err = analyzer.analyze("missing").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_analyze_no_variants_is_empty() {
    let store = Arc::new(MemoryExperimentStore::new());
    store
        .create_experiment(ExperimentRecord::new("exp", "No arms yet"))
        .await
        .unwrap();

    let results = ConversionAnalyzer::new(store).analyze("exp").await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_analyze_is_read_only() {
    let store = Arc::new(MemoryExperimentStore::new());
    store
        .create_experiment(ExperimentRecord::builder("exp", "E").variant("a", "A", 1.0).build())
        .await
        .unwrap();
    populate(&store, "a", 30, 4).await;
    let analyzer = ConversionAnalyzer::new(Arc::clone(&store));

    let before = (store.exposure_event_count(), store.conversion_event_count());
    let first = analyzer.analyze("exp").await.unwrap();
    let second = analyzer.analyze("exp").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(before, (store.exposure_event_count(), store.conversion_event_count()));
    assert_eq!(store.assignment_count(), 0);
}

#[tokio::test]
async fn test_compare_to_control() {
    let analyzer = analyzer_with(&[("control", 100, 20), ("green", 100, 35), ("red", 100, 20)]).await;

    let comparisons = analyzer.compare_to_control("exp").await.unwrap();
    assert_eq!(comparisons.len(), 2);

    let green = &comparisons[0];
    assert_eq!(green.control_id, "control");
    assert_eq!(green.variant_id, "green");
    assert!(green.significant);

    let red = &comparisons[1];
    assert_eq!(red.variant_id, "red");
    assert!(red.absolute_lift.abs() < 1e-12);
    assert!(!red.significant);
}

#[tokio::test]
async fn test_compare_to_control_single_variant_is_empty() {
    let analyzer = analyzer_with(&[("control", 10, 1)]).await;
    assert!(analyzer.compare_to_control("exp").await.unwrap().is_empty());
}
