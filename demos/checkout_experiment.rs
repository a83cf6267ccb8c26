//! Checkout Experiment Demo
//!
//! Simulates a two-arm checkout button test: enrolls clients, tracks
//! purchases with a higher true rate on the treatment, then prints the
//! per-variant analysis and the comparison against control.
//!
//! Run with: cargo run --example checkout_experiment
//! Verbose:  TRUENO_AB_LOG=trueno_ab=debug cargo run --example checkout_experiment

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use trueno_ab::experiment::{ExperimentRecord, MemoryExperimentStore};
use trueno_ab::{logging, Config, Experiments};

const CLIENTS: usize = 5_000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    logging::init(&config.log_filter)?;

    println!("=== Trueno-AB Checkout Experiment ===\n");

    let experiments = Experiments::builder(Arc::new(MemoryExperimentStore::new()))
        .config(config)
        .build();

    // -------------------------------------------------------------------------
    // 1. Define and start the experiment
    // -------------------------------------------------------------------------
    println!("1. Creating experiment...");

    let experiment = ExperimentRecord::builder("checkout-button", "Checkout button color")
        .variant("control", "Blue button", 1.0)
        .variant("green", "Green button", 1.0)
        .build();
    experiments.create_experiment(experiment).await?;
    experiments.start_experiment("checkout-button").await?;

    // -------------------------------------------------------------------------
    // 2. Enroll clients and simulate purchases
    // -------------------------------------------------------------------------
    println!("2. Enrolling {CLIENTS} clients...");

    let mut behaviour = StdRng::seed_from_u64(7);
    for i in 0..CLIENTS {
        let client = format!("client-{i:05}");
        let variant = experiments.assign("checkout-button", &client).await?;
        let true_rate = if variant == "green" { 0.12 } else { 0.10 };
        if behaviour.gen::<f64>() < true_rate {
            experiments
                .track_conversion("checkout-button", &client, "purchase")
                .await?;
        }
    }

    // -------------------------------------------------------------------------
    // 3. Report
    // -------------------------------------------------------------------------
    println!("\n3. Per-variant results:");
    for r in experiments.analyze("checkout-button").await? {
        println!(
            "   {:<8} exposures={:<5} conversions={:<4} rate={:.2}% ci=[{:.2}%, {:.2}%]",
            r.variant_id,
            r.exposures,
            r.conversions,
            r.conversion_rate * 100.0,
            r.confidence_interval.0 * 100.0,
            r.confidence_interval.1 * 100.0,
        );
    }

    println!("\n4. Against control:");
    for cmp in experiments.compare_to_control("checkout-button").await? {
        println!("{}", serde_json::to_string_pretty(&cmp)?);
    }

    experiments.stop_experiment("checkout-button").await?;
    println!("\n=== Done ===");
    Ok(())
}
