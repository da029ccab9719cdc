#![forbid(unsafe_code)]

use anyhow::{Result, bail};
use runsync_sim::{SimulationConfig, Simulator};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut failures = 0;
    for seed in 0..100 {
        let config = SimulationConfig {
            seed,
            ..SimulationConfig::default()
        };
        let result = Simulator::new(config).run();
        if !result.convergence.passed {
            failures += 1;
            eprintln!(
                "seed {seed} diverged: {:?}",
                result.convergence.violations
            );
        } else {
            println!(
                "seed {seed}: delivered={} duplicates={} converged=true",
                result.delivered_total, result.duplicates_injected
            );
        }
    }

    if failures > 0 {
        bail!("{failures} of 100 seeds diverged");
    }
    println!("all 100 seeds converged");
    Ok(())
}
