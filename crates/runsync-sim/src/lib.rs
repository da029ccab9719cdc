//! Deterministic fault-injection harness for the runsync merge engine.
//!
//! A simulation fans one scripted stream of update messages out to several
//! replicas, each behind its own fault-injecting channel (delay,
//! duplication, cross-stream interleaving). When the channels drain, an
//! oracle checks that every replica converged to the snapshot produced by
//! applying the script in order, and that the structural invariants hold.
//!
//! # Conventions
//!
//! - **Errors**: `anyhow::Result` at the binary boundary; the simulation
//!   itself is infallible.
//! - **Logging**: `tracing` macros.

pub mod channel;
pub mod oracle;
pub mod rng;
pub mod workload;

use std::sync::Arc;

use runsync_core::model::RunSnapshot;
use runsync_core::{merge_checklist, merge_item, merge_run};
use serde::{Deserialize, Serialize};

use crate::channel::{ChannelMessage, FaultConfig, SimulatedChannel};
use crate::oracle::OracleResult;
use crate::rng::DeterministicRng;
use crate::workload::Workload;

/// Dispatch one decoded channel message to the matching merge function.
#[must_use]
pub fn apply_message(current: &Arc<RunSnapshot>, message: &ChannelMessage) -> Arc<RunSnapshot> {
    match message {
        ChannelMessage::Run(update) => merge_run(current, update),
        ChannelMessage::Checklist(msg) => merge_checklist(current, &msg.update),
        ChannelMessage::Item(msg) => merge_item(current, &msg.checklist_id, &msg.update),
    }
}

/// Configuration for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub seed: u64,
    pub replica_count: usize,
    /// Ticks over which the sender spreads the script.
    pub ticks: u64,
    /// Number of scripted messages.
    pub steps: usize,
    pub fault: FaultConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            replica_count: 4,
            ticks: 32,
            steps: 80,
            fault: FaultConfig::default(),
        }
    }
}

/// Outcome of one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// Messages handed to replicas, replays included, summed over replicas.
    pub delivered_total: usize,
    /// Replay copies injected, summed over replicas.
    pub duplicates_injected: usize,
    pub convergence: OracleResult,
}

struct Replica {
    snapshot: Arc<RunSnapshot>,
    channel: SimulatedChannel,
    rng: DeterministicRng,
}

/// Drives one scripted scenario through fault-injected replicas.
pub struct Simulator {
    config: SimulationConfig,
    workload: Workload,
}

impl Simulator {
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        let workload = workload::generate(config.seed, config.ticks, config.steps);
        Self { config, workload }
    }

    /// Run the simulation to completion and check convergence.
    #[must_use]
    pub fn run(&self) -> SimulationResult {
        let mut replicas: Vec<Replica> = (0..self.config.replica_count)
            .map(|k| Replica {
                snapshot: Arc::clone(&self.workload.seed_snapshot),
                channel: SimulatedChannel::new(self.config.fault),
                // Distinct stream per replica so fault decisions differ.
                rng: DeterministicRng::new(self.config.seed.wrapping_add(1 + k as u64)),
            })
            .collect();

        let mut delivered_total = 0;
        let mut duplicates_injected = 0;
        let mut script = self.workload.script.iter().peekable();
        let mut tick = 0;

        loop {
            while let Some(step) = script.next_if(|step| step.send_at_tick <= tick) {
                for replica in &mut replicas {
                    let outcome =
                        replica
                            .channel
                            .send(tick, step.message.clone(), &mut replica.rng);
                    if outcome.duplicated {
                        duplicates_injected += 1;
                    }
                }
            }

            for replica in &mut replicas {
                for message in replica.channel.deliver(tick, &mut replica.rng) {
                    replica.snapshot = apply_message(&replica.snapshot, &message);
                    delivered_total += 1;
                }
            }

            let drained = script.peek().is_none()
                && replicas.iter().all(|replica| replica.channel.in_flight() == 0);
            if drained {
                break;
            }
            tick += 1;
        }

        let mut reference = Arc::clone(&self.workload.seed_snapshot);
        for step in &self.workload.script {
            reference = apply_message(&reference, &step.message);
        }

        let snapshots: Vec<Arc<RunSnapshot>> = replicas
            .iter()
            .map(|replica| Arc::clone(&replica.snapshot))
            .collect();
        let convergence = oracle::check_all(&reference, &snapshots);
        if !convergence.passed {
            tracing::warn!(
                seed = self.config.seed,
                violations = convergence.violations.len(),
                "simulation failed convergence"
            );
        }

        SimulationResult {
            delivered_total,
            duplicates_injected,
            convergence,
        }
    }
}
