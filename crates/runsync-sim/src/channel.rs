//! Fault-injecting model of the push channel.
//!
//! The modeled guarantees match the transport the merge engine is written
//! against: at-least-once delivery with duplication and delay, ordered per
//! entity stream but freely interleaved across streams.
//!
//! - Whole-run payloads are latest-by-construction on the sender side, so
//!   the channel delivers them in order and never replays them.
//! - Checklist and item messages share one stream per checklist (their
//!   entity key), stay FIFO within it, and may be delayed, duplicated
//!   (reconnect replay) and interleaved with other streams.
//!
//! Everything the channel injects must be absorbed by the engine's
//! timestamp gates; the oracle checks exactly that.

use std::collections::HashMap;

use runsync_core::model::ChecklistId;
use runsync_core::update::{ChecklistUpdateMessage, ItemUpdateMessage, RunUpdate};
use serde::{Deserialize, Serialize};

use crate::rng::DeterministicRng;

/// One decoded message as handed to a replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelMessage {
    Run(RunUpdate),
    Checklist(ChecklistUpdateMessage),
    Item(ItemUpdateMessage),
}

impl ChannelMessage {
    /// The ordered stream this message belongs to.
    #[must_use]
    pub fn entity_key(&self) -> EntityKey {
        match self {
            Self::Run(_) => EntityKey::Run,
            Self::Checklist(msg) => EntityKey::Checklist(msg.update.id.clone()),
            Self::Item(msg) => EntityKey::Checklist(msg.checklist_id.clone()),
        }
    }
}

/// Key of a per-entity FIFO stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Run,
    Checklist(ChecklistId),
}

/// Fault injection configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultConfig {
    /// Maximum delivery delay in ticks.
    pub max_delay_ticks: u8,
    /// Percentage of gated messages replayed a second time.
    pub duplicate_rate_percent: u8,
    /// Percentage chance of interleaving ready streams at each tick.
    pub reorder_rate_percent: u8,
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            max_delay_ticks: 3,
            duplicate_rate_percent: 10,
            reorder_rate_percent: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending {
    deliver_at_tick: u64,
    seq: u64,
    message: ChannelMessage,
}

/// Statistics from one send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOutcome {
    /// A replay copy was enqueued.
    pub duplicated: bool,
    /// Delay assigned to the primary copy, in ticks.
    pub delay_ticks: u64,
}

/// Deterministic fault-injecting channel for one replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedChannel {
    pending: Vec<Pending>,
    next_seq: u64,
    /// Latest scheduled tick per stream; later sends on the same stream
    /// never deliver before earlier ones.
    stream_floor: HashMap<EntityKey, u64>,
    fault: FaultConfig,
}

impl SimulatedChannel {
    #[must_use]
    pub fn new(fault: FaultConfig) -> Self {
        Self {
            pending: Vec::new(),
            next_seq: 0,
            stream_floor: HashMap::new(),
            fault,
        }
    }

    /// Number of queued in-flight messages.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Enqueue a message sent at `now`, assigning delay and possibly a
    /// replay copy.
    pub fn send(
        &mut self,
        now: u64,
        message: ChannelMessage,
        rng: &mut DeterministicRng,
    ) -> SendOutcome {
        let key = message.entity_key();
        let delay = rng.next_bounded(u64::from(self.fault.max_delay_ticks) + 1);
        let floor = self.stream_floor.get(&key).copied().unwrap_or(0);
        let deliver_at_tick = (now + delay).max(floor);
        self.stream_floor.insert(key.clone(), deliver_at_tick);

        let replayable = !matches!(key, EntityKey::Run);
        let duplicated = replayable && rng.chance(self.fault.duplicate_rate_percent);

        self.push(deliver_at_tick, message.clone());
        if duplicated {
            // Replays land strictly later and out of stream order; the
            // engine's timestamp gate has to reject them.
            let replay_delay = 1 + rng.next_bounded(u64::from(self.fault.max_delay_ticks) + 1);
            self.push(deliver_at_tick + replay_delay, message);
        }

        SendOutcome {
            duplicated,
            delay_ticks: delay,
        }
    }

    fn push(&mut self, deliver_at_tick: u64, message: ChannelMessage) {
        self.pending.push(Pending {
            deliver_at_tick,
            seq: self.next_seq,
            message,
        });
        self.next_seq += 1;
    }

    /// Deliver every message that is ready at `now`.
    ///
    /// Ready messages are interleaved randomly across streams while
    /// preserving send order within each stream.
    pub fn deliver(&mut self, now: u64, rng: &mut DeterministicRng) -> Vec<ChannelMessage> {
        let mut ready: Vec<Pending> = Vec::new();
        let mut still_pending: Vec<Pending> = Vec::new();
        for entry in self.pending.drain(..) {
            if entry.deliver_at_tick <= now {
                ready.push(entry);
            } else {
                still_pending.push(entry);
            }
        }
        self.pending = still_pending;

        ready.sort_by_key(|entry| entry.seq);
        if ready.len() > 1 && rng.chance(self.fault.reorder_rate_percent) {
            return interleave_streams(ready, rng);
        }
        ready.into_iter().map(|entry| entry.message).collect()
    }
}

/// Randomly interleave per-stream queues, keeping each stream FIFO.
fn interleave_streams(ready: Vec<Pending>, rng: &mut DeterministicRng) -> Vec<ChannelMessage> {
    let mut streams: Vec<(EntityKey, std::collections::VecDeque<ChannelMessage>)> = Vec::new();
    for entry in ready {
        let key = entry.message.entity_key();
        if let Some((_, queue)) = streams.iter_mut().find(|(k, _)| *k == key) {
            queue.push_back(entry.message);
        } else {
            let mut queue = std::collections::VecDeque::new();
            queue.push_back(entry.message);
            streams.push((key, queue));
        }
    }

    let mut out = Vec::new();
    while !streams.is_empty() {
        let Some(pick) = rng.pick_index(streams.len()) else {
            break;
        };
        if let Some(message) = streams[pick].1.pop_front() {
            out.push(message);
        }
        if streams[pick].1.is_empty() {
            streams.remove(pick);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use runsync_core::model::ItemId;
    use runsync_core::update::ItemUpdate;

    fn item_message(checklist: &str, item: &str, at: i64) -> ChannelMessage {
        ChannelMessage::Item(ItemUpdateMessage {
            playbook_run_id: "run_0".into(),
            checklist_id: ChecklistId::new(checklist),
            update: ItemUpdate {
                id: ItemId::new(item),
                index: 0,
                checklist_item_updated_at: at,
                ..ItemUpdate::default()
            },
        })
    }

    fn drain_all(channel: &mut SimulatedChannel, rng: &mut DeterministicRng) -> Vec<ChannelMessage> {
        let mut out = Vec::new();
        let mut tick = 0;
        while channel.in_flight() > 0 {
            out.extend(channel.deliver(tick, rng));
            tick += 1;
        }
        out
    }

    #[test]
    fn same_stream_stays_fifo() {
        for seed in 0..50 {
            let mut rng = DeterministicRng::new(seed);
            let mut channel = SimulatedChannel::new(FaultConfig {
                max_delay_ticks: 4,
                duplicate_rate_percent: 0,
                reorder_rate_percent: 100,
            });
            for (tick, at) in [(0_u64, 1000_i64), (1, 2000), (2, 3000)] {
                channel.send(tick, item_message("c1", "i1", at), &mut rng);
            }

            let delivered = drain_all(&mut channel, &mut rng);
            let stamps: Vec<i64> = delivered
                .iter()
                .filter_map(|m| match m {
                    ChannelMessage::Item(msg) => Some(msg.update.checklist_item_updated_at),
                    _ => None,
                })
                .collect();
            assert_eq!(stamps, [1000, 2000, 3000], "seed {seed} broke FIFO");
        }
    }

    #[test]
    fn duplicates_eventually_delivered_twice() {
        let mut rng = DeterministicRng::new(11);
        let mut channel = SimulatedChannel::new(FaultConfig {
            max_delay_ticks: 2,
            duplicate_rate_percent: 100,
            reorder_rate_percent: 0,
        });
        let outcome = channel.send(0, item_message("c1", "i1", 1000), &mut rng);
        assert!(outcome.duplicated);
        let delivered = drain_all(&mut channel, &mut rng);
        assert_eq!(delivered.len(), 2);
    }

    #[test]
    fn run_messages_are_never_replayed() {
        let mut rng = DeterministicRng::new(11);
        let mut channel = SimulatedChannel::new(FaultConfig {
            max_delay_ticks: 2,
            duplicate_rate_percent: 100,
            reorder_rate_percent: 0,
        });
        let outcome = channel.send(0, ChannelMessage::Run(RunUpdate::default()), &mut rng);
        assert!(!outcome.duplicated);
        let delivered = drain_all(&mut channel, &mut rng);
        assert_eq!(delivered.len(), 1);
    }
}
