#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system that draws full wave schedules up front.
//!
//! When the world announces a wave start, this system consults the
//! difficulty curve for the wave's plan, draws the complete spawn sequence
//! with a seeded RNG, and queues it as a single command. The world then
//! executes the schedule against simulated time, so a given seed always
//! produces the same waves tick for tick.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use lane_defence_core::{Command, EnemyKind, Event, MixWeights, SpawnEntry, SpawnSchedule};
use lane_defence_system_difficulty::{wave_plan, wave_scaling};

/// Waves at or below this number spawn only the basic kind.
const BASIC_ONLY_WAVES: u32 = 3;
/// Half-width of the uniform jitter applied to each spawn gap, in seconds.
const SPAWN_JITTER: f32 = 0.06;
/// Smallest permitted gap between consecutive spawns, in seconds.
const MIN_SPAWN_GAP: f32 = 0.10;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided RNG seed.
    #[must_use]
    pub const fn new(rng_seed: u64) -> Self {
        Self { rng_seed }
    }
}

/// Pure system that emits one queued spawn schedule per wave start.
#[derive(Debug)]
pub struct Spawning {
    rng: ChaCha8Rng,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    /// Consumes world events and emits schedule commands for started waves.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            if let Event::WaveStarted { wave } = event {
                let schedule = self.draw_schedule(*wave);
                out.push(Command::QueueWave { schedule });
            }
        }
    }

    /// Draws the complete spawn sequence for one wave.
    fn draw_schedule(&mut self, wave: u32) -> SpawnSchedule {
        let plan = wave_plan(wave);
        let total = plan.count + plan.burst_bonus;
        let interval = plan.interval.as_secs_f32();

        let mut entries = Vec::with_capacity(total as usize);
        for position in 0..total {
            let kind = if wave <= BASIC_ONLY_WAVES {
                EnemyKind::Basic
            } else {
                self.draw_kind(plan.weights)
            };

            // The first enemy enters the moment the wave begins; later
            // entries jitter around the nominal cadence but never dip
            // below the minimum gap.
            let delay = if position == 0 {
                Duration::ZERO
            } else {
                let jitter = self.rng.gen_range(-SPAWN_JITTER..=SPAWN_JITTER);
                Duration::from_secs_f32((interval + jitter).max(MIN_SPAWN_GAP))
            };

            entries.push(SpawnEntry { kind, delay });
        }

        SpawnSchedule {
            scaling: wave_scaling(wave),
            entries,
        }
    }

    fn draw_kind(&mut self, weights: MixWeights) -> EnemyKind {
        let total = weights.basic + weights.fast + weights.tank;
        let mut roll = self.rng.gen_range(0.0..total);

        if roll < weights.basic {
            return EnemyKind::Basic;
        }
        roll -= weights.basic;
        if roll < weights.fast {
            return EnemyKind::Fast;
        }
        EnemyKind::Tank
    }
}
