#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure wave-indexed difficulty curves.
//!
//! Both functions are side-effect-free mappings from a one-indexed wave
//! number to scaling multipliers and a spawn plan, so difficulty tuning is
//! testable without running the simulation.

use std::time::Duration;

use lane_defence_core::{MixWeights, WavePlan, WaveScaling};

/// Wave at which the growth curve starts to lean harder.
const CENTER_WAVE: f32 = 24.0;
/// How quickly the curve leans harder around the center wave.
const TRANSITION_SHARPNESS: f32 = 7.0;

/// Per-wave hit-point growth before and after the logistic transition.
const HP_RATE_EARLY: f32 = 0.08;
const HP_RATE_LATE: f32 = 0.15;
/// Per-wave reward growth before and after the logistic transition.
const REWARD_RATE_EARLY: f32 = 0.04;
const REWARD_RATE_LATE: f32 = 0.07;
/// Reward multiplier decays by this factor every ten waves to keep the
/// payout economy bounded while hit points keep scaling up.
const REWARD_DECADE_DECAY: f32 = 0.97;
/// Hard ceiling on the speed multiplier.
const SPEED_CAP: f32 = 2.25;
const SPEED_RATE: f32 = 0.015;

/// Spawn interval shrinks geometrically toward this floor, in seconds.
const INTERVAL_FLOOR: f32 = 0.35;
const INTERVAL_BASE: f32 = 1.20;
const INTERVAL_DECAY: f32 = 0.985;

/// Every Nth wave receives a burst bonus on top of the nominal count.
const BURST_PERIOD: u32 = 5;

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Logistic blend between an early-wave and a late-wave per-wave growth rate.
fn growth_rate(wave: u32, low: f32, high: f32) -> f32 {
    let t = sigmoid((wave as f32 - CENTER_WAVE) / TRANSITION_SHARPNESS);
    mix(low, high, t)
}

/// Computes the stat multipliers applied to every enemy of the given wave.
#[must_use]
pub fn wave_scaling(wave: u32) -> WaveScaling {
    let exponent = wave.saturating_sub(1) as f32;
    let hp_rate = growth_rate(wave, HP_RATE_EARLY, HP_RATE_LATE);
    let reward_rate = growth_rate(wave, REWARD_RATE_EARLY, REWARD_RATE_LATE);

    let hp = (1.0 + hp_rate).powf(exponent);
    let reward = (1.0 + reward_rate).powf(exponent) * REWARD_DECADE_DECAY.powi((wave / 10) as i32);
    let speed = (1.0 + SPEED_RATE * exponent).min(SPEED_CAP);

    WaveScaling { hp, speed, reward }
}

/// Computes the spawn plan for the given wave.
#[must_use]
pub fn wave_plan(wave: u32) -> WavePlan {
    let w = wave as f32;

    // Linear count plus a mildly super-linear term past wave six.
    let surplus = (w - 6.0).max(0.0);
    let count = (13.0 + w * 0.9 + surplus.powf(1.12) * 0.12).floor() as u32;

    let interval_secs = (INTERVAL_BASE * INTERVAL_DECAY.powf((w - 1.0).max(0.0))).max(INTERVAL_FLOOR);
    let interval = Duration::from_secs_f32(interval_secs);

    // Mix starts all-basic and shifts toward fast/tank, each capped.
    let tank = (0.10 + w * 0.012).min(0.48);
    let fast = (0.24 + w * 0.008).min(0.44);
    let basic = (1.0 - (tank + fast)).max(0.12);

    let burst_bonus = if wave % BURST_PERIOD == 0 {
        (wave / BURST_PERIOD + 5).max(7)
    } else {
        0
    };

    WavePlan {
        count,
        interval,
        weights: MixWeights { basic, fast, tank },
        burst_bonus,
    }
}
