//! Authoritative tower state: stats, cooldowns, and upgrade math.

use lane_defence_core::{
    PixelPoint, TileCoord, TowerId, TowerKind, UpgradeTrack, MAX_UPGRADE_LEVEL,
};

use crate::path::tile_center;

const UPGRADE_BASE_COST: f32 = 30.0;
const UPGRADE_COST_GROWTH: f32 = 1.25;
const DAMAGE_STEP: f32 = 1.25;
const RANGE_STEP: f32 = 1.10;
const FIRE_RATE_STEP: f32 = 1.20;
const SELL_REFUND_NUMERATOR: u32 = 3;
const SELL_REFUND_DENOMINATOR: u32 = 4;

/// A placed tower with its per-instance combat state.
#[derive(Debug)]
pub(crate) struct Tower {
    pub(crate) id: TowerId,
    pub(crate) kind: TowerKind,
    pub(crate) tile: TileCoord,
    /// Price actually paid at purchase time; sell value derives from this,
    /// not from the current escalated price.
    pub(crate) purchase_price: u32,
    damage: u32,
    range: f32,
    range_sq: f32,
    fire_rate: f32,
    cooldown: f32,
    damage_level: u8,
    range_level: u8,
    fire_rate_level: u8,
}

impl Tower {
    pub(crate) fn new(id: TowerId, kind: TowerKind, tile: TileCoord, purchase_price: u32) -> Self {
        let stats = kind.base_stats();
        Self {
            id,
            kind,
            tile,
            purchase_price,
            damage: stats.damage,
            range: stats.range,
            range_sq: stats.range * stats.range,
            fire_rate: stats.fire_rate,
            cooldown: 0.0,
            damage_level: 0,
            range_level: 0,
            fire_rate_level: 0,
        }
    }

    pub(crate) fn center(&self) -> PixelPoint {
        tile_center(self.tile)
    }

    pub(crate) fn damage(&self) -> u32 {
        self.damage
    }

    pub(crate) fn range(&self) -> f32 {
        self.range
    }

    pub(crate) fn range_sq(&self) -> f32 {
        self.range_sq
    }

    pub(crate) fn fire_rate(&self) -> f32 {
        self.fire_rate
    }

    pub(crate) fn track_level(&self, track: UpgradeTrack) -> u8 {
        match track {
            UpgradeTrack::Damage => self.damage_level,
            UpgradeTrack::Range => self.range_level,
            UpgradeTrack::FireRate => self.fire_rate_level,
        }
    }

    /// Current price of the next level on the track.
    pub(crate) fn upgrade_cost(&self, track: UpgradeTrack) -> u32 {
        let level = self.track_level(track);
        (UPGRADE_BASE_COST * UPGRADE_COST_GROWTH.powi(i32::from(level))).round() as u32
    }

    /// Advances the track one level and applies its multiplicative effect.
    ///
    /// The caller validates the level cap and funds; this only mutates.
    /// Returns the level the track reached.
    pub(crate) fn apply_upgrade(&mut self, track: UpgradeTrack) -> u8 {
        match track {
            UpgradeTrack::Damage => {
                self.damage_level += 1;
                self.damage = (self.damage as f32 * DAMAGE_STEP).round() as u32;
                self.damage_level
            }
            UpgradeTrack::Range => {
                self.range_level += 1;
                self.range *= RANGE_STEP;
                self.range_sq = self.range * self.range;
                self.range_level
            }
            UpgradeTrack::FireRate => {
                self.fire_rate_level += 1;
                self.fire_rate *= FIRE_RATE_STEP;
                self.fire_rate_level
            }
        }
    }

    pub(crate) fn at_level_cap(&self, track: UpgradeTrack) -> bool {
        self.track_level(track) >= MAX_UPGRADE_LEVEL
    }

    /// Refund credited on a sale: a fixed fraction of the price paid.
    pub(crate) fn sell_value(&self) -> u32 {
        self.purchase_price * SELL_REFUND_NUMERATOR / SELL_REFUND_DENOMINATOR
    }

    pub(crate) fn tick_cooldown(&mut self, dt: f32) {
        self.cooldown -= dt;
    }

    /// A tower with a non-positive cooldown may fire on this tick.
    pub(crate) fn is_ready(&self) -> bool {
        self.cooldown <= 0.0
    }

    /// Resets the cooldown after a shot. Not called on a miss, so a tower
    /// that found no target fires on the first tick a target appears.
    pub(crate) fn reset_cooldown(&mut self) {
        self.cooldown = 1.0 / self.fire_rate;
    }
}
