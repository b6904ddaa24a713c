#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Lane Defence simulation.
//!
//! This crate defines the message surface that connects the host, the
//! authoritative world, and pure systems. Hosts and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems and the host to react to deterministically. Systems consume
//! event streams, query immutable snapshots, and respond exclusively with
//! new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Maximum level reachable on any single tower upgrade track.
pub const MAX_UPGRADE_LEVEL: u8 = 5;

/// Location of a single grid tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }
}

/// Position of an entity center expressed in pixel space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelPoint {
    x: f32,
    y: f32,
}

impl PixelPoint {
    /// Creates a new pixel-space point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal component in pixels.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical component in pixels.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(self, other: PixelPoint) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Generation-checked handle identifying a pooled enemy slot.
///
/// A handle only resolves while the generation stored in the pool slot still
/// matches; recycling a slot bumps its generation, so stale handles held by
/// projectiles can never silently retarget a reused enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId {
    index: u32,
    generation: u32,
}

impl EnemyId {
    /// Creates a new enemy handle from a slot index and generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index occupied by the enemy within the pool.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation the slot carried when the enemy was acquired.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Generation-checked handle identifying a pooled projectile slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId {
    index: u32,
    generation: u32,
}

impl ProjectileId {
    /// Creates a new projectile handle from a slot index and generation.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index occupied by the projectile within the pool.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Generation the slot carried when the projectile was acquired.
    #[must_use]
    pub const fn generation(&self) -> u32 {
        self.generation
    }
}

/// Unique identifier assigned to a tower by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Closed set of enemy archetypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Baseline enemy with average health and speed.
    Basic,
    /// Low-health enemy that moves quickly.
    Fast,
    /// High-health enemy that moves slowly.
    Tank,
}

impl EnemyKind {
    /// Every enemy kind in deterministic order.
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Basic, EnemyKind::Fast, EnemyKind::Tank];

    /// Unscaled baseline statistics for the kind.
    #[must_use]
    pub const fn base_stats(self) -> EnemyBaseStats {
        match self {
            Self::Basic => EnemyBaseStats {
                hp: 30,
                speed: 70.0,
                reward: 5,
            },
            Self::Fast => EnemyBaseStats {
                hp: 20,
                speed: 120.0,
                reward: 6,
            },
            Self::Tank => EnemyBaseStats {
                hp: 120,
                speed: 45.0,
                reward: 10,
            },
        }
    }
}

/// Baseline statistics shared by all enemies of one kind before wave scaling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyBaseStats {
    /// Hit points at scaling multiplier 1.
    pub hp: u32,
    /// Movement speed in pixels per second at scaling multiplier 1.
    pub speed: f32,
    /// Currency granted on a kill at scaling multiplier 1.
    pub reward: u32,
}

/// Closed set of tower archetypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TowerKind {
    /// All-round tower with average damage, range, and cadence.
    Basic,
    /// Short-range tower that fires quickly for little damage per shot.
    Rapid,
    /// Long-range tower that fires slowly for heavy damage per shot.
    Heavy,
}

impl TowerKind {
    /// Every tower kind in deterministic order.
    pub const ALL: [TowerKind; 3] = [TowerKind::Basic, TowerKind::Rapid, TowerKind::Heavy];

    /// Unscaled baseline statistics for the kind.
    #[must_use]
    pub const fn base_stats(self) -> TowerBaseStats {
        match self {
            Self::Basic => TowerBaseStats {
                range: 100.0,
                damage: 10,
                fire_rate: 1.0,
            },
            Self::Rapid => TowerBaseStats {
                range: 90.0,
                damage: 6,
                fire_rate: 2.0,
            },
            Self::Heavy => TowerBaseStats {
                range: 120.0,
                damage: 20,
                fire_rate: 0.6,
            },
        }
    }

    /// Cost of the first tower of this kind.
    #[must_use]
    pub const fn base_cost(self) -> u32 {
        match self {
            Self::Basic => 50,
            Self::Rapid => 80,
            Self::Heavy => 120,
        }
    }

    /// Factor applied to the price as the purchase counter escalates.
    #[must_use]
    pub const fn price_multiplier(self) -> f32 {
        match self {
            Self::Basic => 1.15,
            Self::Rapid => 1.17,
            Self::Heavy => 1.20,
        }
    }
}

/// Baseline statistics shared by all towers of one kind before upgrades.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerBaseStats {
    /// Targeting radius measured in pixels.
    pub range: f32,
    /// Damage carried by each projectile.
    pub damage: u32,
    /// Shots per second.
    pub fire_rate: f32,
}

/// Independent upgrade tracks available on every tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeTrack {
    /// Raises projectile damage by 25% per level.
    Damage,
    /// Raises targeting radius by 10% per level.
    Range,
    /// Raises shots per second by 20% per level.
    FireRate,
}

/// Discrete phases of the simulation state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Between-waves countdown during which the player plans construction.
    Planning,
    /// Active wave: enemies spawn and advance until the lane is cleared.
    Combat,
}

/// Stat multipliers applied to every enemy spawned during one wave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WaveScaling {
    /// Multiplier applied to base hit points.
    pub hp: f32,
    /// Multiplier applied to base movement speed.
    pub speed: f32,
    /// Multiplier applied to the base kill reward.
    pub reward: f32,
}

impl WaveScaling {
    /// Identity scaling that leaves base statistics untouched.
    pub const IDENTITY: WaveScaling = WaveScaling {
        hp: 1.0,
        speed: 1.0,
        reward: 1.0,
    };
}

/// Relative likelihood of each enemy kind within a wave's spawn mix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MixWeights {
    /// Weight of the basic kind.
    pub basic: f32,
    /// Weight of the fast kind.
    pub fast: f32,
    /// Weight of the tank kind.
    pub tank: f32,
}

/// Spawn plan for one wave before randomness is applied.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WavePlan {
    /// Baseline number of enemies to spawn.
    pub count: u32,
    /// Nominal delay between consecutive spawns.
    pub interval: Duration,
    /// Relative kind mix for weighted selection.
    pub weights: MixWeights,
    /// Extra enemies added on periodic pressure-spike waves.
    pub burst_bonus: u32,
}

/// One scheduled enemy spawn within a wave.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnEntry {
    /// Kind of enemy to spawn.
    pub kind: EnemyKind,
    /// Delay since the previous spawn (zero for the first entry).
    pub delay: Duration,
}

/// Complete spawn sequence for one wave, drawn up front at wave start.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnSchedule {
    /// Stat multipliers applied to every enemy in the wave.
    pub scaling: WaveScaling,
    /// Ordered spawn entries with relative delays.
    pub entries: Vec<SpawnEntry>,
}

impl SpawnSchedule {
    /// Reports whether the schedule contains no spawns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation by one fixed tick.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests construction of a tower at the provided tile.
    PlaceTower {
        /// Kind of tower to construct.
        kind: TowerKind,
        /// Tile that should anchor the tower.
        tile: TileCoord,
    },
    /// Requests the sale of the tower occupying the provided tile.
    SellTower {
        /// Tile occupied by the tower to sell.
        tile: TileCoord,
    },
    /// Requests an upgrade on one track of the tower at the provided tile.
    UpgradeTower {
        /// Tile occupied by the tower to upgrade.
        tile: TileCoord,
        /// Upgrade track to advance.
        track: UpgradeTrack,
    },
    /// Queues the spawn schedule for the wave that just started.
    QueueWave {
        /// Full spawn sequence drawn by the spawning system.
        schedule: SpawnSchedule,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the simulation entered a new phase.
    PhaseChanged {
        /// Phase that became active.
        phase: Phase,
    },
    /// Announces the start of a new wave.
    WaveStarted {
        /// One-indexed number of the wave that began.
        wave: u32,
    },
    /// Confirms that an enemy entered the lane.
    EnemySpawned {
        /// Handle assigned to the spawned enemy.
        enemy: EnemyId,
        /// Kind of enemy that spawned.
        kind: EnemyKind,
    },
    /// Reports that an enemy was destroyed and its reward paid out.
    EnemyKilled {
        /// Handle of the destroyed enemy.
        enemy: EnemyId,
        /// Currency credited for the kill.
        reward: u32,
    },
    /// Reports that an enemy reached the end of the lane.
    EnemyLeaked {
        /// Handle of the enemy that leaked.
        enemy: EnemyId,
        /// Lives remaining after the leak was charged.
        lives_remaining: u32,
    },
    /// Confirms that a tower fired a projectile.
    ShotFired {
        /// Identifier of the tower that fired.
        tower: TowerId,
    },
    /// Confirms that a tower was placed and paid for.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Kind of tower that was placed.
        kind: TowerKind,
        /// Tile anchoring the tower.
        tile: TileCoord,
        /// Price actually charged for the purchase.
        cost: u32,
    },
    /// Confirms that a tower was sold and the seller credited.
    TowerSold {
        /// Identifier of the tower that was removed.
        tower: TowerId,
        /// Currency refunded to the player.
        refund: u32,
    },
    /// Confirms that a tower upgrade was applied and paid for.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Track that advanced.
        track: UpgradeTrack,
        /// Level the track reached.
        level: u8,
        /// Price charged for the upgrade.
        cost: u32,
    },
    /// Reports that a tower placement request was declined.
    PlacementRejected {
        /// Kind of tower requested for placement.
        kind: TowerKind,
        /// Tile provided in the placement request.
        tile: TileCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Reports that a tower sale request was declined.
    SellRejected {
        /// Tile provided in the sale request.
        tile: TileCoord,
        /// Specific reason the sale failed.
        reason: SellError,
    },
    /// Reports that a tower upgrade request was declined.
    UpgradeRejected {
        /// Tile provided in the upgrade request.
        tile: TileCoord,
        /// Track requested for the upgrade.
        track: UpgradeTrack,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Announces that the last life was lost and the run ended.
    GameOver,
}

/// Reasons a tower placement request may be declined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested tile lies outside the configured grid bounds.
    OutOfBounds,
    /// The requested tile belongs to the enemy lane mask.
    OnPath,
    /// The requested tile is already occupied by a tower.
    Occupied,
    /// The player cannot afford the current price for the kind.
    InsufficientFunds,
}

/// Reasons a tower sale request may be declined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SellError {
    /// No tower occupies the provided tile.
    MissingTower,
}

/// Reasons a tower upgrade request may be declined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeError {
    /// No tower occupies the provided tile.
    MissingTower,
    /// The requested track already reached its level cap.
    MaxLevel,
    /// The player cannot afford the current upgrade price.
    InsufficientFunds,
}
