#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Lane Defence.
//!
//! The world owns every mutable collection of the simulation: pooled enemies
//! and projectiles, placed towers, the economy ledger, and the phase state
//! machine. All mutation flows through [`apply`], which executes one
//! [`Command`] and broadcasts the resulting [`Event`] values. Read access
//! goes through the [`query`] module, which captures immutable snapshots for
//! renderers and systems.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use lane_defence_core::{
    Command, EnemyId, EnemyKind, Event, Phase, PixelPoint, PlacementError, ProjectileId,
    SellError, SpawnEntry, SpawnSchedule, TileCoord, TowerId, TowerKind, UpgradeError,
    UpgradeTrack, WaveScaling,
};

pub mod path;

mod economy;
mod pool;
mod spatial;
mod towers;

pub use path::{tile_center, Path, GRID_COLS, GRID_ROWS, TILE_SIZE};

use economy::Economy;
use pool::{Pool, PoolItem, Slot};
use spatial::SpatialGrid;
use towers::Tower;

/// Seconds of planning granted between waves.
const PLANNING_DURATION: Duration = Duration::from_secs(5);
const DEFAULT_STARTING_MONEY: u32 = 100;
const DEFAULT_STARTING_LIVES: u32 = 20;

const ENEMY_POOL_PREWARM: usize = 20;
const PROJECTILE_POOL_PREWARM: usize = 50;

const PROJECTILE_SPEED: f32 = 250.0;
const PROJECTILE_HIT_RADIUS: f32 = 8.0;
/// Distance below which an enemy counts as having arrived at a path node.
const ARRIVAL_EPSILON: f32 = 1e-4;

/// Starting resources for a fresh simulation.
///
/// Owned per world instance so concurrent simulations and tests never share
/// counters or balances.
#[derive(Clone, Copy, Debug)]
pub struct WorldConfig {
    /// Currency available before the first wave.
    pub starting_money: u32,
    /// Leaks tolerated before the run ends.
    pub starting_lives: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            starting_money: DEFAULT_STARTING_MONEY,
            starting_lives: DEFAULT_STARTING_LIVES,
        }
    }
}

#[derive(Debug)]
struct Enemy {
    kind: EnemyKind,
    max_hp: u32,
    hp: f32,
    speed: f32,
    reward: u32,
    x: f32,
    y: f32,
    segment: usize,
    target: PixelPoint,
    dead: bool,
    leaked: bool,
    /// One-shot latch: the kill reward is credited at most once per
    /// lifetime, even when several projectiles resolve in the same tick.
    reward_granted: bool,
}

impl Default for Enemy {
    fn default() -> Self {
        Self {
            kind: EnemyKind::Basic,
            max_hp: 1,
            hp: 1.0,
            speed: 1.0,
            reward: 0,
            x: 0.0,
            y: 0.0,
            segment: 0,
            target: PixelPoint::new(0.0, 0.0),
            dead: false,
            leaked: false,
            reward_granted: false,
        }
    }
}

impl PoolItem for Enemy {
    fn reset(&mut self) {
        *self = Enemy::default();
    }
}

impl Enemy {
    /// Full reinitialization for a pooled slot at spawn time.
    fn configure(&mut self, kind: EnemyKind, scaling: WaveScaling, steps: &[TileCoord]) {
        self.reset();
        self.kind = kind;

        let base = kind.base_stats();
        self.max_hp = ((base.hp as f32 * scaling.hp).round() as u32).max(1);
        self.hp = self.max_hp as f32;
        self.speed = (base.speed * scaling.speed).max(1.0);
        self.reward = (base.reward as f32 * scaling.reward).round() as u32;

        if steps.len() < 2 {
            // A degenerate route has no distance to cover.
            self.leaked = true;
            return;
        }

        let origin = tile_center(steps[0]);
        self.x = origin.x();
        self.y = origin.y();
        self.segment = 1;
        self.target = tile_center(steps[1]);
    }

    /// Straight-line-per-segment motion along the dense route.
    fn advance(&mut self, dt: f32, steps: &[TileCoord]) {
        if self.dead || self.leaked {
            return;
        }

        let dx = self.target.x() - self.x;
        let dy = self.target.y() - self.y;
        let dist = (dx * dx + dy * dy).sqrt();

        if dist <= ARRIVAL_EPSILON {
            self.segment += 1;
            if self.segment >= steps.len() {
                self.leaked = true;
                return;
            }
            self.target = tile_center(steps[self.segment]);
            return;
        }

        let step = self.speed * dt;
        if step >= dist {
            // Snap to the node; the next tick advances the segment.
            self.x = self.target.x();
            self.y = self.target.y();
            return;
        }

        self.x += dx / dist * step;
        self.y += dy / dist * step;
    }

    /// Applies damage, clamping at zero. Returns whether this hit killed.
    fn take_damage(&mut self, amount: f32) -> bool {
        self.hp -= amount.max(0.0);
        if self.hp <= 0.0 {
            self.hp = 0.0;
            self.dead = true;
            return true;
        }
        false
    }
}

#[derive(Debug)]
struct Projectile {
    x: f32,
    y: f32,
    damage: u32,
    target: Option<EnemyId>,
    done: bool,
}

impl Default for Projectile {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            damage: 0,
            target: None,
            done: false,
        }
    }
}

impl PoolItem for Projectile {
    fn reset(&mut self) {
        *self = Projectile::default();
    }
}

impl Projectile {
    fn configure(&mut self, origin: PixelPoint, target: EnemyId, damage: u32) {
        self.reset();
        self.x = origin.x();
        self.y = origin.y();
        self.damage = damage;
        self.target = Some(target);
    }
}

/// Spawn sequence currently being executed by the tick countdown.
#[derive(Debug)]
struct ActiveSchedule {
    scaling: WaveScaling,
    entries: VecDeque<SpawnEntry>,
    accumulator: Duration,
}

/// Represents the authoritative Lane Defence world state.
#[derive(Debug)]
pub struct World {
    path: Path,
    enemies: Pool<Enemy>,
    projectiles: Pool<Projectile>,
    towers: BTreeMap<TowerId, Tower>,
    next_tower_id: u32,
    spatial: SpatialGrid,
    economy: Economy,
    phase: Phase,
    planning_remaining: Duration,
    wave: u32,
    schedule: Option<ActiveSchedule>,
    /// Set between `WaveStarted` and the arrival of the queued schedule so
    /// the combat-clear check cannot fire into the gap.
    awaiting_schedule: bool,
    game_over: bool,
    target_scratch: Vec<EnemyId>,
}

impl World {
    /// Creates a new world with default starting resources.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates a new world with explicit starting resources.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        let width = GRID_COLS as f32 * TILE_SIZE;
        let height = GRID_ROWS as f32 * TILE_SIZE;
        Self {
            path: Path::lane(),
            enemies: Pool::with_prewarm(ENEMY_POOL_PREWARM),
            projectiles: Pool::with_prewarm(PROJECTILE_POOL_PREWARM),
            towers: BTreeMap::new(),
            next_tower_id: 0,
            spatial: SpatialGrid::new(width, height, TILE_SIZE),
            economy: Economy::new(config.starting_money, config.starting_lives),
            phase: Phase::Planning,
            planning_remaining: PLANNING_DURATION,
            wave: 0,
            schedule: None,
            awaiting_schedule: false,
            game_over: false,
            target_scratch: Vec::new(),
        }
    }

    fn tower_id_at(&self, tile: TileCoord) -> Option<TowerId> {
        self.towers
            .values()
            .find(|tower| tower.tile == tile)
            .map(|tower| tower.id)
    }

    fn tile_in_bounds(tile: TileCoord) -> bool {
        tile.column() < GRID_COLS && tile.row() < GRID_ROWS
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        if self.game_over {
            // Terminal state: keep surfacing state, mutate nothing.
            return;
        }

        out_events.push(Event::TimeAdvanced { dt });
        self.advance_phase(dt, out_events);
        self.run_spawns(dt, out_events);

        let dt_secs = dt.as_secs_f32();
        self.update_enemies(dt_secs, out_events);
        self.rebuild_spatial();
        self.update_towers(dt_secs, out_events);
        self.update_projectiles(dt_secs, out_events);
    }

    fn advance_phase(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        match self.phase {
            Phase::Planning => {
                self.planning_remaining = self.planning_remaining.saturating_sub(dt);
                if self.planning_remaining.is_zero() {
                    self.start_wave(out_events);
                }
            }
            Phase::Combat => {
                let combat_clear = self.schedule.is_none()
                    && !self.awaiting_schedule
                    && self.enemies.active_len() == 0;
                if combat_clear {
                    self.enter_planning(out_events);
                }
            }
        }
    }

    fn start_wave(&mut self, out_events: &mut Vec<Event>) {
        self.phase = Phase::Combat;
        self.wave += 1;
        self.awaiting_schedule = true;
        out_events.push(Event::PhaseChanged {
            phase: Phase::Combat,
        });
        out_events.push(Event::WaveStarted { wave: self.wave });
    }

    fn enter_planning(&mut self, out_events: &mut Vec<Event>) {
        self.phase = Phase::Planning;
        self.planning_remaining = PLANNING_DURATION;
        out_events.push(Event::PhaseChanged {
            phase: Phase::Planning,
        });
    }

    fn run_spawns(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let Some(schedule) = self.schedule.as_mut() else {
            return;
        };
        schedule.accumulator = schedule.accumulator.saturating_add(dt);

        let scaling = schedule.scaling;
        let mut due: Vec<EnemyKind> = Vec::new();
        while let Some(entry) = schedule.entries.front().copied() {
            if entry.delay > schedule.accumulator {
                break;
            }
            schedule.accumulator -= entry.delay;
            let _ = schedule.entries.pop_front();
            due.push(entry.kind);
        }
        let finished = schedule.entries.is_empty();

        for kind in due {
            let slot = self.enemies.acquire();
            if let Some(enemy) = self.enemies.get_mut(slot) {
                enemy.configure(kind, scaling, self.path.steps());
                out_events.push(Event::EnemySpawned {
                    enemy: enemy_id(slot),
                    kind,
                });
            }
        }

        if finished {
            self.schedule = None;
        }
    }

    fn update_enemies(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        for slot in self.enemies.active_slots() {
            let mut leaked = false;
            if let Some(enemy) = self.enemies.get_mut(slot) {
                enemy.advance(dt, self.path.steps());
                leaked = enemy.leaked;
            }

            if leaked {
                let remaining = self.economy.charge_leak();
                out_events.push(Event::EnemyLeaked {
                    enemy: enemy_id(slot),
                    lives_remaining: remaining,
                });
                let _ = self.enemies.release(slot);
                if remaining == 0 && !self.game_over {
                    self.game_over = true;
                    out_events.push(Event::GameOver);
                }
            }
        }
    }

    fn rebuild_spatial(&mut self) {
        self.spatial.clear();
        for (slot, enemy) in self.enemies.iter_active() {
            self.spatial.insert(enemy_id(slot), enemy.x, enemy.y);
        }
    }

    fn update_towers(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        let tower_ids: Vec<TowerId> = self.towers.keys().copied().collect();

        for id in tower_ids {
            let (center, range, range_sq, damage) = {
                let Some(tower) = self.towers.get_mut(&id) else {
                    continue;
                };
                tower.tick_cooldown(dt);
                if !tower.is_ready() {
                    continue;
                }
                (
                    tower.center(),
                    tower.range(),
                    tower.range_sq(),
                    tower.damage(),
                )
            };

            let mut candidates = std::mem::take(&mut self.target_scratch);
            self.spatial
                .query_circle(center.x(), center.y(), range, &mut candidates);
            let best = nearest_living_target(&self.enemies, &candidates, center, range_sq);
            self.target_scratch = candidates;

            let Some(target) = best else {
                // No cooldown reset on a miss: the tower fires on the first
                // tick a target qualifies.
                continue;
            };

            let projectile_slot = self.projectiles.acquire();
            if let Some(projectile) = self.projectiles.get_mut(projectile_slot) {
                projectile.configure(center, target, damage);
            }
            if let Some(tower) = self.towers.get_mut(&id) {
                tower.reset_cooldown();
            }
            out_events.push(Event::ShotFired { tower: id });
        }
    }

    fn update_projectiles(&mut self, dt: f32, out_events: &mut Vec<Event>) {
        for slot in self.projectiles.active_slots() {
            let mut resolution: Option<(EnemyId, u32)> = None;

            if let Some(projectile) = self.projectiles.get_mut(slot) {
                if !projectile.done {
                    let target_state = projectile.target.and_then(|target| {
                        self.enemies
                            .get(enemy_slot(target))
                            .map(|enemy| (target, enemy.x, enemy.y, enemy.dead, enemy.leaked))
                    });

                    match target_state {
                        None | Some((_, _, _, true, _)) | Some((_, _, _, _, true)) => {
                            // Target already gone: retire with no effect.
                            projectile.done = true;
                        }
                        Some((target, tx, ty, _, _)) => {
                            let dx = tx - projectile.x;
                            let dy = ty - projectile.y;
                            let dist = (dx * dx + dy * dy).sqrt().max(1e-6);
                            let step = PROJECTILE_SPEED * dt;

                            if dist <= PROJECTILE_HIT_RADIUS || step >= dist {
                                projectile.x = tx;
                                projectile.y = ty;
                                projectile.done = true;
                                resolution = Some((target, projectile.damage));
                            } else {
                                projectile.x += dx / dist * step;
                                projectile.y += dy / dist * step;
                            }
                        }
                    }
                }
            }

            // Collision resolution is centralized here rather than inside the
            // projectile, so each projectile applies damage at most once per
            // tick and the reward latch has a single owner.
            if let Some((target, damage)) = resolution {
                if let Some(enemy) = self.enemies.get_mut(enemy_slot(target)) {
                    if !enemy.dead && !enemy.leaked {
                        let killed = enemy.take_damage(damage as f32);
                        if killed && !enemy.reward_granted {
                            enemy.reward_granted = true;
                            let reward = enemy.reward;
                            self.economy.credit(reward);
                            out_events.push(Event::EnemyKilled {
                                enemy: target,
                                reward,
                            });
                        }
                    }
                }
            }
        }

        // Terminal entities are released in the same tick they retire.
        for slot in self.projectiles.active_slots() {
            let done = self.projectiles.get(slot).map_or(false, |p| p.done);
            if done {
                let _ = self.projectiles.release(slot);
            }
        }
        for slot in self.enemies.active_slots() {
            let dead = self
                .enemies
                .get(slot)
                .map_or(false, |enemy| enemy.dead || enemy.leaked);
            if dead {
                let _ = self.enemies.release(slot);
            }
        }
    }

    fn handle_place(&mut self, kind: TowerKind, tile: TileCoord, out_events: &mut Vec<Event>) {
        if self.game_over {
            return;
        }

        let reason = if !Self::tile_in_bounds(tile) {
            Some(PlacementError::OutOfBounds)
        } else if self.path.blocks(tile) {
            Some(PlacementError::OnPath)
        } else if self.tower_id_at(tile).is_some() {
            Some(PlacementError::Occupied)
        } else {
            None
        };

        if let Some(reason) = reason {
            out_events.push(Event::PlacementRejected { kind, tile, reason });
            return;
        }

        let cost = self.economy.next_cost(kind);
        if !self.economy.debit(cost) {
            out_events.push(Event::PlacementRejected {
                kind,
                tile,
                reason: PlacementError::InsufficientFunds,
            });
            return;
        }

        let id = TowerId::new(self.next_tower_id);
        self.next_tower_id += 1;
        let _ = self.towers.insert(id, Tower::new(id, kind, tile, cost));
        // Registered only after the deduction succeeded, so a declined
        // purchase never escalates the price.
        self.economy.register_purchase(kind);
        out_events.push(Event::TowerPlaced {
            tower: id,
            kind,
            tile,
            cost,
        });
    }

    fn handle_sell(&mut self, tile: TileCoord, out_events: &mut Vec<Event>) {
        if self.game_over {
            return;
        }

        let Some(id) = self.tower_id_at(tile) else {
            out_events.push(Event::SellRejected {
                tile,
                reason: SellError::MissingTower,
            });
            return;
        };

        if let Some(tower) = self.towers.remove(&id) {
            let refund = tower.sell_value();
            // The purchase counter is deliberately left untouched: prices
            // never drop back after a sale.
            self.economy.credit(refund);
            out_events.push(Event::TowerSold { tower: id, refund });
        }
    }

    fn handle_upgrade(&mut self, tile: TileCoord, track: UpgradeTrack, out_events: &mut Vec<Event>) {
        if self.game_over {
            return;
        }

        let Some(id) = self.tower_id_at(tile) else {
            out_events.push(Event::UpgradeRejected {
                tile,
                track,
                reason: UpgradeError::MissingTower,
            });
            return;
        };

        let (cost, capped) = match self.towers.get(&id) {
            Some(tower) => (tower.upgrade_cost(track), tower.at_level_cap(track)),
            None => return,
        };

        if capped {
            out_events.push(Event::UpgradeRejected {
                tile,
                track,
                reason: UpgradeError::MaxLevel,
            });
            return;
        }

        if !self.economy.debit(cost) {
            out_events.push(Event::UpgradeRejected {
                tile,
                track,
                reason: UpgradeError::InsufficientFunds,
            });
            return;
        }

        if let Some(tower) = self.towers.get_mut(&id) {
            let level = tower.apply_upgrade(track);
            out_events.push(Event::TowerUpgraded {
                tower: id,
                track,
                level,
                cost,
            });
        }
    }

    fn queue_wave(&mut self, schedule: SpawnSchedule, out_events: &mut Vec<Event>) {
        if self.game_over {
            // A schedule arriving after the run ended must not fire into
            // stale state.
            return;
        }

        self.awaiting_schedule = false;

        if schedule.is_empty() {
            // Nothing to fight: return to planning instead of stalling in
            // an unwinnable combat phase.
            if self.phase == Phase::Combat && self.enemies.active_len() == 0 {
                self.enter_planning(out_events);
            }
            return;
        }

        self.schedule = Some(ActiveSchedule {
            scaling: schedule.scaling,
            entries: schedule.entries.into(),
            accumulator: Duration::ZERO,
        });
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Selects the nearest living candidate within the exact squared range.
///
/// The broad-phase candidate list may overshoot the circle, so every entry
/// is re-verified against `range_sq`. Ties at identical distance are broken
/// by the smaller [`EnemyId`], which keeps acquisition deterministic.
fn nearest_living_target(
    enemies: &Pool<Enemy>,
    candidates: &[EnemyId],
    center: PixelPoint,
    range_sq: f32,
) -> Option<EnemyId> {
    let mut best: Option<(f32, EnemyId)> = None;

    for &candidate in candidates {
        let Some(enemy) = enemies.get(enemy_slot(candidate)) else {
            continue;
        };
        if enemy.dead || enemy.leaked {
            continue;
        }

        let dx = enemy.x - center.x();
        let dy = enemy.y - center.y();
        let dist_sq = dx * dx + dy * dy;
        if dist_sq > range_sq {
            continue;
        }

        let closer = match best {
            None => true,
            Some((best_dist, best_id)) => {
                dist_sq < best_dist || (dist_sq == best_dist && candidate < best_id)
            }
        };
        if closer {
            best = Some((dist_sq, candidate));
        }
    }

    best.map(|(_, id)| id)
}

fn enemy_id(slot: Slot) -> EnemyId {
    EnemyId::new(slot.index, slot.generation)
}

fn enemy_slot(id: EnemyId) -> Slot {
    Slot {
        index: id.index(),
        generation: id.generation(),
    }
}

fn projectile_id(slot: Slot) -> ProjectileId {
    ProjectileId::new(slot.index, slot.generation)
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::PlaceTower { kind, tile } => world.handle_place(kind, tile, out_events),
        Command::SellTower { tile } => world.handle_sell(tile, out_events),
        Command::UpgradeTower { tile, track } => world.handle_upgrade(tile, track, out_events),
        Command::QueueWave { schedule } => world.queue_wave(schedule, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use lane_defence_core::{
        EnemyId, EnemyKind, Phase, PixelPoint, ProjectileId, TileCoord, TowerId, TowerKind,
        UpgradeTrack,
    };

    use super::{enemy_id, projectile_id, World};

    /// Currency currently held by the player.
    #[must_use]
    pub fn money(world: &World) -> u32 {
        world.economy.money()
    }

    /// Lives remaining before the run ends.
    #[must_use]
    pub fn lives(world: &World) -> u32 {
        world.economy.lives()
    }

    /// One-indexed number of the most recently started wave.
    #[must_use]
    pub fn wave(world: &World) -> u32 {
        world.wave
    }

    /// Phase the state machine currently occupies.
    #[must_use]
    pub fn phase(world: &World) -> Phase {
        world.phase
    }

    /// Time left on the planning countdown.
    #[must_use]
    pub fn planning_remaining(world: &World) -> Duration {
        world.planning_remaining
    }

    /// Whether the run has reached its terminal state.
    #[must_use]
    pub fn game_over(world: &World) -> bool {
        world.game_over
    }

    /// Whether the current wave still has spawns outstanding.
    #[must_use]
    pub fn is_spawning(world: &World) -> bool {
        world.schedule.is_some() || world.awaiting_schedule
    }

    /// Number of scheduled spawns not yet executed this wave.
    #[must_use]
    pub fn remaining_spawns(world: &World) -> usize {
        world
            .schedule
            .as_ref()
            .map_or(0, |schedule| schedule.entries.len())
    }

    /// Number of enemies currently alive on the lane.
    #[must_use]
    pub fn live_enemy_count(world: &World) -> usize {
        world.enemies.active_len()
    }

    /// Price the next tower of the kind would cost right now.
    #[must_use]
    pub fn next_tower_cost(world: &World, kind: TowerKind) -> u32 {
        world.economy.next_cost(kind)
    }

    /// Towers of the kind purchased so far (drives price escalation).
    #[must_use]
    pub fn purchase_count(world: &World, kind: TowerKind) -> u32 {
        world.economy.purchase_count(kind)
    }

    /// Identifier of the tower occupying the tile, if any.
    #[must_use]
    pub fn tower_at(world: &World, tile: TileCoord) -> Option<TowerId> {
        world.tower_id_at(tile)
    }

    /// Whether a tower may legally be placed on the tile right now.
    #[must_use]
    pub fn is_buildable(world: &World, tile: TileCoord) -> bool {
        World::tile_in_bounds(tile)
            && !world.path.blocks(tile)
            && world.tower_id_at(tile).is_none()
    }

    /// Dense per-tile enemy route for presentation purposes.
    #[must_use]
    pub fn lane_steps(world: &World) -> &[TileCoord] {
        world.path.steps()
    }

    /// Captures a read-only view of the enemies on the lane.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots = world
            .enemies
            .iter_active()
            .map(|(slot, enemy)| EnemySnapshot {
                id: enemy_id(slot),
                kind: enemy.kind,
                position: PixelPoint::new(enemy.x, enemy.y),
                hp: enemy.hp,
                max_hp: enemy.max_hp,
            })
            .collect();
        EnemyView { snapshots }
    }

    /// Captures a read-only view of the placed towers.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        let snapshots = world
            .towers
            .values()
            .map(|tower| TowerSnapshot {
                id: tower.id,
                kind: tower.kind,
                tile: tower.tile,
                purchase_price: tower.purchase_price,
                damage: tower.damage(),
                range: tower.range(),
                fire_rate: tower.fire_rate(),
                damage_level: tower.track_level(UpgradeTrack::Damage),
                range_level: tower.track_level(UpgradeTrack::Range),
                fire_rate_level: tower.track_level(UpgradeTrack::FireRate),
            })
            .collect();
        TowerView { snapshots }
    }

    /// Captures a read-only view of the projectiles in flight.
    #[must_use]
    pub fn projectile_view(world: &World) -> ProjectileView {
        let snapshots = world
            .projectiles
            .iter_active()
            .map(|(slot, projectile)| ProjectileSnapshot {
                id: projectile_id(slot),
                position: PixelPoint::new(projectile.x, projectile.y),
            })
            .collect();
        ProjectileView { snapshots }
    }

    /// Occupancy statistics for one entity pool.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct PoolStats {
        /// Live occupants.
        pub active: usize,
        /// Idle slots awaiting reuse.
        pub idle: usize,
        /// Total slots ever constructed.
        pub capacity: usize,
    }

    /// Recycling statistics for the enemy and projectile pools.
    #[must_use]
    pub fn pool_stats(world: &World) -> (PoolStats, PoolStats) {
        (
            PoolStats {
                active: world.enemies.active_len(),
                idle: world.enemies.idle_len(),
                capacity: world.enemies.capacity(),
            },
            PoolStats {
                active: world.projectiles.active_len(),
                idle: world.projectiles.idle_len(),
                capacity: world.projectiles.capacity(),
            },
        )
    }

    /// Immutable representation of a single enemy used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct EnemySnapshot {
        /// Generation-checked handle of the enemy.
        pub id: EnemyId,
        /// Kind of the enemy.
        pub kind: EnemyKind,
        /// Center position in pixel space.
        pub position: PixelPoint,
        /// Current hit points.
        pub hp: f32,
        /// Hit points at spawn time.
        pub max_hp: u32,
    }

    impl EnemySnapshot {
        /// Remaining health as a fraction in `[0, 1]` for health bars.
        #[must_use]
        pub fn health_fraction(&self) -> f32 {
            if self.max_hp == 0 {
                return 0.0;
            }
            (self.hp / self.max_hp as f32).clamp(0.0, 1.0)
        }
    }

    /// Read-only snapshot describing all enemies on the lane.
    #[derive(Clone, Debug, Default)]
    pub struct EnemyView {
        snapshots: Vec<EnemySnapshot>,
    }

    impl EnemyView {
        /// Iterator over the captured snapshots in ascending slot order.
        pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<EnemySnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single tower used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct TowerSnapshot {
        /// Identifier allocated by the world.
        pub id: TowerId,
        /// Kind of the tower.
        pub kind: TowerKind,
        /// Tile anchoring the tower.
        pub tile: TileCoord,
        /// Price actually paid at purchase time.
        pub purchase_price: u32,
        /// Current projectile damage after upgrades.
        pub damage: u32,
        /// Current targeting radius after upgrades.
        pub range: f32,
        /// Current shots per second after upgrades.
        pub fire_rate: f32,
        /// Level of the damage track.
        pub damage_level: u8,
        /// Level of the range track.
        pub range_level: u8,
        /// Level of the fire-rate track.
        pub fire_rate_level: u8,
    }

    /// Read-only snapshot describing all placed towers.
    #[derive(Clone, Debug, Default)]
    pub struct TowerView {
        snapshots: Vec<TowerSnapshot>,
    }

    impl TowerView {
        /// Iterator over the captured snapshots in identifier order.
        pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<TowerSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single projectile used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ProjectileSnapshot {
        /// Generation-checked handle of the projectile.
        pub id: ProjectileId,
        /// Center position in pixel space.
        pub position: PixelPoint,
    }

    /// Read-only snapshot describing all projectiles in flight.
    #[derive(Clone, Debug, Default)]
    pub struct ProjectileView {
        snapshots: Vec<ProjectileSnapshot>,
    }

    impl ProjectileView {
        /// Iterator over the captured snapshots in ascending slot order.
        pub fn iter(&self) -> impl Iterator<Item = &ProjectileSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<ProjectileSnapshot> {
            self.snapshots
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_defence_core::SpawnSchedule;

    const TICK: Duration = Duration::from_micros(16_667);

    fn schedule_of(kinds: &[EnemyKind]) -> SpawnSchedule {
        SpawnSchedule {
            scaling: WaveScaling::IDENTITY,
            entries: kinds
                .iter()
                .map(|&kind| SpawnEntry {
                    kind,
                    delay: Duration::ZERO,
                })
                .collect(),
        }
    }

    fn drain_planning(world: &mut World, events: &mut Vec<Event>) {
        // Run ticks until the planning countdown triggers a wave start.
        for _ in 0..400 {
            apply(world, Command::Tick { dt: TICK }, events);
            if events.iter().any(|e| matches!(e, Event::WaveStarted { .. })) {
                return;
            }
        }
        panic!("planning countdown never elapsed");
    }

    #[test]
    fn fresh_world_starts_in_planning_with_default_resources() {
        let world = World::new();
        assert_eq!(query::phase(&world), Phase::Planning);
        assert_eq!(query::money(&world), 100);
        assert_eq!(query::lives(&world), 20);
        assert_eq!(query::wave(&world), 0);
        assert!(!query::game_over(&world));
    }

    #[test]
    fn planning_countdown_starts_the_first_wave() {
        let mut world = World::new();
        let mut events = Vec::new();
        drain_planning(&mut world, &mut events);
        assert_eq!(query::phase(&world), Phase::Combat);
        assert_eq!(query::wave(&world), 1);
        assert!(query::is_spawning(&world), "world awaits the schedule");
    }

    #[test]
    fn placement_succeeds_on_a_buildable_tile() {
        let mut world = World::new();
        let mut events = Vec::new();
        let tile = TileCoord::new(2, 2);
        assert!(query::is_buildable(&world, tile));

        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Basic,
                tile,
            },
            &mut events,
        );

        assert!(events.iter().any(|e| matches!(
            e,
            Event::TowerPlaced {
                kind: TowerKind::Basic,
                cost: 50,
                ..
            }
        )));
        assert_eq!(query::money(&world), 50);
        assert_eq!(query::purchase_count(&world, TowerKind::Basic), 1);
        assert!(query::tower_at(&world, tile).is_some());
    }

    #[test]
    fn placement_is_rejected_with_a_specific_reason() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Basic,
                tile: TileCoord::new(99, 99),
            },
            &mut events,
        );
        assert!(events.iter().any(|e| matches!(
            e,
            Event::PlacementRejected {
                reason: PlacementError::OutOfBounds,
                ..
            }
        )));

        events.clear();
        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Basic,
                tile: TileCoord::new(1, 0),
            },
            &mut events,
        );
        assert!(events.iter().any(|e| matches!(
            e,
            Event::PlacementRejected {
                reason: PlacementError::OnPath,
                ..
            }
        )));

        events.clear();
        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Heavy,
                tile: TileCoord::new(2, 2),
            },
            &mut events,
        );
        assert!(
            events.iter().any(|e| matches!(
                e,
                Event::PlacementRejected {
                    reason: PlacementError::InsufficientFunds,
                    ..
                }
            )),
            "120 exceeds the starting 100"
        );
        assert_eq!(query::money(&world), 100, "declined purchases charge nothing");
        assert_eq!(query::purchase_count(&world, TowerKind::Heavy), 0);
    }

    #[test]
    fn occupied_tile_rejects_a_second_tower() {
        let mut world = World::with_config(WorldConfig {
            starting_money: 500,
            starting_lives: 20,
        });
        let mut events = Vec::new();
        let tile = TileCoord::new(2, 2);

        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Basic,
                tile,
            },
            &mut events,
        );
        events.clear();
        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Rapid,
                tile,
            },
            &mut events,
        );
        assert!(events.iter().any(|e| matches!(
            e,
            Event::PlacementRejected {
                reason: PlacementError::Occupied,
                ..
            }
        )));
    }

    #[test]
    fn selling_refunds_three_quarters_and_keeps_the_counter() {
        let mut world = World::new();
        let mut events = Vec::new();
        let tile = TileCoord::new(2, 2);

        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Basic,
                tile,
            },
            &mut events,
        );
        assert_eq!(query::money(&world), 50);

        events.clear();
        apply(&mut world, Command::SellTower { tile }, &mut events);

        assert!(events
            .iter()
            .any(|e| matches!(e, Event::TowerSold { refund: 37, .. })));
        assert_eq!(query::money(&world), 87);
        assert!(query::tower_at(&world, tile).is_none());
        assert_eq!(
            query::purchase_count(&world, TowerKind::Basic),
            1,
            "prices never drop back after a sale"
        );
    }

    #[test]
    fn selling_an_empty_tile_declines() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SellTower {
                tile: TileCoord::new(2, 2),
            },
            &mut events,
        );
        assert!(events.iter().any(|e| matches!(
            e,
            Event::SellRejected {
                reason: SellError::MissingTower,
                ..
            }
        )));
        assert_eq!(query::money(&world), 100);
    }

    #[test]
    fn upgrades_charge_and_cap_per_track() {
        let mut world = World::with_config(WorldConfig {
            starting_money: 10_000,
            starting_lives: 20,
        });
        let mut events = Vec::new();
        let tile = TileCoord::new(2, 2);
        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Basic,
                tile,
            },
            &mut events,
        );

        for expected_level in 1..=5u8 {
            events.clear();
            apply(
                &mut world,
                Command::UpgradeTower {
                    tile,
                    track: UpgradeTrack::Damage,
                },
                &mut events,
            );
            assert!(events.iter().any(|e| matches!(
                e,
                Event::TowerUpgraded { level, .. } if *level == expected_level
            )));
        }

        events.clear();
        apply(
            &mut world,
            Command::UpgradeTower {
                tile,
                track: UpgradeTrack::Damage,
            },
            &mut events,
        );
        assert!(events.iter().any(|e| matches!(
            e,
            Event::UpgradeRejected {
                reason: UpgradeError::MaxLevel,
                ..
            }
        )));
    }

    #[test]
    fn upgrade_without_funds_declines_without_charge() {
        let mut world = World::with_config(WorldConfig {
            starting_money: 60,
            starting_lives: 20,
        });
        let mut events = Vec::new();
        let tile = TileCoord::new(2, 2);
        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Basic,
                tile,
            },
            &mut events,
        );
        assert_eq!(query::money(&world), 10);

        events.clear();
        apply(
            &mut world,
            Command::UpgradeTower {
                tile,
                track: UpgradeTrack::Range,
            },
            &mut events,
        );
        assert!(events.iter().any(|e| matches!(
            e,
            Event::UpgradeRejected {
                reason: UpgradeError::InsufficientFunds,
                ..
            }
        )));
        assert_eq!(query::money(&world), 10);
    }

    #[test]
    fn queued_wave_spawns_enemies_on_subsequent_ticks() {
        let mut world = World::new();
        let mut events = Vec::new();
        drain_planning(&mut world, &mut events);

        events.clear();
        apply(
            &mut world,
            Command::QueueWave {
                schedule: schedule_of(&[EnemyKind::Basic, EnemyKind::Fast]),
            },
            &mut events,
        );
        apply(&mut world, Command::Tick { dt: TICK }, &mut events);

        let spawned: Vec<EnemyKind> = events
            .iter()
            .filter_map(|e| match e {
                Event::EnemySpawned { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect();
        assert_eq!(spawned, vec![EnemyKind::Basic, EnemyKind::Fast]);
        assert_eq!(query::live_enemy_count(&world), 2);
        assert!(!query::is_spawning(&world), "schedule fully executed");
    }

    #[test]
    fn empty_schedule_returns_to_planning_immediately() {
        let mut world = World::new();
        let mut events = Vec::new();
        drain_planning(&mut world, &mut events);

        events.clear();
        apply(
            &mut world,
            Command::QueueWave {
                schedule: schedule_of(&[]),
            },
            &mut events,
        );
        assert_eq!(query::phase(&world), Phase::Planning);
        assert!(events.iter().any(|e| matches!(
            e,
            Event::PhaseChanged {
                phase: Phase::Planning
            }
        )));
    }

    #[test]
    fn spawn_delays_are_honored_by_the_tick_countdown() {
        let mut world = World::new();
        let mut events = Vec::new();
        drain_planning(&mut world, &mut events);

        let schedule = SpawnSchedule {
            scaling: WaveScaling::IDENTITY,
            entries: vec![
                SpawnEntry {
                    kind: EnemyKind::Basic,
                    delay: Duration::ZERO,
                },
                SpawnEntry {
                    kind: EnemyKind::Basic,
                    delay: Duration::from_millis(500),
                },
            ],
        };
        events.clear();
        apply(&mut world, Command::QueueWave { schedule }, &mut events);

        apply(&mut world, Command::Tick { dt: TICK }, &mut events);
        assert_eq!(query::live_enemy_count(&world), 1, "second spawn is not due");
        assert_eq!(query::remaining_spawns(&world), 1);

        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(500),
            },
            &mut events,
        );
        assert_eq!(query::live_enemy_count(&world), 2);
        assert_eq!(query::remaining_spawns(&world), 0);
    }

    #[test]
    fn nearest_target_wins_and_ties_break_on_smaller_id() {
        let mut enemies: Pool<Enemy> = Pool::with_prewarm(0);
        let center = PixelPoint::new(0.0, 0.0);

        let near = enemies.acquire();
        let far = enemies.acquire();
        let tie_a = enemies.acquire();
        let tie_b = enemies.acquire();
        for (slot, x, y) in [
            (near, 30.0, 0.0),
            (far, 90.0, 0.0),
            (tie_a, 0.0, 50.0),
            (tie_b, 50.0, 0.0),
        ] {
            let enemy = enemies.get_mut(slot).expect("live slot");
            enemy.x = x;
            enemy.y = y;
        }

        let all: Vec<EnemyId> = enemies.active_slots().iter().map(|&s| enemy_id(s)).collect();
        let best = nearest_living_target(&enemies, &all, center, 100.0 * 100.0);
        assert_eq!(best, Some(enemy_id(near)));

        let ties = vec![enemy_id(tie_b), enemy_id(tie_a)];
        let best = nearest_living_target(&enemies, &ties, center, 100.0 * 100.0);
        assert_eq!(
            best,
            Some(enemy_id(tie_a).min(enemy_id(tie_b))),
            "equidistant candidates resolve to the smaller handle"
        );
    }

    #[test]
    fn range_boundary_is_inclusive() {
        let mut enemies: Pool<Enemy> = Pool::with_prewarm(0);
        let center = PixelPoint::new(0.0, 0.0);
        let range: f32 = 100.0;

        let on_boundary = enemies.acquire();
        enemies.get_mut(on_boundary).expect("live slot").x = range;

        let candidates = vec![enemy_id(on_boundary)];
        assert_eq!(
            nearest_living_target(&enemies, &candidates, center, range * range),
            Some(enemy_id(on_boundary)),
            "distance exactly equal to range qualifies"
        );

        enemies.get_mut(on_boundary).expect("live slot").x = range + 0.5;
        assert_eq!(
            nearest_living_target(&enemies, &candidates, center, range * range),
            None,
            "distance beyond range is excluded despite broad-phase inclusion"
        );
    }

    #[test]
    fn dead_candidates_are_never_targeted() {
        let mut enemies: Pool<Enemy> = Pool::with_prewarm(0);
        let slot = enemies.acquire();
        {
            let enemy = enemies.get_mut(slot).expect("live slot");
            enemy.x = 10.0;
            enemy.dead = true;
        }
        let candidates = vec![enemy_id(slot)];
        assert_eq!(
            nearest_living_target(&enemies, &candidates, PixelPoint::new(0.0, 0.0), 10_000.0),
            None
        );
    }

    #[test]
    fn a_lone_tower_kills_a_lone_enemy_and_pays_its_reward() {
        let mut world = World::new();
        let mut events = Vec::new();

        // Basic tower beside the first two lane rows: the enemy stays in
        // range long enough for three shots, which is exactly lethal.
        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Basic,
                tile: TileCoord::new(2, 2),
            },
            &mut events,
        );
        assert_eq!(query::money(&world), 50);

        drain_planning(&mut world, &mut events);
        apply(
            &mut world,
            Command::QueueWave {
                schedule: schedule_of(&[EnemyKind::Basic]),
            },
            &mut events,
        );

        events.clear();
        let mut killed = false;
        for _ in 0..10_000 {
            apply(&mut world, Command::Tick { dt: TICK }, &mut events);
            if events.iter().any(|e| matches!(e, Event::EnemyKilled { .. })) {
                killed = true;
                break;
            }
        }
        assert!(killed, "the enemy must die inside tower range");
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::EnemyKilled { reward: 5, .. })));
        assert_eq!(query::money(&world), 55, "exactly one reward of 5 paid");
        assert_eq!(query::live_enemy_count(&world), 0, "enemy returned to pool");
        assert_eq!(query::lives(&world), 20, "a kill never charges a life");
    }

    #[test]
    fn two_projectiles_in_one_tick_pay_the_reward_once() {
        let mut world = World::new();
        let mut events = Vec::new();

        let enemy_slot = world.enemies.acquire();
        let target = enemy_id(enemy_slot);
        {
            let enemy = world.enemies.get_mut(enemy_slot).expect("live slot");
            enemy.configure(EnemyKind::Basic, WaveScaling::IDENTITY, world.path.steps());
            enemy.speed = 1.0; // hold the enemy near its spawn point
        }

        for _ in 0..2 {
            let slot = world.projectiles.acquire();
            let origin = {
                let enemy = world.enemies.get(enemy_slot).expect("live slot");
                PixelPoint::new(enemy.x + 2.0, enemy.y)
            };
            world
                .projectiles
                .get_mut(slot)
                .expect("live slot")
                .configure(origin, target, 100);
        }

        let before = query::money(&world);
        world.update_projectiles(1.0 / 60.0, &mut events);

        let kills = events
            .iter()
            .filter(|e| matches!(e, Event::EnemyKilled { .. }))
            .count();
        assert_eq!(kills, 1, "reward latch admits exactly one payout");
        assert_eq!(query::money(&world), before + 5);
        assert_eq!(query::live_enemy_count(&world), 0, "enemy released same tick");
        let (_, projectile_stats) = query::pool_stats(&world);
        assert_eq!(projectile_stats.active, 0, "both projectiles retired");
    }

    #[test]
    fn projectile_with_stale_target_retires_without_effect() {
        let mut world = World::new();
        let mut events = Vec::new();

        let enemy_slot = world.enemies.acquire();
        let stale = enemy_id(enemy_slot);
        {
            let enemy = world.enemies.get_mut(enemy_slot).expect("live slot");
            enemy.configure(EnemyKind::Basic, WaveScaling::IDENTITY, world.path.steps());
        }
        let _ = world.enemies.release(enemy_slot);

        // The slot is recycled by a different enemy; the old handle must not
        // resolve to it.
        let recycled = world.enemies.acquire();
        {
            let enemy = world.enemies.get_mut(recycled).expect("live slot");
            enemy.configure(EnemyKind::Tank, WaveScaling::IDENTITY, world.path.steps());
        }
        assert_eq!(recycled.index, enemy_slot.index);

        let slot = world.projectiles.acquire();
        world
            .projectiles
            .get_mut(slot)
            .expect("live slot")
            .configure(PixelPoint::new(0.0, 0.0), stale, 1_000);

        let before = query::money(&world);
        world.update_projectiles(1.0 / 60.0, &mut events);

        assert!(events.iter().all(|e| !matches!(e, Event::EnemyKilled { .. })));
        assert_eq!(query::money(&world), before);
        assert_eq!(query::live_enemy_count(&world), 1, "recycled enemy untouched");
    }

    #[test]
    fn game_over_freezes_subsequent_ticks() {
        let mut world = World::with_config(WorldConfig {
            starting_money: 100,
            starting_lives: 1,
        });
        let mut events = Vec::new();
        drain_planning(&mut world, &mut events);
        apply(
            &mut world,
            Command::QueueWave {
                schedule: schedule_of(&[EnemyKind::Fast]),
            },
            &mut events,
        );

        for _ in 0..120_000 {
            apply(&mut world, Command::Tick { dt: TICK }, &mut events);
            if query::game_over(&world) {
                break;
            }
        }
        assert!(query::game_over(&world), "lone leak ends a one-life run");
        assert!(events.iter().any(|e| matches!(e, Event::GameOver)));

        let money = query::money(&world);
        let lives = query::lives(&world);
        let wave = query::wave(&world);
        events.clear();
        apply(&mut world, Command::Tick { dt: TICK }, &mut events);
        assert!(events.is_empty(), "terminal ticks emit nothing");
        assert_eq!(query::money(&world), money);
        assert_eq!(query::lives(&world), lives);
        assert_eq!(query::wave(&world), wave);
    }

    #[test]
    fn commands_after_game_over_are_ignored() {
        let mut world = World::with_config(WorldConfig {
            starting_money: 100,
            starting_lives: 1,
        });
        let mut events = Vec::new();
        drain_planning(&mut world, &mut events);
        apply(
            &mut world,
            Command::QueueWave {
                schedule: schedule_of(&[EnemyKind::Fast]),
            },
            &mut events,
        );
        for _ in 0..120_000 {
            apply(&mut world, Command::Tick { dt: TICK }, &mut events);
            if query::game_over(&world) {
                break;
            }
        }

        events.clear();
        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Basic,
                tile: TileCoord::new(2, 2),
            },
            &mut events,
        );
        assert!(events.is_empty());
        assert_eq!(query::money(&world), 100);
    }
}
