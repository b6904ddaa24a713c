#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Session orchestration for Lane Defence hosts.
//!
//! A [`Session`] owns the world and the spawning system, pumps commands and
//! events between them every tick, and tracks the interaction state a host
//! needs to route pointer input: the selected tower kind, the sell and
//! upgrade modes, and the mute flag. Hosts drive it with [`Session::tick`]
//! plus the interaction methods, then read world state through the
//! `lane_defence_world::query` module and drain audio cues for playback.

use std::time::Duration;

use lane_defence_core::{Command, Event, TileCoord, TowerKind, UpgradeTrack};
use lane_defence_system_spawning::{Config as SpawningConfig, Spawning};
use lane_defence_world::{self as world, query, World, WorldConfig};

/// Parameters required to boot a session.
#[derive(Clone, Copy, Debug)]
pub struct SessionConfig {
    /// Seed for the spawn schedule RNG.
    pub rng_seed: u64,
    /// Starting resources for the world.
    pub world: WorldConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rng_seed: 0,
            world: WorldConfig::default(),
        }
    }
}

/// Sound effects a host should play in response to simulation events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AudioCue {
    /// A tower fired a projectile.
    Shot,
    /// An enemy was destroyed.
    EnemyDown,
    /// A tower was placed and paid for.
    TowerPlaced,
    /// A new wave began.
    WaveStarted,
    /// An enemy leaked and a life was charged.
    LifeLost,
    /// The run ended.
    GameOver,
}

/// Owns the simulation and the systems wired around it.
#[derive(Debug)]
pub struct Session {
    world: World,
    spawning: Spawning,
    events: Vec<Event>,
    audio: Vec<AudioCue>,
    selected_tower: TowerKind,
    sell_mode: bool,
    upgrade_mode: bool,
    upgrade_target: Option<TileCoord>,
    muted: bool,
}

impl Session {
    /// Boots a session from the provided configuration.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            world: World::with_config(config.world),
            spawning: Spawning::new(SpawningConfig::new(config.rng_seed)),
            events: Vec::new(),
            audio: Vec::new(),
            selected_tower: TowerKind::Basic,
            sell_mode: false,
            upgrade_mode: false,
            upgrade_target: None,
            muted: false,
        }
    }

    /// Read access to the world for `query` calls.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Events accumulated since the last tick began.
    ///
    /// Interaction commands issued between ticks append here, so a host
    /// that reads after input handling sees those events as well.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Advances simulated time by one fixed step.
    pub fn tick(&mut self, dt: Duration) -> &[Event] {
        self.events.clear();
        let _ = self.dispatch(Command::Tick { dt });
        &self.events
    }

    /// Routes a tile click according to the active interaction mode.
    pub fn handle_tile_click(&mut self, tile: TileCoord) -> bool {
        if self.upgrade_mode {
            self.select_tower_for_upgrade(tile)
        } else if self.sell_mode {
            self.sell_tower_at(tile)
        } else {
            self.place_tower_at(tile)
        }
    }

    /// Attempts to place the selected tower kind on the tile.
    pub fn place_tower_at(&mut self, tile: TileCoord) -> bool {
        let start = self.dispatch(Command::PlaceTower {
            kind: self.selected_tower,
            tile,
        });
        self.events[start..]
            .iter()
            .any(|event| matches!(event, Event::TowerPlaced { .. }))
    }

    /// Attempts to sell the tower on the tile.
    pub fn sell_tower_at(&mut self, tile: TileCoord) -> bool {
        let start = self.dispatch(Command::SellTower { tile });
        let sold = self.events[start..]
            .iter()
            .any(|event| matches!(event, Event::TowerSold { .. }));
        if sold && self.upgrade_target == Some(tile) {
            self.upgrade_target = None;
        }
        sold
    }

    /// Marks the tower on the tile as the pending upgrade target.
    pub fn select_tower_for_upgrade(&mut self, tile: TileCoord) -> bool {
        if query::tower_at(&self.world, tile).is_none() {
            return false;
        }
        self.upgrade_target = Some(tile);
        true
    }

    /// Applies one upgrade on the pending target's chosen track.
    pub fn apply_upgrade(&mut self, track: UpgradeTrack) -> bool {
        let Some(tile) = self.upgrade_target else {
            return false;
        };
        let start = self.dispatch(Command::UpgradeTower { tile, track });
        self.events[start..]
            .iter()
            .any(|event| matches!(event, Event::TowerUpgraded { .. }))
    }

    /// Tower kind that placement clicks will construct.
    #[must_use]
    pub fn selected_tower(&self) -> TowerKind {
        self.selected_tower
    }

    /// Selects the tower kind for placement and leaves both click modes.
    pub fn select_tower_kind(&mut self, kind: TowerKind) {
        self.selected_tower = kind;
        self.sell_mode = false;
        self.upgrade_mode = false;
        self.upgrade_target = None;
    }

    /// Whether clicks currently sell towers.
    #[must_use]
    pub fn sell_mode(&self) -> bool {
        self.sell_mode
    }

    /// Flips sell mode; entering it leaves upgrade mode.
    pub fn toggle_sell_mode(&mut self) -> bool {
        self.sell_mode = !self.sell_mode;
        if self.sell_mode {
            self.upgrade_mode = false;
            self.upgrade_target = None;
        }
        self.sell_mode
    }

    /// Whether clicks currently pick upgrade targets.
    #[must_use]
    pub fn upgrade_mode(&self) -> bool {
        self.upgrade_mode
    }

    /// Flips upgrade mode; entering it leaves sell mode.
    pub fn toggle_upgrade_mode(&mut self) -> bool {
        self.upgrade_mode = !self.upgrade_mode;
        if self.upgrade_mode {
            self.sell_mode = false;
        } else {
            self.upgrade_target = None;
        }
        self.upgrade_mode
    }

    /// Tile of the tower pending an upgrade, if one is selected.
    #[must_use]
    pub fn upgrade_target(&self) -> Option<TileCoord> {
        self.upgrade_target
    }

    /// Whether audio cues are currently suppressed.
    #[must_use]
    pub fn muted(&self) -> bool {
        self.muted
    }

    /// Flips the mute flag, returning the new state.
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Drains the audio cues accumulated since the last drain.
    pub fn take_audio_cues(&mut self) -> Vec<AudioCue> {
        std::mem::take(&mut self.audio)
    }

    /// Applies one command, pumps the spawning system over the fresh
    /// events, and collects audio cues. Returns the index in the event
    /// buffer where this dispatch began.
    fn dispatch(&mut self, command: Command) -> usize {
        let start = self.events.len();
        world::apply(&mut self.world, command, &mut self.events);

        let mut commands = Vec::new();
        self.spawning.handle(&self.events[start..], &mut commands);
        for command in commands {
            world::apply(&mut self.world, command, &mut self.events);
        }

        self.collect_audio(start);
        start
    }

    fn collect_audio(&mut self, from: usize) {
        if self.muted {
            return;
        }
        for event in &self.events[from..] {
            let cue = match event {
                Event::ShotFired { .. } => AudioCue::Shot,
                Event::EnemyKilled { .. } => AudioCue::EnemyDown,
                Event::TowerPlaced { .. } => AudioCue::TowerPlaced,
                Event::WaveStarted { .. } => AudioCue::WaveStarted,
                Event::EnemyLeaked { .. } => AudioCue::LifeLost,
                Event::GameOver => AudioCue::GameOver,
                _ => continue,
            };
            self.audio.push(cue);
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
