//! Money, lives, and the per-kind price-escalation ledger.
//!
//! The ledger is owned by the world instance rather than shared globally so
//! multiple simulations and tests never observe each other's counters.

use lane_defence_core::TowerKind;

/// Currency, lives, and purchase bookkeeping for one simulation.
#[derive(Debug)]
pub(crate) struct Economy {
    money: u32,
    lives: u32,
    purchases: [u32; TowerKind::ALL.len()],
}

impl Economy {
    pub(crate) fn new(starting_money: u32, starting_lives: u32) -> Self {
        Self {
            money: starting_money,
            lives: starting_lives,
            purchases: [0; TowerKind::ALL.len()],
        }
    }

    pub(crate) fn money(&self) -> u32 {
        self.money
    }

    pub(crate) fn lives(&self) -> u32 {
        self.lives
    }

    /// Price of the next tower of the kind under the current counter.
    ///
    /// The price escalates only after every second purchase, so towers are
    /// effectively bought in same-price pairs.
    pub(crate) fn next_cost(&self, kind: TowerKind) -> u32 {
        let steps = self.purchase_count(kind) / 2;
        let cost = kind.base_cost() as f32 * kind.price_multiplier().powi(steps as i32);
        (cost.round() as u32).max(1)
    }

    /// Deducts `cost` if affordable; declines without mutation otherwise.
    pub(crate) fn debit(&mut self, cost: u32) -> bool {
        if self.money < cost {
            return false;
        }
        self.money -= cost;
        true
    }

    pub(crate) fn credit(&mut self, amount: u32) {
        self.money = self.money.saturating_add(amount);
    }

    /// Advances the escalation counter. Called only after a successful
    /// deduction so a declined purchase never raises the price.
    pub(crate) fn register_purchase(&mut self, kind: TowerKind) {
        self.purchases[kind_index(kind)] += 1;
    }

    pub(crate) fn purchase_count(&self, kind: TowerKind) -> u32 {
        self.purchases[kind_index(kind)]
    }

    /// Charges one life for a leaked enemy, returning the remainder.
    pub(crate) fn charge_leak(&mut self) -> u32 {
        self.lives = self.lives.saturating_sub(1);
        self.lives
    }
}

fn kind_index(kind: TowerKind) -> usize {
    match kind {
        TowerKind::Basic => 0,
        TowerKind::Rapid => 1,
        TowerKind::Heavy => 2,
    }
}
