//! Creature structure and foraging behavior.

use crate::config::{Config, HungerPenalty};
use crate::food::{CandyId, FoodField};
use crate::genetics::Genome;
use crate::grid::{normalize_angle, random_heading, Position};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// Unique creature identifier
pub type CreatureId = u64;

/// Candies needed in one day to become a parent
pub const CANDIES_TO_REPRODUCE: u8 = 2;

/// Result of one tick for one creature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not foraging (settled, exhausted, or dead)
    Idle,
    /// Moved without reaching a candy
    Moved,
    /// Moved and ate the given candy
    Ate(CandyId),
}

/// How a day ended for a creature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayFate {
    /// No candy, or a hunger penalty that used up the whole budget
    Starved,
    /// One candy: lives on with a longer hunger streak
    Survived,
    /// Two candies: eligible to reproduce
    Parent,
}

/// Per-tick constants shared by every creature in a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForagingParams {
    /// k_r
    pub sight_cost: f64,
    /// k_theta
    pub focus_cost: f64,
    /// Floor applied to the focus angle before computing its cost
    pub min_focus_angle: f64,
    /// Candies within this distance after a move are eaten
    pub consumption_radius: f64,
}

impl ForagingParams {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sight_cost: config.energy.sight_cost,
            focus_cost: config.energy.focus_cost,
            min_focus_angle: config.genes.min_focus_angle,
            consumption_radius: config.world.consumption_radius,
        }
    }

    /// Focus angle actually used for steering and cost
    #[inline]
    pub fn effective_focus(&self, genome: &Genome) -> f64 {
        genome.focus_angle.clamp(self.min_focus_angle, PI)
    }

    /// Energy spent per tick: `v^2 + r * k_r + cot(theta / 2) * k_theta`
    pub fn tick_cost(&self, genome: &Genome) -> f64 {
        let kinetic = genome.speed * genome.speed;
        let sight = genome.view_range * self.sight_cost;
        let half = self.effective_focus(genome) / 2.0;
        let focus = self.focus_cost / half.tan();
        kinetic + sight + focus
    }
}

/// A creature in the simulation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    // Identity
    pub id: CreatureId,
    pub generation: u32,
    pub parents: Option<(CreatureId, CreatureId)>,

    // Physical state
    pub position: Position,
    pub heading: f64,
    pub energy: f64,
    pub energy_spent: f64,

    // Daily bookkeeping
    pub candies_eaten: u8,
    pub hunger_streak: u32,
    pub alive: bool,
    /// Forced to stop before settling on its own (tick budget exhausted)
    pub halted: bool,

    // Chromosome, fixed for life
    pub genome: Genome,
}

impl Creature {
    /// Create a founding creature
    pub fn new(id: CreatureId, position: Position, genome: Genome) -> Self {
        Self {
            id,
            generation: 0,
            parents: None,
            position,
            heading: 0.0,
            energy: 0.0,
            energy_spent: 0.0,
            candies_eaten: 0,
            hunger_streak: 0,
            alive: true,
            halted: false,
            genome,
        }
    }

    /// Create a child of two parents
    pub fn offspring(
        id: CreatureId,
        position: Position,
        genome: Genome,
        parent1: &Creature,
        parent2: &Creature,
    ) -> Self {
        Self {
            generation: parent1.generation.max(parent2.generation) + 1,
            parents: Some((parent1.id, parent2.id)),
            ..Self::new(id, position, genome)
        }
    }

    /// Energy budget for the coming day given the creature's hunger streak
    pub fn morning_energy(&self, daily_energy: f64, penalty: HungerPenalty, fraction: f64) -> f64 {
        if self.hunger_streak == 0 {
            return daily_energy;
        }
        let n = f64::from(self.hunger_streak);
        match penalty {
            HungerPenalty::Scaled => fraction * n * daily_energy,
            HungerPenalty::Deducted => (daily_energy * (1.0 - fraction * n)).max(0.0),
        }
    }

    /// Reset daily counters and pick a fresh random heading
    pub fn begin_day<R: Rng + ?Sized>(&mut self, energy: f64, rng: &mut R) {
        self.energy = energy;
        self.energy_spent = 0.0;
        self.candies_eaten = 0;
        self.halted = false;
        self.heading = random_heading(rng);
    }

    /// Whether the creature still forages this day
    #[inline]
    pub fn is_active(&self) -> bool {
        self.alive && !self.halted && self.energy > 0.0 && self.candies_eaten < CANDIES_TO_REPRODUCE
    }

    /// Stop foraging for the rest of the day, keeping current tallies
    pub fn halt(&mut self) {
        self.halted = true;
    }

    /// Nearest live candy in sight, if any. Blind creatures see nothing.
    pub fn perceive(&self, field: &FoodField) -> Option<CandyId> {
        if self.genome.view_range <= 0.0 {
            return None;
        }
        field
            .nearest(self.position, self.genome.view_range)
            .map(|(id, _)| id)
    }

    /// One tick of foraging.
    ///
    /// `sighted` is the result of `perceive` against the field at the start
    /// of the tick. If another creature ate that candy in the meantime the
    /// creature looks again; candies never appear mid-day, so an empty
    /// sighting stays valid.
    pub fn forage<R: Rng + ?Sized>(
        &mut self,
        sighted: Option<CandyId>,
        field: &mut FoodField,
        params: &ForagingParams,
        rng: &mut R,
    ) -> TickOutcome {
        if !self.is_active() {
            return TickOutcome::Idle;
        }

        let target = match sighted {
            Some(id) if field.position(id).is_some() => Some(id),
            Some(_) => self.perceive(field),
            None => None,
        };

        let torus = *field.torus();
        let (center, spread) = match target.and_then(|id| field.position(id)) {
            Some(candy) => (
                torus.direction(self.position, candy),
                params.effective_focus(&self.genome),
            ),
            None => (self.heading, FRAC_PI_2),
        };
        self.heading = normalize_angle(rng.gen_range(center - spread..center + spread));
        self.position = torus.advance(self.position, self.heading, self.genome.speed);

        let cost = params.tick_cost(&self.genome);
        self.energy -= cost;
        self.energy_spent += cost;

        match self.eat_nearby(field, params.consumption_radius) {
            Some(id) => TickOutcome::Ate(id),
            None => TickOutcome::Moved,
        }
    }

    /// Eat the closest live candy within `radius` (inclusive)
    pub fn eat_nearby(&mut self, field: &mut FoodField, radius: f64) -> Option<CandyId> {
        let (id, _) = field.nearest(self.position, radius)?;
        if field.consume(id) {
            self.candies_eaten += 1;
            Some(id)
        } else {
            None
        }
    }

    /// Classify the finished day and update the hunger streak
    pub fn end_day(&mut self, penalty: HungerPenalty, fraction: f64) -> DayFate {
        let fate = match self.candies_eaten {
            0 => DayFate::Starved,
            1 => {
                self.hunger_streak += 1;
                let exhausted = penalty == HungerPenalty::Deducted
                    && fraction * f64::from(self.hunger_streak) >= 1.0 - 1e-9;
                if exhausted {
                    DayFate::Starved
                } else {
                    DayFate::Survived
                }
            }
            _ => {
                self.hunger_streak = 0;
                DayFate::Parent
            }
        };

        if fate == DayFate::Starved {
            self.alive = false;
        }
        fate
    }

    /// Check if creature is alive
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive
    }
}
