//! Day scheduler - runs one simulated day of foraging for the whole population.

use crate::config::{Config, HungerPenalty};
use crate::creature::{Creature, DayFate, ForagingParams, TickOutcome};
use crate::food::{CandyId, FoodField};
use rand::seq::SliceRandom;
use rand::Rng;
use rayon::prelude::*;

/// Summary of one finished day
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayReport {
    /// Ticks actually simulated
    pub ticks: u32,
    /// The tick bound ended the day before every creature settled
    pub tick_budget_exceeded: bool,
    /// Creatures force-stopped by the tick bound
    pub halted: usize,
    pub zero_eaters: usize,
    pub one_eaters: usize,
    pub two_eaters: usize,
    /// Creatures that died at the end of the day
    pub starved: usize,
    pub candies_spawned: usize,
    pub candies_remaining: usize,
    pub total_energy_spent: f64,
}

impl DayReport {
    /// Creatures that took part in the day
    pub fn participants(&self) -> usize {
        self.zero_eaters + self.one_eaters + self.two_eaters
    }
}

/// Drives the tick loop of a day
#[derive(Debug, Clone)]
pub struct DayScheduler {
    pub params: ForagingParams,
    pub daily_energy: f64,
    pub hunger_penalty: HungerPenalty,
    pub hunger_fraction: f64,
    pub candies_per_creature: usize,
    pub max_ticks: u32,
    pub shuffle_activation: bool,
}

impl DayScheduler {
    /// Create scheduler from config
    pub fn from_config(config: &Config) -> Self {
        Self {
            params: ForagingParams::from_config(config),
            daily_energy: config.energy.daily_energy,
            hunger_penalty: config.energy.hunger_penalty,
            hunger_fraction: config.energy.hunger_fraction,
            candies_per_creature: config.world.candies_per_creature,
            max_ticks: config.safety.max_ticks_per_day,
            shuffle_activation: config.logging.shuffle_activation,
        }
    }

    /// Run a full day: morning setup, ticks until everyone settles, evening classification.
    ///
    /// Dead creatures in `creatures` are ignored. On return every participant
    /// has been classified; starved ones have `alive == false`.
    pub fn run_day<R: Rng + ?Sized>(
        &self,
        creatures: &mut [Creature],
        field: &mut FoodField,
        rng: &mut R,
    ) -> DayReport {
        let mut report = DayReport::default();

        self.morning(creatures, field, rng);
        report.candies_spawned = field.spawned_count();

        let mut order: Vec<usize> = (0..creatures.len()).filter(|&i| creatures[i].is_alive()).collect();
        while report.ticks < self.max_ticks && creatures.iter().any(Creature::is_active) {
            self.tick(creatures, field, &mut order, rng);
            report.ticks += 1;
        }

        for creature in creatures.iter_mut().filter(|c| c.is_active()) {
            creature.halt();
            report.halted += 1;
        }
        if report.halted > 0 {
            report.tick_budget_exceeded = true;
            log::warn!(
                "Tick budget of {} exhausted with {} creatures still foraging; forcing them to stop",
                self.max_ticks,
                report.halted
            );
        }

        self.evening(creatures, &mut report);
        report.candies_remaining = field.live_count();

        log::debug!(
            "Day over after {} ticks: eaters 0/1/2 = {}/{}/{}, starved {}, candies left {}",
            report.ticks,
            report.zero_eaters,
            report.one_eaters,
            report.two_eaters,
            report.starved,
            report.candies_remaining
        );

        report
    }

    /// Set budgets, reset counters and lay out a fresh candy field
    pub fn morning<R: Rng + ?Sized>(&self, creatures: &mut [Creature], field: &mut FoodField, rng: &mut R) {
        let mut alive = 0;
        for creature in creatures.iter_mut().filter(|c| c.is_alive()) {
            let energy =
                creature.morning_energy(self.daily_energy, self.hunger_penalty, self.hunger_fraction);
            creature.begin_day(energy, rng);
            alive += 1;
        }

        field.spawn(self.candies_per_creature * alive, rng);
    }

    /// One tick for every creature.
    ///
    /// Sighting is read-only and runs in parallel against the field as it
    /// stands at the start of the tick; moving, paying, and eating then
    /// happen one creature at a time in `order`, shuffled first when enabled.
    /// Returns the number of candies eaten during the tick.
    pub fn tick<R: Rng + ?Sized>(
        &self,
        creatures: &mut [Creature],
        field: &mut FoodField,
        order: &mut [usize],
        rng: &mut R,
    ) -> usize {
        let sightings: Vec<Option<CandyId>> = {
            let field = &*field;
            creatures
                .par_iter()
                .map(|c| if c.is_active() { c.perceive(field) } else { None })
                .collect()
        };

        if self.shuffle_activation {
            order.shuffle(rng);
        }

        let mut eaten = 0;
        for &idx in order.iter() {
            let outcome = creatures[idx].forage(sightings[idx], field, &self.params, rng);
            if let TickOutcome::Ate(_) = outcome {
                eaten += 1;
            }
        }
        eaten
    }

    /// Classify every participant and fill in the day counters
    fn evening(&self, creatures: &mut [Creature], report: &mut DayReport) {
        for creature in creatures.iter_mut().filter(|c| c.is_alive()) {
            match creature.candies_eaten {
                0 => report.zero_eaters += 1,
                1 => report.one_eaters += 1,
                _ => report.two_eaters += 1,
            }
            report.total_energy_spent += creature.energy_spent;

            if creature.end_day(self.hunger_penalty, self.hunger_fraction) == DayFate::Starved {
                report.starved += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genetics::Genome;
    use crate::grid::{Position, Torus};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.world.width = 60.0;
        config.world.height = 60.0;
        config.population.size = 20;
        config
    }

    fn population(config: &Config, rng: &mut ChaCha8Rng) -> Vec<Creature> {
        let torus = config.torus();
        (0..config.population.size as u64)
            .map(|id| Creature::new(id, torus.random_position(rng), Genome::random(rng, &config.genes)))
            .collect()
    }

    #[test]
    fn test_morning_spawns_two_candies_each() {
        let config = test_config();
        let scheduler = DayScheduler::from_config(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut creatures = population(&config, &mut rng);
        creatures[0].alive = false;
        creatures[1].hunger_streak = 2;

        let mut field = FoodField::new(config.torus(), config.world.index_cell_size);
        scheduler.morning(&mut creatures, &mut field, &mut rng);

        assert_eq!(field.live_count(), 2 * (config.population.size - 1));
        assert_eq!(creatures[1].energy, 0.5 * config.energy.daily_energy);
        assert_eq!(creatures[2].energy, config.energy.daily_energy);
        assert_eq!(creatures[0].energy, 0.0);
    }

    #[test]
    fn test_day_classification_invariants() {
        let config = test_config();
        let scheduler = DayScheduler::from_config(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut creatures = population(&config, &mut rng);
        for (i, c) in creatures.iter_mut().enumerate() {
            c.hunger_streak = (i % 3) as u32;
        }
        let before: Vec<u32> = creatures.iter().map(|c| c.hunger_streak).collect();

        let mut field = FoodField::new(config.torus(), config.world.index_cell_size);
        let report = scheduler.run_day(&mut creatures, &mut field, &mut rng);

        assert_eq!(report.participants(), config.population.size);
        assert_eq!(report.starved, report.zero_eaters);
        assert_eq!(
            report.candies_remaining,
            report.candies_spawned - report.one_eaters - 2 * report.two_eaters
        );

        for (c, prev) in creatures.iter().zip(before) {
            match c.candies_eaten {
                0 => assert!(!c.is_alive()),
                1 => {
                    assert!(c.is_alive());
                    assert_eq!(c.hunger_streak, prev + 1);
                }
                2 => {
                    assert!(c.is_alive());
                    assert_eq!(c.hunger_streak, 0);
                }
                n => panic!("ate {} candies", n),
            }
        }
    }

    #[test]
    fn test_everyone_settles_or_is_halted() {
        let config = test_config();
        let scheduler = DayScheduler::from_config(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut creatures = population(&config, &mut rng);
        let mut field = FoodField::new(config.torus(), config.world.index_cell_size);

        let report = scheduler.run_day(&mut creatures, &mut field, &mut rng);

        assert!(report.ticks <= config.safety.max_ticks_per_day);
        assert!(creatures.iter().all(|c| !c.is_active()));
        assert_eq!(report.tick_budget_exceeded, report.halted > 0);
    }

    #[test]
    fn test_tick_budget_exceeded_is_recovered() {
        let mut config = test_config();
        config.safety.max_ticks_per_day = 3;
        config.energy.daily_energy = 1e9;
        let scheduler = DayScheduler::from_config(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        // Slow blind creatures with a huge budget cannot finish in three ticks
        let mut creatures: Vec<Creature> = (0..4)
            .map(|id| Creature::new(id, Position::new(5.0 + id as f64, 5.0), Genome::new(0.01, 0.0, 1.0, 0.0)))
            .collect();
        let mut field = FoodField::new(Torus::new(60.0, 60.0), 10.0);

        let report = scheduler.run_day(&mut creatures, &mut field, &mut rng);

        assert_eq!(report.ticks, 3);
        assert!(report.tick_budget_exceeded);
        assert!(creatures.iter().all(|c| c.halted || c.candies_eaten == 2));
    }

    #[test]
    fn test_same_seed_same_day() {
        let config = test_config();
        let scheduler = DayScheduler::from_config(&config);

        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut creatures = population(&config, &mut rng);
            let mut field = FoodField::new(config.torus(), config.world.index_cell_size);
            let report = scheduler.run_day(&mut creatures, &mut field, &mut rng);
            (creatures, report)
        };

        let (a, ra) = run(77);
        let (b, rb) = run(77);
        assert_eq!(a, b);
        assert_eq!(ra, rb);
    }

    #[test]
    fn test_contended_candy_eaten_once() {
        let mut config = test_config();
        config.world.candies_per_creature = 1;
        let scheduler = DayScheduler::from_config(&config);
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        let genome = Genome::new(1.0, 10.0, 0.01, 0.0);
        let mut creatures = vec![
            Creature::new(0, Position::new(30.0, 30.0), genome),
            Creature::new(1, Position::new(30.0, 30.0), genome),
        ];
        let mut field = FoodField::new(config.torus(), config.world.index_cell_size);
        scheduler.morning(&mut creatures, &mut field, &mut rng);
        field.place(vec![Position::new(30.5, 30.0)]);

        let mut order = vec![0, 1];
        let eaten = scheduler.tick(&mut creatures, &mut field, &mut order, &mut rng);

        assert_eq!(eaten, 1);
        assert_eq!(field.live_count(), 0);
        let total: u8 = creatures.iter().map(|c| c.candies_eaten).sum();
        assert_eq!(total, 1);
    }
}
