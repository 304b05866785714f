//! World simulation engine - alternates foraging days with reproduction.

use crate::checkpoint::Checkpoint;
use crate::config::Config;
use crate::creature::{Creature, CreatureId};
use crate::day::{DayReport, DayScheduler};
use crate::error::{ConfigError, EvolutionError, SimError};
use crate::evolution::{Brood, EvolutionEngine};
use crate::food::FoodField;
use crate::genetics::Genome;
use crate::stats::{GenerationSnapshot, StatsHistory};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::ops::ControlFlow;

/// The simulation world
pub struct World {
    // Population
    pub creatures: Vec<Creature>,

    // Environment
    pub field: FoodField,

    // State
    /// Next generation to forage
    pub generation: u64,
    extinct: bool,

    // Configuration
    pub config: Config,

    // Statistics
    pub history: StatsHistory,

    // Engines
    pub scheduler: DayScheduler,
    pub evolution_engine: EvolutionEngine,

    // ID generation
    next_creature_id: CreatureId,

    // Random number generator (seeded for reproducibility)
    rng: ChaCha8Rng,
    seed: u64,
}

impl World {
    /// Create a new world, seeded from `config.seed` or from entropy
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        Self::new_with_seed(config, seed)
    }

    /// Create a new world with a specific seed for reproducibility
    pub fn new_with_seed(config: Config, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let torus = config.torus();

        let creatures: Vec<Creature> = (0..config.population.size as CreatureId)
            .map(|id| {
                let position = torus.random_position(&mut rng);
                let genome = Genome::random(&mut rng, &config.genes);
                Creature::new(id, position, genome)
            })
            .collect();
        let next_creature_id = creatures.len() as CreatureId;

        log::info!(
            "Created world {}x{} with {} creatures (seed {})",
            config.world.width,
            config.world.height,
            creatures.len(),
            seed
        );

        Ok(Self::assemble(config, creatures, 0, next_creature_id, rng, seed, false, StatsHistory::new()))
    }

    /// Restore world from checkpoint
    pub fn from_checkpoint(checkpoint: Checkpoint) -> Self {
        Self::assemble(
            checkpoint.config,
            checkpoint.creatures,
            checkpoint.generation,
            checkpoint.next_creature_id,
            checkpoint.rng,
            checkpoint.seed,
            checkpoint.extinct,
            checkpoint.history,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        config: Config,
        creatures: Vec<Creature>,
        generation: u64,
        next_creature_id: CreatureId,
        rng: ChaCha8Rng,
        seed: u64,
        extinct: bool,
        history: StatsHistory,
    ) -> Self {
        Self {
            creatures,
            field: FoodField::new(config.torus(), config.world.index_cell_size),
            generation,
            extinct,
            scheduler: DayScheduler::from_config(&config),
            evolution_engine: EvolutionEngine::from_config(&config),
            history,
            config,
            next_creature_id,
            rng,
            seed,
        }
    }

    /// Create checkpoint of current state
    pub fn create_checkpoint(&self) -> Checkpoint {
        Checkpoint {
            version: Checkpoint::VERSION,
            generation: self.generation,
            config: self.config.clone(),
            creatures: self.creatures.clone(),
            history: self.history.clone(),
            next_creature_id: self.next_creature_id,
            seed: self.seed,
            rng: self.rng.clone(),
            extinct: self.extinct,
        }
    }

    /// Simulate one generation: a foraging day followed by reproduction.
    ///
    /// When nobody ate two candies the returned snapshot is marked extinct
    /// and the world stops; any later call fails with [`SimError::Extinct`].
    pub fn step(&mut self) -> Result<GenerationSnapshot, SimError> {
        if self.extinct {
            return Err(SimError::Extinct {
                generation: self.generation,
            });
        }

        // Phase 1: Foraging day
        let report = self.run_day();
        let mut snapshot = GenerationSnapshot::new(self.generation, &self.creatures, &report);

        // Phase 2: Reproduction
        let brood = match self.evolution_engine.reproduce(&self.creatures, &mut self.next_creature_id, &mut self.rng) {
            Ok(brood) => brood,
            Err(EvolutionError::NoEligibleParents) => {
                log::warn!(
                    "Population extinct at generation {}: no creature ate {} candies",
                    self.generation,
                    crate::creature::CANDIES_TO_REPRODUCE
                );
                self.extinct = true;
                snapshot.extinct = true;
                Brood::default()
            }
        };
        snapshot.offspring = brood.offspring.len();

        // Phase 3: Replacement
        let population = std::mem::take(&mut self.creatures);
        self.creatures = self.evolution_engine.next_generation(population, brood);
        snapshot.next_population = self.creatures.len();

        // Phase 4: Statistics
        if self.generation % self.config.logging.stats_interval == 0 || snapshot.extinct {
            log::info!("{}", snapshot.summary());
        }
        self.history.record(snapshot.clone());
        self.generation += 1;

        Ok(snapshot)
    }

    fn run_day(&mut self) -> DayReport {
        self.scheduler
            .run_day(&mut self.creatures, &mut self.field, &mut self.rng)
    }

    /// Run until `generations` more generations have been simulated or the
    /// population dies out. Returns the number simulated.
    pub fn run(&mut self, generations: u64) -> u64 {
        self.run_with_callback(generations, |_, _| ControlFlow::Continue(()))
    }

    /// Run with a callback after every generation; returning
    /// `ControlFlow::Break` stops the run at that boundary.
    pub fn run_with_callback<F>(&mut self, generations: u64, mut callback: F) -> u64
    where
        F: FnMut(&World, &GenerationSnapshot) -> ControlFlow<()>,
    {
        let mut simulated = 0;
        while simulated < generations {
            let Ok(snapshot) = self.step() else {
                break;
            };
            simulated += 1;

            if callback(self, &snapshot).is_break() || snapshot.extinct {
                break;
            }
        }
        simulated
    }

    /// Get current population count
    pub fn population(&self) -> usize {
        self.creatures.iter().filter(|c| c.is_alive()).count()
    }

    /// Whether the run has ended by extinction
    pub fn is_extinct(&self) -> bool {
        self.extinct
    }

    /// Get seed for reproducibility
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Replacement;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.world.width = 50.0;
        config.world.height = 50.0;
        config.population.size = 30;
        config
    }

    #[test]
    fn test_world_creation() {
        let config = test_config();
        let world = World::new_with_seed(config.clone(), 1).unwrap();

        assert_eq!(world.population(), config.population.size);
        assert_eq!(world.generation, 0);
        assert!(!world.is_extinct());
        assert!(world.creatures.iter().all(|c| c.genome.is_valid(&config.genes)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = test_config();
        config.population.size = 31;
        assert!(World::new_with_seed(config, 1).is_err());
    }

    #[test]
    fn test_world_step() {
        let config = test_config();
        let mut world = World::new_with_seed(config.clone(), 2).unwrap();

        let snapshot = world.step().unwrap();

        assert_eq!(snapshot.generation, 0);
        assert_eq!(snapshot.population, config.population.size);
        assert_eq!(world.generation, 1);
        assert_eq!(world.history.len(), 1);
        if !snapshot.extinct {
            assert_eq!(world.population(), config.population.size);
            assert_eq!(snapshot.offspring, config.population.size);
        }
    }

    #[test]
    fn test_extinction_is_terminal() {
        let mut config = test_config();
        // A zero consumption radius on a big board means nobody ever eats
        config.world.width = 1_000.0;
        config.world.height = 1_000.0;
        config.world.consumption_radius = 0.0;
        config.energy.daily_energy = 1.0;
        let mut world = World::new_with_seed(config, 3).unwrap();

        let snapshot = world.step().unwrap();
        assert!(snapshot.extinct);
        assert!(world.is_extinct());
        assert_eq!(world.population(), 0);
        assert!(matches!(world.step(), Err(SimError::Extinct { generation: 1 })));
        assert_eq!(world.run(10), 0);
    }

    #[test]
    fn test_huge_view_range_steps() {
        let mut config = test_config();
        config.genes.max_view_range = 1e300;
        let mut world = World::new_with_seed(config.clone(), 6).unwrap();

        let snapshot = world.step().unwrap();
        assert_eq!(snapshot.population, config.population.size);
    }

    #[test]
    fn test_non_finite_gene_bound_rejected() {
        let mut config = test_config();
        config.genes.max_mutation_rate = f64::INFINITY;
        assert!(matches!(
            World::new_with_seed(config, 1),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_run_stops_on_break() {
        let mut world = World::new_with_seed(test_config(), 4).unwrap();

        let simulated = world.run_with_callback(10, |w, _| {
            if w.generation >= 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        assert!(simulated <= 2);
        assert_eq!(world.history.len() as u64, simulated);
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let config = test_config();
        let mut world = World::new_with_seed(config, 12345).unwrap();
        world.run(2);

        let checkpoint = world.create_checkpoint();
        let restored = World::from_checkpoint(checkpoint);

        assert_eq!(restored.generation, world.generation);
        assert_eq!(restored.population(), world.population());
        assert_eq!(restored.seed(), world.seed());
        assert_eq!(restored.history, world.history);
    }

    #[test]
    fn test_reproducibility() {
        let config = test_config();

        let mut world1 = World::new_with_seed(config.clone(), 42).unwrap();
        let mut world2 = World::new_with_seed(config, 42).unwrap();

        world1.run(3);
        world2.run(3);

        assert_eq!(world1.history, world2.history);
        assert_eq!(world1.creatures, world2.creatures);
    }

    #[test]
    fn test_overlapping_keeps_survivors() {
        let mut config = test_config();
        config.evolution.replacement = Replacement::Overlapping;
        config.safety.max_population = 100;
        let mut world = World::new_with_seed(config, 5).unwrap();

        let snapshot = world.step().unwrap();
        if !snapshot.extinct {
            let survivors = snapshot.population - snapshot.starved;
            assert_eq!(snapshot.next_population, (survivors + snapshot.offspring).min(100));
            assert!(world.creatures.iter().all(|c| c.is_alive()));
        }
    }
}
