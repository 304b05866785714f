//! # CANDIED
//!
//! Evolutionary foraging simulation on a toroidal board.
//!
//! Each generation lives for one day. Creatures wander the board looking for
//! candies; one candy keeps a creature alive, two make it a parent, none
//! starves it. At nightfall the parents are paired, their genes blended by
//! arithmetic crossover and perturbed by Gaussian mutation, and the offspring
//! form the next generation.
//!
//! ## Features
//!
//! - **Evolvable**: speed, view range and focus angle under selection, with a
//!   heritable mutation rate
//! - **Parallel**: perception runs on all cores via Rayon without affecting results
//! - **Configurable**: YAML configuration files
//! - **Reproducible**: one seeded random stream per run, saved in checkpoints
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use candied::{Config, World};
//!
//! let mut world = World::new_with_seed(Config::default(), 42).unwrap();
//! world.run(30);
//!
//! for snapshot in &world.history.snapshots {
//!     println!("{}", snapshot.summary());
//! }
//! ```
//!
//! ## Checkpoints
//!
//! ```rust,no_run
//! use candied::checkpoint::Checkpoint;
//! use candied::{Config, World};
//!
//! let mut world = World::new(Config::default()).unwrap();
//! world.run(10);
//!
//! world.create_checkpoint().save("checkpoint.bin").unwrap();
//!
//! let loaded = Checkpoint::load("checkpoint.bin").unwrap();
//! let mut resumed = World::from_checkpoint(loaded);
//! resumed.run(10);
//! ```

pub mod checkpoint;
pub mod config;
pub mod creature;
pub mod day;
pub mod error;
pub mod evolution;
pub mod export;
pub mod food;
pub mod genetics;
pub mod grid;
pub mod stats;
pub mod sweep;
pub mod world;

// Re-export main types
pub use config::Config;
pub use creature::Creature;
pub use error::{ConfigError, EvolutionError, SimError};
pub use genetics::Genome;
pub use stats::{GenerationSnapshot, StatsHistory};
pub use world::World;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark with a fixed seed
pub fn benchmark(generations: u64, population: usize) -> Result<BenchmarkResult, ConfigError> {
    use std::time::Instant;

    let mut config = Config::default();
    config.population.size = population;
    config.safety.max_population = config.safety.max_population.max(population);

    let mut world = World::new_with_seed(config, 0)?;

    let start = Instant::now();
    let simulated = world.run(generations);
    let elapsed = start.elapsed();

    let ticks: u64 = world.history.snapshots.iter().map(|s| s.ticks as u64).sum();

    Ok(BenchmarkResult {
        generations: simulated,
        population,
        total_ticks: ticks,
        elapsed_secs: elapsed.as_secs_f64(),
        generations_per_second: simulated as f64 / elapsed.as_secs_f64(),
        extinct: world.is_extinct(),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub generations: u64,
    pub population: usize,
    pub total_ticks: u64,
    pub elapsed_secs: f64,
    pub generations_per_second: f64,
    pub extinct: bool,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Generations: {}", self.generations)?;
        writeln!(f, "Population: {}", self.population)?;
        writeln!(f, "Ticks: {}", self.total_ticks)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} generations/s", self.generations_per_second)?;
        if self.extinct {
            writeln!(f, "Population went extinct")?;
        }
        Ok(())
    }
}
