//! Configuration system for CANDIED runs.
//!
//! Supports YAML configuration files with sensible defaults. A `Config` is
//! validated once and then treated as immutable for the whole run.

use crate::error::ConfigError;
use crate::food::MAX_BUCKETS_PER_AXIS;
use crate::grid::Torus;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub world: WorldConfig,
    pub population: PopulationConfig,
    pub energy: EnergyConfig,
    pub genes: GeneConfig,
    #[serde(default)]
    pub evolution: EvolutionConfig,
    #[serde(default)]
    pub safety: SafetyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Seed for the run's random stream; drawn from entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Board and food configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Board width
    pub width: f64,
    /// Board height
    pub height: f64,
    /// A candy within this distance of a creature is eaten
    pub consumption_radius: f64,
    /// Candies spawned each morning per living creature
    pub candies_per_creature: usize,
    /// Edge length of the buckets used for candy lookups
    pub index_cell_size: f64,
}

/// Population configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of creatures N
    pub size: usize,
    /// Generations to simulate before stopping
    pub max_generations: u64,
}

/// Energy accounting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyConfig {
    /// Energy budget E at the start of a normal day
    pub daily_energy: f64,
    /// Cost per tick per unit of view range (k_r)
    pub sight_cost: f64,
    /// Scale of the focus term cot(theta/2) (k_theta)
    pub focus_cost: f64,
    /// How a one-candy streak reduces the next day's budget
    #[serde(default)]
    pub hunger_penalty: HungerPenalty,
    /// Fraction of E per day of hunger streak
    pub hunger_fraction: f64,
}

/// Next-day energy rule for creatures with a hunger streak n > 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HungerPenalty {
    /// Budget is `fraction * n * E`
    #[default]
    Scaled,
    /// Budget is `E * (1 - fraction * n)`; a creature whose penalty
    /// reaches the whole budget starves
    Deducted,
}

/// Gene bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneConfig {
    /// Initial speed is drawn from (0, max_speed)
    pub max_speed: f64,
    /// Initial view range is drawn from (0, max_view_range)
    pub max_view_range: f64,
    /// Initial mutation rate is drawn from (0, max_mutation_rate)
    pub max_mutation_rate: f64,
    /// Speed never drops below this floor
    pub min_speed: f64,
    /// Focus angle never drops below this floor
    pub min_focus_angle: f64,
}

/// Reproduction configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    #[serde(default)]
    pub parent_sampling: ParentSampling,
    #[serde(default)]
    pub replacement: Replacement,
}

/// How parents are drawn from the creatures that ate two candies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentSampling {
    /// N uniform draws with replacement; a creature may pair with itself
    #[default]
    WithReplacement,
    /// One random permutation of the eligible creatures
    Permutation,
}

/// Who makes up the next generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Replacement {
    /// Offspring only
    #[default]
    Generational,
    /// Survivors persist next to their offspring
    Overlapping,
}

/// Safety limits to prevent runaway simulations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Ticks after which a day is forcibly ended
    pub max_ticks_per_day: u32,
    /// Population cap, only reachable with overlapping generations
    pub max_population: usize,
}

/// Logging and checkpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Generations between checkpoints
    pub checkpoint_interval: u64,
    /// Generations between summary lines
    pub stats_interval: u64,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Shuffle creature activation order every tick
    pub shuffle_activation: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            population: PopulationConfig::default(),
            energy: EnergyConfig::default(),
            genes: GeneConfig::default(),
            evolution: EvolutionConfig::default(),
            safety: SafetyConfig::default(),
            logging: LoggingConfig::default(),
            seed: None,
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 200.0,
            height: 200.0,
            consumption_radius: 2.0,
            candies_per_creature: 2,
            index_cell_size: 10.0,
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: 40,
            max_generations: 30,
        }
    }
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            daily_energy: 500.0,
            sight_cost: 0.5,
            focus_cost: 0.5,
            hunger_penalty: HungerPenalty::Scaled,
            hunger_fraction: 0.25,
        }
    }
}

impl Default for GeneConfig {
    fn default() -> Self {
        Self {
            max_speed: 10.0,
            max_view_range: 20.0,
            max_mutation_rate: 0.25,
            min_speed: 1e-3,
            min_focus_angle: 1e-3,
        }
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            max_ticks_per_day: 500,
            max_population: 10_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            checkpoint_interval: 10,
            stats_interval: 1,
            log_level: "info".to_string(),
            shuffle_activation: true,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// The board described by this configuration
    pub fn torus(&self) -> Torus {
        Torus::new(self.world.width, self.world.height)
    }

    /// Candies spawned each morning for a population of `population`
    pub fn candies_for(&self, population: usize) -> usize {
        self.world.candies_per_creature * population
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        let w = &self.world;
        if !(w.width.is_finite() && w.width > 0.0 && w.height.is_finite() && w.height > 0.0) {
            return invalid("board width and height must be finite and > 0");
        }
        if !(w.consumption_radius.is_finite() && w.consumption_radius >= 0.0) {
            return invalid("consumption_radius must be >= 0");
        }
        if w.candies_per_creature == 0 {
            return invalid("candies_per_creature must be > 0");
        }
        if !(w.index_cell_size.is_finite() && w.index_cell_size > 0.0) {
            return invalid("index_cell_size must be > 0");
        }
        let per_axis = MAX_BUCKETS_PER_AXIS as f64;
        if w.width / w.index_cell_size > per_axis || w.height / w.index_cell_size > per_axis {
            return invalid("index_cell_size is too small for the board");
        }

        if self.population.size == 0 {
            return invalid("population size must be > 0");
        }
        if self.evolution.parent_sampling == ParentSampling::WithReplacement
            && self.population.size % 2 != 0
        {
            return invalid("population size must be even when sampling parents with replacement");
        }
        if self.population.size > self.safety.max_population {
            return invalid("population size cannot exceed max_population");
        }

        let e = &self.energy;
        if !(e.daily_energy.is_finite() && e.daily_energy > 0.0) {
            return invalid("daily_energy must be > 0");
        }
        if !(e.sight_cost.is_finite() && e.sight_cost >= 0.0)
            || !(e.focus_cost.is_finite() && e.focus_cost >= 0.0)
        {
            return invalid("sight_cost and focus_cost must be finite and >= 0");
        }
        if !(e.hunger_fraction > 0.0 && e.hunger_fraction <= 1.0) {
            return invalid("hunger_fraction must be in (0, 1]");
        }

        let g = &self.genes;
        if !(g.min_speed > 0.0 && g.max_speed.is_finite() && g.max_speed > g.min_speed) {
            return invalid("speed bounds must satisfy 0 < min_speed < max_speed < inf");
        }
        if !(g.max_view_range.is_finite() && g.max_view_range >= 0.0) {
            return invalid("max_view_range must be finite and >= 0");
        }
        if !(g.max_mutation_rate.is_finite() && g.max_mutation_rate >= 0.0) {
            return invalid("max_mutation_rate must be finite and >= 0");
        }
        if !(g.min_focus_angle > 0.0 && g.min_focus_angle < PI) {
            return invalid("min_focus_angle must be in (0, pi)");
        }

        if self.safety.max_ticks_per_day == 0 {
            return invalid("max_ticks_per_day must be > 0");
        }
        if self.logging.stats_interval == 0 || self.logging.checkpoint_interval == 0 {
            return invalid("logging intervals must be > 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.energy.hunger_penalty = HungerPenalty::Deducted;
        config.evolution.parent_sampling = ParentSampling::Permutation;
        config.seed = Some(42);

        let yaml = serde_yaml::to_string(&config).unwrap();
        let loaded: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config, loaded);
        assert!(yaml.contains("deducted"));
    }

    #[test]
    fn test_optional_sections_default() {
        let yaml = r#"
world:
  width: 50.0
  height: 50.0
  consumption_radius: 1.0
  candies_per_creature: 2
  index_cell_size: 5.0
population:
  size: 10
  max_generations: 5
energy:
  daily_energy: 100.0
  sight_cost: 0.1
  focus_cost: 0.1
  hunger_fraction: 0.25
genes:
  max_speed: 5.0
  max_view_range: 5.0
  max_mutation_rate: 0.1
  min_speed: 0.001
  min_focus_angle: 0.001
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.energy.hunger_penalty, HungerPenalty::Scaled);
        assert_eq!(config.evolution.parent_sampling, ParentSampling::WithReplacement);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = Config::default();
        config.population.size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.population.size = 7;
        assert!(config.validate().is_err());
        config.evolution.parent_sampling = ParentSampling::Permutation;
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.world.width = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.genes.min_focus_angle = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_non_finite_gene_bounds() {
        let cases: [fn(&mut GeneConfig); 4] = [
            |g| g.max_speed = f64::INFINITY,
            |g| g.max_view_range = f64::INFINITY,
            |g| g.max_view_range = f64::NAN,
            |g| g.max_mutation_rate = f64::INFINITY,
        ];
        for set in cases {
            let mut config = Config::default();
            set(&mut config.genes);
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        }

        let mut config = Config::default();
        config.energy.sight_cost = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_absurd_index_cell_size() {
        let mut config = Config::default();
        config.world.index_cell_size = 1e-9;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.world.index_cell_size = config.world.width / MAX_BUCKETS_PER_AXIS as f64;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let config = Config::default();
        config.save(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();

        assert_eq!(config, loaded);
    }
}
