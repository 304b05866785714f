//! Batch sweeps: many seeded runs per candy supply, averaged per generation.

use crate::config::Config;
use crate::error::ConfigError;
use crate::genetics::Gene;
use crate::stats::{GenerationSnapshot, StatsHistory};
use crate::world::World;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to sweep over
#[derive(Clone, Debug)]
pub struct SweepPlan {
    /// Candies per creature to try
    pub candies: Vec<usize>,
    /// Seeded runs per candy value
    pub runs: usize,
    /// Generation bound per run
    pub generations: u64,
    /// Run `i` uses seed `base_seed + i` for every candy value
    pub base_seed: u64,
    /// Leave runs that died out out of the averages
    pub exclude_extinct: bool,
}

/// One finished run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunResult {
    pub candies_per_creature: usize,
    pub seed: u64,
    pub generations: u64,
    pub extinct: bool,
    pub history: StatsHistory,
}

/// Averages across runs for one generation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AveragedGeneration {
    pub generation: u64,
    /// Runs contributing to this row
    pub runs: usize,
    pub population: f64,
    /// Mean of each gene's population mean, in [`Gene::ALL`] order
    pub gene_means: [f64; 4],
    pub zero_eaters: f64,
    pub one_eaters: f64,
    pub two_eaters: f64,
    pub mean_energy_spent: f64,
}

/// All runs for one candy value
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SweepCell {
    pub candies_per_creature: usize,
    pub runs: Vec<RunResult>,
    pub averaged: Vec<AveragedGeneration>,
}

impl SweepCell {
    pub fn extinct_runs(&self) -> usize {
        self.runs.iter().filter(|r| r.extinct).count()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SweepResult {
    pub cells: Vec<SweepCell>,
}

impl SweepResult {
    /// Save the full result to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
    }
}

/// Run every (candy value, seed) combination in parallel and average the histories.
///
/// Each run is an independent [`World`]; the result for a given plan does
/// not depend on thread scheduling.
pub fn run_sweep(base: &Config, plan: &SweepPlan) -> Result<SweepResult, ConfigError> {
    let configs: Vec<Config> = plan
        .candies
        .iter()
        .map(|&candies| {
            let mut config = base.clone();
            config.world.candies_per_creature = candies;
            config.validate()?;
            Ok(config)
        })
        .collect::<Result<_, ConfigError>>()?;

    let jobs: Vec<(usize, u64)> = (0..configs.len())
        .flat_map(|cell| (0..plan.runs as u64).map(move |run| (cell, run)))
        .collect();

    log::info!(
        "Sweeping {} candy values x {} runs for {} generations",
        configs.len(),
        plan.runs,
        plan.generations
    );

    let results: Vec<RunResult> = jobs
        .into_par_iter()
        .map(|(cell, run)| {
            let config = configs[cell].clone();
            let seed = plan.base_seed.wrapping_add(run);
            let candies_per_creature = config.world.candies_per_creature;

            let mut world = World::new_with_seed(config, seed)?;
            let generations = world.run(plan.generations);
            log::debug!(
                "Run candies={} seed={} finished after {} generations (extinct: {})",
                candies_per_creature,
                seed,
                generations,
                world.is_extinct()
            );

            Ok(RunResult {
                candies_per_creature,
                seed,
                generations,
                extinct: world.is_extinct(),
                history: world.history,
            })
        })
        .collect::<Result<_, ConfigError>>()?;

    let mut results = results.into_iter();
    let cells = configs
        .iter()
        .map(|config| {
            let runs: Vec<RunResult> = results.by_ref().take(plan.runs).collect();
            let histories: Vec<&StatsHistory> = runs
                .iter()
                .filter(|r| !(plan.exclude_extinct && r.extinct))
                .map(|r| &r.history)
                .collect();
            let averaged = average_histories(&histories);

            SweepCell {
                candies_per_creature: config.world.candies_per_creature,
                runs,
                averaged,
            }
        })
        .collect();

    Ok(SweepResult { cells })
}

/// Average histories generation by generation.
///
/// A row averages over the runs that recorded that generation, so shorter
/// histories simply stop contributing once they end.
pub fn average_histories(histories: &[&StatsHistory]) -> Vec<AveragedGeneration> {
    let longest = histories.iter().map(|h| h.len()).max().unwrap_or(0);

    (0..longest)
        .map(|idx| {
            let rows: Vec<&GenerationSnapshot> =
                histories.iter().filter_map(|h| h.snapshots.get(idx)).collect();

            let mut gene_means = [0.0; 4];
            for (slot, gene) in gene_means.iter_mut().zip(Gene::ALL) {
                *slot = mean_of(&rows, |s| s.genes.get(gene).mean);
            }

            AveragedGeneration {
                generation: rows[0].generation,
                runs: rows.len(),
                population: mean_of(&rows, |s| s.population as f64),
                gene_means,
                zero_eaters: mean_of(&rows, |s| s.zero_eaters as f64),
                one_eaters: mean_of(&rows, |s| s.one_eaters as f64),
                two_eaters: mean_of(&rows, |s| s.two_eaters as f64),
                mean_energy_spent: mean_of(&rows, |s| s.mean_energy_spent),
            }
        })
        .collect()
}

fn mean_of<F>(rows: &[&GenerationSnapshot], f: F) -> f64
where
    F: Fn(&GenerationSnapshot) -> f64,
{
    rows.iter().map(|&s| f(s)).sum::<f64>() / rows.len() as f64
}
