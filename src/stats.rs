//! Statistics tracking for the simulation.

use crate::creature::Creature;
use crate::day::DayReport;
use crate::genetics::{Gene, Genome};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Mean, variance and range of one gene across a population
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneSummary {
    pub mean: f64,
    /// Population variance
    pub variance: f64,
    pub min: f64,
    pub max: f64,
}

impl GeneSummary {
    /// Summarize a sequence of values; all zeros when empty
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let values: Vec<f64> = values.into_iter().collect();
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self { mean, variance, min, max }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }
}

/// Per-gene summaries
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneStats {
    pub speed: GeneSummary,
    pub view_range: GeneSummary,
    pub focus_angle: GeneSummary,
    pub mutation_rate: GeneSummary,
}

impl GeneStats {
    /// Summarize the genomes of a population
    pub fn from_genomes<'a, I>(genomes: I) -> Self
    where
        I: IntoIterator<Item = &'a Genome>,
    {
        let genomes: Vec<&Genome> = genomes.into_iter().collect();
        let summary = |gene: Gene| GeneSummary::from_values(genomes.iter().map(|g| g.get(gene)));

        Self {
            speed: summary(Gene::Speed),
            view_range: summary(Gene::ViewRange),
            focus_angle: summary(Gene::FocusAngle),
            mutation_rate: summary(Gene::MutationRate),
        }
    }

    pub fn get(&self, gene: Gene) -> &GeneSummary {
        match gene {
            Gene::Speed => &self.speed,
            Gene::ViewRange => &self.view_range,
            Gene::FocusAngle => &self.focus_angle,
            Gene::MutationRate => &self.mutation_rate,
        }
    }
}

/// Record of one finished generation
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationSnapshot {
    /// Index of the generation that foraged (0 for the founders)
    pub generation: u64,
    /// Creatures that took part in the day
    pub population: usize,
    /// Gene statistics of the participants
    pub genes: GeneStats,
    pub zero_eaters: usize,
    pub one_eaters: usize,
    pub two_eaters: usize,
    pub starved: usize,
    pub eligible_parents: usize,
    /// Offspring produced in the evening
    pub offspring: usize,
    /// Size of the population that will forage next
    pub next_population: usize,
    pub mean_energy_spent: f64,
    pub ticks: u32,
    pub tick_budget_exceeded: bool,
    pub candies_remaining: usize,
    /// No creature could reproduce; the run is over
    pub extinct: bool,
}

impl GenerationSnapshot {
    /// Build a snapshot from the day's participants and report
    pub fn new(generation: u64, participants: &[Creature], report: &DayReport) -> Self {
        let population = report.participants();
        let mean_energy_spent = if population > 0 {
            report.total_energy_spent / population as f64
        } else {
            0.0
        };

        Self {
            generation,
            population,
            genes: GeneStats::from_genomes(participants.iter().map(|c| &c.genome)),
            zero_eaters: report.zero_eaters,
            one_eaters: report.one_eaters,
            two_eaters: report.two_eaters,
            starved: report.starved,
            eligible_parents: report.two_eaters,
            offspring: 0,
            next_population: 0,
            mean_energy_spent,
            ticks: report.ticks,
            tick_budget_exceeded: report.tick_budget_exceeded,
            candies_remaining: report.candies_remaining,
            extinct: false,
        }
    }

    /// Format as a one-line summary
    pub fn summary(&self) -> String {
        let mut line = format!(
            "Gen:{:5} | Pop:{:5} | 0/1/2:{:4}/{:4}/{:4} | Spd:{:.2} | View:{:.2} | Foc:{:.2} | Mut:{:.3} | Ticks:{:4}",
            self.generation,
            self.population,
            self.zero_eaters,
            self.one_eaters,
            self.two_eaters,
            self.genes.speed.mean,
            self.genes.view_range.mean,
            self.genes.focus_angle.mean,
            self.genes.mutation_rate.mean,
            self.ticks,
        );
        if self.tick_budget_exceeded {
            line.push_str(" | TICK BUDGET");
        }
        if self.extinct {
            line.push_str(" | EXTINCT");
        }
        line
    }
}

/// Historical statistics tracker
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsHistory {
    /// One snapshot per simulated generation
    pub snapshots: Vec<GenerationSnapshot>,
}

impl StatsHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snapshot
    pub fn record(&mut self, snapshot: GenerationSnapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn latest(&self) -> Option<&GenerationSnapshot> {
        self.snapshots.last()
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Whether the last recorded generation went extinct
    pub fn ended_extinct(&self) -> bool {
        self.latest().is_some_and(|s| s.extinct)
    }

    /// Get population over time
    pub fn population_series(&self) -> Vec<(u64, usize)> {
        self.snapshots
            .iter()
            .map(|s| (s.generation, s.population))
            .collect()
    }

    /// Get the mean of one gene over time
    pub fn gene_mean_series(&self, gene: Gene) -> Vec<(u64, f64)> {
        self.snapshots
            .iter()
            .map(|s| (s.generation, s.genes.get(gene).mean))
            .collect()
    }

    /// Get zero/one/two candy eaters over time
    pub fn eater_series(&self) -> Vec<(u64, [usize; 3])> {
        self.snapshots
            .iter()
            .map(|s| (s.generation, [s.zero_eaters, s.one_eaters, s.two_eaters]))
            .collect()
    }

    /// Save history to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Load history from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
