//! Evolution mechanics - parent selection, pairing, and offspring creation.

use crate::config::{Config, GeneConfig, ParentSampling, Replacement};
use crate::creature::{Creature, CreatureId, CANDIES_TO_REPRODUCE};
use crate::error::EvolutionError;
use crate::genetics::{crossover, mutate};
use crate::grid::Torus;
use rand::seq::SliceRandom;
use rand::Rng;

/// Offspring of one evening together with how they were produced
#[derive(Debug, Clone, Default)]
pub struct Brood {
    pub offspring: Vec<Creature>,
    /// Number of eligible parents the pairs were drawn from
    pub eligible: usize,
    /// Pairs that shared a single parent
    pub self_pairs: usize,
}

/// Evolution engine for managing population genetics
#[derive(Debug, Clone)]
pub struct EvolutionEngine {
    pub parent_sampling: ParentSampling,
    pub replacement: Replacement,
    pub genes: GeneConfig,
    pub torus: Torus,
    /// Parents drawn per evening under `WithReplacement`
    pub population_size: usize,
    pub max_population: usize,
}

impl EvolutionEngine {
    /// Create evolution engine from config
    pub fn from_config(config: &Config) -> Self {
        Self {
            parent_sampling: config.evolution.parent_sampling,
            replacement: config.evolution.replacement,
            genes: config.genes.clone(),
            torus: config.torus(),
            population_size: config.population.size,
            max_population: config.safety.max_population,
        }
    }

    /// Indices into `population` of living creatures that ate two candies
    pub fn eligible_parents(population: &[Creature]) -> Vec<usize> {
        population
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_alive() && c.candies_eaten >= CANDIES_TO_REPRODUCE)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Draw parent pairs as positions into a list of `eligible` parents
    pub fn select_pairs<R: Rng + ?Sized>(
        &self,
        eligible: usize,
        rng: &mut R,
    ) -> Result<Vec<(usize, usize)>, EvolutionError> {
        if eligible == 0 {
            return Err(EvolutionError::NoEligibleParents);
        }

        let pairs = match self.parent_sampling {
            ParentSampling::WithReplacement => {
                let draws: Vec<usize> = (0..self.population_size)
                    .map(|_| rng.gen_range(0..eligible))
                    .collect();
                draws.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect()
            }
            ParentSampling::Permutation => {
                let mut perm: Vec<usize> = (0..eligible).collect();
                perm.shuffle(rng);

                let mut pairs: Vec<(usize, usize)> =
                    perm.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect();

                if let Some(&last) = perm.chunks_exact(2).remainder().first() {
                    let partner = if eligible == 1 {
                        last
                    } else {
                        perm[rng.gen_range(0..eligible - 1)]
                    };
                    pairs.push((last, partner));
                }
                pairs
            }
        };

        Ok(pairs)
    }

    /// Produce two children of `parent1` and `parent2`: crossover, then mutation, then random placement
    pub fn breed<R: Rng + ?Sized>(
        &self,
        parent1: &Creature,
        parent2: &Creature,
        next_id: &mut CreatureId,
        rng: &mut R,
    ) -> [Creature; 2] {
        let (mut first, mut second, _mix) = crossover(&parent1.genome, &parent2.genome, rng);
        mutate(&mut first, rng, &self.genes);
        mutate(&mut second, rng, &self.genes);

        let mut child = |genome, p1: &Creature, p2: &Creature| {
            let id = *next_id;
            *next_id += 1;
            Creature::offspring(id, self.torus.random_position(rng), genome, p1, p2)
        };

        [child(first, parent1, parent2), child(second, parent2, parent1)]
    }

    /// Run the evening's reproduction over the whole population
    pub fn reproduce<R: Rng + ?Sized>(
        &self,
        population: &[Creature],
        next_id: &mut CreatureId,
        rng: &mut R,
    ) -> Result<Brood, EvolutionError> {
        let eligible = Self::eligible_parents(population);
        let pairs = self.select_pairs(eligible.len(), rng)?;

        let mut brood = Brood {
            offspring: Vec::with_capacity(pairs.len() * 2),
            eligible: eligible.len(),
            self_pairs: 0,
        };

        for (a, b) in pairs {
            let parent1 = &population[eligible[a]];
            let parent2 = &population[eligible[b]];
            if parent1.id == parent2.id {
                brood.self_pairs += 1;
            }
            brood
                .offspring
                .extend(self.breed(parent1, parent2, next_id, rng));
        }

        Ok(brood)
    }

    /// Assemble the population for the next day
    pub fn next_generation(&self, population: Vec<Creature>, brood: Brood) -> Vec<Creature> {
        match self.replacement {
            Replacement::Generational => brood.offspring,
            Replacement::Overlapping => {
                let mut next: Vec<Creature> = population.into_iter().filter(|c| c.is_alive()).collect();
                let room = self.max_population.saturating_sub(next.len());
                let born = brood.offspring.len();
                if born > room {
                    log::warn!(
                        "Population cap {} reached; dropping {} of {} offspring",
                        self.max_population,
                        born - room,
                        born
                    );
                }
                next.extend(brood.offspring.into_iter().take(room));
                next
            }
        }
    }
}
