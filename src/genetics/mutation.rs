//! Gaussian mutation of offspring genomes.

use super::genome::{Gene, Genome};
use crate::config::GeneConfig;
use rand::Rng;
use std::f64::consts::TAU;

/// Standard normal sample using the Box-Muller transform on the given stream
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // u1 in (0, 1] keeps the logarithm finite
    let u1 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

/// Perturb every mutable gene by `z * sigma` with the genome's own mutation
/// rate as sigma, then clamp back into the valid domain.
///
/// One normal sample is drawn per mutable gene even when sigma is zero, so
/// the random stream advances identically regardless of the genome.
pub fn mutate<R: Rng + ?Sized>(genome: &mut Genome, rng: &mut R, bounds: &GeneConfig) {
    let sigma = genome.mutation_rate;

    for gene in Gene::ALL.into_iter().filter(|g| g.is_mutable()) {
        let z = standard_normal(rng);
        *genome.get_mut(gene) += z * sigma;
    }

    *genome = genome.clamped(bounds);
}
