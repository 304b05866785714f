//! The four-gene chromosome carried by every creature.

use crate::config::GeneConfig;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Evolvable traits of a creature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    /// Distance covered per tick (v > 0)
    pub speed: f64,
    /// Radius within which candies are noticed (r >= 0)
    pub view_range: f64,
    /// Half-angle of the heading cone around a sighted candy, in (0, pi]
    pub focus_angle: f64,
    /// Standard deviation of mutation noise; inherited, never mutated itself
    pub mutation_rate: f64,
}

/// Gene identifiers, used for per-gene statistics and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gene {
    Speed,
    ViewRange,
    FocusAngle,
    MutationRate,
}

impl Gene {
    pub const ALL: [Gene; 4] = [Gene::Speed, Gene::ViewRange, Gene::FocusAngle, Gene::MutationRate];

    /// Column-friendly name
    pub const fn name(self) -> &'static str {
        match self {
            Gene::Speed => "speed",
            Gene::ViewRange => "view_range",
            Gene::FocusAngle => "focus_angle",
            Gene::MutationRate => "mutation_rate",
        }
    }

    /// Whether mutation noise is ever applied to this gene
    pub const fn is_mutable(self) -> bool {
        !matches!(self, Gene::MutationRate)
    }
}

impl Genome {
    pub const fn new(speed: f64, view_range: f64, focus_angle: f64, mutation_rate: f64) -> Self {
        Self {
            speed,
            view_range,
            focus_angle,
            mutation_rate,
        }
    }

    /// Random genome for the founding population: each gene uniform in (0, max)
    pub fn random<R: Rng + ?Sized>(rng: &mut R, bounds: &GeneConfig) -> Self {
        let mut uniform = |max: f64| {
            if max > 0.0 && max.is_finite() {
                rng.gen_range(0.0..max)
            } else {
                0.0
            }
        };

        let speed = uniform(bounds.max_speed);
        let view_range = uniform(bounds.max_view_range);
        let focus_angle = uniform(PI);
        let mutation_rate = uniform(bounds.max_mutation_rate);

        Self::new(speed, view_range, focus_angle, mutation_rate).clamped(bounds)
    }

    /// Read a gene by identifier
    #[inline]
    pub fn get(&self, gene: Gene) -> f64 {
        match gene {
            Gene::Speed => self.speed,
            Gene::ViewRange => self.view_range,
            Gene::FocusAngle => self.focus_angle,
            Gene::MutationRate => self.mutation_rate,
        }
    }

    /// Mutable access to a gene by identifier
    #[inline]
    pub fn get_mut(&mut self, gene: Gene) -> &mut f64 {
        match gene {
            Gene::Speed => &mut self.speed,
            Gene::ViewRange => &mut self.view_range,
            Gene::FocusAngle => &mut self.focus_angle,
            Gene::MutationRate => &mut self.mutation_rate,
        }
    }

    /// Pull every gene back into its valid domain.
    ///
    /// NaN genes (which can only come from corrupted input) fall to the
    /// lower bound of their domain.
    pub fn clamped(mut self, bounds: &GeneConfig) -> Self {
        self.speed = floor_or(self.speed, bounds.min_speed);
        self.view_range = floor_or(self.view_range, 0.0);
        self.focus_angle = floor_or(self.focus_angle, bounds.min_focus_angle).min(PI);
        self.mutation_rate = floor_or(self.mutation_rate, 0.0);
        self
    }

    /// Whether every gene lies in its valid domain
    pub fn is_valid(&self, bounds: &GeneConfig) -> bool {
        self.speed >= bounds.min_speed
            && self.view_range >= 0.0
            && self.focus_angle >= bounds.min_focus_angle
            && self.focus_angle <= PI
            && self.mutation_rate >= 0.0
    }
}

#[inline]
fn floor_or(value: f64, floor: f64) -> f64 {
    if value.is_nan() {
        floor
    } else {
        value.max(floor)
    }
}
