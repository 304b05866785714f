//! Arithmetic crossover between two parent genomes.

use super::genome::{Gene, Genome};
use rand::Rng;

/// Blend two parents with weight `mix`, producing the pair of complementary children.
///
/// `first` gets `mix * p1 + (1 - mix) * p2`, `second` the mirror image. Every
/// gene blends, the mutation rate included.
pub fn blend(parent1: &Genome, parent2: &Genome, mix: f64) -> (Genome, Genome) {
    let mut first = *parent1;
    let mut second = *parent2;

    for gene in Gene::ALL {
        let a = parent1.get(gene);
        let b = parent2.get(gene);
        *first.get_mut(gene) = mix * a + (1.0 - mix) * b;
        *second.get_mut(gene) = mix * b + (1.0 - mix) * a;
    }

    (first, second)
}

/// Draw one mixing weight for the pair and blend.
///
/// Returns both children and the weight that was used.
pub fn crossover<R: Rng + ?Sized>(
    parent1: &Genome,
    parent2: &Genome,
    rng: &mut R,
) -> (Genome, Genome, f64) {
    let mix: f64 = rng.gen();
    let (first, second) = blend(parent1, parent2, mix);
    (first, second, mix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_identical_parents_fixed_point() {
        let parent = Genome::new(3.5, 7.25, 1.2, 0.3);
        let (a, b) = blend(&parent, &parent, 0.5);

        assert_eq!(a, parent);
        assert_eq!(b, parent);
    }

    #[test]
    fn test_blend_weights() {
        let p1 = Genome::new(2.0, 10.0, 1.0, 0.2);
        let p2 = Genome::new(4.0, 0.0, 3.0, 0.0);

        let (a, b) = blend(&p1, &p2, 0.25);
        assert!((a.speed - 3.5).abs() < 1e-12);
        assert!((b.speed - 2.5).abs() < 1e-12);
        assert!((a.view_range - 2.5).abs() < 1e-12);
        assert!((b.view_range - 7.5).abs() < 1e-12);
        assert!((a.mutation_rate - 0.05).abs() < 1e-12);
        assert!((b.mutation_rate - 0.15).abs() < 1e-12);

        // Extremes reproduce the parents
        let (a, b) = blend(&p1, &p2, 1.0);
        assert_eq!(a, p1);
        assert_eq!(b, p2);
    }

    #[test]
    fn test_children_bracketed_by_parents() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let p1 = Genome::new(1.0, 4.0, 0.5, 0.1);
        let p2 = Genome::new(6.0, 2.0, 2.5, 0.4);

        for _ in 0..100 {
            let (a, b, mix) = crossover(&p1, &p2, &mut rng);
            assert!((0.0..1.0).contains(&mix));
            for gene in Gene::ALL {
                let lo = p1.get(gene).min(p2.get(gene)) - 1e-12;
                let hi = p1.get(gene).max(p2.get(gene)) + 1e-12;
                assert!(a.get(gene) >= lo && a.get(gene) <= hi);
                assert!(b.get(gene) >= lo && b.get(gene) <= hi);
                // Children sum to the parents' sum
                let sum = a.get(gene) + b.get(gene) - p1.get(gene) - p2.get(gene);
                assert!(sum.abs() < 1e-9);
            }
        }
    }
}
