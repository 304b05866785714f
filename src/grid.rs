//! Toroidal board geometry.
//!
//! Every coordinate lives in `[0, width) x [0, height)` and the edges are
//! glued together, so distances and bearings always take the shortest of
//! the periodic images.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// A continuous point on the board
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Board dimensions with periodic boundaries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Torus {
    pub width: f64,
    pub height: f64,
}

impl Torus {
    /// Create a torus; dimensions are validated by `Config::validate`
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Map any point into `[0, width) x [0, height)`
    #[inline]
    pub fn wrap(&self, p: Position) -> Position {
        Position {
            x: wrap_axis(p.x, self.width),
            y: wrap_axis(p.y, self.height),
        }
    }

    /// Shortest displacement from `a` to `b`, each component in `[-L/2, L/2]`
    #[inline]
    pub fn delta(&self, a: Position, b: Position) -> (f64, f64) {
        (
            shortest_axis(b.x - a.x, self.width),
            shortest_axis(b.y - a.y, self.height),
        )
    }

    /// Euclidean distance along the shortest periodic image
    #[inline]
    pub fn distance(&self, a: Position, b: Position) -> f64 {
        let (dx, dy) = self.delta(a, b);
        dx.hypot(dy)
    }

    /// Bearing (radians, counter-clockwise from +x) of the shortest path from `a` to `b`
    #[inline]
    pub fn direction(&self, a: Position, b: Position) -> f64 {
        let (dx, dy) = self.delta(a, b);
        dy.atan2(dx)
    }

    /// Move `step` units from `p` along `heading`, wrapping around the edges
    #[inline]
    pub fn advance(&self, p: Position, heading: f64, step: f64) -> Position {
        self.wrap(Position {
            x: p.x + step * heading.cos(),
            y: p.y + step * heading.sin(),
        })
    }

    /// Uniformly random point on the board
    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Position {
        Position {
            x: rng.gen_range(0.0..self.width),
            y: rng.gen_range(0.0..self.height),
        }
    }
}

#[inline]
fn wrap_axis(value: f64, length: f64) -> f64 {
    let wrapped = value.rem_euclid(length);
    // rem_euclid of a tiny negative value can round up to `length` itself
    if wrapped >= length {
        0.0
    } else {
        wrapped
    }
}

#[inline]
fn shortest_axis(d: f64, length: f64) -> f64 {
    d - length * (d / length).round()
}

/// Uniformly random heading in `[0, 2pi)`
pub fn random_heading<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen_range(0.0..TAU)
}

/// Normalize an angle into `[0, 2pi)`
#[inline]
pub fn normalize_angle(angle: f64) -> f64 {
    wrap_axis(angle, TAU)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::f64::consts::PI;

    fn board() -> Torus {
        Torus::new(100.0, 50.0)
    }

    #[test]
    fn test_wrap_stays_in_bounds() {
        let torus = board();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..1000 {
            let p = torus.random_position(&mut rng);
            let d = (rng.gen_range(-1e4..1e4), rng.gen_range(-1e4..1e4));
            let moved = torus.wrap(Position::new(p.x + d.0, p.y + d.1));

            assert!(moved.x >= 0.0 && moved.x < torus.width);
            assert!(moved.y >= 0.0 && moved.y < torus.height);
            assert_eq!(torus.wrap(moved), moved);
        }
    }

    #[test]
    fn test_wrap_tiny_negative() {
        let torus = board();
        let p = torus.wrap(Position::new(-1e-18, -1e-18));
        assert!(p.x < torus.width);
        assert!(p.y < torus.height);
    }

    #[test]
    fn test_distance_across_edge() {
        let torus = board();
        let a = Position::new(1.0, 25.0);
        let b = Position::new(99.0, 25.0);

        assert!((torus.distance(a, b) - 2.0).abs() < 1e-12);
        // Shortest path from a to b heads west
        assert!((torus.direction(a, b).abs() - PI).abs() < 1e-12);
    }

    #[test]
    fn test_distance_symmetry() {
        let torus = board();
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for _ in 0..1000 {
            let a = torus.random_position(&mut rng);
            let b = torus.random_position(&mut rng);
            assert_eq!(torus.distance(a, b), torus.distance(b, a));
        }

        // Exactly half a board apart
        let a = Position::new(0.0, 0.0);
        let b = Position::new(50.0, 25.0);
        assert_eq!(torus.distance(a, b), torus.distance(b, a));
    }

    #[test]
    fn test_advance_wraps() {
        let torus = board();
        let p = torus.advance(Position::new(99.0, 49.0), PI / 4.0, 2.0_f64.sqrt() * 2.0);

        assert!((p.x - 1.0).abs() < 1e-9);
        assert!((p.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(-PI / 2.0) - 1.5 * PI).abs() < 1e-12);
        assert!((normalize_angle(5.0 * PI) - PI).abs() < 1e-12);
    }
}
