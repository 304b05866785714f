//! Candy field with a bucketed spatial index for proximity queries.

use crate::grid::{Position, Torus};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Stable identifier of a candy within one day's field
pub type CandyId = usize;

/// Most buckets the index lays along one board axis
pub const MAX_BUCKETS_PER_AXIS: usize = 1024;

/// Uniform bucket grid over the torus.
///
/// Buckets store candy ids; eaten candies are filtered out at query time so
/// the index never needs updating after a spawn.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct BucketIndex {
    cols: usize,
    rows: usize,
    cell_w: f64,
    cell_h: f64,
    cells: Vec<Vec<CandyId>>,
}

impl BucketIndex {
    fn new(torus: &Torus, cell_size: f64) -> Self {
        let cols = buckets_along(torus.width, cell_size);
        let rows = buckets_along(torus.height, cell_size);

        Self {
            cols,
            rows,
            cell_w: torus.width / cols as f64,
            cell_h: torus.height / rows as f64,
            cells: vec![Vec::new(); cols * rows],
        }
    }

    fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
    }

    #[inline]
    fn cell_of(&self, p: Position) -> (usize, usize) {
        let cx = ((p.x / self.cell_w) as usize).min(self.cols - 1);
        let cy = ((p.y / self.cell_h) as usize).min(self.rows - 1);
        (cx, cy)
    }

    fn insert(&mut self, p: Position, id: CandyId) {
        let (cx, cy) = self.cell_of(p);
        self.cells[cy * self.cols + cx].push(id);
    }

    /// Ids stored in every bucket that may hold a point within `radius` of `p`
    fn candidates(&self, p: Position, radius: f64, out: &mut Vec<CandyId>) {
        let (cx, cy) = self.cell_of(p);
        let xs = wrapped_span(cx, reach(radius, self.cell_w, self.cols), self.cols);
        let ys = wrapped_span(cy, reach(radius, self.cell_h, self.rows), self.rows);

        for &y in &ys {
            for &x in &xs {
                out.extend_from_slice(&self.cells[y * self.cols + x]);
            }
        }
    }
}

/// Buckets along an axis of length `extent`, in `1..=MAX_BUCKETS_PER_AXIS`
fn buckets_along(extent: f64, cell_size: f64) -> usize {
    let n = (extent / cell_size).floor();
    if n.is_nan() || n < 1.0 {
        1
    } else {
        n.min(MAX_BUCKETS_PER_AXIS as f64) as usize
    }
}

/// Buckets a radius spans along an axis, saturating at the axis length
#[inline]
fn reach(radius: f64, cell: f64, len: usize) -> usize {
    (radius / cell).ceil().min(len as f64) as usize
}

/// Distinct bucket coordinates within `reach` of `center` on a ring of `len` buckets
fn wrapped_span(center: usize, reach: usize, len: usize) -> Vec<usize> {
    if reach >= len / 2 {
        return (0..len).collect();
    }
    (0..=2 * reach)
        .map(|offset| (center + len + offset - reach) % len)
        .collect()
}

/// All candies on the board for the current day
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FoodField {
    torus: Torus,
    /// Slot per candy id; `None` once eaten
    candies: Vec<Option<Position>>,
    live: usize,
    index: BucketIndex,
}

impl FoodField {
    /// Create an empty field
    pub fn new(torus: Torus, cell_size: f64) -> Self {
        Self {
            torus,
            candies: Vec::new(),
            live: 0,
            index: BucketIndex::new(&torus, cell_size),
        }
    }

    /// Replace the field with `count` candies at uniform random positions
    pub fn spawn<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) {
        let positions: Vec<Position> = (0..count)
            .map(|_| self.torus.random_position(rng))
            .collect();
        self.place(positions);
    }

    /// Replace the field with candies at the given positions (ids follow order)
    pub fn place(&mut self, positions: Vec<Position>) {
        self.index.clear();
        self.candies.clear();

        for (id, p) in positions.into_iter().enumerate() {
            let p = self.torus.wrap(p);
            self.index.insert(p, id);
            self.candies.push(Some(p));
        }
        self.live = self.candies.len();
    }

    /// Live candies within toroidal distance `radius` of `position`, ascending by id
    pub fn nearby(&self, position: Position, radius: f64) -> Vec<CandyId> {
        if radius < 0.0 || self.live == 0 {
            return Vec::new();
        }

        let mut ids = Vec::new();
        self.index.candidates(position, radius, &mut ids);
        ids.retain(|&id| {
            self.position(id)
                .is_some_and(|p| self.torus.distance(position, p) <= radius)
        });
        ids.sort_unstable();
        ids
    }

    /// Closest live candy within `radius`, ties broken by the lowest id
    pub fn nearest(&self, position: Position, radius: f64) -> Option<(CandyId, f64)> {
        self.nearby(position, radius)
            .into_iter()
            .filter_map(|id| self.position(id).map(|p| (id, self.torus.distance(position, p))))
            .fold(None, |best, (id, d)| match best {
                Some((_, best_d)) if best_d <= d => best,
                _ => Some((id, d)),
            })
    }

    /// Remove a candy. Returns `false` if it was already eaten or never existed.
    pub fn consume(&mut self, id: CandyId) -> bool {
        match self.candies.get_mut(id) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                self.live -= 1;
                true
            }
            _ => false,
        }
    }

    /// Position of a live candy
    #[inline]
    pub fn position(&self, id: CandyId) -> Option<Position> {
        self.candies.get(id).copied().flatten()
    }

    /// Number of candies not yet eaten
    #[inline]
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Number of candies spawned this day
    #[inline]
    pub fn spawned_count(&self) -> usize {
        self.candies.len()
    }

    /// Iterate over live candies
    pub fn iter(&self) -> impl Iterator<Item = (CandyId, Position)> + '_ {
        self.candies
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.map(|p| (id, p)))
    }

    /// Board this field lives on
    pub fn torus(&self) -> &Torus {
        &self.torus
    }
}
