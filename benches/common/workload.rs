//! Seeded key streams for hit-rate benches.
//!
//! Every stream draws from a `SmallRng`, so a given `(universe, workload,
//! seed)` always replays the same keys.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::cache::PolicyCache;

/// Access pattern of a [`KeyStream`].
#[derive(Debug, Clone, Copy)]
pub enum Workload {
    /// `hot_prob` of accesses go to the first `hot_fraction` of the universe.
    Hotset { hot_fraction: f64, hot_prob: f64 },
    /// Random reads of `hot_keys` keys, interleaved with a sequential scan
    /// over the rest of the universe with probability `scan_prob`.
    ScanMix { hot_keys: u64, scan_prob: f64 },
    /// Zipf-distributed ranks with exponent `s`.
    Zipf { s: f64 },
}

#[derive(Debug)]
pub struct KeyStream {
    universe: u64,
    workload: Workload,
    rng: SmallRng,
    scan_cursor: u64,
    zipf_cdf: Vec<f64>,
}

impl KeyStream {
    pub fn new(universe: u64, workload: Workload, seed: u64) -> Self {
        let universe = universe.max(1);
        let zipf_cdf = match workload {
            Workload::Zipf { s } => zipf_cdf(universe, s),
            _ => Vec::new(),
        };
        Self {
            universe,
            workload,
            rng: SmallRng::seed_from_u64(seed),
            scan_cursor: 0,
            zipf_cdf,
        }
    }

    pub fn next_key(&mut self) -> u64 {
        match self.workload {
            Workload::Hotset {
                hot_fraction,
                hot_prob,
            } => {
                let hot = ((self.universe as f64 * hot_fraction) as u64).clamp(1, self.universe);
                if hot == self.universe || self.rng.gen_bool(hot_prob) {
                    self.rng.gen_range(0..hot)
                } else {
                    self.rng.gen_range(hot..self.universe)
                }
            },
            Workload::ScanMix {
                hot_keys,
                scan_prob,
            } => {
                let hot = hot_keys.clamp(1, self.universe);
                if hot == self.universe || !self.rng.gen_bool(scan_prob) {
                    return self.rng.gen_range(0..hot);
                }
                let key = hot + self.scan_cursor;
                self.scan_cursor = (self.scan_cursor + 1) % (self.universe - hot);
                key
            },
            Workload::Zipf { .. } => {
                let u: f64 = self.rng.gen_range(0.0..1.0);
                let rank = self.zipf_cdf.partition_point(|&p| p < u);
                (rank as u64).min(self.universe - 1)
            },
        }
    }
}

/// Normalized cumulative weights of ranks `1..=n` under `1 / rank^s`.
fn zipf_cdf(n: u64, s: f64) -> Vec<f64> {
    let mut acc = 0.0;
    let mut cdf: Vec<f64> = (1..=n)
        .map(|rank| {
            acc += (rank as f64).powf(-s);
            acc
        })
        .collect();
    for p in &mut cdf {
        *p /= acc;
    }
    cdf
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HitRate {
    pub hits: u64,
    pub misses: u64,
}

impl HitRate {
    pub fn hit_rate(self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }
}

/// Replays `operations` keys: a lookup, then an insert at `cost_for_key` on
/// a miss.
pub fn run_hit_rate<F>(
    cache: &mut PolicyCache,
    keys: &mut KeyStream,
    operations: usize,
    cost_for_key: F,
) -> HitRate
where
    F: Fn(u64) -> u64,
{
    let mut stats = HitRate::default();
    for _ in 0..operations {
        let key = keys.next_key();
        if cache.get(key) {
            stats.hits += 1;
        } else {
            stats.misses += 1;
            cache.insert(key, cost_for_key(key));
        }
    }
    stats
}
