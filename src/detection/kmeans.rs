//! K-means clustering over RGB samples

use rand::prelude::*;

/// Termination criteria, whichever is reached first
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansCriteria {
    pub max_iter: usize,
    /// Stop once no center moves further than this
    pub epsilon: f32,
}

impl Default for KMeansCriteria {
    fn default() -> Self {
        Self {
            max_iter: 1,
            epsilon: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    pub centers: Vec<[f32; 3]>,
    pub labels: Vec<usize>,
    /// Sum of squared distances from samples to their centers
    pub compactness: f32,
}

/// K-means with k-means++ seeding from a seeded generator
pub struct KMeans {
    k: usize,
    criteria: KMeansCriteria,
    attempts: usize,
    seed: u64,
}

impl KMeans {
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            criteria: KMeansCriteria::default(),
            attempts: 1,
            seed: 0x2545_f491_4f6c_dd1d,
        }
    }

    pub fn with_criteria(mut self, criteria: KMeansCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Cluster `samples`, keeping the most compact of all attempts.
    /// Returns `None` when there are fewer samples than clusters.
    pub fn fit(&self, samples: &[[f32; 3]]) -> Option<KMeansResult> {
        if samples.len() < self.k {
            return None;
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<KMeansResult> = None;
        for _ in 0..self.attempts {
            let result = self.fit_once(samples, &mut rng);
            let keep = best
                .as_ref()
                .is_none_or(|b| result.compactness < b.compactness);
            if keep {
                best = Some(result);
            }
        }
        best
    }

    fn fit_once(&self, samples: &[[f32; 3]], rng: &mut StdRng) -> KMeansResult {
        let mut centers = self.init_centers(samples, rng);
        let mut labels = vec![0usize; samples.len()];

        for _ in 0..self.criteria.max_iter.max(1) {
            for (label, sample) in labels.iter_mut().zip(samples) {
                *label = nearest(&centers, sample).0;
            }

            let mut sums = vec![[0f64; 3]; self.k];
            let mut counts = vec![0usize; self.k];
            for (label, sample) in labels.iter().zip(samples) {
                counts[*label] += 1;
                for c in 0..3 {
                    sums[*label][c] += sample[c] as f64;
                }
            }

            let mut max_shift = 0f32;
            for (i, center) in centers.iter_mut().enumerate() {
                // An emptied cluster keeps its previous center
                if counts[i] == 0 {
                    continue;
                }
                let updated = sums[i].map(|s| (s / counts[i] as f64) as f32);
                max_shift = max_shift.max(distance2(center, &updated).sqrt());
                *center = updated;
            }

            if max_shift <= self.criteria.epsilon {
                break;
            }
        }

        let mut compactness = 0f32;
        for (label, sample) in labels.iter_mut().zip(samples) {
            let (index, d2) = nearest(&centers, sample);
            *label = index;
            compactness += d2;
        }

        KMeansResult {
            centers,
            labels,
            compactness,
        }
    }

    fn init_centers(&self, samples: &[[f32; 3]], rng: &mut StdRng) -> Vec<[f32; 3]> {
        let mut centers = Vec::with_capacity(self.k);
        centers.push(samples[rng.random_range(0..samples.len())]);

        let mut d2: Vec<f32> = samples.iter().map(|s| distance2(s, &centers[0])).collect();
        while centers.len() < self.k {
            let total: f64 = d2.iter().map(|&d| d as f64).sum();
            let chosen = if total <= 0.0 {
                rng.random_range(0..samples.len())
            } else {
                let target = rng.random::<f64>() * total;
                let mut cumulative = 0f64;
                d2.iter()
                    .position(|&d| {
                        cumulative += d as f64;
                        cumulative >= target
                    })
                    .unwrap_or(samples.len() - 1)
            };

            let center = samples[chosen];
            for (d, s) in d2.iter_mut().zip(samples) {
                *d = d.min(distance2(s, &center));
            }
            centers.push(center);
        }

        centers
    }
}

fn nearest(centers: &[[f32; 3]], sample: &[f32; 3]) -> (usize, f32) {
    let mut best = (0, f32::INFINITY);
    for (i, center) in centers.iter().enumerate() {
        let d = distance2(sample, center);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

fn distance2(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    (0..3).map(|i| (a[i] - b[i]) * (a[i] - b[i])).sum()
}
