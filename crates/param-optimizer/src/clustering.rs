use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::capabilities::Clusterer;

/// Lloyd's k-means with k-means++ seeding. Restarts share one seeded RNG so
/// labels are reproducible; the restart with the lowest inertia wins.
#[derive(Debug, Clone)]
pub struct KMeans {
    pub restarts: usize,
    pub max_iter: usize,
    pub seed: u64,
}

impl Default for KMeans {
    fn default() -> Self {
        Self {
            restarts: 10,
            max_iter: 300,
            seed: 42,
        }
    }
}

fn sq_dist(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

fn nearest(row: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (i, c) in centroids.iter().enumerate() {
        let d = sq_dist(row, c);
        if d < best.1 {
            best = (i, d);
        }
    }
    best
}

impl KMeans {
    fn seed_centroids(&self, rows: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
        let mut centroids = vec![rows[rng.gen_range(0..rows.len())].clone()];
        while centroids.len() < k {
            let weights: Vec<f64> = rows.iter().map(|r| nearest(r, &centroids).1).collect();
            let total: f64 = weights.iter().sum();
            if total <= 0.0 {
                // every remaining row coincides with a centroid
                centroids.push(rows[rng.gen_range(0..rows.len())].clone());
                continue;
            }
            let mut target = rng.gen::<f64>() * total;
            let mut pick = rows.len() - 1;
            for (i, w) in weights.iter().enumerate() {
                if target < *w {
                    pick = i;
                    break;
                }
                target -= w;
            }
            centroids.push(rows[pick].clone());
        }
        centroids
    }

    fn lloyd(&self, rows: &[Vec<f64>], mut centroids: Vec<Vec<f64>>) -> (Vec<usize>, f64) {
        let dims = rows[0].len();
        let mut labels = vec![usize::MAX; rows.len()];
        for _ in 0..self.max_iter {
            let next: Vec<usize> = rows.iter().map(|r| nearest(r, &centroids).0).collect();
            if next == labels {
                break;
            }
            labels = next;
            for (c, centroid) in centroids.iter_mut().enumerate() {
                let members: Vec<&Vec<f64>> = rows
                    .iter()
                    .zip(&labels)
                    .filter(|(_, l)| **l == c)
                    .map(|(r, _)| r)
                    .collect();
                // empty clusters keep their previous centroid
                if members.is_empty() {
                    continue;
                }
                for d in 0..dims {
                    centroid[d] = members.iter().map(|m| m[d]).sum::<f64>() / members.len() as f64;
                }
            }
        }
        let inertia = rows
            .iter()
            .zip(&labels)
            .map(|(r, l)| sq_dist(r, &centroids[*l]))
            .sum();
        (labels, inertia)
    }
}

impl Clusterer for KMeans {
    fn fit(&self, rows: &[Vec<f64>], k: usize) -> Option<Vec<usize>> {
        if k == 0 || rows.len() < k {
            return None;
        }
        let dims = rows[0].len();
        if dims == 0 || rows.iter().any(|r| r.len() != dims) {
            return None;
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut best: Option<(Vec<usize>, f64)> = None;
        for _ in 0..self.restarts.max(1) {
            let centroids = self.seed_centroids(rows, k, &mut rng);
            let (labels, inertia) = self.lloyd(rows, centroids);
            if best.as_ref().map_or(true, |(_, b)| inertia < *b) {
                best = Some((labels, inertia));
            }
        }
        best.map(|(labels, _)| labels)
    }
}
