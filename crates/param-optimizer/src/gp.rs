use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::Rng;

use crate::capabilities::SurrogateModel;

/// Gaussian-process surrogate with an RBF kernel, proposing the random
/// candidate with the lowest confidence bound `mu - kappa * sigma`.
#[derive(Debug, Clone)]
pub struct GaussianProcess {
    pub length_scale: f64,
    pub noise: f64,
    pub kappa: f64,
    pub candidates: usize,
}

impl Default for GaussianProcess {
    fn default() -> Self {
        Self {
            length_scale: 0.3,
            noise: 1e-6,
            kappa: 1.96,
            candidates: 1000,
        }
    }
}

impl GaussianProcess {
    fn kernel(&self, a: &[f64], b: &[f64]) -> f64 {
        let d2: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
        (-d2 / (2.0 * self.length_scale.powi(2))).exp()
    }
}

fn random_point(dims: usize, rng: &mut StdRng) -> Vec<f64> {
    (0..dims).map(|_| rng.gen::<f64>()).collect()
}

impl SurrogateModel for GaussianProcess {
    fn propose(&self, observed: &[Vec<f64>], objective: &[f64], dims: usize, rng: &mut StdRng) -> Vec<f64> {
        let n = observed.len().min(objective.len());
        if n == 0 {
            return random_point(dims, rng);
        }

        let mean = objective[..n].iter().sum::<f64>() / n as f64;
        let std = (objective[..n].iter().map(|y| (y - mean).powi(2)).sum::<f64>() / n as f64).sqrt();
        let scale = if std > 1e-12 { std } else { 1.0 };
        let y = DVector::from_fn(n, |i, _| (objective[i] - mean) / scale);

        let k = DMatrix::from_fn(n, n, |i, j| {
            self.kernel(&observed[i], &observed[j]) + if i == j { self.noise } else { 0.0 }
        });
        let Some(chol) = k.cholesky() else {
            tracing::debug!("GP covariance not positive definite, proposing a random point");
            return random_point(dims, rng);
        };
        let alpha = chol.solve(&y);

        let mut best: Option<(Vec<f64>, f64)> = None;
        for _ in 0..self.candidates.max(1) {
            let x = random_point(dims, rng);
            let k_star = DVector::from_fn(n, |i, _| self.kernel(&x, &observed[i]));
            let mu = k_star.dot(&alpha);
            let v = chol.solve(&k_star);
            let var = (1.0 - k_star.dot(&v)).max(0.0);
            let bound = mu - self.kappa * var.sqrt();
            if best.as_ref().map_or(true, |(_, b)| bound < *b) {
                best = Some((x, bound));
            }
        }
        best.map(|(x, _)| x).unwrap_or_else(|| random_point(dims, rng))
    }
}
