use statrs::distribution::{Continuous, Normal};

use crate::capabilities::DensityEstimator;

/// Gaussian kernel density estimate with Scott's rule bandwidth.
pub struct GaussianKde;

impl GaussianKde {
    /// `n^(-1/5)` times the sample standard deviation; `None` for fewer than
    /// two samples or no spread.
    pub fn bandwidth(samples: &[f64]) -> Option<f64> {
        let n = samples.len();
        if n < 2 {
            return None;
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let bw = (n as f64).powf(-0.2) * var.sqrt();
        (bw.is_finite() && bw > 0.0).then_some(bw)
    }

    pub fn density(samples: &[f64], bandwidth: f64, x: f64) -> Option<f64> {
        let kernels: Vec<Normal> = samples
            .iter()
            .map(|&s| Normal::new(s, bandwidth).ok())
            .collect::<Option<_>>()?;
        Some(kernels.iter().map(|k| k.pdf(x)).sum::<f64>() / samples.len() as f64)
    }
}

impl DensityEstimator for GaussianKde {
    fn peak(&self, samples: &[f64], points: &[f64]) -> Option<usize> {
        if points.is_empty() {
            return None;
        }
        let bw = Self::bandwidth(samples)?;
        let mut best: Option<(usize, f64)> = None;
        for (i, &x) in points.iter().enumerate() {
            let d = Self::density(samples, bw, x)?;
            if best.map_or(true, |(_, b)| d > b) {
                best = Some((i, d));
            }
        }
        best.map(|(i, _)| i)
    }
}
