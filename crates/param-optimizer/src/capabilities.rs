use std::fmt;

use rand::rngs::StdRng;

/// An optional backend, resolved once when the optimizer is built.
pub enum Capability<T> {
    Available(T),
    Unavailable,
}

impl<T> Capability<T> {
    pub fn as_ref(&self) -> Option<&T> {
        match self {
            Capability::Available(inner) => Some(inner),
            Capability::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }
}

/// Smoothed density over one-dimensional samples.
pub trait DensityEstimator: Send + Sync {
    /// Index into `points` with the highest estimated density, or `None`
    /// when the samples cannot support an estimate.
    fn peak(&self, samples: &[f64], points: &[f64]) -> Option<usize>;
}

/// Partitions rows of (already standardised) features into `k` groups.
pub trait Clusterer: Send + Sync {
    /// One label in `0..k` per row, or `None` when clustering is impossible.
    fn fit(&self, rows: &[Vec<f64>], k: usize) -> Option<Vec<usize>>;
}

/// Sequential model-based proposal over the unit cube.
pub trait SurrogateModel: Send + Sync {
    /// Next point to evaluate given observed points and objective values
    /// (lower is better).
    fn propose(&self, observed: &[Vec<f64>], objective: &[f64], dims: usize, rng: &mut StdRng) -> Vec<f64>;
}

pub struct Capabilities {
    pub kde: Capability<Box<dyn DensityEstimator>>,
    pub clustering: Capability<Box<dyn Clusterer>>,
    pub bayesian: Capability<Box<dyn SurrogateModel>>,
}

impl Capabilities {
    /// Every backend compiled into this build.
    pub fn detect() -> Self {
        Self {
            kde: detect_kde(),
            clustering: detect_clustering(),
            bayesian: detect_bayesian(),
        }
    }

    /// No optional backends; every policy takes its fallback path.
    pub fn none() -> Self {
        Self {
            kde: Capability::Unavailable,
            clustering: Capability::Unavailable,
            bayesian: Capability::Unavailable,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::detect()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("kde", &self.kde.is_available())
            .field("clustering", &self.clustering.is_available())
            .field("bayesian", &self.bayesian.is_available())
            .finish()
    }
}

#[cfg(feature = "kde")]
fn detect_kde() -> Capability<Box<dyn DensityEstimator>> {
    Capability::Available(Box::new(crate::kde::GaussianKde))
}

#[cfg(not(feature = "kde"))]
fn detect_kde() -> Capability<Box<dyn DensityEstimator>> {
    Capability::Unavailable
}

#[cfg(feature = "clustering")]
fn detect_clustering() -> Capability<Box<dyn Clusterer>> {
    Capability::Available(Box::new(crate::clustering::KMeans::default()))
}

#[cfg(not(feature = "clustering"))]
fn detect_clustering() -> Capability<Box<dyn Clusterer>> {
    Capability::Unavailable
}

#[cfg(feature = "bayesian")]
fn detect_bayesian() -> Capability<Box<dyn SurrogateModel>> {
    Capability::Available(Box::new(crate::gp::GaussianProcess::default()))
}

#[cfg(not(feature = "bayesian"))]
fn detect_bayesian() -> Capability<Box<dyn SurrogateModel>> {
    Capability::Unavailable
}
