//! Lloyd's k-means with k-means++ initialization.
//!
//! Deterministic for a given RNG state. Ties in nearest-centroid
//! assignment go to the lower cluster index. Every run ends with exactly
//! `k` non-empty clusters: an empty cluster takes over the point farthest
//! from its own centroid (drawn from clusters with more than one member).

use rand::Rng;

use crate::error::CoreError;

/// Iteration limits for [`kmeans`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KMeansParams {
    pub k: usize,
    pub max_iterations: usize,
    /// Converged once no centroid moves farther than this (Euclidean).
    pub tolerance: f64,
}

impl KMeansParams {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iterations: 300,
            tolerance: 1e-4,
        }
    }
}

/// Result of one k-means run.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit<const D: usize> {
    pub centroids: Vec<[f64; D]>,
    pub labels: Vec<usize>,
    pub iterations: usize,
    /// Sum of squared distances from each point to its centroid.
    pub inertia: f64,
}

pub fn kmeans<const D: usize, R: Rng>(
    points: &[[f64; D]],
    params: KMeansParams,
    rng: &mut R,
) -> Result<KMeansFit<D>, CoreError> {
    let k = params.k;
    if k == 0 {
        return Err(CoreError::InvalidParameter("k must be at least 1".into()));
    }
    if points.len() < k {
        return Err(CoreError::InsufficientData {
            rows: points.len(),
            required: k,
        });
    }

    let mut centroids = init_plus_plus(points, k, rng);
    let mut labels = vec![0; points.len()];
    let mut iterations = 0;

    for iter in 1..=params.max_iterations {
        assign(points, &centroids, &mut labels);
        fill_empty_clusters(points, &mut centroids, &mut labels);
        let updated = update_centroids(points, &labels, k);
        let shift = centroids
            .iter()
            .zip(&updated)
            .map(|(a, b)| squared_distance(a, b).sqrt())
            .fold(0.0_f64, f64::max);
        centroids = updated;
        iterations = iter;
        if shift <= params.tolerance {
            break;
        }
    }

    assign(points, &centroids, &mut labels);
    fill_empty_clusters(points, &mut centroids, &mut labels);

    let inertia = points
        .iter()
        .zip(&labels)
        .map(|(p, &l)| squared_distance(p, &centroids[l]))
        .sum();

    Ok(KMeansFit {
        centroids,
        labels,
        iterations,
        inertia,
    })
}

/// k-means++ seeding: first centroid uniform, then each next one drawn with
/// probability proportional to squared distance from the nearest chosen
/// centroid.
fn init_plus_plus<const D: usize, R: Rng>(
    points: &[[f64; D]],
    k: usize,
    rng: &mut R,
) -> Vec<[f64; D]> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())]);

    let mut nearest: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = nearest.iter().sum();
        let chosen = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            nearest
                .iter()
                .position(|&d| {
                    cumulative += d;
                    cumulative > target
                })
                .unwrap_or(points.len() - 1)
        } else {
            // All points coincide with a centroid already.
            rng.gen_range(0..points.len())
        };

        let centroid = points[chosen];
        for (d, p) in nearest.iter_mut().zip(points) {
            *d = d.min(squared_distance(p, &centroid));
        }
        centroids.push(centroid);
    }
    centroids
}

fn assign<const D: usize>(points: &[[f64; D]], centroids: &[[f64; D]], labels: &mut [usize]) {
    for (p, label) in points.iter().zip(labels.iter_mut()) {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (c, centroid) in centroids.iter().enumerate() {
            let d = squared_distance(p, centroid);
            if d < best_dist {
                best_dist = d;
                best = c;
            }
        }
        *label = best;
    }
}

fn fill_empty_clusters<const D: usize>(
    points: &[[f64; D]],
    centroids: &mut [[f64; D]],
    labels: &mut [usize],
) {
    let k = centroids.len();
    let mut sizes = vec![0usize; k];
    for &l in labels.iter() {
        sizes[l] += 1;
    }

    for empty in 0..k {
        if sizes[empty] > 0 {
            continue;
        }
        let mut farthest = None;
        let mut farthest_dist = -1.0;
        for (i, p) in points.iter().enumerate() {
            let owner = labels[i];
            if sizes[owner] <= 1 {
                continue;
            }
            let d = squared_distance(p, &centroids[owner]);
            if d > farthest_dist {
                farthest_dist = d;
                farthest = Some(i);
            }
        }
        // points.len() >= k guarantees a donor cluster exists.
        if let Some(i) = farthest {
            sizes[labels[i]] -= 1;
            labels[i] = empty;
            sizes[empty] = 1;
            centroids[empty] = points[i];
        }
    }
}

fn update_centroids<const D: usize>(
    points: &[[f64; D]],
    labels: &[usize],
    k: usize,
) -> Vec<[f64; D]> {
    let mut sums = vec![[0.0; D]; k];
    let mut counts = vec![0usize; k];
    for (p, &l) in points.iter().zip(labels) {
        for (s, v) in sums[l].iter_mut().zip(p) {
            *s += v;
        }
        counts[l] += 1;
    }
    for (sum, &count) in sums.iter_mut().zip(&counts) {
        if count > 0 {
            for s in sum.iter_mut() {
                *s /= count as f64;
            }
        }
    }
    sums
}

pub(crate) fn squared_distance<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}
