//! One-dimensional statistics for the quality-metric branch
//!
//! The products branch condenses the quality metrics of its referenced
//! sub-products into a median and a k-means centroid vector before its
//! regression runs.

use opsdesk_common::{Error, Result};

/// Median by sort-and-middle; an even count averages the two middles.
pub fn median(samples: &[f64]) -> Result<f64> {
    if samples.is_empty() {
        return Err(Error::InvalidInput(
            "median requires at least one sample".to_string(),
        ));
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Ok(sorted[mid])
    }
}

/// Lloyd's k-means over scalar samples with squared-Euclidean distance
///
/// Centroids initialize by cycling through the samples, so fewer samples
/// than clusters still yields exactly `k` centroids (with duplicates).
/// A cluster that loses all members keeps its previous centroid. Stops
/// when assignments stabilize or after `max_iterations`.
pub fn kmeans_1d(samples: &[f64], k: usize, max_iterations: usize) -> Result<Vec<f64>> {
    if samples.is_empty() {
        return Err(Error::InvalidInput(
            "k-means requires at least one sample".to_string(),
        ));
    }
    if k == 0 {
        return Err(Error::InvalidInput(
            "k-means requires at least one cluster".to_string(),
        ));
    }

    let mut centroids: Vec<f64> = (0..k).map(|i| samples[i % samples.len()]).collect();
    let mut assignments = vec![0usize; samples.len()];

    for _ in 0..max_iterations {
        let mut changed = false;
        for (sample_idx, sample) in samples.iter().enumerate() {
            let mut best = 0usize;
            let mut best_distance = f64::INFINITY;
            for (cluster_idx, centroid) in centroids.iter().enumerate() {
                let diff = sample - centroid;
                let distance = diff * diff;
                if distance < best_distance {
                    best_distance = distance;
                    best = cluster_idx;
                }
            }
            if assignments[sample_idx] != best {
                assignments[sample_idx] = best;
                changed = true;
            }
        }

        for (cluster_idx, centroid) in centroids.iter_mut().enumerate() {
            let mut sum = 0.0;
            let mut count = 0usize;
            for (sample_idx, sample) in samples.iter().enumerate() {
                if assignments[sample_idx] == cluster_idx {
                    sum += sample;
                    count += 1;
                }
            }
            if count > 0 {
                *centroid = sum / count as f64;
            }
        }

        if !changed {
            break;
        }
    }

    Ok(centroids)
}

/// Three sorted centroids condensed into a vector with its magnitude and
/// unit direction
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterVector {
    pub components: [f64; 3],
    pub magnitude: f64,
    pub direction: [f64; 3],
}

impl ClusterVector {
    /// Builds from exactly three centroids, sorting them ascending first.
    /// A zero-magnitude vector gets an all-zero direction.
    pub fn from_centroids(centroids: &[f64]) -> Result<Self> {
        if centroids.len() != 3 {
            return Err(Error::InvalidInput(format!(
                "cluster vector needs exactly 3 centroids, got {}",
                centroids.len()
            )));
        }

        let mut components = [centroids[0], centroids[1], centroids[2]];
        components.sort_by(f64::total_cmp);

        let magnitude = components.iter().map(|c| c * c).sum::<f64>().sqrt();
        let direction = if magnitude > 0.0 {
            [
                components[0] / magnitude,
                components[1] / magnitude,
                components[2] / magnitude,
            ]
        } else {
            [0.0; 3]
        };

        Ok(Self {
            components,
            magnitude,
            direction,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_even_count_averages_middles() {
        let result = median(&[4.0, 1.0, 3.0, 2.0]).expect("median");
        assert_eq!(result, 2.5);
    }

    #[test]
    fn test_median_odd_count_takes_middle() {
        let result = median(&[3.0, 1.0, 2.0]).expect("median");
        assert_eq!(result, 2.0);
    }

    #[test]
    fn test_median_rejects_empty_input() {
        assert!(median(&[]).is_err());
    }

    #[test]
    fn test_kmeans_returns_exactly_k_for_small_inputs() {
        for n in [1usize, 2, 3, 10] {
            let samples: Vec<f64> = (0..n).map(|i| i as f64).collect();
            let centroids = kmeans_1d(&samples, 3, 100).expect("k-means");
            assert_eq!(centroids.len(), 3, "n = {}", n);
        }
    }

    #[test]
    fn test_kmeans_separates_obvious_groups() {
        let samples = [1.0, 1.1, 0.9, 10.0, 10.1, 9.9, 100.0, 100.1, 99.9];
        let mut centroids = kmeans_1d(&samples, 3, 100).expect("k-means");
        centroids.sort_by(f64::total_cmp);

        assert!((centroids[0] - 1.0).abs() < 0.2);
        assert!((centroids[1] - 10.0).abs() < 0.2);
        assert!((centroids[2] - 100.0).abs() < 0.2);
    }

    #[test]
    fn test_cluster_vector_sorts_and_normalizes() {
        let vector = ClusterVector::from_centroids(&[3.0, 1.0, 2.0]).expect("vector");

        assert_eq!(vector.components, [1.0, 2.0, 3.0]);
        let expected_magnitude = (1.0f64 + 4.0 + 9.0).sqrt();
        assert!((vector.magnitude - expected_magnitude).abs() < 1e-12);

        let norm: f64 = vector.direction.iter().map(|d| d * d).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cluster_vector_zero_magnitude_has_zero_direction() {
        let vector = ClusterVector::from_centroids(&[0.0, 0.0, 0.0]).expect("vector");

        assert_eq!(vector.magnitude, 0.0);
        assert_eq!(vector.direction, [0.0; 3]);
    }

    #[test]
    fn test_cluster_vector_rejects_wrong_centroid_count() {
        assert!(ClusterVector::from_centroids(&[1.0, 2.0]).is_err());
        assert!(ClusterVector::from_centroids(&[1.0, 2.0, 3.0, 4.0]).is_err());
    }
}
