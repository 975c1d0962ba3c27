//! K-Means grouping of movies by ordinal rating and duration

use crate::config::{ClusteringConfig, RatingTable};
use crate::duration::{impute_median, parse_minutes};
use crate::filter::FilteredView;
use linfa::prelude::*;
use linfa_clustering::KMeans;
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2};
use rand::{rngs::StdRng, SeedableRng};

/// Feature columns, in matrix order
pub const FEATURES: [&str; 2] = ["rating_ordinal", "duration_minutes"];

/// Movie features after imputation, ready for fitting
#[derive(Debug, Clone)]
pub struct MovieFeatures {
    /// (n_movies, 2): ordinal rating, duration in minutes
    pub features: Array2<f64>,
    pub titles: Vec<String>,
    pub ratings: Vec<String>,
    pub durations: Vec<String>,
}

impl MovieFeatures {
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.features.nrows() == 0
    }

    /// Number of different feature points
    pub fn distinct_points(&self) -> usize {
        let mut points: Vec<(u64, u64)> = self
            .features
            .outer_iter()
            .map(|row| (row[0].to_bits(), row[1].to_bits()))
            .collect();
        points.sort_unstable();
        points.dedup();
        points.len()
    }
}

/// Derive the 2-feature matrix for the movies in `view`
///
/// Movies without a rating or duration field are dropped. Ratings outside the
/// ordinal table and unparsable durations are imputed with their column
/// median; rows that remain incomplete (the whole column was missing) are
/// dropped.
pub fn derive_features(
    view: &FilteredView<'_>,
    ratings: &RatingTable,
) -> crate::Result<MovieFeatures> {
    let movies: Vec<_> = view
        .iter()
        .filter(|r| r.is_movie() && r.rating.is_some() && r.duration.is_some())
        .collect();

    let ordinals: Vec<Option<f64>> = movies
        .iter()
        .map(|r| r.rating.as_deref().and_then(|rating| ratings.ordinal(rating)))
        .collect();
    let minutes: Vec<Option<f64>> = movies
        .iter()
        .map(|r| parse_minutes(r.duration.as_deref()))
        .collect();

    let unknown = ordinals.iter().filter(|v| v.is_none()).count();
    if unknown > 0 {
        tracing::debug!(unknown, "ratings outside the ordinal table imputed with the median");
    }

    let ordinals = impute_median(&ordinals);
    let minutes = impute_median(&minutes);

    let mut data = Vec::with_capacity(movies.len() * 2);
    let mut titles = Vec::new();
    let mut rating_labels = Vec::new();
    let mut durations = Vec::new();
    for ((record, ordinal), minute) in movies.iter().zip(&ordinals).zip(&minutes) {
        if let (Some(ordinal), Some(minute)) = (ordinal, minute) {
            data.extend_from_slice(&[*ordinal, *minute]);
            titles.push(record.title.clone());
            rating_labels.push(record.rating.clone().unwrap_or_default());
            durations.push(record.duration.clone().unwrap_or_default());
        }
    }

    let features = Array2::from_shape_vec((titles.len(), FEATURES.len()), data)?;
    Ok(MovieFeatures {
        features,
        titles,
        ratings: rating_labels,
        durations,
    })
}

/// One clustered movie, joined back to its display fields
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAssignment {
    pub title: String,
    pub rating: String,
    pub duration: String,
    pub rating_ordinal: f64,
    pub duration_minutes: f64,
    pub cluster: usize,
}

/// Fitted grouping
#[derive(Debug)]
pub struct ClusterResult {
    /// Fitted K-Means model from linfa
    pub model: KMeans<f64, L2Dist>,
    pub n_clusters: usize,
    pub labels: Array1<usize>,
    /// (n_clusters, 2) in feature space
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squares
    pub inertia: f64,
    pub assignments: Vec<ClusterAssignment>,
}

impl ClusterResult {
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in self.labels.iter() {
            if label < self.n_clusters {
                sizes[label] += 1;
            }
        }
        sizes
    }
}

/// Clustering either ran or was skipped for lack of data
#[derive(Debug)]
pub enum ClusterOutcome {
    Clustered(ClusterResult),
    /// Too few usable rows (or distinct points) for the requested clusters
    Insufficient { rows: usize, required: usize },
}

/// Derive features and group movies into `config.n_clusters` clusters
///
/// Uses a single seeded K-Means run, so identical input gives identical
/// labels.
pub fn cluster_movies(
    view: &FilteredView<'_>,
    config: &ClusteringConfig,
    ratings: &RatingTable,
) -> crate::Result<ClusterOutcome> {
    let movies = derive_features(view, ratings)?;
    let required = config.n_clusters;

    if movies.is_empty() || movies.len() < required || movies.distinct_points() < required {
        tracing::warn!(
            rows = movies.len(),
            distinct = movies.distinct_points(),
            required,
            "not enough movies to cluster"
        );
        return Ok(ClusterOutcome::Insufficient {
            rows: movies.len(),
            required,
        });
    }

    let result = fit_kmeans(&movies, config)?;
    tracing::info!(
        rows = movies.len(),
        clusters = result.n_clusters,
        inertia = result.inertia,
        "movies clustered"
    );
    Ok(ClusterOutcome::Clustered(result))
}

/// Fit K-Means on already derived features
///
/// # Arguments
/// * `movies` - Feature matrix with at least `n_clusters` distinct rows
/// * `config` - Cluster count, seed, iteration cap and tolerance
pub fn fit_kmeans(
    movies: &MovieFeatures,
    config: &ClusteringConfig,
) -> crate::Result<ClusterResult> {
    let n_clusters = config.n_clusters;
    if movies.len() < n_clusters {
        anyhow::bail!(
            "Number of data points ({}) must be at least equal to number of clusters ({})",
            movies.len(),
            n_clusters
        );
    }

    // Create dataset for linfa
    let n_samples = movies.len();
    // Dummy targets for unsupervised learning
    let targets: Array1<usize> = Array1::zeros(n_samples);
    let dataset = Dataset::new(movies.features.clone(), targets);

    let rng = StdRng::seed_from_u64(config.seed);
    let model = KMeans::params_with(n_clusters, rng, L2Dist)
        .n_runs(1)
        .max_n_iterations(config.max_iterations)
        .tolerance(config.tolerance)
        .fit(&dataset)?;

    let labels = model.predict(&dataset);
    let centroids = model.centroids().clone();
    let inertia = compute_inertia(&movies.features, &labels, &centroids);

    let assignments = labels
        .iter()
        .enumerate()
        .map(|(i, &cluster)| ClusterAssignment {
            title: movies.titles[i].clone(),
            rating: movies.ratings[i].clone(),
            duration: movies.durations[i].clone(),
            rating_ordinal: movies.features[[i, 0]],
            duration_minutes: movies.features[[i, 1]],
            cluster,
        })
        .collect();

    Ok(ClusterResult {
        model,
        n_clusters,
        labels,
        centroids,
        inertia,
        assignments,
    })
}

/// Compute within-cluster sum of squares (inertia)
fn compute_inertia(
    features: &Array2<f64>,
    labels: &Array1<usize>,
    centroids: &Array2<f64>,
) -> f64 {
    let mut inertia = 0.0;

    for (i, &cluster) in labels.iter().enumerate() {
        if cluster < centroids.nrows() {
            let point = features.row(i);
            let centroid = centroids.row(cluster);
            let distance_sq = point
                .iter()
                .zip(centroid.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>();
            inertia += distance_sq;
        }
    }

    inertia
}
