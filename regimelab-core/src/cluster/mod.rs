//! Regime clustering: standardization, k-means, and the trained model.

pub mod kmeans;
pub mod model;
pub mod scaler;

pub use kmeans::{kmeans, KMeansFit, KMeansParams};
pub use model::{ClusterModel, ClusterStats, MAX_CLUSTERS, MIN_CLUSTERS};
pub use scaler::StandardScaler;
