//! Isolation forest: outliers are separated by fewer random axis-aligned splits.
//!
//! `decision_function = 0.5 - 2^(-E[h(x)] / c(psi))`, where `h` is the path
//! length in one tree, `psi` the per-tree subsample size and `c` the average
//! unsuccessful-search path length of a binary search tree. Zero is the
//! inlier/outlier boundary.

use super::{FitOutlier, OutlierDetector};
use crate::config::TrainingConfig;
use crate::error::{TrustError, TrustResult};
use ndarray::{ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForestParams {
    pub n_trees: usize,
    pub max_samples: usize,
    pub seed: u64,
}

impl Default for IsolationForestParams {
    fn default() -> Self {
        Self::from(&TrainingConfig::default())
    }
}

impl From<&TrainingConfig> for IsolationForestParams {
    fn from(c: &TrainingConfig) -> Self {
        Self {
            n_trees: c.n_trees,
            max_samples: c.max_samples,
            seed: c.seed,
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow(data: &ArrayView2<'_, f64>, rows: Vec<usize>, height_limit: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.split(data, rows, 0, height_limit, rng);
        tree
    }

    fn split(
        &mut self,
        data: &ArrayView2<'_, f64>,
        rows: Vec<usize>,
        depth: usize,
        height_limit: usize,
        rng: &mut StdRng,
    ) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node::Leaf { size: rows.len() });
        if depth >= height_limit || rows.len() <= 1 {
            return idx;
        }

        // First feature (in random order) that is not constant on this node.
        let mut features: Vec<usize> = (0..data.ncols()).collect();
        features.shuffle(rng);
        for feature in features {
            let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
                let v = data[[r, feature]];
                (lo.min(v), hi.max(v))
            });
            if hi <= lo {
                continue;
            }
            let threshold = rng.gen_range(lo..hi);
            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
                rows.iter().copied().partition(|&r| data[[r, feature]] < threshold);
            let left = self.split(data, left_rows, depth + 1, height_limit, rng);
            let right = self.split(data, right_rows, depth + 1, height_limit, rng);
            self.nodes[idx] = Node::Split {
                feature,
                threshold,
                left,
                right,
            };
            return idx;
        }
        idx
    }

    fn path_length(&self, sample: &ArrayView1<'_, f64>) -> f64 {
        let mut idx = 0;
        let mut depth = 0.0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { size } => return depth + average_path_length(size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if sample[feature] < threshold { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    n_features: usize,
}

impl IsolationForest {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Anomaly ratio in (0, 1]; values near 1 are outliers.
    pub fn anomaly_ratio(&self, sample: ArrayView1<'_, f64>) -> f64 {
        let mean_path =
            self.trees.iter().map(|t| t.path_length(&sample)).sum::<f64>() / self.trees.len() as f64;
        let norm = match average_path_length(self.sample_size) {
            c if c > 0.0 => c,
            _ => 1.0,
        };
        2f64.powf(-mean_path / norm)
    }
}

impl FitOutlier for IsolationForest {
    type Params = IsolationForestParams;

    fn fit(data: ArrayView2<'_, f64>, params: &Self::Params) -> TrustResult<Self> {
        let n = data.nrows();
        if n == 0 || data.ncols() == 0 {
            return Err(TrustError::InputMalformed(format!(
                "cannot fit isolation forest on a {}x{} matrix",
                n,
                data.ncols()
            )));
        }
        if params.n_trees == 0 {
            return Err(TrustError::Config("n_trees must be > 0".into()));
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(TrustError::InputMalformed("training matrix contains non-finite values".into()));
        }

        let sample_size = params.max_samples.clamp(1, n);
        let height_limit = (sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(params.seed);
        let trees = (0..params.n_trees)
            .map(|_| {
                let rows = rand::seq::index::sample(&mut rng, n, sample_size).into_vec();
                IsolationTree::grow(&data, rows, height_limit, &mut rng)
            })
            .collect();

        tracing::debug!(n_trees = params.n_trees, sample_size, height_limit, "isolation forest fitted");
        Ok(Self {
            trees,
            sample_size,
            n_features: data.ncols(),
        })
    }
}

impl OutlierDetector for IsolationForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn decision_function(&self, sample: ArrayView1<'_, f64>) -> TrustResult<f64> {
        if sample.len() != self.n_features {
            return Err(TrustError::scoring(format!(
                "isolation forest expects {} features, got {}",
                self.n_features,
                sample.len()
            )));
        }
        if self.trees.is_empty() {
            return Err(TrustError::scoring("isolation forest has no trees"));
        }
        Ok(0.5 - self.anomaly_ratio(sample))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    /// Roughly bell-shaped cloud around the origin.
    fn cloud(n: usize, dims: usize, seed: u64) -> Array2<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        Array2::from_shape_fn((n, dims), |_| (0..3).map(|_| rng.gen_range(-1.0..1.0)).sum::<f64>() / 3.0)
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!((average_path_length(256) - 10.2448).abs() < 1e-3);
    }

    #[test]
    fn test_outlier_scores_below_center() {
        let data = cloud(500, 3, 7);
        let forest = IsolationForest::fit(data.view(), &IsolationForestParams::default()).unwrap();
        let center = forest.decision_function(array![0.0, 0.0, 0.0].view()).unwrap();
        let far = forest.decision_function(array![8.0, -8.0, 8.0].view()).unwrap();
        assert!(far < center, "far {far} center {center}");
        assert!(far < 0.0);
        assert_eq!(forest.predict(array![8.0, -8.0, 8.0].view()).unwrap(), -1);
    }

    #[test]
    fn test_seeded_fit_is_reproducible() {
        let data = cloud(300, 4, 1);
        let params = IsolationForestParams {
            n_trees: 20,
            max_samples: 64,
            seed: 99,
        };
        let a = IsolationForest::fit(data.view(), &params).unwrap();
        let b = IsolationForest::fit(data.view(), &params).unwrap();
        assert_eq!(a, b);
        let x = array![0.3, -0.2, 0.1, 0.9];
        assert_eq!(a.decision_function(x.view()).unwrap(), b.decision_function(x.view()).unwrap());
    }

    #[test]
    fn test_subsample_capped_by_corpus_size() {
        let data = cloud(10, 2, 3);
        let forest = IsolationForest::fit(data.view(), &IsolationForestParams::default()).unwrap();
        assert_eq!(forest.sample_size, 10);
        assert_eq!(forest.n_trees(), 100);
    }

    #[test]
    fn test_constant_data_is_all_leaves() {
        let data = Array2::from_elem((50, 2), 1.0);
        let forest = IsolationForest::fit(data.view(), &IsolationForestParams::default()).unwrap();
        let score = forest.decision_function(array![1.0, 1.0].view()).unwrap();
        assert!(score.is_finite());
    }

    #[test]
    fn test_wrong_width_is_scoring_error() {
        let forest = IsolationForest::fit(cloud(20, 2, 0).view(), &IsolationForestParams::default()).unwrap();
        assert!(matches!(
            forest.decision_function(array![1.0].view()),
            Err(TrustError::Scoring { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_and_non_finite() {
        let empty = Array2::<f64>::zeros((0, 2));
        assert!(IsolationForest::fit(empty.view(), &IsolationForestParams::default()).is_err());
        let nan = array![[1.0, f64::NAN]];
        assert!(IsolationForest::fit(nan.view(), &IsolationForestParams::default()).is_err());
    }
}
