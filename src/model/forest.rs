//! Random forest classifier built from bootstrapped CART trees.
//!
//! Each tree is grown on a bootstrap sample using Gini impurity, drawing a
//! random subset of `sqrt(n_features)` candidate features per node. All
//! randomness comes from one `StdRng` seeded from [`ForestParams::seed`], so a
//! fit on identical data always yields identical trees.
//!
//! Missing feature values are represented as NaN. A NaN never satisfies
//! `value <= threshold` and therefore always follows the right branch, both
//! while growing and while predicting.

use super::{check_lengths, feature_width, Classifier, Features, ModelError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Minimum impurity decrease for a split to be kept
const MIN_IMPURITY_DECREASE: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct ForestParams {
    pub n_trees: usize,
    /// `None` grows every tree until its leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

/// Ensemble of decision trees voting by averaged class probabilities
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    params: ForestParams,
    trees: Vec<DecisionTree>,
    n_classes: usize,
    n_features: usize,
    is_trained: bool,
}

/// Decision tree stored as a node arena
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
    root: usize,
}

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        /// Class probabilities at this leaf, indexed by class code
        distribution: Vec<f64>,
    },
    Split {
        feature_index: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

struct SplitCandidate {
    feature_index: usize,
    threshold: f64,
    impurity: f64,
}

impl RandomForestClassifier {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
            n_classes: 0,
            n_features: 0,
            is_trained: false,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Averaged class probabilities for each row
    pub fn predict_proba(&self, features: &Features) -> Result<Vec<Vec<f64>>, ModelError> {
        if !self.is_trained {
            return Err(ModelError::NotFitted);
        }
        features
            .iter()
            .map(|row| {
                if row.len() != self.n_features {
                    return Err(ModelError::DimensionMismatch {
                        expected: self.n_features,
                        actual: row.len(),
                    });
                }
                let mut totals = vec![0.0; self.n_classes];
                for tree in &self.trees {
                    for (total, p) in totals.iter_mut().zip(tree.distribution(row)) {
                        *total += p;
                    }
                }
                let n_trees = self.trees.len() as f64;
                Ok(totals.into_iter().map(|t| t / n_trees).collect())
            })
            .collect()
    }
}

impl Classifier for RandomForestClassifier {
    fn fit(&mut self, features: &Features, labels: &[usize]) -> Result<(), ModelError> {
        let width = feature_width(features)?;
        check_lengths(features.len(), labels.len())?;

        let n_classes = labels.iter().max().map(|m| m + 1).unwrap_or(0);
        let n_samples = features.len();
        let max_features = ((width as f64).sqrt() as usize).max(1);
        let mut rng = StdRng::seed_from_u64(self.params.seed);

        let mut trees = Vec::with_capacity(self.params.n_trees);
        for _ in 0..self.params.n_trees.max(1) {
            let sample: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
            let builder = TreeBuilder {
                features,
                labels,
                n_classes,
                width,
                max_features,
                params: &self.params,
            };
            trees.push(builder.grow(sample, &mut rng));
        }

        self.trees = trees;
        self.n_classes = n_classes;
        self.n_features = width;
        self.is_trained = true;
        Ok(())
    }

    fn predict(&self, features: &Features) -> Result<Vec<usize>, ModelError> {
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|probabilities| argmax(&probabilities))
            .collect())
    }
}

impl DecisionTree {
    fn distribution(&self, row: &[f64]) -> &[f64] {
        let mut idx = self.root;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { distribution } => return distribution,
                TreeNode::Split {
                    feature_index,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature_index] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

struct TreeBuilder<'a> {
    features: &'a Features,
    labels: &'a [usize],
    n_classes: usize,
    width: usize,
    max_features: usize,
    params: &'a ForestParams,
}

impl TreeBuilder<'_> {
    fn grow(&self, sample: Vec<usize>, rng: &mut StdRng) -> DecisionTree {
        let mut nodes: Vec<TreeNode> = Vec::new();
        // (slot, sample indices, depth)
        let mut pending: Vec<(usize, Vec<usize>, usize)> = Vec::new();

        nodes.push(self.leaf(&sample));
        pending.push((0, sample, 0));

        while let Some((slot, indices, depth)) = pending.pop() {
            if !self.can_split(&indices, depth) {
                continue;
            }
            let Some(best) = self.best_split(&indices, rng) else {
                continue;
            };

            let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                .into_iter()
                .partition(|&i| self.features[i][best.feature_index] <= best.threshold);

            let left = nodes.len();
            nodes.push(self.leaf(&left_indices));
            let right = nodes.len();
            nodes.push(self.leaf(&right_indices));

            nodes[slot] = TreeNode::Split {
                feature_index: best.feature_index,
                threshold: best.threshold,
                left,
                right,
            };
            pending.push((right, right_indices, depth + 1));
            pending.push((left, left_indices, depth + 1));
        }

        DecisionTree { nodes, root: 0 }
    }

    fn can_split(&self, indices: &[usize], depth: usize) -> bool {
        if indices.len() < self.params.min_samples_split.max(2) {
            return false;
        }
        if self.params.max_depth.is_some_and(|max| depth >= max) {
            return false;
        }
        let first = self.labels[indices[0]];
        indices.iter().any(|&i| self.labels[i] != first)
    }

    fn leaf(&self, indices: &[usize]) -> TreeNode {
        let counts = self.class_counts(indices);
        let total = indices.len().max(1) as f64;
        TreeNode::Leaf {
            distribution: counts.into_iter().map(|c| c / total).collect(),
        }
    }

    fn class_counts(&self, indices: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.n_classes];
        for &i in indices {
            counts[self.labels[i]] += 1.0;
        }
        counts
    }

    /// Visit features in random order. After `max_features` have been
    /// examined, stop at the first one that has produced a valid split.
    fn best_split(&self, indices: &[usize], rng: &mut StdRng) -> Option<SplitCandidate> {
        let mut order: Vec<usize> = (0..self.width).collect();
        order.shuffle(rng);

        let parent_counts = self.class_counts(indices);
        let parent_impurity = gini(&parent_counts, indices.len() as f64);

        let mut best: Option<SplitCandidate> = None;
        for (visited, &feature_index) in order.iter().enumerate() {
            if visited >= self.max_features && best.is_some() {
                break;
            }
            if let Some(candidate) = self.best_threshold(indices, feature_index, &parent_counts) {
                if candidate.impurity < parent_impurity - MIN_IMPURITY_DECREASE
                    && best.as_ref().map_or(true, |b| candidate.impurity < b.impurity)
                {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    fn best_threshold(
        &self,
        indices: &[usize],
        feature_index: usize,
        parent_counts: &[f64],
    ) -> Option<SplitCandidate> {
        let mut finite: Vec<(f64, usize)> = indices
            .iter()
            .map(|&i| (self.features[i][feature_index], self.labels[i]))
            .filter(|(value, _)| !value.is_nan())
            .collect();
        if finite.len() < 2 {
            return None;
        }
        finite.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = indices.len() as f64;
        let mut left_counts = vec![0.0; self.n_classes];
        let mut best: Option<SplitCandidate> = None;

        for pos in 0..finite.len() - 1 {
            let (value, label) = finite[pos];
            left_counts[label] += 1.0;
            let next = finite[pos + 1].0;
            if next <= value {
                continue;
            }

            let n_left = (pos + 1) as f64;
            let n_right = n - n_left;
            let right_counts: Vec<f64> = parent_counts
                .iter()
                .zip(&left_counts)
                .map(|(p, l)| p - l)
                .collect();
            let impurity = (n_left * gini(&left_counts, n_left)
                + n_right * gini(&right_counts, n_right))
                / n;

            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                let mut threshold = value + (next - value) / 2.0;
                if threshold >= next {
                    threshold = value;
                }
                best = Some(SplitCandidate {
                    feature_index,
                    threshold,
                    impurity,
                });
            }
        }
        best
    }
}

fn gini(counts: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / total).powi(2)).sum::<f64>()
}

/// Index of the largest value; ties resolve to the lowest index
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (idx, value) in values.iter().enumerate() {
        if *value > values[best] {
            best = idx;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..30 {
            let class = i % 3;
            features.push(vec![class as f64 * 10.0 + (i as f64 * 0.1), 1.0]);
            labels.push(class);
        }
        (features, labels)
    }

    #[test]
    fn test_learns_separable_classes() {
        let (features, labels) = separable();
        let mut forest = RandomForestClassifier::new(ForestParams {
            n_trees: 25,
            ..ForestParams::default()
        });
        forest.fit(&features, &labels).unwrap();

        assert_eq!(forest.n_trees(), 25);
        let predicted = forest.predict(&[vec![0.5, 1.0], vec![10.5, 1.0], vec![21.0, 1.0]]).unwrap();
        assert_eq!(predicted, vec![0, 1, 2]);
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let (features, labels) = separable();
        let queries = vec![vec![5.0, 1.0], vec![15.0, 1.0], vec![f64::NAN, 1.0]];

        let mut a = RandomForestClassifier::new(ForestParams::default());
        let mut b = RandomForestClassifier::new(ForestParams::default());
        a.fit(&features, &labels).unwrap();
        b.fit(&features, &labels).unwrap();

        assert_eq!(a.predict_proba(&queries).unwrap(), b.predict_proba(&queries).unwrap());
    }

    #[test]
    fn test_nan_features_do_not_panic() {
        let features = vec![
            vec![f64::NAN, 1.0],
            vec![2.0, f64::NAN],
            vec![3.0, 3.0],
            vec![f64::NAN, f64::NAN],
        ];
        let labels = vec![0, 1, 1, 0];
        let mut forest = RandomForestClassifier::new(ForestParams {
            n_trees: 10,
            ..ForestParams::default()
        });
        forest.fit(&features, &labels).unwrap();
        let predicted = forest.predict(&[vec![f64::NAN, f64::NAN]]).unwrap();
        assert!(predicted[0] <= 1);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (features, labels) = separable();
        let mut forest = RandomForestClassifier::new(ForestParams {
            n_trees: 5,
            max_depth: Some(1),
            ..ForestParams::default()
        });
        forest.fit(&features, &labels).unwrap();
        for row in forest.predict_proba(&[vec![12.0, 1.0]]).unwrap() {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let forest = RandomForestClassifier::new(ForestParams::default());
        assert_eq!(forest.predict(&[vec![1.0]]), Err(ModelError::NotFitted));
    }

    #[test]
    fn test_argmax_prefers_lowest_on_tie() {
        assert_eq!(argmax(&[0.25, 0.5, 0.5]), 1);
        assert_eq!(argmax(&[0.0, 0.0]), 0);
    }
}
