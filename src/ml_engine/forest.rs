//! Seeded random forest of Gini decision trees.
//!
//! Each tree is grown on a bootstrap sample of the training rows. At every
//! node a random subset of `max_features` features (default
//! `floor(sqrt(n_features))`) is searched for the threshold with the lowest
//! weighted Gini impurity. Candidate thresholds are midpoints between
//! consecutive distinct feature values.
//!
//! Prediction averages the per-tree leaf class distributions; ties go to the
//! lowest class index.
//!
//! Determinism: every random draw comes from a `StdRng` derived from the
//! forest seed, in a fixed order, and all sorts are stable, so identical input
//! rows and seed produce identical trees.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::ModelConfig;

/// Hyper-parameters of the forest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Features searched per node; `None` means `floor(sqrt(n_features))`
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl From<&ModelConfig> for ForestParams {
    fn from(config: &ModelConfig) -> Self {
        Self {
            n_trees: config.n_trees,
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split.max(2),
            max_features: None,
            seed: config.seed,
        }
    }
}

impl ForestParams {
    fn features_per_node(&self, n_features: usize) -> usize {
        let default = (n_features as f64).sqrt().floor() as usize;
        self.max_features.unwrap_or(default).clamp(1, n_features.max(1))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        /// Class distribution of the training rows that reached this leaf
        proba: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single CART classification tree stored as a node arena (root at 0)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_classes: usize,
}

/// Best split found at a node
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

/// Borrowed training data shared by all trees
struct TrainingSet<'a> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    n_classes: usize,
    n_features: usize,
}

impl DecisionTree {
    fn fit(
        data: &TrainingSet<'_>,
        sample: Vec<usize>,
        params: &ForestParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            n_classes: data.n_classes,
        };
        tree.grow(data, sample, 0, params, rng);
        tree
    }

    /// Grow the subtree for `sample`, returning its node index
    fn grow(
        &mut self,
        data: &TrainingSet<'_>,
        sample: Vec<usize>,
        depth: usize,
        params: &ForestParams,
        rng: &mut StdRng,
    ) -> usize {
        let counts = class_counts(data, &sample);
        let n = sample.len();

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = params.max_depth.is_some_and(|d| depth >= d);
        if pure || n < params.min_samples_split || depth_reached {
            return self.push_leaf(&counts, n);
        }

        let Some(best) = best_split(data, &sample, params, rng) else {
            return self.push_leaf(&counts, n);
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = sample
            .iter()
            .partition(|&&i| data.x[i][best.feature] <= best.threshold);

        // Reserve the split slot before the children so the root stays at 0
        let index = self.nodes.len();
        self.nodes.push(Node::Leaf { proba: Vec::new() });
        let left = self.grow(data, left_rows, depth + 1, params, rng);
        let right = self.grow(data, right_rows, depth + 1, params, rng);
        self.nodes[index] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        index
    }

    fn push_leaf(&mut self, counts: &[usize], n: usize) -> usize {
        let total = n.max(1) as f64;
        let proba = counts.iter().map(|&c| c as f64 / total).collect();
        self.nodes.push(Node::Leaf { proba });
        self.nodes.len() - 1
    }

    /// Class distribution of the leaf reached by `row`
    pub fn predict_proba(&self, row: &[f64]) -> &[f64] {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().unwrap_or(f64::NAN);
                    index = if value <= *threshold { *left } else { *right };
                }
                Some(Node::Leaf { proba }) => return proba,
                None => return &[],
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match nodes.get(index) {
                Some(Node::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Bagged ensemble of decision trees
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
    n_features: usize,
}

impl RandomForest {
    /// Fit on rows `x` with labels `y` in `0..n_classes`.
    ///
    /// Returns an empty forest (predicting class 0) when there are no rows.
    pub fn fit(x: &[Vec<f64>], y: &[usize], n_classes: usize, params: &ForestParams) -> Self {
        let n = x.len().min(y.len());
        let n_features = x.first().map_or(0, Vec::len);
        let data = TrainingSet {
            x: &x[..n],
            y: &y[..n],
            n_classes,
            n_features,
        };

        let mut forest = Self {
            trees: Vec::with_capacity(params.n_trees),
            n_classes,
            n_features,
        };
        if n == 0 {
            return forest;
        }

        let mut master = StdRng::seed_from_u64(params.seed);
        for _ in 0..params.n_trees {
            let mut rng = StdRng::seed_from_u64(master.gen());
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            forest
                .trees
                .push(DecisionTree::fit(&data, bootstrap, params, &mut rng));
        }

        tracing::debug!(
            trees = forest.trees.len(),
            rows = n,
            features = n_features,
            "Random forest fitted"
        );
        forest
    }

    /// Mean of the per-tree class distributions
    pub fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let mut sum = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in sum.iter_mut().zip(tree.predict_proba(row)) {
                *acc += p;
            }
        }
        let count = self.trees.len().max(1) as f64;
        sum.iter_mut().for_each(|v| *v /= count);
        sum
    }

    /// Most probable class; ties go to the lowest index
    pub fn predict(&self, row: &[f64]) -> usize {
        let proba = self.predict_proba(row);
        let mut best = 0;
        for (class, &p) in proba.iter().enumerate() {
            if p > proba[best] {
                best = class;
            }
        }
        best
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

fn class_counts(data: &TrainingSet<'_>, sample: &[usize]) -> Vec<usize> {
    let mut counts = vec![0usize; data.n_classes];
    for &i in sample {
        if let Some(c) = counts.get_mut(data.y[i]) {
            *c += 1;
        }
    }
    counts
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let total = n as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Search a random feature subset for the lowest weighted Gini split.
///
/// Features are visited in a random order; constant features do not count
/// towards `max_features`, so a node only becomes a leaf for lack of
/// candidates when every feature is constant on it.
fn best_split(
    data: &TrainingSet<'_>,
    sample: &[usize],
    params: &ForestParams,
    rng: &mut StdRng,
) -> Option<SplitCandidate> {
    let wanted = params.features_per_node(data.n_features);

    // Fisher-Yates over the feature ids, drawn lazily
    let mut features: Vec<usize> = (0..data.n_features).collect();
    let mut best: Option<SplitCandidate> = None;
    let mut evaluated = 0;

    for k in 0..features.len() {
        if evaluated >= wanted {
            break;
        }
        let j = rng.gen_range(k..features.len());
        features.swap(k, j);
        let feature = features[k];

        let Some(candidate) = best_threshold(data, sample, feature) else {
            continue; // constant on this node
        };
        evaluated += 1;

        let better = best
            .as_ref()
            .map_or(true, |b| candidate.impurity < b.impurity);
        if better {
            best = Some(candidate);
        }
    }
    best
}

/// Best threshold on one feature, or `None` if the feature is constant
fn best_threshold(
    data: &TrainingSet<'_>,
    sample: &[usize],
    feature: usize,
) -> Option<SplitCandidate> {
    let mut pairs: Vec<(f64, usize)> = sample
        .iter()
        .map(|&i| (data.x[i][feature], data.y[i]))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n = pairs.len();
    let mut right = vec![0usize; data.n_classes];
    for &(_, label) in &pairs {
        if let Some(c) = right.get_mut(label) {
            *c += 1;
        }
    }
    let mut left = vec![0usize; data.n_classes];

    let mut best: Option<SplitCandidate> = None;
    for i in 1..n {
        let (prev_value, prev_label) = pairs[i - 1];
        if let (Some(l), Some(r)) = (left.get_mut(prev_label), right.get_mut(prev_label)) {
            *l += 1;
            *r -= 1;
        }

        let value = pairs[i].0;
        if value <= prev_value {
            continue;
        }

        let impurity =
            (i as f64 * gini(&left, i) + (n - i) as f64 * gini(&right, n - i)) / n as f64;
        if best.as_ref().map_or(true, |b| impurity < b.impurity) {
            let mut threshold = prev_value + (value - prev_value) / 2.0;
            // Midpoint can round up to `value` for adjacent floats
            if threshold >= value {
                threshold = prev_value;
            }
            best = Some(SplitCandidate {
                feature,
                threshold,
                impurity,
            });
        }
    }
    best
}
