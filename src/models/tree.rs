//! CART regression tree, grown by variance reduction.

use ndarray::{ArrayView1, ArrayView2};

use crate::config::ForestConfig;

#[derive(Debug, Clone, Copy)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl From<&ForestConfig> for TreeParams {
    fn from(config: &ForestConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            min_samples_leaf: config.min_samples_leaf,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Copy)]
struct BestSplit {
    feature: usize,
    threshold: f64,
}

/// Nodes are stored flat; index 0 is the root.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Grows a tree on the rows listed in `samples`. Rows may repeat, which is
    /// how bootstrap draws are passed in.
    pub fn fit(
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        samples: &[usize],
        params: &TreeParams,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        let mut samples = samples.to_vec();
        tree.grow(x, y, &mut samples, 0, params);
        tree
    }

    pub fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut i = 0;
        loop {
            match self.nodes[i] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => i = if row[feature] <= threshold { left } else { right },
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], i: usize) -> usize {
            match nodes[i] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        if self.nodes.is_empty() { 0 } else { walk(&self.nodes, 0) }
    }

    fn grow(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
        samples: &mut [usize],
        depth: usize,
        params: &TreeParams,
    ) -> usize {
        let value = samples.iter().map(|&s| y[s]).sum::<f64>() / samples.len().max(1) as f64;
        let index = self.nodes.len();
        self.nodes.push(Node::Leaf { value });

        let may_split = samples.len() >= params.min_samples_split
            && params.max_depth.is_none_or(|max| depth < max);
        if !may_split {
            return index;
        }

        let Some(best) = best_split(x, y, samples, params.min_samples_leaf) else {
            return index;
        };

        let mid = partition(samples, |s| x[[s, best.feature]] <= best.threshold);
        if mid == 0 || mid == samples.len() {
            return index;
        }

        let (left_samples, right_samples) = samples.split_at_mut(mid);
        let left = self.grow(x, y, left_samples, depth + 1, params);
        let right = self.grow(x, y, right_samples, depth + 1, params);

        self.nodes[index] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        index
    }
}

/// Finds the split maximizing `sum_l^2 / n_l + sum_r^2 / n_r`, which is the
/// same as minimizing the children's summed squared error. Returns `None`
/// when no split improves on the parent.
fn best_split(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
    samples: &[usize],
    min_samples_leaf: usize,
) -> Option<BestSplit> {
    let n = samples.len();
    let total: f64 = samples.iter().map(|&s| y[s]).sum();
    let parent_score = total * total / n as f64;
    let tolerance = 1e-12 * parent_score.abs().max(1.0);

    let mut best: Option<(f64, BestSplit)> = None;
    let mut pairs: Vec<(f64, f64)> = Vec::with_capacity(n);

    for feature in 0..x.ncols() {
        pairs.clear();
        pairs.extend(samples.iter().map(|&s| (x[[s, feature]], y[s])));
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_sum = 0.0;
        for i in 1..n {
            left_sum += pairs[i - 1].1;

            let (lo, hi) = (pairs[i - 1].0, pairs[i].0);
            if lo == hi || i < min_samples_leaf || n - i < min_samples_leaf {
                continue;
            }

            let right_sum = total - left_sum;
            let score = left_sum * left_sum / i as f64 + right_sum * right_sum / (n - i) as f64;
            if score <= parent_score + tolerance {
                continue;
            }

            if best.is_none_or(|(current, _)| score > current) {
                let mid = lo + (hi - lo) / 2.0;
                let threshold = if mid < hi { mid } else { lo };
                best = Some((score, BestSplit { feature, threshold }));
            }
        }
    }

    best.map(|(_, split)| split)
}

/// Moves samples satisfying `goes_left` to the front; returns how many moved.
fn partition(samples: &mut [usize], goes_left: impl Fn(usize) -> bool) -> usize {
    let mut mid = 0;
    for i in 0..samples.len() {
        if goes_left(samples[i]) {
            samples.swap(i, mid);
            mid += 1;
        }
    }
    mid
}
