//! Correlation heat map ordered by a clustering dendrogram.

use super::{Chart, ChartError, portfolio_title};
use ndarray::Array2;
use plotly::common::{Line, Mode, Title};
use plotly::layout::Axis;
use plotly::{HeatMap, Layout, Scatter, Trace};
use portopt_risk::Dendrogram;

/// Four-point elbow joining two children of a dendrogram node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DendrogramSegment {
    /// x coordinates: left child, left child, right child, right child
    pub x: [f64; 4],
    /// y coordinates: left height, node height, node height, right height
    pub y: [f64; 4],
}

/// Clustered correlation matrix with its dendrogram on top.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapChart {
    title: String,
    labels: Vec<String>,
    matrix: Vec<Vec<f64>>,
    segments: Vec<DendrogramSegment>,
}

impl HeatmapChart {
    /// Reorder `correlation` by the dendrogram's leaf order.
    pub fn new(correlation: &Array2<f64>, tree: &Dendrogram, title: &str) -> Result<Self, ChartError> {
        let n = tree.n_leaves();
        if n == 0 {
            return Err(ChartError::Empty("heat map needs at least one asset"));
        }
        if correlation.nrows() != n || correlation.ncols() != n {
            return Err(ChartError::Empty("correlation matrix does not match the dendrogram"));
        }

        let order = tree.leaf_order();
        let labels = order.iter().map(|&i| tree.labels()[i].clone()).collect();
        let matrix = order
            .iter()
            .map(|&i| order.iter().map(|&j| correlation[[i, j]]).collect())
            .collect();

        Ok(Self {
            title: title.to_string(),
            labels,
            matrix,
            segments: segments(tree),
        })
    }

    /// Tickers in display order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Reordered correlation rows.
    pub fn matrix(&self) -> &[Vec<f64>] {
        &self.matrix
    }

    /// Dendrogram elbows in merge order.
    pub fn segments(&self) -> &[DendrogramSegment] {
        &self.segments
    }
}

/// scipy-style dendrogram geometry: leaf at display position `p` sits at `x = 5 + 10 p`.
fn segments(tree: &Dendrogram) -> Vec<DendrogramSegment> {
    let n = tree.n_leaves();
    let mut x = vec![0.0; n + tree.merges().len()];
    let mut height = vec![0.0; n + tree.merges().len()];
    for (pos, &leaf) in tree.leaf_order().iter().enumerate() {
        x[leaf] = 5.0 + 10.0 * pos as f64;
    }

    tree.merges()
        .iter()
        .enumerate()
        .map(|(k, m)| {
            let node = n + k;
            x[node] = (x[m.left] + x[m.right]) / 2.0;
            height[node] = m.height;
            DendrogramSegment {
                x: [x[m.left], x[m.left], x[m.right], x[m.right]],
                y: [height[m.left], m.height, m.height, height[m.right]],
            }
        })
        .collect()
}

impl Chart for HeatmapChart {
    fn name(&self) -> &'static str {
        "heat"
    }

    fn title(&self) -> String {
        portfolio_title(&self.title, "Assets Clustergram")
    }

    fn traces(&self) -> Vec<Box<dyn Trace>> {
        let mut traces: Vec<Box<dyn Trace>> = Vec::with_capacity(self.segments.len() + 1);
        traces.push(
            HeatMap::new(self.labels.clone(), self.labels.clone(), self.matrix.clone())
                .name("Correlation"),
        );
        for segment in &self.segments {
            traces.push(
                Scatter::new(segment.x.to_vec(), segment.y.to_vec())
                    .mode(Mode::Lines)
                    .line(Line::new().color("#7f3f98"))
                    .x_axis("x2")
                    .y_axis("y2")
                    .show_legend(false),
            );
        }
        traces
    }

    fn layout(&self) -> Layout {
        let width = 10.0 * self.labels.len() as f64;
        Layout::new()
            .title(Title::from(self.title().as_str()))
            .show_legend(false)
            .y_axis(Axis::new().domain(&[0.0, 0.78]))
            .x_axis2(
                Axis::new()
                    .domain(&[0.0, 1.0])
                    .range(vec![0.0, width])
                    .anchor("y2")
                    .show_tick_labels(false),
            )
            .y_axis2(Axis::new().domain(&[0.8, 1.0]).anchor("x2"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use portopt_risk::Merge;

    fn tree() -> Dendrogram {
        Dendrogram::new(
            vec!["A".into(), "B".into(), "C".into()],
            vec![
                Merge { left: 0, right: 2, height: 0.3, size: 2 },
                Merge { left: 1, right: 3, height: 0.8, size: 3 },
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_reordered_matrix() {
        let corr = array![[1.0, 0.1, 0.9], [0.1, 1.0, 0.2], [0.9, 0.2, 1.0]];
        let chart = HeatmapChart::new(&corr, &tree(), "x").unwrap();

        // traversal visits B, then the (A, C) pair
        assert_eq!(chart.labels(), &["B", "A", "C"]);
        assert_eq!(chart.matrix()[1], vec![0.1, 1.0, 0.9]);
    }

    #[test]
    fn test_segments() {
        let corr = Array2::eye(3);
        let chart = HeatmapChart::new(&corr, &tree(), "x").unwrap();
        let segments = chart.segments();

        // A at 15, C at 25, B at 5
        assert_eq!(segments[0].x, [15.0, 15.0, 25.0, 25.0]);
        assert_eq!(segments[0].y, [0.0, 0.3, 0.3, 0.0]);
        assert_eq!(segments[1].x, [5.0, 5.0, 20.0, 20.0]);
        assert_eq!(segments[1].y, [0.0, 0.8, 0.8, 0.3]);
    }

    #[test]
    fn test_shape_mismatch() {
        assert!(HeatmapChart::new(&Array2::eye(2), &tree(), "x").is_err());
    }
}
