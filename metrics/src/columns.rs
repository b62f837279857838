/// Selects the label columns that have at least one positive example.
///
/// ROC-AUC and PR-AUC are undefined for a label without positives, so such
/// columns are dropped before any curve is computed. `retained` keeps the
/// original column indices in ascending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    retained: Vec<usize>,
    width: usize,
}

impl ColumnFilter {
    pub fn from_ground_truth(ground_truth: &[Vec<f32>], width: usize) -> Self {
        let sums = column_sums(ground_truth, width);
        let retained = sums
            .iter()
            .enumerate()
            .filter(|(_, &sum)| sum > 0.0)
            .map(|(idx, _)| idx)
            .collect();

        Self { retained, width }
    }

    pub fn retained(&self) -> &[usize] {
        &self.retained
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn removed(&self) -> usize {
        self.width - self.retained.len()
    }

    pub fn is_empty(&self) -> bool {
        self.retained.is_empty()
    }

    /// Copies the retained cells of a row, in retained order.
    pub fn select(&self, row: &[f32]) -> Vec<f32> {
        self.retained.iter().map(|&col| row[col]).collect()
    }

    /// Gathers one full column across all rows.
    pub fn column(rows: &[Vec<f32>], col: usize) -> Vec<f32> {
        rows.iter().map(|row| row[col]).collect()
    }
}

pub fn column_sums(rows: &[Vec<f32>], width: usize) -> Vec<f64> {
    let mut sums = vec![0.0f64; width];
    for row in rows {
        for (sum, &value) in sums.iter_mut().zip(row.iter()) {
            *sum += value as f64;
        }
    }
    sums
}
