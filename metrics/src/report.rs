/// Scores of one pass over a stream.
///
/// Per-label vectors are aligned to `retained`, the original indices of the
/// labels that had at least one positive. In a degraded report they are
/// zero-filled to the full label width instead.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricReport {
    /// Reserved, always 0.
    pub accuracy: f64,
    pub lrap: f64,
    pub rmse: f64,
    pub roc_auc: f64,
    pub pr_auc: f64,
    pub roc_auc_per_label: Vec<f64>,
    pub pr_auc_per_label: Vec<f64>,
    pub retained: Vec<usize>,
}

impl MetricReport {
    pub fn zeroed(num_labels: usize, retained: Vec<usize>) -> Self {
        Self {
            accuracy: 0.0,
            lrap: 0.0,
            rmse: 0.0,
            roc_auc: 0.0,
            pr_auc: 0.0,
            roc_auc_per_label: vec![0.0; num_labels],
            pr_auc_per_label: vec![0.0; num_labels],
            retained,
        }
    }

    /// Retained label names zipped with their ROC-AUC and PR-AUC.
    pub fn per_label<'a, S: AsRef<str>>(
        &'a self,
        labels: &'a [S],
    ) -> impl Iterator<Item = (&'a str, f64, f64)> + 'a {
        self.retained.iter().enumerate().map(move |(pos, &col)| {
            (
                labels[col].as_ref(),
                self.roc_auc_per_label.get(pos).copied().unwrap_or(0.0),
                self.pr_auc_per_label.get(pos).copied().unwrap_or(0.0),
            )
        })
    }

    /// ROC-AUC per label at full width; dropped labels hold 0.
    pub fn roc_auc_full_width(&self, width: usize) -> Vec<f64> {
        self.scatter(&self.roc_auc_per_label, width)
    }

    /// PR-AUC per label at full width; dropped labels hold 0.
    pub fn pr_auc_full_width(&self, width: usize) -> Vec<f64> {
        self.scatter(&self.pr_auc_per_label, width)
    }

    fn scatter(&self, values: &[f64], width: usize) -> Vec<f64> {
        let mut full = vec![0.0; width];
        if values.len() == self.retained.len() {
            for (&col, &value) in self.retained.iter().zip(values.iter()) {
                if col < width {
                    full[col] = value;
                }
            }
        } else {
            for (slot, &value) in full.iter_mut().zip(values.iter()) {
                *slot = value;
            }
        }
        full
    }

    pub fn log_summary(&self) {
        log::info!("Accuracy = {:.6}", self.accuracy);
        log::info!("Label ranking average precision = {:.6}", self.lrap);
        log::info!("ROC_AUC score = {:.6}", self.roc_auc);
        log::info!("PR_AUC score = {:.6}", self.pr_auc);
        log::info!("RMSE = {:.6}", self.rmse);
    }

    pub fn log_per_label<S: AsRef<str>>(&self, labels: &[S]) {
        log::info!("Per tag, roc_auc, pr_auc");
        for (name, roc, pr) in self.per_label(labels) {
            log::info!("{:<32} {:.4} {:.4}", name, roc, pr);
        }
    }
}
