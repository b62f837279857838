/// Highest validation ROC-AUC seen in the run; the checkpoint slot holds the
/// weights that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMetric {
    roc_auc: f64,
    epoch: Option<usize>,
}

impl BestMetric {
    pub fn new() -> Self {
        Self {
            roc_auc: 0.0,
            epoch: None,
        }
    }

    pub fn roc_auc(&self) -> f64 {
        self.roc_auc
    }

    pub fn epoch(&self) -> Option<usize> {
        self.epoch
    }

    // Returns if the model improved (strictly higher ROC-AUC)
    pub fn update(&mut self, roc_auc: f64, epoch: usize) -> bool {
        if roc_auc > self.roc_auc {
            self.roc_auc = roc_auc;
            self.epoch = Some(epoch);
            true
        } else {
            false
        }
    }
}

impl Default for BestMetric {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_floor_is_not_an_improvement() {
        let mut best = BestMetric::new();
        assert!(!best.update(0.0, 1));
        assert_eq!(best.epoch(), None);
    }

    #[test]
    fn test_only_strict_improvements_count() {
        let mut best = BestMetric::new();
        assert!(best.update(0.6, 1));
        assert!(!best.update(0.6, 2));
        assert!(!best.update(0.5, 3));
        assert!(best.update(0.7, 4));
        assert_eq!(best.roc_auc(), 0.7);
        assert_eq!(best.epoch(), Some(4));
    }

    #[test]
    fn test_non_decreasing_over_any_sequence() {
        let mut best = BestMetric::new();
        let mut previous = best.roc_auc();
        for (epoch, value) in [0.3, 0.1, 0.8, f64::NAN, 0.79, 0.81, 0.0].into_iter().enumerate() {
            best.update(value, epoch);
            assert!(best.roc_auc() >= previous);
            previous = best.roc_auc();
        }
        assert_eq!(best.roc_auc(), 0.81);
    }
}
