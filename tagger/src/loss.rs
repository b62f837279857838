use candle_core::{Result, Tensor};

// Keeps log() finite for saturated sigmoid outputs
const PROBABILITY_EPS: f64 = 1e-7;

/// Mean binary cross-entropy between probabilities and binary targets.
pub fn binary_cross_entropy(pred: &Tensor, target: &Tensor) -> Result<Tensor> {
    let pred = pred.clamp(PROBABILITY_EPS, 1.0 - PROBABILITY_EPS)?;

    let positive = (target * pred.log()?)?;
    let negative = ((1.0 - target)? * (1.0 - &pred)?.log()?)?;

    (positive + negative)?.neg()?.mean_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    #[test]
    fn test_bce_known_value() -> Result<()> {
        let pred = Tensor::new(&[[0.8f32, 0.4]], &Device::Cpu)?;
        let target = Tensor::new(&[[1.0f32, 0.0]], &Device::Cpu)?;

        let loss = binary_cross_entropy(&pred, &target)?.to_vec0::<f32>()?;
        let expected = -((0.8f32).ln() + (0.6f32).ln()) / 2.0;
        assert!((loss - expected).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn test_bce_saturated_prediction_is_finite() -> Result<()> {
        let pred = Tensor::new(&[[0.0f32, 1.0]], &Device::Cpu)?;
        let target = Tensor::new(&[[1.0f32, 0.0]], &Device::Cpu)?;

        let loss = binary_cross_entropy(&pred, &target)?.to_vec0::<f32>()?;
        assert!(loss.is_finite());
        assert!(loss > 10.0);
        Ok(())
    }
}
