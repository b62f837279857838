use candle_core::{Result, Tensor};
use candle_nn::{
    batch_norm, conv2d, linear, ops, BatchNorm, BatchNormConfig, Conv2d, Conv2dConfig, Dropout,
    Linear, ModuleT, VarBuilder,
};

use super::{CHANNELS, DROPOUT, POOLING};

struct ConvBlock {
    conv: Conv2d,
    norm: BatchNorm,
    pool: (usize, usize),
}

impl ConvBlock {
    fn new(in_channels: usize, out_channels: usize, pool: (usize, usize), vs: VarBuilder) -> Result<Self> {
        let config = Conv2dConfig {
            padding: 1,
            ..Default::default()
        };
        Ok(Self {
            conv: conv2d(in_channels, out_channels, 3, config, vs.pp("conv"))?,
            norm: batch_norm(out_channels, BatchNormConfig::default(), vs.pp("norm"))?,
            pool,
        })
    }
}

impl ModuleT for ConvBlock {
    fn forward_t(&self, x: &Tensor, train: bool) -> Result<Tensor> {
        x.apply(&self.conv)?
            .apply_t(&self.norm, train)?
            .elu(1.0)?
            .max_pool2d(self.pool)
    }
}

/// Convolutional tagger over mel spectrograms.
///
/// Input `(batch, mels, frames)`, output `(batch, labels)` sigmoid scores.
/// Batch norm and dropout follow the `train` flag of `forward_t`.
pub struct Network {
    blocks: Vec<ConvBlock>,
    dropout: Dropout,
    output: Linear,
}

impl Network {
    pub fn new(vs: &VarBuilder, num_labels: usize) -> Result<Self> {
        let mut blocks = Vec::with_capacity(CHANNELS.len());
        let mut in_channels = 1;
        for (idx, (&channels, &pool)) in CHANNELS.iter().zip(POOLING.iter()).enumerate() {
            blocks.push(ConvBlock::new(
                in_channels,
                channels,
                pool,
                vs.pp(format!("block{idx}")),
            )?);
            in_channels = channels;
        }

        Ok(Self {
            blocks,
            dropout: Dropout::new(DROPOUT),
            output: linear(in_channels, num_labels, vs.pp("output"))?,
        })
    }
}

impl ModuleT for Network {
    fn forward_t(&self, x: &Tensor, train: bool) -> Result<Tensor> {
        let mut x = x.unsqueeze(1)?;
        for block in &self.blocks {
            x = x.apply_t(block, train)?;
        }

        // Global max over the remaining frequency and time cells
        let x = x.max(3)?.max(2)?;
        let x = x.apply_t(&self.dropout, train)?.apply(&self.output)?;
        ops::sigmoid(&x)
    }
}
