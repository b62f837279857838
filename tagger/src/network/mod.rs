pub mod model;

pub use model::Network;

/// Mel bins per spectrogram frame.
pub const N_MELS: usize = 96;

/// Output channels of the convolution blocks, in order.
pub const CHANNELS: [usize; 4] = [64, 128, 128, 128];

/// Frequency/time pooling after each block.
pub const POOLING: [(usize, usize); 4] = [(2, 4), (2, 4), (2, 4), (3, 5)];

pub const DROPOUT: f32 = 0.5;

/// Shortest input that survives every pooling stage.
pub const MIN_FRAMES: usize = 4 * 4 * 4 * 5;
