use candle_core::{DType, Device, Result, Tensor};
use candle_nn::{ops, Init, Linear, Module, ModuleT, VarBuilder, VarMap};
use std::collections::BTreeMap;

use crate::dataset::{Batch, BatchStream, LoadError};

/// Single linear layer with sigmoid output. Starts at zero so every score
/// is 0.5 until the first update.
pub struct TinyTagger {
    linear: Linear,
}

impl TinyTagger {
    pub fn new(vb: &VarBuilder, in_dim: usize, num_labels: usize) -> Result<Self> {
        let weight = vb.get_with_hints((num_labels, in_dim), "weight", Init::Const(0.))?;
        let bias = vb.get_with_hints(num_labels, "bias", Init::Const(0.))?;
        Ok(Self {
            linear: Linear::new(weight, Some(bias)),
        })
    }
}

impl ModuleT for TinyTagger {
    fn forward_t(&self, x: &Tensor, _train: bool) -> Result<Tensor> {
        ops::sigmoid(&self.linear.forward(x)?)
    }
}

pub fn tiny_tagger(in_dim: usize, num_labels: usize) -> Result<(TinyTagger, VarMap)> {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    let model = TinyTagger::new(&vb, in_dim, num_labels)?;
    Ok((model, varmap))
}

/// In-memory stream that counts how often it was started.
pub struct MemoryStream {
    batches: Vec<Batch>,
    pub reads: usize,
}

impl MemoryStream {
    pub fn new(batches: Vec<Batch>) -> Self {
        Self { batches, reads: 0 }
    }
}

impl BatchStream for MemoryStream {
    type Batches = std::vec::IntoIter<std::result::Result<Batch, LoadError>>;

    fn num_batches(&self) -> usize {
        self.batches.len()
    }

    fn batches(&mut self) -> Self::Batches {
        self.reads += 1;
        self.batches.iter().cloned().map(Ok).collect::<Vec<_>>().into_iter()
    }
}

/// Builds a batch whose features equal its multi-hot labels.
pub fn echo_batch(rows: &[&[f32]]) -> Batch {
    let width = rows.first().map_or(0, |row| row.len());
    let flat: Vec<f32> = rows.iter().flat_map(|row| row.iter().copied()).collect();
    Batch {
        features: flat.clone(),
        labels: flat,
        len: rows.len(),
        sample_dims: vec![width],
    }
}

/// Two mutually exclusive labels; the label is readable from the input.
pub fn separable_stream() -> MemoryStream {
    MemoryStream::new(vec![
        echo_batch(&[&[1., 0.], &[0., 1.]]),
        echo_batch(&[&[0., 1.], &[1., 0.]]),
    ])
}

pub fn label_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("tag{i}")).collect()
}

/// Every variable of `varmap`, flattened and keyed by name.
pub fn parameters(varmap: &VarMap) -> BTreeMap<String, Vec<f32>> {
    let data = varmap.data().lock().unwrap();
    data.iter()
        .map(|(name, var)| {
            let values = var.as_tensor().flatten_all().unwrap().to_vec1::<f32>().unwrap();
            (name.clone(), values)
        })
        .collect()
}
