use candle_core::backprop::GradStore;
use candle_core::{Result, Tensor, Var};
use candle_nn::{AdamW, Optimizer, ParamsAdamW};

/// Initial learning rate of the adaptive phase.
pub const ADAM_LEARNING_RATE: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamsMomentumSgd {
    pub lr: f64,
    pub momentum: f64,
    pub weight_decay: f64,
    pub nesterov: bool,
}

impl Default for ParamsMomentumSgd {
    fn default() -> Self {
        Self {
            lr: 1e-3,
            momentum: 0.9,
            weight_decay: 1e-4,
            nesterov: true,
        }
    }
}

struct VarMomentum {
    var: Var,
    velocity: Var,
}

/// SGD with momentum, L2 weight decay and optional Nesterov acceleration.
///
/// Per step: `g = grad + wd * w`, `v = momentum * v + g`, then
/// `w -= lr * (g + momentum * v)` with Nesterov or `w -= lr * v` without.
pub struct MomentumSgd {
    vars: Vec<VarMomentum>,
    params: ParamsMomentumSgd,
}

impl Optimizer for MomentumSgd {
    type Config = ParamsMomentumSgd;

    fn new(vars: Vec<Var>, params: ParamsMomentumSgd) -> Result<Self> {
        let vars = vars
            .into_iter()
            .filter(|var| var.dtype().is_float())
            .map(|var| {
                let velocity = Var::zeros(var.shape(), var.dtype(), var.device())?;
                Ok(VarMomentum { var, velocity })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { vars, params })
    }

    fn learning_rate(&self) -> f64 {
        self.params.lr
    }

    fn set_learning_rate(&mut self, lr: f64) {
        self.params.lr = lr;
    }

    fn step(&mut self, grads: &GradStore) -> Result<()> {
        let ParamsMomentumSgd {
            lr,
            momentum,
            weight_decay,
            nesterov,
        } = self.params;

        for VarMomentum { var, velocity } in &self.vars {
            let Some(grad) = grads.get(var) else {
                continue;
            };

            let grad = if weight_decay != 0.0 {
                (grad + (var.as_tensor() * weight_decay)?)?
            } else {
                grad.clone()
            };

            let update = if momentum != 0.0 {
                let next = ((velocity.as_tensor() * momentum)? + &grad)?;
                velocity.set(&next)?;
                if nesterov {
                    (grad + (next * momentum)?)?
                } else {
                    next
                }
            } else {
                grad
            };

            var.set(&var.sub(&(update * lr)?)?)?;
        }

        Ok(())
    }
}

impl MomentumSgd {
    pub fn params(&self) -> &ParamsMomentumSgd {
        &self.params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Adam,
    MomentumSgd,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizerSnapshot {
    pub algorithm: Algorithm,
    pub learning_rate: f64,
}

/// The optimizer currently driving training. The variant is replaced once,
/// when the schedule leaves the adaptive phase.
pub enum TaggerOptimizer {
    Adam(AdamW),
    Sgd(MomentumSgd),
}

impl TaggerOptimizer {
    /// Adam, expressed as AdamW without decoupled weight decay.
    pub fn adam(vars: Vec<Var>, learning_rate: f64) -> Result<Self> {
        let opt = AdamW::new(
            vars,
            ParamsAdamW {
                lr: learning_rate,
                weight_decay: 0.0,
                ..Default::default()
            },
        )?;
        Ok(Self::Adam(opt))
    }

    pub fn momentum_sgd(vars: Vec<Var>, params: ParamsMomentumSgd) -> Result<Self> {
        Ok(Self::Sgd(MomentumSgd::new(vars, params)?))
    }

    pub fn step(&mut self, grads: &GradStore) -> Result<()> {
        match self {
            Self::Adam(opt) => opt.step(grads),
            Self::Sgd(opt) => opt.step(grads),
        }
    }

    /// Backpropagates `loss` and applies one update. Gradients are computed
    /// fresh on every call, nothing accumulates between steps.
    pub fn backward_step(&mut self, loss: &Tensor) -> Result<()> {
        let grads = loss.backward()?;
        self.step(&grads)
    }

    pub fn learning_rate(&self) -> f64 {
        match self {
            Self::Adam(opt) => opt.learning_rate(),
            Self::Sgd(opt) => opt.learning_rate(),
        }
    }

    pub fn set_learning_rate(&mut self, lr: f64) {
        match self {
            Self::Adam(opt) => opt.set_learning_rate(lr),
            Self::Sgd(opt) => opt.set_learning_rate(lr),
        }
    }

    pub fn snapshot(&self) -> OptimizerSnapshot {
        let algorithm = match self {
            Self::Adam(_) => Algorithm::Adam,
            Self::Sgd(_) => Algorithm::MomentumSgd,
        };
        OptimizerSnapshot {
            algorithm,
            learning_rate: self.learning_rate(),
        }
    }
}
