use std::fmt;

use crate::optim::ParamsMomentumSgd;

/// Epochs spent with Adam before switching to SGD.
pub const ADAM_DWELL: usize = 60;

/// Epochs spent in each SGD phase before the next learning rate drop.
pub const SGD_DWELL: usize = 20;

pub const SGD_PHASE_2_LEARNING_RATE: f64 = 1e-4;
pub const SGD_PHASE_3_LEARNING_RATE: f64 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Adam,
    SgdPhase1,
    SgdPhase2,
    SgdPhase3,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Adam => "adam",
            Phase::SgdPhase1 => "sgd_1",
            Phase::SgdPhase2 => "sgd_2",
            Phase::SgdPhase3 => "sgd_3",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dwell {
    pub adam: usize,
    pub sgd: usize,
}

impl Default for Dwell {
    fn default() -> Self {
        Self {
            adam: ADAM_DWELL,
            sgd: SGD_DWELL,
        }
    }
}

/// What the training loop must do, after reloading the best checkpoint,
/// when a transition fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    SwitchToSgd(ParamsMomentumSgd),
    SetLearningRate(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
    pub action: Action,
}

/// Transition table. `drop_counter` is the number of epochs completed in
/// `phase`; `None` means stay.
pub fn next_transition(phase: Phase, drop_counter: usize, dwell: Dwell) -> Option<Transition> {
    let (to, action) = match phase {
        Phase::Adam if drop_counter == dwell.adam => (
            Phase::SgdPhase1,
            Action::SwitchToSgd(ParamsMomentumSgd::default()),
        ),
        Phase::SgdPhase1 if drop_counter == dwell.sgd => (
            Phase::SgdPhase2,
            Action::SetLearningRate(SGD_PHASE_2_LEARNING_RATE),
        ),
        Phase::SgdPhase2 if drop_counter == dwell.sgd => (
            Phase::SgdPhase3,
            Action::SetLearningRate(SGD_PHASE_3_LEARNING_RATE),
        ),
        _ => return None,
    };

    Some(Transition {
        from: phase,
        to,
        action,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleState {
    phase: Phase,
    drop_counter: usize,
    dwell: Dwell,
}

impl ScheduleState {
    pub fn new(dwell: Dwell) -> Self {
        Self {
            phase: Phase::Adam,
            drop_counter: 0,
            dwell,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn drop_counter(&self) -> usize {
        self.drop_counter
    }

    /// Counts one completed epoch and returns the transition it triggers.
    /// The counter restarts at 0 whenever a transition fires.
    pub fn tick(&mut self) -> Option<Transition> {
        self.drop_counter += 1;

        let transition = next_transition(self.phase, self.drop_counter, self.dwell)?;
        self.phase = transition.to;
        self.drop_counter = 0;
        Some(transition)
    }
}

impl Default for ScheduleState {
    fn default() -> Self {
        Self::new(Dwell::default())
    }
}
