//! # ravensaid-train — Supervised Training
//!
//! * **[`Trainer`]** — owns network + optimiser + schedule. One call to
//!   [`Trainer::train_epoch`] runs forward, loss, backward, gradient clipping
//!   and Adam over one slice of the training data.
//! * **[`StepLr`]** — two-phase learning rate.
//! * **[`evaluate`]** — validation accuracy and loss.

pub mod scheduler;
pub mod trainer;

pub use scheduler::StepLr;
pub use trainer::{evaluate, EpochMetrics, EvalMetrics, Trainer, TrainerConfig};
