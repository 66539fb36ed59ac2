//! Learning rate schedule.

/// Two-phase learning rate: `lr` for the first half of training, `lr_late`
/// from the midpoint on.
#[derive(Clone, Debug, PartialEq)]
pub struct StepLr {
    lr: f64,
    lr_late: f64,
    switch_epoch: usize,
}

impl StepLr {
    /// * `epochs` — total epochs; the switch happens at `epochs / 2`.
    pub fn new(lr: f64, lr_late: f64, epochs: usize) -> Self {
        Self {
            lr,
            lr_late,
            switch_epoch: epochs / 2,
        }
    }

    /// Learning rate for the given epoch.
    pub fn lr_at(&self, epoch: usize) -> f64 {
        if epoch < self.switch_epoch {
            self.lr
        } else {
            self.lr_late
        }
    }

    pub fn switch_epoch(&self) -> usize {
        self.switch_epoch
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
