//! Trainer: encapsulates the training loop.
//!
//! Each epoch trains on one rotating slice of the training set, so that ten
//! consecutive epochs (with the default `slices`) cover the data once.

use std::path::{Path, PathBuf};

use anyhow::Context;
use candle_core::{backprop::GradStore, DType, Device, Tensor, Var};
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarBuilder, VarMap};

use ravensaid_common::{labels_to_tensor, messages_to_tensor, LabeledMessage, RavensaidConfig};
use ravensaid_core::{param_stats, RavensaidNet};

use crate::scheduler::StepLr;

// ── Config ──────────────────────────────────────────────────────────────────

/// All training hyper-parameters (CLI-level knobs).
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub epochs: usize,
    pub lr: f64,
    pub lr_late: f64,
    /// Every gradient element is clamped into `[-grad_clip_value, grad_clip_value]`.
    pub grad_clip_value: f64,
    pub batch_size: usize,
    /// Number of rotating slices the training set is cut into.
    pub slices: usize,
    pub save_every: usize,
    pub output_dir: PathBuf,
    /// Prepended to checkpoint file names.
    pub prefix: String,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            lr: 5e-6,
            lr_late: 1e-6,
            grad_clip_value: 0.5,
            batch_size: 1,
            slices: 10,
            save_every: 1,
            output_dir: PathBuf::from("."),
            prefix: String::new(),
        }
    }
}

/// Metrics returned after each training epoch.
#[derive(Debug, Clone)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub loss: f32,
    pub lr: f64,
    pub messages: usize,
}

/// Validation results.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalMetrics {
    pub total: usize,
    pub passed: usize,
    pub accuracy: f64,
    pub loss: f64,
}

// ── Trainer ─────────────────────────────────────────────────────────────────

/// The training engine. Owns the network, optimiser, and schedule.
pub struct Trainer {
    pub net: RavensaidNet,
    pub varmap: VarMap,
    vars: Vec<Var>,
    optimizer: AdamW,
    lr_schedule: StepLr,
    pub config: TrainerConfig,
    net_config: RavensaidConfig,
    device: Device,
}

impl Trainer {
    /// Construct a new Trainer with a freshly initialised network.
    pub fn new(
        net_config: RavensaidConfig,
        trainer_config: TrainerConfig,
        device: Device,
    ) -> anyhow::Result<Self> {
        net_config.validate()?;
        if trainer_config.batch_size == 0 || trainer_config.slices == 0 {
            anyhow::bail!("batch_size and slices must be non-zero");
        }

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let net = RavensaidNet::new(vb, &net_config)?;
        let vars = varmap.all_vars();

        let stats = param_stats(&net_config);
        tracing::info!(
            total_params = stats.total_params,
            weight_bytes = stats.weight_bytes,
            "Network parameter stats"
        );

        let lr_schedule = StepLr::new(
            trainer_config.lr,
            trainer_config.lr_late,
            trainer_config.epochs,
        );

        // Plain Adam: AdamW without decoupled weight decay.
        let optimizer = AdamW::new(
            vars.clone(),
            ParamsAdamW {
                lr: trainer_config.lr,
                weight_decay: 0.0,
                ..Default::default()
            },
        )?;

        Ok(Self {
            net,
            varmap,
            vars,
            optimizer,
            lr_schedule,
            config: trainer_config,
            net_config,
            device,
        })
    }

    /// Continue from previously saved weights.
    pub fn load_weights(&mut self, path: &Path) -> anyhow::Result<()> {
        self.varmap
            .load(path)
            .with_context(|| format!("load weights from {}", path.display()))?;
        tracing::info!(path = %path.display(), "Resumed from saved weights");
        Ok(())
    }

    /// Train on the slice of `data` assigned to `epoch`.
    pub fn train_epoch(
        &mut self,
        epoch: usize,
        data: &[LabeledMessage],
    ) -> anyhow::Result<EpochMetrics> {
        let slices = self.config.slices;
        let len = data.len() / slices;
        if len == 0 {
            anyhow::bail!(
                "need at least {slices} training messages, got {}",
                data.len()
            );
        }
        let start = (epoch % slices) * len;
        let slice = &data[start..start + len];

        let lr = self.lr_schedule.lr_at(epoch);
        self.optimizer.set_learning_rate(lr);

        let mut loss_sum = 0.0f32;
        let mut batches = 0usize;
        for batch in slice.chunks(self.config.batch_size) {
            let loss = self.step(batch)?;
            loss_sum += loss;
            batches += 1;
        }

        let metrics = EpochMetrics {
            epoch,
            loss: loss_sum / batches as f32,
            lr,
            messages: slice.len(),
        };
        tracing::debug!(epoch, loss = metrics.loss, lr, "Epoch trained");
        Ok(metrics)
    }

    /// Forward, loss, backward, clip and optimise over one batch.
    fn step(&mut self, batch: &[LabeledMessage]) -> anyhow::Result<f32> {
        let (input, targets) = batch_tensors(batch, self.net_config.input_bytes, &self.device)?;
        let logits = self.net.forward(&input)?;
        let loss = bce_with_logits(&logits, &targets)?;

        let mut grads = loss.backward()?;
        if self.config.grad_clip_value > 0.0 {
            clip_grad_value(&mut grads, &self.vars, self.config.grad_clip_value)?;
        }
        self.optimizer.step(&grads)?;

        Ok(loss.to_scalar::<f32>()?)
    }

    /// Evaluate the current network on held-out messages.
    pub fn evaluate(&self, data: &[LabeledMessage]) -> anyhow::Result<EvalMetrics> {
        evaluate(&self.net, data, self.config.batch_size, &self.device)
    }

    /// Save a checkpoint as `{output_dir}/{prefix}epoch_{epoch}.nn`.
    pub fn save_checkpoint(&self, epoch: usize) -> anyhow::Result<PathBuf> {
        self.save_as(&format!("{}epoch_{epoch}.nn", self.config.prefix))
    }

    /// Save the final network as `{output_dir}/{prefix}final.nn`.
    pub fn save_final(&self) -> anyhow::Result<PathBuf> {
        self.save_as(&format!("{}final.nn", self.config.prefix))
    }

    fn save_as(&self, file_name: &str) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)
            .with_context(|| format!("create {}", self.config.output_dir.display()))?;
        let path = self.config.output_dir.join(file_name);
        self.varmap.save(&path)?;
        self.net_config
            .save(&self.config.output_dir.join("config.json"))?;
        Ok(path)
    }

    pub fn device(&self) -> &Device {
        &self.device
    }
}

// ── Evaluation ──────────────────────────────────────────────────────────────

/// Accuracy (probability rounded to 0/1 against the label) and mean loss.
pub fn evaluate(
    net: &RavensaidNet,
    data: &[LabeledMessage],
    batch_size: usize,
    device: &Device,
) -> anyhow::Result<EvalMetrics> {
    let input_bytes = net.config().input_bytes;
    let mut passed = 0usize;
    let mut loss_sum = 0.0f64;
    let mut batches = 0usize;

    for batch in data.chunks(batch_size.max(1)) {
        let (input, targets) = batch_tensors(batch, input_bytes, device)?;
        let logits = net.forward(&input)?;
        loss_sum += bce_with_logits(&logits, &targets)?.to_scalar::<f32>()? as f64;
        batches += 1;

        let probs = candle_nn::ops::sigmoid(&logits)?
            .flatten_all()?
            .to_vec1::<f32>()?;
        passed += probs
            .iter()
            .zip(batch)
            .filter(|(p, m)| (**p > 0.5) == m.by_author)
            .count();
    }

    if data.is_empty() {
        return Ok(EvalMetrics {
            total: 0,
            passed: 0,
            accuracy: 0.0,
            loss: f64::MAX,
        });
    }
    Ok(EvalMetrics {
        total: data.len(),
        passed,
        accuracy: passed as f64 / data.len() as f64,
        loss: loss_sum / batches as f64,
    })
}

fn batch_tensors(
    batch: &[LabeledMessage],
    input_bytes: usize,
    device: &Device,
) -> candle_core::Result<(Tensor, Tensor)> {
    let texts: Vec<&str> = batch.iter().map(|m| m.text.as_str()).collect();
    let labels: Vec<bool> = batch.iter().map(|m| m.by_author).collect();
    Ok((
        messages_to_tensor(&texts, input_bytes, device)?,
        labels_to_tensor(&labels, device)?,
    ))
}

// ── Loss ────────────────────────────────────────────────────────────────────

/// Mean binary cross-entropy on logits.
///
/// Uses `max(x, 0) - x·z + ln(1 + e^{-|x|})`, which stays finite for large |x|.
fn bce_with_logits(logits: &Tensor, targets: &Tensor) -> candle_core::Result<Tensor> {
    let positive = logits.relu()?;
    let xz = (logits * targets)?;
    let softplus = logits.abs()?.neg()?.exp()?.affine(1.0, 1.0)?.log()?;
    ((positive - xz)? + softplus)?.mean_all()
}

// ── Gradient utilities ──────────────────────────────────────────────────────

/// Clamp every gradient element into `[-max, max]`.
fn clip_grad_value(grads: &mut GradStore, vars: &[Var], max: f64) -> anyhow::Result<()> {
    for var in vars {
        if let Some(g) = grads.remove(var.as_tensor()) {
            let clipped = g.clamp(-max as f32, max as f32)?;
            grads.insert(var.as_tensor(), clipped);
        }
    }
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────────────
