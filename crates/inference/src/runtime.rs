//! Inference runtime: load a trained network, score messages.

use std::io::{BufRead, Write};
use std::path::Path;

use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};

use ravensaid_common::{messages_to_tensor, RavensaidConfig};
use ravensaid_core::RavensaidNet;

use crate::error::{Error, Result};
use crate::score::{Score, ScoreError};

/// Name of the optional config file read from the model's directory.
pub const CONFIG_FILE: &str = "config.json";

/// A loaded network. Exclusively owned; one caller scores at a time.
pub struct Ravensaid {
    net: RavensaidNet,
    // Owns the parameters the network's layers point into.
    #[allow(dead_code)]
    varmap: VarMap,
    config: RavensaidConfig,
    device: Device,
}

impl Ravensaid {
    /// Load weights from a `.nn` (safetensors) file.
    ///
    /// Shapes come from `config.json` next to the file when present, and from
    /// [`RavensaidConfig::default`] otherwise.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = sidecar_config(path)?;
        let device = Device::cuda_if_available(0)?;
        Self::load_with_config(path, config, device)
    }

    pub fn load_with_config(path: &Path, config: RavensaidConfig, device: Device) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::Config(format!("{e:#}")))?;
        if !path.is_file() {
            return Err(Error::ModelLoad(format!(
                "no model file at {}",
                path.display()
            )));
        }

        let mut varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let net = RavensaidNet::new(vb, &config)?;
        varmap
            .load(path)
            .map_err(|e| Error::ModelLoad(format!("{}: {e}", path.display())))?;

        tracing::info!(
            path = %path.display(),
            input_bytes = config.input_bytes,
            hidden_size = config.hidden_size,
            "Loaded network"
        );

        Ok(Self {
            net,
            varmap,
            config,
            device,
        })
    }

    pub fn config(&self) -> &RavensaidConfig {
        &self.config
    }

    pub fn net(&self) -> &RavensaidNet {
        &self.net
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Reject empty messages and messages over `max_message_bytes`.
    pub fn check_message(&self, message: &str) -> std::result::Result<(), ScoreError> {
        if message.is_empty() {
            return Err(ScoreError::InvalidMessage);
        }
        if let Some(max) = self.config.max_message_bytes {
            if message.len() > max {
                return Err(ScoreError::InvalidMessage);
            }
        }
        Ok(())
    }

    /// Raw sigmoid output for one message (1.0 = 100 %). No validation.
    pub fn probability(&self, message: &str) -> Result<f64> {
        let input = messages_to_tensor(&[message], self.config.input_bytes, &self.device)?;
        let probs = self.net.probabilities(&input)?;
        probs
            .first()
            .map(|&p| p as f64)
            .ok_or_else(|| Error::Inference("network produced no output".to_string()))
    }

    /// Score one message.
    pub fn score(&self, message: &str) -> std::result::Result<Score, ScoreError> {
        self.check_message(message)?;
        let probability = self
            .probability(message)
            .map_err(|e| ScoreError::Inference(e.to_string()))?;
        let score = Score::from_probability(probability);
        if let Err(ref e) = score {
            tracing::warn!(probability, error = %e, "Score out of range");
        }
        score
    }

    /// Interactive scoring loop. Stops on `exit` or end of input.
    pub fn score_loop<R: BufRead, W: Write>(&self, input: R, mut output: W) -> Result<()> {
        writeln!(
            output,
            "Enter messages to estimate the likelihood that Ravenholdt said them:"
        )?;
        for line in input.lines() {
            let line = line?;
            let message = line.trim_end_matches('\r');
            if message == "exit" {
                break;
            }
            match self.score(message) {
                Ok(score) => writeln!(output, "Likelihood that Ravenholdt said ^: {score}")?,
                Err(e) => writeln!(output, "Could not score message: {e}")?,
            }
            output.flush()?;
        }
        Ok(())
    }
}

fn sidecar_config(model_path: &Path) -> Result<RavensaidConfig> {
    let config_path = model_path
        .parent()
        .map(|dir| dir.join(CONFIG_FILE))
        .filter(|p| p.is_file());
    match config_path {
        Some(p) => {
            RavensaidConfig::load(&p).map_err(|e| Error::Config(format!("{e:#}")))
        }
        None => Ok(RavensaidConfig::default()),
    }
}
