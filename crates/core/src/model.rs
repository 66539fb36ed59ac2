//! Two-layer affine classifier over one-hot message bytes.
//!
//! `input_size → hidden_size → 1`, with no activation between the layers.
//! The single output is a logit; [`RavensaidNet::probabilities`] applies the
//! sigmoid.

use candle_core::{Result, Tensor};
use candle_nn::{linear, ops, Linear, Module, VarBuilder};

use ravensaid_common::RavensaidConfig;

/// Authorship network. Parameters live under `hidden.*` and `head.*`.
pub struct RavensaidNet {
    hidden: Linear,
    head: Linear,
    config: RavensaidConfig,
}

impl RavensaidNet {
    pub fn new(vb: VarBuilder, config: &RavensaidConfig) -> Result<Self> {
        let hidden = linear(config.input_size(), config.hidden_size, vb.pp("hidden"))?;
        let head = linear(config.hidden_size, 1, vb.pp("head"))?;
        Ok(Self {
            hidden,
            head,
            config: config.clone(),
        })
    }

    /// Logits of shape `(batch, 1)` for a `(batch, input_size)` input.
    pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
        let x = self.hidden.forward(input)?;
        self.head.forward(&x)
    }

    /// Sigmoid of the logits, one value per batch row.
    pub fn probabilities(&self, input: &Tensor) -> Result<Vec<f32>> {
        let logits = self.forward(input)?;
        ops::sigmoid(&logits)?.flatten_all()?.to_vec1::<f32>()
    }

    pub fn config(&self) -> &RavensaidConfig {
        &self.config
    }
}

// ── Parameter Stats ─────────────────────────────────────────────────────────

/// Parameter counts, computed from config alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamStats {
    pub hidden_params: usize,
    pub head_params: usize,
    pub total_params: usize,
    /// Size of the f32 weights on disk, excluding file headers.
    pub weight_bytes: usize,
}

pub fn param_stats(config: &RavensaidConfig) -> ParamStats {
    let hidden_params = config.input_size() * config.hidden_size + config.hidden_size;
    let head_params = config.hidden_size + 1;
    let total_params = hidden_params + head_params;
    ParamStats {
        hidden_params,
        head_params,
        total_params,
        weight_bytes: total_params * std::mem::size_of::<f32>(),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;
    use ravensaid_common::messages_to_tensor;

    fn small_config() -> RavensaidConfig {
        RavensaidConfig {
            input_bytes: 4,
            hidden_size: 3,
            max_message_bytes: None,
        }
    }

    #[test]
    fn forward_shape() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let config = small_config();
        let net = RavensaidNet::new(vb, &config).unwrap();

        let input = messages_to_tensor(&["abcd", "ef"], config.input_bytes, &device).unwrap();
        let logits = net.forward(&input).unwrap();
        assert_eq!(logits.dims(), &[2, 1]);
    }

    #[test]
    fn parameter_names_and_shapes() {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let config = small_config();
        RavensaidNet::new(vb, &config).unwrap();

        let data = varmap.data().lock().unwrap();
        assert_eq!(data["hidden.weight"].dims(), &[3, 4 * 256]);
        assert_eq!(data["hidden.bias"].dims(), &[3]);
        assert_eq!(data["head.weight"].dims(), &[1, 3]);
        assert_eq!(data["head.bias"].dims(), &[1]);
    }

    #[test]
    fn head_bias_alone_sets_probability() {
        let device = Device::Cpu;
        let mut varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
        let config = small_config();
        let net = RavensaidNet::new(vb, &config).unwrap();

        varmap
            .set_one("head.weight", Tensor::zeros((1, 3), DType::F32, &device).unwrap())
            .unwrap();
        varmap
            .set_one("head.bias", Tensor::new(&[0.0f32], &device).unwrap())
            .unwrap();

        let input = messages_to_tensor(&["anything"], config.input_bytes, &device).unwrap();
        let probs = net.probabilities(&input).unwrap();
        assert_eq!(probs.len(), 1);
        assert_abs_diff_eq!(probs[0], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn stats_for_reference_network() {
        let stats = param_stats(&RavensaidConfig::default());
        assert_eq!(stats.hidden_params, 8192 * 64 + 64);
        assert_eq!(stats.head_params, 65);
        assert_eq!(stats.total_params, 524_417);
        assert_eq!(stats.weight_bytes, 524_417 * 4);
    }
}
