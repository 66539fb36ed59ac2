use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Tensor};
use candle_nn::{VarBuilder, VarMap};
use ravensaid_common::RavensaidConfig;
use ravensaid_core::RavensaidNet;

/// Write a network whose output ignores the message: the head weights are
/// zero, so every message scores `sigmoid(logit)`.
pub fn write_constant_model(dir: &Path, config: &RavensaidConfig, logit: f32) -> PathBuf {
    let device = Device::Cpu;
    let mut varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &device);
    RavensaidNet::new(vb, config).unwrap();

    varmap
        .set_one(
            "head.weight",
            Tensor::zeros((1, config.hidden_size), DType::F32, &device).unwrap(),
        )
        .unwrap();
    varmap
        .set_one("head.bias", Tensor::new(&[logit], &device).unwrap())
        .unwrap();

    let path = dir.join("model.nn");
    varmap.save(&path).unwrap();
    path
}
