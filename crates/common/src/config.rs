//! Network configuration for Ravensaid.
//!
//! Serialised as JSON next to trained weights. Every field has a default, so a
//! minimal `{}` JSON produces the reference network (32 input bytes, 64 hidden
//! units).

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::data::BYTE_VALUES;

/// Configuration for the byte-level authorship classifier.
///
/// Stored alongside weights so a model directory can be reloaded with the
/// same shapes. Missing fields fall back to their `#[serde(default)]` values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RavensaidConfig {
    /// Number of leading message bytes fed to the network.
    #[serde(default = "default_input_bytes")]
    pub input_bytes: usize,
    /// Width of the hidden projection.
    #[serde(default = "default_hidden_size")]
    pub hidden_size: usize,
    /// Messages longer than this (in bytes) are rejected when set.
    #[serde(default)]
    pub max_message_bytes: Option<usize>,
}

fn default_input_bytes() -> usize {
    32
}
fn default_hidden_size() -> usize {
    64
}

impl Default for RavensaidConfig {
    fn default() -> Self {
        Self {
            input_bytes: default_input_bytes(),
            hidden_size: default_hidden_size(),
            max_message_bytes: None,
        }
    }
}

impl RavensaidConfig {
    /// Width of the one-hot input vector: one slot per byte value per position.
    pub fn input_size(&self) -> usize {
        self.input_bytes * BYTE_VALUES
    }

    /// Reject configurations that cannot build a network.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.input_bytes == 0 {
            anyhow::bail!("input_bytes must be non-zero");
        }
        if self.hidden_size == 0 {
            anyhow::bail!("hidden_size must be non-zero");
        }
        if self.max_message_bytes == Some(0) {
            anyhow::bail!("max_message_bytes must be non-zero when set");
        }
        Ok(())
    }

    /// Save config to a JSON file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    /// Load config from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json =
            std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
