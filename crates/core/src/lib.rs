//! # ravensaid-core — The Network
//!
//! The byte-level classifier that estimates how likely a message was written
//! by one particular author.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`model`] | `RavensaidNet`, `ParamStats` |

pub mod model;

pub use model::{param_stats, ParamStats, RavensaidNet};
