//! # ravensaid-common — Shared Primitives
//!
//! Types and utilities shared across every crate in the workspace:
//!
//! * **[`RavensaidConfig`]** — network hyper-parameters (serialised as JSON).
//! * **[`encode_message`]** / **[`messages_to_tensor`]** — one-hot byte encoding.
//! * **[`Corpus`]** — labelled message corpora for training and validation.

pub mod config;
pub mod data;

pub use config::RavensaidConfig;
pub use data::{
    encode_message, labels_to_tensor, messages_to_tensor, split_messages, Corpus,
    LabeledMessage, BYTE_VALUES,
};
