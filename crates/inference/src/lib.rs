//! # ravensaid — Authorship Scoring Runtime
//!
//! * **[`Ravensaid`]** — load a trained network and score messages.
//! * **[`Score`]** / **[`ScoreError`]** — fixed-point percentages and the
//!   sentinel codes reported over the C ABI.
//! * **[`ffi`]** — `ravensaid_init`, `ravensaid`, `ravensaid_free`.
//! * **[`header`]** — the matching `ravensaid.h`.
//!
//! ```rust,ignore
//! use ravensaid::Ravensaid;
//!
//! let model = Ravensaid::load("model.nn")?;
//! println!("{}", model.score("nevermore")?);
//! ```

pub mod error;
pub mod ffi;
pub mod header;
pub mod runtime;
pub mod score;

pub use error::{Error, Result};
pub use ffi::{ravensaid, ravensaid_free, ravensaid_init};
pub use header::generate_c_header;
pub use runtime::Ravensaid;
pub use score::{score_to_code, Score, ScoreError, MAX_SCORE, SCALE};
