//! C header for the `ravensaid` static and shared libraries.
//!
//! A copy is checked in at `include/ravensaid.h`; the test below keeps the two
//! in sync.

use crate::score::{ScoreError, MAX_SCORE, SCALE};

/// Generate `ravensaid.h`.
pub fn generate_c_header() -> String {
    format!(
        r#"// ravensaid.h: C interface to the Ravensaid authorship scorer
// Link with libravensaid (static or shared).
#pragma once

#ifdef __cplusplus
extern "C" {{
#endif

// Scores are fixed-point percentages: 4625 means 46.25%
#define RAVENSAID_SCALE {scale}
#define RAVENSAID_MAX_SCORE {max_score}

// Error codes returned by ravensaid()
#define RAVENSAID_INVALID_MESSAGE {invalid}
#define RAVENSAID_ABOVE_RANGE {above}
#define RAVENSAID_BELOW_RANGE {below}

typedef struct _RavensaidState RavensaidState;

// Takes path to a saved neural network
// Returns a handle if successful
// Returns NULL if reading fails
RavensaidState* ravensaid_init(const char* path);

// Takes a handle and frees the memory
// If given NULL will halt program execution
void ravensaid_free(RavensaidState* state);

// Takes a loaded network and a message to rate
// Returns the probability of the message being written by Ravenholdt
// as a fixed-point percentage in 0..RAVENSAID_MAX_SCORE
// Returns RAVENSAID_INVALID_MESSAGE if the message is NULL, not UTF-8 or of bad length
// Returns RAVENSAID_ABOVE_RANGE if the probability was over 200%
// Returns RAVENSAID_BELOW_RANGE if the probability was negative
int ravensaid(RavensaidState* state, const char* message);

#ifdef __cplusplus
}}
#endif
"#,
        scale = SCALE,
        max_score = MAX_SCORE,
        invalid = ScoreError::InvalidMessage.code(),
        above = ScoreError::AboveRange(f64::NAN).code(),
        below = ScoreError::BelowRange(-1.0).code(),
    )
}
