//! Input validation gate.
//!
//! Every detection crosses this gate before fusion. Malformed input is
//! dropped and reported; it never aborts a cycle.

mod gate;

pub use gate::{ValidationFailure, ValidationGate, ValidationOutcome};
