//! Statistical primitives shared by every anomaly monitor.

mod baseline;
mod series;

pub use baseline::{BaselineStats, BaselineWindow};
pub use series::{shannon_entropy, z_score, Cusum, Ewma};
