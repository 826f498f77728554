//! Progress hooks invoked at pipeline milestones.
//!
//! The Kriging pipeline always reports its milestones to an observer. The
//! default one, [`Silent`], ignores them, so registering an observer never
//! changes what is computed.

use std::fmt;

/// Milestones of the interpolation pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Variogram fitting starts
    VariogramStarted,
    /// Variogram is fitted
    VariogramFitted,
    /// Kriging system assembly and factorization starts
    SystemStarted,
    /// Kriging system is factorized
    SystemFactorized,
    /// Grid traversal starts
    GridStarted,
    /// Every grid cell has been predicted
    GridFinished,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Stage::VariogramStarted => "variogram-started",
            Stage::VariogramFitted => "variogram-fitted",
            Stage::SystemStarted => "system-started",
            Stage::SystemFactorized => "system-factorized",
            Stage::GridStarted => "grid-started",
            Stage::GridFinished => "grid-finished",
        };
        write!(f, "{s}")
    }
}

/// A trait for receiving pipeline milestones
pub trait PipelineObserver: fmt::Debug + Send + Sync {
    /// Record that `stage` is reached, `detail` gives context (sizes, fitted values...)
    fn record(&self, stage: Stage, detail: &str);
}

/// Observer ignoring every milestone
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl PipelineObserver for Silent {
    fn record(&self, _stage: Stage, _detail: &str) {}
}
