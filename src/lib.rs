//! Adaptive focus-duration recommender: a contextual multi-armed bandit
//! (Thompson Sampling over Beta posteriors) that learns a user's
//! comfortable focus and break durations from their own session history.

pub mod arm;
pub mod capacity;
pub mod config;
pub mod context;
pub mod model;
pub mod recommender;
pub mod reward;
pub mod sampler;
pub mod storage;
pub mod zone;

pub use capacity::{CapacityStats, SessionRecord, Trend};
pub use config::Config;
pub use context::{Context, EnergyLevel};
pub use recommender::{Recommendation, Recommender, Source, StateSnapshot};
pub use reward::{CompletionType, SessionOutcome, SkipReason};
pub use sampler::Sampler;
pub use storage::{InMemoryStorage, JsonFileStorage, Storage};

/// Initialise stderr logging for CLI/demo use. Scaled down from the
/// teacher's `init()`: this library is synchronous and single-threaded, so
/// there is no background ctrl-c task to spawn and no log file to rotate.
#[cfg(feature = "cli")]
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
