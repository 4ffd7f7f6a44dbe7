pub mod aggregation;
pub mod analysis;
pub mod calendar;
pub mod config;
pub mod error;
pub mod lookup;
pub mod pipeline;
pub mod types;

pub use config::EngineConfig;
pub use error::DecompError;
pub use types::*;

/// Standard result type for all decomposition operations
pub type DecompResult<T> = Result<T, DecompError>;
