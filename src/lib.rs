// Library interface for powercurve modules
// This allows integration tests and benches to access the core functionality

pub mod aggregate;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod grid;
pub mod import;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod power;
pub mod store;
pub mod synthetic;

// Re-export commonly used types for convenience
pub use aggregate::aggregate;
pub use engine::{PowerCurveEngine, PowerCurveReport};
pub use error::{DecodeError, PowerCurveError, Result};
pub use grid::{DurationGrid, GridPolicy};
pub use import::{decode, decode_activity};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::*;
pub use normalize::normalize;
pub use power::{compute_activity_curve, PowerAnalyzer};
pub use store::{ActivitySource, DirectoryStore, MemoryStore};
