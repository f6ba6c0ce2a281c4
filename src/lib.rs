// Library interface for the DishCore wearable core
// Consolidates multi-device readings and computes activity-adjusted targets

pub mod config;
pub mod consolidation;
pub mod error;
pub mod import;
pub mod logging;
pub mod models;
pub mod targets;

// Re-export commonly used types for convenience
pub use models::*;
pub use consolidation::{DeviceConsolidator, DevicePriorities};
pub use targets::{AdjustmentConfig, TargetAdjuster};
pub use config::AppConfig;
pub use error::{DishCoreError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
