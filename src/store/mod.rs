//! # Store Layer
//!
//! Session state for the editor and the settings that drive it.
//!
//! ## Key Types
//!
//! - [`PoleStore`] - Configurations, active/selected ids and every mutation
//! - [`RefreshThrottle`] - Rate limit for attachment refresh passes
//! - [`Config`] - User settings from TOML
//!
//! Nothing here touches the network, and only [`Config`] reads from disk.
//! Saving a configuration is acknowledged but not persisted.

mod state;
mod throttle;
mod config;

pub use state::{PoleStore, SaveReceipt};
pub use throttle::{RefreshThrottle, DEFAULT_REFRESH_INTERVAL};
pub use config::{Config, ConfigError, OutputFormat};
