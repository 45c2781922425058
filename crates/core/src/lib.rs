//! Core configuration for retroslash.
//!
//! This crate owns the two pieces of state the rest of the system reads:
//! - **Channel directory** (`channels`) - the per-channel retro board map,
//!   built once at startup and read-only thereafter
//! - **App config** (`config`) - server/Slack/Postfacto/logging settings,
//!   loaded from defaults, an optional TOML file, and env overrides

pub mod channels;
pub mod config;

pub use channels::{BoardRef, ChannelConfig, ChannelDirectory, RetroTarget};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
