//! Configuration module for MyBrain
//!
//! This module provides configuration management including:
//! - Platform path resolution with an environment override
//! - Settings persistence, including the automatic backup schedule

pub mod paths;
pub mod settings;

pub use paths::MyBrainPaths;
pub use settings::{Settings, SettingsStore};
