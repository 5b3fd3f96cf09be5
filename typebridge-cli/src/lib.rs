//! # typebridge-cli
//!
//! CLI library for building and checking typebridge generation plans.
//!
//! This crate provides the functionality behind the `typebridge` CLI tool:
//! loading a universe manifest and a configuration file, building the
//! generation plan and rendering the resolved artifact descriptors.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and TOML parsing
//! - [`manifest`] - Universe manifests (JSON) and their validation
//! - [`pipeline`] - Plan building and resolution of every type
//! - [`report`] - Summary and JSON rendering
//! - [`error`] - Error types and handling

pub mod config;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod report;

// Re-export main types for convenience
pub use config::{Config, ConfigManager, OutputFormat};
pub use error::{CliError, CliResult};
pub use manifest::{Manifest, ManifestInputs};
pub use pipeline::PlanOutcome;
