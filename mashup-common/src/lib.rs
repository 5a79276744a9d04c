//! # Mashup Common Library
//!
//! Shared code for the mashup binaries:
//! - Error type shared by configuration and validation
//! - Bootstrap configuration (TOML + environment) and root folder resolution
//! - Run parameter validation for the CLI and the web form
//! - Logging initialization
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod logging;
pub mod run_params;
pub mod time;

pub use error::{Error, Result};
pub use run_params::RunParameters;
