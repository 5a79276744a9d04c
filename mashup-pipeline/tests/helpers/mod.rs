//! Test Helper Utilities
//!
//! Shared utilities for testing mashup-pipeline

#![allow(dead_code)]

pub mod mock_backends;

// Re-export commonly used items
pub use mock_backends::{
    build_orchestrator, result, write_media, CallLog, MockCodec, MockDownloader, MockMedia,
    MockSearch, MOCK_CANONICAL_CHANNELS, MOCK_CANONICAL_RATE,
};
