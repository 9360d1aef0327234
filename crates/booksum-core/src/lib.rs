//! # booksum-core
//!
//! Foundation utilities shared by the booksum crates:
//!
//! - **Logging**: `tracing` subscriber setup and an in-memory capture layer for tests
//! - **Text**: UTF-8 safe truncation for log previews

#![deny(unsafe_code)]

pub mod logging;
pub mod text;
