//! Shared test utilities for orgsync integration tests.
//!
//! This module provides:
//! - `ResourceDir` for writing resource directories into temp directories
//! - `FakePlatform`, an in-memory platform implementing `PlatformApi`

pub mod builders;
pub mod fake;

pub use builders::*;
pub use fake::FakePlatform;
