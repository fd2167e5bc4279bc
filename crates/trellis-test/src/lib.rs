//! Test harnesses for trellis loaders.
//!
//! Provides `MemoryFetcher` for loads served from memory with fetch
//! accounting, plus helpers to build loaders and locate the shared fixtures.

pub mod harness;
pub mod memory;
#[cfg(test)]
mod scenarios;

pub use harness::{file_loader, fixture, fixtures_dir, permissive_loader, strict_loader, TestError};
pub use memory::{Failure, MemoryFetcher};
