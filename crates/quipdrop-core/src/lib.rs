//! Core types and trait definitions for the Quipdrop release system.
//!
//! This crate is deliberately free of HTTP, database, and runtime
//! dependencies. All other crates depend on it; it depends on nothing
//! proprietary.

pub mod dedup;
pub mod error;
pub mod parse;
pub mod provider;
pub mod release;
pub mod slot;
pub mod store;

pub use error::{Error, Result};
