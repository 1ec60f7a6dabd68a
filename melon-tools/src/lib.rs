// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! Tools for deploying and reconciling the Melon contract system.

#[macro_use]
mod macros;

pub mod contracts;
pub mod core;
pub(crate) mod error;
pub mod ops;
pub mod utils;

#[cfg(feature = "integration-tests")]
pub mod devnet;

pub use error::{Error, Result};
