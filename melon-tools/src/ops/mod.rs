// Copyright 2026, Melonport AG.
// For licensing, see https://github.com/melonproject/melon-tools/blob/main/licenses/COPYRIGHT.md

//! High-level deployment operations, one module per subsystem.

pub mod fixture;
pub mod kyber;
pub mod melon;
pub mod oasis;
pub mod pricefeed;
pub mod system;
pub mod tokens;
pub mod zeroex;

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("token {symbol:?} is not configured")]
    MissingToken { symbol: String },
    #[error("subsystem {name:?} is required here but is not part of this deployment")]
    MissingVenue { name: String },
    #[error("bad address for {field} in the manifest conf: {value:?}")]
    InvalidAddress { field: String, value: String },
}

/// Parses an address out of a manifest conf field.
pub(crate) fn conf_address(field: &str, value: &str) -> crate::Result<alloy::primitives::Address> {
    value.parse().map_err(|_| {
        crate::Error::from(SystemError::InvalidAddress {
            field: field.to_string(),
            value: value.to_string(),
        })
    })
}
