//! # zktoken-common
//!
//! Primitives shared by the zktoken ledger, simulator and tools:
//!
//! - [`Uint222`]: checked unsigned amounts bounded by `2^222 - 1`
//! - [`Address`]: 32-byte public account identifiers
//! - [`SecretKey`]: caller-local keys, never placed on the ledger
//! - [`compute_address`]: the domain-separated commitment `SecretKey -> Address`

pub mod address;
pub mod uint;

use thiserror::Error;

pub use address::{compute_address, pad32, Address, SecretKey, ADDRESS_DOMAIN_TAG, BYTES32_LEN};
pub use uint::{Uint222, UINT222_BITS, UINT222_BYTES};

/// Errors constructing a [`Uint222`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UintError {
    #[error("value does not fit in {} bits", UINT222_BITS)]
    OutOfRange,

    #[error("invalid decimal integer: {0}")]
    Parse(String),
}

/// Errors parsing an [`Address`] or [`SecretKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("expected 64 hex chars, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex: {0}")]
    InvalidHex(String),
}
