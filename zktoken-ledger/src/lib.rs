//! Token Ledger State Machine
//!
//! This crate implements the public state of a fungible-token contract whose
//! callers are authenticated by commitment rather than by a sender field:
//!
//! ```text
//! Ledger = {
//!     metadata:     { name, symbol, decimals }   - sealed at construction
//!     total_supply: Uint222
//!     balances:     Address -> Uint222
//!     allowances:   Address -> (Address -> Uint222)
//! }
//!
//! caller = SHA-256(tag || secret_key)
//! ```
//!
//! # Transitions
//!
//! - `transfer(to, amount)`: caller's balance to `to`
//! - `approve(spender, amount)`: set the caller's allowance for `spender`
//! - `transfer_from(from, to, amount)`: spend an allowance granted by `from`
//!
//! Each transition validates every precondition before writing, so a
//! rejected call leaves the ledger exactly as it was. The sum of balances
//! always equals the total supply minted at construction.

pub mod error;
pub mod ledger;
pub mod operations;

pub use error::{LedgerError, LedgerResult};
pub use ledger::{Ledger, LedgerCommitment, TokenMetadata, LEDGER_STATE_VERSION};
pub use operations::{Operation, OperationKind};
