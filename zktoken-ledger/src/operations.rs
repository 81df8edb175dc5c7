//! Functional operation engine.
//!
//! Each operation takes the current ledger and the caller's secret key and
//! returns the next ledger, leaving the input untouched. A rejected operation
//! returns the error and no new ledger, so the caller keeps the pre-call state.
//!
//! [`Operation`] packages the three mutating calls as data, for harnesses that
//! replay recorded or generated operation sequences.

use serde::{Deserialize, Serialize};
use zktoken_common::{Address, SecretKey, Uint222};

use crate::{Ledger, LedgerResult, TokenMetadata};

pub use zktoken_common::compute_address;

/// Build a ledger holding `initial_supply` at `mint`.
pub fn construct(
    initial_supply: Uint222,
    mint: Address,
    name: impl Into<String>,
    symbol: impl Into<String>,
    decimals: u8,
) -> Ledger {
    Ledger::new(TokenMetadata::new(name, symbol, decimals), initial_supply, mint)
}

pub fn transfer(
    ledger: &Ledger,
    caller: &SecretKey,
    to: &Address,
    amount: &Uint222,
) -> LedgerResult<Ledger> {
    let mut next = ledger.clone();
    next.transfer(caller, to, amount)?;
    Ok(next)
}

/// Approval cannot fail on well-typed input, so the next ledger is returned directly.
pub fn approve(ledger: &Ledger, caller: &SecretKey, spender: &Address, amount: &Uint222) -> Ledger {
    let mut next = ledger.clone();
    next.approve(caller, spender, amount);
    next
}

pub fn transfer_from(
    ledger: &Ledger,
    caller: &SecretKey,
    from: &Address,
    to: &Address,
    amount: &Uint222,
) -> LedgerResult<Ledger> {
    let mut next = ledger.clone();
    next.transfer_from(caller, from, to, amount)?;
    Ok(next)
}

pub fn total_supply(ledger: &Ledger) -> Uint222 {
    ledger.total_supply()
}

pub fn balance_of(ledger: &Ledger, owner: &Address) -> Uint222 {
    ledger.balance_of(owner)
}

pub fn allowance(ledger: &Ledger, owner: &Address, spender: &Address) -> Uint222 {
    ledger.allowance(owner, spender)
}

/// A mutating ledger call, minus the caller's secret key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Transfer {
        to: Address,
        amount: Uint222,
    },
    Approve {
        spender: Address,
        amount: Uint222,
    },
    TransferFrom {
        from: Address,
        to: Address,
        amount: Uint222,
    },
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Transfer { .. } => OperationKind::Transfer,
            Operation::Approve { .. } => OperationKind::Approve,
            Operation::TransferFrom { .. } => OperationKind::TransferFrom,
        }
    }

    /// Apply this operation to `ledger` in place on behalf of `caller`.
    pub fn apply(&self, ledger: &mut Ledger, caller: &SecretKey) -> LedgerResult<()> {
        match self {
            Operation::Transfer { to, amount } => ledger.transfer(caller, to, amount),
            Operation::Approve { spender, amount } => {
                ledger.approve(caller, spender, amount);
                Ok(())
            }
            Operation::TransferFrom { from, to, amount } => {
                ledger.transfer_from(caller, from, to, amount)
            }
        }
    }

    /// Apply this operation functionally, returning the next ledger.
    pub fn execute(&self, ledger: &Ledger, caller: &SecretKey) -> LedgerResult<Ledger> {
        let mut next = ledger.clone();
        self.apply(&mut next, caller)?;
        Ok(next)
    }
}

/// Discriminant of an [`Operation`], for history records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Transfer,
    Approve,
    TransferFrom,
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            OperationKind::Transfer => "transfer",
            OperationKind::Approve => "approve",
            OperationKind::TransferFrom => "transfer_from",
        })
    }
}
