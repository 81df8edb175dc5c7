//! Ledger operation errors

use thiserror::Error;
use zktoken_common::Uint222;

/// Rejection of a proposed ledger operation.
///
/// None of these are fatal: the ledger is left exactly as it was before the
/// rejected call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Uint222, need: Uint222 },

    #[error("Insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance { have: Uint222, need: Uint222 },

    #[error("No allowance set for this owner and spender")]
    NoAllowanceSet,

    #[error("Arithmetic overflow: result exceeds the 222-bit range")]
    ArithmeticOverflow,

    #[error("Conservation invariant violated: {0}")]
    ConservationViolated(String),
}

impl LedgerError {
    /// Stable machine-readable code, used in reports and scenario expectations.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            LedgerError::InsufficientAllowance { .. } => "INSUFFICIENT_ALLOWANCE",
            LedgerError::NoAllowanceSet => "NO_ALLOWANCE_SET",
            LedgerError::ArithmeticOverflow => "ARITHMETIC_OVERFLOW",
            LedgerError::ConservationViolated(_) => "CONSERVATION_VIOLATED",
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
