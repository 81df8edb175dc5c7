//! Contract simulator.
//!
//! Drives one [`Ledger`] through a sequence of operations. The caller's secret
//! key is fetched from the provider at every call, the operation engine
//! computes the next ledger, and the stored ledger is replaced only when the
//! operation succeeds.

use serde::Serialize;
use zktoken_common::{Address, Uint222};
use zktoken_ledger::{
    operations, Ledger, LedgerCommitment, LedgerError, LedgerResult, Operation, OperationKind,
};

use crate::config::TokenConfig;
use crate::provider::{KeyStore, SecretKeyProvider};
use crate::SimulatorError;

/// Result of a simulated operation, as recorded in the history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    Rejected { code: String, message: String },
}

impl Outcome {
    fn from_result(result: &LedgerResult<()>) -> Self {
        match result {
            Ok(()) => Outcome::Applied,
            Err(err) => Outcome::Rejected {
                code: err.code().to_string(),
                message: err.to_string(),
            },
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied)
    }

    /// `"ok"` for applied operations, otherwise the error code.
    pub fn code(&self) -> &str {
        match self {
            Outcome::Applied => "ok",
            Outcome::Rejected { code, .. } => code,
        }
    }
}

/// One entry of the simulator history.
#[derive(Clone, Debug, Serialize)]
pub struct OperationRecord {
    pub kind: OperationKind,
    pub caller: Address,
    pub operation: Operation,
    pub outcome: Outcome,
}

/// Simulator over a single token ledger.
pub struct TokenSimulator<P> {
    ledger: Ledger,
    provider: P,
    history: Vec<OperationRecord>,
}

impl<P: SecretKeyProvider> TokenSimulator<P> {
    /// Deploy a token described by `token`, minting its supply to `mint`.
    pub fn new(token: &TokenConfig, mint: Address, provider: P) -> Self {
        let ledger = operations::construct(
            token.initial_supply.clone(),
            mint,
            token.name.clone(),
            token.symbol.clone(),
            token.decimals,
        );
        Self::from_ledger(ledger, provider)
    }

    /// Deploy a token that mints its supply to the provider's current caller.
    pub fn deploy_as_caller(token: &TokenConfig, provider: P) -> Self {
        let mint = provider.caller_address();
        Self::new(token, mint, provider)
    }

    /// Resume from an existing ledger, e.g. a loaded snapshot.
    pub fn from_ledger(ledger: Ledger, provider: P) -> Self {
        Self {
            ledger,
            provider,
            history: Vec::new(),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn history(&self) -> &[OperationRecord] {
        &self.history
    }

    /// Address of whoever the provider currently authenticates as.
    pub fn caller_address(&self) -> Address {
        self.provider.caller_address()
    }

    pub fn commitment(&self) -> LedgerCommitment {
        self.ledger.commitment()
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn name(&self) -> &str {
        self.ledger.name()
    }

    pub fn symbol(&self) -> &str {
        self.ledger.symbol()
    }

    pub fn decimals(&self) -> u8 {
        self.ledger.decimals()
    }

    pub fn total_supply(&self) -> Uint222 {
        operations::total_supply(&self.ledger)
    }

    pub fn balance_of(&self, owner: &Address) -> Uint222 {
        operations::balance_of(&self.ledger, owner)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Uint222 {
        operations::allowance(&self.ledger, owner, spender)
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    pub fn transfer(&mut self, to: &Address, amount: &Uint222) -> LedgerResult<()> {
        self.execute(Operation::Transfer {
            to: *to,
            amount: amount.clone(),
        })
    }

    pub fn approve(&mut self, spender: &Address, amount: &Uint222) {
        let caller = self.provider.get_secret_key();
        self.ledger = operations::approve(&self.ledger, &caller, spender, amount);
        self.history.push(OperationRecord {
            kind: OperationKind::Approve,
            caller: caller.address(),
            operation: Operation::Approve {
                spender: *spender,
                amount: amount.clone(),
            },
            outcome: Outcome::Applied,
        });
    }

    pub fn transfer_from(
        &mut self,
        from: &Address,
        to: &Address,
        amount: &Uint222,
    ) -> LedgerResult<()> {
        self.execute(Operation::TransferFrom {
            from: *from,
            to: *to,
            amount: amount.clone(),
        })
    }

    /// Apply `operation` as the provider's current caller.
    pub fn execute(&mut self, operation: Operation) -> LedgerResult<()> {
        let caller = self.provider.get_secret_key();
        let caller_address = caller.address();

        let result = match operation.execute(&self.ledger, &caller) {
            Ok(next) => {
                self.ledger = next;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    op = %operation.kind(),
                    caller = %caller_address,
                    code = err.code(),
                    "operation rejected: {}",
                    err
                );
                Err(err)
            }
        };

        self.history.push(OperationRecord {
            kind: operation.kind(),
            caller: caller_address,
            outcome: Outcome::from_result(&result),
            operation,
        });
        result
    }

    /// Recheck conservation on the current ledger.
    pub fn check_invariants(&self) -> Result<(), LedgerError> {
        self.ledger.check_invariants()
    }
}

impl TokenSimulator<KeyStore> {
    /// Authenticate subsequent operations as the named user.
    pub fn switch_user(&mut self, name: &str) -> Result<(), SimulatorError> {
        self.provider.switch_user(name)
    }

    /// Public address of a named user.
    pub fn address_of(&self, name: &str) -> Result<Address, SimulatorError> {
        self.provider
            .address_of(name)
            .ok_or_else(|| SimulatorError::UnknownUser(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::PrivateState;
    use zktoken_common::SecretKey;

    fn key(byte: u8) -> SecretKey {
        SecretKey::from_bytes([byte; 32])
    }

    fn token(supply: u64) -> TokenConfig {
        TokenConfig {
            initial_supply: Uint222::from(supply),
            ..TokenConfig::default()
        }
    }

    #[test]
    fn deploy_as_caller_mints_to_provider_address() {
        let sim = TokenSimulator::deploy_as_caller(&token(1000), PrivateState::new(key(1)));
        assert_eq!(sim.balance_of(&key(1).address()), Uint222::from(1000u64));
        assert_eq!(sim.name(), "Token");
        assert_eq!(sim.symbol(), "TKN");
        assert_eq!(sim.decimals(), 18);
    }

    #[test]
    fn rejected_operation_is_recorded_and_state_kept() {
        let mut sim = TokenSimulator::deploy_as_caller(&token(10), PrivateState::new(key(1)));
        let before = sim.commitment();

        let err = sim.transfer(&key(2).address(), &Uint222::from(11u64)).unwrap_err();

        assert_eq!(err.code(), "INSUFFICIENT_BALANCE");
        assert_eq!(sim.commitment(), before);
        let record = sim.history().last().unwrap();
        assert_eq!(record.kind, OperationKind::Transfer);
        assert_eq!(record.caller, key(1).address());
        assert_eq!(record.outcome.code(), "INSUFFICIENT_BALANCE");
    }

    #[test]
    fn caller_key_is_read_at_call_time() {
        let mut sim = TokenSimulator::deploy_as_caller(&token(100), PrivateState::new(key(1)));
        sim.approve(&key(2).address(), &Uint222::from(40u64));

        sim.provider_mut().set_secret_key(key(2));
        assert_eq!(sim.caller_address(), key(2).address());
        sim.transfer_from(&key(1).address(), &key(3).address(), &Uint222::from(40u64))
            .unwrap();

        assert_eq!(sim.balance_of(&key(3).address()), Uint222::from(40u64));
        assert_eq!(sim.allowance(&key(1).address(), &key(2).address()), Uint222::zero());
        assert!(sim.history().iter().all(|r| r.outcome.is_applied()));
        sim.check_invariants().unwrap();
    }

    #[test]
    fn key_store_simulator_switches_users() {
        let store = KeyStore::from_users([("alice", key(1)), ("bob", key(2))]).unwrap();
        let mut sim = TokenSimulator::deploy_as_caller(&token(100), store);
        let bob = sim.address_of("bob").unwrap();

        sim.transfer(&bob, &Uint222::from(30u64)).unwrap();
        sim.switch_user("bob").unwrap();
        sim.transfer(&bob, &Uint222::from(30u64)).unwrap();

        assert_eq!(sim.balance_of(&bob), Uint222::from(30u64));
        assert!(sim.address_of("carol").is_err());
    }
}
