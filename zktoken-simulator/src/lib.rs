//! Simulator harness for the zktoken ledger.
//!
//! The ledger crate defines the state machine; this crate supplies the
//! pieces around it that a deployed contract would get from its runtime:
//!
//! - [`provider`]: caller-local secret keys ([`PrivateState`], [`KeyStore`])
//! - [`simulator`]: [`TokenSimulator`], which drives one ledger and keeps an
//!   operation history
//! - [`config`] / [`scenario`]: JSON scenarios and their runner

pub mod config;
pub mod provider;
pub mod scenario;
pub mod simulator;

use thiserror::Error;

pub use config::{
    sample_scenario, AccountRef, ScenarioConfig, ScenarioStep, StepCall, TokenConfig,
    SCENARIO_PATH_ENV,
};
pub use provider::{KeyStore, PrivateState, SecretKeyProvider};
pub use scenario::{run_scenario, run_scenario_strict, ScenarioReport, StepReport, TokenSummary};
pub use simulator::{OperationRecord, Outcome, TokenSimulator};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulatorError {
    #[error("unknown user: {0}")]
    UnknownUser(String),
    #[error("key store has no users")]
    EmptyKeyStore,
}
