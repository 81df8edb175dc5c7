//! Token and scenario configuration.
//!
//! Scenarios are JSON documents naming a token, a set of users with their
//! secret keys, and a list of steps to run against a fresh ledger:
//!
//! ```json
//! {
//!   "token": { "name": "Token", "symbol": "TKN", "decimals": 18, "initial_supply": "1000" },
//!   "mint": "alice",
//!   "users": { "alice": "0x01...", "bob": "0x02..." },
//!   "steps": [
//!     { "op": "transfer", "caller": "alice", "to": "bob", "amount": "300", "expect": "ok" }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use zktoken_common::{Address, SecretKey, Uint222};

/// Environment variable holding the default scenario path.
pub const SCENARIO_PATH_ENV: &str = "ZKTOKEN_SCENARIO";

/// Parameters fixed when a token ledger is constructed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    #[serde(default)]
    pub initial_supply: Uint222,
}

fn default_name() -> String {
    "Token".to_string()
}

fn default_symbol() -> String {
    "TKN".to_string()
}

fn default_decimals() -> u8 {
    18
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            symbol: default_symbol(),
            decimals: default_decimals(),
            initial_supply: Uint222::zero(),
        }
    }
}

/// An account named in a scenario: a raw address or a scenario user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AccountRef {
    Address(Address),
    User(String),
}

impl AccountRef {
    pub fn user(name: impl Into<String>) -> Self {
        AccountRef::User(name.into())
    }
}

impl std::fmt::Display for AccountRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountRef::Address(address) => write!(f, "{address}"),
            AccountRef::User(name) => f.write_str(name),
        }
    }
}

/// The call a scenario step makes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StepCall {
    Transfer {
        to: AccountRef,
        amount: Uint222,
    },
    Approve {
        spender: AccountRef,
        amount: Uint222,
    },
    TransferFrom {
        from: AccountRef,
        to: AccountRef,
        amount: Uint222,
    },
}

/// One scenario step: who calls, what they call, and optionally what must happen.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioStep {
    /// Name of the user whose secret key authenticates the call.
    pub caller: String,
    #[serde(flatten)]
    pub call: StepCall,
    /// `"ok"` or an error code such as `"INSUFFICIENT_BALANCE"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<String>,
}

/// A complete scenario document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub token: TokenConfig,
    /// Recipient of the initial supply.
    pub mint: AccountRef,
    /// User name to hex-encoded secret key.
    pub users: BTreeMap<String, String>,
    #[serde(default)]
    pub steps: Vec<ScenarioStep>,
}

impl ScenarioConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse scenario JSON")
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            fs::read(path).with_context(|| format!("failed to read scenario {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("failed to parse scenario {}", path.display()))
    }

    /// Load the scenario named by `ZKTOKEN_SCENARIO`.
    pub fn from_env() -> Result<Self> {
        let path = env::var(SCENARIO_PATH_ENV)
            .with_context(|| format!("{SCENARIO_PATH_ENV} is not set"))?;
        Self::from_path(path)
    }

    /// Decode every user's secret key, in name order.
    pub fn secret_keys(&self) -> Result<Vec<(String, SecretKey)>> {
        self.users
            .iter()
            .map(|(name, hex)| {
                let key = SecretKey::from_hex(hex)
                    .with_context(|| format!("invalid secret key for user {name}"))?;
                Ok((name.clone(), key))
            })
            .collect()
    }
}

/// A small scenario exercising every operation, used by `zktoken-tools sample-scenario`.
pub fn sample_scenario() -> ScenarioConfig {
    let users = [("alice", 0x11u8), ("bob", 0x22), ("carol", 0x33)]
        .into_iter()
        .map(|(name, byte)| (name.to_string(), SecretKey::from_bytes([byte; 32]).to_hex()))
        .collect();

    let step = |caller: &str, call: StepCall, expect: &str| ScenarioStep {
        caller: caller.to_string(),
        call,
        expect: Some(expect.to_string()),
    };

    ScenarioConfig {
        token: TokenConfig {
            initial_supply: Uint222::from(1000u64),
            ..TokenConfig::default()
        },
        mint: AccountRef::user("alice"),
        users,
        steps: vec![
            step(
                "alice",
                StepCall::Transfer {
                    to: AccountRef::user("bob"),
                    amount: Uint222::from(300u64),
                },
                "ok",
            ),
            step(
                "bob",
                StepCall::Transfer {
                    to: AccountRef::user("carol"),
                    amount: Uint222::from(301u64),
                },
                "INSUFFICIENT_BALANCE",
            ),
            step(
                "alice",
                StepCall::Approve {
                    spender: AccountRef::user("carol"),
                    amount: Uint222::from(400u64),
                },
                "ok",
            ),
            step(
                "carol",
                StepCall::TransferFrom {
                    from: AccountRef::user("alice"),
                    to: AccountRef::user("bob"),
                    amount: Uint222::from(250u64),
                },
                "ok",
            ),
            step(
                "bob",
                StepCall::TransferFrom {
                    from: AccountRef::user("alice"),
                    to: AccountRef::user("bob"),
                    amount: Uint222::from(1u64),
                },
                "NO_ALLOWANCE_SET",
            ),
        ],
    }
}
