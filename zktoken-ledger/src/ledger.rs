//! Ledger state and the transitions applied to it.
//!
//! The ledger is a single record: sealed token metadata, the total supply, a
//! balance map and a two-level allowance map (owner, then spender). Absent
//! entries read as zero at every level.
//!
//! Every mutating method derives the caller's address from the secret key it
//! is handed, computes all new values first and only then writes them. A
//! rejected call therefore leaves the ledger untouched.

use std::collections::BTreeMap;
use std::fmt;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize, Serializer};
use zktoken_common::{compute_address, Address, SecretKey, Uint222};

use crate::{LedgerError, LedgerResult};

/// Version of the canonical encoding hashed by [`Ledger::commitment`].
/// Increment this when changing the field layout.
pub const LEDGER_STATE_VERSION: u32 = 1;

/// BLAKE3 key-derivation context for ledger commitments.
const COMMITMENT_CONTEXT: &str = "zktoken 2024 ledger state commitment v1";

/// Token name, symbol and decimals. Fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    name: String,
    symbol: String,
    decimals: u8,
}

impl TokenMetadata {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }
}

/// Public ledger state of one token contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    metadata: TokenMetadata,
    total_supply: Uint222,
    #[serde(default)]
    balances: BTreeMap<Address, Uint222>,
    #[serde(default)]
    allowances: BTreeMap<Address, BTreeMap<Address, Uint222>>,
}

/// New balances computed for a debit/credit pair, not yet written.
struct BalanceUpdate {
    from: Address,
    from_balance: Uint222,
    to: Address,
    to_balance: Uint222,
}

impl Ledger {
    /// Create the ledger, minting the whole initial supply to `mint`.
    pub fn new(metadata: TokenMetadata, initial_supply: Uint222, mint: Address) -> Self {
        tracing::info!(
            name = metadata.name(),
            symbol = metadata.symbol(),
            decimals = metadata.decimals(),
            initial_supply = %initial_supply,
            mint = %mint,
            "token ledger constructed"
        );

        let mut balances = BTreeMap::new();
        balances.insert(mint, initial_supply.clone());

        Self {
            metadata,
            total_supply: initial_supply,
            balances,
            allowances: BTreeMap::new(),
        }
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        self.metadata.name()
    }

    pub fn symbol(&self) -> &str {
        self.metadata.symbol()
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals()
    }

    pub fn total_supply(&self) -> Uint222 {
        self.total_supply.clone()
    }

    /// Balance of `owner`; zero when the owner has no entry.
    pub fn balance_of(&self, owner: &Address) -> Uint222 {
        self.balances.get(owner).cloned().unwrap_or_default()
    }

    /// Remaining allowance of `spender` over `owner`'s balance; zero when
    /// either level of the map has no entry.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Uint222 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .cloned()
            .unwrap_or_default()
    }

    /// Whether `approve` has ever been called for this `(owner, spender)` pair.
    pub fn has_allowance_entry(&self, owner: &Address, spender: &Address) -> bool {
        self.allowances
            .get(owner)
            .map(|spenders| spenders.contains_key(spender))
            .unwrap_or(false)
    }

    /// Stored balance entries in address order.
    pub fn balances(&self) -> impl Iterator<Item = (&Address, &Uint222)> {
        self.balances.iter()
    }

    /// Allowance entries granted by `owner`, in spender order.
    pub fn allowances_of(&self, owner: &Address) -> impl Iterator<Item = (&Address, &Uint222)> {
        self.allowances
            .get(owner)
            .map(|spenders| spenders.iter())
            .into_iter()
            .flatten()
    }

    /// Number of addresses holding a non-zero balance.
    pub fn holder_count(&self) -> usize {
        self.balances.values().filter(|v| !v.is_zero()).count()
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Move `amount` from the caller's balance to `to`.
    pub fn transfer(
        &mut self,
        caller: &SecretKey,
        to: &Address,
        amount: &Uint222,
    ) -> LedgerResult<()> {
        let from = compute_address(caller);
        if amount.is_zero() {
            return Ok(());
        }

        let update = self.plan_balance_update(from, *to, amount)?;
        self.write_balance_update(update);

        tracing::debug!(%from, %to, %amount, "transfer applied");
        Ok(())
    }

    /// Set the caller's allowance for `spender` to exactly `amount`.
    ///
    /// This overwrites any previous value rather than adding to it.
    pub fn approve(&mut self, caller: &SecretKey, spender: &Address, amount: &Uint222) {
        let owner = compute_address(caller);
        self.allowances
            .entry(owner)
            .or_default()
            .insert(*spender, amount.clone());

        tracing::debug!(%owner, %spender, %amount, "allowance set");
    }

    /// Spend `amount` of the caller's allowance over `from`, moving it to `to`.
    ///
    /// Preconditions are checked in order: allowance entry present, allowance
    /// covers `amount`, balance covers `amount`. The first failure is reported.
    pub fn transfer_from(
        &mut self,
        caller: &SecretKey,
        from: &Address,
        to: &Address,
        amount: &Uint222,
    ) -> LedgerResult<()> {
        let spender = compute_address(caller);

        let allowance = self
            .allowances
            .get(from)
            .and_then(|spenders| spenders.get(&spender))
            .cloned()
            .ok_or(LedgerError::NoAllowanceSet)?;

        if amount.is_zero() {
            return Ok(());
        }

        let remaining =
            allowance
                .checked_sub(amount)
                .ok_or_else(|| LedgerError::InsufficientAllowance {
                    have: allowance.clone(),
                    need: amount.clone(),
                })?;
        let update = self.plan_balance_update(*from, *to, amount)?;

        self.allowances
            .entry(*from)
            .or_default()
            .insert(spender, remaining);
        self.write_balance_update(update);

        tracing::debug!(%spender, %from, %to, %amount, "delegated transfer applied");
        Ok(())
    }

    fn plan_balance_update(
        &self,
        from: Address,
        to: Address,
        amount: &Uint222,
    ) -> LedgerResult<BalanceUpdate> {
        let have = self.balance_of(&from);
        let from_balance =
            have.checked_sub(amount)
                .ok_or_else(|| LedgerError::InsufficientBalance {
                    have: have.clone(),
                    need: amount.clone(),
                })?;

        // A self-transfer credits the already-debited balance.
        let credit_base = if to == from {
            from_balance.clone()
        } else {
            self.balance_of(&to)
        };
        let to_balance = credit_base
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;

        Ok(BalanceUpdate {
            from,
            from_balance,
            to,
            to_balance,
        })
    }

    fn write_balance_update(&mut self, update: BalanceUpdate) {
        self.balances.insert(update.from, update.from_balance);
        self.balances.insert(update.to, update.to_balance);
    }

    // ------------------------------------------------------------------
    // Integrity
    // ------------------------------------------------------------------

    /// Check that the stored balances sum to exactly the total supply.
    pub fn check_invariants(&self) -> LedgerResult<()> {
        // Summed as BigUint: a corrupt snapshot may exceed the 222-bit range.
        let sum: BigUint = self.balances.values().map(Uint222::as_biguint).sum();
        if &sum != self.total_supply.as_biguint() {
            return Err(LedgerError::ConservationViolated(format!(
                "balances sum to {}, total supply is {}",
                sum, self.total_supply
            )));
        }
        Ok(())
    }

    /// Commit to the full ledger state with a single 32-byte digest.
    ///
    /// The encoding is canonical: maps are walked in key order and every
    /// variable-length field is length-prefixed, so two ledgers share a
    /// commitment exactly when they hold the same state.
    pub fn commitment(&self) -> LedgerCommitment {
        let mut hasher = blake3::Hasher::new_derive_key(COMMITMENT_CONTEXT);
        hasher.update(&LEDGER_STATE_VERSION.to_be_bytes());

        write_len_prefixed(&mut hasher, self.metadata.name.as_bytes());
        write_len_prefixed(&mut hasher, self.metadata.symbol.as_bytes());
        hasher.update(&[self.metadata.decimals]);
        hasher.update(&self.total_supply.to_be_bytes());

        hasher.update(&(self.balances.len() as u64).to_be_bytes());
        for (owner, balance) in &self.balances {
            hasher.update(owner.as_bytes());
            hasher.update(&balance.to_be_bytes());
        }

        hasher.update(&(self.allowances.len() as u64).to_be_bytes());
        for (owner, spenders) in &self.allowances {
            hasher.update(owner.as_bytes());
            hasher.update(&(spenders.len() as u64).to_be_bytes());
            for (spender, amount) in spenders {
                hasher.update(spender.as_bytes());
                hasher.update(&amount.to_be_bytes());
            }
        }

        LedgerCommitment(*hasher.finalize().as_bytes())
    }
}

fn write_len_prefixed(hasher: &mut blake3::Hasher, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

/// 32-byte digest of a [`Ledger`]'s full state.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LedgerCommitment([u8; 32]);

impl LedgerCommitment {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for LedgerCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for LedgerCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LedgerCommitment({})", self.to_hex())
    }
}

impl Serialize for LedgerCommitment {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}
