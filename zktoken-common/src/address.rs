//! Public addresses and the secret-key commitment that derives them.
//!
//! A caller proves control of an address by supplying the secret key whose
//! commitment equals that address. The secret key itself never reaches the
//! ledger:
//!
//! ```text
//! address = SHA-256(ADDRESS_DOMAIN_TAG || secret_key)
//! ```
//!
//! The tag occupies the first element of a two-element vector of 32-byte
//! values, so address commitments cannot collide with hashes taken over the
//! same key for any other purpose.

use std::fmt;
use std::str::FromStr;

use rand::{CryptoRng, RngCore};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::AddressError;

/// Length in bytes of addresses and secret keys.
pub const BYTES32_LEN: usize = 32;

/// Domain separator for address commitments.
pub const ADDRESS_DOMAIN_TAG: [u8; BYTES32_LEN] = pad32(b"zktoken:address:");

/// Right-pad an ASCII tag with zero bytes to 32 bytes.
pub const fn pad32(tag: &[u8]) -> [u8; BYTES32_LEN] {
    assert!(tag.len() <= BYTES32_LEN, "tag longer than 32 bytes");
    let mut out = [0u8; BYTES32_LEN];
    let mut i = 0;
    while i < tag.len() {
        out[i] = tag[i];
        i += 1;
    }
    out
}

/// 32-byte public account identifier.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; BYTES32_LEN]);

impl Address {
    pub const fn from_bytes(bytes: [u8; BYTES32_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; BYTES32_LEN] {
        &self.0
    }

    /// Parse a 64-character hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        parse_bytes32(s).map(Self)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; BYTES32_LEN]> for Address {
    fn from(bytes: [u8; BYTES32_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AddressVisitor;

        impl de::Visitor<'_> for AddressVisitor {
            type Value = Address;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a 32-byte hex string (with or without 0x prefix)")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Address::from_hex(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(AddressVisitor)
    }
}

/// Caller-local secret whose commitment is the caller's [`Address`].
///
/// Not `Serialize`. Keys leave a private-state provider only as raw bytes
/// handed to an operation.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; BYTES32_LEN]);

impl SecretKey {
    pub fn from_bytes(bytes: [u8; BYTES32_LEN]) -> Self {
        Self(bytes)
    }

    /// Draw a fresh key from a cryptographic RNG.
    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; BYTES32_LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Parse a 64-character hex string, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        parse_bytes32(s).map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; BYTES32_LEN] {
        &self.0
    }

    /// Hex encoding of the raw key, for handing keys to a local key store.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// The public address this key controls.
    pub fn address(&self) -> Address {
        compute_address(self)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material; the derived address is safe to show.
        f.debug_struct("SecretKey")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Derive the public address committed to by `secret_key`.
pub fn compute_address(secret_key: &SecretKey) -> Address {
    let digest = Sha256::new()
        .chain_update(ADDRESS_DOMAIN_TAG)
        .chain_update(secret_key.as_bytes())
        .finalize();

    let mut out = [0u8; BYTES32_LEN];
    out.copy_from_slice(&digest);
    Address(out)
}

fn parse_bytes32(s: &str) -> Result<[u8; BYTES32_LEN], AddressError> {
    let hex_str = s.trim();
    let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    if hex_str.len() != BYTES32_LEN * 2 {
        return Err(AddressError::InvalidLength(hex_str.len()));
    }
    let mut bytes = [0u8; BYTES32_LEN];
    hex::decode_to_slice(hex_str, &mut bytes)
        .map_err(|err| AddressError::InvalidHex(err.to_string()))?;
    Ok(bytes)
}
