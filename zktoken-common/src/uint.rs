//! Checked 222-bit unsigned integers.
//!
//! Ledger amounts are unsigned integers bounded by `2^222 - 1`. Every
//! arithmetic operation is checked: a result outside the range is reported as
//! `None` rather than wrapped or truncated, so callers can reject the whole
//! operation before touching any state.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use once_cell::sync::Lazy;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::UintError;

/// Bit width of ledger amounts.
pub const UINT222_BITS: u64 = 222;

/// Length of the fixed-width big-endian encoding (222 bits fit in 28 bytes).
pub const UINT222_BYTES: usize = 28;

static UINT222_MAX: Lazy<BigUint> = Lazy::new(|| (BigUint::one() << UINT222_BITS) - 1u32);

/// Unsigned integer in `[0, 2^222)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uint222(BigUint);

impl Uint222 {
    /// Wrap a `BigUint`, rejecting values that need more than 222 bits.
    pub fn new(value: BigUint) -> Result<Self, UintError> {
        if value.bits() > UINT222_BITS {
            return Err(UintError::OutOfRange);
        }
        Ok(Self(value))
    }

    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    /// Largest representable value, `2^222 - 1`.
    pub fn max_value() -> Self {
        Self(UINT222_MAX.clone())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// `self + rhs`, or `None` if the sum leaves the 222-bit range.
    pub fn checked_add(&self, rhs: &Self) -> Option<Self> {
        Self::new(&self.0 + &rhs.0).ok()
    }

    /// `self - rhs`, or `None` if the difference would be negative.
    pub fn checked_sub(&self, rhs: &Self) -> Option<Self> {
        if self.0 < rhs.0 {
            return None;
        }
        Some(Self(&self.0 - &rhs.0))
    }

    /// Fixed-width big-endian encoding.
    pub fn to_be_bytes(&self) -> [u8; UINT222_BYTES] {
        let mut out = [0u8; UINT222_BYTES];
        if self.0.is_zero() {
            return out;
        }
        let bytes = self.0.to_bytes_be();
        out[UINT222_BYTES - bytes.len()..].copy_from_slice(&bytes);
        out
    }

    /// Decode the fixed-width big-endian encoding produced by [`Self::to_be_bytes`].
    pub fn from_be_bytes(bytes: &[u8; UINT222_BYTES]) -> Result<Self, UintError> {
        Self::new(BigUint::from_bytes_be(bytes))
    }
}

macro_rules! impl_from_primitive {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Uint222 {
                fn from(value: $t) -> Self {
                    Self(BigUint::from(value))
                }
            }
        )*
    };
}

impl_from_primitive!(u8, u16, u32, u64, u128);

impl TryFrom<BigUint> for Uint222 {
    type Error = UintError;

    fn try_from(value: BigUint) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Uint222> for BigUint {
    fn from(value: Uint222) -> Self {
        value.0
    }
}

impl fmt::Display for Uint222 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for Uint222 {
    type Err = UintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<BigUint>()
            .map_err(|err| UintError::Parse(format!("{s:?}: {err}")))?;
        Self::new(value)
    }
}

// Amounts travel as decimal strings: JSON numbers cannot carry 222 bits.
impl Serialize for Uint222 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Uint222 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Uint222Visitor;

        impl de::Visitor<'_> for Uint222Visitor {
            type Value = Uint222;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a decimal string or non-negative integer below 2^222")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Uint222::from(v))
            }

            fn visit_u128<E>(self, v: u128) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Uint222::from(v))
            }
        }

        deserializer.deserialize_any(Uint222Visitor)
    }
}
