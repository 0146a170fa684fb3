//! Strongly-typed record IDs. The store assigns them monotonically per collection.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

fn parse_positive(s: &str) -> Result<i64, String> {
    let n: i64 = s.trim().parse().map_err(|e| format!("Invalid id {:?}: {}", s, e))?;
    if n <= 0 {
        return Err(format!("Invalid id {:?}: must be positive", s));
    }
    Ok(n)
}

/// Counterparty ID (row id in `counterparties`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CounterpartyId(pub i64);

/// Money transaction ID (row id in `money_transactions`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MoneyTransactionId(pub i64);

/// Item transaction ID (row id in `item_transactions`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemTransactionId(pub i64);

macro_rules! id_serde {
    ($name:ident) => {
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
                ser.serialize_i64(self.0)
            }
        }
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
                let n = i64::deserialize(de)?;
                if n <= 0 {
                    return Err(serde::de::Error::custom(format!("invalid id {}", n)));
                }
                Ok(Self(n))
            }
        }
    };
}
id_serde!(CounterpartyId);
id_serde!(MoneyTransactionId);
id_serde!(ItemTransactionId);

macro_rules! id_type {
    ($name:ident) => {
        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }

            pub fn parse(s: impl AsRef<str>) -> Result<Self, String> {
                Self::from_str(s.as_ref())
            }
        }
        impl FromStr for $name {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(parse_positive(s)?))
            }
        }
        impl From<i64> for $name {
            fn from(n: i64) -> Self {
                Self(n)
            }
        }
        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}
id_type!(CounterpartyId);
id_type!(MoneyTransactionId);
id_type!(ItemTransactionId);
