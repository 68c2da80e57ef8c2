//! The two-valued chain tag that parameterizes every per-chain table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Which layer a header or event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    /// The settlement layer the rollup posts to.
    L1,
    /// The rollup itself.
    L2,
}

impl Chain {
    /// Selector string accepted by [`FromStr`] (`"l1"` / `"l2"`, lowercase only).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L1 => "l1",
            Self::L2 => "l2",
        }
    }

    /// Name of this chain's block header table.
    pub fn headers_table(&self) -> &'static str {
        match self {
            Self::L1 => "l1_block_headers",
            Self::L2 => "l2_block_headers",
        }
    }

    /// Name of this chain's contract event table.
    pub fn events_table(&self) -> &'static str {
        match self {
            Self::L1 => "l1_contract_events",
            Self::L2 => "l2_contract_events",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "l1" => Ok(Self::L1),
            "l2" => Ok(Self::L2),
            other => Err(StorageError::InvalidChain(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_selectors() {
        assert_eq!("l1".parse::<Chain>().unwrap(), Chain::L1);
        assert_eq!("l2".parse::<Chain>().unwrap(), Chain::L2);
    }

    #[test]
    fn selectors_are_case_sensitive() {
        for s in ["L1", "L2", " l1", "l2 "] {
            let err = s.parse::<Chain>().unwrap_err();
            assert!(matches!(err, StorageError::InvalidChain(ref got) if got == s));
        }
    }

    #[test]
    fn unknown_selector_is_invalid_chain() {
        let err = "l3".parse::<Chain>().unwrap_err();
        assert!(matches!(err, StorageError::InvalidChain(ref s) if s == "l3"));
    }

    #[test]
    fn table_names_are_distinct() {
        assert_ne!(Chain::L1.headers_table(), Chain::L2.headers_table());
        assert_ne!(Chain::L1.events_table(), Chain::L2.events_table());
        assert_eq!(Chain::L2.to_string(), "l2");
    }
}
