//! Datastore Enablement
//!
//! Tri-state flag selecting which backends a deployment runs with. Reads,
//! writes and deletes all consult the same flag, so a disabled backend is
//! never touched on any path.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which datastore backends are enabled
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataStoreOption {
    /// Keyspace backend only
    Cassandra,
    /// Relational backend only
    Rdbms,
    /// Both backends
    All,
}

impl DataStoreOption {
    /// True when the backend `required` asks about is switched on.
    ///
    /// `All` enables both concrete backends; a concrete option enables
    /// exactly itself.
    pub fn is_enabled(&self, required: DataStoreOption) -> bool {
        match self {
            Self::All => matches!(required, Self::Cassandra | Self::Rdbms),
            concrete => *concrete == required,
        }
    }
}

impl Default for DataStoreOption {
    fn default() -> Self {
        Self::All
    }
}

impl FromStr for DataStoreOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cassandra" => Ok(Self::Cassandra),
            "rdbms" => Ok(Self::Rdbms),
            "all" => Ok(Self::All),
            other => Err(format!("unknown datastore option '{}'", other)),
        }
    }
}

impl fmt::Display for DataStoreOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cassandra => write!(f, "cassandra"),
            Self::Rdbms => write!(f, "rdbms"),
            Self::All => write!(f, "all"),
        }
    }
}
