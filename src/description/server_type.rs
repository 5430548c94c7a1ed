//! Server role enumeration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role a server plays in the deployment. Exactly one per snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerType {
    Standalone,
    Mongos,
    /// Assigned by the topology layer to an unconfirmed primary candidate,
    /// never by the classifier
    PossiblePrimary,
    #[serde(rename = "RSPrimary")]
    ReplicaSetPrimary,
    #[serde(rename = "RSSecondary")]
    ReplicaSetSecondary,
    #[serde(rename = "RSArbiter")]
    ReplicaSetArbiter,
    #[serde(rename = "RSOther")]
    ReplicaSetOther,
    #[serde(rename = "RSGhost")]
    ReplicaSetGhost,
    Unknown,
}

impl ServerType {
    pub const ALL: [ServerType; 9] = [
        ServerType::Standalone,
        ServerType::Mongos,
        ServerType::PossiblePrimary,
        ServerType::ReplicaSetPrimary,
        ServerType::ReplicaSetSecondary,
        ServerType::ReplicaSetArbiter,
        ServerType::ReplicaSetOther,
        ServerType::ReplicaSetGhost,
        ServerType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServerType::Standalone => "Standalone",
            ServerType::Mongos => "Mongos",
            ServerType::PossiblePrimary => "PossiblePrimary",
            ServerType::ReplicaSetPrimary => "RSPrimary",
            ServerType::ReplicaSetSecondary => "RSSecondary",
            ServerType::ReplicaSetArbiter => "RSArbiter",
            ServerType::ReplicaSetOther => "RSOther",
            ServerType::ReplicaSetGhost => "RSGhost",
            ServerType::Unknown => "Unknown",
        }
    }

    /// Roles that accept write operations
    pub fn is_writable(&self) -> bool {
        matches!(
            self,
            ServerType::ReplicaSetPrimary | ServerType::Standalone | ServerType::Mongos
        )
    }

    pub fn is_readable(&self) -> bool {
        *self == ServerType::ReplicaSetSecondary || self.is_writable()
    }

    pub fn is_data_bearing(&self) -> bool {
        matches!(
            self,
            ServerType::ReplicaSetPrimary
                | ServerType::ReplicaSetSecondary
                | ServerType::Mongos
                | ServerType::Standalone
        )
    }
}

impl fmt::Display for ServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServerType::ALL
            .iter()
            .copied()
            .find(|server_type| server_type.as_str() == s)
            .ok_or_else(|| format!("Unknown server type: {}", s))
    }
}
