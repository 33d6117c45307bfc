use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use festflow_core::DomainError;

/// The festivals an event can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FestType {
    #[serde(rename = "Nimbus")]
    Nimbus,
    #[serde(rename = "Hill'ffair")]
    HillFfair,
}

impl FestType {
    pub const ALL: [FestType; 2] = [FestType::Nimbus, FestType::HillFfair];

    pub fn as_str(&self) -> &'static str {
        match self {
            FestType::Nimbus => "Nimbus",
            FestType::HillFfair => "Hill'ffair",
        }
    }
}

impl fmt::Display for FestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FestType {
    type Err = DomainError;

    /// Exact match against the closed set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s.trim())
            .ok_or_else(|| DomainError::validation(format!("unknown festType: {s}")))
    }
}
