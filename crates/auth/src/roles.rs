use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role name as carried in a session token.
///
/// Tokens carry the role as an opaque string; only exact matches against the
/// closed set in [`KnownRole`] confer privileges. Anything else is default-deny.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const SUPER_ADMIN: Role = Role(Cow::Borrowed("SUPER_ADMIN"));
    pub const COORDINATOR: Role = Role(Cow::Borrowed("COORDINATOR"));
    pub const USER: Role = Role(Cow::Borrowed("USER"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact, case-sensitive match against the known roles.
    pub fn known(&self) -> Option<KnownRole> {
        match self.as_str() {
            "SUPER_ADMIN" => Some(KnownRole::SuperAdmin),
            "COORDINATOR" => Some(KnownRole::Coordinator),
            "USER" => Some(KnownRole::User),
            _ => None,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The closed set of roles an identity record can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KnownRole {
    SuperAdmin,
    Coordinator,
    User,
}

impl KnownRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownRole::SuperAdmin => "SUPER_ADMIN",
            KnownRole::Coordinator => "COORDINATOR",
            KnownRole::User => "USER",
        }
    }
}

impl core::fmt::Display for KnownRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<KnownRole> for Role {
    fn from(value: KnownRole) -> Self {
        Role::new(value.as_str())
    }
}

impl core::str::FromStr for KnownRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::new(s.to_string())
            .known()
            .ok_or_else(|| format!("unknown role '{s}'"))
    }
}
