//! Account role.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Role attached to an account.
///
/// Stored as a lowercase string in the database (`customer` / `admin`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Ordinary shopper. The default for new accounts.
    #[default]
    Customer,
    /// Administrator with access to catalog management.
    Admin,
}

impl Role {
    /// Parse a role from its stored string form.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "customer" => Some(Self::Customer),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// The stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        assert_eq!(Role::parse("customer"), Some(Role::Customer));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("root"), None);
        assert_eq!(Role::Admin.as_str(), "admin");
    }

    #[test]
    fn test_default_is_customer() {
        assert_eq!(Role::default(), Role::Customer);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&Role::Admin).expect("serialize");
        assert_eq!(json, "\"admin\"");
    }
}
