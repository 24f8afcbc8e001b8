//! Operator authentication and capability checks.
//!
//! Operators are configured with a bearer token and a list of capability
//! strings. The wildcard `*` grants every capability.

use std::{collections::BTreeSet, fmt, str::FromStr};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::error::{AdminError, Result};

/// Permission required by an admin operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Capability {
    /// `member.list`
    MemberList,
    /// `member.create`
    MemberCreate,
    /// `member.store`
    MemberStore,
    /// `member.view`
    MemberView,
    /// `member.edit`
    MemberEdit,
    /// `member.update`
    MemberUpdate,
    /// `member.delete`
    MemberDelete,
    /// `subscription.assign`
    SubscriptionAssign,
    /// `locker.assign`
    LockerAssign,
}

impl Capability {
    /// Every capability.
    pub const ALL: [Self; 9] = [
        Self::MemberList,
        Self::MemberCreate,
        Self::MemberStore,
        Self::MemberView,
        Self::MemberEdit,
        Self::MemberUpdate,
        Self::MemberDelete,
        Self::SubscriptionAssign,
        Self::LockerAssign,
    ];

    /// Permission string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MemberList => "member.list",
            Self::MemberCreate => "member.create",
            Self::MemberStore => "member.store",
            Self::MemberView => "member.view",
            Self::MemberEdit => "member.edit",
            Self::MemberUpdate => "member.update",
            Self::MemberDelete => "member.delete",
            Self::SubscriptionAssign => "subscription.assign",
            Self::LockerAssign => "locker.assign",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|cap| cap.as_str() == s)
            .ok_or_else(|| AdminError::Config(format!("unknown capability '{s}'")))
    }
}

impl TryFrom<String> for Capability {
    type Error = AdminError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Capability> for String {
    fn from(cap: Capability) -> Self {
        cap.as_str().to_owned()
    }
}

/// Authenticated back-office user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    name: String,
    capabilities: BTreeSet<Capability>,
}

impl Operator {
    /// Creates an operator from permission strings; `*` grants everything.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] for an unknown permission string.
    pub fn new<'a>(
        name: impl Into<String>,
        permissions: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self> {
        let mut capabilities = BTreeSet::new();
        for permission in permissions {
            if permission == "*" {
                capabilities.extend(Capability::ALL);
            } else {
                capabilities.insert(permission.parse()?);
            }
        }
        Ok(Self { name: name.into(), capabilities })
    }

    /// Display name used in logs.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if the operator holds `capability`.
    #[must_use]
    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Fails unless the operator holds `capability`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Forbidden`].
    pub fn require(&self, capability: Capability) -> Result<()> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(AdminError::Forbidden {
                operator: self.name.clone(),
                capability: capability.as_str().to_owned(),
            })
        }
    }
}

/// Operators keyed by bearer token.
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    operators: Vec<(SecretString, Operator)>,
}

impl OperatorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `operator` under `token`.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Config`] if the token is empty or already used.
    pub fn insert(&mut self, token: impl Into<SecretString>, operator: Operator) -> Result<()> {
        let token = token.into();
        if token.expose_secret().trim().is_empty() {
            return Err(AdminError::Config(format!(
                "operator '{}' has an empty token",
                operator.name()
            )));
        }
        if self.operators.iter().any(|(existing, _)| tokens_match(existing, token.expose_secret())) {
            return Err(AdminError::Config(format!(
                "operator '{}' reuses another operator's token",
                operator.name()
            )));
        }
        self.operators.push((token, operator));
        Ok(())
    }

    /// Resolves a bearer token to its operator.
    ///
    /// # Errors
    ///
    /// Returns [`AdminError::Unauthenticated`] for a missing or unknown token.
    pub fn authenticate(&self, token: Option<&str>) -> Result<&Operator> {
        let token = token.map(str::trim).filter(|t| !t.is_empty()).ok_or(AdminError::Unauthenticated)?;
        self.operators
            .iter()
            .find(|(candidate, _)| tokens_match(candidate, token))
            .map(|(_, operator)| operator)
            .ok_or(AdminError::Unauthenticated)
    }

    /// Number of registered operators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    /// True if no operator is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

fn tokens_match(stored: &SecretString, presented: &str) -> bool {
    bool::from(stored.expose_secret().as_bytes().ct_eq(presented.as_bytes()))
}
