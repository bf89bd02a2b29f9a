//! The static, read-only role set. Roles have no runtime CRUD; their ids are
//! derived deterministically so every replica and every boot agrees on them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::urn::{Urn, UrnKind};

/// Namespace uuid for deriving the built-in role ids (v5).
const ROLE_NAMESPACE: Uuid = Uuid::from_bytes([
    0x5f, 0x2b, 0x8e, 0x11, 0x9c, 0x41, 0x4d, 0xe0, 0xb6, 0x3a, 0x70, 0x24, 0x51, 0x8a, 0xc0, 0x19,
]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleName {
    #[serde(rename = "System Administrator")]
    SystemAdministrator,
    #[serde(rename = "Organization Administrator")]
    OrganizationAdministrator,
    #[serde(rename = "vApp Author")]
    VAppAuthor,
    #[serde(rename = "vApp User")]
    VAppUser,
    #[serde(rename = "Catalog Author")]
    CatalogAuthor,
}

impl RoleName {
    pub const ALL: [RoleName; 5] = [
        RoleName::SystemAdministrator,
        RoleName::OrganizationAdministrator,
        RoleName::VAppAuthor,
        RoleName::VAppUser,
        RoleName::CatalogAuthor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::SystemAdministrator => "System Administrator",
            RoleName::OrganizationAdministrator => "Organization Administrator",
            RoleName::VAppAuthor => "vApp Author",
            RoleName::VAppUser => "vApp User",
            RoleName::CatalogAuthor => "Catalog Author",
        }
    }

    pub fn parse(s: &str) -> Option<RoleName> {
        RoleName::ALL.iter().copied().find(|r| r.as_str() == s)
    }

    /// Deterministic URN for this role.
    pub fn urn(&self) -> Urn {
        Urn::of(
            UrnKind::Role,
            Uuid::new_v5(&ROLE_NAMESPACE, self.as_str().as_bytes()),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: Urn,
    pub name: RoleName,
    pub read_only: bool,
}

impl Role {
    pub fn builtin(name: RoleName) -> Role {
        Role {
            id: name.urn(),
            name,
            read_only: true,
        }
    }

    pub fn all_builtin() -> Vec<Role> {
        RoleName::ALL.iter().map(|n| Role::builtin(*n)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ids_are_stable() {
        assert_eq!(
            RoleName::SystemAdministrator.urn(),
            RoleName::SystemAdministrator.urn()
        );
        let ids: std::collections::HashSet<_> =
            RoleName::ALL.iter().map(|r| r.urn()).collect();
        assert_eq!(ids.len(), RoleName::ALL.len());
    }

    #[test]
    fn role_names_roundtrip() {
        for role in RoleName::ALL {
            assert_eq!(RoleName::parse(role.as_str()), Some(role));
        }
        assert_eq!(RoleName::parse("Root"), None);
    }

    #[test]
    fn serde_uses_display_names() {
        let json = serde_json::to_string(&RoleName::VAppAuthor).unwrap();
        assert_eq!(json, "\"vApp Author\"");
    }
}
