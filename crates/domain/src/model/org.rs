use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::urn::Urn;

/// Tenant organization; parent of users, VDCs and catalogs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: Urn,
    /// Unique, DNS-safe short name.
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub is_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// DNS-safe name check applied on create/update: ASCII letters, digits
    /// and hyphens, must not start or end with a hyphen. Case is preserved
    /// here; namespace derivation lowercases separately.
    pub fn name_is_dns_safe(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= 63
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
            && !name.starts_with('-')
            && !name.ends_with('-')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dns_safety() {
        assert!(Organization::name_is_dns_safe("test-org"));
        assert!(Organization::name_is_dns_safe("TestOrg"));
        assert!(Organization::name_is_dns_safe("a1"));
        assert!(!Organization::name_is_dns_safe(""));
        assert!(!Organization::name_is_dns_safe("-leading"));
        assert!(!Organization::name_is_dns_safe("trailing-"));
        assert!(!Organization::name_is_dns_safe("dot.ted"));
        assert!(!Organization::name_is_dns_safe("spa ced"));
    }
}
