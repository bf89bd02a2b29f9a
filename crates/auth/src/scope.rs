//! Effective authorization scope derived from a user's roles.

use ssv_domain::model::{RoleName, User};
use ssv_domain::{Error, Result, Urn};

/// The three effective scopes. Repository listings filter on this before
/// pagination; direct fetches outside scope surface as NotFound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Global visibility and all admin endpoints.
    SystemAdmin,
    /// Visibility limited to the org and its descendants; may manage VDCs
    /// through the admin path.
    OrgAdmin(Urn),
    /// Read and mutate within the org only.
    OrgMember(Urn),
}

impl Scope {
    /// Derive the effective scope from roles + primary org. A user with no
    /// org-bound role and no System Administrator role has no scope at all.
    pub fn for_user(user: &User) -> Result<Scope> {
        if user.has_role(RoleName::SystemAdministrator) {
            return Ok(Scope::SystemAdmin);
        }
        let org = user.primary_org_id.ok_or_else(|| {
            Error::Forbidden(format!("user {} has no primary organization", user.username))
        })?;
        if user.has_role(RoleName::OrganizationAdministrator) {
            Ok(Scope::OrgAdmin(org))
        } else {
            Ok(Scope::OrgMember(org))
        }
    }

    pub fn is_system_admin(&self) -> bool {
        matches!(self, Scope::SystemAdmin)
    }

    /// The org this scope is confined to, if any.
    pub fn org(&self) -> Option<Urn> {
        match self {
            Scope::SystemAdmin => None,
            Scope::OrgAdmin(org) | Scope::OrgMember(org) => Some(*org),
        }
    }

    /// Whether the scope can see resources owned by `org`.
    pub fn can_see_org(&self, org: Urn) -> bool {
        match self {
            Scope::SystemAdmin => true,
            Scope::OrgAdmin(own) | Scope::OrgMember(own) => *own == org,
        }
    }

    /// Whether the scope may use the admin VDC-management path for `org`.
    pub fn can_admin_vdcs(&self, org: Urn) -> bool {
        match self {
            Scope::SystemAdmin => true,
            Scope::OrgAdmin(own) => *own == org,
            Scope::OrgMember(_) => false,
        }
    }

    /// Whether the scope may create/delete orgs, users and roles.
    pub fn can_admin_system(&self) -> bool {
        self.is_system_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ssv_domain::model::Role;
    use ssv_domain::UrnKind;

    fn user_with(roles: Vec<RoleName>, org: Option<Urn>) -> User {
        User {
            id: Urn::random(UrnKind::User),
            username: "u".into(),
            full_name: String::new(),
            email: String::new(),
            enabled: true,
            primary_org_id: org,
            roles: roles.into_iter().map(Role::builtin).collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn system_admin_wins_over_org_roles() {
        let org = Urn::random(UrnKind::Org);
        let user = user_with(
            vec![RoleName::SystemAdministrator, RoleName::VAppUser],
            Some(org),
        );
        assert_eq!(Scope::for_user(&user).unwrap(), Scope::SystemAdmin);
    }

    #[test]
    fn org_admin_is_confined_to_its_org() {
        let org = Urn::random(UrnKind::Org);
        let other = Urn::random(UrnKind::Org);
        let user = user_with(vec![RoleName::OrganizationAdministrator], Some(org));
        let scope = Scope::for_user(&user).unwrap();
        assert_eq!(scope, Scope::OrgAdmin(org));
        assert!(scope.can_see_org(org));
        assert!(!scope.can_see_org(other));
        assert!(scope.can_admin_vdcs(org));
        assert!(!scope.can_admin_vdcs(other));
        assert!(!scope.can_admin_system());
    }

    #[test]
    fn member_cannot_use_admin_path() {
        let org = Urn::random(UrnKind::Org);
        let user = user_with(vec![RoleName::VAppAuthor], Some(org));
        let scope = Scope::for_user(&user).unwrap();
        assert_eq!(scope, Scope::OrgMember(org));
        assert!(!scope.can_admin_vdcs(org));
    }

    #[test]
    fn orgless_tenant_user_is_rejected() {
        let user = user_with(vec![RoleName::VAppUser], None);
        assert!(Scope::for_user(&user).is_err());
    }
}
