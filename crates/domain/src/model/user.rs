use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Role;
use crate::urn::Urn;

/// A user account. The password hash never leaves the store layer; this is
/// the API-visible shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Urn,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_org_id: Option<Urn>,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn has_role(&self, name: crate::model::RoleName) -> bool {
        self.roles.iter().any(|r| r.name == name)
    }
}
