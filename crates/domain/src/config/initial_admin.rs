use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Initial admin seeding
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InitialAdminConfig {
    #[serde(default = "d_enabled")]
    pub enabled: bool,
    #[serde(default = "d_username")]
    pub username: String,
    /// Overridden by `SSVIRT_ADMIN_PASSWORD` when set.
    #[serde(default)]
    pub password: String,
    #[serde(default = "d_email")]
    pub email: String,
    #[serde(default = "d_full_name")]
    pub full_name: String,
}

impl Default for InitialAdminConfig {
    fn default() -> Self {
        Self {
            enabled: d_enabled(),
            username: d_username(),
            password: String::new(),
            email: d_email(),
            full_name: d_full_name(),
        }
    }
}

fn d_enabled() -> bool {
    true
}
fn d_username() -> String {
    "admin".into()
}
fn d_email() -> String {
    "admin@example.com".into()
}
fn d_full_name() -> String {
    "System Administrator".into()
}
