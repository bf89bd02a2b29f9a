use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Auth
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// HMAC secret for session tokens. Overridden by `SSVIRT_JWT_SECRET`.
    /// Required in the production profile.
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "d_token_expiry")]
    pub token_expiry_minutes: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_expiry_minutes: d_token_expiry(),
        }
    }
}

fn d_token_expiry() -> u32 {
    60
}
