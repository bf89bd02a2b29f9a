use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session presentation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    #[serde(default = "d_idle_timeout")]
    pub idle_timeout_minutes: u32,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default = "d_location")]
    pub location: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: d_idle_timeout(),
            site: SiteConfig::default(),
            location: d_location(),
        }
    }
}

/// Site identity reported in session payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    #[serde(default = "d_site_name")]
    pub name: String,
    /// `urn:vcloud:site:<uuid>`; a random one is generated when empty.
    #[serde(default)]
    pub id: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: d_site_name(),
            id: String::new(),
        }
    }
}

fn d_idle_timeout() -> u32 {
    30
}
fn d_location() -> String {
    "us-east".into()
}
fn d_site_name() -> String {
    "ssvirt".into()
}
