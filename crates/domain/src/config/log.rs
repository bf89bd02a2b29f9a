use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Logging
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// tracing env-filter directive, e.g. `info` or `info,ssv_gateway=debug`.
    #[serde(default = "d_level")]
    pub level: String,
    /// `text` | `json`
    #[serde(default = "d_format")]
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: d_level(),
            format: d_format(),
        }
    }
}

fn d_level() -> String {
    "info".into()
}
fn d_format() -> String {
    "text".into()
}
