use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Database
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default = "d_port")]
    pub port: u16,
    #[serde(default = "d_username")]
    pub username: String,
    /// Overridden by `SSVIRT_DB_PASSWORD` when set.
    #[serde(default)]
    pub password: String,
    #[serde(default = "d_database")]
    pub database: String,
    /// `disable` | `prefer` | `require`
    #[serde(default = "d_sslmode")]
    pub sslmode: String,
    #[serde(default = "d_max_connections")]
    pub max_connections: u32,
    #[serde(default = "d_max_idle")]
    pub max_idle: u32,
    #[serde(default = "d_conn_max_lifetime")]
    pub conn_max_lifetime_secs: u64,
    #[serde(default = "d_conn_max_idle_time")]
    pub conn_max_idle_time_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: d_host(),
            port: d_port(),
            username: d_username(),
            password: String::new(),
            database: d_database(),
            sslmode: d_sslmode(),
            max_connections: d_max_connections(),
            max_idle: d_max_idle(),
            conn_max_lifetime_secs: d_conn_max_lifetime(),
            conn_max_idle_time_secs: d_conn_max_idle_time(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_host() -> String {
    "127.0.0.1".into()
}
fn d_port() -> u16 {
    5432
}
fn d_username() -> String {
    "ssvirt".into()
}
fn d_database() -> String {
    "ssvirt".into()
}
fn d_sslmode() -> String {
    "prefer".into()
}
fn d_max_connections() -> u32 {
    16
}
fn d_max_idle() -> u32 {
    4
}
fn d_conn_max_lifetime() -> u64 {
    1800
}
fn d_conn_max_idle_time() -> u64 {
    300
}
