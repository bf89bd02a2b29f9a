use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// API listener
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    #[serde(default = "d_port")]
    pub port: u16,
    #[serde(default = "d_bind")]
    pub bind: String,
    /// Paths to the TLS certificate/key pair. When empty, the listener is
    /// plain HTTP and TLS termination happens upstream.
    #[serde(default)]
    pub tls_cert: String,
    #[serde(default)]
    pub tls_key: String,
    /// Per-request timeout for handler I/O.
    #[serde(default = "d_request_timeout")]
    pub request_timeout_secs: u64,
    /// Drain window during graceful shutdown.
    #[serde(default = "d_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: d_port(),
            bind: d_bind(),
            tls_cert: String::new(),
            tls_key: String::new(),
            request_timeout_secs: d_request_timeout(),
            shutdown_grace_secs: d_shutdown_grace(),
        }
    }
}

fn d_port() -> u16 {
    8443
}
fn d_bind() -> String {
    "0.0.0.0".into()
}
fn d_request_timeout() -> u64 {
    15
}
fn d_shutdown_grace() -> u64 {
    30
}
