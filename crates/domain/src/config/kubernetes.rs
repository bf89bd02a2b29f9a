use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Kubernetes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KubernetesConfig {
    /// Home namespace for the controller lease and other operator-owned
    /// objects. Tenant namespaces are derived per VDC, not configured.
    #[serde(default = "d_namespace")]
    pub namespace: String,
    /// Take part in leader election before reconciling.
    #[serde(default = "d_leader_election")]
    pub leader_election: bool,
    /// Template-cache staleness bound in milliseconds.
    #[serde(default = "d_template_staleness")]
    pub template_staleness_ms: u64,
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            namespace: d_namespace(),
            leader_election: d_leader_election(),
            template_staleness_ms: d_template_staleness(),
        }
    }
}

fn d_namespace() -> String {
    "ssvirt-system".into()
}
fn d_leader_election() -> bool {
    true
}
fn d_template_staleness() -> u64 {
    30_000
}
