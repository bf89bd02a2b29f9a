//! The KubeVirt `VirtualMachine` resource, reduced to the fields the control
//! plane reads and writes.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::labels;

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    group = "kubevirt.io",
    version = "v1",
    kind = "VirtualMachine",
    namespaced,
    status = "VirtualMachineStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineSpec {
    /// Desired power state; the KubeVirt controller converges on it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,
    /// Pod template and domain config, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<serde_json::Value>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineStatus {
    #[serde(default)]
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub printable_status: Option<String>,
}

impl VirtualMachine {
    pub fn is_running(&self) -> bool {
        self.spec.running.unwrap_or(false)
    }

    pub fn is_ready(&self) -> bool {
        self.status.as_ref().map(|s| s.ready).unwrap_or(false)
    }

    pub fn is_marked_suspended(&self) -> bool {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(labels::SUSPEND_STATUS_ANNOTATION))
            .map(|v| v == "suspended")
            .unwrap_or(false)
    }

    pub fn is_deleting(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// Guest OS hint from the KubeVirt convention annotation, if present.
    pub fn guest_os(&self) -> Option<String> {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get("vm.kubevirt.io/os"))
            .cloned()
    }
}
