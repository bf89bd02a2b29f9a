//! VM-status controller: translates observed KubeVirt state into VM and
//! vApp rows. Writes are idempotent and skipped when nothing changed.

use async_trait::async_trait;
use kube::{Api, ResourceExt};

use ssv_cluster::{ClusterClient, VirtualMachine};
use ssv_domain::model::{VAppStatus, VmStatus};
use ssv_store::PgStore;

use super::{Action, ReconcileError, Reconciler};

/// The observed-state translation table. `None` means "no opinion" (e.g. a
/// VM that is requested running but not ready yet keeps its stored status).
pub fn map_vm_status(vm: &VirtualMachine) -> Option<VmStatus> {
    if vm.is_deleting() {
        return Some(VmStatus::Unresolved);
    }
    if vm.is_running() {
        return vm.is_ready().then_some(VmStatus::PoweredOn);
    }
    if vm.is_marked_suspended() {
        return Some(VmStatus::Suspended);
    }
    Some(VmStatus::PoweredOff)
}

/// Roll member VM statuses up into a vApp status. Only meaningful once the
/// vApp has left its creation states.
pub fn aggregate_vapp_status(vms: &[VmStatus]) -> Option<VAppStatus> {
    if vms.is_empty() {
        return None;
    }
    if vms.iter().any(|s| *s == VmStatus::PoweredOn) {
        Some(VAppStatus::PoweredOn)
    } else if vms.iter().any(|s| *s == VmStatus::Suspended) {
        Some(VAppStatus::Suspended)
    } else if vms.iter().all(|s| *s == VmStatus::PoweredOff) {
        Some(VAppStatus::PoweredOff)
    } else {
        Some(VAppStatus::Unresolved)
    }
}

pub struct VmStatusController {
    pub store: PgStore,
    pub cluster: ClusterClient,
}

#[async_trait]
impl Reconciler for VmStatusController {
    type Object = VirtualMachine;

    fn name(&self) -> &'static str {
        "vm-status"
    }

    fn api(&self) -> Api<VirtualMachine> {
        Api::all(self.cluster.client())
    }

    async fn reconcile(&self, vm: &VirtualMachine) -> Result<Action, ReconcileError> {
        let Some(namespace) = vm.namespace() else {
            return Ok(Action::done());
        };
        let name = vm.name_any();
        let Some(row) = self
            .store
            .vms()
            .find_by_cluster_name(&namespace, &name)
            .await?
        else {
            // Not one of ours (yet); the TemplateInstance controller
            // materialises rows before this controller cares.
            return Ok(Action::done());
        };
        let Some(observed) = map_vm_status(vm) else {
            return Ok(Action::done());
        };
        let changed = self.store.vms().set_status(row.id.id, observed).await?;
        if changed {
            tracing::debug!(vm = %row.id, status = observed.as_str(), "VM status updated");
        }

        // Roll up into the owning vApp.
        if let Some(vapp) = self.store.vapps().get(row.vapp_id.id).await? {
            if !matches!(
                vapp.status,
                VAppStatus::Instantiating | VAppStatus::FailedCreation
            ) {
                let statuses: Vec<VmStatus> = self
                    .store
                    .vms()
                    .list_by_vapp(vapp.id.id)
                    .await?
                    .iter()
                    .map(|v| v.status)
                    .collect();
                if let Some(rollup) = aggregate_vapp_status(&statuses) {
                    self.store.vapps().set_status(vapp.id.id, rollup).await?;
                }
            }
        }
        Ok(Action::done())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
    use ssv_cluster::{labels, VirtualMachineSpec, VirtualMachineStatus};
    use std::collections::BTreeMap;

    fn vm(running: bool, ready: bool, suspended: bool, deleting: bool) -> VirtualMachine {
        let mut vm = VirtualMachine::new(
            "vm-0",
            VirtualMachineSpec {
                running: Some(running),
                template: None,
            },
        );
        vm.status = Some(VirtualMachineStatus {
            ready,
            printable_status: None,
        });
        let mut meta = ObjectMeta::default();
        if suspended {
            meta.annotations = Some(BTreeMap::from([(
                labels::SUSPEND_STATUS_ANNOTATION.to_owned(),
                "suspended".to_owned(),
            )]));
        }
        if deleting {
            meta.deletion_timestamp = Some(Time(chrono::Utc::now()));
        }
        meta.name = Some("vm-0".into());
        vm.metadata = meta;
        vm
    }

    #[test]
    fn translation_table() {
        assert_eq!(map_vm_status(&vm(true, true, false, false)), Some(VmStatus::PoweredOn));
        assert_eq!(map_vm_status(&vm(false, false, true, false)), Some(VmStatus::Suspended));
        assert_eq!(map_vm_status(&vm(false, false, false, false)), Some(VmStatus::PoweredOff));
        assert_eq!(map_vm_status(&vm(true, true, false, true)), Some(VmStatus::Unresolved));
        // Requested running but not ready yet: no opinion.
        assert_eq!(map_vm_status(&vm(true, false, false, false)), None);
    }

    #[test]
    fn rollup_prefers_powered_on() {
        use VmStatus::*;
        assert_eq!(
            aggregate_vapp_status(&[PoweredOn, PoweredOff]),
            Some(VAppStatus::PoweredOn)
        );
        assert_eq!(
            aggregate_vapp_status(&[Suspended, PoweredOff]),
            Some(VAppStatus::Suspended)
        );
        assert_eq!(
            aggregate_vapp_status(&[PoweredOff, PoweredOff]),
            Some(VAppStatus::PoweredOff)
        );
        assert_eq!(
            aggregate_vapp_status(&[Unresolved, PoweredOff]),
            Some(VAppStatus::Unresolved)
        );
        assert_eq!(aggregate_vapp_status(&[]), None);
    }
}
