//! VM power transitions.

use uuid::Uuid;

use ssv_domain::model::{PowerAction, Vm};
use ssv_domain::{Error, Result};

use super::Orchestrator;

impl Orchestrator {
    /// Validate the transition, patch the KubeVirt object, then write the
    /// resulting status optimistically. The VM-status reconciler corrects
    /// the row if KubeVirt rejects the change.
    pub async fn power_action(&self, vm_id: Uuid, action: PowerAction) -> Result<Vm> {
        let vm = self
            .store
            .vms()
            .get(vm_id)
            .await?
            .ok_or_else(|| Error::not_found("VM"))?;
        let next = action.apply(vm.status)?;

        let cluster = self.cluster()?;
        match action {
            PowerAction::PowerOn => {
                cluster.set_vm_suspended(&vm.namespace, &vm.vm_name, false).await?;
                cluster.set_vm_running(&vm.namespace, &vm.vm_name, true).await?;
            }
            PowerAction::PowerOff => {
                cluster.set_vm_suspended(&vm.namespace, &vm.vm_name, false).await?;
                cluster.set_vm_running(&vm.namespace, &vm.vm_name, false).await?;
            }
            PowerAction::Suspend => {
                cluster.set_vm_suspended(&vm.namespace, &vm.vm_name, true).await?;
                cluster.set_vm_running(&vm.namespace, &vm.vm_name, false).await?;
            }
            PowerAction::Reset => {
                cluster.set_vm_running(&vm.namespace, &vm.vm_name, false).await?;
                cluster.set_vm_running(&vm.namespace, &vm.vm_name, true).await?;
            }
        }

        self.store.vms().set_status(vm_id, next).await?;
        Ok(Vm { status: next, ..vm })
    }
}
