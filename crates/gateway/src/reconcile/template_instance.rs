//! TemplateInstance controller: when an instantiation completes, materialise
//! VM rows under the owning vApp; when it fails, mark the vApp. Instances
//! whose vApp row no longer exists are leaked cluster resources and are
//! collected here by their owner label.

use async_trait::async_trait;
use kube::runtime::watcher;
use kube::{Api, ResourceExt};
use uuid::Uuid;

use ssv_cluster::{labels, ClusterClient, TemplateInstance};
use ssv_domain::model::{VAppStatus, VmStatus};
use ssv_store::vms::NewVm;
use ssv_store::PgStore;

use super::{Action, ReconcileError, Reconciler};

pub struct TemplateInstanceController {
    pub store: PgStore,
    pub cluster: ClusterClient,
}

#[async_trait]
impl Reconciler for TemplateInstanceController {
    type Object = TemplateInstance;

    fn name(&self) -> &'static str {
        "template-instance"
    }

    fn api(&self) -> Api<TemplateInstance> {
        Api::all(self.cluster.client())
    }

    fn watch_config(&self) -> watcher::Config {
        watcher::Config::default().labels(labels::VAPP_ID_LABEL)
    }

    async fn reconcile(&self, instance: &TemplateInstance) -> Result<Action, ReconcileError> {
        let Some(namespace) = instance.namespace() else {
            return Ok(Action::done());
        };
        let name = instance.name_any();
        let raw = instance
            .labels()
            .get(labels::VAPP_ID_LABEL)
            .cloned()
            .unwrap_or_default();
        let vapp_id = Uuid::parse_str(&raw).map_err(|_| {
            ReconcileError::Terminal(format!("malformed vApp id label {raw:?}"))
        })?;

        let Some(vapp) = self.store.vapps().get(vapp_id).await? else {
            // Orphaned by a store-side delete whose cluster cleanup failed.
            tracing::info!(instance = %name, namespace, "collecting orphaned template instance");
            self.cluster
                .delete_template_instance(&namespace, &name)
                .await?;
            return Ok(Action::done());
        };

        if instance.is_failed() {
            self.store
                .vapps()
                .set_status(vapp_id, VAppStatus::FailedCreation)
                .await?;
            return Ok(Action::done());
        }
        if !instance.is_ready() {
            return Ok(Action::done());
        }

        // Ready: surface the generated VMs as rows under the vApp.
        self.store
            .vapps()
            .set_status(vapp_id, VAppStatus::Deployed)
            .await?;
        for vm_ref in instance.virtual_machine_refs() {
            let vm_namespace = vm_ref.namespace.clone().unwrap_or_else(|| namespace.clone());
            let observed = self.cluster.get_vm(&vm_namespace, &vm_ref.name).await?;
            let (status, guest_os) = match &observed {
                Some(vm) => (
                    super::vm_status::map_vm_status(vm).unwrap_or(VmStatus::PoweredOff),
                    vm.guest_os(),
                ),
                None => (VmStatus::Unresolved, None),
            };
            self.store
                .vms()
                .upsert(NewVm {
                    vapp_id,
                    name: vm_ref.name.clone(),
                    vm_name: vm_ref.name.clone(),
                    namespace: vm_namespace,
                    status,
                    cpu_count: None,
                    memory_mb: None,
                    guest_os,
                })
                .await?;
        }
        self.store
            .vapps()
            .set_status(vapp_id, VAppStatus::PoweredOff)
            .await?;
        tracing::info!(vapp = %vapp.id, instance = %name, "vApp deployed");
        Ok(Action::done())
    }
}
