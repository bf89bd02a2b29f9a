//! VDC controller: watches namespaces labelled with a VDC id, keeps labels
//! and the capacity quota in place, and reflects namespace lifecycle into
//! the VDC row.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use kube::runtime::watcher;
use kube::{Api, ResourceExt};
use uuid::Uuid;

use ssv_cluster::{labels, ClusterClient};
use ssv_domain::model::VdcStatus;
use ssv_store::PgStore;

use super::{Action, ReconcileError, Reconciler};

pub struct VdcController {
    pub store: PgStore,
    pub cluster: ClusterClient,
}

#[async_trait]
impl Reconciler for VdcController {
    type Object = Namespace;

    fn name(&self) -> &'static str {
        "vdc"
    }

    fn api(&self) -> Api<Namespace> {
        Api::all(self.cluster.client())
    }

    fn watch_config(&self) -> watcher::Config {
        watcher::Config::default().labels(labels::VDC_ID_LABEL)
    }

    async fn reconcile(&self, ns: &Namespace) -> Result<Action, ReconcileError> {
        let name = ns.name_any();
        let raw = ns
            .labels()
            .get(labels::VDC_ID_LABEL)
            .cloned()
            .unwrap_or_default();
        let vdc_id = Uuid::parse_str(&raw).map_err(|_| {
            ReconcileError::Terminal(format!("malformed VDC id label {raw:?}"))
        })?;

        let Some(vdc) = self.store.vdcs().get(vdc_id).await? else {
            // The VDC row is gone (soft-deleted); namespace deletion is
            // driven by the orchestrator, nothing to converge here.
            return Ok(Action::done());
        };
        if vdc.namespace != name {
            return Err(ReconcileError::Terminal(format!(
                "namespace label points at VDC {} whose namespace is {:?}",
                vdc.id, vdc.namespace
            )));
        }

        if ns.metadata.deletion_timestamp.is_some() {
            // Namespace removed out-of-band while the VDC is live.
            self.store.vdcs().set_status(vdc_id, VdcStatus::Failed).await?;
            return Ok(Action::done());
        }

        self.cluster
            .ensure_namespace(&name, vdc_id, vdc.org_id.id)
            .await?;
        self.cluster
            .ensure_resource_quota(&name, &vdc.compute_capacity)
            .await?;
        self.store.vdcs().set_status(vdc_id, VdcStatus::Ready).await?;
        Ok(Action::done())
    }
}
