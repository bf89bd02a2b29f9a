//! VDC creation and deletion.

use uuid::Uuid;

use ssv_cluster::vdc_namespace_base;
use ssv_domain::model::{AllocationModel, ComputeCapacity, Vdc, VdcStatus};
use ssv_domain::{Error, Result};
use ssv_store::vdcs::NewVdc;

use super::Orchestrator;

/// Validated input for VDC creation; handlers build this from their DTOs.
#[derive(Debug, Clone)]
pub struct VdcSpec {
    pub name: String,
    pub description: String,
    pub allocation_model: AllocationModel,
    pub compute_capacity: ComputeCapacity,
    pub provider_vdc_name: String,
    pub nic_quota: i32,
    pub network_quota: i32,
    pub is_thin_provision: bool,
    pub is_enabled: bool,
}

impl Orchestrator {
    /// Create a VDC: persist the row, then provision its namespace. A
    /// terminal provisioning failure marks the row FAILED; transient ones
    /// are left for the reconciler to converge.
    pub async fn create_vdc(&self, org_id: Uuid, spec: VdcSpec) -> Result<Vdc> {
        let org = self
            .store
            .orgs()
            .get(org_id)
            .await?
            .ok_or_else(|| Error::not_found("organization"))?;
        if !org.is_enabled {
            return Err(Error::conflict("organization is disabled"));
        }

        let namespace = self.free_namespace(&org.name, &spec.name).await?;
        let vdc = self
            .store
            .vdcs()
            .create(NewVdc {
                org_id,
                name: spec.name,
                description: spec.description,
                allocation_model: spec.allocation_model,
                compute_capacity: spec.compute_capacity,
                provider_vdc_name: spec.provider_vdc_name,
                nic_quota: spec.nic_quota,
                network_quota: spec.network_quota,
                is_thin_provision: spec.is_thin_provision,
                is_enabled: spec.is_enabled,
                namespace: namespace.clone(),
            })
            .await?;

        match self.provision_namespace(&vdc, org_id).await {
            Ok(()) => Ok(vdc),
            Err(ProvisionFailure::Terminal(detail)) => {
                tracing::error!(vdc = %vdc.id, namespace, detail, "namespace provisioning failed");
                self.store.vdcs().set_status(vdc.id.id, VdcStatus::Failed).await?;
                Ok(Vdc {
                    status: VdcStatus::Failed,
                    ..vdc
                })
            }
            Err(ProvisionFailure::Transient(detail)) => {
                // The VDC controller retries from the namespace watch.
                tracing::warn!(vdc = %vdc.id, namespace, detail, "namespace provisioning deferred");
                Ok(vdc)
            }
        }
    }

    /// Soft-delete a VDC. Refused while any live vApp references it; the
    /// namespace is deleted asynchronously and failures do not block the API.
    pub async fn delete_vdc(&self, id: Uuid) -> Result<()> {
        let vdc = self
            .store
            .vdcs()
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("VDC"))?;
        if self.store.vdcs().count_live_vapps(id).await? > 0 {
            return Err(Error::conflict("VDC still contains vApps"));
        }
        self.store.vdcs().soft_delete(id).await?;

        if let Some(cluster) = self.cluster.clone() {
            let namespace = vdc.namespace.clone();
            tokio::spawn(async move {
                if let Err(e) = cluster.delete_namespace(&namespace).await {
                    tracing::warn!(namespace, error = %e, "namespace deletion failed; reconciler will retry");
                }
            });
        }
        Ok(())
    }

    /// First free namespace name: the base, then `-1`, `-2`, ... probing
    /// against live VDC rows only, so a soft-deleted VDC frees its name.
    async fn free_namespace(&self, org_name: &str, vdc_name: &str) -> Result<String> {
        let base = vdc_namespace_base(org_name, vdc_name);
        if !self.store.vdcs().namespace_in_use(&base).await? {
            return Ok(base);
        }
        for n in 1.. {
            let candidate = format!("{base}-{n}");
            if !self.store.vdcs().namespace_in_use(&candidate).await? {
                return Ok(candidate);
            }
        }
        unreachable!()
    }

    async fn provision_namespace(&self, vdc: &Vdc, org_id: Uuid) -> std::result::Result<(), ProvisionFailure> {
        let cluster = match &self.cluster {
            Some(c) => c,
            None => {
                return Err(ProvisionFailure::Transient(
                    "no cluster client configured".into(),
                ))
            }
        };
        cluster
            .ensure_namespace(&vdc.namespace, vdc.id.id, org_id)
            .await
            .map_err(|e| match e {
                Error::Kubernetes(detail) if looks_transient(&detail) => {
                    ProvisionFailure::Transient(detail)
                }
                other => ProvisionFailure::Terminal(other.to_string()),
            })
    }
}

enum ProvisionFailure {
    Terminal(String),
    Transient(String),
}

fn looks_transient(detail: &str) -> bool {
    detail.contains("timed out")
        || detail.contains("connection")
        || detail.contains("429")
        || detail.contains("503")
}
