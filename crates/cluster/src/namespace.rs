//! Namespace provisioning for VDCs.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{Namespace, ResourceQuota, ResourceQuotaSpec};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{DeleteParams, Patch, PatchParams, PostParams};
use kube::error::ErrorResponse;
use kube::Api;
use uuid::Uuid;

use ssv_domain::model::ComputeCapacity;
use ssv_domain::Result;

use crate::{labels, map_kube_err, ClusterClient, FIELD_MANAGER};

/// Name of the per-VDC quota object managed by the VDC controller.
pub const QUOTA_NAME: &str = "ssvirt-capacity";

fn vdc_labels(vdc_id: Uuid, org_id: Uuid) -> BTreeMap<String, String> {
    BTreeMap::from([
        (labels::VDC_ID_LABEL.to_owned(), vdc_id.to_string()),
        (labels::ORG_ID_LABEL.to_owned(), org_id.to_string()),
    ])
}

pub fn build_namespace(name: &str, vdc_id: Uuid, org_id: Uuid) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            labels: Some(vdc_labels(vdc_id, org_id)),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Quota projecting a VDC's compute capacity. Zero limits mean "unlimited"
/// and produce no quota entry.
pub fn build_resource_quota(capacity: &ComputeCapacity) -> Option<ResourceQuota> {
    let mut hard = BTreeMap::new();
    if capacity.cpu.limit > 0 {
        // CPU capacity is tracked in MHz; 1000 MHz ~ one core.
        let millis = capacity.cpu.limit;
        hard.insert("limits.cpu".to_owned(), Quantity(format!("{millis}m")));
    }
    if capacity.memory.limit > 0 {
        hard.insert(
            "limits.memory".to_owned(),
            Quantity(format!("{}Mi", capacity.memory.limit)),
        );
    }
    if hard.is_empty() {
        return None;
    }
    Some(ResourceQuota {
        metadata: ObjectMeta {
            name: Some(QUOTA_NAME.to_owned()),
            ..Default::default()
        },
        spec: Some(ResourceQuotaSpec {
            hard: Some(hard),
            ..Default::default()
        }),
        ..Default::default()
    })
}

impl ClusterClient {
    /// Idempotently create the namespace for a VDC: an existing namespace is
    /// relabelled rather than failed on.
    pub async fn ensure_namespace(&self, name: &str, vdc_id: Uuid, org_id: Uuid) -> Result<()> {
        let api: Api<Namespace> = Api::all(self.client());
        match api.get(name).await {
            Ok(_) => {
                let patch = serde_json::json!({
                    "metadata": { "labels": vdc_labels(vdc_id, org_id) }
                });
                api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
                    .await
                    .map_err(map_kube_err)?;
                Ok(())
            }
            Err(kube::Error::Api(ErrorResponse { code: 404, .. })) => {
                tracing::info!(namespace = name, "creating namespace");
                api.create(&PostParams::default(), &build_namespace(name, vdc_id, org_id))
                    .await
                    .map_err(map_kube_err)?;
                Ok(())
            }
            Err(e) => Err(map_kube_err(e)),
        }
    }

    /// Delete a VDC namespace; already gone is success.
    pub async fn delete_namespace(&self, name: &str) -> Result<()> {
        let api: Api<Namespace> = Api::all(self.client());
        match api.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ErrorResponse { code: 404, .. })) => Ok(()),
            Err(e) => Err(map_kube_err(e)),
        }
    }

    /// Apply the capacity quota inside a VDC namespace.
    pub async fn ensure_resource_quota(
        &self,
        namespace: &str,
        capacity: &ComputeCapacity,
    ) -> Result<()> {
        let Some(quota) = build_resource_quota(capacity) else {
            return Ok(());
        };
        let api: Api<ResourceQuota> = Api::namespaced(self.client(), namespace);
        api.patch(
            QUOTA_NAME,
            &PatchParams::apply(FIELD_MANAGER).force(),
            &Patch::Apply(&quota),
        )
        .await
        .map_err(map_kube_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssv_domain::model::{CapacityUnits, CapacityValue};

    fn capacity(cpu: i64, mem: i64) -> ComputeCapacity {
        ComputeCapacity {
            cpu: CapacityValue {
                allocated: cpu,
                limit: cpu,
                units: CapacityUnits::Mhz,
            },
            memory: CapacityValue {
                allocated: mem,
                limit: mem,
                units: CapacityUnits::Mb,
            },
        }
    }

    #[test]
    fn namespace_carries_owner_labels() {
        let vdc = Uuid::new_v4();
        let org = Uuid::new_v4();
        let ns = build_namespace("vdc-a-b", vdc, org);
        let labels = ns.metadata.labels.unwrap();
        assert_eq!(labels[labels::VDC_ID_LABEL], vdc.to_string());
        assert_eq!(labels[labels::ORG_ID_LABEL], org.to_string());
    }

    #[test]
    fn quota_projects_limits() {
        let quota = build_resource_quota(&capacity(4000, 8192)).unwrap();
        let hard = quota.spec.unwrap().hard.unwrap();
        assert_eq!(hard["limits.cpu"].0, "4000m");
        assert_eq!(hard["limits.memory"].0, "8192Mi");
    }

    #[test]
    fn zero_capacity_means_no_quota() {
        assert!(build_resource_quota(&capacity(0, 0)).is_none());
    }
}
