//! Template instantiation (vApp creation) and vApp deletion.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use uuid::Uuid;

use ssv_cluster::labels;
use ssv_cluster::{TemplateInstance, TemplateInstanceSpec};
use ssv_domain::model::{VApp, VAppStatus};
use ssv_domain::{CatalogItemId, Error, Result};
use ssv_store::vapps::NewVApp;

use super::Orchestrator;

/// Validated instantiate-template input.
#[derive(Debug, Clone)]
pub struct InstantiateTemplateSpec {
    pub name: String,
    pub description: String,
    pub catalog_item: CatalogItemId,
}

impl Orchestrator {
    /// Create a vApp from a catalog item: row first (INSTANTIATING), then a
    /// `TemplateInstance` in the VDC's namespace. If the cluster write fails
    /// the row is kept in FAILED_CREATION so the caller can read the failure.
    pub async fn instantiate_template(
        &self,
        vdc_id: Uuid,
        spec: InstantiateTemplateSpec,
    ) -> Result<VApp> {
        let vdc = self
            .store
            .vdcs()
            .get(vdc_id)
            .await?
            .ok_or_else(|| Error::not_found("VDC"))?;
        if !vdc.is_enabled {
            return Err(Error::conflict("VDC is disabled"));
        }
        if self.store.vapps().name_in_use(vdc_id, &spec.name).await? {
            return Err(Error::conflict(format!(
                "a vApp named {:?} already exists in this VDC",
                spec.name
            )));
        }
        let catalog = self
            .store
            .catalogs()
            .get(spec.catalog_item.catalog)
            .await?
            .ok_or_else(|| Error::not_found("catalog"))?;
        let template = self
            .templates
            .get_template(catalog.id.id, &spec.catalog_item.template)
            .await?
            .ok_or_else(|| Error::not_found("catalog item"))?;

        let vapp = self
            .store
            .vapps()
            .create(NewVApp {
                vdc_id,
                name: spec.name.clone(),
                description: spec.description.clone(),
                template_ref: spec.catalog_item.clone(),
            })
            .await?;

        let instance = TemplateInstance {
            metadata: ObjectMeta {
                name: Some(vapp.name.clone()),
                namespace: Some(vdc.namespace.clone()),
                labels: Some(BTreeMap::from([(
                    labels::VAPP_ID_LABEL.to_owned(),
                    vapp.id.id.to_string(),
                )])),
                ..Default::default()
            },
            spec: TemplateInstanceSpec {
                template: serde_json::to_value(&template)
                    .map_err(|e| Error::Kubernetes(format!("encoding template: {e}")))?,
            },
            status: None,
        };

        let created = match self.cluster() {
            Ok(cluster) => {
                cluster
                    .create_template_instance(&vdc.namespace, &instance)
                    .await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = created {
            tracing::error!(vapp = %vapp.id, error = %e, "template instantiation failed");
            self.store
                .vapps()
                .set_status(vapp.id.id, VAppStatus::FailedCreation)
                .await?;
            return Ok(VApp {
                status: VAppStatus::FailedCreation,
                ..vapp
            });
        }
        Ok(vapp)
    }

    /// Delete a vApp. Without `force`, refused while any member VM is
    /// powered on. Cluster cleanup failures are logged and swallowed: the
    /// store is authoritative for API identity, and leaked objects are
    /// collected by the reconciler sweep on the owner label.
    pub async fn delete_vapp(&self, id: Uuid, force: bool) -> Result<()> {
        let vapp = self
            .store
            .vapps()
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("vApp"))?;
        if !force && self.store.vapps().any_vm_powered_on(id).await? {
            return Err(Error::Precondition(
                "vApp has running VMs; power them off or pass force=true".into(),
            ));
        }

        if let Ok(cluster) = self.cluster() {
            if let Some(vdc) = self.store.vdcs().get(vapp.vdc_id.id).await? {
                if let Err(e) = cluster
                    .delete_template_instance(&vdc.namespace, &vapp.name)
                    .await
                {
                    tracing::warn!(vapp = %vapp.id, error = %e, "template instance deletion failed");
                }
            }
        }

        self.store.vapps().soft_delete_cascade(id).await
    }
}
