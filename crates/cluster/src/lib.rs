//! Kubernetes client layer: typed resources, label vocabulary, namespace
//! provisioning and the KubeVirt power-state surface.

pub mod labels;
pub mod names;
pub mod namespace;
pub mod quantity;
pub mod template;
pub mod templateinstance;
pub mod virtualmachine;

use kube::api::{DeleteParams, Patch, PatchParams, PostParams};
use kube::error::ErrorResponse;
use kube::{Api, Client};

use ssv_domain::{Error, Result};

pub use names::{slug, vdc_namespace_base};
pub use quantity::parse_quantity_mb;
pub use template::{Template, TemplateParameter};
pub use templateinstance::{
    TemplateInstance, TemplateInstanceCondition, TemplateInstanceObject, TemplateInstanceSpec,
    TemplateInstanceStatus,
};
pub use virtualmachine::{VirtualMachine, VirtualMachineSpec, VirtualMachineStatus};

/// Field manager recorded on server-side apply patches.
pub(crate) const FIELD_MANAGER: &str = "ssvirt";

/// Shared, clone-cheap handle to the cluster.
#[derive(Clone)]
pub struct ClusterClient {
    client: Client,
}

impl ClusterClient {
    /// Infer configuration from the environment (in-cluster service account
    /// or local kubeconfig).
    pub async fn connect() -> Result<ClusterClient> {
        let client = Client::try_default().await.map_err(map_kube_err)?;
        Ok(ClusterClient { client })
    }

    pub fn from_client(client: Client) -> ClusterClient {
        ClusterClient { client }
    }

    pub fn client(&self) -> Client {
        self.client.clone()
    }

    /// Readiness check: ask the apiserver for its version.
    pub async fn ping(&self) -> Result<()> {
        self.client
            .apiserver_version()
            .await
            .map(|_| ())
            .map_err(map_kube_err)
    }

    // ── Templates ───────────────────────────────────────────────────

    pub async fn get_template(&self, name: &str) -> Result<Option<Template>> {
        let api: Api<Template> = Api::all(self.client.clone());
        match api.get(name).await {
            Ok(t) => Ok(Some(t)),
            Err(kube::Error::Api(ErrorResponse { code: 404, .. })) => Ok(None),
            Err(e) => Err(map_kube_err(e)),
        }
    }

    pub async fn list_templates(&self) -> Result<Vec<Template>> {
        let api: Api<Template> = Api::all(self.client.clone());
        let list = api
            .list(&kube::api::ListParams::default())
            .await
            .map_err(map_kube_err)?;
        Ok(list.items)
    }

    // ── TemplateInstances ───────────────────────────────────────────

    pub async fn create_template_instance(
        &self,
        namespace: &str,
        instance: &TemplateInstance,
    ) -> Result<TemplateInstance> {
        let api: Api<TemplateInstance> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), instance)
            .await
            .map_err(map_kube_err)
    }

    /// Delete the backing instance; a missing resource is not an error.
    pub async fn delete_template_instance(&self, namespace: &str, name: &str) -> Result<()> {
        let api: Api<TemplateInstance> = Api::namespaced(self.client.clone(), namespace);
        match api.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ErrorResponse { code: 404, .. })) => Ok(()),
            Err(e) => Err(map_kube_err(e)),
        }
    }

    // ── VirtualMachines ─────────────────────────────────────────────

    pub async fn get_vm(&self, namespace: &str, name: &str) -> Result<Option<VirtualMachine>> {
        let api: Api<VirtualMachine> = Api::namespaced(self.client.clone(), namespace);
        match api.get(name).await {
            Ok(vm) => Ok(Some(vm)),
            Err(kube::Error::Api(ErrorResponse { code: 404, .. })) => Ok(None),
            Err(e) => Err(map_kube_err(e)),
        }
    }

    /// Flip `spec.running`; the KubeVirt controller does the rest.
    pub async fn set_vm_running(&self, namespace: &str, name: &str, running: bool) -> Result<()> {
        let api: Api<VirtualMachine> = Api::namespaced(self.client.clone(), namespace);
        let patch = serde_json::json!({ "spec": { "running": running } });
        api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(map_kube_err)?;
        Ok(())
    }

    /// Set or clear the suspend marker annotation.
    pub async fn set_vm_suspended(
        &self,
        namespace: &str,
        name: &str,
        suspended: bool,
    ) -> Result<()> {
        let api: Api<VirtualMachine> = Api::namespaced(self.client.clone(), namespace);
        let value = if suspended {
            serde_json::Value::String("suspended".into())
        } else {
            serde_json::Value::Null
        };
        let patch = serde_json::json!({
            "metadata": { "annotations": { labels::SUSPEND_STATUS_ANNOTATION: value } }
        });
        api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(map_kube_err)?;
        Ok(())
    }
}

/// Map a kube error into the domain error space, preserving NotFound.
pub fn map_kube_err(e: kube::Error) -> Error {
    match e {
        kube::Error::Api(ErrorResponse { code: 404, .. }) => Error::not_found("cluster resource"),
        other => Error::Kubernetes(other.to_string()),
    }
}

/// Whether a Kubernetes failure is worth retrying (timeouts, conflicts,
/// server-side 5xx) as opposed to a terminal rejection.
pub fn is_retriable(e: &kube::Error) -> bool {
    match e {
        kube::Error::Api(ErrorResponse { code, .. }) => {
            matches!(code, 409 | 429 | 500 | 503 | 504)
        }
        kube::Error::HyperError(_) | kube::Error::Service(_) => true,
        _ => false,
    }
}
