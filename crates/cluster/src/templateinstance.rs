//! The OpenShift `TemplateInstance` resource.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Spec of a TemplateInstance: the template to realise, embedded verbatim.
#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    group = "template.openshift.io",
    version = "v1",
    kind = "TemplateInstance",
    namespaced,
    status = "TemplateInstanceStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInstanceSpec {
    pub template: serde_json::Value,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInstanceStatus {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<TemplateInstanceCondition>,
    /// References to the objects created from the template.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<TemplateInstanceObject>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInstanceCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInstanceObject {
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub object_ref: Option<ObjectRef>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRef {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl TemplateInstance {
    /// Whether the instantiation finished successfully.
    pub fn is_ready(&self) -> bool {
        self.condition_status("Ready") == Some(true)
    }

    /// Whether the instantiation failed terminally.
    pub fn is_failed(&self) -> bool {
        self.condition_status("InstantiateFailure") == Some(true)
    }

    fn condition_status(&self, condition_type: &str) -> Option<bool> {
        self.status
            .as_ref()?
            .conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
            .map(|c| c.status == "True")
    }

    /// Names of generated `VirtualMachine` objects.
    pub fn virtual_machine_refs(&self) -> Vec<&ObjectRef> {
        self.status
            .as_ref()
            .map(|s| {
                s.objects
                    .iter()
                    .filter_map(|o| o.object_ref.as_ref())
                    .filter(|r| r.kind == "VirtualMachine")
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance_with(conditions: Vec<TemplateInstanceCondition>) -> TemplateInstance {
        let mut instance = TemplateInstance::new(
            "my-vapp",
            TemplateInstanceSpec {
                template: serde_json::json!({}),
            },
        );
        instance.status = Some(TemplateInstanceStatus {
            conditions,
            objects: vec![],
        });
        instance
    }

    #[test]
    fn ready_condition() {
        let instance = instance_with(vec![TemplateInstanceCondition {
            condition_type: "Ready".into(),
            status: "True".into(),
            reason: None,
            message: None,
        }]);
        assert!(instance.is_ready());
        assert!(!instance.is_failed());
    }

    #[test]
    fn failure_condition() {
        let instance = instance_with(vec![TemplateInstanceCondition {
            condition_type: "InstantiateFailure".into(),
            status: "True".into(),
            reason: Some("Failed".into()),
            message: None,
        }]);
        assert!(!instance.is_ready());
        assert!(instance.is_failed());
    }

    #[test]
    fn vm_refs_filter_on_kind() {
        let mut instance = instance_with(vec![]);
        instance.status.as_mut().unwrap().objects = vec![
            TemplateInstanceObject {
                object_ref: Some(ObjectRef {
                    kind: "VirtualMachine".into(),
                    name: "vm-0".into(),
                    namespace: Some("vdc-a".into()),
                }),
            },
            TemplateInstanceObject {
                object_ref: Some(ObjectRef {
                    kind: "Secret".into(),
                    name: "creds".into(),
                    namespace: None,
                }),
            },
        ];
        let refs = instance.virtual_machine_refs();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "vm-0");
    }
}
