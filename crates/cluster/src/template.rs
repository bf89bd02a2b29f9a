//! The OpenShift `Template` resource.
//!
//! Templates carry their objects and parameters at the top level rather than
//! under `spec`, so the `CustomResource` derive does not fit; the `Resource`
//! trait is implemented by hand instead.

use std::borrow::Cow;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ClusterResourceScope;
use kube::Resource;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::labels;

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub metadata: ObjectMeta,
    /// Raw manifests realised when the template is instantiated.
    #[serde(default)]
    pub objects: Vec<serde_json::Value>,
    #[serde(default)]
    pub parameters: Vec<TemplateParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct TemplateParameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub required: bool,
}

impl Resource for Template {
    type DynamicType = ();
    type Scope = ClusterResourceScope;

    fn kind(_: &()) -> Cow<'static, str> {
        "Template".into()
    }

    fn group(_: &()) -> Cow<'static, str> {
        "template.openshift.io".into()
    }

    fn version(_: &()) -> Cow<'static, str> {
        "v1".into()
    }

    fn plural(_: &()) -> Cow<'static, str> {
        "templates".into()
    }

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

impl Template {
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or_default()
    }

    /// Catalog attribution from the `catalog.ssvirt.io/catalog-id` label.
    /// Templates without the label (or with a malformed value) are skipped.
    pub fn catalog_id(&self) -> Option<Uuid> {
        self.metadata
            .labels
            .as_ref()?
            .get(labels::CATALOG_ID_LABEL)
            .and_then(|v| Uuid::parse_str(v).ok())
    }

    pub fn is_published(&self) -> bool {
        self.metadata
            .labels
            .as_ref()
            .and_then(|l| l.get(labels::PUBLISHED_LABEL))
            .map(|v| v == "true")
            .unwrap_or(false)
    }

    pub fn description(&self) -> String {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(labels::DESCRIPTION_ANNOTATION))
            .cloned()
            .unwrap_or_default()
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.value.as_deref())
    }

    /// Count of embedded objects with kind `VirtualMachine`.
    pub fn virtual_machine_count(&self) -> usize {
        self.objects
            .iter()
            .filter(|o| o.get("kind").and_then(|k| k.as_str()) == Some("VirtualMachine"))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn template_with_labels(labels_map: BTreeMap<String, String>) -> Template {
        Template {
            metadata: ObjectMeta {
                name: Some("ubuntu".into()),
                labels: Some(labels_map),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn catalog_attribution_requires_valid_label() {
        let id = Uuid::new_v4();
        let t = template_with_labels(BTreeMap::from([(
            labels::CATALOG_ID_LABEL.to_owned(),
            id.to_string(),
        )]));
        assert_eq!(t.catalog_id(), Some(id));

        let t = template_with_labels(BTreeMap::from([(
            labels::CATALOG_ID_LABEL.to_owned(),
            "not-a-uuid".to_owned(),
        )]));
        assert_eq!(t.catalog_id(), None);

        let t = template_with_labels(BTreeMap::new());
        assert_eq!(t.catalog_id(), None);
    }

    #[test]
    fn vm_count_looks_at_kind() {
        let mut t = Template::default();
        t.objects = vec![
            serde_json::json!({ "kind": "VirtualMachine", "apiVersion": "kubevirt.io/v1" }),
            serde_json::json!({ "kind": "Service" }),
            serde_json::json!({ "kind": "VirtualMachine" }),
        ];
        assert_eq!(t.virtual_machine_count(), 2);
    }

    #[test]
    fn parameter_lookup() {
        let mut t = Template::default();
        t.parameters = vec![TemplateParameter {
            name: "CPU".into(),
            value: Some("2".into()),
            ..Default::default()
        }];
        assert_eq!(t.parameter("CPU"), Some("2"));
        assert_eq!(t.parameter("MEMORY"), None);
    }
}
