//! Catalog item projection from cluster templates.

pub mod cache;

use ssv_cluster::{parse_quantity_mb, Template};
use ssv_domain::model::{Catalog, CatalogItem, CatalogItemEntity, EntityRef};
use ssv_domain::CatalogItemId;

/// Media type reported for projected vApp templates.
const VAPP_TEMPLATE_TYPE: &str = "application/vnd.vmware.vcloud.vAppTemplate+xml";

/// Materialise a catalog item from a cluster template.
pub fn project_item(template: &Template, catalog: &Catalog) -> CatalogItem {
    let number_of_vms = match template.virtual_machine_count() {
        0 => 1,
        n => n as i32,
    };
    let number_of_cpus = template
        .parameter("CPU")
        .and_then(|v| v.parse::<i32>().ok())
        .unwrap_or(1);
    let memory_mb = template
        .parameter("MEMORY")
        .and_then(parse_quantity_mb)
        .unwrap_or(0);
    let storage_mb = template
        .parameter("STORAGE")
        .and_then(parse_quantity_mb)
        .unwrap_or(0);

    CatalogItem {
        id: CatalogItemId::new(catalog.id.id, template.name()),
        name: template.name().to_owned(),
        description: template.description(),
        entity: CatalogItemEntity {
            number_of_vms,
            number_of_cpus,
            memory_mb,
            storage_mb,
            entity_type: VAPP_TEMPLATE_TYPE.to_owned(),
        },
        is_published: template.is_published(),
        is_expired: false,
        status: "AVAILABLE".to_owned(),
        owner: None,
        catalog: EntityRef {
            id: catalog.id,
            name: catalog.name.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use ssv_cluster::labels;
    use ssv_cluster::TemplateParameter;
    use ssv_domain::{Urn, UrnKind};
    use std::collections::BTreeMap;

    fn catalog() -> Catalog {
        Catalog {
            id: Urn::random(UrnKind::Catalog),
            org_id: Urn::random(UrnKind::Org),
            name: "main".into(),
            description: String::new(),
            is_published: false,
            is_subscribed: false,
            is_local: true,
            version: 1,
            creation_date: Utc::now(),
        }
    }

    fn param(name: &str, value: &str) -> TemplateParameter {
        TemplateParameter {
            name: name.into(),
            value: Some(value.into()),
            ..Default::default()
        }
    }

    #[test]
    fn projection_reads_parameters() {
        let mut template = Template::default();
        template.metadata = ObjectMeta {
            name: Some("ubuntu".into()),
            labels: Some(BTreeMap::from([(
                labels::PUBLISHED_LABEL.to_owned(),
                "true".to_owned(),
            )])),
            annotations: Some(BTreeMap::from([(
                labels::DESCRIPTION_ANNOTATION.to_owned(),
                "Ubuntu 24.04".to_owned(),
            )])),
            ..Default::default()
        };
        template.parameters = vec![
            param("CPU", "4"),
            param("MEMORY", "8Gi"),
            param("STORAGE", "40Gi"),
        ];
        template.objects = vec![serde_json::json!({ "kind": "VirtualMachine" })];

        let catalog = catalog();
        let item = project_item(&template, &catalog);
        assert_eq!(item.name, "ubuntu");
        assert_eq!(item.description, "Ubuntu 24.04");
        assert_eq!(item.entity.number_of_vms, 1);
        assert_eq!(item.entity.number_of_cpus, 4);
        assert_eq!(item.entity.memory_mb, 8192);
        assert_eq!(item.entity.storage_mb, 40 * 1024);
        assert!(item.is_published);
        assert_eq!(item.status, "AVAILABLE");
        assert_eq!(item.id, CatalogItemId::new(catalog.id.id, "ubuntu"));
    }

    #[test]
    fn projection_defaults() {
        let mut template = Template::default();
        template.metadata.name = Some("bare".into());
        let item = project_item(&template, &catalog());
        // No embedded VMs still counts as one deployable VM.
        assert_eq!(item.entity.number_of_vms, 1);
        assert_eq!(item.entity.number_of_cpus, 1);
        assert_eq!(item.entity.memory_mb, 0);
        assert!(!item.is_published);
    }
}
