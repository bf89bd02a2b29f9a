use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::urn::{CatalogItemId, Urn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub id: Urn,
    pub org_id: Urn,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub is_published: bool,
    pub is_subscribed: bool,
    pub is_local: bool,
    pub version: i32,
    pub creation_date: DateTime<Utc>,
}

/// Reference block embedded in catalog item payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRef {
    pub id: Urn,
    pub name: String,
}

/// Sizing summary of the template behind a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItemEntity {
    #[serde(rename = "numberOfVMs")]
    pub number_of_vms: i32,
    #[serde(rename = "numberOfCpus")]
    pub number_of_cpus: i32,
    #[serde(rename = "memoryMB")]
    pub memory_mb: i64,
    #[serde(rename = "storageMB")]
    pub storage_mb: i64,
    #[serde(rename = "type")]
    pub entity_type: String,
}

/// A catalog item. Never persisted: materialised on demand from a cluster
/// template labelled as belonging to the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: CatalogItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub entity: CatalogItemEntity,
    pub is_published: bool,
    pub is_expired: bool,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<EntityRef>,
    pub catalog: EntityRef,
}
