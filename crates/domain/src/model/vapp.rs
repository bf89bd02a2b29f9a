use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::urn::{CatalogItemId, Urn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VAppStatus {
    Instantiating,
    Resolved,
    Deployed,
    PoweredOn,
    PoweredOff,
    Suspended,
    FailedCreation,
    Unresolved,
}

impl VAppStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VAppStatus::Instantiating => "INSTANTIATING",
            VAppStatus::Resolved => "RESOLVED",
            VAppStatus::Deployed => "DEPLOYED",
            VAppStatus::PoweredOn => "POWERED_ON",
            VAppStatus::PoweredOff => "POWERED_OFF",
            VAppStatus::Suspended => "SUSPENDED",
            VAppStatus::FailedCreation => "FAILED_CREATION",
            VAppStatus::Unresolved => "UNRESOLVED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "INSTANTIATING" => Some(VAppStatus::Instantiating),
            "RESOLVED" => Some(VAppStatus::Resolved),
            "DEPLOYED" => Some(VAppStatus::Deployed),
            "POWERED_ON" => Some(VAppStatus::PoweredOn),
            "POWERED_OFF" => Some(VAppStatus::PoweredOff),
            "SUSPENDED" => Some(VAppStatus::Suspended),
            "FAILED_CREATION" => Some(VAppStatus::FailedCreation),
            "UNRESOLVED" => Some(VAppStatus::Unresolved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VmStatus {
    PoweredOn,
    PoweredOff,
    Suspended,
    Unresolved,
}

impl VmStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VmStatus::PoweredOn => "POWERED_ON",
            VmStatus::PoweredOff => "POWERED_OFF",
            VmStatus::Suspended => "SUSPENDED",
            VmStatus::Unresolved => "UNRESOLVED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "POWERED_ON" => Some(VmStatus::PoweredOn),
            "POWERED_OFF" => Some(VmStatus::PoweredOff),
            "SUSPENDED" => Some(VmStatus::Suspended),
            "UNRESOLVED" => Some(VmStatus::Unresolved),
            _ => None,
        }
    }
}

/// A deployable unit of one or more VMs originating from a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VApp {
    pub id: Urn,
    pub vdc_id: Urn,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: VAppStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_ref: Option<CatalogItemId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vm {
    pub id: Urn,
    pub vapp_id: Urn,
    pub name: String,
    /// Name of the backing KubeVirt `VirtualMachine` object.
    pub vm_name: String,
    /// Namespace of the owning VDC at creation time.
    pub namespace: String,
    pub status: VmStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_count: Option<i32>,
    #[serde(rename = "memoryMB", skip_serializing_if = "Option::is_none")]
    pub memory_mb: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_os: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
