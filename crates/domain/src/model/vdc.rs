use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::urn::Urn;

/// Capacity accounting policy on a VDC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationModel {
    PayAsYouGo,
    AllocationPool,
    ReservationPool,
    Flex,
}

impl AllocationModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationModel::PayAsYouGo => "PayAsYouGo",
            AllocationModel::AllocationPool => "AllocationPool",
            AllocationModel::ReservationPool => "ReservationPool",
            AllocationModel::Flex => "Flex",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PayAsYouGo" => Some(AllocationModel::PayAsYouGo),
            "AllocationPool" => Some(AllocationModel::AllocationPool),
            "ReservationPool" => Some(AllocationModel::ReservationPool),
            "Flex" => Some(AllocationModel::Flex),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityValue {
    pub allocated: i64,
    pub limit: i64,
    pub units: CapacityUnits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapacityUnits {
    #[serde(rename = "MHz")]
    Mhz,
    #[serde(rename = "MB")]
    Mb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputeCapacity {
    pub cpu: CapacityValue,
    pub memory: CapacityValue,
}

impl Default for ComputeCapacity {
    fn default() -> Self {
        ComputeCapacity {
            cpu: CapacityValue {
                allocated: 0,
                limit: 0,
                units: CapacityUnits::Mhz,
            },
            memory: CapacityValue {
                allocated: 0,
                limit: 0,
                units: CapacityUnits::Mb,
            },
        }
    }
}

/// Provisioning state of the backing namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VdcStatus {
    Provisioning,
    Ready,
    Failed,
}

impl VdcStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VdcStatus::Provisioning => "PROVISIONING",
            VdcStatus::Ready => "READY",
            VdcStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PROVISIONING" => Some(VdcStatus::Provisioning),
            "READY" => Some(VdcStatus::Ready),
            "FAILED" => Some(VdcStatus::Failed),
            _ => None,
        }
    }
}

/// Virtual data center: a quota-bearing container realised as a namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vdc {
    pub id: Urn,
    pub org_id: Urn,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub allocation_model: AllocationModel,
    pub compute_capacity: ComputeCapacity,
    pub provider_vdc_name: String,
    pub nic_quota: i32,
    pub network_quota: i32,
    pub is_thin_provision: bool,
    pub is_enabled: bool,
    /// Backing namespace; derived at creation, unique among live VDCs.
    pub namespace: String,
    pub status: VdcStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
