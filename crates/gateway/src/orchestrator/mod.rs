//! Synchronous create/delete flows spanning the relational store and the
//! cluster. The store is written first for deletions and reads back
//! authoritatively; cluster writes that fail are either surfaced (creates)
//! or swallowed and left to reconciliation (deletes).

mod power;
mod vapp;
mod vdc;

pub use vapp::InstantiateTemplateSpec;
pub use vdc::VdcSpec;

use std::sync::Arc;

use ssv_cluster::ClusterClient;
use ssv_domain::{Error, Result};
use ssv_store::PgStore;

use crate::catalog::cache::TemplateCache;

pub struct Orchestrator {
    pub(crate) store: PgStore,
    pub(crate) cluster: Option<ClusterClient>,
    pub(crate) templates: Arc<TemplateCache>,
}

impl Orchestrator {
    pub fn new(
        store: PgStore,
        cluster: Option<ClusterClient>,
        templates: Arc<TemplateCache>,
    ) -> Orchestrator {
        Orchestrator {
            store,
            cluster,
            templates,
        }
    }

    /// Cluster client or a stable upstream error when none is configured.
    pub(crate) fn cluster(&self) -> Result<&ClusterClient> {
        self.cluster
            .as_ref()
            .ok_or_else(|| Error::Kubernetes("no cluster client configured".into()))
    }
}
