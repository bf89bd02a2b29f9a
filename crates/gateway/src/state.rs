use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use ssv_auth::TokenSigner;
use ssv_cluster::ClusterClient;
use ssv_domain::config::Config;
use ssv_domain::Urn;
use ssv_store::PgStore;

use crate::catalog::cache::TemplateCache;
use crate::orchestrator::Orchestrator;

/// Shared application state passed to all API handlers.
///
/// Fields are grouped by concern:
/// - **Core services** — config, relational store, cluster client
/// - **Auth** — token signer, site identity
/// - **Subsystems** — orchestrator, template cache
/// - **Lifecycle** — shared cancellation token
#[derive(Clone)]
pub struct AppState {
    // ── Core services ─────────────────────────────────────────────────
    pub config: Arc<Config>,
    pub store: PgStore,
    /// `None` when no cluster is reachable; cluster-backed endpoints then
    /// fail with an upstream error instead of blocking boot.
    pub cluster: Option<ClusterClient>,

    // ── Auth ──────────────────────────────────────────────────────────
    pub signer: Arc<TokenSigner>,
    /// Site URN reported in session payloads.
    pub site_id: Urn,

    // ── Subsystems ────────────────────────────────────────────────────
    pub orchestrator: Arc<Orchestrator>,
    pub template_cache: Arc<TemplateCache>,

    // ── Lifecycle ─────────────────────────────────────────────────────
    /// Cancelled on shutdown; reconcilers and long waits hang off it.
    pub shutdown: CancellationToken,
}
