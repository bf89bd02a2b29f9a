//! AppState construction and background-task spawning extracted from
//! `main.rs`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use ssv_auth::TokenSigner;
use ssv_cluster::ClusterClient;
use ssv_domain::config::{Config, ConfigSeverity};
use ssv_domain::model::RoleName;
use ssv_domain::{Urn, UrnKind};
use ssv_store::users::NewUser;
use ssv_store::PgStore;

use crate::catalog::cache::{ClusterTemplateFetcher, TemplateCache};
use crate::orchestrator::Orchestrator;
use crate::reconcile::ReconcileManager;
use crate::state::AppState;

/// Whether this process runs under the production profile.
pub fn production_profile() -> bool {
    std::env::var("SSVIRT_PROFILE").as_deref() == Ok("production")
}

/// Validate config, initialize every subsystem and return a fully-wired
/// [`AppState`].
pub async fn build_app_state(
    config: Arc<Config>,
    shutdown: CancellationToken,
) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate(production_profile());
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── Relational store ─────────────────────────────────────────────
    let store = PgStore::connect(&config.database)
        .await
        .context("connecting to postgres")?;
    store.migrate().await.context("running migrations")?;
    tracing::info!(
        host = %config.database.host,
        database = %config.database.database,
        "store ready (migrations applied)"
    );

    // ── Built-in roles + initial admin ───────────────────────────────
    store.roles().seed_builtin().await.context("seeding roles")?;
    if config.initial_admin.enabled {
        seed_initial_admin(&store, &config).await.context("seeding initial admin")?;
    }

    // ── Kubernetes client (optional) ─────────────────────────────────
    let cluster = match ClusterClient::connect().await {
        Ok(c) => {
            tracing::info!("kubernetes client ready");
            Some(c)
        }
        Err(e) => {
            tracing::warn!(error = %e, "no kubernetes cluster reachable; cluster-backed endpoints disabled");
            None
        }
    };

    // ── Token signer ─────────────────────────────────────────────────
    let secret = if config.auth.jwt_secret.is_empty() {
        // Dev fallback; sessions die with the process.
        let random: [u8; 32] = rand::random();
        random.to_vec()
    } else {
        config.auth.jwt_secret.as_bytes().to_vec()
    };
    let signer = Arc::new(TokenSigner::new(&secret, config.auth.token_expiry_minutes));
    tracing::info!(
        expiry_minutes = config.auth.token_expiry_minutes,
        "token signer ready"
    );

    // ── Site identity ────────────────────────────────────────────────
    let site_id = match config.session.site.id.as_str() {
        "" => Urn::random(UrnKind::Site),
        configured => Urn::parse_as(UrnKind::Site, configured)
            .context("session.site.id must be a site URN")?,
    };

    // ── Template cache ───────────────────────────────────────────────
    let staleness = Duration::from_millis(config.kubernetes.template_staleness_ms);
    let fetcher: Arc<dyn crate::catalog::cache::TemplateFetcher> = match &cluster {
        Some(c) => Arc::new(ClusterTemplateFetcher::new(c.clone())),
        None => Arc::new(EmptyFetcher),
    };
    let template_cache = Arc::new(TemplateCache::new(fetcher, staleness));
    tracing::info!(staleness_ms = config.kubernetes.template_staleness_ms, "template cache ready");

    // ── Orchestrator ─────────────────────────────────────────────────
    let orchestrator = Arc::new(Orchestrator::new(
        store.clone(),
        cluster.clone(),
        template_cache.clone(),
    ));

    Ok(AppState {
        config,
        store,
        cluster,
        signer,
        site_id,
        orchestrator,
        template_cache,
        shutdown,
    })
}

/// Start the reconciler set (no-op without a cluster client).
pub fn spawn_reconcilers(state: &AppState) {
    let Some(cluster) = state.cluster.clone() else {
        tracing::warn!("reconcilers disabled: no cluster client");
        return;
    };
    ReconcileManager {
        store: state.store.clone(),
        cluster,
        config: state.config.kubernetes.clone(),
    }
    .spawn(state.shutdown.clone());
    tracing::info!("reconcilers started");
}

/// Create the configured admin account on first boot. Idempotent: an
/// existing username is left untouched.
async fn seed_initial_admin(store: &PgStore, config: &Config) -> anyhow::Result<()> {
    let admin = &config.initial_admin;
    if store
        .users()
        .get_record_by_username(&admin.username)
        .await?
        .is_some()
    {
        return Ok(());
    }
    let password_hash = if admin.password.is_empty() {
        String::new()
    } else {
        ssv_auth::hash_password(&admin.password)?
    };
    // An empty hash never verifies, so a password-less seed is disabled.
    let enabled = !password_hash.is_empty();
    let role_id = RoleName::SystemAdministrator.urn().id;
    let user = store
        .users()
        .create(NewUser {
            username: admin.username.clone(),
            full_name: admin.full_name.clone(),
            email: admin.email.clone(),
            enabled,
            password_hash,
            primary_org_id: None,
            role_ids: vec![role_id],
        })
        .await?;
    tracing::info!(username = %user.username, enabled, "initial admin created");
    Ok(())
}

/// Fetcher used when no cluster is configured: the catalog is empty.
struct EmptyFetcher;

#[async_trait::async_trait]
impl crate::catalog::cache::TemplateFetcher for EmptyFetcher {
    async fn fetch(&self) -> ssv_domain::Result<Vec<ssv_cluster::Template>> {
        Ok(Vec::new())
    }
}
