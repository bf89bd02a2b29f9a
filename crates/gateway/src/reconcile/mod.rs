//! Background controllers converging the store toward observed cluster
//! state. Each controller implements [`Reconciler`]; a shared runner owns
//! the watch loop, per-key single-flight, requeue backoff and the
//! once-per-generation bookkeeping for unreconcilable objects.

pub mod leader;
pub mod template_instance;
pub mod vdc;
pub mod vm_status;

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{StreamExt, TryStreamExt};
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Resource, ResourceExt};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use ssv_cluster::ClusterClient;
use ssv_domain::config::KubernetesConfig;
use ssv_store::PgStore;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Reconcile contract
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Outcome of a successful reconcile pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub requeue: bool,
    pub after: Option<Duration>,
}

impl Action {
    /// Converged; wait for the next watch event.
    pub fn done() -> Action {
        Action {
            requeue: false,
            after: None,
        }
    }

    /// Run the same key again after the given delay.
    pub fn requeue_after(after: Duration) -> Action {
        Action {
            requeue: true,
            after: Some(after),
        }
    }
}

/// How a reconcile pass failed.
#[derive(Debug)]
pub enum ReconcileError {
    /// Worth retrying: requeued with exponential backoff.
    Transient(ssv_domain::Error),
    /// Parse failure or invalid reference: logged once per
    /// `metadata.generation` and dropped until the object changes.
    Terminal(String),
}

impl From<ssv_domain::Error> for ReconcileError {
    fn from(e: ssv_domain::Error) -> ReconcileError {
        ReconcileError::Transient(e)
    }
}

/// The standard reconcile contract shared by the controllers: given an
/// observed object, converge store and cluster and report whether to
/// requeue. The runner owns everything else.
#[async_trait]
pub trait Reconciler: Send + Sync + 'static {
    type Object: Resource<DynamicType = ()>
        + Clone
        + DeserializeOwned
        + Debug
        + Send
        + Sync
        + 'static;

    fn name(&self) -> &'static str;

    fn api(&self) -> Api<Self::Object>;

    /// Watch selector; defaults to everything of the kind.
    fn watch_config(&self) -> watcher::Config {
        watcher::Config::default()
    }

    async fn reconcile(&self, object: &Self::Object) -> Result<Action, ReconcileError>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Runner
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Exponential requeue backoff: 1s baseline, 5m cap.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Backoff {
            base: Duration::from_secs(1),
            cap: Duration::from_secs(300),
        }
    }
}

impl Backoff {
    /// Delay before retry number `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = self.base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
        exp.min(self.cap)
    }
}

const MAX_ATTEMPTS: u32 = 8;

fn object_key<O: Resource<DynamicType = ()>>(object: &O) -> String {
    match object.namespace() {
        Some(ns) => format!("{ns}/{}", object.name_any()),
        None => object.name_any(),
    }
}

/// Drive one controller until cancelled. Reconciles run concurrently across
/// keys; an in-flight key set keeps them single-flight per key (a delivery
/// for a key already being reconciled is dropped — the running pass reads
/// live state and the watch redelivers on change).
pub(crate) async fn run_controller<R: Reconciler>(reconciler: R, token: CancellationToken) {
    let reconciler = Arc::new(reconciler);
    let mut stream = watcher(reconciler.api(), reconciler.watch_config())
        .default_backoff()
        .applied_objects()
        .boxed();
    let in_flight: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));
    // Key -> last generation that failed terminally; pruned on success.
    let failed_generations: Arc<Mutex<HashMap<String, i64>>> =
        Arc::new(Mutex::new(HashMap::new()));

    tracing::info!(controller = reconciler.name(), "controller started");
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            item = stream.try_next() => match item {
                Ok(Some(object)) => {
                    let key = object_key(&object);
                    if !in_flight.lock().insert(key.clone()) {
                        continue;
                    }
                    let reconciler = reconciler.clone();
                    let in_flight = in_flight.clone();
                    let failed_generations = failed_generations.clone();
                    let token = token.clone();
                    tokio::spawn(async move {
                        reconcile_one(&*reconciler, &object, &key, &failed_generations, &token)
                            .await;
                        in_flight.lock().remove(&key);
                    });
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(controller = reconciler.name(), error = %e, "watch error");
                }
            }
        }
    }
    tracing::info!(controller = reconciler.name(), "controller stopped");
}

/// One key's reconcile-and-requeue cycle.
async fn reconcile_one<R: Reconciler>(
    reconciler: &R,
    object: &R::Object,
    key: &str,
    failed_generations: &Mutex<HashMap<String, i64>>,
    token: &CancellationToken,
) {
    let backoff = Backoff::default();
    let mut attempt = 0u32;
    loop {
        match reconciler.reconcile(object).await {
            Ok(action) => {
                failed_generations.lock().remove(key);
                if !action.requeue {
                    return;
                }
                if attempt >= MAX_ATTEMPTS {
                    tracing::warn!(controller = reconciler.name(), key, "requeue budget exhausted; waiting for the next event");
                    return;
                }
                let delay = action.after.unwrap_or_else(|| backoff.delay(attempt));
                attempt += 1;
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(ReconcileError::Transient(e)) => {
                if attempt >= MAX_ATTEMPTS {
                    tracing::error!(controller = reconciler.name(), key, error = %e, "reconcile gave up after {MAX_ATTEMPTS} attempts");
                    return;
                }
                let delay = backoff.delay(attempt);
                attempt += 1;
                tracing::warn!(controller = reconciler.name(), key, error = %e, attempt, delay_ms = delay.as_millis() as u64, "reconcile failed, requeueing");
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(ReconcileError::Terminal(reason)) => {
                // Not requeued; logged once per observed generation so a
                // persistently broken object does not spam every resync.
                let generation = object.meta().generation.unwrap_or(0);
                let mut failed = failed_generations.lock();
                if failed.get(key) != Some(&generation) {
                    failed.insert(key.to_owned(), generation);
                    tracing::error!(
                        controller = reconciler.name(),
                        key,
                        generation,
                        reason,
                        "dropping unreconcilable object"
                    );
                }
                return;
            }
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Manager
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Spawns the controller tasks, gated on leader election when enabled.
pub struct ReconcileManager {
    pub store: PgStore,
    pub cluster: ClusterClient,
    pub config: KubernetesConfig,
}

impl ReconcileManager {
    pub fn spawn(self, token: CancellationToken) {
        tokio::spawn(async move {
            if self.config.leader_election {
                let elector = leader::LeaderElector::new(
                    self.cluster.client(),
                    &self.config.namespace,
                );
                match elector.acquire(&token).await {
                    Ok(()) => {
                        tracing::info!("acquired controller lease");
                        elector.keep_renewing(token.clone());
                    }
                    Err(leader::AcquireError::Cancelled) => return,
                    Err(leader::AcquireError::Failed(e)) => {
                        tracing::error!(error = %e, "leader election failed; reconcilers disabled");
                        return;
                    }
                }
            }

            let vdc = vdc::VdcController {
                store: self.store.clone(),
                cluster: self.cluster.clone(),
            };
            let vm = vm_status::VmStatusController {
                store: self.store.clone(),
                cluster: self.cluster.clone(),
            };
            let ti = template_instance::TemplateInstanceController {
                store: self.store.clone(),
                cluster: self.cluster.clone(),
            };

            tokio::join!(
                run_controller(vdc, token.clone()),
                run_controller(vm, token.clone()),
                run_controller(ti, token.clone()),
            );
            tracing::info!("reconcilers stopped");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let b = Backoff::default();
        assert_eq!(b.delay(0), Duration::from_secs(1));
        assert_eq!(b.delay(1), Duration::from_secs(2));
        assert_eq!(b.delay(4), Duration::from_secs(16));
        assert_eq!(b.delay(10), Duration::from_secs(300));
        assert_eq!(b.delay(31), Duration::from_secs(300));
    }

    #[test]
    fn action_constructors() {
        assert_eq!(
            Action::done(),
            Action {
                requeue: false,
                after: None
            }
        );
        let requeued = Action::requeue_after(Duration::from_secs(5));
        assert!(requeued.requeue);
        assert_eq!(requeued.after, Some(Duration::from_secs(5)));
    }
}
