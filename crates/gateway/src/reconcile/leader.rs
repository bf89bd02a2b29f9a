//! Lease-based leader election.
//!
//! One `coordination.k8s.io/v1` Lease gates the reconciler set: the holder
//! reconciles, every other replica stays a warm reader. Identity is the pod
//! hostname.

use chrono::Utc;
use k8s_openapi::api::coordination::v1::{Lease, LeaseSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{MicroTime, ObjectMeta};
use kube::api::{Patch, PatchParams, PostParams};
use kube::error::ErrorResponse;
use kube::{Api, Client};
use tokio_util::sync::CancellationToken;

/// Fixed lease name shared by all replicas.
pub const LEASE_NAME: &str = "ssvirt-controller";
const LEASE_DURATION_SECS: i32 = 15;
const RENEW_PERIOD_SECS: u64 = 5;

#[derive(Debug)]
pub enum AcquireError {
    Cancelled,
    Failed(kube::Error),
}

pub struct LeaderElector {
    api: Api<Lease>,
    identity: String,
}

impl LeaderElector {
    pub fn new(client: Client, namespace: &str) -> LeaderElector {
        let identity = std::env::var("HOSTNAME").unwrap_or_else(|_| {
            format!("ssvirt-{}", std::process::id())
        });
        LeaderElector {
            api: Api::namespaced(client, namespace),
            identity,
        }
    }

    /// Block until this replica holds the lease (or the token fires).
    pub async fn acquire(&self, token: &CancellationToken) -> Result<(), AcquireError> {
        loop {
            match self.try_acquire().await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "lease acquisition attempt failed");
                }
            }
            tokio::select! {
                _ = token.cancelled() => return Err(AcquireError::Cancelled),
                _ = tokio::time::sleep(std::time::Duration::from_secs(RENEW_PERIOD_SECS)) => {}
            }
        }
    }

    /// Renew in the background; a lost lease cancels the token so the
    /// controllers stop rather than split-brain.
    pub fn keep_renewing(self, token: CancellationToken) {
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(std::time::Duration::from_secs(RENEW_PERIOD_SECS)) => {}
                }
                match self.try_acquire().await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::error!("controller lease lost to another replica");
                        token.cancel();
                        return;
                    }
                    Err(e) => {
                        // Keep the lease on transient renewal errors; the
                        // duration window absorbs a few missed renewals.
                        tracing::warn!(error = %e, "lease renewal failed");
                    }
                }
            }
        });
    }

    /// One acquisition/renewal round. Returns whether we hold the lease.
    async fn try_acquire(&self) -> Result<bool, kube::Error> {
        let now = MicroTime(Utc::now());
        match self.api.get(LEASE_NAME).await {
            Ok(lease) => {
                let spec = lease.spec.unwrap_or_default();
                let holder = spec.holder_identity.clone().unwrap_or_default();
                let expired = spec
                    .renew_time
                    .as_ref()
                    .map(|t| {
                        let age = Utc::now().signed_duration_since(t.0);
                        age.num_seconds() > i64::from(LEASE_DURATION_SECS)
                    })
                    .unwrap_or(true);
                if holder != self.identity && !expired {
                    return Ok(false);
                }
                let transitions = spec.lease_transitions.unwrap_or(0)
                    + i32::from(holder != self.identity);
                let patch = serde_json::json!({
                    "spec": {
                        "holderIdentity": self.identity,
                        "leaseDurationSeconds": LEASE_DURATION_SECS,
                        "renewTime": now,
                        "leaseTransitions": transitions,
                    }
                });
                self.api
                    .patch(LEASE_NAME, &PatchParams::default(), &Patch::Merge(&patch))
                    .await?;
                Ok(true)
            }
            Err(kube::Error::Api(ErrorResponse { code: 404, .. })) => {
                let lease = Lease {
                    metadata: ObjectMeta {
                        name: Some(LEASE_NAME.to_owned()),
                        ..Default::default()
                    },
                    spec: Some(LeaseSpec {
                        holder_identity: Some(self.identity.clone()),
                        lease_duration_seconds: Some(LEASE_DURATION_SECS),
                        acquire_time: Some(now.clone()),
                        renew_time: Some(now),
                        lease_transitions: Some(0),
                        ..Default::default()
                    }),
                };
                match self.api.create(&PostParams::default(), &lease).await {
                    Ok(_) => Ok(true),
                    // Lost the creation race.
                    Err(kube::Error::Api(ErrorResponse { code: 409, .. })) => Ok(false),
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }
}
