//! Bounded-staleness projection of cluster templates.
//!
//! A process-wide snapshot refreshed at most every `staleness` interval.
//! Reads clone the current snapshot pointer and never block; when the
//! snapshot is stale the first reader performs the refresh inline while
//! concurrent readers keep serving the stale snapshot. At most one refresh
//! is in flight at any time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use ssv_cluster::{ClusterClient, Template};
use ssv_domain::model::{Catalog, CatalogItem};
use ssv_domain::{Page, PageParams, Result};

use super::project_item;

/// Source of cluster templates; faked in tests.
#[async_trait]
pub trait TemplateFetcher: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Template>>;
}

pub struct ClusterTemplateFetcher {
    cluster: ClusterClient,
}

impl ClusterTemplateFetcher {
    pub fn new(cluster: ClusterClient) -> Self {
        ClusterTemplateFetcher { cluster }
    }
}

#[async_trait]
impl TemplateFetcher for ClusterTemplateFetcher {
    async fn fetch(&self) -> Result<Vec<Template>> {
        self.cluster.list_templates().await
    }
}

#[derive(Default)]
struct Snapshot {
    fetched_at: Option<Instant>,
    templates: HashMap<String, Template>,
    /// Catalog id -> template names, sorted ascending.
    by_catalog: HashMap<Uuid, Vec<String>>,
}

impl Snapshot {
    fn build(templates: Vec<Template>) -> Snapshot {
        let mut map = HashMap::new();
        let mut by_catalog: HashMap<Uuid, Vec<String>> = HashMap::new();
        for template in templates {
            // Unlabelled templates are not part of any catalog.
            let Some(catalog_id) = template.catalog_id() else {
                continue;
            };
            let name = template.name().to_owned();
            if name.is_empty() {
                continue;
            }
            by_catalog.entry(catalog_id).or_default().push(name.clone());
            map.insert(name, template);
        }
        for names in by_catalog.values_mut() {
            names.sort();
        }
        Snapshot {
            fetched_at: Some(Instant::now()),
            templates: map,
            by_catalog,
        }
    }

    fn is_fresh(&self, staleness: Duration) -> bool {
        self.fetched_at
            .map(|t| t.elapsed() < staleness)
            .unwrap_or(false)
    }
}

pub struct TemplateCache {
    fetcher: Arc<dyn TemplateFetcher>,
    staleness: Duration,
    snapshot: RwLock<Arc<Snapshot>>,
    refresh_in_flight: AtomicBool,
}

impl TemplateCache {
    pub fn new(fetcher: Arc<dyn TemplateFetcher>, staleness: Duration) -> TemplateCache {
        TemplateCache {
            fetcher,
            staleness,
            snapshot: RwLock::new(Arc::new(Snapshot::default())),
            refresh_in_flight: AtomicBool::new(false),
        }
    }

    /// Current snapshot, refreshing first if stale and no other refresh is
    /// running. A failed refresh keeps the previous snapshot (and its
    /// timestamp) so the next read retries.
    async fn current(&self) -> Arc<Snapshot> {
        let snapshot = self.snapshot.read().clone();
        if snapshot.is_fresh(self.staleness) {
            return snapshot;
        }
        if self
            .refresh_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // Another reader is refreshing; serve the stale snapshot.
            return snapshot;
        }
        let refreshed = match self.fetcher.fetch().await {
            Ok(templates) => {
                let fresh = Arc::new(Snapshot::build(templates));
                *self.snapshot.write() = fresh.clone();
                fresh
            }
            Err(e) => {
                tracing::warn!(error = %e, "template refresh failed; serving stale snapshot");
                self.snapshot.read().clone()
            }
        };
        self.refresh_in_flight.store(false, Ordering::SeqCst);
        refreshed
    }

    /// Paginated catalog items for one catalog, sorted by name.
    pub async fn list_by_catalog(
        &self,
        catalog: &Catalog,
        params: PageParams,
    ) -> Result<Page<CatalogItem>> {
        let snapshot = self.current().await;
        let items: Vec<CatalogItem> = snapshot
            .by_catalog
            .get(&catalog.id.id)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|n| snapshot.templates.get(n))
                    .map(|t| project_item(t, catalog))
                    .collect()
            })
            .unwrap_or_default();
        Ok(Page::slice(items, params))
    }

    /// Single item lookup; `None` when the template is missing or belongs to
    /// a different catalog.
    pub async fn get_item(
        &self,
        catalog: &Catalog,
        template_name: &str,
    ) -> Result<Option<CatalogItem>> {
        Ok(self
            .get_template(catalog.id.id, template_name)
            .await?
            .map(|t| project_item(&t, catalog)))
    }

    /// Raw template lookup used by the orchestrator.
    pub async fn get_template(
        &self,
        catalog_id: Uuid,
        template_name: &str,
    ) -> Result<Option<Template>> {
        let snapshot = self.current().await;
        Ok(snapshot
            .templates
            .get(template_name)
            .filter(|t| t.catalog_id() == Some(catalog_id))
            .cloned())
    }

    /// Whether any template still projects into this catalog. Guards
    /// catalog deletion.
    pub async fn catalog_has_items(&self, catalog_id: Uuid) -> Result<bool> {
        let snapshot = self.current().await;
        Ok(snapshot
            .by_catalog
            .get(&catalog_id)
            .map(|names| !names.is_empty())
            .unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use ssv_cluster::labels;
    use ssv_domain::{Error, Urn, UrnKind};
    use std::collections::BTreeMap;
    use std::sync::atomic::AtomicUsize;

    struct FakeFetcher {
        templates: parking_lot::Mutex<Vec<Template>>,
        fetches: AtomicUsize,
        delay: Duration,
        fail: AtomicBool,
    }

    impl FakeFetcher {
        fn new() -> Arc<FakeFetcher> {
            FakeFetcher::with_delay(Duration::ZERO)
        }

        fn with_delay(delay: Duration) -> Arc<FakeFetcher> {
            Arc::new(FakeFetcher {
                templates: parking_lot::Mutex::new(Vec::new()),
                fetches: AtomicUsize::new(0),
                delay,
                fail: AtomicBool::new(false),
            })
        }

        fn set_templates(&self, templates: Vec<Template>) {
            *self.templates.lock() = templates;
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TemplateFetcher for FakeFetcher {
        async fn fetch(&self) -> Result<Vec<Template>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::Kubernetes("apiserver unavailable".into()));
            }
            Ok(self.templates.lock().clone())
        }
    }

    fn catalog_with_id(id: Uuid) -> Catalog {
        Catalog {
            id: Urn::of(UrnKind::Catalog, id),
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

    fn labelled_template(name: &str, catalog_id: Uuid) -> Template {
        Template {
            metadata: ObjectMeta {
                name: Some(name.into()),
                labels: Some(BTreeMap::from([(
                    labels::CATALOG_ID_LABEL.to_owned(),
                    catalog_id.to_string(),
                )])),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn staleness_bounds_refresh() {
        let fetcher = FakeFetcher::new();
        let cache = TemplateCache::new(fetcher.clone(), Duration::from_millis(100));
        let id = Uuid::new_v4();
        let catalog = catalog_with_id(id);

        // Empty at T0.
        let page = cache.list_by_catalog(&catalog, PageParams::default()).await.unwrap();
        assert_eq!(page.result_total, 0);
        assert_eq!(fetcher.fetch_count(), 1);

        // Template appears, but the snapshot is still fresh: not visible.
        fetcher.set_templates(vec![labelled_template("ubuntu", id)]);
        let page = cache.list_by_catalog(&catalog, PageParams::default()).await.unwrap();
        assert_eq!(page.result_total, 0);
        assert_eq!(fetcher.fetch_count(), 1);

        // Past the staleness bound the next read refreshes.
        tokio::time::sleep(Duration::from_millis(120)).await;
        let page = cache.list_by_catalog(&catalog, PageParams::default()).await.unwrap();
        assert_eq!(page.result_total, 1);
        assert_eq!(page.values[0].name, "ubuntu");
        assert_eq!(fetcher.fetch_count(), 2);
    }

    #[tokio::test]
    async fn concurrent_reads_coalesce_to_one_fetch() {
        let fetcher = FakeFetcher::with_delay(Duration::from_millis(50));
        let cache = Arc::new(TemplateCache::new(fetcher.clone(), Duration::from_millis(10)));
        let id = Uuid::new_v4();
        fetcher.set_templates(vec![labelled_template("ubuntu", id)]);

        let mut handles = Vec::new();
        for _ in 0..10 {
            let cache = cache.clone();
            let catalog = catalog_with_id(id);
            handles.push(tokio::spawn(async move {
                cache.list_by_catalog(&catalog, PageParams::default()).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(fetcher.fetch_count(), 1);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_prior_snapshot() {
        let fetcher = FakeFetcher::new();
        let cache = TemplateCache::new(fetcher.clone(), Duration::from_millis(10));
        let id = Uuid::new_v4();
        let catalog = catalog_with_id(id);
        fetcher.set_templates(vec![labelled_template("ubuntu", id)]);

        let page = cache.list_by_catalog(&catalog, PageParams::default()).await.unwrap();
        assert_eq!(page.result_total, 1);

        fetcher.fail.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let page = cache.list_by_catalog(&catalog, PageParams::default()).await.unwrap();
        assert_eq!(page.result_total, 1, "stale snapshot survives a failed refresh");
    }

    #[tokio::test]
    async fn item_lookup_checks_catalog_ownership() {
        let fetcher = FakeFetcher::new();
        let cache = TemplateCache::new(fetcher.clone(), Duration::from_secs(30));
        let mine = Uuid::new_v4();
        let other = Uuid::new_v4();
        fetcher.set_templates(vec![labelled_template("ubuntu", other)]);

        let catalog = catalog_with_id(mine);
        assert!(cache.get_item(&catalog, "ubuntu").await.unwrap().is_none());
        let catalog = catalog_with_id(other);
        assert!(cache.get_item(&catalog, "ubuntu").await.unwrap().is_some());
    }
}
