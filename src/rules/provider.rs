//! Three-tier rule-data provider.
//!
//! Readers take an `Arc` of the active snapshot and never see a partial
//! update: every promotion swaps in a complete [`ActiveRules`]. A refresh
//! never fails from the caller's point of view; problems are reported as a
//! [`RefreshOutcome`] and recorded in [`DataFreshness`].

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::{self, JoinHandle};
use tracing::{debug, info, warn};

use super::TaxRuleSet;
use super::cache::{CacheRead, RuleCache};
use super::embedded;
use super::error::{CacheError, RefreshError, RuleDataError};
use super::remote::RemoteSource;
use super::validate::parse_payload;

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub cache_dir: Option<PathBuf>,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DataTier {
    Embedded,
    Cached,
    Remote,
}

/// The snapshot calculators run against.
#[derive(Debug)]
pub struct ActiveRules {
    pub tier: DataTier,
    pub version: String,
    pub rules: Arc<TaxRuleSet>,
    /// Order in which snapshots were validated; a promotion only replaces
    /// an older one.
    pub sequence: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DataFreshness {
    Unchecked,
    Fresh,
    Stale { reason: String },
}

#[derive(Debug)]
pub enum RefreshOutcome {
    Updated { version: String },
    UpToDate,
    AlreadyInFlight,
    Disabled,
    Failed(RefreshError),
}

pub struct RuleDataProvider {
    config: ProviderConfig,
    embedded: Arc<TaxRuleSet>,
    cache: Option<RuleCache>,
    remote: Option<Arc<dyn RemoteSource>>,
    active: RwLock<Arc<ActiveRules>>,
    freshness: RwLock<DataFreshness>,
    refresh_gate: Mutex<()>,
    sequence: AtomicU64,
}

impl RuleDataProvider {
    /// Loads the embedded floor and, when a cache directory is configured,
    /// promotes a valid unexpired cache entry over it.
    pub fn new(
        config: ProviderConfig,
        remote: Option<Arc<dyn RemoteSource>>,
    ) -> Result<Self, RuleDataError> {
        let embedded = Arc::new(embedded::load()?);
        let cache = config
            .cache_dir
            .as_ref()
            .map(|dir| RuleCache::new(dir.clone(), config.cache_ttl));

        let floor = Arc::new(ActiveRules {
            tier: DataTier::Embedded,
            version: embedded.version.clone(),
            rules: Arc::clone(&embedded),
            sequence: 0,
        });

        let provider = Self {
            config,
            embedded,
            cache,
            remote,
            active: RwLock::new(floor),
            freshness: RwLock::new(DataFreshness::Unchecked),
            refresh_gate: Mutex::new(()),
            sequence: AtomicU64::new(0),
        };
        provider.load_cache();
        Ok(provider)
    }

    fn load_cache(&self) {
        let Some(cache) = &self.cache else {
            return;
        };
        let year = self.tax_year();
        match cache.read(year) {
            CacheRead::Hit { rules, metadata } => {
                let sequence = self.next_sequence();
                info!(year, version = %metadata.version, "using cached rule data");
                self.promote(ActiveRules {
                    tier: DataTier::Cached,
                    version: rules.version.clone(),
                    rules: Arc::new(rules),
                    sequence,
                });
            }
            CacheRead::Miss => debug!(year, "no cached rule data"),
            CacheRead::Expired => debug!(year, "cached rule data expired; using embedded"),
            CacheRead::Corrupt(error) => {
                warn!(year, error = %error, "rule cache corrupt; using embedded")
            }
        }
    }

    pub fn tax_year(&self) -> u32 {
        self.embedded.tax_year
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn embedded(&self) -> &TaxRuleSet {
        &self.embedded
    }

    pub fn current(&self) -> Arc<ActiveRules> {
        Arc::clone(&self.active.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn rules(&self) -> Arc<TaxRuleSet> {
        Arc::clone(&self.current().rules)
    }

    pub fn tier(&self) -> DataTier {
        self.current().tier
    }

    pub fn version(&self) -> String {
        self.current().version.clone()
    }

    pub fn freshness(&self) -> DataFreshness {
        self.freshness
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_freshness(&self, freshness: DataFreshness) {
        *self.freshness.write().unwrap_or_else(PoisonError::into_inner) = freshness;
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn promote(&self, candidate: ActiveRules) -> bool {
        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        if candidate.sequence <= active.sequence {
            debug!(
                candidate = candidate.sequence,
                active = active.sequence,
                "discarding older rule snapshot"
            );
            return false;
        }
        info!(
            tier = ?candidate.tier,
            from = %active.version,
            to = %candidate.version,
            "promoting rule data"
        );
        *active = Arc::new(candidate);
        true
    }

    /// Fetches, validates, caches and promotes remote rule data. Only one
    /// refresh runs at a time; a concurrent call returns `AlreadyInFlight`.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(remote) = self.remote.clone() else {
            return RefreshOutcome::Disabled;
        };
        let Ok(_gate) = self.refresh_gate.try_lock() else {
            debug!("rule refresh already in flight");
            return RefreshOutcome::AlreadyInFlight;
        };

        let current_version = self.version();
        let fetch = self.fetch_validated(remote.as_ref(), &current_version);
        let outcome = match tokio::time::timeout(self.config.fetch_timeout, fetch).await {
            Err(_) => RefreshOutcome::Failed(RefreshError::Timeout(self.config.fetch_timeout)),
            Ok(Err(error)) => RefreshOutcome::Failed(error),
            Ok(Ok(None)) => RefreshOutcome::UpToDate,
            Ok(Ok(Some((rules, body)))) => self.accept(rules, body).await,
        };

        match &outcome {
            RefreshOutcome::Updated { .. } | RefreshOutcome::UpToDate => {
                self.set_freshness(DataFreshness::Fresh)
            }
            RefreshOutcome::Failed(error) => {
                warn!(
                    error = %error,
                    tier = ?self.tier(),
                    "rule refresh failed; keeping current data"
                );
                self.set_freshness(DataFreshness::Stale {
                    reason: error.to_string(),
                });
            }
            RefreshOutcome::AlreadyInFlight | RefreshOutcome::Disabled => {}
        }
        outcome
    }

    async fn fetch_validated(
        &self,
        remote: &dyn RemoteSource,
        current_version: &str,
    ) -> Result<Option<(TaxRuleSet, Vec<u8>)>, RefreshError> {
        let year = self.tax_year();
        match remote.check_version(year, current_version).await {
            Ok(check) if !check.has_update => {
                debug!(year, version = current_version, "rule data up to date");
                return Ok(None);
            }
            Ok(check) => {
                info!(
                    year,
                    latest = %check.latest_version,
                    required = check.is_required,
                    "rule data update available"
                );
            }
            Err(error) => {
                debug!(year, error = %error, "version check failed; fetching bundle anyway");
            }
        }

        let body = remote.fetch_bundle(year).await?;
        let rules = parse_payload(&body, year)?;
        Ok(Some((rules, body)))
    }

    async fn accept(&self, rules: TaxRuleSet, body: Vec<u8>) -> RefreshOutcome {
        let sequence = self.next_sequence();
        let version = rules.version.clone();

        if let Some(cache) = self.cache.clone() {
            let (year, cached_version) = (rules.tax_year, version.clone());
            let write =
                task::spawn_blocking(move || cache.write(year, &cached_version, &body)).await;
            match write {
                Ok(Ok(_)) => {}
                Ok(Err(error)) => warn!(error = %error, "failed to cache refreshed rule data"),
                Err(error) => warn!(error = %error, "rule cache write task failed"),
            }
        }

        if self.promote(ActiveRules {
            tier: DataTier::Remote,
            version: version.clone(),
            rules: Arc::new(rules),
            sequence,
        }) {
            RefreshOutcome::Updated { version }
        } else {
            RefreshOutcome::UpToDate
        }
    }

    /// Runs [`refresh`](Self::refresh) on the runtime. Dropping the handle
    /// discards the outcome; the promotion still happens.
    pub fn spawn_refresh(self: &Arc<Self>) -> JoinHandle<RefreshOutcome> {
        let provider = Arc::clone(self);
        task::spawn(async move { provider.refresh().await })
    }

    /// Deletes the cache entry and drops back to the embedded floor if the
    /// active snapshot came from the cache.
    pub fn invalidate_cache(&self) -> Result<(), CacheError> {
        if let Some(cache) = &self.cache {
            cache.invalidate(self.tax_year())?;
        }

        let mut active = self.active.write().unwrap_or_else(PoisonError::into_inner);
        if active.tier == DataTier::Cached {
            info!(from = %active.version, "cache invalidated; reverting to embedded rule data");
            *active = Arc::new(ActiveRules {
                tier: DataTier::Embedded,
                version: self.embedded.version.clone(),
                rules: Arc::clone(&self.embedded),
                sequence: 0,
            });
        }
        Ok(())
    }
}
