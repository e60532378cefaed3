//! Dataset loading with a per-URL time-to-live cache.

use crate::data::Dataset;
use crate::error::{DashError, Result};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Source of raw CSV text for a URL.
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Fetches published spreadsheet exports over HTTP(S).
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DashError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        let load_err = |reason: String| DashError::DataLoad {
            url: url.to_string(),
            reason,
        };
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| load_err(e.to_string()))?
            .error_for_status()
            .map_err(|e| load_err(e.to_string()))?;
        response.text().map_err(|e| load_err(e.to_string()))
    }
}

struct CacheEntry {
    dataset: Dataset,
    expires_at: Instant,
}

/// Datasets keyed by URL, each owning its expiry instant.
pub struct LoadCache {
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

impl LoadCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, url: &str, now: Instant) -> Option<&Dataset> {
        self.entries
            .get(url)
            .filter(|e| now < e.expires_at)
            .map(|e| &e.dataset)
    }

    pub fn insert(&mut self, url: &str, dataset: Dataset, now: Instant) {
        self.entries.insert(
            url.to_string(),
            CacheEntry {
                dataset,
                expires_at: now + self.ttl,
            },
        );
    }

    /// Drop every entry that has expired at `now`.
    pub fn evict_expired(&mut self, now: Instant) {
        self.entries.retain(|_, e| now < e.expires_at);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of a load that never fails: on error the dataset is empty and the
/// error is kept for display.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub dataset: Dataset,
    pub error: Option<DashError>,
}

pub struct DataLoader<F: Fetcher> {
    fetcher: F,
    cache: LoadCache,
}

impl DataLoader<HttpFetcher> {
    pub fn http(ttl: Duration) -> Result<Self> {
        Ok(Self::new(HttpFetcher::new()?, ttl))
    }
}

impl<F: Fetcher> DataLoader<F> {
    pub fn new(fetcher: F, ttl: Duration) -> Self {
        Self {
            fetcher,
            cache: LoadCache::new(ttl),
        }
    }

    pub fn cache(&self) -> &LoadCache {
        &self.cache
    }

    pub fn load(&mut self, url: &str) -> Result<Dataset> {
        self.load_at(url, Instant::now())
    }

    /// Load `url` as of `now`; a cached copy younger than the TTL is returned
    /// without fetching again.
    pub fn load_at(&mut self, url: &str, now: Instant) -> Result<Dataset> {
        if let Some(dataset) = self.cache.get(url, now) {
            debug!("cache hit for {}", url);
            return Ok(dataset.clone());
        }

        self.cache.evict_expired(now);
        debug!("cache miss for {}, fetching", url);
        let text = self.fetcher.fetch(url)?;
        let dataset = Dataset::from_csv_str(&text).map_err(|e| DashError::DataLoad {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        info!(
            "loaded {} rows x {} columns from {}",
            dataset.len(),
            dataset.headers.len(),
            url
        );
        self.cache.insert(url, dataset.clone(), now);
        Ok(dataset)
    }

    pub fn load_or_empty(&mut self, url: &str) -> LoadOutcome {
        self.load_or_empty_at(url, Instant::now())
    }

    pub fn load_or_empty_at(&mut self, url: &str, now: Instant) -> LoadOutcome {
        match self.load_at(url, now) {
            Ok(dataset) => LoadOutcome {
                dataset,
                error: None,
            },
            Err(e) => {
                warn!("{}", e);
                LoadOutcome {
                    dataset: Dataset::empty(),
                    error: Some(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingFetcher {
        body: Option<&'static str>,
        calls: Cell<usize>,
    }

    impl CountingFetcher {
        fn ok(body: &'static str) -> Self {
            Self { body: Some(body), calls: Cell::new(0) }
        }

        fn failing() -> Self {
            Self { body: None, calls: Cell::new(0) }
        }
    }

    impl Fetcher for &CountingFetcher {
        fn fetch(&self, url: &str) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            self.body.map(|b| b.to_string()).ok_or_else(|| DashError::DataLoad {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            })
        }
    }

    const CSV: &str = " Departamento , Valor\nA,10\nB,20\nA,30\n";

    #[test]
    fn test_load_trims_headers() {
        let fetcher = CountingFetcher::ok(CSV);
        let mut loader = DataLoader::new(&fetcher, DEFAULT_TTL);
        let data = loader.load("http://x/pub?output=csv").unwrap();
        assert_eq!(data.headers, vec!["Departamento", "Valor"]);
        assert_eq!(data.len(), 3);
    }

    #[test]
    fn test_cache_within_ttl() {
        let fetcher = CountingFetcher::ok(CSV);
        let mut loader = DataLoader::new(&fetcher, DEFAULT_TTL);
        let t0 = Instant::now();
        loader.load_at("u", t0).unwrap();
        loader.load_at("u", t0 + Duration::from_secs(599)).unwrap();
        assert_eq!(fetcher.calls.get(), 1);
    }

    #[test]
    fn test_cache_expires() {
        let fetcher = CountingFetcher::ok(CSV);
        let mut loader = DataLoader::new(&fetcher, DEFAULT_TTL);
        let t0 = Instant::now();
        loader.load_at("u", t0).unwrap();
        loader.load_at("u", t0 + Duration::from_secs(600)).unwrap();
        assert_eq!(fetcher.calls.get(), 2);
    }

    #[test]
    fn test_cache_keyed_by_url() {
        let fetcher = CountingFetcher::ok(CSV);
        let mut loader = DataLoader::new(&fetcher, DEFAULT_TTL);
        let t0 = Instant::now();
        loader.load_at("a", t0).unwrap();
        loader.load_at("b", t0).unwrap();
        assert_eq!(fetcher.calls.get(), 2);
        assert_eq!(loader.cache().len(), 2);
    }

    #[test]
    fn test_failure_yields_empty_dataset() {
        let fetcher = CountingFetcher::failing();
        let mut loader = DataLoader::new(&fetcher, DEFAULT_TTL);
        let outcome = loader.load_or_empty("u");
        assert!(outcome.dataset.is_empty());
        assert!(matches!(outcome.error, Some(DashError::DataLoad { .. })));
    }

    #[test]
    fn test_failures_are_not_cached() {
        let fetcher = CountingFetcher::failing();
        let mut loader = DataLoader::new(&fetcher, DEFAULT_TTL);
        let t0 = Instant::now();
        let _ = loader.load_or_empty_at("u", t0);
        let _ = loader.load_or_empty_at("u", t0);
        assert_eq!(fetcher.calls.get(), 2);
        assert!(loader.cache().is_empty());
    }
}
