// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{fs, path::Path, sync::Arc, thread, time::Duration};

use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{Error, Package, Result};

const USER_AGENT: &str = concat!("sdk-updater/", env!("CARGO_PKG_VERSION"));
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 100;

/// a remote package catalog.
///
/// `packages` returns `None` until the source has been loaded; a source whose load
/// failed keeps returning `None` and contributes nothing to a resolution.
pub trait RepoSource: Send + Sync {
    fn url(&self) -> &str;

    fn packages(&self) -> Option<Vec<Arc<Package>>>;

    /// fetches the catalog, blocking. `force_http` downgrades https urls.
    fn load(&self, force_http: bool) -> Result<()>;
}

/// catalog file format.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub packages: Vec<Package>,
}

impl Catalog {
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// an in-memory source, always loaded.
pub struct StaticSource {
    url: String,
    packages: Vec<Arc<Package>>,
}

impl StaticSource {
    pub fn new(url: impl Into<String>, packages: Vec<Arc<Package>>) -> Self {
        Self {
            url: url.into(),
            packages,
        }
    }
}

impl RepoSource for StaticSource {
    fn url(&self) -> &str {
        &self.url
    }

    fn packages(&self) -> Option<Vec<Arc<Package>>> {
        Some(self.packages.clone())
    }

    fn load(&self, _force_http: bool) -> Result<()> {
        Ok(())
    }
}

/// a json catalog reachable over http(s), as a `file://` url, or as a plain path.
pub struct CatalogSource {
    url: String,
    client: Option<reqwest::blocking::Client>,
    packages: RwLock<Option<Vec<Arc<Package>>>>,
}

impl CatalogSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: None,
            packages: RwLock::new(None),
        }
    }

    /// reuses an existing http client.
    pub fn with_client(mut self, client: reqwest::blocking::Client) -> Self {
        self.client = Some(client);
        self
    }

    fn is_http(url: &str) -> bool {
        url.starts_with("http://") || url.starts_with("https://")
    }

    fn effective_url(&self, force_http: bool) -> String {
        match self.url.strip_prefix("https://") {
            Some(rest) if force_http => format!("http://{rest}"),
            _ => self.url.clone(),
        }
    }

    fn fetch(&self, url: &str) -> Result<String> {
        let client = match &self.client {
            Some(client) => client.clone(),
            None => create_http_client()?,
        };

        let mut backoff_ms = INITIAL_BACKOFF_MS;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match fetch_once(&client, url) {
                Ok(body) => return Ok(body),
                Err(e) if attempt < MAX_RETRIES => {
                    log::debug!("**sources:** attempt {attempt} for {url} failed: {e}");
                    thread::sleep(Duration::from_millis(backoff_ms));
                    backoff_ms *= 2;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn read(&self, force_http: bool) -> Result<String> {
        let url = self.effective_url(force_http);

        if Self::is_http(&url) {
            return self.fetch(&url);
        }

        let path = url.strip_prefix("file://").unwrap_or(&url);
        Ok(fs::read_to_string(Path::new(path))?)
    }
}

impl RepoSource for CatalogSource {
    fn url(&self) -> &str {
        &self.url
    }

    fn packages(&self) -> Option<Vec<Arc<Package>>> {
        self.packages.read().clone()
    }

    fn load(&self, force_http: bool) -> Result<()> {
        let body = self.read(force_http)?;
        let catalog = Catalog::parse(&body)?;

        let packages: Vec<Arc<Package>> = catalog
            .packages
            .into_iter()
            .map(|mut p| {
                if p.source_url.is_none() {
                    p.source_url = Some(self.url.clone());
                }
                Arc::new(p)
            })
            .collect();

        log::debug!(
            "**sources:** loaded {} package(s) from {}",
            packages.len(),
            self.url
        );
        *self.packages.write() = Some(packages);
        Ok(())
    }
}

pub fn create_http_client() -> Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(60))
        .user_agent(USER_AGENT)
        .build()?)
}

fn fetch_once(client: &reqwest::blocking::Client, url: &str) -> Result<String> {
    let response = client.get(url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::ApiError(status.as_u16()));
    }
    Ok(response.text()?)
}

/// the catalogs a resolution reads from, in priority order.
#[derive(Default)]
pub struct RepoSources {
    sources: Vec<Box<dyn RepoSource>>,
}

impl RepoSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// one [`CatalogSource`] per url, sharing a single http client.
    pub fn from_urls(urls: &[String]) -> Result<Self> {
        let client = create_http_client()?;
        let mut sources = Self::new();
        for url in urls {
            sources.add(CatalogSource::new(url.clone()).with_client(client.clone()));
        }
        Ok(sources)
    }

    pub fn add(&mut self, source: impl RepoSource + 'static) {
        self.sources.push(Box::new(source));
    }

    pub fn sources(&self) -> &[Box<dyn RepoSource>] {
        &self.sources
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// loads every source in parallel. returns the sources that failed, which are
    /// left unloaded.
    pub fn load_all(&self, force_http: bool) -> Vec<(String, Error)> {
        let failures: Vec<(String, Error)> = self
            .sources
            .par_iter()
            .filter_map(|source| {
                source
                    .load(force_http)
                    .err()
                    .map(|e| (source.url().to_string(), e))
            })
            .collect();

        for (url, e) in &failures {
            log::warn!("**sources:** failed to load {url}: {e}");
        }

        failures
    }

    /// every package of every loaded source.
    pub fn all_packages(&self) -> Vec<Arc<Package>> {
        self.sources
            .iter()
            .filter_map(|s| s.packages())
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AndroidVersion, PackageDetails, PackageKind};

    const CATALOG: &str = r#"{
        "packages": [
            { "kind": "tool", "revision": 9, "min_platform_tools_rev": 3,
              "archives": [ { "url": "tools_r9.zip" } ] },
            { "kind": "platform", "revision": 1, "version": { "api_level": 9 },
              "min_tools_rev": 9, "archives": [ { "os": "linux", "url": "p9.zip" } ] },
            { "kind": "extra", "revision": 2, "vendor": "android", "path": "compat",
              "min_api_level": 4, "archives": [] }
        ]
    }"#;

    #[test]
    fn parse_catalog() {
        let catalog = Catalog::parse(CATALOG).unwrap();
        assert_eq!(catalog.packages.len(), 3);
        assert_eq!(catalog.packages[0].kind(), PackageKind::Tool);
        assert_eq!(catalog.packages[0].min_platform_tools_revision(), Some(3));
        assert_eq!(catalog.packages[1].version(), Some(&AndroidVersion::new(9)));
        assert_eq!(catalog.packages[2].min_api_level(), Some(4));
    }

    #[test]
    fn file_source_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repository.json");
        fs::write(&path, CATALOG).unwrap();

        let source = CatalogSource::new(path.to_string_lossy().to_string());
        assert!(source.packages().is_none());

        source.load(false).unwrap();
        let packages = source.packages().unwrap();
        assert_eq!(packages.len(), 3);
        assert_eq!(packages[0].source_url.as_deref(), Some(source.url()));
    }

    #[test]
    fn file_url_prefix_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repository.json");
        fs::write(&path, CATALOG).unwrap();

        let source = CatalogSource::new(format!("file://{}", path.display()));
        source.load(false).unwrap();
        assert_eq!(source.packages().unwrap().len(), 3);
    }

    #[test]
    fn failed_source_stays_unloaded() {
        let dir = tempfile::tempdir().unwrap();
        let mut sources = RepoSources::new();
        sources.add(CatalogSource::new(
            dir.path().join("missing.json").to_string_lossy().to_string(),
        ));
        sources.add(StaticSource::new(
            "memory",
            vec![Package::new(1, PackageDetails::PlatformTool).into_ref()],
        ));

        let failures = sources.load_all(false);
        assert_eq!(failures.len(), 1);
        assert!(sources.sources()[0].packages().is_none());
        assert_eq!(sources.all_packages().len(), 1);
    }

    #[test]
    fn force_http_downgrades_https() {
        let source = CatalogSource::new("https://dl.example.com/repository.json");
        assert_eq!(
            source.effective_url(true),
            "http://dl.example.com/repository.json"
        );
        assert_eq!(
            source.effective_url(false),
            "https://dl.example.com/repository.json"
        );
    }
}
