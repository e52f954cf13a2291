// this_file: src/assets.rs
//! Remote asset fetching and on-disk caching.
//!
//! Avatars are cached per user id with a freshness TTL; background
//! photographs are cached permanently by URL basename. All fetches are
//! bounded by one hard timeout and all cache writes go through a
//! write-then-rename so concurrent requests never observe a torn file.

use crate::config::PosterConfig;
use crate::error::{Error, Result};
use log::{debug, info, warn};
use rand::seq::SliceRandom;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fetches and caches avatars and backgrounds.
pub struct AssetCache {
    avatar_dir: PathBuf,
    background_dir: PathBuf,
    image_dir: PathBuf,
    avatar_url: String,
    avatar_ttl: Duration,
    client: reqwest::blocking::Client,
}

impl AssetCache {
    pub fn new(config: &PosterConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .map_err(|e| Error::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self {
            avatar_dir: config.avatar_dir.clone(),
            background_dir: config.background_dir.clone(),
            image_dir: config.background_image_dir(),
            avatar_url: config.avatar_url.clone(),
            avatar_ttl: config.avatar_ttl,
            client,
        })
    }

    /// Canonical cache path for a user's avatar.
    pub fn avatar_path(&self, user_id: &str) -> PathBuf {
        self.avatar_dir.join(format!("{}.jpg", user_id))
    }

    /// Return the cached avatar if it exists and is still fresh.
    pub fn cached_avatar(&self, user_id: &str) -> Option<PathBuf> {
        let path = self.avatar_path(user_id);
        let age = fs::metadata(&path).and_then(|m| m.modified()).ok()?;
        match age.elapsed() {
            Ok(elapsed) if elapsed < self.avatar_ttl => Some(path),
            // A file dated in the future counts as fresh; the next
            // rewrite fixes its timestamp.
            Err(_) => Some(path),
            Ok(_) => None,
        }
    }

    /// Fetch the user's avatar, reusing the cache within the TTL.
    pub fn fetch_avatar(&self, user_id: &str) -> Result<PathBuf> {
        if let Some(path) = self.cached_avatar(user_id) {
            debug!("Avatar cache hit for user {}", user_id);
            return Ok(path);
        }

        let url = self.avatar_url.replace("{user}", user_id);
        let path = self.avatar_path(user_id);
        self.download(&url, &path)?;
        info!("Fetched avatar for user {}", user_id);
        Ok(path)
    }

    /// Pick a random background URL from the manifests and return its
    /// cached image, fetching on a cache miss.
    ///
    /// Backgrounds never expire. The cache key is the URL basename, so
    /// two URLs sharing a basename share one cache file; the first
    /// download wins. That collision is accepted behavior.
    pub fn fetch_background(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.background_dir)?;
        let mut manifests = Vec::new();
        for entry in fs::read_dir(&self.background_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "txt") {
                manifests.push(path);
            }
        }
        if manifests.is_empty() {
            return Err(Error::NoBackgroundsConfigured);
        }

        let mut rng = rand::thread_rng();
        let manifest = manifests
            .choose(&mut rng)
            .expect("manifest list is non-empty");
        let content = fs::read_to_string(manifest)?;
        let urls: Vec<&str> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let Some(url) = urls.choose(&mut rng) else {
            warn!("Manifest {} holds no URLs", manifest.display());
            return Err(Error::NoBackgroundsConfigured);
        };

        let path = self.background_cache_path(url)?;
        if path.exists() {
            debug!("Background cache hit: {}", path.display());
            return Ok(path);
        }

        self.download(url, &path)?;
        info!("Fetched background {}", url);
        Ok(path)
    }

    /// Cache file for a background URL: keyed by basename only.
    pub fn background_cache_path(&self, url: &str) -> Result<PathBuf> {
        let basename = url.rsplit('/').next().unwrap_or_default();
        if basename.is_empty() {
            return Err(Error::FetchFailed(format!(
                "background URL {:?} has no file name",
                url
            )));
        }
        Ok(self.image_dir.join(basename))
    }

    /// GET `url` and persist the body at `dest` atomically.
    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        let dir = dest
            .parent()
            .ok_or_else(|| Error::Configuration(format!("no parent for {}", dest.display())))?;
        // Idempotent under concurrent callers.
        fs::create_dir_all(dir)?;

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| Error::FetchFailed(format!("{}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(Error::FetchFailed(format!(
                "{}: HTTP {}",
                url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .map_err(|e| Error::FetchFailed(format!("{}: {}", url, e)))?;

        // Write-then-rename: concurrent writers race safely, last one wins.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(dest)
            .map_err(|e| Error::FetchFailed(format!("persist {}: {}", dest.display(), e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn cache_in(dir: &Path) -> AssetCache {
        let mut config = PosterConfig::new(dir);
        // Unroutable endpoint so accidental fetches fail fast.
        config.avatar_url = "http://127.0.0.1:9/avatar/{user}".to_string();
        config.fetch_timeout = Duration::from_millis(200);
        AssetCache::new(&config).unwrap()
    }

    #[test]
    fn fresh_avatar_is_served_from_cache_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        let path = cache.avatar_path("12345");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"jpeg bytes").unwrap();

        // The avatar URL is unroutable, so success proves no fetch happened.
        let got = cache.fetch_avatar("12345").unwrap();
        assert_eq!(got, path);
        assert_eq!(fs::read(&got).unwrap(), b"jpeg bytes");
    }

    #[test]
    fn zero_ttl_treats_cached_avatar_as_stale() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PosterConfig::new(dir.path());
        config.avatar_url = "http://127.0.0.1:9/avatar/{user}".to_string();
        config.fetch_timeout = Duration::from_millis(200);
        config.avatar_ttl = Duration::ZERO;
        let cache = AssetCache::new(&config).unwrap();

        let path = cache.avatar_path("12345");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"old").unwrap();

        assert!(cache.cached_avatar("12345").is_none());
        // Stale entry forces a refetch, which fails against the dead endpoint.
        let err = cache.fetch_avatar("12345").unwrap_err();
        assert!(matches!(err, Error::FetchFailed(_)));
    }

    #[test]
    fn missing_avatar_fetch_failure_is_typed() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        let err = cache.fetch_avatar("404").unwrap_err();
        assert!(matches!(err, Error::FetchFailed(_)));
    }

    #[test]
    fn no_manifests_is_a_typed_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        let err = cache.fetch_background().unwrap_err();
        assert!(matches!(err, Error::NoBackgroundsConfigured));
    }

    #[test]
    fn empty_manifest_is_a_typed_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        fs::create_dir_all(dir.path().join("backgroundFolder")).unwrap();
        fs::write(dir.path().join("backgroundFolder/list.txt"), "\n  \n").unwrap();
        let err = cache.fetch_background().unwrap_err();
        assert!(matches!(err, Error::NoBackgroundsConfigured));
    }

    #[test]
    fn cached_background_is_returned_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        let bg_dir = dir.path().join("backgroundFolder");
        fs::create_dir_all(bg_dir.join("images")).unwrap();
        fs::write(
            bg_dir.join("list.txt"),
            "http://127.0.0.1:9/photos/scene.jpg\n",
        )
        .unwrap();
        fs::write(bg_dir.join("images/scene.jpg"), b"cached image").unwrap();

        // Unroutable URL, so this must come from the cache.
        let path = cache.fetch_background().unwrap();
        assert_eq!(path, bg_dir.join("images/scene.jpg"));
    }

    #[test]
    fn urls_with_the_same_basename_share_one_cache_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        let a = cache
            .background_cache_path("http://host-a.example/x/scene.jpg")
            .unwrap();
        let b = cache
            .background_cache_path("http://host-b.example/y/scene.jpg")
            .unwrap();
        // Documented collision: basename is the whole cache key.
        assert_eq!(a, b);
    }

    #[test]
    fn url_without_basename_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        let err = cache.background_cache_path("http://host/").unwrap_err();
        assert!(matches!(err, Error::FetchFailed(_)));
    }
}
