// this_file: src/fortune.rs
//! Fortune table loading and random selection.
//!
//! The table is a JSON object keyed by one of eight fixed bucket keys
//! (coarse fortune-score bands), each holding a list of entries. It is
//! loaded once at startup and never mutated by the rendering pipeline.

use crate::error::{Error, Result};
use log::{error, info};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// The fixed bucket enumeration. Selection is uniform over these keys,
/// not over whatever subset the data file happens to contain.
pub const BUCKET_KEYS: [u32; 8] = [84, 0, 70, 28, 56, 42, 98, 14];

fn default_summary() -> String {
    "运势数据未知".to_string()
}

fn default_lucky_star() -> String {
    "幸运星未知".to_string()
}

fn default_sign_text() -> String {
    "星座运势未知".to_string()
}

fn default_unsign_text() -> String {
    "非星座运势未知".to_string()
}

/// One fortune record.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FortuneEntry {
    #[serde(default = "default_summary")]
    pub fortune_summary: String,
    #[serde(default = "default_lucky_star")]
    pub lucky_star: String,
    #[serde(default = "default_sign_text")]
    pub sign_text: String,
    #[serde(default = "default_unsign_text")]
    pub unsign_text: String,
}

/// Bucketed fortune table, keyed by normalized bucket id.
#[derive(Debug, Clone, Default)]
pub struct FortuneTable {
    buckets: HashMap<u32, Vec<FortuneEntry>>,
}

impl FortuneTable {
    /// Load the table from a JSON document.
    ///
    /// A missing file is created as an empty `{}` document. Malformed JSON
    /// is logged and treated as an empty table; neither case is fatal.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, "{}")?;
            info!("Created empty fortune data file: {}", path.display());
        }

        let raw = fs::read_to_string(path)?;
        let parsed: HashMap<String, Vec<FortuneEntry>> = match serde_json::from_str(&raw) {
            Ok(map) => map,
            Err(e) => {
                error!("Fortune data file {} is not valid JSON: {}", path.display(), e);
                HashMap::new()
            }
        };

        let table = Self::from_raw(parsed);
        info!(
            "Loaded fortune table from {} ({} buckets)",
            path.display(),
            table.buckets.len()
        );
        Ok(table)
    }

    /// Normalize raw string keys to integer bucket ids. Keys that do not
    /// parse as integers ("0" and " 14 " both do) are dropped with a log.
    fn from_raw(raw: HashMap<String, Vec<FortuneEntry>>) -> Self {
        let mut buckets = HashMap::new();
        for (key, entries) in raw {
            match key.trim().parse::<u32>() {
                Ok(id) => {
                    buckets.insert(id, entries);
                }
                Err(_) => {
                    error!("Ignoring fortune bucket with non-numeric key {:?}", key);
                }
            }
        }
        Self { buckets }
    }

    /// True when no bucket holds any entry.
    pub fn is_empty(&self) -> bool {
        self.buckets.values().all(|entries| entries.is_empty())
    }

    /// Number of buckets present in the table.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Pick a bucket key uniformly from the fixed enumeration.
    ///
    /// The draw is over [`BUCKET_KEYS`], so a table missing the drawn key
    /// surfaces as [`Error::BucketMissing`] rather than silently retrying;
    /// incomplete data files should be noticed, not papered over.
    pub fn pick_bucket(&self, rng: &mut impl Rng) -> Result<u32> {
        let key = *BUCKET_KEYS
            .choose(rng)
            .expect("bucket enumeration is non-empty");
        if !self.buckets.contains_key(&key) {
            return Err(Error::BucketMissing(key));
        }
        Ok(key)
    }

    /// Pick a uniformly random entry: bucket first, then index.
    pub fn pick_entry(&self, rng: &mut impl Rng) -> Result<&FortuneEntry> {
        if self.is_empty() {
            return Err(Error::NoFortuneData);
        }
        let key = self.pick_bucket(rng)?;
        let entries = &self.buckets[&key];
        if entries.is_empty() {
            return Err(Error::BucketMissing(key));
        }
        let idx = rng.gen_range(0..entries.len());
        Ok(&entries[idx])
    }

    #[cfg(test)]
    pub(crate) fn from_buckets(buckets: HashMap<u32, Vec<FortuneEntry>>) -> Self {
        Self { buckets }
    }
}
