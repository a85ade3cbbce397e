//! Item manifests produced by the course enumerator.
//!
//! TOML manifests hold `[[item]]` tables; `.json` manifests hold a plain
//! array of items. Either way every item is validated, and keys and
//! destinations must be unique.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::item::DownloadItem;

#[derive(Debug, Default, Serialize, Deserialize)]
struct TomlManifest {
    #[serde(default, rename = "item")]
    items: Vec<DownloadItem>,
}

/// Load and validate a manifest; the format follows the file extension.
pub fn load(path: &Path) -> Result<Vec<DownloadItem>> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("read manifest: {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let items = if is_json {
        parse_json(&data)
    } else {
        parse_toml(&data)
    }
    .with_context(|| format!("invalid manifest: {}", path.display()))?;
    tracing::debug!(items = items.len(), "loaded manifest {}", path.display());
    Ok(items)
}

pub fn parse_toml(data: &str) -> Result<Vec<DownloadItem>> {
    let manifest: TomlManifest = toml::from_str(data)?;
    check(manifest.items)
}

pub fn parse_json(data: &str) -> Result<Vec<DownloadItem>> {
    let items: Vec<DownloadItem> = serde_json::from_str(data)?;
    check(items)
}

/// Render items as a TOML manifest.
pub fn to_toml(items: &[DownloadItem]) -> Result<String> {
    let manifest = TomlManifest {
        items: items.to_vec(),
    };
    Ok(toml::to_string_pretty(&manifest)?)
}

fn check(items: Vec<DownloadItem>) -> Result<Vec<DownloadItem>> {
    let mut seen = HashSet::new();
    let mut destinations = HashMap::new();
    for item in &items {
        item.validate()?;
        let parsed = url::Url::parse(&item.url)
            .with_context(|| format!("item {}: bad url {:?}", item.key, item.url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!("item {}: unsupported url scheme {:?}", item.key, parsed.scheme());
        }
        if !seen.insert(item.key.as_str()) {
            bail!("duplicate item key {:?}", item.key);
        }
        if let Some(other) = destinations.insert(item.normalized_destination(), item.key.as_str()) {
            bail!(
                "items {:?} and {:?} share destination {}",
                other,
                item.key,
                item.destination.display()
            );
        }
    }
    Ok(items)
}
