// Gallery image download. Galleries are fetched one after another, each
// into `<base>/<name> - <id>/NNN.<ext>`, and images already on disk are left
// alone so an interrupted run can simply be repeated.

use std::fs;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use reqwest::Url;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::ui;

const DEFAULT_EXTENSION: &str = "jpg";

/// A gallery reduced to what the download needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gallery {
    pub id: String,
    pub name: String,
    pub image_urls: Vec<String>,
}

impl Gallery {
    /// Build from a `galleries.edges[].node` object. Images prefer the
    /// full-size URL.
    pub fn from_node(node: &Value) -> Option<Gallery> {
        let id = match node.get("id")? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        let name = node
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(&id)
            .to_string();
        let image_urls = node
            .pointer("/paginatedImages/edges")
            .and_then(Value::as_array)
            .map(|edges| {
                edges
                    .iter()
                    .filter_map(|edge| {
                        let image = edge.get("node")?;
                        ["imageUrlFull", "imageUrl"]
                            .iter()
                            .filter_map(|key| image.get(*key).and_then(Value::as_str))
                            .find(|url| !url.is_empty())
                            .map(str::to_string)
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(Gallery {
            id,
            name,
            image_urls,
        })
    }

    /// Directory this gallery is saved into under `base`. Both the name and
    /// the id come from the server, so both are sanitized.
    pub fn target_dir(&self, base: &Path) -> PathBuf {
        base.join(format!(
            "{} - {}",
            sanitize_name(&self.name),
            sanitize_name(&self.id)
        ))
    }
}

/// Galleries of a `galleries` query answer (`data` object).
pub fn galleries_from(data: &Value) -> Vec<Gallery> {
    data.pointer("/galleries/edges")
        .and_then(Value::as_array)
        .map(|edges| {
            edges
                .iter()
                .filter_map(|edge| edge.get("node"))
                .filter_map(Gallery::from_node)
                .collect()
        })
        .unwrap_or_default()
}

/// Directory-safe gallery name: no path separators, single spaces.
pub fn sanitize_name(name: &str) -> String {
    let replaced = name.trim().replace(['/', '\\'], "_");
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        "gallery".to_string()
    } else {
        collapsed
    }
}

/// Extension of the file a URL points at, ignoring query and fragment.
pub fn extension_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            Path::new(u.path())
                .extension()
                .and_then(|e| e.to_str())
                .filter(|e| !e.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// File name of the `index`-th image (1-based).
pub fn image_file_name(index: usize, url: &str) -> String {
    format!("{index:03}.{}", extension_of(url))
}

pub struct Downloader {
    http: Client,
}

impl Downloader {
    pub fn new(timeout: std::time::Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Network)?;
        Ok(Downloader { http })
    }

    /// Download every gallery in order. With `skip_downloaded`, galleries
    /// whose directory already exists are left out. Returns the directories
    /// written to.
    pub fn download_all(
        &self,
        galleries: &[Gallery],
        base: &Path,
        skip_downloaded: bool,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for gallery in galleries {
            let dir = gallery.target_dir(base);
            if skip_downloaded && dir.exists() {
                tracing::debug!(id = %gallery.id, dir = %dir.display(), "already downloaded");
                continue;
            }
            written.push(self.download(gallery, base)?);
        }
        Ok(written)
    }

    /// Download one gallery into its directory under `base`.
    pub fn download(&self, gallery: &Gallery, base: &Path) -> Result<PathBuf> {
        let dir = gallery.target_dir(base);
        fs::create_dir_all(&dir)?;

        let bar = ui::progress_bar(gallery.image_urls.len() as u64, sanitize_name(&gallery.name));
        for (i, url) in gallery.image_urls.iter().enumerate() {
            let path = dir.join(image_file_name(i + 1, url));
            if path.exists() {
                bar.inc(1);
                continue;
            }
            tracing::debug!(%url, path = %path.display(), "downloading image");
            let res = self.http.get(url).send()?;
            let status = res.status();
            if !status.is_success() {
                bar.abandon();
                return Err(Error::Http {
                    status: status.as_u16(),
                    body: format!("downloading {url}"),
                });
            }
            fs::write(&path, res.bytes()?)?;
            bar.inc(1);
        }
        bar.finish_and_clear();
        Ok(dir)
    }
}
