//! Map tile fetching.
//!
//! [`HttpTileFetcher`] downloads tiles from a URL template; [`TileCache`]
//! wraps any fetcher with a directory of previously downloaded tiles.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use heatmap_common::{HeatmapError, HeatmapResult, TileCoord};
use reqwest::{header, Client};
use tokio::fs;
use tracing::{debug, instrument, warn};

use crate::config::HeatmapConfig;

/// Source of encoded (PNG/JPEG) tile images.
#[async_trait]
pub trait TileFetcher: Send + Sync {
    async fn fetch(&self, tile: TileCoord) -> HeatmapResult<Bytes>;
}

/// Fetches tiles over HTTP.
pub struct HttpTileFetcher {
    client: Client,
    url_template: String,
    fetch_delay: Duration,
}

impl HttpTileFetcher {
    pub fn new(config: &HeatmapConfig) -> HeatmapResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| HeatmapError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url_template: config.tile_url.clone(),
            fetch_delay: config.fetch_delay(),
        })
    }

    /// Expand the URL template for one tile.
    pub fn tile_url(&self, tile: TileCoord) -> String {
        expand_template(&self.url_template, tile)
    }
}

pub(crate) fn expand_template(template: &str, tile: TileCoord) -> String {
    template
        .replace("{z}", &tile.z.to_string())
        .replace("{x}", &tile.x.to_string())
        .replace("{y}", &tile.y.to_string())
}

#[async_trait]
impl TileFetcher for HttpTileFetcher {
    #[instrument(skip(self), fields(tile = %tile))]
    async fn fetch(&self, tile: TileCoord) -> HeatmapResult<Bytes> {
        let url = self.tile_url(tile);
        let fetch_error = |message: String| HeatmapError::TileFetch {
            tile: tile.to_string(),
            message,
        };

        debug!(url = %url, "Fetching tile");
        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "image/png,image/*")
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        // Be polite to the tile server.
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }

        Ok(body)
    }
}

/// On-disk tile cache in front of another fetcher.
///
/// Tiles are stored as `tile_{z}_{x}_{y}.png`. Only successful fetches whose
/// content looks like an image are written; failures are retried on the
/// next run.
pub struct TileCache<F> {
    dir: PathBuf,
    inner: F,
}

impl<F: TileFetcher> TileCache<F> {
    pub fn new(dir: impl Into<PathBuf>, inner: F) -> Self {
        Self {
            dir: dir.into(),
            inner,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// Cache file for a tile.
    pub fn path_for(&self, tile: TileCoord) -> PathBuf {
        self.dir
            .join(format!("tile_{}_{}_{}.png", tile.z, tile.x, tile.y))
    }

    async fn store(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir).await?;
        fs::write(path, bytes).await
    }
}

#[async_trait]
impl<F: TileFetcher> TileFetcher for TileCache<F> {
    async fn fetch(&self, tile: TileCoord) -> HeatmapResult<Bytes> {
        let path = self.path_for(tile);

        match fs::read(&path).await {
            Ok(bytes) => {
                debug!(tile = %tile, path = %path.display(), "Tile cache hit");
                return Ok(Bytes::from(bytes));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(
                    tile = %tile,
                    path = %path.display(),
                    error = %e,
                    "Unreadable cached tile, refetching"
                );
            }
        }

        let bytes = self.inner.fetch(tile).await?;

        if image::guess_format(&bytes).is_err() {
            warn!(tile = %tile, size = bytes.len(), "Fetched tile is not an image, not caching");
            return Ok(bytes);
        }

        if let Err(e) = self.store(&path, &bytes).await {
            warn!(tile = %tile, path = %path.display(), error = %e, "Failed to cache tile");
        }

        Ok(bytes)
    }
}
