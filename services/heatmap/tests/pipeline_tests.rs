//! End-to-end pipeline tests against in-memory tile sources.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use heatmap::export::{csv_output_path, png_output_path, write_csv_file, write_png};
use heatmap::{HeatmapConfig, HeatmapPipeline, RenderRequest, TileCache, TileFetcher};
use heatmap_common::tile::tile_to_latlon_bounds;
use heatmap_common::{
    BoundingBox, HeatmapError, HeatmapResult, TileCoord, TileRange, TrackPoint, TrackSet,
};
use renderer::density::DensityThreshold;
use renderer::RgbRaster;
use test_utils::{solid_png_tile, tracks};

// ============================================================================
// Mock tile sources
// ============================================================================

/// Serves the same encoded tile for every request and records the calls.
struct StaticTiles {
    bytes: Vec<u8>,
    calls: Mutex<Vec<TileCoord>>,
}

impl StaticTiles {
    fn png(rgb: [u8; 3]) -> Self {
        Self::raw(solid_png_tile(256, rgb))
    }

    fn raw(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<TileCoord> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TileFetcher for StaticTiles {
    async fn fetch(&self, tile: TileCoord) -> HeatmapResult<Bytes> {
        self.calls.lock().unwrap().push(tile);
        Ok(Bytes::from(self.bytes.clone()))
    }
}

/// Always fails, counting attempts.
#[derive(Default)]
struct Unreachable {
    attempts: AtomicUsize,
}

#[async_trait]
impl TileFetcher for Unreachable {
    async fn fetch(&self, tile: TileCoord) -> HeatmapResult<Bytes> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(HeatmapError::TileFetch {
            tile: tile.to_string(),
            message: "connection refused".to_string(),
        })
    }
}

fn alpine_walk() -> TrackSet {
    tracks::ALPINE_WALK
        .iter()
        .map(|&(lat, lon)| TrackPoint::new(lat, lon))
        .collect()
}

fn uniform_request(zoom: u32) -> RenderRequest {
    RenderRequest {
        zoom,
        sigma: 1,
        bounds: BoundingBox::world(),
        threshold: DensityThreshold::Uniform,
    }
}

// ============================================================================
// Three-point scenario
// ============================================================================

#[tokio::test]
async fn test_three_points_single_tile() {
    let pipeline = HeatmapPipeline::new(HeatmapConfig::default(), StaticTiles::png([255, 255, 255]))
        .unwrap();
    let output = pipeline
        .render(&alpine_walk(), &uniform_request(14))
        .await
        .unwrap();

    assert_eq!(pipeline.fetcher().calls(), vec![TileCoord::new(14, 8510, 5893)]);
    assert_eq!(output.range.count(), 1);
    assert_eq!(output.image.shape(), (256, 256));
    assert_eq!(output.fallback_tiles, 0);

    // Three disjoint 3x3 squares of ones.
    assert_eq!(output.thresholded.sum(), 27.0);
    assert_eq!(output.thresholded.min_max(), Some((0.0, 1.0)));

    let (min, max) = output.density.min_max().unwrap();
    assert_eq!(min, 0.0);
    assert_eq!(max, 1.0);
}

#[tokio::test]
async fn test_white_map_composite_is_overlay() {
    let pipeline = HeatmapPipeline::new(HeatmapConfig::default(), StaticTiles::png([255, 255, 255]))
        .unwrap();
    let output = pipeline
        .render(&alpine_walk(), &uniform_request(14))
        .await
        .unwrap();

    // Far from any track: inverted white is black and there is no overlay.
    assert_eq!(output.image.pixel(0, 0), [0.0, 0.0, 0.0]);
    // The brightest density maps to white in the hot colormap.
    let brightest = output
        .density
        .cells()
        .find(|&(_, _, v)| v == 1.0)
        .map(|(r, c, _)| (r, c))
        .unwrap();
    assert_eq!(output.image.pixel(brightest.0, brightest.1), [1.0, 1.0, 1.0]);
}

#[tokio::test]
async fn test_cumulative_mode_matches_uniform_for_sparse_tracks() {
    // At zoom 14 the ceiling is above 1, so single visits are unchanged.
    let pipeline = HeatmapPipeline::new(HeatmapConfig::default(), StaticTiles::png([200, 200, 200]))
        .unwrap();
    let cumulative = RenderRequest {
        threshold: DensityThreshold::default(),
        ..uniform_request(14)
    };
    let a = pipeline.render(&alpine_walk(), &cumulative).await.unwrap();
    let b = pipeline.render(&alpine_walk(), &uniform_request(14)).await.unwrap();
    assert_eq!(a.thresholded, b.thresholded);
}

#[tokio::test]
async fn test_uniform_threshold_ignores_repeats() {
    let pipeline = HeatmapPipeline::new(HeatmapConfig::default(), StaticTiles::png([255, 255, 255]))
        .unwrap();

    let mut doubled = alpine_walk();
    doubled.merge(alpine_walk());

    let once = pipeline.render(&alpine_walk(), &uniform_request(14)).await.unwrap();
    let twice = pipeline.render(&doubled, &uniform_request(14)).await.unwrap();
    assert_eq!(once.thresholded, twice.thresholded);
    assert_eq!(once.density, twice.density);
}

// ============================================================================
// Tile failures
// ============================================================================

#[tokio::test]
async fn test_fetch_failure_uses_white_tile() {
    let pipeline = HeatmapPipeline::new(HeatmapConfig::default(), Unreachable::default()).unwrap();
    let output = pipeline
        .render(&alpine_walk(), &uniform_request(14))
        .await
        .unwrap();

    assert_eq!(pipeline.fetcher().attempts.load(Ordering::SeqCst), 1);
    assert_eq!(output.fallback_tiles, 1);
    assert_eq!(output.image.shape(), (256, 256));
    assert_eq!(output.image.pixel(0, 0), [0.0, 0.0, 0.0]);
}

#[tokio::test]
async fn test_fetch_failure_fills_block_with_white() {
    let pipeline = HeatmapPipeline::new(HeatmapConfig::default(), Unreachable::default()).unwrap();
    let range = TileRange {
        zoom: 5,
        x_min: 10,
        x_max: 11,
        y_min: 7,
        y_max: 8,
    };
    let (mosaic, fallbacks) = pipeline.assemble_mosaic(&range).await.unwrap();

    assert_eq!(fallbacks, 4);
    assert_eq!(pipeline.fetcher().attempts.load(Ordering::SeqCst), 4);
    for tile in range.tiles() {
        assert_eq!(mosaic.tile_block(tile), Some(RgbRaster::white(256)));
    }
}

#[tokio::test]
async fn test_undecodable_tile_uses_white_tile() {
    let pipeline = HeatmapPipeline::new(
        HeatmapConfig::default(),
        StaticTiles::raw(b"<html>rate limited</html>".to_vec()),
    )
    .unwrap();
    let output = pipeline
        .render(&alpine_walk(), &uniform_request(14))
        .await
        .unwrap();
    assert_eq!(output.fallback_tiles, 1);
}

#[tokio::test]
async fn test_wrong_tile_size_uses_white_tile() {
    let pipeline = HeatmapPipeline::new(
        HeatmapConfig::default(),
        StaticTiles::raw(solid_png_tile(128, [0, 0, 0])),
    )
    .unwrap();
    let (mosaic, fallbacks) = pipeline
        .assemble_mosaic(&TileRange {
            zoom: 3,
            x_min: 0,
            x_max: 1,
            y_min: 0,
            y_max: 0,
        })
        .await
        .unwrap();

    assert_eq!(fallbacks, 2);
    assert!(mosaic.raster().data().iter().all(|&v| v == 1.0));
}

// ============================================================================
// Input validation
// ============================================================================

#[tokio::test]
async fn test_tile_gate_runs_before_any_fetch() {
    let pipeline = HeatmapPipeline::new(HeatmapConfig::default(), Unreachable::default()).unwrap();
    let spread: TrackSet = [(45.0, 7.0), (46.0, 8.0)]
        .iter()
        .map(|&(lat, lon)| TrackPoint::new(lat, lon))
        .collect();

    let err = pipeline.render(&spread, &uniform_request(12)).await.unwrap_err();
    assert!(matches!(err, HeatmapError::TooManyTiles { max: 100, .. }));
    assert_eq!(pipeline.fetcher().attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_zoom_above_max_is_clamped() {
    let config = HeatmapConfig {
        max_tile_count: 1_000_000,
        ..Default::default()
    };
    let pipeline = HeatmapPipeline::new(config, StaticTiles::png([255, 255, 255])).unwrap();
    let single: TrackSet = std::iter::once(TrackPoint::new(45.0, 7.0)).collect();

    let output = pipeline.render(&single, &uniform_request(25)).await.unwrap();
    assert_eq!(output.range.zoom, 19);
    assert_eq!(pipeline.fetcher().calls()[0].z, 19);
}

#[tokio::test]
async fn test_empty_and_out_of_bounds_inputs() {
    let pipeline = HeatmapPipeline::new(HeatmapConfig::default(), Unreachable::default()).unwrap();

    let err = pipeline
        .render(&TrackSet::default(), &uniform_request(10))
        .await
        .unwrap_err();
    assert!(matches!(err, HeatmapError::NoTrackPoints(_)));

    let (lat_min, lat_max, lon_min, lon_max) = test_utils::bounds::SOUTH_ATLANTIC;
    let request = RenderRequest {
        bounds: BoundingBox::from_lat_lon(lat_min, lat_max, lon_min, lon_max),
        ..uniform_request(10)
    };
    let err = pipeline.render(&alpine_walk(), &request).await.unwrap_err();
    assert!(matches!(err, HeatmapError::NoPointsInBounds(_)));
    assert_eq!(pipeline.fetcher().attempts.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Exports
// ============================================================================

#[tokio::test]
async fn test_visible_cells_lie_in_tile() {
    let pipeline = HeatmapPipeline::new(HeatmapConfig::default(), StaticTiles::png([255, 255, 255]))
        .unwrap();
    let output = pipeline
        .render(&alpine_walk(), &uniform_request(14))
        .await
        .unwrap();

    let tile = tile_to_latlon_bounds(&TileCoord::new(14, 8510, 5893));
    let cells: Vec<_> = output.visible_cells(0.1).collect();
    let expected = output.density.data().iter().filter(|&&v| v > 0.1).count();

    assert_eq!(cells.len(), expected);
    assert!(!cells.is_empty());
    for cell in &cells {
        assert!(cell.intensity > 0.1 && cell.intensity <= 1.0);
        assert!(tile.contains_point(cell.lon, cell.lat));
    }
}

#[tokio::test]
async fn test_writes_png_and_csv() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = HeatmapPipeline::new(HeatmapConfig::default(), StaticTiles::png([255, 255, 255]))
        .unwrap();
    let output = pipeline
        .render(&alpine_walk(), &uniform_request(14))
        .await
        .unwrap();

    let png_path = png_output_path(&dir.path().join("alps.jpg"));
    write_png(&png_path, &output.image).unwrap();
    let decoded = image::open(&png_path).unwrap().to_rgb8();
    assert_eq!(decoded.dimensions(), (256, 256));

    let csv_path = csv_output_path(&png_path);
    let rows = write_csv_file(&csv_path, &output, 0.1).unwrap();
    let text = std::fs::read_to_string(&csv_path).unwrap();
    assert!(csv_path.ends_with("alps.csv"));
    assert_eq!(text.lines().next(), Some("lat,lon,intensity"));
    assert_eq!(text.lines().count(), rows + 1);
}

// ============================================================================
// Tile cache
// ============================================================================

#[tokio::test]
async fn test_cache_serves_repeat_requests_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TileCache::new(dir.path().join("tiles"), StaticTiles::png([10, 20, 30]));
    let tile = TileCoord::new(14, 8510, 5893);

    let first = cache.fetch(tile).await.unwrap();
    let second = cache.fetch(tile).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(cache.inner().calls().len(), 1);
    assert!(dir.path().join("tiles/tile_14_8510_5893.png").exists());
}

#[tokio::test]
async fn test_cache_does_not_store_failures() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TileCache::new(dir.path(), Unreachable::default());
    let tile = TileCoord::new(3, 1, 2);

    assert!(cache.fetch(tile).await.is_err());
    assert!(cache.fetch(tile).await.is_err());
    assert_eq!(cache.inner().attempts.load(Ordering::SeqCst), 2);
    assert!(!cache.path_for(tile).exists());
}

#[tokio::test]
async fn test_cache_does_not_store_non_images() {
    let dir = tempfile::tempdir().unwrap();
    let cache = TileCache::new(dir.path(), StaticTiles::raw(b"Service Unavailable".to_vec()));
    let tile = TileCoord::new(3, 1, 2);

    let bytes = cache.fetch(tile).await.unwrap();
    assert_eq!(&bytes[..], b"Service Unavailable");
    assert!(!cache.path_for(tile).exists());
}
