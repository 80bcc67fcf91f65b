//! Tile mosaic assembly and base-layer conversion.

use crate::raster::RgbRaster;
use heatmap_common::{HeatmapError, HeatmapResult, TileCoord, TileRange};

/// Rec. 709 luminance weights.
const LUMA_WEIGHTS: [f64; 3] = [0.2126, 0.7152, 0.0722];

/// Decode a PNG or JPEG map tile into an RGB raster.
///
/// Alpha is dropped. A tile whose dimensions differ from `tile_size` is
/// rejected so it cannot corrupt neighbouring blocks.
pub fn decode_tile(tile: TileCoord, bytes: &[u8], tile_size: u32) -> HeatmapResult<RgbRaster> {
    let img = image::load_from_memory(bytes).map_err(|e| HeatmapError::TileDecode {
        tile: tile.to_string(),
        message: e.to_string(),
    })?;

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width != tile_size || height != tile_size {
        return Err(HeatmapError::TileDecode {
            tile: tile.to_string(),
            message: format!(
                "expected {}x{} pixels, got {}x{}",
                tile_size, tile_size, width, height
            ),
        });
    }

    RgbRaster::from_rgb8(width as usize, height as usize, rgb.as_raw()).ok_or_else(|| {
        HeatmapError::TileDecode {
            tile: tile.to_string(),
            message: "truncated pixel buffer".to_string(),
        }
    })
}

/// Contiguous raster built from the tiles of a [`TileRange`].
#[derive(Debug, Clone)]
pub struct Mosaic {
    range: TileRange,
    tile_size: u32,
    raster: RgbRaster,
}

impl Mosaic {
    /// Allocate an empty (black) mosaic covering `range`.
    pub fn new(range: TileRange, tile_size: u32) -> Self {
        let raster = RgbRaster::new(range.pixel_width(tile_size), range.pixel_height(tile_size));
        Self {
            range,
            tile_size,
            raster,
        }
    }

    pub fn range(&self) -> &TileRange {
        &self.range
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn raster(&self) -> &RgbRaster {
        &self.raster
    }

    pub fn into_raster(self) -> RgbRaster {
        self.raster
    }

    /// Pixel offset (row, col) of a tile's block, or `None` if the tile is
    /// outside the range.
    pub fn block_origin(&self, tile: TileCoord) -> Option<(usize, usize)> {
        let r = &self.range;
        if tile.z != r.zoom
            || tile.x < r.x_min
            || tile.x > r.x_max
            || tile.y < r.y_min
            || tile.y > r.y_max
        {
            return None;
        }
        let size = self.tile_size as usize;
        Some((
            (tile.y - r.y_min) as usize * size,
            (tile.x - r.x_min) as usize * size,
        ))
    }

    /// Copy a tile image into its block.
    pub fn place(&mut self, tile: TileCoord, image: &RgbRaster) -> HeatmapResult<()> {
        let (row, col) = self.block_origin(tile).ok_or_else(|| {
            HeatmapError::Render(format!("tile {} is outside the mosaic range", tile))
        })?;
        self.raster.blit(image, row, col);
        Ok(())
    }

    /// The block occupied by one tile.
    pub fn tile_block(&self, tile: TileCoord) -> Option<RgbRaster> {
        let (row, col) = self.block_origin(tile)?;
        let size = self.tile_size as usize;
        Some(self.raster.crop(row, col, size, size))
    }
}

/// Convert to luminance, invert, and replicate to three channels.
///
/// Light map backgrounds become dark so a bright overlay stands out.
pub fn to_inverted_grayscale(raster: &RgbRaster) -> RgbRaster {
    let mut out = raster.clone();
    for px in out.data_mut().chunks_exact_mut(3) {
        let gray = LUMA_WEIGHTS[0] * px[0] + LUMA_WEIGHTS[1] * px[1] + LUMA_WEIGHTS[2] * px[2];
        let inverted = 1.0 - gray;
        px.fill(inverted);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::assert_approx_eq;

    fn range_2x1() -> TileRange {
        TileRange {
            zoom: 5,
            x_min: 10,
            x_max: 11,
            y_min: 7,
            y_max: 7,
        }
    }

    #[test]
    fn test_mosaic_shape() {
        let mosaic = Mosaic::new(range_2x1(), 8);
        assert_eq!(mosaic.raster().shape(), (16, 8));
    }

    #[test]
    fn test_place_tile_in_block() {
        let mut mosaic = Mosaic::new(range_2x1(), 8);
        let red = RgbRaster::filled(8, 8, [1.0, 0.0, 0.0]);
        mosaic.place(TileCoord::new(5, 11, 7), &red).unwrap();

        assert_eq!(mosaic.raster().pixel(0, 8), [1.0, 0.0, 0.0]);
        assert_eq!(mosaic.raster().pixel(7, 15), [1.0, 0.0, 0.0]);
        assert_eq!(mosaic.raster().pixel(0, 7), [0.0, 0.0, 0.0]);
        assert_eq!(mosaic.tile_block(TileCoord::new(5, 11, 7)).unwrap(), red);
    }

    #[test]
    fn test_place_outside_range_fails() {
        let mut mosaic = Mosaic::new(range_2x1(), 8);
        let tile = RgbRaster::white(8);
        assert!(mosaic.place(TileCoord::new(5, 12, 7), &tile).is_err());
        assert!(mosaic.place(TileCoord::new(6, 10, 7), &tile).is_err());
    }

    #[test]
    fn test_inverted_grayscale() {
        let raster = RgbRaster::from_vec(3, 1, vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0])
            .unwrap();
        let base = to_inverted_grayscale(&raster);

        for c in 0..3 {
            assert_approx_eq!(base.pixel(0, 0)[c], 0.0, 1e-12);
            assert_eq!(base.pixel(0, 1)[c], 1.0);
            assert_approx_eq!(base.pixel(0, 2)[c], 1.0 - 0.2126, 1e-12);
        }
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_tile(TileCoord::new(1, 0, 0), b"not an image", 256).unwrap_err();
        assert!(err.is_recoverable());
    }
}
